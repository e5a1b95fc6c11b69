//! Sensory memory: the per-tick cache and the detectors reading it

pub mod cache;
pub mod detector;

pub use cache::{SensoryCache, SensoryFrame, SensorySlot, SensoryValue};
pub use detector::{
    Detector, DetectorReadings, DetectorSet, DetectorSpec, PresenceDetector, ThresholdDetector,
};
