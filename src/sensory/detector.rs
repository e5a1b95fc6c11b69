//! Feature detectors over the sensory cache
//!
//! A detector reads one slot and maps it to an activation in 0.0..=1.0.
//! Detectors keep no state besides their slot and threshold, so evaluating
//! one twice against the same frame gives the same answer.

use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use crate::core::error::{AgentError, Result};
use crate::sensory::cache::{SensoryCache, SensorySlot, SensoryValue};

/// Health at or below which the bad-health detector fires
pub const BAD_HEALTH_THRESHOLD: f64 = 0.33;

pub trait Detector: Send + Sync {
    fn name(&self) -> &str;

    fn slot(&self) -> SensorySlot;

    /// Current activation; fails if the slot was never written
    fn activation(&self) -> Result<f64>;
}

/// Fires when the slot holds a thing (or a non-empty list of things)
#[derive(Debug, Clone)]
pub struct PresenceDetector {
    name: String,
    slot: SensorySlot,
    cache: SensoryCache,
}

impl PresenceDetector {
    pub fn new(name: impl Into<String>, slot: SensorySlot, cache: SensoryCache) -> Self {
        Self {
            name: name.into(),
            slot,
            cache,
        }
    }

    pub fn brick(cache: SensoryCache) -> Self {
        Self::new("brick", SensorySlot::Brick, cache)
    }
}

impl Detector for PresenceDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn slot(&self) -> SensorySlot {
        self.slot
    }

    fn activation(&self) -> Result<f64> {
        let present = match self.cache.read(self.slot)? {
            SensoryValue::Thing(thing) => thing.is_some(),
            SensoryValue::Things(things) => !things.is_empty(),
            other => {
                return Err(AgentError::SensoryTypeMismatch {
                    slot: self.slot,
                    expected: "thing",
                    found: other.kind(),
                })
            }
        };
        Ok(if present { 1.0 } else { 0.0 })
    }
}

/// Fires when the slot's scalar is at or below the threshold
#[derive(Debug, Clone)]
pub struct ThresholdDetector {
    name: String,
    slot: SensorySlot,
    threshold: f64,
    cache: SensoryCache,
}

impl ThresholdDetector {
    pub fn new(
        name: impl Into<String>,
        slot: SensorySlot,
        threshold: f64,
        cache: SensoryCache,
    ) -> Self {
        Self {
            name: name.into(),
            slot,
            threshold,
            cache,
        }
    }

    pub fn bad_health(cache: SensoryCache) -> Self {
        Self::new(
            "bad_health",
            SensorySlot::Health,
            BAD_HEALTH_THRESHOLD,
            cache,
        )
    }
}

impl Detector for ThresholdDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn slot(&self) -> SensorySlot {
        self.slot
    }

    fn activation(&self) -> Result<f64> {
        match self.cache.read(self.slot)? {
            SensoryValue::Scalar(value) if value <= self.threshold => Ok(1.0),
            SensoryValue::Scalar(_) => Ok(0.0),
            other => Err(AgentError::SensoryTypeMismatch {
                slot: self.slot,
                expected: "scalar",
                found: other.kind(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Presence,
    Threshold,
}

/// Detector declaration as written in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSpec {
    pub name: String,
    pub mode: SensorySlot,
    pub kind: DetectorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl DetectorSpec {
    /// Brick and bad-health detectors
    pub fn defaults() -> Vec<DetectorSpec> {
        vec![
            DetectorSpec {
                name: "brick".into(),
                mode: SensorySlot::Brick,
                kind: DetectorKind::Presence,
                threshold: None,
            },
            DetectorSpec {
                name: "bad_health".into(),
                mode: SensorySlot::Health,
                kind: DetectorKind::Threshold,
                threshold: Some(BAD_HEALTH_THRESHOLD),
            },
        ]
    }

    /// Check that the detector kind can read the slot it names
    ///
    /// Presence detectors need a slot holding things, threshold detectors a
    /// scalar slot and a threshold.
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self.kind {
            DetectorKind::Presence => {
                if self.mode.is_scalar() {
                    return Err(format!(
                        "presence detector '{}' cannot read scalar slot '{}'",
                        self.name, self.mode
                    ));
                }
            }
            DetectorKind::Threshold => {
                if !self.mode.is_scalar() {
                    return Err(format!(
                        "threshold detector '{}' needs a scalar slot, '{}' holds things",
                        self.name, self.mode
                    ));
                }
                if self.threshold.is_none() {
                    return Err(format!("threshold detector '{}' has no threshold", self.name));
                }
            }
        }
        Ok(())
    }

    pub fn build(&self, cache: SensoryCache) -> Result<Box<dyn Detector>> {
        self.validate().map_err(AgentError::InvalidConfig)?;

        let detector: Box<dyn Detector> = match (self.kind, self.threshold) {
            (DetectorKind::Threshold, Some(threshold)) => Box::new(ThresholdDetector::new(
                self.name.clone(),
                self.mode,
                threshold,
                cache,
            )),
            _ => Box::new(PresenceDetector::new(self.name.clone(), self.mode, cache)),
        };
        Ok(detector)
    }
}

/// Outcome of evaluating a whole set
///
/// One failing detector never hides the others.
#[derive(Debug, Default)]
pub struct DetectorReadings {
    pub activations: Vec<(String, f64)>,
    pub failures: Vec<(String, AgentError)>,
}

/// A named group of detectors evaluated together
#[derive(Default)]
pub struct DetectorSet {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorSet {
    /// Build every declared detector; fails on the first invalid declaration
    pub fn from_specs(specs: &[DetectorSpec], cache: &SensoryCache) -> Result<Self> {
        let mut set = Self::default();
        for spec in specs {
            set.push(spec.build(cache.clone())?);
        }
        Ok(set)
    }

    pub fn push(&mut self, detector: Box<dyn Detector>) {
        self.detectors.push(detector);
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Evaluate each detector on its own
    pub fn evaluate(&self) -> DetectorReadings {
        let mut readings = DetectorReadings::default();

        for detector in &self.detectors {
            let name = detector.name().to_string();
            match detector.activation() {
                Ok(activation) => {
                    trace!(detector = %name, activation, "detector evaluated");
                    readings.activations.push((name, activation));
                }
                Err(err) => {
                    error!(
                        detector = %name,
                        slot = %detector.slot(),
                        error = %err,
                        "detector failed"
                    );
                    readings.failures.push((name, err));
                }
            }
        }

        readings
    }
}
