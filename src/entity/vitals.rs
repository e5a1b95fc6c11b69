//! Internal vitals of the creature

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Energy left; never negative
    pub fuel: f64,
}

impl Vitals {
    pub fn new(fuel: f64) -> Self {
        Self {
            fuel: fuel.max(0.0),
        }
    }

    pub fn is_low_fuel(&self, threshold: f64) -> bool {
        self.fuel <= threshold
    }

    /// Fuel normalized to 0.0..=1.0 against `max_fuel`
    pub fn health(&self, max_fuel: f64) -> f64 {
        if max_fuel <= 0.0 {
            return 0.0;
        }
        (self.fuel / max_fuel).clamp(0.0, 1.0)
    }
}
