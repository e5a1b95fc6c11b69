//! Leaflet requirements: how many jewels of each color are still wanted

use serde::{Deserialize, Serialize};

/// One color entry of a leaflet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafletRequirement {
    pub color: String,
    pub required: u32,
    pub collected: u32,
}

impl LeafletRequirement {
    pub fn new(color: impl Into<String>, required: u32, collected: u32) -> Self {
        Self {
            color: color.into(),
            required,
            collected,
        }
    }

    /// Still short of the required count
    pub fn is_open(&self) -> bool {
        self.collected < self.required
    }

    pub fn remaining(&self) -> u32 {
        self.required.saturating_sub(self.collected)
    }
}

/// A color is needed if any requirement for it is still open
pub fn is_color_needed(requirements: &[LeafletRequirement], color: &str) -> bool {
    requirements
        .iter()
        .any(|req| req.color == color && req.is_open())
}

/// Every requirement satisfied (vacuously true for no requirements)
pub fn all_satisfied(requirements: &[LeafletRequirement]) -> bool {
    requirements.iter().all(|req| !req.is_open())
}
