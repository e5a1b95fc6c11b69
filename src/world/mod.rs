//! Boundary to the external world
//!
//! The control loop pulls one `WorldSnapshot` per tick from a `WorldSource`
//! and pushes effector commands through an `Effector`. Both calls may fail
//! or stall; the tick driver bounds and absorbs those failures.

pub mod sim;

use async_trait::async_trait;
use serde::Serialize;

use crate::core::error::Result;
use crate::core::types::Vec2;
use crate::entity::{LeafletRequirement, Thing, Vitals};
use crate::simulation::perception::{classify, Percept, PerceptionThresholds};

pub use sim::{SimWorld, SimWorldConfig};

/// Everything the creature senses in one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub position: Vec2,
    pub vitals: Vitals,
    /// Visible things in the order the world reports them
    pub things: Vec<Thing>,
    pub leaflets: Vec<LeafletRequirement>,
}

impl WorldSnapshot {
    pub fn classify(&self, thresholds: &PerceptionThresholds) -> Percept {
        classify(
            self.position,
            &self.things,
            &self.leaflets,
            &self.vitals,
            thresholds,
        )
    }
}

#[async_trait]
pub trait WorldSource: Send + Sync {
    /// Current snapshot, or `WorldUnavailable`
    async fn fetch_snapshot(&self) -> Result<WorldSnapshot>;
}

#[async_trait]
pub trait Effector: Send + Sync {
    async fn rotate(&self, speed: f64) -> Result<()>;

    async fn move_to(&self, speed: f64, target: Vec2) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    /// Put a jewel in the sack
    async fn stow(&self, thing: &str) -> Result<()>;

    /// Eat a food item
    async fn consume(&self, thing: &str) -> Result<()>;
}
