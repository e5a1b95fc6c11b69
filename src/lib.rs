//! Creature Agent - reactive control loop for a foraging creature

pub mod command;
pub mod core;
pub mod entity;
pub mod sensory;
pub mod simulation;
pub mod world;
