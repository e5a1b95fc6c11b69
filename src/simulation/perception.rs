//! Perception classification - what the creature considers salient this tick
//!
//! One pass over the visible things, in the order the world reports them,
//! picks at most one thing for each of four roles:
//! - `near_thing`: first thing inside the proximity radius. Finding it ends
//!   the scan; nothing after it is looked at this tick.
//! - `needed_jewel`: first jewel whose color an open leaflet still wants
//! - `surplus_jewel`: any jewel seen after a needed jewel was already found
//! - `food`: first food of any kind, only while fuel is low
//!
//! A jewel of an already-satisfied color seen before any needed jewel is
//! left unclassified.

use serde::Serialize;
use tracing::debug;

use crate::core::config::AgentConfig;
use crate::core::types::Vec2;
use crate::entity::leaflet::{is_color_needed, LeafletRequirement};
use crate::entity::thing::Thing;
use crate::entity::vitals::Vitals;

/// Classified perception of one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Percept {
    pub near_thing: Option<Thing>,
    pub needed_jewel: Option<Thing>,
    pub surplus_jewel: Option<Thing>,
    pub food: Option<Thing>,
}

impl Percept {
    /// Things within reach, as the set COLLECT works through
    pub fn things_ahead(&self) -> impl Iterator<Item = &Thing> {
        self.near_thing.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerceptionThresholds {
    pub proximity: f64,
    pub low_fuel: f64,
}

impl Default for PerceptionThresholds {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

impl PerceptionThresholds {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            proximity: config.proximity_threshold,
            low_fuel: config.low_fuel_threshold,
        }
    }
}

/// Classify the things visible from `origin`
pub fn classify(
    origin: Vec2,
    things: &[Thing],
    requirements: &[LeafletRequirement],
    vitals: &Vitals,
    thresholds: &PerceptionThresholds,
) -> Percept {
    let mut percept = Percept::default();
    let hungry = vitals.is_low_fuel(thresholds.low_fuel);

    for thing in things {
        if thing.distance_to(origin) <= thresholds.proximity {
            // Something within reach preempts everything else this tick
            percept.near_thing = Some(thing.clone());
            break;
        }

        if thing.is_jewel() {
            if percept.needed_jewel.is_none() {
                let needed = thing
                    .color()
                    .is_some_and(|color| is_color_needed(requirements, color));
                if needed {
                    percept.needed_jewel = Some(thing.clone());
                }
            } else {
                percept.surplus_jewel = Some(thing.clone());
            }
        } else if percept.food.is_none() && hungry && thing.is_food() {
            percept.food = Some(thing.clone());
        }
    }

    debug!(
        visible = things.len(),
        near = percept.near_thing.as_ref().map(Thing::name),
        needed_jewel = percept.needed_jewel.as_ref().map(Thing::name),
        surplus_jewel = percept.surplus_jewel.as_ref().map(Thing::name),
        food = percept.food.as_ref().map(Thing::name),
        "classified perception"
    );

    percept
}
