//! Sensory cache - the last classified percept, keyed by slot
//!
//! The tick driver builds a complete `SensoryFrame` and swaps it in with one
//! write. Readers clone the current `Arc<SensoryFrame>` and never observe a
//! half-written frame; a reader holding an old frame just sees stale data.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{AgentError, Result};
use crate::core::types::Tick;
use crate::entity::thing::{Thing, ThingCategory};
use crate::entity::vitals::Vitals;
use crate::simulation::perception::Percept;

/// Named slot of the sensory cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SensorySlot {
    /// Food selected while fuel is low
    Food,
    /// Surplus jewel
    Jewel,
    /// Things within reach (at most one)
    ThingAhead,
    /// Jewel an open leaflet still needs
    LeafletJewel,
    /// Brick within reach
    Brick,
    /// Fuel normalized to 0.0..=1.0
    Health,
    /// Raw fuel level
    Fuel,
}

impl SensorySlot {
    pub const ALL: [SensorySlot; 7] = [
        SensorySlot::Food,
        SensorySlot::Jewel,
        SensorySlot::ThingAhead,
        SensorySlot::LeafletJewel,
        SensorySlot::Brick,
        SensorySlot::Health,
        SensorySlot::Fuel,
    ];

    pub fn mode(&self) -> &'static str {
        match self {
            SensorySlot::Food => "food",
            SensorySlot::Jewel => "jewel",
            SensorySlot::ThingAhead => "thingAhead",
            SensorySlot::LeafletJewel => "leafletJewel",
            SensorySlot::Brick => "brick",
            SensorySlot::Health => "health",
            SensorySlot::Fuel => "fuel",
        }
    }

    /// Slot holds a number rather than things
    pub fn is_scalar(&self) -> bool {
        matches!(self, SensorySlot::Health | SensorySlot::Fuel)
    }
}

impl fmt::Display for SensorySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mode())
    }
}

impl FromStr for SensorySlot {
    type Err = String;

    fn from_str(mode: &str) -> std::result::Result<Self, Self::Err> {
        SensorySlot::ALL
            .into_iter()
            .find(|slot| slot.mode() == mode)
            .ok_or_else(|| format!("unknown sensory mode '{}'", mode))
    }
}

impl TryFrom<String> for SensorySlot {
    type Error = String;

    fn try_from(mode: String) -> std::result::Result<Self, Self::Error> {
        mode.parse()
    }
}

impl From<SensorySlot> for String {
    fn from(slot: SensorySlot) -> Self {
        slot.mode().to_string()
    }
}

/// Content of one slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SensoryValue {
    Thing(Option<Thing>),
    Things(Vec<Thing>),
    Scalar(f64),
}

impl SensoryValue {
    pub fn kind(&self) -> &'static str {
        match self {
            SensoryValue::Thing(_) => "thing",
            SensoryValue::Things(_) => "thing list",
            SensoryValue::Scalar(_) => "scalar",
        }
    }
}

/// Every slot written by one tick
#[derive(Debug, Clone, Default)]
pub struct SensoryFrame {
    pub tick: Tick,
    slots: AHashMap<SensorySlot, SensoryValue>,
}

impl SensoryFrame {
    pub fn new(tick: Tick) -> Self {
        Self {
            tick,
            slots: AHashMap::new(),
        }
    }

    /// Frame with every standard slot filled from a percept and vitals
    pub fn from_percept(tick: Tick, percept: &Percept, vitals: &Vitals, max_fuel: f64) -> Self {
        let brick = percept
            .near_thing
            .as_ref()
            .filter(|thing| thing.category() == ThingCategory::Brick)
            .cloned();

        Self::new(tick)
            .with(SensorySlot::Food, SensoryValue::Thing(percept.food.clone()))
            .with(
                SensorySlot::Jewel,
                SensoryValue::Thing(percept.surplus_jewel.clone()),
            )
            .with(
                SensorySlot::ThingAhead,
                SensoryValue::Things(percept.things_ahead().cloned().collect()),
            )
            .with(
                SensorySlot::LeafletJewel,
                SensoryValue::Thing(percept.needed_jewel.clone()),
            )
            .with(SensorySlot::Brick, SensoryValue::Thing(brick))
            .with(
                SensorySlot::Health,
                SensoryValue::Scalar(vitals.health(max_fuel)),
            )
            .with(SensorySlot::Fuel, SensoryValue::Scalar(vitals.fuel))
    }

    pub fn with(mut self, slot: SensorySlot, value: SensoryValue) -> Self {
        self.slots.insert(slot, value);
        self
    }

    pub fn get(&self, slot: SensorySlot) -> Result<&SensoryValue> {
        self.slots
            .get(&slot)
            .ok_or(AgentError::UninitializedSensorySlot(slot))
    }
}

/// Shared handle to the latest sensory frame
///
/// Cloning the handle shares the same cache.
#[derive(Debug, Clone, Default)]
pub struct SensoryCache {
    current: Arc<RwLock<Option<Arc<SensoryFrame>>>>,
}

impl SensoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole frame
    pub fn publish(&self, frame: SensoryFrame) {
        let frame = Arc::new(frame);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(frame);
    }

    /// Latest published frame, `None` before the first publish
    pub fn snapshot(&self) -> Option<Arc<SensoryFrame>> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Read one slot of the latest frame
    pub fn read(&self, slot: SensorySlot) -> Result<SensoryValue> {
        match self.snapshot() {
            Some(frame) => frame.get(slot).cloned(),
            None => Err(AgentError::UninitializedSensorySlot(slot)),
        }
    }

    /// Tick of the latest frame
    pub fn tick(&self) -> Option<Tick> {
        self.snapshot().map(|frame| frame.tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;

    fn scalar_frame(tick: Tick, slot: SensorySlot, value: f64) -> SensoryFrame {
        let value = SensoryValue::Scalar(value);
        SensoryFrame::new(tick).with(slot, value)
    }

    #[test]
    fn test_mode_names_parse() {
        for slot in SensorySlot::ALL {
            assert_eq!(slot.mode().parse::<SensorySlot>().unwrap(), slot);
        }
        assert!("smell".parse::<SensorySlot>().is_err());
    }

    #[test]
    fn test_scalar_slots() {
        assert!(SensorySlot::Health.is_scalar());
        assert!(SensorySlot::Fuel.is_scalar());
        assert!(!SensorySlot::Brick.is_scalar());
        assert!(!SensorySlot::ThingAhead.is_scalar());
    }

    #[test]
    fn test_unwritten_cache_is_uninitialized() {
        let cache = SensoryCache::new();
        assert!(matches!(
            cache.read(SensorySlot::Food),
            Err(AgentError::UninitializedSensorySlot(SensorySlot::Food))
        ));
        assert_eq!(cache.tick(), None);
        assert!(cache.snapshot().is_none());
    }

    #[test]
    fn test_empty_frame_still_counts_as_published() {
        let cache = SensoryCache::new();
        cache.publish(SensoryFrame::new(4));

        assert_eq!(cache.tick(), Some(4));
        assert!(matches!(
            cache.read(SensorySlot::Fuel),
            Err(AgentError::UninitializedSensorySlot(SensorySlot::Fuel))
        ));
    }

    #[test]
    fn test_partial_frame_missing_slot() {
        let cache = SensoryCache::new();
        cache.publish(scalar_frame(1, SensorySlot::Health, 0.5));

        assert_eq!(
            cache.read(SensorySlot::Health).unwrap(),
            SensoryValue::Scalar(0.5)
        );
        assert!(matches!(
            cache.read(SensorySlot::Brick),
            Err(AgentError::UninitializedSensorySlot(SensorySlot::Brick))
        ));
    }

    #[test]
    fn test_frame_from_percept_fills_every_slot() {
        let percept = Percept {
            near_thing: Some(Thing::brick("wall", Vec2::new(1.0, 0.0))),
            ..Percept::default()
        };
        let frame = SensoryFrame::from_percept(7, &percept, &Vitals::new(250.0), 1000.0);

        for slot in SensorySlot::ALL {
            assert!(frame.get(slot).is_ok(), "slot {} missing", slot);
        }
        assert_eq!(
            frame.get(SensorySlot::Health).unwrap(),
            &SensoryValue::Scalar(0.25)
        );
        assert!(matches!(
            frame.get(SensorySlot::Brick).unwrap(),
            SensoryValue::Thing(Some(_))
        ));
        match frame.get(SensorySlot::ThingAhead).unwrap() {
            SensoryValue::Things(things) => assert_eq!(things.len(), 1),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_non_brick_near_thing_leaves_brick_empty() {
        let percept = Percept {
            near_thing: Some(Thing::food("apple", Vec2::new(1.0, 0.0))),
            ..Percept::default()
        };
        let frame = SensoryFrame::from_percept(1, &percept, &Vitals::new(900.0), 1000.0);
        assert_eq!(
            frame.get(SensorySlot::Brick).unwrap(),
            &SensoryValue::Thing(None)
        );
    }

    #[test]
    fn test_publish_replaces_whole_frame() {
        let cache = SensoryCache::new();
        cache.publish(scalar_frame(1, SensorySlot::Fuel, 10.0));
        let old = cache.snapshot().unwrap();

        cache.publish(scalar_frame(2, SensorySlot::Health, 0.1));

        // Old readers keep their frame; new readers see only the new one
        assert_eq!(old.tick, 1);
        assert!(old.get(SensorySlot::Fuel).is_ok());
        assert_eq!(cache.tick(), Some(2));
        assert!(cache.read(SensorySlot::Fuel).is_err());
    }

    #[test]
    fn test_clones_share_cache() {
        let writer = SensoryCache::new();
        let reader = writer.clone();
        writer.publish(scalar_frame(3, SensorySlot::Fuel, 1.0));
        assert_eq!(reader.tick(), Some(3));
    }
}
