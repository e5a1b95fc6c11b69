//! Things visible to the creature

use serde::Serialize;

use crate::core::types::{ThingId, Vec2};

/// World category of a visible thing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ThingCategory {
    Food,
    PartialFood,
    NonPureFood,
    Jewel,
    /// Wall segment; an obstacle with its own sensory slot
    Brick,
    Other,
}

impl ThingCategory {
    /// Perishable, partially eaten or non-perishable food
    pub fn is_food(&self) -> bool {
        matches!(
            self,
            ThingCategory::Food | ThingCategory::PartialFood | ThingCategory::NonPureFood
        )
    }
}

/// A visible thing as reported by the world for one tick
///
/// The color is present exactly when the category is `Jewel`; the
/// constructors are the only way to build a `Thing`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thing {
    name: ThingId,
    category: ThingCategory,
    position: Vec2,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
}

impl Thing {
    fn plain(name: impl Into<ThingId>, category: ThingCategory, position: Vec2) -> Self {
        Self {
            name: name.into(),
            category,
            position,
            color: None,
        }
    }

    pub fn jewel(name: impl Into<ThingId>, color: impl Into<String>, position: Vec2) -> Self {
        Self {
            name: name.into(),
            category: ThingCategory::Jewel,
            position,
            color: Some(color.into()),
        }
    }

    pub fn food(name: impl Into<ThingId>, position: Vec2) -> Self {
        Self::plain(name, ThingCategory::Food, position)
    }

    pub fn partial_food(name: impl Into<ThingId>, position: Vec2) -> Self {
        Self::plain(name, ThingCategory::PartialFood, position)
    }

    pub fn non_pure_food(name: impl Into<ThingId>, position: Vec2) -> Self {
        Self::plain(name, ThingCategory::NonPureFood, position)
    }

    pub fn brick(name: impl Into<ThingId>, position: Vec2) -> Self {
        Self::plain(name, ThingCategory::Brick, position)
    }

    pub fn other(name: impl Into<ThingId>, position: Vec2) -> Self {
        Self::plain(name, ThingCategory::Other, position)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> ThingCategory {
        self.category
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Jewel color, `None` for every other category
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn is_jewel(&self) -> bool {
        self.category == ThingCategory::Jewel
    }

    pub fn is_food(&self) -> bool {
        self.category.is_food()
    }

    pub fn distance_to(&self, point: Vec2) -> f64 {
        self.position.distance(&point)
    }
}
