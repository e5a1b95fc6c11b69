//! World-facing data: visible things, leaflets and vitals

pub mod leaflet;
pub mod thing;
pub mod vitals;

pub use leaflet::LeafletRequirement;
pub use thing::{Thing, ThingCategory};
pub use vitals::Vitals;
