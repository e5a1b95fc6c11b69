//! In-memory foraging world
//!
//! A single creature on a flat rectangle scattered with jewels, food and
//! bricks. The creature sees things inside a forward cone, burns fuel every
//! tick, and can stow jewels or eat food within reach. Jewels stowed count
//! towards the first open leaflet entry of their color.

use std::f64::consts::PI;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ahash::AHashMap;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::{AgentError, Result};
use crate::core::types::{Tick, Vec2};
use crate::entity::{LeafletRequirement, Thing, Vitals};
use crate::world::{Effector, WorldSnapshot, WorldSource};

/// Jewel colors used by the world
pub const JEWEL_COLORS: [&str; 6] = ["Red", "Green", "Blue", "Yellow", "Magenta", "White"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimWorldConfig {
    pub width: f64,
    pub height: f64,

    /// How far the creature can see
    pub vision_range: f64,

    /// Full angle of the vision cone in degrees
    pub field_of_view_deg: f64,

    /// Distance within which things can be stowed or eaten
    pub reach: f64,

    pub initial_fuel: f64,
    pub max_fuel: f64,

    /// Fuel burned per snapshot
    pub fuel_decay: f64,

    /// Fuel restored by eating
    pub food_energy: f64,

    /// Distance covered per move command at speed 1.0
    pub step_length: f64,

    /// Heading change per rotate command at speed 1.0, in degrees
    pub turn_rate_deg: f64,

    /// The world refills up to this many things
    pub min_things: usize,

    pub seed: u64,
}

impl Default for SimWorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            vision_range: 300.0,
            field_of_view_deg: 120.0,
            reach: 50.0,
            initial_fuel: 1000.0,
            max_fuel: 1000.0,
            fuel_decay: 1.0,
            food_energy: 300.0,
            step_length: 10.0,
            turn_rate_deg: 15.0,
            min_things: 20,
            seed: 7,
        }
    }
}

#[derive(Debug)]
struct SimState {
    tick: Tick,
    position: Vec2,
    /// Radians, 0 along +x
    heading: f64,
    fuel: f64,
    things: Vec<Thing>,
    leaflets: Vec<LeafletRequirement>,
    sack: AHashMap<String, u32>,
    rng: ChaCha8Rng,
    next_id: u64,
    available: bool,
}

/// Simulated world implementing both the snapshot source and the effectors
#[derive(Debug)]
pub struct SimWorld {
    config: SimWorldConfig,
    state: Mutex<SimState>,
}

impl SimWorld {
    /// Random world seeded from the config
    pub fn new(config: SimWorldConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let leaflets = random_leaflets(&mut rng);
        let state = SimState {
            tick: 0,
            position: Vec2::new(config.width / 2.0, config.height / 2.0),
            heading: 0.0,
            fuel: config.initial_fuel,
            things: Vec::new(),
            leaflets,
            sack: AHashMap::new(),
            rng,
            next_id: 0,
            available: true,
        };
        let world = Self {
            config,
            state: Mutex::new(state),
        };
        world.refill();
        world
    }

    /// Hand-placed world with no random things; useful for scenarios
    pub fn with_layout(
        config: SimWorldConfig,
        position: Vec2,
        things: Vec<Thing>,
        leaflets: Vec<LeafletRequirement>,
    ) -> Self {
        let state = SimState {
            tick: 0,
            position,
            heading: 0.0,
            fuel: config.initial_fuel,
            things,
            leaflets,
            sack: AHashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            next_id: 0,
            available: true,
        };
        Self {
            config: SimWorldConfig {
                min_things: 0,
                ..config
            },
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &SimWorldConfig {
        &self.config
    }

    /// Simulate an outage of the world server
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    pub fn position(&self) -> Vec2 {
        self.lock().position
    }

    pub fn heading(&self) -> f64 {
        self.lock().heading
    }

    pub fn fuel(&self) -> f64 {
        self.lock().fuel
    }

    pub fn set_fuel(&self, fuel: f64) {
        self.lock().fuel = fuel.clamp(0.0, self.config.max_fuel);
    }

    pub fn leaflets(&self) -> Vec<LeafletRequirement> {
        self.lock().leaflets.clone()
    }

    pub fn things(&self) -> Vec<Thing> {
        self.lock().things.clone()
    }

    pub fn sack_count(&self, color: &str) -> u32 {
        self.lock().sack.get(color).copied().unwrap_or(0)
    }

    /// Top the world up to `min_things` random things
    pub fn refill(&self) {
        let mut state = self.lock();
        while state.things.len() < self.config.min_things {
            let thing = spawn_random(&mut state, &self.config);
            debug!(
                thing = thing.name(),
                category = ?thing.category(),
                "spawned"
            );
            state.things.push(thing);
        }
    }

    fn is_visible(&self, state: &SimState, thing: &Thing) -> bool {
        let offset = thing.position() - state.position;
        let distance = offset.length();
        if distance <= self.config.reach {
            return true;
        }
        if distance > self.config.vision_range {
            return false;
        }
        let bearing = offset.y.atan2(offset.x);
        let half_fov = self.config.field_of_view_deg.to_radians() / 2.0;
        angle_between(bearing, state.heading) <= half_fov
    }

    fn take_within_reach(
        &self,
        state: &mut SimState,
        call: &str,
        name: &str,
        accepts: fn(&Thing) -> bool,
    ) -> Result<Thing> {
        let index = state
            .things
            .iter()
            .position(|thing| thing.name() == name && accepts(thing))
            .ok_or_else(|| AgentError::effector(call, format!("no '{}' in the world", name)))?;

        if state.things[index].distance_to(state.position) > self.config.reach {
            return Err(AgentError::effector(call, format!("'{}' is out of reach", name)));
        }
        Ok(state.things.remove(index))
    }
}

fn angle_between(a: f64, b: f64) -> f64 {
    let mut diff = (a - b) % (2.0 * PI);
    if diff > PI {
        diff -= 2.0 * PI;
    } else if diff < -PI {
        diff += 2.0 * PI;
    }
    diff.abs()
}

fn random_leaflets(rng: &mut ChaCha8Rng) -> Vec<LeafletRequirement> {
    let colors: Vec<&str> = JEWEL_COLORS.choose_multiple(rng, 3).copied().collect();
    colors
        .into_iter()
        .map(|color| LeafletRequirement::new(color, rng.gen_range(1..=3), 0))
        .collect()
}

fn spawn_random(state: &mut SimState, config: &SimWorldConfig) -> Thing {
    state.next_id += 1;
    let id = state.next_id;
    let position = Vec2::new(
        state.rng.gen_range(0.0..config.width),
        state.rng.gen_range(0.0..config.height),
    );

    let roll: f64 = state.rng.gen();
    if roll < 0.4 {
        let color = JEWEL_COLORS
            .choose(&mut state.rng)
            .copied()
            .unwrap_or("Red");
        Thing::jewel(format!("Jewel_{}", id), color, position)
    } else if roll < 0.6 {
        Thing::food(format!("Food_{}", id), position)
    } else if roll < 0.7 {
        Thing::partial_food(format!("PFood_{}", id), position)
    } else if roll < 0.8 {
        Thing::non_pure_food(format!("NPFood_{}", id), position)
    } else {
        Thing::brick(format!("Brick_{}", id), position)
    }
}

#[async_trait]
impl WorldSource for SimWorld {
    async fn fetch_snapshot(&self) -> Result<WorldSnapshot> {
        self.refill();
        let mut state = self.lock();
        if !state.available {
            return Err(AgentError::WorldUnavailable("world server offline".into()));
        }

        state.tick += 1;
        state.fuel = (state.fuel - self.config.fuel_decay).max(0.0);

        let things = state
            .things
            .iter()
            .filter(|thing| self.is_visible(&state, thing))
            .cloned()
            .collect();

        Ok(WorldSnapshot {
            position: state.position,
            vitals: Vitals::new(state.fuel),
            things,
            leaflets: state.leaflets.clone(),
        })
    }
}

#[async_trait]
impl Effector for SimWorld {
    async fn rotate(&self, speed: f64) -> Result<()> {
        let mut state = self.lock();
        let turn = speed * self.config.turn_rate_deg.to_radians();
        state.heading = (state.heading + turn) % (2.0 * PI);
        Ok(())
    }

    async fn move_to(&self, speed: f64, target: Vec2) -> Result<()> {
        let mut state = self.lock();
        let offset = target - state.position;
        let distance = offset.length();
        if distance <= f64::EPSILON {
            return Ok(());
        }

        let step = (speed * self.config.step_length).min(distance);
        state.heading = offset.y.atan2(offset.x);
        state.position = state.position + offset.normalize() * step;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    async fn stow(&self, thing: &str) -> Result<()> {
        let mut state = self.lock();
        let jewel = self.take_within_reach(&mut state, "stow", thing, Thing::is_jewel)?;
        let color = jewel.color().unwrap_or_default().to_string();

        *state.sack.entry(color.clone()).or_insert(0) += 1;
        if let Some(req) = state
            .leaflets
            .iter_mut()
            .find(|req| req.color == color && req.is_open())
        {
            req.collected += 1;
        }

        info!(jewel = thing, color = %color, "jewel stowed");
        Ok(())
    }

    async fn consume(&self, thing: &str) -> Result<()> {
        let mut state = self.lock();
        self.take_within_reach(&mut state, "consume", thing, Thing::is_food)?;
        let fuel = state.fuel + self.config.food_energy;
        state.fuel = fuel.min(self.config.max_fuel);

        info!(food = thing, fuel = state.fuel, "food eaten");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_config() -> SimWorldConfig {
        SimWorldConfig {
            min_things: 0,
            ..SimWorldConfig::default()
        }
    }

    fn layout(things: Vec<Thing>, leaflets: Vec<LeafletRequirement>) -> SimWorld {
        SimWorld::with_layout(empty_config(), Vec2::new(0.0, 0.0), things, leaflets)
    }

    #[tokio::test]
    async fn test_random_world_is_seeded() {
        let a = SimWorld::new(SimWorldConfig::default());
        let b = SimWorld::new(SimWorldConfig::default());
        assert_eq!(a.things(), b.things());
        assert_eq!(a.leaflets(), b.leaflets());
        assert_eq!(a.things().len(), 20);
    }

    #[tokio::test]
    async fn test_snapshot_burns_fuel() {
        let world = layout(vec![], vec![]);
        let before = world.fuel();
        world.fetch_snapshot().await.unwrap();
        assert_eq!(world.fuel(), before - 1.0);
    }

    #[tokio::test]
    async fn test_vision_cone() {
        let world = layout(
            vec![
                Thing::food("ahead", Vec2::new(100.0, 0.0)),
                Thing::food("behind", Vec2::new(-100.0, 0.0)),
                Thing::food("close-behind", Vec2::new(-10.0, 0.0)),
                Thing::food("too-far", Vec2::new(1000.0, 0.0)),
            ],
            vec![],
        );
        let snapshot = world.fetch_snapshot().await.unwrap();
        let names: Vec<_> = snapshot.things.iter().map(Thing::name).collect();
        assert_eq!(names, vec!["ahead", "close-behind"]);
    }

    #[tokio::test]
    async fn test_rotate_turns_heading() {
        let world = layout(vec![], vec![]);
        world.rotate(1.0).await.unwrap();
        assert!((world.heading() - 15f64.to_radians()).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_move_to_does_not_overshoot() {
        let world = layout(vec![], vec![]);
        world.move_to(3.0, Vec2::new(20.0, 0.0)).await.unwrap();
        assert_eq!(world.position(), Vec2::new(20.0, 0.0));

        world.move_to(1.0, Vec2::new(20.0, 100.0)).await.unwrap();
        assert_eq!(world.position(), Vec2::new(20.0, 10.0));
    }

    #[tokio::test]
    async fn test_stow_updates_sack_and_leaflet() {
        let world = layout(
            vec![Thing::jewel("ruby", "Red", Vec2::new(5.0, 0.0))],
            vec![LeafletRequirement::new("Red", 2, 0)],
        );
        world.stow("ruby").await.unwrap();

        assert_eq!(world.sack_count("Red"), 1);
        assert_eq!(world.leaflets()[0].collected, 1);
        assert!(world.things().is_empty());
    }

    #[tokio::test]
    async fn test_stow_missing_or_far_fails() {
        let world = layout(vec![Thing::jewel("ruby", "Red", Vec2::new(500.0, 0.0))], vec![]);
        assert!(matches!(
            world.stow("ruby").await,
            Err(AgentError::EffectorFailure { .. })
        ));
        assert!(matches!(
            world.stow("emerald").await,
            Err(AgentError::EffectorFailure { .. })
        ));
        assert_eq!(world.things().len(), 1);
    }

    #[tokio::test]
    async fn test_consume_restores_fuel() {
        let world = layout(vec![Thing::food("apple", Vec2::new(1.0, 1.0))], vec![]);
        world.set_fuel(100.0);
        world.consume("apple").await.unwrap();
        assert_eq!(world.fuel(), 400.0);
    }

    #[tokio::test]
    async fn test_consume_rejects_jewel() {
        let world = layout(vec![Thing::jewel("ruby", "Red", Vec2::new(1.0, 1.0))], vec![]);
        assert!(world.consume("ruby").await.is_err());
    }

    #[tokio::test]
    async fn test_outage() {
        let world = layout(vec![], vec![]);
        world.set_available(false);
        assert!(matches!(
            world.fetch_snapshot().await,
            Err(AgentError::WorldUnavailable(_))
        ));
        world.set_available(true);
        assert!(world.fetch_snapshot().await.is_ok());
    }

    #[test]
    fn test_angle_between_wraps() {
        assert!((angle_between(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-9);
        assert!(angle_between(0.0, 0.0).abs() < 1e-9);
    }
}
