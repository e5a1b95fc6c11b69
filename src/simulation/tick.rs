//! Tick system - drives the creature's control loop
//!
//! Each tick runs:
//! fetch snapshot -> classify -> publish sensory frame -> drain commands -> decide -> execute
//! -> evaluate detectors
//!
//! A tick whose fetch fails or times out is skipped: no frame is published,
//! queued commands stay queued and the current action is untouched.

use std::sync::Arc;

use serde::Serialize;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::command::channel::CommandQueue;
use crate::core::config::AgentConfig;
use crate::core::error::{AgentError, Result};
use crate::core::types::{Tick, Vec2};
use crate::sensory::{DetectorSet, SensoryCache, SensoryFrame};
use crate::simulation::action_execute::{execute, ExecutionReport, ExecutionSpeeds};
use crate::simulation::action_select::{ActionKind, ActionSelector, CommandOutcome};
use crate::simulation::perception::{Percept, PerceptionThresholds};
use crate::world::{Effector, WorldSource};

/// Events generated during a tick
///
/// Returned by `TickDriver::run_tick` for logging or JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    /// No snapshot this tick; nothing else ran
    TickSkipped { tick: Tick, reason: String },
    CommandApplied { tick: Tick, action: ActionKind },
    CommandRejected { tick: Tick, command: String },
    /// Summary of the classified percept (thing names only)
    PerceptionUpdate {
        tick: Tick,
        fuel: f64,
        near_thing: Option<String>,
        needed_jewel: Option<String>,
        surplus_jewel: Option<String>,
        food: Option<String>,
    },
    ActionPerformed {
        tick: Tick,
        action: ActionKind,
        target: Option<Vec2>,
        /// Effector calls that succeeded
        calls: usize,
    },
    EffectorFailed {
        tick: Tick,
        call: String,
        error: String,
    },
    DetectorActivations {
        tick: Tick,
        activations: Vec<(String, f64)>,
    },
    /// A detector could not read its slot this tick
    DetectorFailed {
        tick: Tick,
        detector: String,
        error: String,
    },
}

impl AgentEvent {
    pub fn tick(&self) -> Tick {
        match self {
            AgentEvent::TickSkipped { tick, .. }
            | AgentEvent::CommandApplied { tick, .. }
            | AgentEvent::CommandRejected { tick, .. }
            | AgentEvent::PerceptionUpdate { tick, .. }
            | AgentEvent::ActionPerformed { tick, .. }
            | AgentEvent::EffectorFailed { tick, .. }
            | AgentEvent::DetectorActivations { tick, .. }
            | AgentEvent::DetectorFailed { tick, .. } => *tick,
        }
    }
}

fn perception_event(tick: Tick, fuel: f64, percept: &Percept) -> AgentEvent {
    let name = |thing: &Option<crate::entity::Thing>| thing.as_ref().map(|t| t.name().to_string());
    AgentEvent::PerceptionUpdate {
        tick,
        fuel,
        near_thing: name(&percept.near_thing),
        needed_jewel: name(&percept.needed_jewel),
        surplus_jewel: name(&percept.surplus_jewel),
        food: name(&percept.food),
    }
}

/// Owns everything one creature needs between ticks
pub struct TickDriver {
    world: Arc<dyn WorldSource>,
    effector: Arc<dyn Effector>,
    selector: ActionSelector,
    cache: SensoryCache,
    detectors: DetectorSet,
    thresholds: PerceptionThresholds,
    speeds: ExecutionSpeeds,
    config: AgentConfig,
    tick: Tick,
}

impl TickDriver {
    /// Build a driver; fails if the configured detectors are invalid
    pub fn new(
        config: AgentConfig,
        world: Arc<dyn WorldSource>,
        effector: Arc<dyn Effector>,
        commands: CommandQueue,
    ) -> Result<Self> {
        let cache = SensoryCache::new();
        let detectors = DetectorSet::from_specs(&config.detectors, &cache)?;
        debug!(detectors = detectors.len(), "detectors built");

        Ok(Self {
            world,
            effector,
            selector: ActionSelector::new(commands),
            cache,
            detectors,
            thresholds: PerceptionThresholds::from_config(&config),
            speeds: ExecutionSpeeds::from_config(&config),
            config,
            tick: 0,
        })
    }

    /// Handle for detectors and other readers
    pub fn cache(&self) -> SensoryCache {
        self.cache.clone()
    }

    pub fn current_action(&self) -> ActionKind {
        self.selector.current()
    }

    /// Ticks attempted so far, skipped ones included
    pub fn ticks(&self) -> Tick {
        self.tick
    }

    /// Run one tick of the control loop
    pub async fn run_tick(&mut self) -> Vec<AgentEvent> {
        self.tick += 1;
        let tick = self.tick;
        let mut events = Vec::new();

        let fetch = self.world.fetch_snapshot();
        let snapshot = match timeout(self.config.fetch_timeout(), fetch).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(err)) => {
                warn!(tick, error = %err, "skipping tick");
                events.push(AgentEvent::TickSkipped {
                    tick,
                    reason: err.to_string(),
                });
                return events;
            }
            Err(_) => {
                let err = AgentError::WorldUnavailable("snapshot fetch timed out".into());
                warn!(tick, error = %err, "skipping tick");
                events.push(AgentEvent::TickSkipped {
                    tick,
                    reason: err.to_string(),
                });
                return events;
            }
        };

        // Perception
        let percept = snapshot.classify(&self.thresholds);
        self.cache.publish(SensoryFrame::from_percept(
            tick,
            &percept,
            &snapshot.vitals,
            self.config.max_fuel,
        ));
        events.push(perception_event(tick, snapshot.vitals.fuel, &percept));

        // Commands from outside override the current action
        for outcome in self.selector.apply_commands() {
            events.push(match outcome {
                CommandOutcome::Applied(action) => AgentEvent::CommandApplied { tick, action },
                CommandOutcome::Rejected(command) => AgentEvent::CommandRejected { tick, command },
            });
        }

        let action = self.selector.select(&percept);
        debug!(
            tick,
            action = %action.kind,
            target = ?action.target,
            "action selected"
        );

        // The report outlives the dispatch future so a timeout keeps what already ran
        let mut report = ExecutionReport::default();
        let dispatch = execute(
            &action,
            &percept,
            self.effector.as_ref(),
            &self.speeds,
            &mut report,
        );
        let timed_out = timeout(self.config.dispatch_timeout(), dispatch)
            .await
            .is_err();

        for (call, err) in &report.failed {
            events.push(AgentEvent::EffectorFailed {
                tick,
                call: call.name().to_string(),
                error: err.to_string(),
            });
        }
        if timed_out {
            let err = AgentError::effector(action.kind.command_name(), "dispatch timed out");
            warn!(
                tick,
                completed = report.succeeded.len(),
                error = %err,
                "effector dispatch abandoned"
            );
            events.push(AgentEvent::EffectorFailed {
                tick,
                call: action.kind.command_name().to_string(),
                error: err.to_string(),
            });
        }
        events.push(AgentEvent::ActionPerformed {
            tick,
            action: action.kind,
            target: action.target,
            calls: report.succeeded.len(),
        });

        // Detectors
        if !self.detectors.is_empty() {
            let readings = self.detectors.evaluate();
            if !readings.activations.is_empty() {
                events.push(AgentEvent::DetectorActivations {
                    tick,
                    activations: readings.activations,
                });
            }
            for (detector, err) in readings.failures {
                events.push(AgentEvent::DetectorFailed {
                    tick,
                    detector,
                    error: err.to_string(),
                });
            }
        }

        events
    }

    /// Run on the configured tick period until `max_ticks` (if any) is reached
    ///
    /// Late ticks are dropped rather than bunched up.
    pub async fn run<F>(&mut self, max_ticks: Option<Tick>, mut on_event: F)
    where
        F: FnMut(&AgentEvent),
    {
        let mut ticker = interval(self.config.tick_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            period_ms = self.config.tick_period_ms,
            max_ticks = ?max_ticks,
            "control loop started"
        );

        loop {
            if max_ticks.is_some_and(|limit| self.tick >= limit) {
                break;
            }
            ticker.tick().await;
            for event in self.run_tick().await {
                on_event(&event);
            }
        }

        info!(ticks = self.tick, "control loop finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::channel::command_channel;
    use crate::entity::{LeafletRequirement, Thing};
    use crate::sensory::{PresenceDetector, SensorySlot};
    use crate::world::{SimWorld, SimWorldConfig};

    fn sim_driver(world: Arc<SimWorld>) -> (TickDriver, crate::command::CommandSender) {
        let (tx, queue) = command_channel();
        let config = AgentConfig::default();
        let driver = TickDriver::new(config, world.clone(), world, queue).unwrap();
        (driver, tx)
    }

    fn quiet_world(things: Vec<Thing>) -> Arc<SimWorld> {
        Arc::new(SimWorld::with_layout(
            SimWorldConfig::default(),
            Vec2::new(100.0, 100.0),
            things,
            vec![LeafletRequirement::new("Red", 1, 0)],
        ))
    }

    #[tokio::test]
    async fn test_first_tick_rotates_and_publishes() {
        let world = quiet_world(vec![]);
        let (mut driver, _tx) = sim_driver(world);

        assert_eq!(driver.cache().tick(), None);
        let events = driver.run_tick().await;

        assert_eq!(driver.cache().tick(), Some(1));
        assert!(events.iter().any(|e| matches!(
            e,
            AgentEvent::ActionPerformed { action: ActionKind::Rotate, calls: 1, .. }
        )));
        assert!(events.iter().all(|e| e.tick() == 1));
    }

    #[tokio::test]
    async fn test_unavailable_world_skips_tick() {
        let world = quiet_world(vec![]);
        let (mut driver, tx) = sim_driver(world.clone());
        world.set_available(false);
        tx.send("agent.gotoFood");

        let events = driver.run_tick().await;

        assert!(matches!(events.as_slice(), [AgentEvent::TickSkipped { tick: 1, .. }]));
        assert_eq!(driver.current_action(), ActionKind::Rotate);
        assert_eq!(driver.cache().tick(), None);

        // The queued command survives the skipped tick
        world.set_available(true);
        driver.run_tick().await;
        assert_eq!(driver.current_action(), ActionKind::GotoFood);
    }

    #[tokio::test]
    async fn test_detectors_reported_each_tick() {
        let world = quiet_world(vec![]);
        let (mut driver, _tx) = sim_driver(world);

        let events = driver.run_tick().await;
        let activations = events.iter().find_map(|e| match e {
            AgentEvent::DetectorActivations { activations, .. } => Some(activations.clone()),
            _ => None,
        });
        assert_eq!(
            activations,
            Some(vec![("brick".to_string(), 0.0), ("bad_health".to_string(), 0.0)])
        );
    }

    #[tokio::test]
    async fn test_detector_failure_reported_alongside_activations() {
        let brick = Thing::brick("wall", Vec2::new(110.0, 100.0));
        let world = quiet_world(vec![brick]);
        let (mut driver, _tx) = sim_driver(world);
        // Built directly, so no spec validation stands in the way
        let oops = PresenceDetector::new("oops", SensorySlot::Health, driver.cache());
        driver.detectors.push(Box::new(oops));

        let events = driver.run_tick().await;

        let activations = events.iter().find_map(|e| match e {
            AgentEvent::DetectorActivations { activations, .. } => Some(activations.clone()),
            _ => None,
        });
        assert_eq!(
            activations,
            Some(vec![("brick".to_string(), 1.0), ("bad_health".to_string(), 0.0)])
        );
        assert!(events.iter().any(|e| matches!(
            e,
            AgentEvent::DetectorFailed { tick: 1, detector, .. } if detector == "oops"
        )));
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = AgentEvent::CommandRejected {
            tick: 3,
            command: "agent.fly".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"command_rejected\""));
        assert!(json.contains("\"tick\":3"));
    }
}
