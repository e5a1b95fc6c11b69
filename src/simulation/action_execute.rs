//! Action execution - turns an `ActionState` into effector calls
//!
//! Effector failures never escape this module: each one is logged and
//! recorded in the report so the tick can carry on. The report is owned by
//! the caller, so calls made before a dispatch timeout are still accounted for.

use tracing::{debug, warn};

use crate::core::config::AgentConfig;
use crate::core::error::{AgentError, Result};
use crate::entity::thing::Thing;
use crate::simulation::action_select::{ActionKind, ActionState};
use crate::simulation::perception::Percept;
use crate::world::Effector;

/// Effector call issued during execution
#[derive(Debug, Clone, PartialEq)]
pub enum EffectorCall {
    Rotate,
    MoveTo,
    Stop,
    Stow(String),
    Consume(String),
}

impl EffectorCall {
    pub fn name(&self) -> &'static str {
        match self {
            EffectorCall::Rotate => "rotate",
            EffectorCall::MoveTo => "moveTo",
            EffectorCall::Stop => "stop",
            EffectorCall::Stow(_) => "stow",
            EffectorCall::Consume(_) => "consume",
        }
    }
}

/// What one execution did
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub succeeded: Vec<EffectorCall>,
    pub failed: Vec<(EffectorCall, AgentError)>,
}

impl ExecutionReport {
    fn record(&mut self, call: EffectorCall, result: Result<()>) {
        match result {
            Ok(()) => self.succeeded.push(call),
            Err(err) => {
                warn!(call = call.name(), error = %err, "effector call failed");
                self.failed.push((call, err));
            }
        }
    }
}

/// Speeds used for effector commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionSpeeds {
    pub rotate: f64,
    pub movement: f64,
}

impl ExecutionSpeeds {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            rotate: config.rotate_speed,
            movement: config.move_speed,
        }
    }
}

impl Default for ExecutionSpeeds {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

/// Issue the effector commands for one action, recording each into `report`
pub async fn execute(
    action: &ActionState,
    percept: &Percept,
    effector: &dyn Effector,
    speeds: &ExecutionSpeeds,
    report: &mut ExecutionReport,
) {
    if action.is_noop() {
        debug!(action = %action.kind, "no target this tick");
        return;
    }

    match action.kind {
        ActionKind::Rotate => {
            let result = effector.rotate(speeds.rotate).await;
            report.record(EffectorCall::Rotate, result);
        }
        ActionKind::GotoFood | ActionKind::GotoJewel => {
            if let Some(target) = action.target {
                let result = effector.move_to(speeds.movement, target).await;
                report.record(EffectorCall::MoveTo, result);
            }
        }
        ActionKind::Collect => collect(percept, effector, report).await,
    }
}

async fn collect(percept: &Percept, effector: &dyn Effector, report: &mut ExecutionReport) {
    let result = effector.stop().await;
    report.record(EffectorCall::Stop, result);

    for thing in percept.things_ahead() {
        collect_one(thing, effector, report).await;
    }
}

async fn collect_one(thing: &Thing, effector: &dyn Effector, report: &mut ExecutionReport) {
    if thing.is_jewel() {
        let result = effector.stow(thing.name()).await;
        report.record(EffectorCall::Stow(thing.name().to_string()), result);
    } else if thing.is_food() {
        let result = effector.consume(thing.name()).await;
        report.record(EffectorCall::Consume(thing.name().to_string()), result);
    } else {
        debug!(
            thing = thing.name(),
            category = ?thing.category(),
            "nothing to collect"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Effector that records calls and fails the ones named in `failing`
    #[derive(Default)]
    struct RecordingEffector {
        calls: Mutex<Vec<String>>,
        failing: Vec<&'static str>,
    }

    impl RecordingEffector {
        fn failing(calls: &[&'static str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failing: calls.to_vec(),
            }
        }

        fn log(&self, call: &'static str, detail: String) -> Result<()> {
            let entry = format!("{}:{}", call, detail);
            self.calls.lock().unwrap().push(entry);
            if self.failing.contains(&call) {
                Err(AgentError::effector(call, "thing vanished"))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Effector for RecordingEffector {
        async fn rotate(&self, speed: f64) -> Result<()> {
            self.log("rotate", speed.to_string())
        }
        async fn move_to(&self, speed: f64, target: Vec2) -> Result<()> {
            self.log("move_to", format!("{}@{},{}", speed, target.x, target.y))
        }
        async fn stop(&self) -> Result<()> {
            self.log("stop", String::new())
        }
        async fn stow(&self, thing: &str) -> Result<()> {
            self.log("stow", thing.to_string())
        }
        async fn consume(&self, thing: &str) -> Result<()> {
            self.log("consume", thing.to_string())
        }
    }

    fn near(thing: Thing) -> Percept {
        Percept {
            near_thing: Some(thing),
            ..Percept::default()
        }
    }

    async fn run(
        action: ActionState,
        percept: &Percept,
        effector: &RecordingEffector,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let speeds = ExecutionSpeeds::default();
        execute(&action, percept, effector, &speeds, &mut report).await;
        report
    }

    fn collect_action() -> ActionState {
        ActionState::new(ActionKind::Collect)
    }

    #[tokio::test]
    async fn test_rotate_uses_rotate_speed() {
        let effector = RecordingEffector::default();
        let action = ActionState::new(ActionKind::Rotate);
        let report = run(action, &Percept::default(), &effector).await;

        assert!(report.failed.is_empty());
        assert_eq!(effector.calls(), vec!["rotate:1"]);
    }

    #[tokio::test]
    async fn test_goto_moves_to_target() {
        let effector = RecordingEffector::default();
        let target = Vec2::new(4.0, 5.0);
        let action = ActionState::new(ActionKind::GotoFood).with_target(target);
        run(action, &Percept::default(), &effector).await;
        assert_eq!(effector.calls(), vec!["move_to:3@4,5"]);
    }

    #[tokio::test]
    async fn test_goto_without_target_issues_nothing() {
        let effector = RecordingEffector::default();
        let action = ActionState::new(ActionKind::GotoJewel);
        assert!(action.is_noop());

        let report = run(action, &Percept::default(), &effector).await;
        assert!(effector.calls().is_empty());
        assert!(report.succeeded.is_empty());
    }

    #[tokio::test]
    async fn test_collect_jewel_stows() {
        let effector = RecordingEffector::default();
        let percept = near(Thing::jewel("ruby", "Red", Vec2::new(1.0, 0.0)));
        run(collect_action(), &percept, &effector).await;
        assert_eq!(effector.calls(), vec!["stop:", "stow:ruby"]);
    }

    #[tokio::test]
    async fn test_collect_food_consumes() {
        let effector = RecordingEffector::default();
        let percept = near(Thing::partial_food("nut", Vec2::new(1.0, 0.0)));
        run(collect_action(), &percept, &effector).await;
        assert_eq!(effector.calls(), vec!["stop:", "consume:nut"]);
    }

    #[tokio::test]
    async fn test_collect_brick_only_stops() {
        let effector = RecordingEffector::default();
        let percept = near(Thing::brick("wall", Vec2::new(1.0, 0.0)));
        run(collect_action(), &percept, &effector).await;
        assert_eq!(effector.calls(), vec!["stop:"]);
    }

    #[tokio::test]
    async fn test_collect_with_nothing_ahead() {
        let effector = RecordingEffector::default();
        let report = run(collect_action(), &Percept::default(), &effector).await;
        assert!(report.failed.is_empty());
        assert_eq!(effector.calls(), vec!["stop:"]);
    }

    #[tokio::test]
    async fn test_effector_failure_is_reported_not_raised() {
        let effector = RecordingEffector::failing(&["stow"]);
        let percept = near(Thing::jewel("ruby", "Red", Vec2::new(1.0, 0.0)));
        let report = run(collect_action(), &percept, &effector).await;

        assert_eq!(report.succeeded, vec![EffectorCall::Stop]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, EffectorCall::Stow("ruby".into()));
    }
}
