//! Action selection - the four-state reactive policy
//!
//! ROTATE is the initial and default state. GOTO_FOOD and GOTO_JEWEL are
//! sticky until a command replaces them. COLLECT runs once and hands control
//! back to ROTATE on the same tick, whatever it found.

use serde::Serialize;
use tracing::{info, warn};

use crate::command::channel::CommandQueue;
use crate::command::parser::parse_command;
use crate::core::types::Vec2;
use crate::entity::Thing;
use crate::simulation::perception::Percept;

/// Action the creature is carrying out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ActionKind {
    #[default]
    Rotate,
    GotoFood,
    GotoJewel,
    Collect,
}

impl ActionKind {
    /// Map the name used on the command channel
    pub fn from_command_name(name: &str) -> Option<Self> {
        match name {
            "rotate" => Some(ActionKind::Rotate),
            "gotoFood" => Some(ActionKind::GotoFood),
            "gotoJewel" => Some(ActionKind::GotoJewel),
            "get" => Some(ActionKind::Collect),
            _ => None,
        }
    }

    pub fn command_name(&self) -> &'static str {
        match self {
            ActionKind::Rotate => "rotate",
            ActionKind::GotoFood => "gotoFood",
            ActionKind::GotoJewel => "gotoJewel",
            ActionKind::Collect => "get",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.command_name())
    }
}

/// What to execute this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActionState {
    pub kind: ActionKind,
    pub target: Option<Vec2>,
}

impl ActionState {
    pub fn new(kind: ActionKind) -> Self {
        Self { kind, target: None }
    }

    pub fn with_target(mut self, target: Vec2) -> Self {
        self.target = Some(target);
        self
    }

    /// GOTO without a target: nothing to send this tick
    pub fn is_noop(&self) -> bool {
        matches!(self.kind, ActionKind::GotoFood | ActionKind::GotoJewel) && self.target.is_none()
    }
}

/// Result of one decision step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub action: ActionState,
    /// Action to carry into the next tick
    pub next: ActionKind,
}

/// Decide the action for this tick from the percept and the current state
pub fn decide(percept: &Percept, current: ActionKind) -> Decision {
    let action = match current {
        ActionKind::Rotate => ActionState::new(ActionKind::Rotate),
        ActionKind::GotoFood => target_of(ActionKind::GotoFood, percept.food.as_ref()),
        ActionKind::GotoJewel => target_of(ActionKind::GotoJewel, percept.needed_jewel.as_ref()),
        ActionKind::Collect => ActionState::new(ActionKind::Collect),
    };

    let next = match current {
        ActionKind::Collect => ActionKind::Rotate,
        other => other,
    };

    Decision { action, next }
}

fn target_of(kind: ActionKind, thing: Option<&Thing>) -> ActionState {
    let state = ActionState::new(kind);
    match thing {
        Some(thing) => state.with_target(thing.position()),
        None => state,
    }
}

/// Outcome of applying one queued command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Applied(ActionKind),
    Rejected(String),
}

/// Owns the current action and the queue of pending commands
#[derive(Debug)]
pub struct ActionSelector {
    current: ActionKind,
    commands: CommandQueue,
}

impl ActionSelector {
    pub fn new(commands: CommandQueue) -> Self {
        Self {
            current: ActionKind::Rotate,
            commands,
        }
    }

    pub fn current(&self) -> ActionKind {
        self.current
    }

    /// Drain queued commands; the last valid one wins
    ///
    /// Unknown commands are logged and leave the current action unchanged.
    pub fn apply_commands(&mut self) -> Vec<CommandOutcome> {
        self.commands
            .drain()
            .into_iter()
            .map(|raw| match parse_command(&raw) {
                Ok(kind) => {
                    if kind != self.current {
                        info!(from = %self.current, to = %kind, "action overridden by command");
                    }
                    self.current = kind;
                    CommandOutcome::Applied(kind)
                }
                Err(err) => {
                    warn!(error = %err, current = %self.current, "ignoring command");
                    CommandOutcome::Rejected(raw)
                }
            })
            .collect()
    }

    /// Decide this tick's action and advance the state
    pub fn select(&mut self, percept: &Percept) -> ActionState {
        let decision = decide(percept, self.current);
        if decision.next != self.current {
            info!(from = %self.current, to = %decision.next, "action completed");
        }
        self.current = decision.next;
        decision.action
    }

    /// Back to the default action
    pub fn reset(&mut self) {
        self.current = ActionKind::Rotate;
    }
}
