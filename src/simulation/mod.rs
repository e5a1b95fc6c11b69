//! Control loop: perception, action selection, action execution and the tick driver

pub mod action_execute;
pub mod action_select;
pub mod perception;
pub mod tick;

pub use action_execute::{execute, EffectorCall, ExecutionReport, ExecutionSpeeds};
pub use action_select::{decide, ActionKind, ActionSelector, ActionState, CommandOutcome, Decision};
pub use perception::{classify, Percept, PerceptionThresholds};
pub use tick::{AgentEvent, TickDriver};
