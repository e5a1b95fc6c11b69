//! External command pipeline
//!
//! Commands arrive as strings from the cognitive layer, are queued on a
//! channel, and are parsed into an `ActionKind` when the tick driver drains
//! the queue:
//! "agent.gotoFood" -> CommandSender -> CommandQueue -> parse_command -> ActionKind

pub mod channel;
pub mod parser;

pub use channel::{command_channel, CommandQueue, CommandSender};
pub use parser::parse_command;
