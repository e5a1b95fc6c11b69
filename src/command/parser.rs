//! Command string parsing

use crate::core::error::{AgentError, Result};
use crate::simulation::action_select::ActionKind;

/// Separator between namespace and action name
const NAMESPACE_SEPARATOR: char = '.';

/// Parse an external command into an action kind
///
/// Only the part after the last `.` is significant, so "agent.gotoFood",
/// "creature.agent.gotoFood" and "gotoFood" all select `GotoFood`. Matching is
/// exact; anything else is `UnknownCommand`.
pub fn parse_command(raw: &str) -> Result<ActionKind> {
    let trimmed = raw.trim();
    let name = trimmed
        .rsplit_once(NAMESPACE_SEPARATOR)
        .map(|(_, suffix)| suffix)
        .unwrap_or(trimmed);

    ActionKind::from_command_name(name)
        .ok_or_else(|| AgentError::UnknownCommand(raw.to_string()))
}
