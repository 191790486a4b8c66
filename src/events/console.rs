//! Console line messages.
//!
//! A [`ConsoleLine`] carries one typed command line towards the cvar
//! registry; the evaluating system answers with a [`ConsoleReply`] so UI
//! layers can echo results without touching the registry themselves.

use bevy_ecs::prelude::Message;

use crate::resources::cvars::CmdOutcome;

/// One line submitted for evaluation, e.g. `set cl_particles 1`.
#[derive(Message, Debug, Clone)]
pub struct ConsoleLine {
    pub line: String,
}

impl ConsoleLine {
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }
}

/// Result of evaluating one submitted line.
#[derive(Message, Debug, Clone)]
pub struct ConsoleReply {
    pub line: String,
    pub outcome: CmdOutcome,
}
