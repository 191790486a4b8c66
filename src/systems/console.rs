//! Console evaluation system.
//!
//! Drains [`ConsoleLine`](crate::events::console::ConsoleLine) messages,
//! runs each through the [`CvarRegistry`], and answers with
//! [`ConsoleReply`](crate::events::console::ConsoleReply) messages.
use bevy_ecs::prelude::*;
use log::warn;

use crate::events::console::{ConsoleLine, ConsoleReply};
use crate::resources::cvars::{CmdOutcome, CvarRegistry};

/// Evaluate every console line submitted this frame.
pub fn eval_console_lines(
    mut lines: MessageReader<ConsoleLine>,
    mut replies: MessageWriter<ConsoleReply>,
    mut cvars: ResMut<CvarRegistry>,
) {
    for msg in lines.read() {
        let outcome = cvars.command(&msg.line);
        if outcome != CmdOutcome::Ok {
            warn!("console: {:?} for line '{}'", outcome, msg.line);
        }
        replies.write(ConsoleReply {
            line: msg.line.clone(),
            outcome,
        });
    }
}

/// Advance the ECS message queues for console traffic.
///
/// Bevy ECS' [`Messages`] API requires calling `update()` once per frame to
/// make messages written this frame visible to readers in the same frame.
/// Run this before [`eval_console_lines`] in your schedule.
pub fn update_console_messages(
    mut lines: ResMut<Messages<ConsoleLine>>,
    mut replies: ResMut<Messages<ConsoleReply>>,
) {
    lines.update();
    replies.update();
}
