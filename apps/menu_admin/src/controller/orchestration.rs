//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};
use shared::protocol::StoreIntent;

use crate::backend_bridge::commands::BackendCommand;

pub const QUEUE_FULL_STATUS: &str = "UI command queue is full; please retry";
pub const DISCONNECTED_STATUS: &str =
    "Backend command processor disconnected (possible startup/runtime failure); restart the app";

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = QUEUE_FULL_STATUS.to_string();
            tracing::warn!(command = cmd_name, "ui->backend command queue is full");
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = DISCONNECTED_STATUS.to_string();
            tracing::error!(command = cmd_name, "ui->backend command queue disconnected");
        }
    }
}

/// Where the screen sends its intents.
pub trait IntentSink {
    fn dispatch(&mut self, intent: StoreIntent);
}

/// Forwards intents to the backend worker; queue problems land in `status`.
pub struct BackendDispatcher {
    cmd_tx: Sender<BackendCommand>,
    status: String,
}

impl BackendDispatcher {
    pub fn new(cmd_tx: Sender<BackendCommand>) -> Self {
        Self {
            cmd_tx,
            status: String::new(),
        }
    }

    pub fn send(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    /// Takes the last queue status message, if any.
    pub fn take_status(&mut self) -> Option<String> {
        if self.status.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.status))
        }
    }
}

impl IntentSink for BackendDispatcher {
    fn dispatch(&mut self, intent: StoreIntent) {
        self.send(BackendCommand::Store(intent));
    }
}

impl IntentSink for Vec<StoreIntent> {
    fn dispatch(&mut self, intent: StoreIntent) {
        self.push(intent);
    }
}

#[cfg(test)]
#[path = "tests/orchestration_tests.rs"]
mod tests;
