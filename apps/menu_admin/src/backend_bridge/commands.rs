//! Backend commands queued from UI to backend worker.

use shared::protocol::StoreIntent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Store(StoreIntent),
    HealthCheck,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Store(intent) => intent.kind(),
            BackendCommand::HealthCheck => "health_check",
        }
    }
}
