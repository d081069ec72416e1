//! Remote clear followed by a local reset.

use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{BackendClient, BackendError, ClearReply};
use crate::monitor::MonitorHandle;
use crate::stats::StatsSnapshot;

#[derive(Debug, Clone, Error)]
pub enum ClearError {
    /// The backend refused or could not be reached. Local state is untouched.
    #[error("clear request failed: {0}")]
    Backend(#[from] BackendError),

    #[error("backend log cleared, but the local monitor has stopped")]
    EngineStopped,
}

/// Result of a successful clear.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearOutcome {
    /// JSON reply from the backend (`Null` when the body was empty)
    pub reply: ClearReply,
    /// Stats right after the local reset
    pub stats: StatsSnapshot,
}

/// Clears the backend's retained events, then the local store and stats.
#[derive(Debug, Clone)]
pub struct ClearCommand {
    backend: BackendClient,
    engine: MonitorHandle,
}

impl ClearCommand {
    pub fn new(backend: BackendClient, engine: MonitorHandle) -> Self {
        Self { backend, engine }
    }

    /// Run the clear once. The local reset only happens after the backend
    /// accepted the request.
    pub async fn execute(&self) -> Result<ClearOutcome, ClearError> {
        let reply = match self.backend.clear().await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Clear failed, keeping local state: {}", e);
                return Err(e.into());
            }
        };
        info!("Backend event log cleared");

        let stats = self.engine.reset().await.map_err(|e| {
            warn!("Local reset skipped: {}", e);
            ClearError::EngineStopped
        })?;

        Ok(ClearOutcome { reply, stats })
    }
}
