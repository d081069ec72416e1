//! Unified error type for the monitor.

use thiserror::Error;

use super::category::ErrorCategory;
use crate::backend::BackendError;
use crate::clear::ClearError;
use crate::config::ConfigError;
use crate::events::ClassificationError;
use crate::traits::HttpError;

/// Unified error type for the monitor.
///
/// Wraps the error of each concern so callers can categorize, retry and
/// report failures uniformly.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A feed message could not be classified.
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    /// A backend endpoint failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The clear command failed.
    #[error(transparent)]
    Clear(#[from] ClearError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport failure outside a specific endpoint call.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The engine task is no longer running.
    #[error("monitor engine has stopped")]
    EngineStopped,
}

fn backend_category(err: &BackendError) -> ErrorCategory {
    match err {
        BackendError::Transport { .. } => ErrorCategory::Network,
        BackendError::Status { .. } => ErrorCategory::Server,
        BackendError::InvalidResponse { .. } => ErrorCategory::Data,
    }
}

impl MonitorError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            MonitorError::Classification(_) => ErrorCategory::Data,
            MonitorError::Backend(err) => backend_category(err),
            MonitorError::Clear(ClearError::Backend(err)) => backend_category(err),
            MonitorError::Clear(ClearError::EngineStopped) => ErrorCategory::Internal,
            MonitorError::Config(_) => ErrorCategory::Configuration,
            MonitorError::Http(HttpError::ServerError { .. }) => ErrorCategory::Server,
            MonitorError::Http(HttpError::InvalidUrl(_)) => ErrorCategory::Configuration,
            MonitorError::Http(_) => ErrorCategory::Network,
            MonitorError::EngineStopped => ErrorCategory::Internal,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            MonitorError::Backend(err) | MonitorError::Clear(ClearError::Backend(err)) => {
                err.is_retryable()
            }
            MonitorError::Http(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            MonitorError::Classification(_) => {
                "Received a message that is not a valid event.".to_string()
            }
            MonitorError::Backend(err) | MonitorError::Clear(ClearError::Backend(err)) => {
                match err {
                    BackendError::Transport { .. } => {
                        "Unable to reach the backend. Is it running?".to_string()
                    }
                    BackendError::Status { status, .. } => {
                        format!("The backend returned an error (HTTP {}).", status)
                    }
                    BackendError::InvalidResponse { .. } => {
                        "The backend sent a response that could not be read.".to_string()
                    }
                }
            }
            MonitorError::Clear(ClearError::EngineStopped) | MonitorError::EngineStopped => {
                "The monitor has stopped.".to_string()
            }
            MonitorError::Config(err) => format!("Invalid configuration: {}", err),
            MonitorError::Http(_) => "Unable to reach the backend. Is it running?".to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            MonitorError::Classification(_) => "E_EVENT_MALFORMED",
            MonitorError::Backend(BackendError::Transport { .. }) => "E_BACKEND_CONN",
            MonitorError::Backend(BackendError::Status { .. }) => "E_BACKEND_HTTP",
            MonitorError::Backend(BackendError::InvalidResponse { .. }) => "E_BACKEND_INVALID",
            MonitorError::Clear(ClearError::Backend(_)) => "E_CLEAR_FAILED",
            MonitorError::Clear(ClearError::EngineStopped) => "E_CLEAR_LOCAL",
            MonitorError::Config(_) => "E_CONFIG",
            MonitorError::Http(_) => "E_HTTP",
            MonitorError::EngineStopped => "E_ENGINE_STOPPED",
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}
