//! Unified error handling.
//!
//! Each concern defines its own error type next to the code that raises it
//! ([`ClassificationError`](crate::events::ClassificationError),
//! [`BackendError`](crate::backend::BackendError),
//! [`ClearError`](crate::clear::ClearError),
//! [`ConfigError`](crate::config::ConfigError) and the transport's
//! [`HttpError`](crate::traits::HttpError)). [`MonitorError`] unifies them
//! for callers that want one type to categorize, retry and report.
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection, DNS, timeout | Yes |
//! | Server | Backend errors (5xx) | Yes |
//! | Data | Malformed events or replies | No |
//! | Configuration | Invalid settings | No |
//! | Internal | Monitor stopped | No |

mod category;
mod monitor_error;

pub use category::ErrorCategory;
pub use monitor_error::MonitorError;

/// Type alias for Results using MonitorError.
pub type MonitorResult<T> = Result<T, MonitorError>;
