//! Error taxonomy surfaced by position providers.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Errors a position provider can report.
///
/// Providers never retry internally; the tracking controller records the
/// error and lets the next timer tick or watch sample try again.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum ProviderError {
    /// The user or platform refused access to location data.
    #[error("Location permission denied")]
    PermissionDenied,

    /// No fix could be obtained (no signal, sensor off, etc.).
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    /// The request did not complete within the configured timeout.
    #[error("Position request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Any other platform failure.
    #[error("Unknown position error: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Short machine-friendly kind name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::PermissionDenied => "permission_denied",
            ProviderError::PositionUnavailable(_) => "position_unavailable",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Unknown(_) => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ProviderError::PermissionDenied.to_string(),
            "Location permission denied"
        );
        assert_eq!(
            ProviderError::Timeout(Duration::from_secs(10)).to_string(),
            "Position request timed out after 10000ms"
        );
        assert!(ProviderError::PositionUnavailable("no signal".into())
            .to_string()
            .contains("no signal"));
    }

    #[test]
    fn test_kind() {
        assert_eq!(ProviderError::Unknown("x".into()).kind(), "unknown");
        assert_eq!(
            ProviderError::Timeout(Duration::ZERO).kind(),
            "timeout"
        );
    }
}
