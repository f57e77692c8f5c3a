use thiserror::Error;

/// A raw pending item that cannot become a notification.
///
/// The item is dropped for the current poll cycle only; if the backend still
/// holds it, the next poll reconsiders it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed notification: {reason}")]
pub struct MalformedInputError {
    pub reason: String,
}

impl MalformedInputError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        codes::MALFORMED_INPUT
    }
}

/// The pending-notifications body was valid JSON but neither a bare array nor
/// an object wrapping one under `notifications`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("unexpected response shape: expected array or {{\"notifications\": [...]}}, got {found}")]
    UnexpectedShape { found: &'static str },
}

/// A requested resolution that must be rejected before reaching the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("snoozed resolution requires snooze_minutes")]
    MissingSnoozeDuration,
    #[error("snooze_minutes must be one of 5, 15, 30 or 60 (got {0})")]
    UnsupportedSnoozeDuration(u32),
    #[error("snooze_minutes is only valid for a snoozed resolution (got {0})")]
    UnexpectedSnoozeDuration(u32),
    #[error("unknown resolution action '{0}'")]
    UnknownAction(String),
}

/// Machine-readable error codes shared by the client surfaces.
pub mod codes {
    pub const MALFORMED_INPUT: &str = "malformed_input";
    pub const UNEXPECTED_SHAPE: &str = "unexpected_shape";
    pub const INVALID_RESOLUTION: &str = "invalid_resolution";
    pub const TRANSPORT_ERROR: &str = "connection_error";
    pub const HTTP_ERROR: &str = "http_error";
    pub const USAGE_ERROR: &str = "cli_error";
}
