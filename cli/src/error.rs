use kilo_core::error::{ResolutionError, ShapeError, codes};
use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single backend call. Always recovered locally: polls leave
/// state untouched, resolutions move their resolver to `Failed`.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Network unreachable, timeout, or connection reset.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status.
    #[error("backend returned HTTP {status}")]
    Http { status: StatusCode },

    /// Pending body was JSON but of an unknown shape.
    #[error(transparent)]
    Body(#[from] ShapeError),

    /// Pending body was not JSON.
    #[error("invalid JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl NotifyError {
    /// Machine-readable code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => codes::TRANSPORT_ERROR,
            Self::Http { .. } => codes::HTTP_ERROR,
            Self::Body(_) | Self::Decode(_) => codes::UNEXPECTED_SHAPE,
        }
    }

    /// Exit code following the CLI convention: 1=4xx, 2=5xx/other, 3=connection.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Transport(_) => 3,
            Self::Http { status } if status.is_client_error() => 1,
            _ => 2,
        }
    }
}

/// A resolver call that was refused without touching the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("notification {0} already has a request in flight")]
    Busy(i64),

    #[error("notification {0} is already resolved")]
    AlreadyResolved(i64),

    #[error(transparent)]
    InvalidResolution(#[from] ResolutionError),
}

impl ResolveError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidResolution(_) => codes::INVALID_RESOLUTION,
            Self::Busy(_) | Self::AlreadyResolved(_) => codes::USAGE_ERROR,
        }
    }
}
