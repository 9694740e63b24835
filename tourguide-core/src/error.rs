use thiserror::Error;

/// Why a reference point could not be obtained
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("Timed out waiting for a position")]
    Timeout,
}

/// Rejected feedback submissions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedbackError {
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Message is too long ({0} characters, at most {1} allowed)")]
    MessageTooLong(usize, usize),
}
