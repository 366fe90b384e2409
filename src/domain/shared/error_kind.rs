use serde::Serialize;

/// Error taxonomy shared by both services. Each kind maps to a fixed HTTP
/// status class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    InvalidData,
    InsufficientFunds,
    /// A collaborator could not be consulted; the operation failed closed.
    Unavailable,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InvalidState | ErrorKind::InvalidData | ErrorKind::InsufficientFunds => 400,
            ErrorKind::Unavailable => 503,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::InvalidData => "invalid_data",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}
