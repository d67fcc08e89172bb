//! Error codes for the user service API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! Every code is SCREAMING_SNAKE_CASE and maps 1:1 to the string that
//! appears in HTTP responses.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request Validation
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,
    /// Path segment is not a valid user id
    InvalidUserId,
    /// Request body exceeds the accepted size
    PayloadTooLarge,

    // Resource Not Found
    /// User not found
    UserNotFound,
    /// General not found error
    NotFound,

    // Conflicts
    /// Username already taken
    UsernameTaken,
    /// Generic conflict (fallback for unmatched unique violations)
    Conflict,

    // System Errors
    /// Database error
    DbError,
    /// Database unreachable or pool exhausted
    DbUnavailable,
    /// Database timeout
    DbTimeout,
    /// Configuration error
    ConfigError,
    /// Internal server error
    Internal,
}

impl ErrorCode {
    /// Returns the canonical string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidUserId => "INVALID_USER_ID",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::Conflict => "CONFLICT",
            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DbTimeout => "DB_TIMEOUT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
