//! Errors reported back to clients as `status = "error"` responses.

use thiserror::Error;

/// A rejected request. The `Display` text becomes `data.message` in the
/// error response; no state has been changed when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("invalid parameters: {0}")]
    InvalidPayload(String),
    #[error("not logged in")]
    NotLoggedIn,
    #[error("user already exists")]
    UserExists,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("room does not exist")]
    RoomNotFound,
    #[error("room is full")]
    RoomFull,
    #[error("user is not in the room")]
    NotAMember,
    #[error("player already played this round")]
    AlreadyPlayed,
    #[error("round already has two plays")]
    RoundFull,
    #[error("connection closed")]
    ConnectionClosed,
}

/// Payload deserialization failures, including out-of-domain cards.
impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::InvalidPayload(e.to_string())
    }
}
