use crate::services::AuthError;
use thiserror::Error;

/// Reasons a connection is closed by the server.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionRefused {
    #[error("{0}")]
    Unauthenticated(#[from] AuthError),
    #[error("please join a diagram before taking this action!")]
    NotInRoom,
}
