// ABOUTME: Error types for the PTY host
// Defines error conditions that can occur when serving terminal sessions

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid bind address: {0}")]
    InvalidBind(String),

    #[error("PTY creation failed: {0}")]
    PtyCreationFailed(String),

    #[error("Failed to start process: {0}")]
    SpawnFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
