//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid position '{fen}': {reason}")]
    InvalidPosition { fen: String, reason: String },

    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid move code: {0}")]
    InvalidMoveCode(String),

    #[error("Illegal move {from}{to} in '{fen}'")]
    IllegalMove {
        fen: String,
        from: String,
        to: String,
    },

    /// The caller's current position is not part of the history.
    #[error("Position not found in history: {0}")]
    PositionNotFound(String),

    #[error("Tree node not found: '{0}'")]
    NodeNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
