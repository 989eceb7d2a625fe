//! # Error Types
//!
//! This module defines error types used throughout the screwie library.
//!
//! Only startup and transport problems surface as [`ScrewieError`]. Conditions
//! that belong to a single message (denied sender, empty body, printer launch
//! failure) are reported as outcomes by [`crate::handler`] and
//! [`crate::dispatch`] instead.

use thiserror::Error;

/// Main error type for screwie operations
#[derive(Debug, Error)]
pub enum ScrewieError {
    /// Missing or invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Font file could not be read or parsed
    #[error("Font error: {0}")]
    Font(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Messaging transport errors (HTTP, API responses)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid printer command
    #[error("Invalid command: {0}")]
    Command(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
