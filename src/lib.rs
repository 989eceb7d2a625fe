//! # Screwie - Telegram Message Printer
//!
//! Screwie is a Telegram bot that prints the messages it receives on a
//! thermal receipt printer. It provides:
//!
//! - **Access control**: only listed sender ids may print
//! - **Layout**: timestamp + sender header, greedy word wrap to a pixel width
//! - **Rasterization**: fixed-width 1-bit bitmap sized to its content
//! - **Dispatch**: PNG temp file handed to an external printer command
//!
//! ## Pipeline
//!
//! ```text
//! Telegram update → Message → AccessPolicy → text → wrapped lines → Canvas → PNG → printer_script
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`access`] | Allowed sender ids |
//! | [`format`] | Receipt text (header + body) |
//! | [`render`] | Word wrap, layout, fonts, canvas |
//! | [`dispatch`] | Temp file + external printer command |
//! | [`handler`] | Per-message pipeline |
//! | [`telegram`] | Bot API polling and replies |
//! | [`config`] | TOML configuration |
//! | [`error`] | Error types |

pub mod access;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod handler;
pub mod logging;
pub mod message;
pub mod render;
pub mod telegram;

// Re-exports for convenience
pub use access::AccessPolicy;
pub use error::ScrewieError;
pub use handler::{HandlerOutcome, RequestHandler};
pub use message::Message;
