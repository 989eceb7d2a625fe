//! # Message Formatting
//!
//! Builds the text printed on the receipt:
//!
//! ```text
//! 2024-05-01T14:00:00+02:00
//! alice
//!
//! message body...
//! ```
//!
//! The timestamp is converted to the configured time zone and written in
//! ISO-8601 with its UTC offset.

use chrono::SecondsFormat;
use chrono_tz::Tz;
use thiserror::Error;

use crate::message::Message;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// Message has no text; nothing should be printed.
    #[error("message has no text body")]
    MissingBody,
}

/// Format `message` for printing, with the header timestamp shown in `tz`.
pub fn format_document(message: &Message, tz: Tz) -> Result<String, FormatError> {
    let body = message
        .text
        .as_deref()
        .filter(|text| !text.is_empty())
        .ok_or(FormatError::MissingBody)?;

    let timestamp = message
        .timestamp
        .with_timezone(&tz)
        .to_rfc3339_opts(SecondsFormat::AutoSi, false);

    Ok(format!("{}\n{}\n\n{}", timestamp, message.display_name(), body))
}
