//! Inbound message model, independent of the transport it arrived on.

use chrono::{DateTime, Utc};

/// A message received from a sender.
///
/// Owned by the handler for one processing pass and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Numeric sender id, checked against the access policy.
    pub sender_id: i64,
    /// Chat the message was posted in; replies go here.
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Instant the message was sent.
    pub timestamp: DateTime<Utc>,
    pub text: Option<String>,
}

impl Message {
    /// Build a message with only the fields the pipeline needs.
    pub fn new(sender_id: i64, timestamp: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self {
            sender_id,
            chat_id: sender_id,
            username: None,
            first_name: None,
            last_name: None,
            timestamp,
            text: Some(text.into()),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Name printed in the receipt header.
    ///
    /// Username if set, then the full name, then the numeric id.
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return username.to_string();
        }

        let full_name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full_name.is_empty() {
            return full_name;
        }

        self.sender_id.to_string()
    }

    /// Whether this is a `/start` command (`/start`, `/start@bot`, `/start arg`).
    pub fn is_start_command(&self) -> bool {
        let Some(first) = self.text.as_deref().and_then(|t| t.split_whitespace().next()) else {
            return false;
        };
        first == "/start" || first.starts_with("/start@")
    }
}
