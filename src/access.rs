//! # Access Policy
//!
//! The bot is private: only senders whose numeric Telegram id appears in the
//! `allowed_users` option may print. The policy is built once at startup and
//! shared read-only between message tasks.

use std::collections::HashSet;

use crate::error::ScrewieError;

/// Set of sender ids allowed to use the bot.
///
/// An empty policy denies everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed: HashSet<i64>,
}

impl AccessPolicy {
    pub fn new<I: IntoIterator<Item = i64>>(ids: I) -> Self {
        Self {
            allowed: ids.into_iter().collect(),
        }
    }

    /// Parse a whitespace-separated list of ids, e.g. `"123 456"`.
    ///
    /// ## Errors
    ///
    /// Returns [`ScrewieError::Config`] naming the first token that is not an integer.
    pub fn parse(list: &str) -> Result<Self, ScrewieError> {
        let ids = list
            .split_whitespace()
            .map(|token| {
                token.parse::<i64>().map_err(|_| {
                    ScrewieError::Config(format!("allowed_users: '{}' is not a user id", token))
                })
            })
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(Self { allowed: ids })
    }

    /// Membership test against the configured ids.
    pub fn is_authorized(&self, sender_id: i64) -> bool {
        self.allowed.contains(&sender_id)
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Allowed ids in ascending order (for logging).
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.allowed.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
