// src/stores/mod.rs
//! Client-side collections kept in sync with the backend.
//!
//! Each store owns its state behind a `RwLock` and hands out cloned
//! snapshots. Guards are dropped before any request is awaited, so a store
//! can be shared through `Arc` and driven from several tasks.

pub mod accidents;
pub mod auth_logs;
pub mod chat;
pub mod experiments;
pub mod reagents;
pub mod users;

pub use accidents::AccidentStore;
pub use auth_logs::AuthLogStore;
pub use chat::ChatStore;
pub use experiments::ExperimentStore;
pub use reagents::ReagentStore;
pub use users::UserStore;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;

/// Where a store gets its data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSource {
    #[default]
    Live,
    /// Sample data only; no request is ever sent.
    Mock,
}

impl DataSource {
    pub fn from_config(config: &Config) -> Self {
        if config.data.use_mocks {
            DataSource::Mock
        } else {
            DataSource::Live
        }
    }

    pub fn is_mock(&self) -> bool {
        *self == DataSource::Mock
    }
}

// ==================== REQUEST SEQUENCING ====================

/// Proof that a request was the latest one issued for its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    key: String,
    seq: u64,
}

/// Monotonic counter per key. A response is applied only while its ticket
/// is still the newest for that key.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: Mutex<HashMap<String, u64>>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, key: impl Into<String>) -> Ticket {
        let key = key.into();
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = latest.entry(key.clone()).or_insert(0);
        *seq += 1;
        Ticket { key, seq: *seq }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.get(&ticket.key) == Some(&ticket.seq)
    }

    /// Like `is_current`, but logs the discard.
    pub(crate) fn accept(&self, ticket: &Ticket) -> bool {
        let current = self.is_current(ticket);
        if !current {
            log::debug!("Discarding stale response for '{}' (#{})", ticket.key, ticket.seq);
        }
        current
    }
}

// ==================== LOCK HELPERS ====================

pub(crate) fn read_state<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_state<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

pub(crate) fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequencer_latest_ticket_wins() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.issue("list");
        let second = sequencer.issue("list");
        assert!(!sequencer.is_current(&first));
        assert!(sequencer.is_current(&second));
    }

    #[test]
    fn test_sequencer_keys_are_independent() {
        let sequencer = RequestSequencer::new();
        let list = sequencer.issue("list");
        let detail = sequencer.issue("detail");
        assert!(sequencer.is_current(&list));
        assert!(sequencer.is_current(&detail));
    }

    #[test]
    fn test_data_source_from_config() {
        let mut config = Config::default();
        assert_eq!(DataSource::from_config(&config), DataSource::Live);
        config.data.use_mocks = true;
        assert!(DataSource::from_config(&config).is_mock());
    }
}
