// Environment-driven settings for the adapter.
//
// Responsibilities
// - Read config from environment with safe defaults. A value that does not
//   parse falls back to its default with a warning; startup never fails on
//   configuration alone.

use crate::core::streams::{DEFAULT_CHAIN_PREFIX, DEFAULT_PAYLOAD_PREFIX, StreamNames};

const DEFAULT_READ_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Page size for chain scans and global-log reads.
    pub read_batch_size: usize,
    pub snapshot_chain_prefix: String,
    pub snapshot_payload_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            read_batch_size: DEFAULT_READ_BATCH_SIZE,
            snapshot_chain_prefix: DEFAULT_CHAIN_PREFIX.to_string(),
            snapshot_payload_prefix: DEFAULT_PAYLOAD_PREFIX.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            read_batch_size: env_parsed("STREAM_JOURNAL_READ_BATCH_SIZE", defaults.read_batch_size),
            snapshot_chain_prefix: std::env::var("STREAM_JOURNAL_SNAPSHOT_CHAIN_PREFIX")
                .unwrap_or(defaults.snapshot_chain_prefix),
            snapshot_payload_prefix: std::env::var("STREAM_JOURNAL_SNAPSHOT_PAYLOAD_PREFIX")
                .unwrap_or(defaults.snapshot_payload_prefix),
        }
    }

    pub fn stream_names(&self) -> StreamNames {
        StreamNames::new(self.snapshot_chain_prefix.clone(), self.snapshot_payload_prefix.clone())
    }
}

fn env_parsed<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, %raw, "unparseable setting, using default");
            default
        }),
        Err(_) => default,
    }
}
