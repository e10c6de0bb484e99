//! # Empire Engine Host
//!
//! Runs one [`empire_core::Engine`] inside a tokio task.
//!
//! The task is the only owner of the engine. Callers hold cloneable
//! [`EngineHandle`]s that send requests over a channel and await replies,
//! so every operation is applied one at a time in arrival order. Domain
//! events are rebroadcast to every subscriber.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod actor;

use std::path::{Path, PathBuf};
use std::time::Duration;

use empire_core::config::EngineConfig;
use empire_core::error::{CommandError, GameError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use actor::{log_events, spawn, EngineHandle};

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Milliseconds between automatic ticks; `0` disables the tick driver.
    pub tick_interval_ms: u64,
    /// Pending requests buffered before senders wait.
    pub command_buffer: usize,
    /// Events kept for slow subscribers before they start lagging.
    pub event_buffer: usize,
    /// Ruleset file; the standard ruleset when absent.
    pub ruleset: Option<PathBuf>,
    /// Save file resumed on start and written on shutdown.
    pub save_path: Option<PathBuf>,
    /// Engine tunables and the starting state of a new game.
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            command_buffer: 64,
            event_buffer: 256,
            ruleset: None,
            save_path: None,
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Configuration without the tick driver; time only advances on
    /// explicit tick commands.
    #[must_use]
    pub fn manual() -> Self {
        Self {
            tick_interval_ms: 0,
            ..Self::default()
        }
    }

    /// Interval of the tick driver, if enabled.
    #[must_use]
    pub fn tick_interval(&self) -> Option<Duration> {
        (self.tick_interval_ms > 0).then(|| Duration::from_millis(self.tick_interval_ms))
    }

    /// Load a configuration from a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> empire_core::error::Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.display().to_string(),
            source,
        })?;
        ron::from_str(&text).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Errors returned through an [`EngineHandle`].
#[derive(Debug, Error)]
pub enum ServerError {
    /// The engine rejected the command.
    #[error("Command rejected: {0}")]
    Command(#[from] CommandError),

    /// The engine task has stopped.
    #[error("Engine task is not running")]
    Closed,

    /// The engine answered a command with the wrong kind of outcome.
    #[error("Unexpected outcome: {0}")]
    UnexpectedOutcome(String),
}

/// Result type alias using [`ServerError`].
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_config_has_no_driver() {
        assert_eq!(ServerConfig::manual().tick_interval(), None);
        assert_eq!(
            ServerConfig::default().tick_interval(),
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_config_from_ron() {
        let config: ServerConfig = ron::from_str("(tick_interval_ms: 250)").unwrap();
        assert_eq!(config.tick_interval(), Some(Duration::from_millis(250)));
        assert_eq!(config.command_buffer, 64);
        assert!(config.save_path.is_none());
        assert_eq!(config.engine, EngineConfig::default());
    }
}
