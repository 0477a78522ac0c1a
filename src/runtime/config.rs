//! Runtime configuration types.
//!
//! In most cases use [`RuntimeBuilder`](super::builder::RuntimeBuilder) rather
//! than filling a [`RuntimeConfig`] by hand.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `sleep_quantum` | 5 ms |
//! | `lock_poll_interval` | 1 ms |
//! | `thread_name_prefix` | `"simrtos-task"` |
//! | `thread_stack_size` | 0 (host default) |
//!
//! The two durations trade cancellation latency against CPU spent polling.
//! Their exact values carry no semantic contract.

use std::time::Duration;

/// Default slice length for cancellable sleep.
pub const DEFAULT_SLEEP_QUANTUM: Duration = Duration::from_millis(5);
/// Default back-off between lock attempts made by a managed task.
pub const DEFAULT_LOCK_POLL_INTERVAL: Duration = Duration::from_millis(1);
/// Default prefix for native task thread names.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "simrtos-task";

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable was set to something unparseable.
    #[error("invalid value for {var}: expected {expected}, got {value:?}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Human description of the accepted format.
        expected: &'static str,
        /// The raw value found.
        value: String,
    },
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File path as given.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid TOML for this schema.
    #[error("failed to parse TOML config: {0}")]
    Parse(String),
}

/// The polling constants a task's checkpoints run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Slice length for cancellable sleep.
    pub sleep_quantum: Duration,
    /// Back-off between lock acquisition attempts.
    pub lock_poll_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            sleep_quantum: DEFAULT_SLEEP_QUANTUM,
            lock_poll_interval: DEFAULT_LOCK_POLL_INTERVAL,
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Slice length for cancellable sleep.
    pub sleep_quantum: Duration,
    /// Back-off between lock acquisition attempts made by a managed task.
    pub lock_poll_interval: Duration,
    /// Prefix for native thread names; the task name is appended.
    pub thread_name_prefix: String,
    /// Native stack size in bytes (0 = host default).
    pub thread_stack_size: usize,
}

impl RuntimeConfig {
    /// Normalize configuration values to safe defaults.
    pub fn normalize(&mut self) {
        if self.sleep_quantum < MIN_INTERVAL {
            self.sleep_quantum = MIN_INTERVAL;
        }
        if self.lock_poll_interval < MIN_INTERVAL {
            self.lock_poll_interval = MIN_INTERVAL;
        }
        if self.thread_name_prefix.is_empty() {
            self.thread_name_prefix = DEFAULT_THREAD_NAME_PREFIX.to_string();
        }
    }

    /// Returns the checkpoint timing carried into each task.
    #[must_use]
    pub fn timing(&self) -> Timing {
        Timing {
            sleep_quantum: self.sleep_quantum,
            lock_poll_interval: self.lock_poll_interval,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            sleep_quantum: DEFAULT_SLEEP_QUANTUM,
            lock_poll_interval: DEFAULT_LOCK_POLL_INTERVAL,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            thread_stack_size: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_test(name: &str) {
        crate::test_utils::init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn default_config_sane() {
        init_test("default_config_sane");
        let config = RuntimeConfig::default();
        crate::assert_with_log!(
            config.sleep_quantum >= config.lock_poll_interval,
            "quantum at least poll interval",
            true,
            config.sleep_quantum >= config.lock_poll_interval
        );
        assert_eq!(config.timing(), Timing::default());
        crate::test_complete!("default_config_sane");
    }

    #[test]
    fn normalize_clamps_zero_values() {
        init_test("normalize_clamps_zero_values");
        let mut config = RuntimeConfig {
            sleep_quantum: Duration::ZERO,
            lock_poll_interval: Duration::from_micros(10),
            thread_name_prefix: String::new(),
            thread_stack_size: 0,
        };
        config.normalize();
        assert_eq!(config.sleep_quantum, MIN_INTERVAL);
        assert_eq!(config.lock_poll_interval, MIN_INTERVAL);
        assert_eq!(config.thread_name_prefix, DEFAULT_THREAD_NAME_PREFIX);
        crate::test_complete!("normalize_clamps_zero_values");
    }

    #[test]
    fn normalize_keeps_valid_values() {
        let mut config = RuntimeConfig {
            sleep_quantum: Duration::from_millis(20),
            lock_poll_interval: Duration::from_millis(3),
            thread_name_prefix: "bus".to_string(),
            thread_stack_size: 64 * 1024,
        };
        let before = config.clone();
        config.normalize();
        assert_eq!(config, before);
    }

    #[test]
    fn config_error_messages() {
        let err = ConfigError::InvalidEnv {
            var: "SIMRTOS_SLEEP_QUANTUM_MS",
            expected: "milliseconds as an unsigned integer",
            value: "fast".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for SIMRTOS_SLEEP_QUANTUM_MS: expected milliseconds as an unsigned integer, got \"fast\""
        );
    }
}
