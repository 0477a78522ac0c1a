//! Environment variable and config file support for [`RuntimeConfig`].
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic**: values set via builder methods
//! 2. **Environment variables**: values from `SIMRTOS_*` env vars
//! 3. **Config file**: values loaded from a TOML file (requires `config-file` feature)
//! 4. **Defaults**: built-in defaults from [`RuntimeConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `SIMRTOS_SLEEP_QUANTUM_MS` | `u64` | `sleep_quantum` |
//! | `SIMRTOS_LOCK_POLL_INTERVAL_MS` | `u64` | `lock_poll_interval` |
//! | `SIMRTOS_THREAD_NAME_PREFIX` | `String` | `thread_name_prefix` |
//! | `SIMRTOS_THREAD_STACK_SIZE` | `usize` | `thread_stack_size` |

use std::time::Duration;

use crate::runtime::config::{ConfigError, RuntimeConfig};

/// Environment variable name for the sleep slice length.
pub const ENV_SLEEP_QUANTUM_MS: &str = "SIMRTOS_SLEEP_QUANTUM_MS";
/// Environment variable name for the lock polling back-off.
pub const ENV_LOCK_POLL_INTERVAL_MS: &str = "SIMRTOS_LOCK_POLL_INTERVAL_MS";
/// Environment variable name for the thread name prefix.
pub const ENV_THREAD_NAME_PREFIX: &str = "SIMRTOS_THREAD_NAME_PREFIX";
/// Environment variable name for the native stack size.
pub const ENV_THREAD_STACK_SIZE: &str = "SIMRTOS_THREAD_STACK_SIZE";

/// Apply environment variable overrides to a [`RuntimeConfig`].
///
/// Only variables that are set are applied.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnv`] if a variable is set but unparseable.
pub fn apply_env_overrides(config: &mut RuntimeConfig) -> Result<(), ConfigError> {
    if let Some(val) = read_env(ENV_SLEEP_QUANTUM_MS) {
        config.sleep_quantum = parse_millis(ENV_SLEEP_QUANTUM_MS, &val)?;
    }
    if let Some(val) = read_env(ENV_LOCK_POLL_INTERVAL_MS) {
        config.lock_poll_interval = parse_millis(ENV_LOCK_POLL_INTERVAL_MS, &val)?;
    }
    if let Some(val) = read_env(ENV_THREAD_NAME_PREFIX) {
        config.thread_name_prefix = val;
    }
    if let Some(val) = read_env(ENV_THREAD_STACK_SIZE) {
        config.thread_stack_size = parse_usize(ENV_THREAD_STACK_SIZE, &val)?;
    }
    Ok(())
}

/// Builds a configuration from defaults plus environment overrides.
///
/// # Errors
///
/// See [`apply_env_overrides`].
pub fn config_from_env() -> Result<RuntimeConfig, ConfigError> {
    let mut config = RuntimeConfig::default();
    apply_env_overrides(&mut config)?;
    config.normalize();
    Ok(config)
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_millis(var: &'static str, val: &str) -> Result<Duration, ConfigError> {
    val.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidEnv {
            var,
            expected: "milliseconds as an unsigned integer",
            value: val.to_string(),
        })
}

fn parse_usize(var: &'static str, val: &str) -> Result<usize, ConfigError> {
    val.trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidEnv {
            var,
            expected: "unsigned integer",
            value: val.to_string(),
        })
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable runtime configuration.
///
/// ```toml
/// [timing]
/// sleep_quantum_ms = 5
/// lock_poll_interval_ms = 1
///
/// [threads]
/// name_prefix = "sim-task"
/// stack_size = 262144
/// ```
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct RuntimeTomlConfig {
    /// Checkpoint timing.
    #[serde(default)]
    pub timing: TimingToml,
    /// Native thread settings.
    #[serde(default)]
    pub threads: ThreadsToml,
}

/// Timing section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct TimingToml {
    /// Sleep slice length in milliseconds.
    pub sleep_quantum_ms: Option<u64>,
    /// Lock polling back-off in milliseconds.
    pub lock_poll_interval_ms: Option<u64>,
}

/// Threads section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct ThreadsToml {
    /// Thread name prefix.
    pub name_prefix: Option<String>,
    /// Native stack size in bytes.
    pub stack_size: Option<usize>,
}

/// Apply a parsed TOML config to a [`RuntimeConfig`].
///
/// Only fields that are `Some` override the config.
#[cfg(feature = "config-file")]
pub fn apply_toml_config(config: &mut RuntimeConfig, toml: &RuntimeTomlConfig) {
    if let Some(ms) = toml.timing.sleep_quantum_ms {
        config.sleep_quantum = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.timing.lock_poll_interval_ms {
        config.lock_poll_interval = Duration::from_millis(ms);
    }
    if let Some(ref prefix) = toml.threads.name_prefix {
        config.thread_name_prefix.clone_from(prefix);
    }
    if let Some(size) = toml.threads.stack_size {
        config.thread_stack_size = size;
    }
}

/// Parse a TOML string into a [`RuntimeTomlConfig`].
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] on malformed input.
#[cfg(feature = "config-file")]
pub fn parse_toml_str(toml_str: &str) -> Result<RuntimeTomlConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Read and parse a TOML file into a [`RuntimeTomlConfig`].
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file can not be read, or
/// [`ConfigError::Parse`] on malformed content.
#[cfg(feature = "config-file")]
pub fn parse_toml_file(path: &std::path::Path) -> Result<RuntimeTomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_toml_str(&content)
}
