//! # Runtime Configuration Module
//!
//! Configuration for the coroutine runtime behind managed-async invocation
//! and channel dispatchers.
//!
//! ## Environment Variables
//!
//! ### `BRRTI_STACK_SIZE`
//!
//! Stack size for managed-async and handler coroutines. Accepts decimal
//! (`65536`) or hexadecimal (`0x10000`). Default: `0x10000` (64 KB).
//!
//! ### `BRRTI_MANAGED_WORKERS`
//!
//! Number of coroutines executing managed-async units. Default: `4`.
//!
//! ## Usage
//!
//! ```rust
//! use brrtinvoker::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```
//!
//! The same settings can be loaded from YAML:
//!
//! ```rust
//! use brrtinvoker::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_yaml_str("stack_size: 0x8000\nmanaged_workers: 2\n").unwrap();
//! assert_eq!(config.stack_size, 0x8000);
//! assert_eq!(config.managed_workers, 2);
//! ```

use std::env;

use anyhow::Context;
use serde::{Deserialize, Deserializer};

const DEFAULT_STACK_SIZE: usize = 0x10000;
const DEFAULT_MANAGED_WORKERS: usize = 4;

/// Runtime configuration for coroutine stacks and the managed-async pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 64 KB / 0x10000)
    #[serde(deserialize_with = "deserialize_size")]
    pub stack_size: usize,
    /// Managed-async worker coroutines (default: 4)
    pub managed_workers: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            managed_workers: DEFAULT_MANAGED_WORKERS,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = env::var("BRRTI_STACK_SIZE")
            .ok()
            .and_then(|v| parse_size(&v))
            .unwrap_or(DEFAULT_STACK_SIZE);
        let managed_workers = env::var("BRRTI_MANAGED_WORKERS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_MANAGED_WORKERS);
        RuntimeConfig {
            stack_size,
            managed_workers,
        }
    }

    /// Parse configuration from a YAML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid YAML or a value has the
    /// wrong shape.
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("invalid runtime configuration")
    }
}

fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn deserialize_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(usize),
        Text(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => parse_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid size '{s}'"))),
    }
}
