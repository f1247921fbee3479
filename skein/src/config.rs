//! Runtime configuration loaded from TOML.
//!
//! ```toml
//! worker-threads = 4
//! default-priority = "high"
//! thread-name = "app"
//! max-blocking-threads = 64
//!
//! [[pools]]
//! name = "io"
//! threads = 2
//! ```
//!
//! Every key is optional. A missing `worker-threads` means one worker per
//! logical CPU.

use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::runtime::builder::RuntimeBuilder;
use crate::runtime::task::Priority;

use serde::Deserialize;

use std::fs;
use std::path::Path;

/// Plain configuration values for a [`Runtime`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Worker threads of the default pool.
    pub worker_threads: Option<usize>,

    /// Priority given to tasks spawned without one.
    pub default_priority: Priority,

    /// Prefix of every runtime thread name.
    pub thread_name: Option<String>,

    /// Blocked workers each pool may replace at once.
    pub max_blocking_threads: Option<usize>,

    /// Extra named pools.
    pub pools: Vec<PoolConfig>,
}

/// One named pool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    pub name: String,
    pub threads: usize,
}

impl RuntimeConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] on malformed TOML or unknown keys.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("cannot read {}: {err}", path.display())))?;

        log::debug!("loading runtime configuration from {}", path.display());
        Self::from_toml_str(&source)
    }

    /// Builder seeded with these values.
    pub fn builder(&self) -> RuntimeBuilder {
        RuntimeBuilder::from_config(self)
    }

    /// Builds a runtime from these values.
    pub fn build(&self) -> Result<Runtime> {
        self.builder().build()
    }
}
