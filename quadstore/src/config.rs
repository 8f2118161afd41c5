//! Store configuration.
//!
//! Configuration can be built in code, deserialized from a host process's
//! configuration file, or loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `QUADSTORE_CACHE_SIZE`: Engine page cache size in bytes (default: engine default)
//! - `QUADSTORE_PAGE_SIZE`: Values fetched per bulk index read (default: `256`)
//! - `QUADSTORE_DURABLE_COMMITS`: `true` to fsync every commit (default: `true`)
//!
//! # Invariants
//!
//! - `page_size` is always at least 1

use serde::Deserialize;

/// Configuration for opening a quad store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Engine page cache size in bytes. `None` keeps the engine default.
    pub cache_size: Option<usize>,
    /// Number of index values fetched per bulk read.
    pub page_size: usize,
    /// Whether every write transaction is synced to disk before returning.
    pub durable_commits: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_size: None,
            page_size: Self::DEFAULT_PAGE_SIZE,
            durable_commits: true,
        }
    }
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl StoreConfig {
    /// Default number of values per bulk index read.
    pub const DEFAULT_PAGE_SIZE: usize = 256;

    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine cache size.
    #[must_use]
    pub const fn cache_size(mut self, bytes: usize) -> Self {
        self.cache_size = Some(bytes);
        self
    }

    /// Set the bulk read page size. Values below 1 are raised to 1.
    #[must_use]
    pub fn page_size(mut self, values: usize) -> Self {
        self.page_size = values.max(1);
        self
    }

    /// Choose between synced and eventual commits.
    #[must_use]
    pub const fn durable_commits(mut self, durable: bool) -> Self {
        self.durable_commits = durable;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed, or if
    /// `QUADSTORE_PAGE_SIZE` is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("QUADSTORE_CACHE_SIZE") {
            config.cache_size = Some(parse_number("QUADSTORE_CACHE_SIZE", &value)?);
        }

        if let Some(value) = lookup("QUADSTORE_PAGE_SIZE") {
            let page_size = parse_number("QUADSTORE_PAGE_SIZE", &value)?;
            if page_size == 0 {
                return Err(ConfigError::InvalidValue {
                    name: "QUADSTORE_PAGE_SIZE".to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
            config.page_size = page_size;
        }

        if let Some(value) = lookup("QUADSTORE_DURABLE_COMMITS") {
            config.durable_commits = match value.as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "QUADSTORE_DURABLE_COMMITS".to_string(),
                        message: format!("'{value}' is not a boolean"),
                    });
                }
            };
        }

        Ok(config)
    }
}

fn parse_number(name: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        message: format!("'{value}' is not a valid non-negative integer"),
    })
}
