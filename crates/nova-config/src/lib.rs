//! Configuration for `nova-reflect` and the process-wide `tracing` setup.
//!
//! Config files are TOML:
//!
//! ```toml
//! [cache]
//! enabled = true
//!
//! [bounds]
//! failure_policy = "retry"
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;
use std::sync::Once;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod schema;

pub use schema::{json_schema, json_schema_value};

/// Tracing target used by the reflection crates.
pub const REFLECT_TARGET: &str = "nova.reflect";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct ReflectConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub bounds: BoundsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct CacheConfig {
    /// Share resolved parameterized types through the process-wide canonical cache.
    ///
    /// When disabled every resolution constructs fresh values; results still compare equal.
    #[serde(default = "CacheConfig::default_enabled")]
    pub enabled: bool,
}

impl CacheConfig {
    fn default_enabled() -> bool {
        true
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
        }
    }
}

/// What a type variable or wildcard remembers after its bounds failed to resolve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BoundFailurePolicy {
    /// Leave the bounds unresolved; the next access tries again.
    #[default]
    Retry,
    /// Record the failure; later accesses replay it without another class lookup.
    Memoize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct BoundsConfig {
    #[serde(default)]
    pub failure_policy: BoundFailurePolicy,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`trace`, `debug`, `info`, `warn`, `error`) or a full `EnvFilter` directive
    /// string such as `nova.reflect=trace,info`.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            // Anything else is treated as an `EnvFilter` directive string.
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective filter: the configured level, with `RUST_LOG` merged on top when set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` includes a snippet of the input; keep just the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl ReflectConfig {
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::load_from_str(&text)?;
        tracing::debug!(
            target: REFLECT_TARGET,
            path = %path.display(),
            cache = config.cache.enabled,
            failure_policy = ?config.bounds.failure_policy,
            "loaded reflection config"
        );
        Ok(config)
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs a global `tracing` subscriber writing to stderr.
///
/// Safe to call multiple times; only the first call has an effect. If the host already installed
/// a subscriber, that one is kept.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(config.env_filter())
            .with_writer(std::io::stderr);
        let installed = if config.json {
            builder.json().try_init().is_ok()
        } else {
            builder.try_init().is_ok()
        };
        if installed {
            tracing::debug!(target: REFLECT_TARGET, json = config.json, "tracing initialized");
        }
    });
}
