//! Key-value configuration lookup. Every value is read as a string and parsed
//! at the point of use, the same way for every [`ConfigSource`].

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::ConfigError;

pub mod keys {
    pub const DATADOG_ENABLED: &str = "statsd_datadog_enabled";
    pub const STATSD_ON: &str = "statsd_on";
    pub const CUSTOM_CLIENT_PATH: &str = "statsd_custom_client_path";
    pub const HOST: &str = "statsd_host";
    pub const PORT: &str = "statsd_port";
    pub const PREFIX: &str = "statsd_prefix";
    pub const ALLOW_LIST: &str = "statsd_allow_list";
    pub const DATADOG_TAGS: &str = "statsd_datadog_tags";
    pub const NAME_HANDLER: &str = "stat_name_handler";
}

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8125;
pub const ENV_PREFIX: &str = "STATSGATE_";

pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn has_option(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// An in-memory config that can be changed while the process runs.
#[derive(Debug, Default)]
pub struct MapConfig {
    values: RwLock<HashMap<String, String>>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.values.write().insert(key.to_string(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.write().remove(key)
    }
}

impl<K, V> FromIterator<(K, V)> for MapConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: RwLock::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl ConfigSource for MapConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }
}

/// Reads `<prefix><KEY>` from the process environment, so `statsd_on` is
/// looked up as `STATSGATE_STATSD_ON` by default.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    prefix: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        Self::with_prefix(ENV_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_uppercase())
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvConfig {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(self.var_name(key)).ok()
    }
}

pub(crate) fn get_bool(
    config: &dyn ConfigSource,
    key: &'static str,
) -> Result<Option<bool>, ConfigError> {
    let Some(value) = config.get(key) else {
        return Ok(None);
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "t" | "true" => Ok(Some(true)),
        "0" | "f" | "false" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidBool { key, value }),
    }
}

pub(crate) fn get_port(config: &dyn ConfigSource, key: &'static str) -> Result<u16, ConfigError> {
    match config.get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidInt { key, value }),
        None => Ok(DEFAULT_PORT),
    }
}

/// Split a comma separated list of tags. Tags are kept verbatim, in order.
pub(crate) fn parse_tags(raw: Option<&str>) -> Vec<String> {
    match raw {
        None | Some("") => Vec::new(),
        Some(raw) => raw.split(',').map(String::from).collect(),
    }
}
