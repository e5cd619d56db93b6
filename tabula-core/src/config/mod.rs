mod loader;
pub mod typed;
pub mod value;

use std::collections::HashMap;
use std::ops::Deref;
use std::path::Path;

pub use typed::ConfigProperties;
pub use value::{ConfigValue, FromConfigValue};

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
    /// A typed section rejected a value that parsed correctly.
    Invalid { key: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid { key, message } => {
                write!(f, "Invalid config value for '{key}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration loaded from YAML files, `.env` files, and environment variables.
///
/// `TabulaConfig` (= `TabulaConfig<()>`) provides raw key-value access only.
/// `TabulaConfig<T>` adds typed access to a config section via `Deref<Target = T>`.
///
/// Resolution order (lowest to highest priority):
/// 1. `application.yaml` (base)
/// 2. `application-{profile}.yaml` (profile override)
/// 3. `.env` file (loaded into process environment)
/// 4. `.env.{profile}` file (loaded into process environment)
/// 5. Environment variables (e.g., `TABULA_TABLE_MAX` overrides `tabula.table.max`)
///
/// `.env` files never overwrite already-set environment variables.
///
/// Profile is determined by: `TABULA_PROFILE` env var > argument > default `"dev"`.
#[derive(Debug, Clone)]
pub struct TabulaConfig<T = ()> {
    values: HashMap<String, ConfigValue>,
    profile: String,
    typed: T,
}

impl TabulaConfig {
    /// Load configuration for the given profile from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."), profile)
    }

    /// Load configuration for the given profile, reading the YAML and `.env`
    /// files from `dir`.
    pub fn load_from_dir(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile =
            std::env::var("TABULA_PROFILE").unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();

        loader::load_yaml_file(&dir.join("application.yaml"), &mut values)?;

        let profile_path = dir.join(format!("application-{active_profile}.yaml"));
        loader::load_yaml_file(&profile_path, &mut values)?;

        // Missing .env files are not an error.
        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        // Convention: `tabula.database.url` <-> `TABULA_DATABASE_URL`
        for (env_key, env_val) in std::env::vars() {
            let config_key = env_key.to_lowercase().replace('_', ".");
            values.insert(config_key, ConfigValue::String(env_val));
        }

        tracing::debug!(profile = %active_profile, keys = values.len(), "configuration loaded");

        Ok(TabulaConfig {
            values,
            profile: active_profile,
            typed: (),
        })
    }

    /// Create a config from a YAML string (useful for testing).
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(TabulaConfig {
            values,
            profile: profile.to_string(),
            typed: (),
        })
    }

    /// Create an empty config (useful for testing).
    pub fn empty() -> Self {
        TabulaConfig {
            values: HashMap::new(),
            profile: "test".to_string(),
            typed: (),
        }
    }

    /// Set a value programmatically.
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Upgrade to a typed config by constructing `C` from the raw values.
    ///
    /// ```ignore
    /// let config = TabulaConfig::load("dev")?.with_typed::<TableConfig>()?;
    /// config.default_length  // typed field access via Deref
    /// ```
    pub fn with_typed<C: ConfigProperties>(self) -> Result<TabulaConfig<C>, ConfigError> {
        let typed = C::from_config(&self)?;
        Ok(TabulaConfig {
            values: self.values,
            profile: self.profile,
            typed,
        })
    }
}

impl<T> TabulaConfig<T> {
    /// Get a typed value for the given dot-separated key.
    ///
    /// Keys containing underscores are also looked up in their
    /// environment-variable form (`default_length` -> `default.length`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the key does not exist, or
    /// `ConfigError::TypeMismatch` if the value cannot be converted.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .lookup(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Get a typed value, returning a default if the key is missing.
    ///
    /// A present value of the wrong type is still an error.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> Result<V, ConfigError> {
        match self.lookup(key) {
            Some(value) => V::from_config_value(value, key),
            None => Ok(default),
        }
    }

    /// Check whether a key exists in the config.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// The active profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Get a reference to the typed config layer.
    pub fn typed(&self) -> &T {
        &self.typed
    }

    // Environment overlays win over the YAML spelling of the same key.
    fn lookup(&self, key: &str) -> Option<&ConfigValue> {
        if key.contains('_') {
            if let Some(value) = self.values.get(&key.replace('_', ".")) {
                return Some(value);
            }
        }
        self.values.get(key)
    }
}

impl<T> Deref for TabulaConfig<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.typed
    }
}
