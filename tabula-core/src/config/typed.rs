use super::{ConfigError, TabulaConfig};

/// Trait for strongly-typed configuration sections.
///
/// ```ignore
/// impl ConfigProperties for DatabaseConfig {
///     fn prefix() -> &'static str { "tabula.database" }
///
///     fn from_config(config: &TabulaConfig) -> Result<Self, ConfigError> {
///         Ok(Self {
///             url: config.get("tabula.database.url")?,
///             max_connections: config.get_or("tabula.database.max_connections", 5)?,
///         })
///     }
/// }
/// ```
pub trait ConfigProperties: Sized {
    /// The configuration key prefix (e.g., `"tabula.database"`).
    fn prefix() -> &'static str;

    /// Construct from a `TabulaConfig` instance.
    fn from_config(config: &TabulaConfig) -> Result<Self, ConfigError>;

    /// Build the fully-qualified key for a property of this section.
    fn key(property: &str) -> String {
        format!("{}.{property}", Self::prefix())
    }
}
