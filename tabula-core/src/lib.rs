//! # tabula-core - shared runtime pieces for Tabula
//!
//! Layered configuration ([`config`]), the HTTP-edge error type
//! ([`HttpError`]) and tracing setup ([`init_tracing`], [`default_trace`]).
//! The data layer lives in `tabula-data`; this crate knows nothing about
//! entities or queries.

pub mod config;
pub mod error;
pub mod layers;

pub use config::{ConfigError, ConfigProperties, ConfigValue, FromConfigValue, TabulaConfig};
pub use error::{error_response, HttpError};
pub use layers::{default_trace, init_tracing};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::{ConfigProperties, HttpError, TabulaConfig};
}
