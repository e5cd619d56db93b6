//! Tabula - server-side tabular queries for any entity.
//!
//! This facade crate re-exports the Tabula sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use tabula::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature  | Default | Crate                       |
//! |----------|---------|-----------------------------|
//! | `http`   | **yes** | `tabula-http` (Axum routes) |
//! | `sqlite` | no      | `tabula-data-sqlx`          |
//! | `full`   | no      | All of the above            |

pub extern crate tabula_core;
pub extern crate tabula_data;

// Core items (config, errors, tracing setup) at the top level.
pub use tabula_core::*;

#[cfg(feature = "http")]
pub use tabula_http;

#[cfg(feature = "sqlite")]
pub use tabula_data_sqlx;

/// Unified prelude - import everything with `use tabula::prelude::*`.
///
/// Includes the core and data preludes plus types from all enabled feature
/// crates.
pub mod prelude {
    pub use tabula_core::prelude::*;
    pub use tabula_data::prelude::*;

    #[cfg(feature = "http")]
    pub use tabula_http::prelude::*;

    #[cfg(feature = "sqlite")]
    pub use tabula_data_sqlx::prelude::*;
}
