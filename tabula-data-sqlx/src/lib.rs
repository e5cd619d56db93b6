//! # tabula-data-sqlx - SQLx backend for the Tabula data layer
//!
//! Provides [`SqlxStore`], a [`StorageDriver`](tabula_data::StorageDriver)
//! over a SQLite pool, and [`SqlxErrorExt`] for classifying `sqlx::Error`
//! into transient (`StorageUnavailable`) and fatal (`StorageCorruption`)
//! failures.
//!
//! # Quick start
//!
//! ```ignore
//! use tabula_data_sqlx::prelude::*;
//!
//! let pool = SqlitePool::connect("sqlite://categories.db").await?;
//! let repo = TableRepository::new(&Category::schema(), SqlxStore::<Category>::new(pool)?);
//! let result = repo.execute(&QuerySpec::new(0, 25).filter("garden")).await?;
//! ```
//!
//! The entity must implement `sqlx::FromRow` for SQLite rows. Fields that
//! hold a related entity are marked `#[sqlx(skip)]` and left empty on
//! fetched rows; related columns are still sortable through the schema.
//!
//! # Error bridging
//!
//! Due to Rust's orphan rules, `From<sqlx::Error> for DataError` can't be
//! implemented here. Use the [`SqlxErrorExt`] trait instead:
//!
//! ```ignore
//! use tabula_data_sqlx::SqlxErrorExt;
//!
//! sqlx::query("DELETE FROM categories WHERE id = ?")
//!     .bind(id)
//!     .execute(&pool)
//!     .await
//!     .map_err(|e| e.into_data_error())?;
//! ```

pub mod error;
pub mod store;

pub use error::{SqlxErrorExt, SqlxResult};
pub use sqlx::SqlitePool;
pub use store::{SqlxSnapshot, SqlxStore};

/// Re-exports of the most commonly used types from both `tabula-data` and this crate.
pub mod prelude {
    pub use crate::{SqlitePool, SqlxErrorExt, SqlxStore};
    pub use tabula_data::prelude::*;
}
