//! SQLite access helpers.
//!
//! # Intention
//!
//! - [`DbAccessor`]: one open connection and `select`/`insert`/`update`/`delete`
//!   helpers that build statement text from caller-supplied fragments.
//! - [`orm`]: declarative table definitions, row creation, scoped
//!   transactions and column introspection over the same engine.
//!
//! # Architectural Boundaries
//!
//! - Storage, indexing and query execution belong to SQLite.
//! - Accessor values are spliced into the statement text; only the model
//!   layer binds parameters.
//! - Single-threaded and blocking; callers serialize access to a connection.

pub mod accessor;
pub mod config;
pub mod error;
pub mod logging;
pub mod orm;
pub mod sql;
pub mod value;

pub use accessor::{DbAccessor, ResultSet};
pub use config::SqliteConfig;
pub use error::{Error, Result};
pub use orm::{Database, Model};
pub use value::{format_literal, Value};
