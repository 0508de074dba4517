//! Schema loaders for the xogen schema generator.
//!
//! A [`Loader`] is the per-engine capability set: it owns the engine's
//! metadata queries, its type mapping, its placeholder syntax and its
//! identifier quoting. Loaders talk to the database through the
//! [`Database`] handle and return engine-neutral [`xogen_ir::Catalog`] rows.
//!
//! # Module Organization
//!
//! - [`database`] - Database handle capability and neutral rows
//! - [`connection`] - Opening handles from connection strings
//! - [`loader`] - The `Loader` capability set
//! - [`postgres`], [`oracle`] - Engine implementations
//! - [`registry`] - Engine to loader lookup
//! - [`testing`] - In-memory handle and fixture loader (feature-gated)

pub mod connection;
pub mod database;
pub mod loader;
pub mod oracle;
pub mod postgres;
pub mod registry;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use connection::connect;
pub use database::{Database, Row, Value};
pub use loader::{EscapeKind, Loader, ParsedType, parse_precision};
pub use oracle::OracleLoader;
pub use postgres::PostgresLoader;
pub use registry::LoaderRegistry;
