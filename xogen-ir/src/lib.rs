//! Entity model for the xogen schema generator.
//!
//! # Architecture
//!
//! ```text
//! database → xogen-loader (Catalog) → xogen-codegen builder (SchemaDefinition) → templates
//! ```
//!
//! [`catalog`] holds the raw rows a loader returns for one connection, in
//! the order they were listed. [`model`] holds the resolved entities the
//! templates render: named, typed and cross-referenced. Both are built once
//! per run and never mutated afterwards.

pub mod catalog;
mod model;

pub use catalog::{
    Catalog, Column, ForeignKeyRow, IndexCatalog, IndexColumn, IndexRow, RelKind, Relation,
    RelationCatalog,
};
pub use model::{Field, ForeignKey, Index, Query, QueryParam, SchemaDefinition, Type};
