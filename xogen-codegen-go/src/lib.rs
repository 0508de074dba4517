//! Go output for the xogen schema generator.
//!
//! [`Generator`] runs the generation pipeline with the templates in
//! [`templates`]. The generated package holds one struct per table and view
//! and, per engine, a storage type whose methods insert, update and look up
//! rows through the indexes and foreign keys of the schema.

mod generator;
pub mod templates;

pub use generator::Generator;
