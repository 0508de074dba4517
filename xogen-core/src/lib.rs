//! Core types and utilities for the xogen schema generator.
//!
//! This crate provides the closed set of semantic value types, the engine
//! identifiers, the error type shared across the workspace and the string
//! utilities (case conversion, inflection) used by naming.

mod error;
mod inflect;
mod type_mapper;
mod types;
mod utils;

// Errors
pub use error::{Error, Result};
// Inflection
pub use inflect::{pluralize, singularize};
// Type mapping
pub use type_mapper::{GoTypeMapper, TypeMapper};
// Fundamental types
pub use types::{Engine, SemanticType};
// String utilities
pub use utils::{camel_to_snake, lower_first, snake_to_identifier, upper_first};
