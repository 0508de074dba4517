//! Resolved entities passed to templates.

use std::collections::BTreeSet;

use serde::Serialize;
use xogen_core::{Engine, SemanticType};

use crate::catalog::{Column, RelKind};

/// A generated struct field, derived from one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Exported identifier, unique within its type.
    pub name: String,
    pub ty: SemanticType,
    pub nullable: bool,
    /// Target-language spelling of the field type.
    pub go_type: String,
    pub zero: String,
    /// Precision extracted from the native type, 0 when absent.
    pub precision: i32,
    pub engine: Engine,
    pub col: Column,
}

/// A table or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Type {
    pub name: String,
    /// Schema the relation was loaded from.
    pub schema: String,
    /// Native relation name.
    pub table: String,
    pub kind: RelKind,
    pub engine: Engine,
    pub fields: Vec<Field>,
    pub indexes: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
    pub comment: Option<String>,
}

impl Type {
    /// The first primary-key field, if the relation has one.
    pub fn primary_key(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.col.is_primary_key)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_column(&self, column: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.col.name == column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    pub name: String,
    /// Name of the generated lookup function.
    pub func_name: String,
    pub is_unique: bool,
    pub is_primary: bool,
    pub fields: Vec<Field>,
    pub type_name: String,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    /// Generated accessor name.
    pub name: String,
    /// Constraint name in the database.
    pub constraint: String,
    pub type_name: String,
    pub field: Field,
    pub ref_type: String,
    pub ref_field: Field,
    /// Lookup function on the referenced type used by the accessor.
    pub ref_func: String,
}

/// A named parameter of a literal query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryParam {
    pub name: String,
    pub go_type: String,
    pub interpolate: bool,
}

/// A literal query and the type its rows scan into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub name: String,
    /// Query text with engine placeholders, one entry per line.
    pub lines: Vec<String>,
    /// Comments stripped from each line, empty where none.
    pub line_comments: Vec<String>,
    pub params: Vec<QueryParam>,
    pub only_one: bool,
    pub interpolate: bool,
    pub result: Type,
    pub comment: Option<String>,
}

/// Aggregate passed to schema-level templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDefinition {
    pub schema: String,
    pub tables: Vec<Type>,
    pub views: Vec<Type>,
    /// Contributing engines, the primary one first.
    pub engines: Vec<Engine>,
    /// Every field type spelling used by the tables and views.
    pub known_types: BTreeSet<String>,
}

impl SchemaDefinition {
    pub fn types(&self) -> impl Iterator<Item = &Type> {
        self.tables.iter().chain(&self.views)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.tables.iter().flat_map(|t| &t.foreign_keys)
    }

    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.tables.iter().flat_map(|t| &t.indexes)
    }

    /// Foreign keys whose referenced type is `name`.
    pub fn referencing(&self, name: &str) -> impl Iterator<Item = &ForeignKey> {
        self.foreign_keys().filter(move |fk| fk.ref_type == name)
    }

    pub fn find_type(&self, name: &str) -> Option<&Type> {
        self.types().find(|t| t.name == name)
    }
}
