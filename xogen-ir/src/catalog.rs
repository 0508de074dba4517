//! Raw introspection rows.

use serde::Serialize;
use xogen_core::Engine;

/// Kind of relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelKind {
    Table,
    View,
}

impl RelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelKind::Table => "table",
            RelKind::View => "view",
        }
    }
}

/// A table or view listed by a loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub name: String,
    pub kind: RelKind,
}

/// A column as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// 1-based position within the relation.
    pub ordinal: i32,
    pub name: String,
    /// Engine-native type spelling, including precision (e.g. `numeric(10,2)`).
    pub data_type: String,
    pub not_null: bool,
    pub is_primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyRow {
    pub name: String,
    pub column: String,
    pub ref_index: String,
    pub ref_table: String,
    pub ref_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRow {
    pub name: String,
    pub is_unique: bool,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexColumn {
    pub seq: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexCatalog {
    pub index: IndexRow,
    pub columns: Vec<IndexColumn>,
}

/// Everything listed for one relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationCatalog {
    pub relation: Relation,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKeyRow>,
    pub indexes: Vec<IndexCatalog>,
}

impl RelationCatalog {
    pub fn new(relation: Relation, columns: Vec<Column>) -> Self {
        Self {
            relation,
            columns,
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }
}

/// The full listing of one connection's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub engine: Engine,
    pub schema: String,
    /// Tables first, then views, each in listing order.
    pub relations: Vec<RelationCatalog>,
}

impl Catalog {
    pub fn relations_of(&self, kind: RelKind) -> impl Iterator<Item = &RelationCatalog> {
        self.relations
            .iter()
            .filter(move |r| r.relation.kind == kind)
    }
}
