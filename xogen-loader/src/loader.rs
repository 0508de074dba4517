//! The per-engine capability set.

use xogen_core::{Engine, Result, SemanticType};
use xogen_ir::{
    Catalog, Column, ForeignKeyRow, IndexCatalog, IndexColumn, IndexRow, RelKind, Relation,
    RelationCatalog,
};

use crate::database::{Database, Row};

/// What an identifier names, for quoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    Schema,
    Table,
    Column,
}

/// Result of mapping a native type spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedType {
    pub ty: SemanticType,
    pub nullable: bool,
    pub precision: i32,
}

impl ParsedType {
    pub fn new(ty: SemanticType, nullable: bool, precision: i32) -> Self {
        Self {
            ty,
            nullable,
            precision,
        }
    }
}

/// Split an embedded `(precision[,scale])` out of a native type spelling.
///
/// Returns the spelling without the group, the precision and the scale
/// (0 when absent): `numeric(10,2)` -> (`numeric`, 10, 2),
/// `timestamp(6) with time zone` -> (`timestamp with time zone`, 6, 0).
pub fn parse_precision(dt: &str) -> (String, i32, i32) {
    if let (Some(open), Some(close)) = (dt.find('('), dt.find(')')) {
        if open < close {
            let inner = &dt[open + 1..close];
            let (p, s) = inner.split_once(',').unwrap_or((inner, "0"));
            if let (Ok(p), Ok(s)) = (p.trim().parse(), s.trim().parse()) {
                let base = format!("{}{}", dt[..open].trim_end(), &dt[close + 1..]);
                return (base.trim().to_string(), p, s);
            }
        }
    }
    (dt.trim().to_string(), 0, 0)
}

/// Run a metadata query, logging it first.
pub(crate) fn query(db: &mut dyn Database, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
    tracing::debug!(sql, ?params, "metadata query");
    db.query(sql, params)
}

/// Run a metadata statement, logging it first.
pub(crate) fn execute(db: &mut dyn Database, sql: &str) -> Result<()> {
    tracing::debug!(sql, "metadata statement");
    db.execute(sql)
}

/// Capability set implemented once per engine.
///
/// Implementations provide the listing queries and the dialect details;
/// [`Loader::load_schema`] and [`Loader::parse_query`] drive them in a
/// fixed order.
pub trait Loader {
    fn engine(&self) -> Engine;

    /// The connection's current schema.
    fn schema_name(&self, db: &mut dyn Database) -> Result<String>;

    fn relations(&self, db: &mut dyn Database, schema: &str, kind: RelKind)
    -> Result<Vec<Relation>>;

    fn columns(&self, db: &mut dyn Database, schema: &str, relation: &str) -> Result<Vec<Column>>;

    fn foreign_keys(
        &self,
        db: &mut dyn Database,
        schema: &str,
        relation: &str,
    ) -> Result<Vec<ForeignKeyRow>>;

    fn indexes(&self, db: &mut dyn Database, schema: &str, relation: &str)
    -> Result<Vec<IndexRow>>;

    fn index_columns(
        &self,
        db: &mut dyn Database,
        schema: &str,
        relation: &str,
        index: &str,
    ) -> Result<Vec<IndexColumn>>;

    /// Map a native type spelling onto the closed semantic type set.
    fn parse_type(&self, native: &str, nullable: bool) -> Result<ParsedType>;

    /// Placeholder for the `i`th (0-based) query parameter.
    fn nth_param(&self, i: usize) -> String;

    /// Placeholder pattern with `%d` standing for the 1-based position.
    fn mask(&self) -> &'static str;

    fn escape(&self, kind: EscapeKind, ident: &str) -> String;

    /// Statement creating a temporary object named `name` from `inspect`.
    fn materialize_sql(&self, name: &str, inspect: &str) -> String;

    /// Statement dropping the temporary object.
    fn discard_sql(&self, name: &str) -> String;

    /// A fresh name for a temporary inspection object.
    fn temp_object_name(&self) -> String;

    /// Schema in which temporary objects are visible.
    fn temp_schema(&self, schema: &str) -> String {
        schema.to_string()
    }

    /// List every table and view with its columns, then the tables' foreign
    /// keys, then the tables' indexes with their columns.
    fn load_schema(&self, db: &mut dyn Database, schema: &str) -> Result<Catalog> {
        let mut relations = Vec::new();
        for kind in [RelKind::Table, RelKind::View] {
            for relation in self.relations(db, schema, kind)? {
                let columns = self.columns(db, schema, &relation.name)?;
                relations.push(RelationCatalog::new(relation, columns));
            }
        }

        for rel in relations
            .iter_mut()
            .filter(|r| r.relation.kind == RelKind::Table)
        {
            rel.foreign_keys = self.foreign_keys(db, schema, &rel.relation.name)?;
        }

        for rel in relations
            .iter_mut()
            .filter(|r| r.relation.kind == RelKind::Table)
        {
            for index in self.indexes(db, schema, &rel.relation.name)? {
                let columns = self.index_columns(db, schema, &rel.relation.name, &index.name)?;
                rel.indexes.push(IndexCatalog { index, columns });
            }
        }

        tracing::info!(
            engine = %self.engine(),
            schema,
            relations = relations.len(),
            "loaded schema"
        );

        Ok(Catalog {
            engine: self.engine(),
            schema: schema.to_string(),
            relations,
        })
    }

    /// Describe the result columns of a query by materializing it as a
    /// temporary object. The object is dropped even when describing fails.
    fn parse_query(
        &self,
        db: &mut dyn Database,
        schema: &str,
        inspect: &[String],
    ) -> Result<Vec<Column>> {
        let name = self.temp_object_name();
        execute(db, &self.materialize_sql(&name, &inspect.join("\n")))?;

        let columns = self.columns(db, &self.temp_schema(schema), &name);
        let discarded = execute(db, &self.discard_sql(&name));

        let columns = columns?;
        discarded?;
        Ok(columns)
    }
}
