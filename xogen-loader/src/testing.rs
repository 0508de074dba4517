//! Test utilities for loaders and the generation pipeline.
//!
//! This module is only available when the `testing` feature is enabled
//! or during tests.

use std::cell::RefCell;

use xogen_core::{Engine, Error, Result};
use xogen_ir::{
    Column, ForeignKeyRow, IndexCatalog, IndexColumn, IndexRow, RelKind, Relation,
    RelationCatalog,
};

use crate::{
    database::{Database, Row},
    loader::{EscapeKind, Loader, ParsedType},
    oracle::OracleLoader,
    postgres::PostgresLoader,
};

struct Response {
    fragment: String,
    params: Option<Vec<String>>,
    rows: Vec<Row>,
}

/// Scripted in-memory database handle.
///
/// Queries are answered by the first response whose fragment occurs in the
/// SQL text (and whose parameters match, when given). Unanswered queries
/// return no rows. Every query and statement is recorded.
#[derive(Default)]
pub struct MemoryDatabase {
    responses: Vec<Response>,
    failures: Vec<String>,
    queries: Vec<(String, Vec<String>)>,
    executed: Vec<String>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries containing `fragment` with `rows`.
    pub fn on(mut self, fragment: &str, rows: Vec<Row>) -> Self {
        self.responses.push(Response {
            fragment: fragment.to_string(),
            params: None,
            rows,
        });
        self
    }

    /// Answer queries containing `fragment` bound to exactly `params`.
    pub fn on_params(mut self, fragment: &str, params: &[&str], rows: Vec<Row>) -> Self {
        self.responses.push(Response {
            fragment: fragment.to_string(),
            params: Some(params.iter().map(|p| p.to_string()).collect()),
            rows,
        });
        self
    }

    /// Fail every query or statement containing `fragment`.
    pub fn fail_on(mut self, fragment: &str) -> Self {
        self.failures.push(fragment.to_string());
        self
    }

    pub fn queries(&self) -> &[(String, Vec<String>)] {
        &self.queries
    }

    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    fn check_failure(&self, sql: &str) -> Result<()> {
        match self.failures.iter().find(|f| sql.contains(f.as_str())) {
            Some(f) => Err(Error::introspection(sql, format!("scripted failure on {f:?}"))),
            None => Ok(()),
        }
    }
}

impl Database for MemoryDatabase {
    fn query(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        self.queries.push((sql.to_string(), params.clone()));
        self.check_failure(sql)?;

        let rows = self
            .responses
            .iter()
            .find(|r| {
                sql.contains(r.fragment.as_str())
                    && r.params.as_ref().is_none_or(|p| *p == params)
            })
            .map(|r| r.rows.clone())
            .unwrap_or_default();
        Ok(rows)
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        self.executed.push(sql.to_string());
        self.check_failure(sql)
    }
}

/// Build a column the way a loader would report it.
pub fn column(ordinal: i32, name: &str, data_type: &str, not_null: bool, pk: bool) -> Column {
    Column {
        ordinal,
        name: name.to_string(),
        data_type: data_type.to_string(),
        not_null,
        is_primary_key: pk,
    }
}

/// Build a single-column foreign key row.
pub fn foreign_key(name: &str, column: &str, ref_table: &str, ref_column: &str) -> ForeignKeyRow {
    ForeignKeyRow {
        name: name.to_string(),
        column: column.to_string(),
        ref_index: format!("{ref_table}_pkey"),
        ref_table: ref_table.to_string(),
        ref_column: ref_column.to_string(),
    }
}

const FIXTURE_QUERY_OBJECT: &str = "xo_fixture_query";

/// Loader serving an in-memory catalog.
///
/// Dialect operations (type mapping, placeholders, quoting, temporary
/// object statements) come from a real engine loader. Every listing call
/// is recorded so tests can check the order the pipeline drives them in.
pub struct FixtureLoader {
    dialect: Box<dyn Loader>,
    schema: String,
    relations: Vec<RelationCatalog>,
    query_columns: Vec<Column>,
    calls: RefCell<Vec<String>>,
}

impl FixtureLoader {
    pub fn new(dialect: Box<dyn Loader>, schema: &str) -> Self {
        Self {
            dialect,
            schema: schema.to_string(),
            relations: Vec::new(),
            query_columns: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn postgres(schema: &str) -> Self {
        Self::new(Box::new(PostgresLoader), schema)
    }

    pub fn oracle(schema: &str) -> Self {
        Self::new(Box::new(OracleLoader), schema)
    }

    pub fn table(self, name: &str, columns: Vec<Column>) -> Self {
        self.relation(name, RelKind::Table, columns)
    }

    pub fn view(self, name: &str, columns: Vec<Column>) -> Self {
        self.relation(name, RelKind::View, columns)
    }

    fn relation(mut self, name: &str, kind: RelKind, columns: Vec<Column>) -> Self {
        let relation = Relation {
            name: name.to_string(),
            kind,
        };
        self.relations.push(RelationCatalog::new(relation, columns));
        self
    }

    pub fn foreign_key(mut self, table: &str, fk: ForeignKeyRow) -> Self {
        if let Some(rel) = self.find_mut(table) {
            rel.foreign_keys.push(fk);
        }
        self
    }

    pub fn index(mut self, table: &str, name: &str, unique: bool, primary: bool, cols: &[&str]) -> Self {
        if let Some(rel) = self.find_mut(table) {
            rel.indexes.push(IndexCatalog {
                index: IndexRow {
                    name: name.to_string(),
                    is_unique: unique,
                    is_primary: primary,
                },
                columns: cols
                    .iter()
                    .enumerate()
                    .map(|(i, c)| IndexColumn {
                        seq: i as i32 + 1,
                        name: c.to_string(),
                    })
                    .collect(),
            });
        }
        self
    }

    /// Columns reported for the temporary object of a parsed query.
    pub fn query_columns(mut self, columns: Vec<Column>) -> Self {
        self.query_columns = columns;
        self
    }

    /// Listing calls made so far, as `operation:relation`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn find(&self, name: &str) -> Option<&RelationCatalog> {
        self.relations.iter().find(|r| r.relation.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut RelationCatalog> {
        self.relations.iter_mut().find(|r| r.relation.name == name)
    }
}

impl Loader for FixtureLoader {
    fn engine(&self) -> Engine {
        self.dialect.engine()
    }

    fn schema_name(&self, _db: &mut dyn Database) -> Result<String> {
        Ok(self.schema.clone())
    }

    fn relations(
        &self,
        _db: &mut dyn Database,
        _schema: &str,
        kind: RelKind,
    ) -> Result<Vec<Relation>> {
        self.record(format!("relations:{}", kind.as_str()));
        Ok(self
            .relations
            .iter()
            .filter(|r| r.relation.kind == kind)
            .map(|r| r.relation.clone())
            .collect())
    }

    fn columns(&self, _db: &mut dyn Database, _schema: &str, relation: &str) -> Result<Vec<Column>> {
        self.record(format!("columns:{relation}"));
        if relation == FIXTURE_QUERY_OBJECT {
            return Ok(self.query_columns.clone());
        }
        Ok(self.find(relation).map(|r| r.columns.clone()).unwrap_or_default())
    }

    fn foreign_keys(
        &self,
        _db: &mut dyn Database,
        _schema: &str,
        relation: &str,
    ) -> Result<Vec<ForeignKeyRow>> {
        self.record(format!("foreign_keys:{relation}"));
        Ok(self
            .find(relation)
            .map(|r| r.foreign_keys.clone())
            .unwrap_or_default())
    }

    fn indexes(
        &self,
        _db: &mut dyn Database,
        _schema: &str,
        relation: &str,
    ) -> Result<Vec<IndexRow>> {
        self.record(format!("indexes:{relation}"));
        Ok(self
            .find(relation)
            .map(|r| r.indexes.iter().map(|i| i.index.clone()).collect())
            .unwrap_or_default())
    }

    fn index_columns(
        &self,
        _db: &mut dyn Database,
        _schema: &str,
        relation: &str,
        index: &str,
    ) -> Result<Vec<IndexColumn>> {
        self.record(format!("index_columns:{relation}.{index}"));
        Ok(self
            .find(relation)
            .and_then(|r| r.indexes.iter().find(|i| i.index.name == index))
            .map(|i| i.columns.clone())
            .unwrap_or_default())
    }

    fn parse_type(&self, native: &str, nullable: bool) -> Result<ParsedType> {
        self.dialect.parse_type(native, nullable)
    }

    fn nth_param(&self, i: usize) -> String {
        self.dialect.nth_param(i)
    }

    fn mask(&self) -> &'static str {
        self.dialect.mask()
    }

    fn escape(&self, kind: EscapeKind, ident: &str) -> String {
        self.dialect.escape(kind, ident)
    }

    fn materialize_sql(&self, name: &str, inspect: &str) -> String {
        self.dialect.materialize_sql(name, inspect)
    }

    fn discard_sql(&self, name: &str) -> String {
        self.dialect.discard_sql(name)
    }

    fn temp_object_name(&self) -> String {
        FIXTURE_QUERY_OBJECT.to_string()
    }

    fn temp_schema(&self, schema: &str) -> String {
        self.dialect.temp_schema(schema)
    }
}
