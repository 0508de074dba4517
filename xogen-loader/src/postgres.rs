//! PostgreSQL loader.

use rand::{Rng, distributions::Alphanumeric};
use xogen_core::{Engine, Error, Result, SemanticType};
use xogen_ir::{Column, ForeignKeyRow, IndexColumn, IndexRow, RelKind, Relation};

use crate::{
    database::Database,
    loader::{EscapeKind, Loader, ParsedType, parse_precision, query},
};

const SCHEMA_SQL: &str = "SELECT current_schema()";

const RELATIONS_SQL: &str = "SELECT c.relname \
     FROM pg_class c \
     JOIN pg_namespace n ON n.oid = c.relnamespace \
     WHERE n.nspname = $1 AND c.relkind::text = $2 \
     ORDER BY c.relname";

const COLUMNS_SQL: &str = "SELECT a.attnum, a.attname, \
     format_type(a.atttypid, a.atttypmod), a.attnotnull, \
     COALESCE(ct.contype = 'p', false) \
     FROM pg_attribute a \
     JOIN pg_class c ON c.oid = a.attrelid \
     JOIN pg_namespace n ON n.oid = c.relnamespace \
     LEFT JOIN pg_constraint ct ON ct.conrelid = c.oid \
     AND a.attnum = ANY(ct.conkey) AND ct.contype = 'p' \
     WHERE a.attisdropped = false AND a.attnum > 0 \
     AND (n.nspname = $1 OR ($1 = 'pg_temp' AND n.oid = pg_my_temp_schema())) \
     AND c.relname = $2 \
     ORDER BY a.attnum";

const FOREIGN_KEYS_SQL: &str = "SELECT r.conname, a.attname, i.relname, f.relname, fa.attname \
     FROM pg_constraint r \
     JOIN pg_class c ON c.oid = r.conrelid \
     JOIN pg_namespace n ON n.oid = c.relnamespace \
     JOIN pg_attribute a ON a.attrelid = r.conrelid AND a.attnum = ANY(r.conkey) \
     JOIN pg_class f ON f.oid = r.confrelid \
     JOIN pg_attribute fa ON fa.attrelid = r.confrelid AND fa.attnum = ANY(r.confkey) \
     LEFT JOIN pg_class i ON i.oid = r.conindid \
     WHERE r.contype = 'f' AND n.nspname = $1 AND c.relname = $2 \
     ORDER BY r.conname, a.attnum";

const INDEXES_SQL: &str = "SELECT ic.relname, i.indisunique, i.indisprimary \
     FROM pg_index i \
     JOIN pg_class c ON c.oid = i.indrelid \
     JOIN pg_namespace n ON n.oid = c.relnamespace \
     JOIN pg_class ic ON ic.oid = i.indexrelid \
     WHERE i.indkey <> '0' AND n.nspname = $1 AND c.relname = $2 \
     ORDER BY ic.relname";

const INDEX_COLUMNS_SQL: &str = "SELECT k.seq, a.attname \
     FROM pg_index i \
     JOIN pg_class c ON c.oid = i.indrelid \
     JOIN pg_class ic ON ic.oid = i.indexrelid \
     JOIN pg_namespace n ON n.oid = c.relnamespace \
     CROSS JOIN LATERAL unnest(i.indkey) WITH ORDINALITY AS k(attnum, seq) \
     JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum \
     WHERE n.nspname = $1 AND c.relname = $2 AND ic.relname = $3 \
     ORDER BY k.seq";

/// Loader for PostgreSQL (`$1` placeholders, double-quoted identifiers).
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresLoader;

impl Loader for PostgresLoader {
    fn engine(&self) -> Engine {
        Engine::Postgres
    }

    fn schema_name(&self, db: &mut dyn Database) -> Result<String> {
        let rows = query(db, SCHEMA_SQL, &[])?;
        match rows.first() {
            Some(row) => row.get_str(0),
            None => Err(Error::introspection(SCHEMA_SQL, "no current schema")),
        }
    }

    fn relations(
        &self,
        db: &mut dyn Database,
        schema: &str,
        kind: RelKind,
    ) -> Result<Vec<Relation>> {
        let relkind = match kind {
            RelKind::Table => "r",
            RelKind::View => "v",
        };
        query(db, RELATIONS_SQL, &[schema, relkind])?
            .iter()
            .map(|row| {
                Ok(Relation {
                    name: row.get_str(0)?,
                    kind,
                })
            })
            .collect()
    }

    fn columns(&self, db: &mut dyn Database, schema: &str, relation: &str) -> Result<Vec<Column>> {
        query(db, COLUMNS_SQL, &[schema, relation])?
            .iter()
            .map(|row| {
                Ok(Column {
                    ordinal: row.get_i32(0)?,
                    name: row.get_str(1)?,
                    data_type: row.get_str(2)?,
                    not_null: row.get_bool(3)?,
                    is_primary_key: row.get_bool(4)?,
                })
            })
            .collect()
    }

    fn foreign_keys(
        &self,
        db: &mut dyn Database,
        schema: &str,
        relation: &str,
    ) -> Result<Vec<ForeignKeyRow>> {
        query(db, FOREIGN_KEYS_SQL, &[schema, relation])?
            .iter()
            .map(|row| {
                Ok(ForeignKeyRow {
                    name: row.get_str(0)?,
                    column: row.get_str(1)?,
                    ref_index: row.get_opt_str(2)?.unwrap_or_default(),
                    ref_table: row.get_str(3)?,
                    ref_column: row.get_str(4)?,
                })
            })
            .collect()
    }

    fn indexes(
        &self,
        db: &mut dyn Database,
        schema: &str,
        relation: &str,
    ) -> Result<Vec<IndexRow>> {
        query(db, INDEXES_SQL, &[schema, relation])?
            .iter()
            .map(|row| {
                Ok(IndexRow {
                    name: row.get_str(0)?,
                    is_unique: row.get_bool(1)?,
                    is_primary: row.get_bool(2)?,
                })
            })
            .collect()
    }

    fn index_columns(
        &self,
        db: &mut dyn Database,
        schema: &str,
        relation: &str,
        index: &str,
    ) -> Result<Vec<IndexColumn>> {
        query(db, INDEX_COLUMNS_SQL, &[schema, relation, index])?
            .iter()
            .map(|row| {
                Ok(IndexColumn {
                    seq: row.get_i32(0)?,
                    name: row.get_str(1)?,
                })
            })
            .collect()
    }

    fn parse_type(&self, native: &str, nullable: bool) -> Result<ParsedType> {
        let lower = native.to_lowercase();
        let (dt, precision, _) = parse_precision(&lower);

        let ty = match dt.as_str() {
            "boolean" => SemanticType::Bool,
            "character" | "character varying" | "text" | "money" | "inet" | "uuid" | "name"
            | "citext" => SemanticType::String,
            "smallint" | "smallserial" => SemanticType::Int16,
            "integer" | "serial" => SemanticType::Int32,
            "bigint" | "bigserial" => SemanticType::Int64,
            "real" => SemanticType::Float32,
            "numeric" | "double precision" => SemanticType::Float64,
            "bytea" | "json" | "jsonb" => SemanticType::Bytes,
            "date"
            | "time"
            | "timestamp"
            | "timestamp with time zone"
            | "timestamp without time zone"
            | "time with time zone"
            | "time without time zone" => SemanticType::Timestamp,
            _ => {
                return Err(Box::new(Error::UnknownNativeType {
                    engine: self.engine().to_string(),
                    native: native.to_string(),
                }));
            }
        };

        Ok(ParsedType::new(ty, nullable, precision))
    }

    fn nth_param(&self, i: usize) -> String {
        format!("${}", i + 1)
    }

    fn mask(&self) -> &'static str {
        "$%d"
    }

    fn escape(&self, _kind: EscapeKind, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn materialize_sql(&self, name: &str, inspect: &str) -> String {
        format!("CREATE TEMPORARY VIEW {name} AS {inspect}")
    }

    fn discard_sql(&self, name: &str) -> String {
        format!("DROP VIEW {name}")
    }

    fn temp_object_name(&self) -> String {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        format!("_xo_{id}")
    }

    fn temp_schema(&self, _schema: &str) -> String {
        "pg_temp".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::{Row, Value},
        testing::MemoryDatabase,
    };

    #[test]
    fn test_parse_type() {
        let loader = PostgresLoader;

        let parsed = loader.parse_type("numeric(10,2)", true).unwrap();
        assert_eq!(parsed, ParsedType::new(SemanticType::Float64, true, 10));

        let parsed = loader.parse_type("character varying(255)", false).unwrap();
        assert_eq!(parsed.ty, SemanticType::String);
        assert_eq!(parsed.precision, 255);

        let parsed = loader
            .parse_type("timestamp(6) without time zone", false)
            .unwrap();
        assert_eq!(parsed.ty, SemanticType::Timestamp);

        assert_eq!(
            loader.parse_type("INTEGER", false).unwrap().ty,
            SemanticType::Int32
        );
        assert_eq!(
            loader.parse_type("bigserial", false).unwrap().ty,
            SemanticType::Int64
        );
    }

    #[test]
    fn test_parse_unknown_type_fails() {
        let err = PostgresLoader.parse_type("tsvector", false).unwrap_err();
        assert!(err.is_config());
        assert!(
            matches!(*err, Error::UnknownNativeType { ref native, .. } if native == "tsvector")
        );
    }

    #[test]
    fn test_dialect() {
        let loader = PostgresLoader;
        assert_eq!(loader.nth_param(0), "$1");
        assert_eq!(loader.nth_param(4), "$5");
        assert_eq!(loader.mask(), "$%d");
        assert_eq!(loader.escape(EscapeKind::Table, "user"), "\"user\"");
        assert_eq!(loader.escape(EscapeKind::Column, "a\"b"), "\"a\"\"b\"");
        assert!(loader.temp_object_name().starts_with("_xo_"));
        assert_ne!(loader.temp_object_name(), loader.temp_object_name());
    }

    #[test]
    fn test_columns_from_rows() {
        let mut db = MemoryDatabase::new().on(
            "FROM pg_attribute",
            vec![
                Row::new(vec![
                    Value::Int(1),
                    "book_id".into(),
                    "integer".into(),
                    Value::Bool(true),
                    Value::Bool(true),
                ]),
                Row::new(vec![
                    Value::Int(2),
                    "title".into(),
                    "text".into(),
                    Value::Bool(false),
                    Value::Bool(false),
                ]),
            ],
        );

        let columns = PostgresLoader.columns(&mut db, "public", "books").unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "book_id");
        assert!(columns[0].is_primary_key);
        assert!(!columns[1].not_null);
        assert_eq!(db.queries()[0].1, vec!["public", "books"]);
    }

    #[test]
    fn test_schema_name() {
        let mut db =
            MemoryDatabase::new().on("current_schema", vec![Row::new(vec!["public".into()])]);
        assert_eq!(PostgresLoader.schema_name(&mut db).unwrap(), "public");

        let mut empty = MemoryDatabase::new();
        assert!(PostgresLoader.schema_name(&mut empty).is_err());
    }
}
