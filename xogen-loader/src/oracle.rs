//! Oracle loader.
//!
//! Oracle folds unquoted identifiers to upper case. Names are listed in
//! lower case and upper-cased again when bound as query parameters.

use rand::{Rng, distributions::Alphanumeric};
use xogen_core::{Engine, Error, Result, SemanticType};
use xogen_ir::{Column, ForeignKeyRow, IndexColumn, IndexRow, RelKind, Relation};

use crate::{
    database::Database,
    loader::{EscapeKind, Loader, ParsedType, parse_precision, query},
};

const SCHEMA_SQL: &str = "SELECT UPPER(SYS_CONTEXT('USERENV', 'CURRENT_SCHEMA')) FROM dual";

const RELATIONS_SQL: &str = "SELECT LOWER(object_name) \
     FROM all_objects \
     WHERE owner = UPPER(:1) AND object_type = :2 AND object_name NOT LIKE '%$%' \
     ORDER BY object_name";

const COLUMNS_SQL: &str = "SELECT c.column_id, LOWER(c.column_name), \
     LOWER(CASE c.data_type \
     WHEN 'CHAR' THEN 'CHAR('||c.data_length||')' \
     WHEN 'VARCHAR2' THEN 'VARCHAR2('||c.data_length||')' \
     WHEN 'NUMBER' THEN \
     (CASE WHEN c.data_precision IS NULL AND c.data_scale IS NULL THEN 'NUMBER' \
     ELSE 'NUMBER('||NVL(c.data_precision, 38)||','||NVL(c.data_scale, 0)||')' END) \
     ELSE c.data_type END), \
     CASE WHEN c.nullable = 'N' THEN '1' ELSE '0' END, \
     COALESCE((SELECT CASE WHEN r.constraint_type = 'P' THEN '1' ELSE '0' END \
     FROM all_cons_columns l, all_constraints r \
     WHERE r.constraint_type = 'P' AND r.owner = c.owner AND r.table_name = c.table_name \
     AND r.constraint_name = l.constraint_name AND l.owner = c.owner \
     AND l.table_name = c.table_name AND l.column_name = c.column_name), '0') \
     FROM all_tab_columns c \
     WHERE c.owner = UPPER(:1) AND c.table_name = UPPER(:2) \
     ORDER BY c.column_id";

const FOREIGN_KEYS_SQL: &str = "SELECT LOWER(a.constraint_name), LOWER(a.column_name), \
     LOWER(r.constraint_name), LOWER(r.table_name), LOWER(i.column_name) \
     FROM all_cons_columns a \
     JOIN all_constraints c ON a.owner = c.owner AND a.constraint_name = c.constraint_name \
     JOIN all_constraints r ON c.r_owner = r.owner AND c.r_constraint_name = r.constraint_name \
     JOIN all_cons_columns i ON r.owner = i.owner AND r.constraint_name = i.constraint_name \
     AND a.position = i.position \
     WHERE c.constraint_type = 'R' AND a.owner = UPPER(:1) AND a.table_name = UPPER(:2) \
     ORDER BY a.constraint_name, a.position";

const INDEXES_SQL: &str = "SELECT LOWER(i.index_name), \
     CASE WHEN i.uniqueness = 'UNIQUE' THEN '1' ELSE '0' END, \
     CASE WHEN c.constraint_type = 'P' THEN '1' ELSE '0' END \
     FROM all_indexes i \
     LEFT JOIN all_constraints c ON i.owner = c.owner AND i.index_name = c.constraint_name \
     WHERE i.table_owner = UPPER(:1) AND i.table_name = UPPER(:2) \
     ORDER BY i.index_name";

const INDEX_COLUMNS_SQL: &str = "SELECT column_position, LOWER(column_name) \
     FROM all_ind_columns \
     WHERE index_owner = UPPER(:1) AND table_name = UPPER(:2) AND index_name = UPPER(:3) \
     ORDER BY column_position";

/// Loader for Oracle (`:1` placeholders, upper-cased quoted identifiers).
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleLoader;

impl Loader for OracleLoader {
    fn engine(&self) -> Engine {
        Engine::Oracle
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
        let object_type = match kind {
            RelKind::Table => "TABLE",
            RelKind::View => "VIEW",
        };
        query(db, RELATIONS_SQL, &[schema, object_type])?
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
        let (dt, precision, scale) = parse_precision(&lower);

        let ty = match strip_lengths(&dt).as_str() {
            "char" | "nchar" | "varchar" | "varchar2" | "nvarchar2" | "long" | "clob"
            | "nclob" | "rowid" => SemanticType::String,
            "shortint" => SemanticType::Int16,
            "integer" => SemanticType::Int32,
            "longinteger" => SemanticType::Int64,
            "float" | "shortdecimal" => SemanticType::Float32,
            "number" | "decimal" => {
                if 0 < precision && precision < 18 && scale > 0 {
                    SemanticType::Float64
                } else if 0 < precision && precision <= 19 && scale == 0 {
                    SemanticType::Int64
                } else {
                    SemanticType::Int32
                }
            }
            "blob" | "long raw" | "raw" => SemanticType::Bytes,
            "date" | "timestamp" | "timestamp with time zone" => SemanticType::Timestamp,
            _ => {
                return Err(Box::new(Error::UnknownNativeType {
                    engine: self.engine().to_string(),
                    native: native.to_string(),
                }));
            }
        };

        // single-digit integers are flags
        let ty = if ty == SemanticType::Int32 && precision == 1 {
            SemanticType::Bool
        } else {
            ty
        };

        Ok(ParsedType::new(ty, nullable, precision))
    }

    fn nth_param(&self, i: usize) -> String {
        format!(":{}", i + 1)
    }

    fn mask(&self) -> &'static str {
        ":%d"
    }

    fn escape(&self, _kind: EscapeKind, ident: &str) -> String {
        format!("\"{}\"", ident.to_uppercase().replace('"', "\"\""))
    }

    fn materialize_sql(&self, name: &str, inspect: &str) -> String {
        format!("CREATE GLOBAL TEMPORARY TABLE {name} ON COMMIT PRESERVE ROWS AS {inspect}")
    }

    fn discard_sql(&self, name: &str) -> String {
        format!("DROP TABLE {name}")
    }

    fn temp_object_name(&self) -> String {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();
        format!("XO${id}")
    }
}

/// Remove any remaining `(n)` length groups, as in `timestamp(6) with time zone(9)`.
fn strip_lengths(dt: &str) -> String {
    let mut out = String::with_capacity(dt.len());
    let mut rest = dt;
    while let Some(open) = rest.find('(') {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        let inner = &rest[open + 1..open + close];
        out.push_str(&rest[..open]);
        if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_digit()) {
            out.push_str(&rest[open..=open + close]);
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type() {
        let loader = OracleLoader;

        assert_eq!(
            loader.parse_type("VARCHAR2(40)", false).unwrap().ty,
            SemanticType::String
        );
        assert_eq!(
            loader.parse_type("number(10,2)", false).unwrap().ty,
            SemanticType::Float64
        );
        assert_eq!(
            loader.parse_type("number(10,0)", true).unwrap(),
            ParsedType::new(SemanticType::Int64, true, 10)
        );
        assert_eq!(
            loader.parse_type("number", false).unwrap().ty,
            SemanticType::Int32
        );
        assert_eq!(
            loader.parse_type("number(38,0)", false).unwrap().ty,
            SemanticType::Int32
        );
        assert_eq!(
            loader.parse_type("blob", false).unwrap().ty,
            SemanticType::Bytes
        );
        assert_eq!(
            loader.parse_type("timestamp(6)", false).unwrap().ty,
            SemanticType::Timestamp
        );
    }

    #[test]
    fn test_single_digit_integer_is_bool() {
        let parsed = OracleLoader.parse_type("integer(1)", false).unwrap();
        assert_eq!(parsed.ty, SemanticType::Bool);
    }

    #[test]
    fn test_unknown_type() {
        assert!(OracleLoader.parse_type("xmltype", false).is_err());
    }

    #[test]
    fn test_dialect() {
        let loader = OracleLoader;
        assert_eq!(loader.nth_param(0), ":1");
        assert_eq!(loader.mask(), ":%d");
        assert_eq!(loader.escape(EscapeKind::Column, "title"), "\"TITLE\"");
        assert!(loader.temp_object_name().starts_with("XO$"));
        assert_eq!(loader.temp_schema("BOOKS"), "BOOKS");
    }

    #[test]
    fn test_strip_lengths() {
        assert_eq!(strip_lengths("timestamp(6) with time zone"), "timestamp with time zone");
        assert_eq!(strip_lengths("raw"), "raw");
        assert_eq!(strip_lengths("odd(x)"), "odd(x)");
    }
}
