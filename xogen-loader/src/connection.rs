//! Opening database handles from connection strings.

use postgres::{Client, NoTls, types::ToSql, types::Type};
use xogen_core::{Engine, Error, Result};

use crate::database::{Database, Row, Value};

/// Handle backed by a blocking PostgreSQL client.
pub struct PgDatabase {
    client: Client,
}

impl PgDatabase {
    pub fn connect(dsn: &str) -> Result<Self> {
        let client = Client::connect(&normalize_pg_dsn(dsn), NoTls).map_err(|e| {
            Box::new(Error::Connection {
                engine: Engine::Postgres.to_string(),
                message: e.to_string(),
            })
        })?;
        Ok(Self { client })
    }
}

impl Database for PgDatabase {
    fn query(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        let params: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let rows = self
            .client
            .query(sql, &params)
            .map_err(|e| Error::introspection(sql, e))?;

        rows.iter().map(|row| convert_row(sql, row)).collect()
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        self.client
            .batch_execute(sql)
            .map_err(|e| Error::introspection(sql, e))
    }
}

fn convert_row(sql: &str, row: &postgres::Row) -> Result<Row> {
    let mut values = Vec::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        let ty = column.type_();
        let value = if *ty == Type::BOOL {
            row.try_get::<_, Option<bool>>(i)
                .map(|v| v.map_or(Value::Null, Value::Bool))
        } else if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(i)
                .map(|v| v.map_or(Value::Null, |n| Value::Int(n.into())))
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(i)
                .map(|v| v.map_or(Value::Null, |n| Value::Int(n.into())))
        } else if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(i)
                .map(|v| v.map_or(Value::Null, Value::Int))
        } else if *ty == Type::OID {
            row.try_get::<_, Option<u32>>(i)
                .map(|v| v.map_or(Value::Null, |n| Value::Int(n.into())))
        } else {
            row.try_get::<_, Option<String>>(i)
                .map(|v| v.map_or(Value::Null, Value::Text))
        };
        values.push(value.map_err(|e| Error::introspection(sql, e))?);
    }
    Ok(Row::new(values))
}

/// Rewrite the scheme aliases the client library does not accept.
fn normalize_pg_dsn(dsn: &str) -> String {
    match dsn.split_once("://") {
        Some(("pg" | "pgsql", rest)) => format!("postgresql://{rest}"),
        _ => dsn.to_string(),
    }
}

/// Open a handle for a connection string, picking the engine from its scheme.
pub fn connect(dsn: &str) -> Result<(Engine, Box<dyn Database>)> {
    let engine = Engine::from_dsn(dsn)?;
    tracing::info!(%engine, "connecting");

    match engine {
        Engine::Postgres => Ok((engine, Box::new(PgDatabase::connect(dsn)?))),
        Engine::Oracle => Err(Box::new(Error::Connection {
            engine: engine.to_string(),
            message: "no native client is available for this engine".to_string(),
        })),
    }
}
