//! Database handle capability.
//!
//! Loaders never see driver-specific rows. A handle runs a metadata query
//! with text parameters and hands back [`Row`]s of neutral [`Value`]s.

use xogen_core::{Error, Result};

/// A single value of a metadata row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// One row of a metadata query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn value(&self, i: usize) -> Result<&Value> {
        self.0
            .get(i)
            .ok_or_else(|| Box::new(Error::RowValue { column: i }))
    }

    /// Text value; integers are rendered, NULL is an error.
    pub fn get_str(&self, i: usize) -> Result<String> {
        self.get_opt_str(i)?
            .ok_or_else(|| Box::new(Error::RowValue { column: i }))
    }

    /// Text value, `None` for NULL.
    pub fn get_opt_str(&self, i: usize) -> Result<Option<String>> {
        match self.value(i)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.clone())),
            Value::Int(n) => Ok(Some(n.to_string())),
            Value::Bool(_) => Err(Box::new(Error::RowValue { column: i })),
        }
    }

    /// Integer value; numeric text is parsed.
    pub fn get_i32(&self, i: usize) -> Result<i32> {
        let n = match self.value(i)? {
            Value::Int(n) => i32::try_from(*n).ok(),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        };
        n.ok_or_else(|| Box::new(Error::RowValue { column: i }))
    }

    /// Boolean value; engines without a boolean type report '1'/'0' or 'Y'/'N'.
    pub fn get_bool(&self, i: usize) -> Result<bool> {
        let b = match self.value(i)? {
            Value::Bool(b) => Some(*b),
            Value::Int(n) => Some(*n != 0),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "t" | "true" | "y" | "yes" => Some(true),
                "0" | "f" | "false" | "n" | "no" => Some(false),
                _ => None,
            },
            Value::Null => Some(false),
        };
        b.ok_or_else(|| Box::new(Error::RowValue { column: i }))
    }
}

/// Capability to run metadata statements against one database.
///
/// Handles are owned by the run and closed when dropped.
pub trait Database {
    /// Run a query with positional text parameters.
    fn query(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Row>>;

    /// Run a statement that returns no rows.
    fn execute(&mut self, sql: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_getters() {
        let row = Row::new(vec![
            Value::Int(3),
            "author_id".into(),
            Value::Text("1".into()),
            Value::Null,
            Value::Bool(true),
        ]);

        assert_eq!(row.get_i32(0).unwrap(), 3);
        assert_eq!(row.get_str(1).unwrap(), "author_id");
        assert!(row.get_bool(2).unwrap());
        assert_eq!(row.get_opt_str(3).unwrap(), None);
        assert!(!row.get_bool(3).unwrap());
        assert!(row.get_bool(4).unwrap());
        assert_eq!(row.get_i32(2).unwrap(), 1);
    }

    #[test]
    fn test_row_errors() {
        let row = Row::new(vec![Value::Null, Value::Text("x".into())]);

        assert!(row.get_str(0).is_err());
        assert!(row.get_i32(1).is_err());
        assert!(row.get_bool(1).is_err());
        assert!(matches!(*row.get_str(5).unwrap_err(), Error::RowValue { column: 5 }));
    }
}
