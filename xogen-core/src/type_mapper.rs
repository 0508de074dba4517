//! Type mapping between semantic types and target-language type spellings.

use crate::{Error, Result, types::SemanticType};

/// Trait for mapping semantic types to language-specific type strings.
///
/// Zero values and nullable wrappers are total over [`SemanticType`]: every
/// kind has exactly one of each. Lookups by type *name* go through
/// [`TypeMapper::parse_type_name`] and fail for names outside the set.
pub trait TypeMapper {
    /// The target language name
    fn language(&self) -> &'static str;

    /// Map a semantic type to the spelling used for a field of that type.
    fn map_type(&self, ty: SemanticType, nullable: bool) -> String;

    /// The zero-value literal for a field of that type.
    fn zero_value(&self, ty: SemanticType, nullable: bool) -> &'static str;

    /// The nullable wrapper type for a kind.
    fn nullable_wrapper(&self, ty: SemanticType) -> &'static str;

    /// Resolve a type spelling back to its semantic type and nullability.
    fn parse_type_name(&self, name: &str) -> Result<(SemanticType, bool)>;

    /// Zero value looked up by type spelling.
    fn zero_value_of(&self, name: &str) -> Result<&'static str> {
        let (ty, nullable) = self.parse_type_name(name)?;
        Ok(self.zero_value(ty, nullable))
    }

    /// Nullable wrapper looked up by type spelling.
    fn nullable_wrapper_of(&self, name: &str) -> Result<&'static str> {
        let (ty, _) = self.parse_type_name(name)?;
        Ok(self.nullable_wrapper(ty))
    }
}

/// Go type mapper implementation
#[derive(Debug, Clone)]
pub struct GoTypeMapper {
    int32_type: String,
}

impl GoTypeMapper {
    /// Create a mapper spelling non-null 32-bit integers as `int32_type`.
    pub fn new(int32_type: impl Into<String>) -> Self {
        Self {
            int32_type: int32_type.into(),
        }
    }

    pub fn int32_type(&self) -> &str {
        &self.int32_type
    }

    /// GraphQL scalar for a Go type spelling. Primary keys are always `ID!`.
    pub fn gql_type(&self, name: &str, is_pk: bool) -> Result<&'static str> {
        let (ty, nullable) = self.parse_type_name(name)?;
        if is_pk {
            return Ok("ID!");
        }
        let gql = match (ty, nullable) {
            (SemanticType::Bool, false) => "Boolean!",
            (SemanticType::Bool, true) => "Boolean",
            (SemanticType::Float32 | SemanticType::Float64, false) => "Float!",
            (SemanticType::Float32 | SemanticType::Float64, true) => "Float",
            (SemanticType::Timestamp, false) => "Time!",
            (SemanticType::Timestamp, true) => "Time",
            (SemanticType::Bytes, _) => "String",
            (_, false) => "String!",
            (_, true) => "String",
        };
        Ok(gql)
    }
}

impl Default for GoTypeMapper {
    fn default() -> Self {
        Self::new("int")
    }
}

impl TypeMapper for GoTypeMapper {
    fn language(&self) -> &'static str {
        "go"
    }

    fn map_type(&self, ty: SemanticType, nullable: bool) -> String {
        if nullable {
            return self.nullable_wrapper(ty).to_string();
        }
        match ty {
            SemanticType::String => "string",
            SemanticType::Bool => "bool",
            SemanticType::Int16 => "int16",
            SemanticType::Int32 => return self.int32_type.clone(),
            SemanticType::Int64 => "int64",
            SemanticType::Float32 => "float32",
            SemanticType::Float64 => "float64",
            SemanticType::Bytes => "[]byte",
            SemanticType::Timestamp => "time.Time",
        }
        .to_string()
    }

    fn zero_value(&self, ty: SemanticType, nullable: bool) -> &'static str {
        match (ty, nullable) {
            (SemanticType::String, false) => r#""""#,
            (SemanticType::String, true) => "sql.NullString{}",
            (SemanticType::Bool, false) => "false",
            (SemanticType::Bool, true) => "sql.NullBool{}",
            (SemanticType::Int16 | SemanticType::Int32 | SemanticType::Int64, false) => "0",
            (SemanticType::Int16 | SemanticType::Int32 | SemanticType::Int64, true) => {
                "sql.NullInt64{}"
            }
            (SemanticType::Float32 | SemanticType::Float64, false) => "0.0",
            (SemanticType::Float32 | SemanticType::Float64, true) => "sql.NullFloat64{}",
            (SemanticType::Bytes, _) => "nil",
            (SemanticType::Timestamp, false) => "time.Time{}",
            (SemanticType::Timestamp, true) => "NullTime{}",
        }
    }

    fn nullable_wrapper(&self, ty: SemanticType) -> &'static str {
        match ty {
            SemanticType::String => "sql.NullString",
            SemanticType::Bool => "sql.NullBool",
            SemanticType::Int16 | SemanticType::Int32 | SemanticType::Int64 => "sql.NullInt64",
            SemanticType::Float32 | SemanticType::Float64 => "sql.NullFloat64",
            SemanticType::Bytes => "[]byte",
            SemanticType::Timestamp => "NullTime",
        }
    }

    fn parse_type_name(&self, name: &str) -> Result<(SemanticType, bool)> {
        let parsed = match name {
            "string" => (SemanticType::String, false),
            "sql.NullString" => (SemanticType::String, true),
            "bool" => (SemanticType::Bool, false),
            "sql.NullBool" => (SemanticType::Bool, true),
            "int16" => (SemanticType::Int16, false),
            "int32" => (SemanticType::Int32, false),
            n if n == self.int32_type => (SemanticType::Int32, false),
            "int64" => (SemanticType::Int64, false),
            "sql.NullInt64" => (SemanticType::Int64, true),
            "float32" => (SemanticType::Float32, false),
            "float64" => (SemanticType::Float64, false),
            "sql.NullFloat64" => (SemanticType::Float64, true),
            "[]byte" => (SemanticType::Bytes, false),
            "time.Time" => (SemanticType::Timestamp, false),
            "NullTime" => (SemanticType::Timestamp, true),
            _ => {
                return Err(Box::new(Error::UnknownSemanticType {
                    name: name.to_string(),
                }));
            }
        };
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_type_mapper() {
        let mapper = GoTypeMapper::default();

        assert_eq!(mapper.map_type(SemanticType::String, false), "string");
        assert_eq!(mapper.map_type(SemanticType::Int32, false), "int");
        assert_eq!(mapper.map_type(SemanticType::Int16, true), "sql.NullInt64");
        assert_eq!(mapper.map_type(SemanticType::Timestamp, true), "NullTime");
        assert_eq!(mapper.map_type(SemanticType::Bytes, true), "[]byte");
    }

    #[test]
    fn test_custom_int32_type() {
        let mapper = GoTypeMapper::new("int32");
        assert_eq!(mapper.map_type(SemanticType::Int32, false), "int32");
        assert_eq!(
            mapper.parse_type_name("int32").unwrap(),
            (SemanticType::Int32, false)
        );
    }

    #[test]
    fn test_zero_value_and_wrapper_total() {
        let mapper = GoTypeMapper::default();
        for ty in SemanticType::ALL {
            for nullable in [false, true] {
                let spelling = mapper.map_type(ty, nullable);
                assert!(!mapper.zero_value(ty, nullable).is_empty());
                assert!(mapper.zero_value_of(&spelling).is_ok(), "{spelling}");
                assert!(mapper.nullable_wrapper_of(&spelling).is_ok(), "{spelling}");
            }
            assert!(!mapper.nullable_wrapper(ty).is_empty());
        }
    }

    #[test]
    fn test_lookup_outside_set_fails() {
        let mapper = GoTypeMapper::default();
        let err = mapper.zero_value_of("decimal.Decimal").unwrap_err();
        assert!(matches!(*err, Error::UnknownSemanticType { ref name } if name == "decimal.Decimal"));
        assert!(mapper.nullable_wrapper_of("uuid.UUID").is_err());
    }

    #[test]
    fn test_gql_type() {
        let mapper = GoTypeMapper::default();
        assert_eq!(mapper.gql_type("int", true).unwrap(), "ID!");
        assert_eq!(mapper.gql_type("string", false).unwrap(), "String!");
        assert_eq!(mapper.gql_type("sql.NullBool", false).unwrap(), "Boolean");
        assert_eq!(mapper.gql_type("time.Time", false).unwrap(), "Time!");
        assert!(mapper.gql_type("complex64", false).is_err());
    }
}
