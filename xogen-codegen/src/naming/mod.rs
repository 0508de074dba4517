//! Naming & type resolution.
//!
//! Pure functions deriving identifiers and target type spellings. The
//! stateful parts (short-name memo, duplicate sets) live on
//! [`RunContext`](crate::RunContext) and call into these.

mod relations;

use xogen_core::camel_to_snake;

pub use relations::{fk_name, fk_reverse_field, foreign_key_name, index_func_name};

/// Go keywords and predeclared types mapped to safe replacements.
const GO_RESERVED: &[(&str, &str)] = &[
    ("break", "brk"),
    ("case", "cs"),
    ("chan", "chn"),
    ("const", "cnst"),
    ("continue", "cnt"),
    ("default", "def"),
    ("defer", "dfr"),
    ("else", "els"),
    ("fallthrough", "flthrough"),
    ("for", "fr"),
    ("func", "fn"),
    ("go", "goVal"),
    ("goto", "gt"),
    ("if", "ifVal"),
    ("import", "imp"),
    ("interface", "iface"),
    ("map", "mp"),
    ("package", "pkg"),
    ("range", "rnge"),
    ("return", "ret"),
    ("select", "slct"),
    ("struct", "strct"),
    ("switch", "swtch"),
    ("type", "typ"),
    ("var", "vr"),
    ("error", "e"),
    ("bool", "b"),
    ("string", "str"),
    ("byte", "byt"),
    ("rune", "r"),
    ("uintptr", "uptr"),
    ("int", "i"),
    ("int8", "i8"),
    ("int16", "i16"),
    ("int32", "i32"),
    ("int64", "i64"),
    ("uint", "u"),
    ("uint8", "u8"),
    ("uint16", "u16"),
    ("uint32", "u32"),
    ("uint64", "u64"),
    ("float32", "z"),
    ("float64", "f"),
    ("complex64", "c"),
    ("complex128", "c128"),
];

/// Type names that are never requalified with the custom type package.
pub const KNOWN_TYPES: &[&str] = &[
    "bool",
    "string",
    "byte",
    "rune",
    "int",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "float32",
    "float64",
    "Slice",
    "StringSlice",
];

/// Short names known before any derivation happens.
pub(crate) const SHORT_NAME_SEEDS: &[(&str, &str)] = &[
    ("bool", "b"),
    ("string", "s"),
    ("byte", "b"),
    ("rune", "r"),
    ("int", "i"),
    ("int16", "i"),
    ("int32", "i"),
    ("int64", "i"),
    ("uint", "u"),
    ("uint8", "u"),
    ("uint16", "u"),
    ("uint32", "u"),
    ("uint64", "u"),
    ("float32", "f"),
    ("float64", "f"),
    ("Slice", "s"),
    ("StringSlice", "ss"),
];

/// Package names imported by every generated file.
pub const DEFAULT_CONFLICTS: &[&str] = &[
    "sql", "driver", "csv", "errors", "fmt", "regexp", "strings", "time",
];

/// Safe replacement for a Go keyword or predeclared type name.
pub fn reserved(name: &str) -> Option<&'static str> {
    GO_RESERVED
        .iter()
        .find(|(k, _)| *k == name)
        .map(|(_, v)| *v)
}

/// First letter of every word of `typ`, skipping `id` words
/// (e.g. "AuthorBook" -> "ab", "BookAuthorID" -> "ba").
///
/// Never empty. Reserved results are substituted.
pub fn derive_shortname(typ: &str) -> String {
    let snake = camel_to_snake(typ);
    let mut v: String = snake
        .split(|c: char| c == '_' || !c.is_alphanumeric())
        .filter(|s| !s.is_empty() && *s != "id")
        .filter_map(|s| s.chars().next())
        .flat_map(char::to_lowercase)
        .collect();

    if v.is_empty() {
        v = typ
            .chars()
            .find(|c| c.is_alphanumeric())
            .map(|c| c.to_lowercase().collect())
            .unwrap_or_else(|| "v".to_string());
    }

    match reserved(&v) {
        Some(r) => r.to_string(),
        None => v,
    }
}

/// Prefix a bare, unknown type name with the custom type package, keeping
/// any leading `[]` markers in front (e.g. "[]Point" -> "[]geo.Point").
pub fn retype(typ: &str, custom_package: Option<&str>) -> String {
    if typ.contains('.') {
        return typ.to_string();
    }

    let mut base = typ;
    let mut prefix = String::new();
    while let Some(rest) = base.strip_prefix("[]") {
        prefix.push_str("[]");
        base = rest;
    }

    if KNOWN_TYPES.contains(&base) {
        return format!("{prefix}{base}");
    }
    match custom_package {
        Some(pkg) => format!("{prefix}{pkg}.{base}"),
        None => format!("{prefix}{base}"),
    }
}

/// Requalify a composite-literal zero value (`Point{}`) like [`retype`].
pub fn reniltype(typ: &str, custom_package: Option<&str>) -> String {
    if typ.contains('.') {
        return typ.to_string();
    }

    match typ.strip_suffix("{}") {
        Some(base) if !KNOWN_TYPES.contains(&base) => match custom_package {
            Some(pkg) => format!("{pkg}.{typ}"),
            None => typ.to_string(),
        },
        _ => typ.to_string(),
    }
}

/// Go parameter name for a field: the first word lower-cased, the rest kept
/// (e.g. "AuthorID" -> "authorID", "Type" -> "typ").
pub fn param_name(field: &str, i: usize) -> String {
    if field.is_empty() {
        return format!("v{i}");
    }

    let snake = camel_to_snake(field);
    let first_len = snake.split('_').next().map_or(0, |w| w.chars().count());
    let head: String = field.chars().take(first_len).collect();
    let tail: String = field.chars().skip(first_len).collect();
    let name = format!("{}{tail}", head.to_lowercase());

    match reserved(&name.to_lowercase()) {
        Some(r) => r.to_string(),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_shortname() {
        assert_eq!(derive_shortname("AuthorBook"), "ab");
        assert_eq!(derive_shortname("Book"), "b");
        assert_eq!(derive_shortname("BookAuthorID"), "ba");
        assert_eq!(derive_shortname("sql.NullString"), "sns");
        assert_eq!(derive_shortname("[]byte"), "b");
        assert_eq!(derive_shortname("ID"), "i");
    }

    #[test]
    fn test_shortname_reserved_substitution() {
        assert_eq!(derive_shortname("MediaAssetPlan"), "mp");
        assert_eq!(derive_shortname("GoOut"), "goVal");
        assert_eq!(derive_shortname("InformationFeed"), "ifVal");
    }

    #[test]
    fn test_retype() {
        assert_eq!(retype("int64", Some("geo")), "int64");
        assert_eq!(retype("Point", Some("geo")), "geo.Point");
        assert_eq!(retype("[][]Point", Some("geo")), "[][]geo.Point");
        assert_eq!(retype("[]byte", Some("geo")), "[]byte");
        assert_eq!(retype("sql.NullString", Some("geo")), "sql.NullString");
        assert_eq!(retype("Point", None), "Point");
    }

    #[test]
    fn test_reniltype() {
        assert_eq!(reniltype("Point{}", Some("geo")), "geo.Point{}");
        assert_eq!(reniltype("string{}", Some("geo")), "string{}");
        assert_eq!(reniltype("0", Some("geo")), "0");
        assert_eq!(reniltype("sql.NullString{}", Some("geo")), "sql.NullString{}");
    }

    #[test]
    fn test_param_name() {
        assert_eq!(param_name("AuthorID", 0), "authorID");
        assert_eq!(param_name("BookID", 0), "bookID");
        assert_eq!(param_name("ID", 0), "id");
        assert_eq!(param_name("Type", 0), "typ");
        assert_eq!(param_name("", 3), "v3");
    }
}
