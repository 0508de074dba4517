//! Names derived from relationships between types.

use xogen_core::{lower_first, pluralize, snake_to_identifier};

use crate::config::FkMode;

/// Strip a trailing `id` (any case) from a field name: "AuthorID" -> "Author".
pub fn fk_name(field: &str) -> String {
    if field.len() >= 2 && field.to_ascii_lowercase().ends_with("id") {
        field[..field.len() - 2].to_string()
    } else {
        field.to_string()
    }
}

/// Name of the back-relation on the referenced type.
///
/// The base is the plural of the referencing type. Keys named after the
/// referenced field (or ending in `id`) use the base alone, with
/// `By<Field>` appended once the base is already taken in the scope. Keys
/// named `<Something>By` append the part before `By`; any other field name
/// is appended whole.
///
/// ```text
/// Book.AuthorID  -> Author.books
/// Company.CreatedBy -> User.companiesCreated
/// ```
pub fn fk_reverse_field(
    type_name: &str,
    field: &str,
    ref_type: &str,
    ref_field: &str,
    is_dup: bool,
) -> String {
    let base = pluralize(type_name);
    let own_key = field.eq_ignore_ascii_case(&format!("{ref_type}{ref_field}"))
        || field.to_ascii_lowercase().ends_with("id");

    let name = if own_key {
        if is_dup {
            format!("{base}By{field}")
        } else {
            base
        }
    } else if let Some(stripped) = field.strip_suffix("By") {
        format!("{base}{stripped}")
    } else {
        format!("{base}{field}")
    };

    lower_first(&name)
}

/// Accessor name for a foreign key.
///
/// `shares_ref_type` is true when another key of the same type references
/// the same type; smart mode then switches to field naming.
pub fn foreign_key_name(
    mode: FkMode,
    type_name: &str,
    constraint: &str,
    field: &str,
    ref_type: &str,
    shares_ref_type: bool,
) -> String {
    match mode {
        FkMode::Parent => ref_type.to_string(),
        FkMode::Field => format!("{ref_type}By{field}"),
        FkMode::Key => format!("{type_name}By{}", snake_to_identifier(constraint)),
        FkMode::Smart if shares_ref_type => format!("{ref_type}By{field}"),
        FkMode::Smart => ref_type.to_string(),
    }
}

/// Lookup function name for an index.
///
/// `<Type>By<Fields>` for unique indexes, `<Types>By<Fields>` otherwise, or
/// the index name itself when `use_index_name` is set.
pub fn index_func_name(
    type_name: &str,
    is_unique: bool,
    fields: &[&str],
    index_name: &str,
    use_index_name: bool,
) -> String {
    if use_index_name {
        return snake_to_identifier(index_name);
    }

    let base = if is_unique {
        type_name.to_string()
    } else {
        pluralize(type_name)
    };
    format!("{base}By{}", fields.concat())
}
