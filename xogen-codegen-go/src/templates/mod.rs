//! Built-in Go templates.
//!
//! Every generated accessor is a method on a per-engine storage type
//! (`PostgresStorage`, `GodrorStorage`), so several engines can contribute
//! the same entity to one package without clashing.

mod extension;
#[cfg(test)]
mod fixtures;
mod foreign_key;
mod index;
mod methods;
mod package;
mod query;
mod root;
mod schema;
mod type_def;

pub use extension::ExtensionTemplate;
pub use foreign_key::ForeignKeyTemplate;
pub use index::IndexTemplate;
pub use package::PackageTemplate;
pub use query::{QueryTemplate, QueryTypeTemplate};
pub use root::RootTemplate;
pub use schema::SchemaTemplate;
pub use type_def::TypeTemplate;

use xogen_codegen::{CodeBuilder, Helpers, TemplateKind, TemplateSet};
use xogen_core::{Engine, upper_first};
use xogen_ir::Type;

/// Every built-in template, one per kind.
pub fn builtin() -> TemplateSet {
    TemplateSet::new()
        .with(TemplateKind::Package, PackageTemplate)
        .with(TemplateKind::Type, TypeTemplate)
        .with(TemplateKind::ForeignKey, ForeignKeyTemplate)
        .with(TemplateKind::Index, IndexTemplate)
        .with(TemplateKind::QueryType, QueryTypeTemplate)
        .with(TemplateKind::Query, QueryTemplate)
        .with(TemplateKind::Schema, SchemaTemplate)
        .with(TemplateKind::Extension, ExtensionTemplate)
        .with(TemplateKind::Root, RootTemplate)
}

/// Go type holding the generated methods of `engine`.
pub fn storage_name(engine: Engine) -> String {
    format!("{}Storage", upper_first(engine.as_str()))
}

/// Names every generated method already uses for its own parameters.
const RESERVED_PARAMS: &[&str] = &["s", "db", "err", "q", "res"];

/// Variable name for a value of the type named `type_name`.
pub(crate) fn receiver(h: &mut Helpers<'_>, type_name: &str) -> String {
    h.shortname(type_name, RESERVED_PARAMS)
}

/// Schema-qualified relation name of `ty`.
pub(crate) fn relation(h: &Helpers<'_>, ty: &Type) -> String {
    h.schema(&ty.schema, &[&ty.table])
}

/// Whether values of `ty` track their existence in the database.
pub(crate) fn tracks_existence(ty: &Type) -> bool {
    ty.kind == xogen_ir::RelKind::Table && ty.primary_key().is_some()
}

/// Backquoted Go string literal pieces joined with `+`, one per line.
///
/// ```text
/// `SELECT ` +
///     `a, b ` +
///     `FROM t`
/// ```
pub(crate) fn sql_literal(parts: &[String]) -> Vec<String> {
    let last = parts.len().saturating_sub(1);
    parts
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let lit = format!("`{}`", p.replace('`', "` + \"`\" + `"));
            if i == last { lit } else { format!("{lit} +") }
        })
        .collect()
}

/// `const sqlstr = ...` over the given pieces.
pub(crate) fn push_sqlstr(b: &mut CodeBuilder, parts: &[String]) {
    let lines = sql_literal(parts);
    let mut lines = lines.iter();
    if let Some(first) = lines.next() {
        b.push_line(&format!("const sqlstr = {first}"));
    }
    b.push_indent();
    for line in lines {
        b.push_line(line);
    }
    b.push_dedent();
}
