use xogen_codegen::{CodeBuilder, Helpers, Template, TemplateInput};
use xogen_core::Result;

/// GraphQL description of a type: its object type with back-relations, a
/// filter input over the filterable fields, and the access-controlled
/// columns. Renders nothing unless extensions are enabled.
pub struct ExtensionTemplate;

impl Template for ExtensionTemplate {
    fn render(&self, input: &TemplateInput<'_>, h: &mut Helpers<'_>) -> Result<String> {
        let TemplateInput::Extension(ty, def) = input else {
            return Ok(String::new());
        };
        if !h.enable_extension() {
            return Ok(String::new());
        }

        let mut fields = Vec::with_capacity(ty.fields.len());
        for f in &ty.fields {
            let gql = h.gql_type(&f.go_type, f.col.is_primary_key)?;
            fields.push(format!("{}: {gql}", h.togqlname(&f.name)));
        }

        let scope = format!("reverse:{}", ty.name);
        let mut relations = Vec::new();
        for fk in def.referencing(&ty.name) {
            let base = h.plural(&fk.type_name);
            let is_dup = h.isdup(&base, &scope);
            let name = h.fk_reverse_field(fk, is_dup);
            relations.push(format!("{name}: [{}!]!", fk.type_name));
        }

        let mut filters = Vec::new();
        if h.exist_sql_filter(ty) {
            let indexed = h.flat_index_fields(ty);
            for f in &ty.fields {
                match h.sql_filter(&ty.table, f, &indexed) {
                    "unsupported" => {}
                    kind => filters.push(format!("{}: {kind}Filter", h.togqlname(&f.name))),
                }
            }
        }

        let ac_columns: Vec<&str> = if h.enable_ac() {
            ty.fields
                .iter()
                .filter(|f| h.is_ac_field(&ty.table, f))
                .map(|f| f.col.name.as_str())
                .collect()
        } else {
            Vec::new()
        };

        let mut b = CodeBuilder::new();
        b.push_comment(&format!("{}GraphQL is the GraphQL schema of {}.", ty.name, ty.name));
        b.push_line(&format!("const {}GraphQL = `", ty.name));
        b.push_block(&format!("type {} {{", ty.name), |b| {
            for line in fields.iter().chain(&relations) {
                b.push_line(line);
            }
        });
        if !filters.is_empty() {
            b.push_blank();
            b.push_block(&format!("input {}Filter {{", ty.name), |b| {
                for line in &filters {
                    b.push_line(line);
                }
            });
        }
        b.push_line("`");

        if !ac_columns.is_empty() {
            b.push_blank();
            b.push_comment(&format!(
                "{}ACFields lists the columns of '{}' guarded by access control.",
                ty.name, ty.table
            ));
            b.push_block(&format!("var {}ACFields = []string{{", ty.name), |b| {
                for col in &ac_columns {
                    b.push_line(&format!("\"{col}\","));
                }
            });
        }
        Ok(b.build())
    }
}
