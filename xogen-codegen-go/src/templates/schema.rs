use xogen_codegen::{CodeBuilder, Helpers, Template, TemplateInput};
use xogen_core::Result;

use super::methods::table_methods;

/// Summary of the generated schema and the `Storer` interface every
/// storage type implements.
pub struct SchemaTemplate;

impl Template for SchemaTemplate {
    fn render(&self, input: &TemplateInput<'_>, h: &mut Helpers<'_>) -> Result<String> {
        let TemplateInput::Schema(def) = input else {
            return Ok(String::new());
        };

        let engines: Vec<&str> = def.engines.iter().map(|e| e.as_str()).collect();
        let tables: Vec<&str> = def.tables.iter().map(|t| t.table.as_str()).collect();
        let views: Vec<&str> = def.views.iter().map(|t| t.table.as_str()).collect();

        let mut summary = format!("Schema '{}', generated for {}.", def.schema, engines.join(", "));
        if !tables.is_empty() {
            summary.push_str(&format!("\n\nTables: {}.", tables.join(", ")));
        }
        if !views.is_empty() {
            summary.push_str(&format!("\n\nViews: {}.", views.join(", ")));
        }

        let mut methods = Vec::new();
        for ty in def.types() {
            methods.push(table_methods(h, ty));
        }

        let code = CodeBuilder::new()
            .comment(&summary)
            .blank()
            .comment("Storer is implemented by the storage type of every engine.")
            .block("type Storer interface {", |b| {
                b.each(methods.iter().enumerate(), |mut b, (i, group)| {
                    if i > 0 && !group.is_empty() {
                        b.push_blank();
                    }
                    for m in group {
                        b.push_line(&m.signature());
                    }
                    b
                })
            })
            .build();
        Ok(code)
    }
}
