use xogen_codegen::{CodeBuilder, Helpers, Template, TemplateInput};
use xogen_core::Result;

/// File preamble: package clause, generated-code marker and imports.
///
/// The import list is a superset; the formatter drops what a file does not
/// use.
pub struct PackageTemplate;

const IMPORTS: &[&str] = &[
    "database/sql",
    "database/sql/driver",
    "errors",
    "fmt",
    "time",
];

impl Template for PackageTemplate {
    fn render(&self, _input: &TemplateInput<'_>, h: &mut Helpers<'_>) -> Result<String> {
        let package = h.package().to_string();
        let code = CodeBuilder::new()
            .line(&format!("// Package {package} contains the generated database types."))
            .line(&format!("package {package}"))
            .blank()
            .line("// Code generated by xogen. DO NOT EDIT.")
            .blank()
            .block_with_close("import (", ")", |b| {
                b.each(IMPORTS, |b, path| b.line(&format!("\"{path}\"")))
            })
            .blank()
            .build();
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use xogen_codegen::{RunContext, testing};
    use xogen_loader::PostgresLoader;

    use super::*;

    #[test]
    fn test_package_header() {
        let settings = testing::settings(Path::new("."));
        let mut ctx = RunContext::default();
        let mut h = Helpers::new(&mut ctx, &settings, &PostgresLoader);

        let out = PackageTemplate.render(&TemplateInput::Package, &mut h).unwrap();
        assert!(out.starts_with("// Package models contains"));
        assert!(out.contains("\npackage models\n"));
        assert!(out.contains("\t\"database/sql/driver\"\n"));
        assert!(out.ends_with(")\n\n"));
    }
}
