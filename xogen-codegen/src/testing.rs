//! Test utilities for the generation pipeline.
//!
//! This module is only available when the `testing` feature is enabled
//! or during tests.

use std::path::Path;

use xogen_core::Result;

use crate::{
    config::{GenConfig, Settings},
    helpers::Helpers,
    render::{Template, TemplateInput, TemplateKind, TemplateSet},
};

/// Settings writing into `dir` with package `models` and no formatter.
///
/// The directory does not have to exist.
pub fn settings(dir: &Path) -> Settings {
    let defaults = GenConfig::default();
    Settings {
        dsns: vec!["postgres://localhost/booktest".to_string()],
        schema: None,
        path: dir.to_path_buf(),
        filename: format!("models{}", defaults.suffix),
        package: "models".to_string(),
        append: false,
        suffix: defaults.suffix,
        single_file: false,
        custom_type_package: None,
        int32_type: defaults.int32_type,
        ignore_fields: Default::default(),
        ignore_tables: Default::default(),
        fk_mode: defaults.fk_mode,
        use_index_names: false,
        query: None,
        escape: Default::default(),
        name_conflict_suffix: defaults.name_conflict_suffix,
        template_path: None,
        tags: None,
        enable_ac: false,
        enable_extension: false,
        rules: Default::default(),
        formatter: None,
    }
}

/// Renders `<kind> <name> <driver>` on one line.
pub struct EchoTemplate;

impl Template for EchoTemplate {
    fn render(&self, input: &TemplateInput<'_>, h: &mut Helpers<'_>) -> Result<String> {
        Ok(match input {
            TemplateInput::Package => format!("package {}\n", h.package()),
            _ => format!("// {} {} {}\n", input.kind(), input.name(), h.driver()),
        })
    }
}

/// A template set echoing every kind.
pub fn echo_templates() -> TemplateSet {
    let mut set = TemplateSet::new();
    for kind in TemplateKind::ALL {
        set.insert(kind, Box::new(EchoTemplate));
    }
    set
}
