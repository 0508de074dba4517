//! Template Renderer.
//!
//! Templates turn one model fragment into text. Each rendered fragment
//! becomes an immutable [`Segment`] tagged with its destination metadata;
//! the output assembler orders and writes them later.

use std::{
    cmp::Ordering,
    fmt,
    path::Path,
};

use indexmap::IndexMap;
use xogen_core::{Engine, Error, Result};
use xogen_ir::{ForeignKey, Index, Query, SchemaDefinition, Type};

use crate::helpers::Helpers;

/// Kind of template, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TemplateKind {
    Type,
    ForeignKey,
    Index,
    QueryType,
    Query,
    Schema,
    Extension,
    /// Package-level support code, written once per run.
    Root,
    /// File preamble, written when a file is opened for truncation.
    Package,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 9] = [
        TemplateKind::Type,
        TemplateKind::ForeignKey,
        TemplateKind::Index,
        TemplateKind::QueryType,
        TemplateKind::Query,
        TemplateKind::Schema,
        TemplateKind::Extension,
        TemplateKind::Root,
        TemplateKind::Package,
    ];

    /// Base name of the override file for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Type => "type",
            TemplateKind::ForeignKey => "foreignkey",
            TemplateKind::Index => "index",
            TemplateKind::QueryType => "querytype",
            TemplateKind::Query => "query",
            TemplateKind::Schema => "schema",
            TemplateKind::Extension => "extension",
            TemplateKind::Root => "xo_db",
            TemplateKind::Package => "xo_package",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The model fragment a template renders.
#[derive(Debug, Clone, Copy)]
pub enum TemplateInput<'a> {
    Type(&'a Type),
    ForeignKey(&'a ForeignKey),
    /// An index with the type it belongs to.
    Index(&'a Type, &'a Index),
    QueryType(&'a Type),
    Query(&'a Query),
    Schema(&'a SchemaDefinition),
    /// A type of the first connection, with that connection's definition.
    Extension(&'a Type, &'a SchemaDefinition),
    /// Package-wide support code, given every contributing engine.
    Root(&'a [Engine]),
    Package,
}

impl TemplateInput<'_> {
    pub fn kind(&self) -> TemplateKind {
        match self {
            TemplateInput::Type(_) => TemplateKind::Type,
            TemplateInput::ForeignKey(_) => TemplateKind::ForeignKey,
            TemplateInput::Index(..) => TemplateKind::Index,
            TemplateInput::QueryType(_) => TemplateKind::QueryType,
            TemplateInput::Query(_) => TemplateKind::Query,
            TemplateInput::Schema(_) => TemplateKind::Schema,
            TemplateInput::Extension(..) => TemplateKind::Extension,
            TemplateInput::Root(_) => TemplateKind::Root,
            TemplateInput::Package => TemplateKind::Package,
        }
    }

    /// Name of the entity the fragment belongs to.
    pub fn name(&self) -> &str {
        match self {
            TemplateInput::Type(t)
            | TemplateInput::QueryType(t)
            | TemplateInput::Extension(t, _) => &t.name,
            TemplateInput::ForeignKey(fk) => &fk.name,
            TemplateInput::Index(_, i) => &i.func_name,
            TemplateInput::Query(q) => &q.name,
            TemplateInput::Schema(_) => "schema",
            TemplateInput::Root(_) => "xo_db",
            TemplateInput::Package => "xo_package",
        }
    }

    /// Native relation name, when the fragment has one.
    pub fn table(&self) -> Option<&str> {
        match self {
            TemplateInput::Type(t)
            | TemplateInput::QueryType(t)
            | TemplateInput::Extension(t, _) => Some(&t.table),
            TemplateInput::Index(_, i) => Some(&i.table),
            TemplateInput::Query(q) => Some(&q.result.table),
            _ => None,
        }
    }
}

/// Renders one kind of fragment.
pub trait Template {
    fn render(&self, input: &TemplateInput<'_>, h: &mut Helpers<'_>) -> Result<String>;
}

/// A template read from a file, rendered by `{{key}}` substitution.
///
/// Known keys: `name`, `table`, `package`, `driver`, `schema`. Unknown keys
/// are left in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTemplate {
    source: String,
}

impl TextTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Template for TextTemplate {
    fn render(&self, input: &TemplateInput<'_>, h: &mut Helpers<'_>) -> Result<String> {
        let schema = match input {
            TemplateInput::Schema(s) => s.schema.as_str(),
            _ => "",
        };
        let values = [
            ("name", input.name()),
            ("table", input.table().unwrap_or_default()),
            ("package", h.package()),
            ("driver", h.driver().as_str()),
            ("schema", schema),
        ];

        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };
            let key = after[..end].trim();
            match values.iter().find(|(k, _)| *k == key) {
                Some((_, v)) => out.push_str(v),
                None => out.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Named templates, with optional file overrides.
///
/// Lookup order: `<driver>.<kind>.go.tpl` override, `<kind>.go.tpl`
/// override, then the built-in template.
#[derive(Default)]
pub struct TemplateSet {
    builtin: IndexMap<TemplateKind, Box<dyn Template>>,
    overrides: IndexMap<(Option<Engine>, TemplateKind), TextTemplate>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: TemplateKind, template: Box<dyn Template>) -> &mut Self {
        self.builtin.insert(kind, template);
        self
    }

    pub fn with(mut self, kind: TemplateKind, template: impl Template + 'static) -> Self {
        self.insert(kind, Box::new(template));
        self
    }

    pub fn override_with(&mut self, engine: Option<Engine>, kind: TemplateKind, template: TextTemplate) {
        self.overrides.insert((engine, kind), template);
    }

    /// Load every override present in `dir`.
    pub fn load_overrides(&mut self, dir: &Path) -> Result<()> {
        for kind in TemplateKind::ALL {
            let engines = Engine::ALL.into_iter().map(Some).chain([None]);
            for engine in engines {
                let file = match engine {
                    Some(e) => format!("{}.{kind}.go.tpl", e.as_str()),
                    None => format!("{kind}.go.tpl"),
                };
                let path = dir.join(&file);
                if !path.is_file() {
                    continue;
                }
                let source = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
                tracing::debug!(path = %path.display(), "loaded template override");
                self.override_with(engine, kind, TextTemplate::new(source));
            }
        }
        Ok(())
    }

    pub fn contains(&self, kind: TemplateKind) -> bool {
        self.builtin.contains_key(&kind) || self.overrides.keys().any(|(_, k)| *k == kind)
    }

    /// Render `input` with the template of its kind; empty when none exists.
    pub fn render(&self, input: &TemplateInput<'_>, h: &mut Helpers<'_>) -> Result<String> {
        let kind = input.kind();
        let engine = h.driver();

        if let Some(t) = self
            .overrides
            .get(&(Some(engine), kind))
            .or_else(|| self.overrides.get(&(None, kind)))
        {
            return t.render(input, h);
        }
        match self.builtin.get(&kind) {
            Some(t) => t.render(input, h),
            None => {
                tracing::debug!(%kind, "no template registered");
                Ok(String::new())
            }
        }
    }
}

/// One rendered unit of output and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: TemplateKind,
    /// Contributing engine; `None` for run-wide aggregates.
    pub engine: Option<Engine>,
    pub name: String,
    /// Tie-break between segments of the same entity.
    pub subname: String,
    pub content: String,
}

impl Segment {
    pub fn new(
        kind: TemplateKind,
        engine: Option<Engine>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            engine,
            name: name.into(),
            subname: String::new(),
            content: content.into(),
        }
    }

    pub fn with_subname(mut self, subname: impl Into<String>) -> Self {
        self.subname = subname.into();
        self
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Destination file name.
    ///
    /// `<name-lowercased>[.extension][.<engine-tag>]<suffix>`; the tag is
    /// only added when `tagged` and the segment has an engine.
    pub fn file_name(&self, suffix: &str, tagged: bool) -> String {
        let mut name = self.name.to_lowercase();
        if self.kind == TemplateKind::Extension {
            name.push_str(".extension");
        }
        if let (true, Some(engine)) = (tagged, self.engine) {
            name.push('.');
            name.push_str(engine.file_tag());
        }
        name.push_str(suffix);
        name
    }

    fn sort_key(&self) -> (TemplateKind, Option<Engine>, &str, &str) {
        (self.kind, self.engine, &self.name, &self.subname)
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.content.cmp(&other.content))
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use xogen_loader::{OracleLoader, PostgresLoader};

    use super::*;
    use crate::{context::RunContext, testing::settings};

    struct Fixed(&'static str);

    impl Template for Fixed {
        fn render(&self, _: &TemplateInput<'_>, _: &mut Helpers<'_>) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_segment_order() {
        let mut segments = vec![
            Segment::new(TemplateKind::Index, Some(Engine::Postgres), "Book", "i"),
            Segment::new(TemplateKind::Type, Some(Engine::Oracle), "Author", "t"),
            Segment::new(TemplateKind::Type, Some(Engine::Postgres), "Book", "t"),
            Segment::new(TemplateKind::Type, Some(Engine::Postgres), "Author", "t"),
            Segment::new(TemplateKind::Root, None, "xo_db", "r"),
        ];
        segments.sort();

        let order: Vec<_> = segments
            .iter()
            .map(|s| (s.kind, s.engine, s.name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (TemplateKind::Type, Some(Engine::Postgres), "Author"),
                (TemplateKind::Type, Some(Engine::Postgres), "Book"),
                (TemplateKind::Type, Some(Engine::Oracle), "Author"),
                (TemplateKind::Index, Some(Engine::Postgres), "Book"),
                (TemplateKind::Root, None, "xo_db"),
            ]
        );
    }

    #[test]
    fn test_file_name() {
        let seg = Segment::new(TemplateKind::Type, Some(Engine::Oracle), "AuthorBook", "");
        assert_eq!(seg.file_name(".xo.go", false), "authorbook.xo.go");
        assert_eq!(seg.file_name(".xo.go", true), "authorbook.oracle.xo.go");

        let ext = Segment::new(TemplateKind::Extension, Some(Engine::Postgres), "Book", "");
        assert_eq!(ext.file_name(".go", true), "book.extension.postgres.go");

        let root = Segment::new(TemplateKind::Root, None, "xo_db", "");
        assert_eq!(root.file_name(".xo.go", true), "xo_db.xo.go");
    }

    #[test]
    fn test_blank_segment() {
        assert!(Segment::new(TemplateKind::Type, None, "Book", " \n\t").is_blank());
        assert!(!Segment::new(TemplateKind::Type, None, "Book", "x").is_blank());
    }

    #[test]
    fn test_override_precedence() {
        let settings = settings(Path::new("."));
        let mut ctx = RunContext::default();

        let mut set = TemplateSet::new().with(TemplateKind::Root, Fixed("builtin"));
        {
            let mut h = Helpers::new(&mut ctx, &settings, &PostgresLoader);
            assert_eq!(set.render(&TemplateInput::Root(&[]), &mut h).unwrap(), "builtin");
        }

        set.override_with(None, TemplateKind::Root, TextTemplate::new("generic"));
        set.override_with(
            Some(Engine::Oracle),
            TemplateKind::Root,
            TextTemplate::new("oracle {{driver}}"),
        );

        let mut h = Helpers::new(&mut ctx, &settings, &PostgresLoader);
        assert_eq!(set.render(&TemplateInput::Root(&[]), &mut h).unwrap(), "generic");
        let mut h = Helpers::new(&mut ctx, &settings, &OracleLoader);
        assert_eq!(set.render(&TemplateInput::Root(&[]), &mut h).unwrap(), "oracle godror");
    }

    #[test]
    fn test_text_template_substitution() {
        let settings = settings(Path::new("."));
        let mut ctx = RunContext::default();
        let mut h = Helpers::new(&mut ctx, &settings, &PostgresLoader);

        let t = TextTemplate::new("package {{ package }} // {{name}} {{unknown}} {{");
        assert_eq!(
            t.render(&TemplateInput::Root(&[]), &mut h).unwrap(),
            "package models // xo_db {{unknown}} {{"
        );
    }

    #[test]
    fn test_missing_template_renders_empty() {
        let settings = settings(Path::new("."));
        let mut ctx = RunContext::default();
        let mut h = Helpers::new(&mut ctx, &settings, &PostgresLoader);

        let set = TemplateSet::new();
        assert!(!set.contains(TemplateKind::Query));
        assert_eq!(set.render(&TemplateInput::Root(&[]), &mut h).unwrap(), "");
    }

    #[test]
    fn test_load_overrides() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("godror.xo_db.go.tpl"), "ora").unwrap();
        std::fs::write(dir.path().join("xo_package.go.tpl"), "package {{package}}\n").unwrap();

        let mut set = TemplateSet::new();
        set.load_overrides(dir.path()).unwrap();
        assert!(set.contains(TemplateKind::Root));
        assert!(set.contains(TemplateKind::Package));
        assert!(!set.contains(TemplateKind::Type));
    }
}
