//! Run configuration.
//!
//! [`GenConfig`] is the raw option set as given on the command line.
//! [`GenConfig::resolve`] validates it against the filesystem and produces
//! the [`Settings`] a run works from. Every configuration error is detected
//! here, before any database is contacted.

use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;
use xogen_core::{Error, Result};

/// How foreign-key accessor names are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FkMode {
    /// Parent mode, falling back to field mode when one type has several
    /// keys into the same referenced type.
    #[default]
    Smart,
    /// The referenced type's name.
    Parent,
    /// `<RefType>By<Field>`.
    Field,
    /// The constraint name.
    Key,
}

impl FkMode {
    pub const ALL: [FkMode; 4] = [FkMode::Smart, FkMode::Parent, FkMode::Field, FkMode::Key];

    pub fn as_str(&self) -> &'static str {
        match self {
            FkMode::Smart => "smart",
            FkMode::Parent => "parent",
            FkMode::Field => "field",
            FkMode::Key => "key",
        }
    }
}

impl fmt::Display for FkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FkMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smart" | "default" => Ok(FkMode::Smart),
            "parent" => Ok(FkMode::Parent),
            "field" => Ok(FkMode::Field),
            "key" => Ok(FkMode::Key),
            other => Err(format!(
                "unknown foreign key mode '{other}' (expected smart, parent, field or key)"
            )),
        }
    }
}

/// Raw generator options.
#[derive(Debug, Clone)]
pub struct GenConfig {
    pub dsns: Vec<String>,
    pub schema: Option<String>,
    pub out: Option<PathBuf>,
    pub append: bool,
    pub suffix: String,
    pub single_file: bool,
    pub package: Option<String>,
    pub custom_type_package: Option<String>,
    pub int32_type: String,
    pub ignore_fields: Vec<String>,
    pub ignore_tables: Vec<String>,
    pub fk_mode: FkMode,
    pub use_index_names: bool,
    pub query_mode: bool,
    pub query: Option<String>,
    pub query_type: Option<String>,
    pub query_func: Option<String>,
    pub query_only_one: bool,
    pub query_trim: bool,
    pub query_strip: bool,
    pub query_interpolate: bool,
    pub query_type_comment: Option<String>,
    pub query_func_comment: Option<String>,
    pub query_delimiter: String,
    pub query_fields: Vec<String>,
    pub query_allow_nulls: bool,
    pub escape_all: bool,
    pub escape_schema: bool,
    pub escape_table: bool,
    pub escape_column: bool,
    pub name_conflict_suffix: String,
    pub template_path: Option<PathBuf>,
    pub tags: Option<String>,
    pub enable_ac: bool,
    pub enable_extension: bool,
    pub extra_rule_file: Option<PathBuf>,
    /// Post-processing command and leading arguments; `None` disables it.
    pub formatter: Option<Vec<String>>,
}

/// Appended to generated names that collide.
pub const DEFAULT_CONFLICT_SUFFIX: &str = "Val";

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            dsns: Vec::new(),
            schema: None,
            out: None,
            append: false,
            suffix: ".xo.go".to_string(),
            single_file: false,
            package: None,
            custom_type_package: None,
            int32_type: "int".to_string(),
            ignore_fields: Vec::new(),
            ignore_tables: Vec::new(),
            fk_mode: FkMode::default(),
            use_index_names: false,
            query_mode: false,
            query: None,
            query_type: None,
            query_func: None,
            query_only_one: false,
            query_trim: false,
            query_strip: false,
            query_interpolate: false,
            query_type_comment: None,
            query_func_comment: None,
            query_delimiter: "%%".to_string(),
            query_fields: Vec::new(),
            query_allow_nulls: false,
            escape_all: false,
            escape_schema: false,
            escape_table: false,
            escape_column: false,
            name_conflict_suffix: DEFAULT_CONFLICT_SUFFIX.to_string(),
            template_path: None,
            tags: None,
            enable_ac: false,
            enable_extension: false,
            extra_rule_file: None,
            formatter: Some(vec!["goimports".to_string(), "-w".to_string()]),
        }
    }
}

/// Which identifier kinds are quoted in generated SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Escaping {
    pub schema: bool,
    pub table: bool,
    pub column: bool,
}

/// Options of literal-query mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySettings {
    pub text: String,
    pub type_name: String,
    pub func: Option<String>,
    pub only_one: bool,
    /// Trim every line and rejoin them with single spaces.
    pub trim: bool,
    pub strip: bool,
    pub interpolate: bool,
    pub type_comment: Option<String>,
    pub func_comment: Option<String>,
    pub delimiter: String,
    pub fields: Vec<String>,
    pub allow_nulls: bool,
}

/// Column sets enabled by the extra rule file, keyed `column@table`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraRules {
    pub filters: BTreeSet<String>,
    pub ac_rules: BTreeSet<String>,
}

impl ExtraRules {
    pub fn key(column: &str, table: &str) -> String {
        format!("{column}@{table}")
    }

    /// Parse a rule file.
    ///
    /// ```toml
    /// [[extra_filters]]
    /// name = "books"
    /// enable = true
    /// fields = ["title", "isbn"]
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let file: RuleFile = toml::from_str(&content).map_err(|source| {
            Box::new(Error::RuleFile {
                path: path.to_path_buf(),
                source,
            })
        })?;

        let collect = |tables: &[RuleTable]| {
            tables
                .iter()
                .filter(|t| t.enable)
                .flat_map(|t| t.fields.iter().map(|f| Self::key(f, &t.name)))
                .collect()
        };

        Ok(Self {
            filters: collect(&file.extra_filters),
            ac_rules: collect(&file.extra_ac_rules),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    extra_filters: Vec<RuleTable>,
    #[serde(default)]
    extra_ac_rules: Vec<RuleTable>,
}

#[derive(Debug, Deserialize)]
struct RuleTable {
    name: String,
    #[serde(default)]
    enable: bool,
    #[serde(default)]
    fields: Vec<String>,
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub dsns: Vec<String>,
    pub schema: Option<String>,
    /// Output directory.
    pub path: PathBuf,
    /// Destination file name in single-file mode.
    pub filename: String,
    pub package: String,
    pub append: bool,
    pub suffix: String,
    pub single_file: bool,
    pub custom_type_package: Option<String>,
    pub int32_type: String,
    pub ignore_fields: BTreeSet<String>,
    pub ignore_tables: BTreeSet<String>,
    pub fk_mode: FkMode,
    pub use_index_names: bool,
    pub query: Option<QuerySettings>,
    pub escape: Escaping,
    pub name_conflict_suffix: String,
    pub template_path: Option<PathBuf>,
    pub tags: Option<String>,
    pub enable_ac: bool,
    pub enable_extension: bool,
    pub rules: ExtraRules,
    pub formatter: Option<Vec<String>>,
}

impl GenConfig {
    /// Validate the options and derive the run settings.
    pub fn resolve(self) -> Result<Settings> {
        let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
        self.resolve_in(&cwd)
    }

    /// Like [`GenConfig::resolve`], with relative paths taken from `cwd`.
    pub fn resolve_in(self, cwd: &Path) -> Result<Settings> {
        if self.dsns.is_empty() {
            return Err(Box::new(Error::NoConnections));
        }

        let (path, filename) = self.output_location(cwd)?;

        if let Some(template_path) = &self.template_path {
            match std::fs::metadata(template_path) {
                Ok(meta) if !meta.is_dir() => {
                    return Err(Box::new(Error::TemplatePathNotDirectory {
                        path: template_path.clone(),
                    }));
                }
                Ok(_) => {}
                Err(_) => {
                    return Err(Box::new(Error::TemplatePathMissing {
                        path: template_path.clone(),
                    }));
                }
            }
        }

        let package = match &self.package {
            Some(p) if !p.is_empty() => p.clone(),
            _ => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "models".to_string()),
        };
        let suffix = or_default(self.suffix, ".xo.go");
        let int32_type = or_default(self.int32_type, "int");
        let name_conflict_suffix = or_default(self.name_conflict_suffix, DEFAULT_CONFLICT_SUFFIX);
        let query_delimiter = or_default(self.query_delimiter, "%%");
        let filename = filename.unwrap_or_else(|| format!("{package}{suffix}"));

        let query_mode = self.query_mode || self.query.as_deref().is_some_and(|q| !q.is_empty());
        let query = if query_mode {
            let type_name = match &self.query_type {
                Some(t) if !t.is_empty() => t.clone(),
                _ => return Err(Box::new(Error::MissingQueryType)),
            };
            let mut text = self.query.clone().unwrap_or_default();
            if self.query_trim {
                text = text.trim().to_string();
            }
            Some(QuerySettings {
                text,
                type_name,
                func: self.query_func.clone().filter(|f| !f.is_empty()),
                only_one: self.query_only_one,
                trim: self.query_trim,
                strip: self.query_strip,
                interpolate: self.query_interpolate,
                type_comment: self.query_type_comment.clone(),
                func_comment: self.query_func_comment.clone(),
                delimiter: query_delimiter,
                fields: self.query_fields.clone(),
                allow_nulls: self.query_allow_nulls,
            })
        } else {
            None
        };

        let escape = Escaping {
            schema: self.escape_all || self.escape_schema,
            table: self.escape_all || self.escape_table,
            column: self.escape_all || self.escape_column,
        };

        let rules = match &self.extra_rule_file {
            Some(p) => ExtraRules::load(p)?,
            None => ExtraRules::default(),
        };

        Ok(Settings {
            dsns: self.dsns,
            schema: self.schema.filter(|s| !s.is_empty()),
            path,
            filename,
            package,
            append: self.append,
            suffix,
            single_file: self.single_file,
            custom_type_package: self.custom_type_package.filter(|p| !p.is_empty()),
            int32_type,
            ignore_fields: self.ignore_fields.into_iter().collect(),
            ignore_tables: self.ignore_tables.into_iter().collect(),
            fk_mode: self.fk_mode,
            use_index_names: self.use_index_names,
            query,
            escape,
            name_conflict_suffix,
            template_path: self.template_path,
            tags: self.tags.filter(|t| !t.is_empty()),
            enable_ac: self.enable_ac,
            enable_extension: self.enable_extension,
            rules,
            formatter: self.formatter.filter(|f| !f.is_empty()),
        })
    }

    /// Output directory and, for a file destination, its file name.
    fn output_location(&self, cwd: &Path) -> Result<(PathBuf, Option<String>)> {
        let Some(out) = &self.out else {
            return Ok((cwd.to_path_buf(), None));
        };
        let out = if out.is_absolute() {
            out.clone()
        } else {
            cwd.join(out)
        };

        let file_parts = |out: &Path| {
            let dir = match out.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => cwd.to_path_buf(),
            };
            let name = out.file_name().map(|n| n.to_string_lossy().into_owned());
            (dir, name)
        };

        match std::fs::metadata(&out) {
            Ok(meta) if meta.is_dir() => Ok((out, None)),
            Ok(_) => {
                if !self.single_file {
                    return Err(Box::new(Error::OutputNotDirectory { path: out }));
                }
                Ok(file_parts(&out))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if !self.single_file {
                    return Err(Box::new(Error::OutputMissing { path: out }));
                }
                Ok(file_parts(&out))
            }
            Err(e) => Err(Error::io(&out, e)),
        }
    }
}

/// `value`, or `default` when it was given empty.
fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}
