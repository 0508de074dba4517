use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type for xogen operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("output path '{path}' is not a directory")]
    #[diagnostic(
        code(xogen::config::out_not_dir),
        help("pass --single-file to write everything into '{}'", path.display())
    )]
    OutputNotDirectory { path: PathBuf },

    #[error("output path '{path}' does not exist")]
    #[diagnostic(
        code(xogen::config::out_missing),
        help("create the directory first, or pass --single-file to write one file")
    )]
    OutputMissing { path: PathBuf },

    #[error("template path '{path}' is not a directory")]
    #[diagnostic(code(xogen::config::template_path))]
    TemplatePathNotDirectory { path: PathBuf },

    #[error("template path '{path}' does not exist")]
    #[diagnostic(code(xogen::config::template_path))]
    TemplatePathMissing { path: PathBuf },

    #[error("query type must be supplied for query parsing mode")]
    #[diagnostic(code(xogen::config::query_type), help("pass --query-type <Name>"))]
    MissingQueryType,

    #[error("no database connection configured")]
    #[diagnostic(code(xogen::config::no_connections))]
    NoConnections,

    #[error("unsupported database engine '{name}'")]
    #[diagnostic(
        code(xogen::config::engine),
        help("supported engines are: postgres, godror")
    )]
    UnsupportedEngine { name: String },

    #[error("no loader registered for engine '{engine}'")]
    #[diagnostic(code(xogen::config::loader))]
    LoaderNotRegistered { engine: String },

    #[error("engine '{engine}' is configured by more than one connection")]
    #[diagnostic(code(xogen::config::duplicate_engine))]
    DuplicateEngine { engine: String },

    #[error("unknown {engine} type {native:?}")]
    #[diagnostic(
        code(xogen::types::unknown_native),
        help("the column type has no mapping; add it to the {engine} loader")
    )]
    UnknownNativeType { engine: String, native: String },

    #[error("unknown semantic type {name:?}")]
    #[diagnostic(code(xogen::types::unknown_semantic))]
    UnknownSemanticType { name: String },

    #[error("invalid query parameter {param:?}")]
    #[diagnostic(
        code(xogen::query::param),
        help("query parameters are written as <delim>name type[,interpolate]<delim>")
    )]
    InvalidQueryParam { param: String },

    #[error("failed to parse rule file '{path}'")]
    #[diagnostic(code(xogen::config::rule_file))]
    RuleFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to connect to {engine}: {message}")]
    #[diagnostic(code(xogen::connection))]
    Connection { engine: String, message: String },

    #[error("metadata query failed: {message}")]
    #[diagnostic(code(xogen::introspection), help("query was:\n{query}"))]
    Introspection { query: String, message: String },

    #[error("unexpected value in column {column} of metadata row")]
    #[diagnostic(code(xogen::introspection::row))]
    RowValue { column: usize },

    #[error("filesystem error on '{path}'")]
    #[diagnostic(code(xogen::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' is a directory")]
    #[diagnostic(code(xogen::io::directory))]
    DestinationIsDirectory { path: PathBuf },

    #[error("{output}")]
    #[diagnostic(code(xogen::post_process))]
    PostProcess { output: String },
}

impl Error {
    /// Wrap an io error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Box<Self> {
        Box::new(Self::Io {
            path: path.into(),
            source,
        })
    }

    /// Create an introspection error for a failing metadata query.
    pub fn introspection(query: impl Into<String>, message: impl ToString) -> Box<Self> {
        Box::new(Self::Introspection {
            query: query.into(),
            message: message.to_string(),
        })
    }

    /// Returns true for errors detected while resolving configuration.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::OutputNotDirectory { .. }
                | Self::OutputMissing { .. }
                | Self::TemplatePathNotDirectory { .. }
                | Self::TemplatePathMissing { .. }
                | Self::MissingQueryType
                | Self::NoConnections
                | Self::UnsupportedEngine { .. }
                | Self::LoaderNotRegistered { .. }
                | Self::DuplicateEngine { .. }
                | Self::UnknownNativeType { .. }
                | Self::UnknownSemanticType { .. }
                | Self::InvalidQueryParam { .. }
                | Self::RuleFile { .. }
        )
    }
}
