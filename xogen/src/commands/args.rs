use std::{io::Read, path::PathBuf};

use clap::Args;
use eyre::{Context, Result};
use xogen_codegen::{FkMode, GenConfig};

/// Options shared by every command that reads a schema.
#[derive(Args, Debug, Clone)]
pub struct GenArgs {
    /// Connection strings; the scheme selects the engine. Several may be
    /// given comma-separated
    #[arg(required = true, value_name = "DSN")]
    pub dsns: Vec<String>,

    /// Schema to load (defaults to the connection's current schema)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Output directory, or the output file with --single-file
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Append to existing files instead of overwriting them
    #[arg(short, long)]
    pub append: bool,

    /// Suffix of generated file names
    #[arg(short = 'f', long, default_value = ".xo.go")]
    pub suffix: String,

    /// Write everything into a single file
    #[arg(long)]
    pub single_file: bool,

    /// Package name (defaults to the output directory name)
    #[arg(short, long)]
    pub package: Option<String>,

    /// Package qualifying unknown custom types
    #[arg(short = 'C', long)]
    pub custom_type_package: Option<String>,

    /// Go type of non-null 32-bit integers
    #[arg(long, default_value = "int")]
    pub int32_type: String,

    /// Fields to skip, in any table
    #[arg(long, value_delimiter = ',')]
    pub ignore_fields: Vec<String>,

    /// Tables to skip
    #[arg(long, value_delimiter = ',')]
    pub ignore_tables: Vec<String>,

    /// Foreign key accessor naming: smart, parent, field or key
    #[arg(short = 'k', long, default_value = "smart")]
    pub fk_mode: FkMode,

    /// Name index lookups after the index instead of its fields
    #[arg(short = 'j', long)]
    pub use_index_names: bool,

    /// Generate code for one literal query (read from stdin without --query)
    #[arg(short = 'N', long)]
    pub query_mode: bool,

    /// Literal query text
    #[arg(short = 'Q', long)]
    pub query: Option<String>,

    /// Name of the query's result type
    #[arg(short = 'T', long)]
    pub query_type: Option<String>,

    /// Name of the query's function
    #[arg(short = 'F', long)]
    pub query_func: Option<String>,

    /// Return a single row
    #[arg(long)]
    pub query_only_one: bool,

    /// Trim the query's lines
    #[arg(short = 'M', long)]
    pub query_trim: bool,

    /// Strip `--` comments from the query
    #[arg(short = 'B', long)]
    pub query_strip: bool,

    /// Allow parameters spliced into the query text
    #[arg(short = 'I', long)]
    pub query_interpolate: bool,

    /// Comment of the result type
    #[arg(long)]
    pub query_type_comment: Option<String>,

    /// Comment of the query function
    #[arg(long)]
    pub query_func_comment: Option<String>,

    /// Delimiter around query parameters
    #[arg(short = 'D', long, default_value = "%%")]
    pub query_delimiter: String,

    /// Result field names, in column order
    #[arg(short = 'Z', long, value_delimiter = ',')]
    pub query_fields: Vec<String>,

    /// Make every result field nullable
    #[arg(short = 'U', long)]
    pub query_allow_nulls: bool,

    /// Quote schema, table and column names
    #[arg(long)]
    pub escape_all: bool,

    /// Quote schema names
    #[arg(long)]
    pub escape_schema: bool,

    /// Quote table names
    #[arg(long)]
    pub escape_table: bool,

    /// Quote column names
    #[arg(long)]
    pub escape_column: bool,

    /// Suffix appended to conflicting names
    #[arg(short = 'w', long, default_value = "Val")]
    pub name_conflict_suffix: String,

    /// Directory with template overrides
    #[arg(long)]
    pub template_path: Option<PathBuf>,

    /// Build tags written at the top of every file
    #[arg(long)]
    pub tags: Option<String>,

    /// Emit access-control metadata
    #[arg(long)]
    pub enable_ac: bool,

    /// Render the extension templates
    #[arg(long)]
    pub enable_extension: bool,

    /// TOML file enabling extra filters and access-control columns
    #[arg(long)]
    pub extra_rule_file: Option<PathBuf>,

    /// Command formatting the written files, given their paths
    #[arg(long, default_value = "goimports -w", conflicts_with = "no_format")]
    pub formatter: String,

    /// Leave the written files unformatted
    #[arg(long)]
    pub no_format: bool,
}

impl GenArgs {
    /// The generator options, reading the query from stdin when query mode
    /// is on and no query was given.
    pub fn to_config(&self) -> Result<GenConfig> {
        let mut query = self.query.clone();
        if self.query_mode && query.as_deref().is_none_or(str::is_empty) {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .wrap_err("failed to read the query from stdin")?;
            query = Some(text);
        }
        Ok(self.config_with_query(query))
    }

    fn config_with_query(&self, query: Option<String>) -> GenConfig {
        let formatter = if self.no_format {
            None
        } else {
            Some(self.formatter.split_whitespace().map(str::to_string).collect())
        };

        GenConfig {
            dsns: split_dsns(&self.dsns),
            schema: self.schema.clone(),
            out: self.out.clone(),
            append: self.append,
            suffix: self.suffix.clone(),
            single_file: self.single_file,
            package: self.package.clone(),
            custom_type_package: self.custom_type_package.clone(),
            int32_type: self.int32_type.clone(),
            ignore_fields: self.ignore_fields.clone(),
            ignore_tables: self.ignore_tables.clone(),
            fk_mode: self.fk_mode,
            use_index_names: self.use_index_names,
            query_mode: self.query_mode,
            query,
            query_type: self.query_type.clone(),
            query_func: self.query_func.clone(),
            query_only_one: self.query_only_one,
            query_trim: self.query_trim,
            query_strip: self.query_strip,
            query_interpolate: self.query_interpolate,
            query_type_comment: self.query_type_comment.clone(),
            query_func_comment: self.query_func_comment.clone(),
            query_delimiter: self.query_delimiter.clone(),
            query_fields: self.query_fields.clone(),
            query_allow_nulls: self.query_allow_nulls,
            escape_all: self.escape_all,
            escape_schema: self.escape_schema,
            escape_table: self.escape_table,
            escape_column: self.escape_column,
            name_conflict_suffix: self.name_conflict_suffix.clone(),
            template_path: self.template_path.clone(),
            tags: self.tags.clone(),
            enable_ac: self.enable_ac,
            enable_extension: self.enable_extension,
            extra_rule_file: self.extra_rule_file.clone(),
            formatter,
        }
    }
}

/// Every connection string, with comma-separated lists split apart.
fn split_dsns(dsns: &[String]) -> Vec<String> {
    dsns.iter()
        .flat_map(|d| d.split(','))
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}
