//! Model building, naming, rendering and output assembly for the xogen
//! schema generator.
//!
//! # Module Organization
//!
//! - [`config`] - Raw options and validated run settings
//! - [`naming`] - Identifier derivation and type requalification
//! - [`context`] - Run-scoped naming caches
//! - [`builder`] - Catalog to entity model
//! - [`query`] - Literal query parsing
//! - [`helpers`] - Helper surface exposed to templates
//! - [`render`] - Templates and rendered segments
//! - [`output`] - Output assembler and post-processor
//! - [`pipeline`] - Phases of a generation run
//! - [`testing`] - Test utilities (feature-gated)

pub mod builder;
mod code_builder;
pub mod config;
pub mod context;
pub mod helpers;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod query;
pub mod render;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use builder::SchemaBuilder;
pub use code_builder::CodeBuilder;
pub use config::{Escaping, ExtraRules, FkMode, GenConfig, QuerySettings, Settings};
pub use context::RunContext;
pub use helpers::Helpers;
pub use output::{OpenMode, OutputAssembler, PostProcessor, WrittenFile};
pub use pipeline::{Connection, GenerationContext, Loaded, Phase, Pipeline};
pub use render::{Segment, Template, TemplateInput, TemplateKind, TemplateSet, TextTemplate};
