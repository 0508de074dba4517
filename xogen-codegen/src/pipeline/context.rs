//! Generation context passed through pipeline phases.

use xogen_core::Engine;
use xogen_ir::{Query, SchemaDefinition};
use xogen_loader::{Database, LoaderRegistry};

use crate::{
    config::Settings,
    context::RunContext,
    output::WrittenFile,
    render::{Segment, TemplateSet},
};

/// An open database handle and the engine it speaks.
pub struct Connection {
    pub engine: Engine,
    pub db: Box<dyn Database>,
}

impl Connection {
    pub fn new(engine: Engine, db: Box<dyn Database>) -> Self {
        Self { engine, db }
    }
}

/// What one connection contributed to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded {
    Schema(SchemaDefinition),
    Query { schema: String, query: Query },
}

impl Loaded {
    pub fn definition(&self) -> Option<&SchemaDefinition> {
        match self {
            Loaded::Schema(def) => Some(def),
            Loaded::Query { .. } => None,
        }
    }
}

/// State of one generation run.
///
/// Phases fill it in order: connections are introspected into `loaded`,
/// rendered into `segments` and `header`, then written into `written`.
pub struct GenerationContext<'a> {
    pub settings: &'a Settings,
    pub registry: &'a LoaderRegistry,
    pub templates: &'a TemplateSet,
    /// Database handles, in declaration order.
    pub connections: Vec<Connection>,
    /// Per-engine results, in connection order.
    pub loaded: Vec<(Engine, Loaded)>,
    pub run: RunContext,
    pub header: String,
    pub segments: Vec<Segment>,
    pub written: Vec<WrittenFile>,
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        settings: &'a Settings,
        registry: &'a LoaderRegistry,
        templates: &'a TemplateSet,
        connections: Vec<Connection>,
    ) -> Self {
        Self {
            settings,
            registry,
            templates,
            connections,
            loaded: Vec::new(),
            run: RunContext::new(settings.name_conflict_suffix.clone()),
            header: String::new(),
            segments: Vec::new(),
            written: Vec::new(),
        }
    }

    /// Engine of the first connection.
    pub fn primary_engine(&self) -> Option<Engine> {
        self.loaded.first().map(|(e, _)| *e)
    }

    /// Definition of the first connection, in schema mode.
    pub fn primary_definition(&self) -> Option<&SchemaDefinition> {
        self.loaded.first().and_then(|(_, l)| l.definition())
    }
}
