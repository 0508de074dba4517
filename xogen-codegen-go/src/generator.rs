use xogen_codegen::{
    Connection, GenerationContext, Loaded, Pipeline, Segment, Settings, TemplateSet, WrittenFile,
    pipeline::phases::RenderPhase,
};
use xogen_core::{Engine, Result};
use xogen_loader::LoaderRegistry;

use crate::templates;

/// Go code generator driving the generation pipeline with the built-in
/// templates, replaced per kind by any overrides in the template directory.
pub struct Generator<'a> {
    settings: &'a Settings,
}

impl<'a> Generator<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// The template set of this run.
    pub fn templates(&self) -> Result<TemplateSet> {
        let mut set = templates::builtin();
        if let Some(dir) = &self.settings.template_path {
            set.load_overrides(dir)?;
        }
        Ok(set)
    }

    /// Introspect every connection, then write and post-process the files.
    pub fn generate(
        &self,
        registry: &LoaderRegistry,
        connections: Vec<Connection>,
    ) -> Result<Vec<WrittenFile>> {
        let templates = self.templates()?;
        let mut ctx = GenerationContext::new(self.settings, registry, &templates, connections);
        Pipeline::new().run(&mut ctx)?;

        tracing::info!(files = ctx.written.len(), "generated go code");
        Ok(ctx.written)
    }

    /// Render without touching the filesystem.
    pub fn preview(
        &self,
        registry: &LoaderRegistry,
        connections: Vec<Connection>,
    ) -> Result<Vec<Segment>> {
        let templates = self.templates()?;
        let mut ctx = GenerationContext::new(self.settings, registry, &templates, connections);
        Pipeline::introspect_only().phase(RenderPhase).run(&mut ctx)?;

        let mut segments = ctx.segments;
        segments.retain(|s| !s.is_blank());
        segments.sort();
        Ok(segments)
    }

    /// Load the model of every connection without rendering it.
    pub fn inspect(
        &self,
        registry: &LoaderRegistry,
        connections: Vec<Connection>,
    ) -> Result<Vec<(Engine, Loaded)>> {
        let templates = TemplateSet::new();
        let mut ctx = GenerationContext::new(self.settings, registry, &templates, connections);
        Pipeline::introspect_only().run(&mut ctx)?;
        Ok(ctx.loaded)
    }
}
