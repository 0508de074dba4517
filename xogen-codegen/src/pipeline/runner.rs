//! Pipeline orchestrator.

use xogen_core::Result;

use super::{
    GenerationContext, Phase,
    phases::{IntrospectPhase, PostProcessPhase, RenderPhase, WritePhase},
};

/// Ordered list of phases making up a run.
///
/// ```ignore
/// let mut ctx = GenerationContext::new(&settings, &registry, &templates, connections);
/// Pipeline::new().run(&mut ctx)?;
/// ```
pub struct Pipeline {
    phases: Vec<Box<dyn Phase>>,
}

impl Pipeline {
    /// Introspect, render, write, post-process.
    pub fn new() -> Self {
        Self {
            phases: vec![
                Box::new(IntrospectPhase),
                Box::new(RenderPhase),
                Box::new(WritePhase),
                Box::new(PostProcessPhase),
            ],
        }
    }

    /// Only load the model; nothing is rendered or written.
    pub fn introspect_only() -> Self {
        Self {
            phases: vec![Box::new(IntrospectPhase)],
        }
    }

    /// Add a phase after the existing ones.
    pub fn phase(mut self, phase: impl Phase + 'static) -> Self {
        self.phases.push(Box::new(phase));
        self
    }

    pub fn phase_names(&self) -> Vec<&'static str> {
        self.phases.iter().map(|p| p.name()).collect()
    }

    pub fn run(&self, ctx: &mut GenerationContext<'_>) -> Result<()> {
        for phase in &self.phases {
            tracing::debug!(phase = phase.name(), "running phase");
            phase.run(ctx)?;
        }
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
