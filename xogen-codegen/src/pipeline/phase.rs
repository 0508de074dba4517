//! Pipeline phase trait.

use xogen_core::Result;

use super::GenerationContext;

/// A step of a generation run.
///
/// Phases run in order and communicate only through the context.
pub trait Phase {
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &mut GenerationContext<'_>) -> Result<()>;
}
