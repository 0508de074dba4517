//! Generation pipeline.
//!
//! A run moves through fixed phases sharing one [`GenerationContext`]:
//!
//! ```text
//! introspect (every connection, in order) → render (segments) → write → post-process
//! ```
//!
//! Nothing touches the filesystem before every connection has loaded.

mod context;
mod phase;
pub mod phases;
mod runner;

pub use context::{Connection, GenerationContext, Loaded};
pub use phase::Phase;
pub use runner::Pipeline;
