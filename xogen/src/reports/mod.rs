//! Report data structures for commands.
//!
//! Commands collect what they did into a report, then render it to an
//! [`Output`] target.

mod engines;
mod generate;
mod output;

pub use engines::{EngineInfo, EnginesReport};
pub use generate::{GenerateReport, PreviewReport};
pub use output::{Report, TerminalOutput};
