//! Engines command report data structures.

use super::output::{Output, Report};

/// One registered engine.
#[derive(Debug)]
pub struct EngineInfo {
    pub driver: &'static str,
    pub file_tag: &'static str,
    pub schemes: &'static [&'static str],
    /// Whether the binary can open connections for it.
    pub connectable: bool,
}

#[derive(Debug)]
pub struct EnginesReport {
    pub engines: Vec<EngineInfo>,
}

impl Report for EnginesReport {
    fn render(&self, out: &mut dyn Output) {
        out.title("Engines");
        for engine in &self.engines {
            out.newline();
            out.section(engine.driver);
            out.key_value("  schemes", &engine.schemes.join(", "));
            out.key_value("  file tag", engine.file_tag);
            if !engine.connectable {
                out.list_item("schema loading only, no connector");
            }
        }
    }
}
