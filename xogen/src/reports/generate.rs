//! Generate command report data structures.

use std::path::PathBuf;

use xogen_codegen::{OpenMode, Segment, WrittenFile};

use super::output::{Output, Report};

/// Files written by a generation run.
#[derive(Debug)]
pub struct GenerateReport {
    pub out: PathBuf,
    pub written: Vec<WrittenFile>,
    pub formatted: bool,
}

impl Report for GenerateReport {
    fn render(&self, out: &mut dyn Output) {
        out.key_value("Output", &self.out.display().to_string());
        out.newline();

        out.section(&format!("Files ({})", self.written.len()));
        for file in &self.written {
            let name = file
                .path
                .strip_prefix(&self.out)
                .unwrap_or(&file.path)
                .display()
                .to_string();
            match file.mode {
                OpenMode::Truncate => out.added_item(&format!("{name} ({} segments)", file.segments)),
                OpenMode::Append => out.list_item(&format!("{name} (appended {})", file.segments)),
            }
        }

        if !self.formatted {
            out.newline();
            out.preformatted("Formatting skipped.");
        }
    }
}

/// Segments a run would write.
#[derive(Debug)]
pub struct PreviewReport {
    pub segments: Vec<Segment>,
}

impl Report for PreviewReport {
    fn render(&self, out: &mut dyn Output) {
        for segment in &self.segments {
            let label = match segment.engine {
                Some(engine) => format!("{} {} ({engine})", segment.kind, segment.name),
                None => format!("{} {}", segment.kind, segment.name),
            };
            out.divider(&label);
            out.preformatted(&segment.content);
        }

        out.divider("Summary");
        out.preformatted(&format!("{} segments would be written", self.segments.len()));
    }
}
