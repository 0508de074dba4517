//! Output Assembler and post-processor.
//!
//! Segments are sorted into one total order, grouped by destination file and
//! written through a registry of open files. A file is opened at most once
//! per run, either truncated with a header or, when appending to an existing
//! file, without one. Every file is flushed and closed before the
//! post-processor sees it.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    process::Command,
};

use indexmap::IndexMap;
use xogen_core::{Engine, Error, Result};

use crate::{
    config::Settings,
    render::{Segment, TemplateKind},
};

/// How a destination was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Created or truncated; the header was written first.
    Truncate,
    /// Pre-existing file extended in place, no header.
    Append,
}

struct Destination {
    writer: BufWriter<File>,
    mode: OpenMode,
    segments: usize,
}

/// A file written by the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub mode: OpenMode,
    pub segments: usize,
}

/// Writes segments to their destination files.
pub struct OutputAssembler<'a> {
    settings: &'a Settings,
    header: String,
    files: IndexMap<PathBuf, Destination>,
}

impl<'a> OutputAssembler<'a> {
    /// `package_header` is the rendered file preamble; the build-tag line is
    /// prepended from the settings.
    pub fn new(settings: &'a Settings, package_header: &str) -> Self {
        let header = match &settings.tags {
            Some(tags) => format!("// +build {tags}\n\n{package_header}"),
            None => package_header.to_string(),
        };
        Self {
            settings,
            header,
            files: IndexMap::new(),
        }
    }

    /// Write every segment and close all files.
    ///
    /// Returns the files touched, sorted by path.
    pub fn write(mut self, mut segments: Vec<Segment>) -> Result<Vec<WrittenFile>> {
        segments.retain(|s| !s.is_blank());
        if self.settings.append {
            segments.retain(|s| s.kind != TemplateKind::Root);
        }
        segments.sort();

        let tagged = tagged_names(&segments);
        for segment in &segments {
            let needs_tag = tagged.contains(&segment.name.to_lowercase());
            let path = self.destination(segment, needs_tag);
            self.write_segment(&path, segment)?;
        }

        self.close()
    }

    fn destination(&self, segment: &Segment, tagged: bool) -> PathBuf {
        let file_name = if self.settings.single_file {
            self.settings.filename.clone()
        } else {
            segment.file_name(&self.settings.suffix, tagged)
        };
        self.settings.path.join(file_name)
    }

    fn write_segment(&mut self, path: &Path, segment: &Segment) -> Result<()> {
        if !self.files.contains_key(path) {
            let dest = self.open(path, segment.kind)?;
            self.files.insert(path.to_path_buf(), dest);
        }
        let Some(dest) = self.files.get_mut(path) else {
            return Ok(());
        };

        // definitions already exist in a file being appended to
        let skip = dest.mode == OpenMode::Append
            && matches!(segment.kind, TemplateKind::Type | TemplateKind::QueryType);
        if skip {
            tracing::debug!(name = %segment.name, kind = %segment.kind, "skipped in append mode");
            return Ok(());
        }

        dest.writer
            .write_all(segment.content.as_bytes())
            .map_err(|e| Error::io(path, e))?;
        dest.segments += 1;
        Ok(())
    }

    fn open(&self, path: &Path, kind: TemplateKind) -> Result<Destination> {
        let existing = match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {
                return Err(Box::new(Error::DestinationIsDirectory {
                    path: path.to_path_buf(),
                }));
            }
            Ok(_) => true,
            Err(_) => false,
        };

        let mode = if existing && self.settings.append && kind != TemplateKind::Root {
            OpenMode::Append
        } else {
            OpenMode::Truncate
        };

        let file = match mode {
            OpenMode::Append => OpenOptions::new().append(true).open(path),
            OpenMode::Truncate => File::create(path),
        }
        .map_err(|e| Error::io(path, e))?;

        let mut writer = BufWriter::new(file);
        if mode == OpenMode::Truncate {
            writer
                .write_all(self.header.as_bytes())
                .map_err(|e| Error::io(path, e))?;
        }

        tracing::debug!(path = %path.display(), ?mode, "opened destination");
        Ok(Destination {
            writer,
            mode,
            segments: 0,
        })
    }

    fn close(self) -> Result<Vec<WrittenFile>> {
        let mut written = Vec::with_capacity(self.files.len());
        for (path, dest) in self.files {
            let file = dest
                .writer
                .into_inner()
                .map_err(|e| Error::io(&path, e.into_error()))?;
            file.sync_all().map_err(|e| Error::io(&path, e))?;
            drop(file);

            tracing::info!(path = %path.display(), segments = dest.segments, "wrote file");
            written.push(WrittenFile {
                path,
                mode: dest.mode,
                segments: dest.segments,
            });
        }
        written.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(written)
    }
}

/// Lower-cased entity names contributed to by more than one engine.
fn tagged_names(segments: &[Segment]) -> BTreeSet<String> {
    let mut engines: BTreeMap<String, BTreeSet<Engine>> = BTreeMap::new();
    for s in segments {
        if let Some(engine) = s.engine {
            engines
                .entry(s.name.to_lowercase())
                .or_default()
                .insert(engine);
        }
    }
    engines
        .into_iter()
        .filter(|(_, e)| e.len() > 1)
        .map(|(name, _)| name)
        .collect()
}

/// External formatter run once over every written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostProcessor {
    program: String,
    args: Vec<String>,
}

impl PostProcessor {
    /// Command and leading arguments; `None` when `command` is empty.
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Run the formatter with `paths` appended to its arguments.
    ///
    /// A non-zero exit fails with the command's combined output.
    pub fn run(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        tracing::info!(program = %self.program, files = paths.len(), "post-processing");
        let output = Command::new(&self.program)
            .args(&self.args)
            .args(paths)
            .output()
            .map_err(|e| {
                Box::new(Error::PostProcess {
                    output: format!("failed to run {}: {e}", self.program),
                })
            })?;

        if output.status.success() {
            return Ok(());
        }
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(Box::new(Error::PostProcess { output: combined }))
    }
}
