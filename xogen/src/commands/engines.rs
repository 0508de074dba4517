use clap::Args;
use eyre::Result;
use xogen_core::Engine;
use xogen_loader::LoaderRegistry;

use crate::reports::{EngineInfo, EnginesReport, Report, TerminalOutput};

#[derive(Args)]
pub struct EnginesCommand {}

impl EnginesCommand {
    pub fn run(&self) -> Result<()> {
        report(&LoaderRegistry::with_defaults()).render(&mut TerminalOutput::new());
        Ok(())
    }
}

fn report(registry: &LoaderRegistry) -> EnginesReport {
    let engines = registry
        .engines()
        .map(|engine| EngineInfo {
            driver: engine.as_str(),
            file_tag: engine.file_tag(),
            schemes: schemes(engine),
            connectable: engine == Engine::Postgres,
        })
        .collect();
    EnginesReport { engines }
}

/// Connection string schemes selecting `engine`.
fn schemes(engine: Engine) -> &'static [&'static str] {
    match engine {
        Engine::Postgres => &["postgres", "postgresql", "pgsql", "pg"],
        Engine::Oracle => &["oracle", "godror", "or", "ora", "oci8"],
    }
}
