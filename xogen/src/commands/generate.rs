use clap::Args;
use eyre::Result;
use xogen_codegen_go::Generator;
use xogen_loader::LoaderRegistry;

use super::{UnwrapOrExit, args::GenArgs, connect_all};
use crate::reports::{GenerateReport, PreviewReport, Report, TerminalOutput};

#[derive(Args)]
pub struct GenerateCommand {
    #[command(flatten)]
    pub args: GenArgs,

    /// Print the rendered segments instead of writing files
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateCommand {
    pub fn run(&self) -> Result<()> {
        let settings = self.args.to_config()?.resolve().unwrap_or_exit();
        let registry = LoaderRegistry::with_defaults();
        let connections = connect_all(&settings.dsns).unwrap_or_exit();
        let generator = Generator::new(&settings);

        if self.dry_run {
            let segments = generator.preview(&registry, connections).unwrap_or_exit();
            PreviewReport { segments }.render(&mut TerminalOutput::new());
            return Ok(());
        }

        let written = generator.generate(&registry, connections).unwrap_or_exit();
        let report = GenerateReport {
            out: settings.path.clone(),
            written,
            formatted: settings.formatter.is_some(),
        };
        report.render(&mut TerminalOutput::new());
        Ok(())
    }
}
