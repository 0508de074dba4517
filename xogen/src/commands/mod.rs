mod args;
mod completions;
mod engines;
mod generate;
mod inspect;

use clap::{ArgAction, Parser, Subcommand};
use completions::CompletionsCommand;
use engines::EnginesCommand;
use eyre::Result;
use generate::GenerateCommand;
use inspect::InspectCommand;
use xogen_codegen::Connection;

/// Exit with a rendered diagnostic on generator errors.
pub(crate) trait UnwrapOrExit<T> {
    fn unwrap_or_exit(self) -> T;
}

impl<T> UnwrapOrExit<T> for xogen_core::Result<T> {
    fn unwrap_or_exit(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{:?}", miette::Report::new(*e));
                std::process::exit(1);
            }
        }
    }
}

/// Open every connection string, in order.
pub(crate) fn connect_all(dsns: &[String]) -> xogen_core::Result<Vec<Connection>> {
    dsns.iter()
        .map(|dsn| {
            let (engine, db) = xogen_loader::connect(dsn)?;
            Ok(Connection::new(engine, db))
        })
        .collect()
}

#[derive(Parser)]
#[command(name = "xogen")]
#[command(version)]
#[command(about = "Generate Go database access code from a live schema")]
pub(crate) struct Cli {
    /// Increase log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Generate(cmd) => cmd.run(),
            Commands::Inspect(cmd) => cmd.run(),
            Commands::Engines(cmd) => cmd.run(),
            Commands::Completions(cmd) => cmd.run(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Introspect the databases and write Go code
    Generate(GenerateCommand),

    /// Print the loaded schema model as JSON
    Inspect(InspectCommand),

    /// List the supported database engines
    Engines(EnginesCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}
