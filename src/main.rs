use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pydanticgen::{compile, CompileOptions};

#[derive(Parser)]
#[command(
    name = "pydanticgen",
    version,
    about = "Compile OpenAPI specifications into pydantic models and typed API clients"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every specification in a directory into an output tree.
    Compile {
        /// Directory containing *.json specification documents.
        spec_dir: PathBuf,
        /// Directory to write the generated tree into.
        output_dir: PathBuf,
        /// JSON file mapping document titles to schema rename tables.
        #[arg(long)]
        renames: Option<PathBuf>,
        /// JSON file listing models that should gain array wrappers.
        #[arg(long)]
        array_wrappers: Option<PathBuf>,
        /// Base URL written into client configs.
        #[arg(long)]
        base_url: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compile {
            spec_dir,
            output_dir,
            renames,
            array_wrappers,
            base_url,
        } => {
            let options = CompileOptions {
                spec_dir,
                output_dir,
                renames,
                array_wrappers,
                base_url,
            };
            match compile(&options) {
                Ok(report) => {
                    info!(
                        models = report.models,
                        clients = report.clients,
                        files = report.files,
                        warnings = report.warnings.len(),
                        "done"
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
