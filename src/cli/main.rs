//! CLI binary entry point for car-listing-cli

#[cfg(feature = "cli")]
use car_listing_pipeline::cli::commands::config::handle_config;
#[cfg(feature = "cli")]
use car_listing_pipeline::cli::commands::inspect::handle_inspect;
#[cfg(feature = "cli")]
use car_listing_pipeline::cli::commands::run::{RunArgs, handle_run};
#[cfg(feature = "cli")]
use car_listing_pipeline::cli::commands::validate::handle_validate_config;
#[cfg(feature = "cli")]
use car_listing_pipeline::cli::logging::init_logging;
#[cfg(feature = "cli")]
use car_listing_pipeline::config::ReshapeStrategy;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "car-listing-cli")]
#[command(about = "Transform supplier car listings into the business schema")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Run the whole pipeline and write the workbook
    Run {
        /// Configuration file (defaults to car-pipeline.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Input JSONL file
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output workbook
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Reshape strategy (pivot or unstack)
        #[arg(short, long)]
        strategy: Option<ReshapeStrategy>,
        /// Skip configured columns missing from the data instead of failing
        #[arg(long)]
        no_strict: bool,
        /// Overwrite an existing workbook
        #[arg(short, long)]
        force: bool,
    },
    /// Print the schema summary of a JSONL file
    Inspect {
        /// Input JSONL file
        input: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print or write a sample configuration file
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Check a configuration file
    ValidateConfig {
        /// Configuration file
        file: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            input,
            output,
            strategy,
            no_strict,
            force,
        } => {
            let args = RunArgs {
                config,
                input,
                output,
                strategy,
                no_strict,
                force,
            };
            handle_run(&args).map(|_| ())
        }
        Commands::Inspect { input, json } => handle_inspect(&input, json).map(|_| ()),
        Commands::Config { output, force } => handle_config(output.as_deref(), force),
        Commands::ValidateConfig { file } => handle_validate_config(&file).map(|_| ()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
