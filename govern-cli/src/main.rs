//! govern - API compatibility checker.
//!
//! Compares exported declarations of two versions of a package model and
//! classifies the change as major, minor or patch.

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod model;
mod output;

use commands::*;
use config::{FailOn, GovernConfig};
use output::{OutputConfig, OutputFormat};

/// Semantic-versioning checks for package APIs.
#[derive(Parser)]
#[command(name = "govern")]
#[command(author, version)]
#[command(about = "Classify API changes between package versions as major, minor or patch")]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  govern compare v1.json v2.json              Classify one change
  govern compare old/ new/ --current-version 1.4.0
  govern explain v1.json v2.json              One-line reason
  govern history v1.json v2.json v3.json      Classify every step
  govern check v2.json                        Validate a model")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Single-line JSON output
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two versions of a package
    #[command(visible_alias = "c")]
    Compare {
        /// Old model: JSON file or directory of JSON files
        old: String,

        /// New model: JSON file or directory of JSON files
        new: String,

        /// Version of the old model, to suggest the next one
        #[arg(long)]
        current_version: Option<String>,

        /// Exit with status 1 at or above this level (overrides config)
        #[arg(long, value_enum)]
        fail_on: Option<FailOn>,

        /// Compare even when the package names differ
        #[arg(long)]
        ignore_package_name: bool,
    },

    /// Explain the classification in one line
    #[command(visible_alias = "why")]
    Explain {
        old: String,
        new: String,

        /// Compare even when the package names differ
        #[arg(long)]
        ignore_package_name: bool,
    },

    /// Classify each step across a sequence of versions
    History {
        /// Models in release order
        #[arg(required = true, num_args = 2..)]
        versions: Vec<String>,

        /// Version of the first model, to number the following ones
        #[arg(long)]
        start_version: Option<String>,

        /// Exit with status 1 when any step reaches this level
        #[arg(long, value_enum)]
        fail_on: Option<FailOn>,
    },

    /// Validate a model and report symbol counts
    Check {
        /// JSON file or directory of JSON files
        model: String,
    },
}

/// Setup logging based on verbosity flags
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

/// Exit with status 1 when `tripped`; output has already been printed.
fn gate(tripped: bool) {
    if tripped {
        std::process::exit(1);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Load configuration from .governrc.toml
    let config = GovernConfig::load(std::path::Path::new("."));

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    let color_override = if cli.no_color {
        Some(false)
    } else {
        config.use_color()
    };
    let mut output = OutputConfig::auto_detect_with_color_override(format, color_override);
    if cli.compact {
        output = output.compact();
    }
    colored::control::set_override(output.use_colors());

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let mut options = config.compare_options();

    match command {
        Commands::Compare {
            old,
            new,
            current_version,
            fail_on,
            ignore_package_name,
        } => {
            if ignore_package_name {
                options.check_package_name = false;
            }
            let fail_on = fail_on.unwrap_or(config.fail_on());
            let classification =
                compare::run(&old, &new, current_version.as_deref(), &options, &output)?;
            gate(fail_on.trips(classification));
            Ok(())
        }
        Commands::Explain {
            old,
            new,
            ignore_package_name,
        } => {
            if ignore_package_name {
                options.check_package_name = false;
            }
            explain::run(&old, &new, &options, &output)
        }
        Commands::History {
            versions,
            start_version,
            fail_on,
        } => {
            let fail_on = fail_on.unwrap_or(config.fail_on());
            let overall = history::run(&versions, start_version.as_deref(), &options, &output)?;
            gate(fail_on.trips(overall));
            Ok(())
        }
        Commands::Check { model } => {
            let valid = check::run(&model, &output)?;
            gate(!valid);
            Ok(())
        }
    }
}
