//! Vigil command-line interface.
//!
//! Decides access requests against a JSON policy snapshot and checks policy
//! files before they are deployed.
//!
//! # Quick Start
//!
//! ```bash
//! # Check a policy file for mistakes
//! vigil policy validate policies.json
//!
//! # Decide a request (exit code 0 = allow, 2 = deny)
//! vigil check request.json --policies policies.json
//! ```

mod commands;
mod style;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vigil_config::{LogFormat, VigilConfig};

use commands::config::ShowFormat;

/// Vigil - attribute-based access control decisions.
#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory holding vigil.toml.
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Read configuration from this file only, skipping the layered sources.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Decide an access request against a policy snapshot.
    Check {
        /// JSON file holding the access request.
        request: PathBuf,

        /// JSON policy snapshot (defaults to store.policy_file).
        #[arg(short, long)]
        policies: Option<PathBuf>,
    },

    /// Policy file commands.
    #[command(subcommand)]
    Policy(PolicyCommands),

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum PolicyCommands {
    /// Validate a policy object or an array of policies.
    Validate {
        /// JSON file to validate.
        file: PathBuf,
    },

    /// List stored policies one page at a time.
    List {
        /// JSON policy snapshot (defaults to store.policy_file).
        #[arg(short, long)]
        policies: Option<PathBuf>,

        /// Page number, starting at zero.
        #[arg(long, default_value = "0")]
        page: usize,

        /// Policies per page (defaults to store.page_size).
        #[arg(long)]
        page_size: Option<usize>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration.
    Show {
        /// Output format.
        #[arg(short, long, value_enum, default_value = "text")]
        format: ShowFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color || std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal()
    {
        style::set_no_color(true);
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            style::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    if matches!(cli.command, Commands::Version) {
        commands::version::run();
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli)?;
    init_logging(&config);

    match cli.command {
        Commands::Version => Ok(ExitCode::SUCCESS),
        Commands::Check { request, policies } => {
            commands::check::run(&config, &request, policies.as_deref())
        }
        Commands::Policy(PolicyCommands::Validate { file }) => {
            commands::policy::validate(&file)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Policy(PolicyCommands::List {
            policies,
            page,
            page_size,
        }) => {
            commands::policy::list(&config, policies.as_deref(), page, page_size)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(ConfigCommands::Show { format }) => {
            commands::config::show(&config, format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> Result<VigilConfig> {
    match &cli.config {
        Some(path) => VigilConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => VigilConfig::load_from_dir(&cli.project).context("Failed to load configuration"),
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(config: &VigilConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!style::no_color());

    match config.logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
