//! nbsync CLI - keeps Markdown documents and Jupyter notebooks in sync

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nbsync::commands;
use nbsync::config::{self, Config, ConfigUpdate};
use nbsync::interface::Context;

#[derive(Parser)]
#[command(name = "nbsync")]
#[command(author, version, about = "Bidirectional Markdown and notebook sync", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Trace-level logging
    #[arg(long, global = true)]
    debug: bool,

    /// Markdown root (overrides config file)
    #[arg(long, global = true, visible_alias = "md-dir")]
    source_dir: Option<PathBuf>,

    /// Notebook root (overrides config file)
    #[arg(long, global = true, visible_alias = "ipynb-dir")]
    target_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync on startup, then watch both trees (default)
    Watch {
        /// Report the startup plan and exit
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Report stale pairs and missing counterparts without writing
    Check,

    /// Reconcile both trees once
    Sync {
        /// Dry run - show what would be done without doing it
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

impl Cli {
    fn log_filter(&self, config: Option<&Config>) -> EnvFilter {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
        let level = if self.debug {
            "trace"
        } else if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            config
                .and_then(|c| c.log_level.as_deref())
                .unwrap_or("info")
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    }

    fn overrides(&self) -> ConfigUpdate {
        ConfigUpdate {
            source_dir: self.source_dir.clone(),
            target_dir: self.target_dir.clone(),
            ..ConfigUpdate::new()
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Determine working directory
    let base_dir = cli
        .directory
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    // Configuration errors are fatal, but logging needs the configured level first
    let config = match cli.config {
        Some(ref path) => config::read_config_file(&base_dir.join(path)),
        None => config::read_config(&base_dir),
    }
    .map(|config| cli.overrides().merge_into(&config));

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter(config.as_ref().ok()))
        .with_target(false)
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error reading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let ctx = match Context::new(config, base_dir) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command.unwrap_or(Commands::Watch { dry_run: false }) {
        Commands::Watch { dry_run } => {
            commands::watch(&ctx, commands::WatchOptions { dry_run }).map(|()| true)
        }
        Commands::Check => commands::check(
            &ctx,
            commands::CheckOptions {
                verbose: cli.verbose,
            },
        ),
        Commands::Sync { dry_run } => {
            commands::sync(&ctx, commands::SyncOptions { dry_run }).map(|report| report.failed == 0)
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
