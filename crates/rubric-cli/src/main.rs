//! Rubric CLI
//!
//! Command-line interface for the rubric Ruby linter

mod commands;
mod discovery;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use rubric_core::init_tracing;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::commands::{EXIT_ERROR, LintOptions};

#[derive(Parser)]
#[command(name = "rubric")]
#[command(about = "rubric: a small, fast linter for Ruby")]
#[command(version = rubric_core::VERSION)]
#[command(
    long_about = "rubric checks Ruby sources for suspicious constructs and can correct\n\
some of them automatically.\n\
\n\
Examples:\n  \
rubric lint                    # Lint current directory\n  \
rubric lint --fix lib/         # Lint and fix files in lib/\n  \
rubric lint --dry-run app.rb   # Show the fixes as a diff\n  \
rubric rules                   # List all available rules"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.rubric.toml/.rubric.json)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of threads to use for parallel processing
    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint Ruby files and optionally correct them
    #[command(alias = "check")]
    Lint {
        /// Files, directories or glob patterns to lint
        #[arg(help = "Files or directories to process (default: current directory)")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(
            short,
            long,
            default_value = "human",
            help = "Output format for diagnostics"
        )]
        format: OutputFormat,

        /// Apply corrections and write them back
        #[arg(long, help = "Apply safe corrections to the files")]
        fix: bool,

        /// Show corrections without applying them
        #[arg(
            long,
            help = "Show proposed corrections as a diff without writing files",
            conflicts_with = "fix"
        )]
        dry_run: bool,
    },

    /// List the available rules
    Rules {
        /// Output format
        #[arg(short, long, default_value = "human", help = "Output format for the rule list")]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// JSON format for programmatic consumption
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let use_colors = !cli.no_color && std::env::var_os("NO_COLOR").is_none();
    if !use_colors {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose);

    if let Some(threads) = cli.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        eprintln!("error: failed to set thread pool size: {e}");
        return ExitCode::from(EXIT_ERROR);
    }

    let result = match cli.command {
        Commands::Lint {
            paths,
            format,
            fix,
            dry_run,
        } => {
            let paths = if paths.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                paths
            };
            commands::lint_command(LintOptions {
                paths,
                format,
                fix,
                dry_run,
                config_path: cli.config,
                colorize_diff: use_colors && std::io::stdout().is_terminal(),
            })
        }
        Commands::Rules { format } => commands::rules_command(format, cli.config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::debug!("rubric failed: {e:?}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
