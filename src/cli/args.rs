//! Command-line argument parsing for bindgate
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use crate::budget::ComplexityClass;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// bindgate - Gate problem bindings through dependency order, budget and deployment
#[derive(Parser, Debug)]
#[command(name = "bindgate")]
#[command(version)]
#[command(about = "Resolve, budget-check and deploy dependency-ordered problem bindings", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except final result)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Manifest and root shared by the graph subcommands
#[derive(ClapArgs, Debug, Clone)]
pub struct ManifestArgs {
    /// Manifest describing problems and targets (TOML, or JSON by extension)
    #[arg(short, long, value_name = "FILE")]
    pub manifest: PathBuf,

    /// Root problem id
    #[arg(short, long, value_name = "ID")]
    pub root: String,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the dependency order for a root
    Order {
        #[command(flatten)]
        input: ManifestArgs,
    },

    /// Resolve and budget-check every node a root needs
    Plan {
        #[command(flatten)]
        input: ManifestArgs,

        /// Budget ceiling (overrides config)
        #[arg(long, value_name = "CLASS")]
        ceiling: Option<ComplexityClass>,
    },

    /// Plan, then deploy each binding in order
    Run {
        #[command(flatten)]
        input: ManifestArgs,

        /// Budget ceiling (overrides config)
        #[arg(long, value_name = "CLASS")]
        ceiling: Option<ComplexityClass>,

        /// Report success without running target commands
        #[arg(long)]
        dry_run: bool,

        /// Write the QA ledger to this file
        #[arg(long, value_name = "FILE")]
        ledger: Option<PathBuf>,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Check if should show the run summary
    pub fn show_summary(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show detailed events
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }

    /// Tracing filter for this level, or `fallback` at normal verbosity
    pub fn tracing_filter<'a>(&self, fallback: &'a str) -> &'a str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => fallback,
            Verbosity::Verbose => "bindgate=debug",
            Verbosity::VeryVerbose => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["bindgate", "-q", "config"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["bindgate", "config"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["bindgate", "-v", "config"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["bindgate", "-vv", "config"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_run_flags() {
        let args = parse(&[
            "bindgate", "run", "-m", "graph.toml", "-r", "c", "--ceiling", "linear", "--dry-run",
            "--ledger", "qa.json",
        ]);
        match args.command {
            Commands::Run { input, ceiling, dry_run, ledger } => {
                assert_eq!(input.root, "c");
                assert_eq!(input.manifest, PathBuf::from("graph.toml"));
                assert_eq!(ceiling, Some(ComplexityClass::Linear));
                assert!(dry_run);
                assert_eq!(ledger, Some(PathBuf::from("qa.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_ceiling_rejected() {
        let result = Args::try_parse_from(["bindgate", "plan", "-m", "g.toml", "-r", "c", "--ceiling", "cubic"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_order_requires_root() {
        assert!(Args::try_parse_from(["bindgate", "order", "-m", "g.toml"]).is_err());
    }

    #[test]
    fn test_verbosity_methods() {
        assert!(!Verbosity::Quiet.show_summary());
        assert!(Verbosity::Normal.show_summary());

        assert!(!Verbosity::Normal.show_events());
        assert!(Verbosity::Verbose.show_events());

        assert_eq!(Verbosity::Normal.tracing_filter("info"), "info");
        assert_eq!(Verbosity::Quiet.tracing_filter("info"), "error");
    }
}
