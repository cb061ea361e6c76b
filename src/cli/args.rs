//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Default definition file, relative to the current directory.
pub const DEFAULT_DEFINITION: &str = "stepwise.yml";

/// Stepwise - ordered, idempotent provisioning steps.
#[derive(Debug, Parser)]
#[command(name = "stepwise")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Arguments for the implicit `run` command
    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run every step of a definition (default if no command specified)
    Run(RunArgs),

    /// Check a definition without running anything
    Validate(DefinitionArgs),

    /// Show the execution order and parallel groups
    Plan(DefinitionArgs),

    /// Print the JSON Schema of the definition format
    Schema,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Step definition file
    #[arg(default_value = DEFAULT_DEFINITION)]
    pub definition: PathBuf,

    /// Keep running dependents of failed steps (`=false` overrides the file)
    #[arg(
        long,
        env = "STEPWISE_CONTINUE_ON_ERROR",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub continue_on_error: Option<bool>,

    /// Run independent steps concurrently (`=false` overrides the file)
    #[arg(
        long,
        env = "STEPWISE_PARALLEL",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub parallel: Option<bool>,

    /// Maximum number of concurrent steps (implies --parallel when above 1)
    #[arg(short, long, env = "STEPWISE_JOBS", value_name = "N")]
    pub jobs: Option<usize>,

    /// Probe every step without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            definition: PathBuf::from(DEFAULT_DEFINITION),
            continue_on_error: None,
            parallel: None,
            jobs: None,
            dry_run: false,
            json: false,
        }
    }
}

/// Arguments for commands that only read a definition.
#[derive(Debug, Clone, clap::Args)]
pub struct DefinitionArgs {
    /// Step definition file
    #[arg(default_value = DEFAULT_DEFINITION)]
    pub definition: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bool_flags_accept_explicit_values() {
        let cli = Cli::try_parse_from([
            "stepwise",
            "--parallel=false",
            "--continue-on-error",
            "provision.yml",
        ])
        .unwrap();
        assert_eq!(cli.run.parallel, Some(false));
        assert_eq!(cli.run.continue_on_error, Some(true));
        assert_eq!(cli.run.definition, PathBuf::from("provision.yml"));
    }

    #[test]
    fn bare_invocation_runs_default_definition() {
        let cli = Cli::try_parse_from(["stepwise"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.definition, PathBuf::from("stepwise.yml"));
    }

    #[test]
    fn positional_definition_without_subcommand() {
        let cli =
            Cli::try_parse_from(["stepwise", "provision.yml", "--continue-on-error"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.definition, PathBuf::from("provision.yml"));
        assert_eq!(cli.run.continue_on_error, Some(true));
    }

    #[test]
    fn run_subcommand_parses_flags() {
        let cli = Cli::try_parse_from([
            "stepwise",
            "run",
            "provision.yml",
            "--parallel",
            "--jobs",
            "8",
            "--dry-run",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.definition, PathBuf::from("provision.yml"));
                assert_eq!(args.parallel, Some(true));
                assert_eq!(args.jobs, Some(8));
                assert!(args.dry_run);
                assert!(args.json);
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["stepwise", "plan", "x.yml", "--quiet"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Some(Commands::Plan(_))));
    }

    #[test]
    fn completions_requires_shell() {
        assert!(Cli::try_parse_from(["stepwise", "completions"]).is_err());
        let cli = Cli::try_parse_from(["stepwise", "completions", "bash"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Completions(_))));
    }
}
