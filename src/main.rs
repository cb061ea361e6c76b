//! Stepwise CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use stepwise::cli::{Cli, CommandDispatcher, Commands};
use stepwise::runner::{cancel_on_interrupt, CancellationToken};
use stepwise::shell::is_ci;
use stepwise::ui::{create_ui, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is WARN
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("stepwise=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stepwise=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("stepwise starting with args: {:?}", cli);

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);

    // JSON output must stay machine-readable.
    let json = match &cli.command {
        Some(Commands::Run(args)) => args.json,
        Some(Commands::Validate(args)) | Some(Commands::Plan(args)) => args.json,
        Some(Commands::Schema) | Some(Commands::Completions(_)) => false,
        None => cli.run.json,
    };
    let output_mode = if json { OutputMode::Silent } else { output_mode };

    let mut ui = create_ui(!is_ci(), output_mode);

    let cancel = CancellationToken::new();
    if let Err(e) = cancel_on_interrupt(cancel.clone()) {
        tracing::warn!("Ctrl-C will not cancel the run: {}", e);
    }

    match CommandDispatcher::with_cancel(cancel).dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
