#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cmd::Context;
use cmd::diff::DiffStatus;
use output::OutputMode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "fieldsync: keep ticket field values in line with configuration",
    long_about = None
)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Field config file [default: .fieldsync/config.toml].
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Field store database. Overrides `FIELDSYNC_DB` and `[store] path`.
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Create the field store",
        long_about = "Create the field store, write the stock field values into it, and add a config template.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    fieldsync init\n\n    # Start from an empty store\n    fieldsync init --empty"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        about = "Set field values from config",
        long_about = "Remove, add, and reorder stored field values so they match the configured lists.",
        after_help = "EXAMPLES:\n    # Apply every configured field\n    fieldsync apply\n\n    # Only priorities, with a machine-readable report\n    fieldsync apply --field priority --json"
    )]
    Apply(cmd::apply::ApplyArgs),

    #[command(
        about = "Preview changes without applying them",
        long_about = "Compute the report `apply` would produce without touching the store.",
        after_help = "EXAMPLES:\n    # Show pending changes\n    fieldsync diff\n\n    # Fail in CI when the store drifted\n    fieldsync diff --exit-code"
    )]
    Diff(cmd::diff::DiffArgs),

    #[command(
        about = "List stored values of a field",
        long_about = "List the values currently stored for one field, in display order.",
        after_help = "EXAMPLES:\n    # Show priorities\n    fieldsync list priority\n\n    # Components with owners as JSON\n    fieldsync list component --json"
    )]
    List(cmd::list::ListArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("FIELDSYNC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "fieldsync=debug,fieldsync_core=debug,info"
        } else {
            "fieldsync=info,fieldsync_core=info,warn"
        })
    });

    let format = env::var("FIELDSYNC_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli, output: OutputMode) -> anyhow::Result<ExitCode> {
    let project_root = env::current_dir()?;
    let ctx = Context::resolve(
        &project_root,
        cli.config.as_deref(),
        cli.db.as_deref(),
        output,
        cli.quiet,
    )?;
    debug!(
        config = %ctx.config_path.display(),
        store = %ctx.store_path.display(),
        "paths resolved"
    );

    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, &ctx)?,
        Commands::Apply(args) => cmd::apply::run_apply(&args, &ctx)?,
        Commands::Diff(args) => {
            if cmd::diff::run_diff(&args, &ctx)? == DiffStatus::Pending {
                return Ok(ExitCode::from(2));
            }
        }
        Commands::List(args) => cmd::list::run_list(&args, &ctx)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = output::resolve_output_mode(cli.json);

    match run(cli, output) {
        Ok(code) => code,
        Err(error) => {
            output::render_failure(output, &error);
            ExitCode::FAILURE
        }
    }
}
