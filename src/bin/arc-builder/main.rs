//! arc-builder CLI - builds deployable bundles of ARC web components

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

mod cli;
mod commands;

use arc_builder::util::GlobalContext;
use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => {
            let ctx = context(cli.verbose, cli.no_color)?;
            init_logging(cli.verbose, Some(&ctx.debug_log_path()))?;
            commands::build::execute(args, &ctx)
        }
        Commands::Check(args) => {
            let ctx = context(cli.verbose, cli.no_color)?;
            init_logging(cli.verbose, None)?;
            commands::check::execute(args, &ctx)
        }
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

fn context(verbose: bool, no_color: bool) -> Result<GlobalContext> {
    let mut ctx = GlobalContext::new().context("failed to create global context")?;
    ctx.set_verbose(verbose);
    ctx.set_color(!no_color);
    Ok(ctx)
}

/// Log to stderr, and at debug level to `debug_log` when given.
fn init_logging(verbose: bool, debug_log: Option<&Path>) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("arc_builder=debug")
    } else {
        EnvFilter::new("arc_builder=info")
    };

    let stderr = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    let file = match debug_log {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create debug log: {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::new("arc_builder=debug")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr)
        .with(file)
        .init();

    Ok(())
}
