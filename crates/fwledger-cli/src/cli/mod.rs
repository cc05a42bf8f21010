//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = commands::Context {
        config_path: cli.config,
        output_format: cli.output.unwrap_or(OutputFormat::Pretty),
        no_color: cli.no_color,
    };

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(ctx, args).await,
        Commands::EnrollAdmin => commands::enroll::admin(ctx).await,
        Commands::EnrollNode(args) => commands::enroll::node(ctx, args).await,
        Commands::Identities => commands::enroll::list(ctx).await,
        Commands::Upload(args) => commands::upload::execute(ctx, args).await,
        Commands::Update(args) => commands::update::execute(ctx, args).await,
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
