use anyhow::Result;
use clap::Parser;
use portsweep::cli::{self, Cli};
use portsweep::output;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(args: &Cli) -> Result<()> {
    cli::execute(args).await?;
    Ok(())
}

/// Logs go to stderr so JSON and CSV on stdout stay parseable.
fn init_logging(verbose: bool) {
    let default = if verbose { "portsweep=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
