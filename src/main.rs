//! Loreforge CLI binary entry point.

use clap::Parser;
use loreforge::cli::{exit_code, run, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    match run(cli).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(exit_code(&e));
        }
    }
}

fn init_logging(level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()?;

    Ok(())
}
