use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, load_config, output_error, resolve_cli_command, run_cli};

const CLI_SCHEMA_VERSION: &str = "mailzero.cli.v1";
const LOG_ENV: &str = "MAILZERO_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let command = match resolve_cli_command(cli) {
        Ok(Some(command)) => command,
        Ok(None) => return output_error("No command provided"),
        Err(err) => return output_error(&err.to_string()),
    };
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => return output_error(&format!("{:#}", err)),
    };
    let rt = tokio::runtime::Runtime::new()?;
    if let Err(err) = rt.block_on(run_cli(command, &config)) {
        return output_error(&err.to_string());
    }
    Ok(())
}
