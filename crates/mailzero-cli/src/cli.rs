use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use mailzero_core::{Category, InboxLayout};

#[path = "cli_command_handlers.rs"]
mod cli_command_handlers;
#[path = "cli_config.rs"]
mod cli_config;
#[path = "cli_runtime_helpers.rs"]
mod cli_runtime_helpers;

pub(crate) use cli_command_handlers::run_cli;
pub(crate) use cli_config::{AppConfig, load_config};
pub(crate) use cli_runtime_helpers::{
    list_labels, list_query, output_error, output_ok, resolve_cli_command,
};

#[derive(Parser, Debug)]
#[command(name = "mailzero", version, about = "Gmail threads as sanitized, normalized JSON")]
pub(crate) struct Cli {
    /// Run a whole command line given as one string.
    #[arg(short = 'c', long = "cmd")]
    cmd: Option<String>,
    #[command(subcommand)]
    pub(crate) command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CliCommand {
    List(ListCmd),
    Show(ShowCmd),
    Count,
    Send(SendCmd),
    Delete(DeleteCmd),
    Settings(SettingsCmd),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ListCmd {
    #[arg(long, default_value = "inbox")]
    folder: String,
    #[arg(long)]
    query: Option<String>,
    /// Page size; defaults to the `max_results` setting.
    #[arg(long)]
    max: Option<u32>,
    #[arg(long)]
    label: Vec<String>,
    #[arg(long)]
    from: Option<String>,
    #[arg(long)]
    to: Option<String>,
    #[arg(long)]
    subject: Option<String>,
    /// Received after this date (YYYY-MM-DD).
    #[arg(long)]
    after: Option<NaiveDate>,
    #[arg(long)]
    before: Option<NaiveDate>,
    #[arg(long)]
    category: Option<Category>,
    #[arg(long)]
    unread: bool,
    #[arg(long)]
    starred: bool,
    #[arg(long = "has-attachment")]
    has_attachment: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ShowFormat {
    #[default]
    Summary,
    Html,
    Blob,
    Text,
}

#[derive(Args, Debug)]
pub(crate) struct ShowCmd {
    id: String,
    #[arg(long, value_enum, default_value_t = ShowFormat::Summary)]
    format: ShowFormat,
    #[arg(long, default_value_t = 80)]
    width: usize,
}

#[derive(Args, Debug)]
pub(crate) struct SendCmd {
    /// Overrides `[account].address`.
    #[arg(long)]
    from: Option<String>,
    #[arg(long)]
    to: String,
    #[arg(long)]
    subject: String,
    #[arg(long)]
    body: String,
    #[arg(long)]
    thread: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct DeleteCmd {
    id: String,
}

/// Overrides apply to this invocation only.
#[derive(Args, Debug)]
pub(crate) struct SettingsCmd {
    #[arg(long = "max-results")]
    max_results: Option<u32>,
    #[arg(long)]
    layout: Option<InboxLayout>,
}
