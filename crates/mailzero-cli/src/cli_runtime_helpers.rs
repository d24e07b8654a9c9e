use anyhow::Result;
use clap::Parser;
use mailzero_core::{QuickFilter, SearchFilters, Settings};
use serde_json::{Value as JsonValue, json};

use super::{Cli, CliCommand, ListCmd};
use crate::CLI_SCHEMA_VERSION;

pub(crate) fn output_ok(value: JsonValue) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string(&json!({
            "schema": CLI_SCHEMA_VERSION,
            "ok": true,
            "result": value
        }))?
    );
    Ok(())
}

pub(crate) fn output_error(message: &str) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string(&json!({
            "schema": CLI_SCHEMA_VERSION,
            "ok": false,
            "error": message
        }))?
    );
    Ok(())
}

pub(crate) fn resolve_cli_command(cli: Cli) -> Result<Option<CliCommand>> {
    let Some(cmd) = cli.cmd else {
        return Ok(cli.command);
    };
    let parts = shell_words::split(&cmd).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    if parts.is_empty() {
        return Ok(None);
    }
    let mut args = Vec::with_capacity(parts.len() + 1);
    args.push("mailzero".to_string());
    args.extend(parts);
    let parsed = Cli::try_parse_from(args).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(parsed.command)
}

/// Provider query for `list`: free text and quick filters, then form fields.
pub(crate) fn list_query(args: &ListCmd) -> String {
    let mut free: Vec<&str> = args
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .into_iter()
        .collect();
    for (enabled, filter) in [
        (args.unread, QuickFilter::Unread),
        (args.starred, QuickFilter::Starred),
        (args.has_attachment, QuickFilter::HasAttachment),
    ] {
        if enabled {
            free.push(filter.query());
        }
    }
    let filters = SearchFilters {
        q: free.join(" "),
        from: args.from.clone().unwrap_or_default(),
        to: args.to.clone().unwrap_or_default(),
        subject: args.subject.clone().unwrap_or_default(),
        date_from: args.after,
        date_to: args.before,
        category: args.category,
        folder: args.folder.clone(),
    };
    filters.to_query()
}

/// Explicit labels win; otherwise the inbox is narrowed by the layout setting.
pub(crate) fn list_labels(args: &ListCmd, settings: &Settings) -> Vec<String> {
    if !args.label.is_empty() {
        return args.label.iter().map(|l| l.to_ascii_uppercase()).collect();
    }
    if !args.folder.eq_ignore_ascii_case("inbox") {
        return Vec::new();
    }
    settings
        .inbox_layout
        .label()
        .map(|label| vec![label.to_string()])
        .unwrap_or_default()
}
