use anyhow::Result;
use mailzero_content::display_text;
use mailzero_core::{NormalizedMessage, SettingsStore};
use mailzero_mail::{Driver, MailDriver, OutgoingMessage, create_driver};
use serde_json::{Value as JsonValue, json};
use tracing::{debug, warn};

use super::{
    AppConfig, CliCommand, ListCmd, SendCmd, SettingsCmd, ShowCmd, ShowFormat, list_labels,
    list_query, output_error, output_ok,
};

pub(crate) async fn run_cli(command: CliCommand, config: &AppConfig) -> Result<()> {
    let settings = SettingsStore::new(config.settings);

    if let CliCommand::Settings(args) = command {
        return show_settings(&settings, args);
    }

    let driver = create_driver(&config.provider, config.driver_config())?;
    debug!(provider = %driver.provider(), "driver ready");

    match command {
        CliCommand::List(args) => list_threads(&driver, &settings, &args).await,
        CliCommand::Show(args) => show_thread(&driver, &args).await,
        CliCommand::Count => output_ok(json!(driver.count().await?)),
        CliCommand::Send(args) => send_message(&driver, config, args).await,
        CliCommand::Delete(args) => {
            driver.delete(&args.id).await?;
            output_ok(json!({ "deleted": args.id }))
        }
        CliCommand::Settings(_) => Ok(()),
    }
}

async fn list_threads(driver: &Driver, settings: &SettingsStore, args: &ListCmd) -> Result<()> {
    let current = settings.get();
    let max_results = args.max.unwrap_or(current.max_results);
    let query = list_query(args);
    let labels = list_labels(args, &current);
    debug!(folder = %args.folder, query = %query, ?labels, max_results, "listing threads");

    let page = driver
        .list(&args.folder, Some(query.as_str()), max_results, &labels)
        .await?;
    output_ok(json!(page))
}

async fn show_thread(driver: &Driver, args: &ShowCmd) -> Result<()> {
    let messages = driver.get(&args.id).await?;
    let out = messages
        .iter()
        .map(|message| render_message(message, args))
        .collect();
    output_ok(JsonValue::Array(out))
}

fn render_message(message: &NormalizedMessage, args: &ShowCmd) -> JsonValue {
    let summary = &message.summary;
    let mut value = json!({
        "id": summary.id,
        "sender": summary.sender,
        "subject": summary.subject,
        "receivedOn": summary.received_on,
        "unread": summary.unread,
        "tags": summary.tags,
        "totalReplies": message.total_replies,
    });
    let extra = match args.format {
        ShowFormat::Summary => None,
        ShowFormat::Html => Some(("processedHtml", json!(message.processed_html))),
        ShowFormat::Blob => Some(("blobUrl", json!(message.blob_url))),
        ShowFormat::Text => {
            let text = display_text(&message.body, args.width).unwrap_or_else(|err| {
                warn!(id = %summary.id, "failed to render body as text: {err}");
                String::new()
            });
            Some(("text", json!(text)))
        }
    };
    if let (Some((key, content)), JsonValue::Object(map)) = (extra, &mut value) {
        map.insert(key.to_string(), content);
    }
    value
}

async fn send_message(driver: &Driver, config: &AppConfig, args: SendCmd) -> Result<()> {
    let Some(from) = args.from.or_else(|| config.account.address.clone()) else {
        return output_error("No sender address (pass --from or set [account].address)");
    };
    let mut message = OutgoingMessage::compose(&from, &args.to, &args.subject, &args.body)?;
    if let Some(thread) = args.thread {
        message = message.in_thread(thread);
    }
    let sent = driver.create(message).await?;
    output_ok(json!(sent))
}

fn show_settings(settings: &SettingsStore, args: SettingsCmd) -> Result<()> {
    let effective = settings.update(|s| {
        if let Some(max) = args.max_results {
            s.max_results = max;
        }
        if let Some(layout) = args.layout {
            s.inbox_layout = layout;
        }
    })?;
    debug!(
        max_results = ?args.max_results,
        layout = ?args.layout,
        "settings overridden for this invocation"
    );
    output_ok(json!(effective))
}
