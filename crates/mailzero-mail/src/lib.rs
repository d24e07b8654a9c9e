//! Mail provider integration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE as BASE64_URL_SAFE;
use lettre::message::{Mailbox, Message, header::ContentType};
use serde::{Deserialize, Serialize};

use mailzero_core::{FolderCount, NormalizedMessage, ThreadPage};

mod gmail;

pub use gmail::{
    GMAIL_API_BASE, GmailDriver, GoogleAuth, OAuthClient, TOKEN_ENDPOINT, refresh_access_token,
};

pub const DEFAULT_MAX_RESULTS: u32 = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Folders whose unread estimate `count` reports, in output order.
pub const COUNTED_FOLDERS: [&str; 2] = ["inbox", "spam"];

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("provider not supported: {0}")]
    UnsupportedProvider(String),

    #[error("invalid id: {0:?}")]
    InvalidId(String),

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("invalid outgoing message: {0}")]
    Compose(String),
}

pub type Result<T, E = MailError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Google => "google",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "google" => Ok(Provider::Google),
            other => Err(MailError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub auth: Credentials,
    /// Needed only to refresh tokens.
    pub oauth_client: Option<OAuthClient>,
    pub timeout: Duration,
    /// Overrides the provider API root (tests, proxies).
    pub base_url: Option<String>,
}

impl DriverConfig {
    pub fn new(auth: Credentials) -> Self {
        Self {
            auth,
            oauth_client: None,
            timeout: DEFAULT_TIMEOUT,
            base_url: None,
        }
    }
}

/// A raw RFC 5322 message ready for the provider's send endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl OutgoingMessage {
    pub fn from_rfc822(raw: &[u8]) -> Self {
        Self {
            raw: BASE64_URL_SAFE.encode(raw),
            thread_id: None,
        }
    }

    /// Plain-text message; `to` is a comma separated address list.
    pub fn compose(from: &str, to: &str, subject: &str, body: &str) -> Result<Self> {
        let from = parse_mailbox(from)?;
        let mut builder = Message::builder().from(from).subject(subject);
        let mut recipients = 0usize;
        for addr in to.split(',').map(str::trim).filter(|a| !a.is_empty()) {
            builder = builder.to(parse_mailbox(addr)?);
            recipients += 1;
        }
        if recipients == 0 {
            return Err(MailError::Compose("no recipients".to_string()));
        }
        let message = builder
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailError::Compose(e.to_string()))?;
        Ok(Self::from_rfc822(&message.formatted()))
    }

    pub fn in_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

fn parse_mailbox(raw: &str) -> Result<Mailbox> {
    raw.trim()
        .parse::<Mailbox>()
        .map_err(|e| MailError::Compose(format!("invalid address {:?}: {}", raw, e)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<String>,
}

/// Folder and query after provider-specific folder rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSearch {
    pub folder: Option<String>,
    pub query: String,
}

impl NormalizedSearch {
    /// `extra` followed by the folder label, if any.
    pub fn label_ids(&self, extra: &[String]) -> Vec<String> {
        let mut labels = extra.to_vec();
        if let Some(folder) = self.folder.as_deref().filter(|f| !f.is_empty()) {
            labels.push(folder.to_ascii_uppercase());
        }
        labels
    }

    pub fn query_param(&self) -> Option<&str> {
        if self.query.trim().is_empty() {
            None
        } else {
            Some(&self.query)
        }
    }
}

/// Trash is not a label filter: it becomes an `in:trash` query term.
pub fn normalize_search(folder: &str, query: &str) -> NormalizedSearch {
    if folder == "trash" {
        return NormalizedSearch {
            folder: None,
            query: format!("in:trash {}", query),
        };
    }
    NormalizedSearch {
        folder: Some(folder.to_string()),
        query: query.to_string(),
    }
}

#[async_trait]
pub trait MailDriver: Send + Sync {
    async fn list(
        &self,
        folder: &str,
        query: Option<&str>,
        max_results: u32,
        label_ids: &[String],
    ) -> Result<ThreadPage>;
    async fn get(&self, id: &str) -> Result<Vec<NormalizedMessage>>;
    async fn create(&self, message: OutgoingMessage) -> Result<SentMessage>;
    async fn delete(&self, id: &str) -> Result<()>;
    async fn count(&self) -> Result<Vec<FolderCount>>;
}

pub enum Driver {
    Google(GmailDriver),
}

impl Driver {
    pub fn provider(&self) -> Provider {
        match self {
            Driver::Google(_) => Provider::Google,
        }
    }
}

/// Resolves a provider name; unknown names fail before any network call.
pub fn create_driver(provider: &str, config: DriverConfig) -> Result<Driver> {
    match provider.parse::<Provider>()? {
        Provider::Google => Ok(Driver::Google(GmailDriver::new(config)?)),
    }
}

#[async_trait]
impl MailDriver for Driver {
    async fn list(
        &self,
        folder: &str,
        query: Option<&str>,
        max_results: u32,
        label_ids: &[String],
    ) -> Result<ThreadPage> {
        match self {
            Driver::Google(driver) => driver.list(folder, query, max_results, label_ids).await,
        }
    }

    async fn get(&self, id: &str) -> Result<Vec<NormalizedMessage>> {
        match self {
            Driver::Google(driver) => driver.get(id).await,
        }
    }

    async fn create(&self, message: OutgoingMessage) -> Result<SentMessage> {
        match self {
            Driver::Google(driver) => driver.create(message).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self {
            Driver::Google(driver) => driver.delete(id).await,
        }
    }

    async fn count(&self) -> Result<Vec<FolderCount>> {
        match self {
            Driver::Google(driver) => driver.count().await,
        }
    }
}

pub(crate) fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
        return Err(MailError::InvalidId(id.to_string()));
    }
    Ok(())
}
