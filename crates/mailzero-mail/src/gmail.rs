//! Gmail REST driver.
//!
//! Thread listings are fetched as metadata only and normalized into summary
//! shape; opening a thread fetches full payloads and runs every message
//! through the content pipeline.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::try_join_all;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use mailzero_content::{normalize_message, summarize};
use mailzero_core::{
    FolderCount, Header, MessageEnvelope, NormalizedMessage, Part, ThreadPage,
};

use crate::{
    COUNTED_FOLDERS, DriverConfig, MailDriver, MailError, OutgoingMessage, Result, SentMessage,
    normalize_search, validate_id,
};

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

const METADATA_HEADERS: [&str; 3] = ["From", "Subject", "Date"];

/// OAuth2 client registration used to refresh access tokens.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub token_endpoint: String,
}

impl OAuthClient {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
        }
    }

    /// Reads `GOOGLE_CLIENT_ID` and `GOOGLE_CLIENT_SECRET`; both must be set.
    pub fn from_env() -> Option<Self> {
        let id = std::env::var("GOOGLE_CLIENT_ID").ok().filter(|v| !v.is_empty())?;
        let secret = std::env::var("GOOGLE_CLIENT_SECRET")
            .ok()
            .filter(|v| !v.is_empty())?;
        Some(Self::new(id, secret))
    }
}

#[derive(Debug, Clone)]
pub struct GoogleAuth {
    pub access_token: String,
    pub refresh_token: String,
    /// `None` when the expiry is unknown; such tokens are used as-is.
    pub expires_at: Option<DateTime<Utc>>,
}

impl GoogleAuth {
    /// True when a refresh token exists and the access token is missing or
    /// within a minute of its known expiry.
    pub fn needs_refresh(&self) -> bool {
        if self.refresh_token.is_empty() {
            return false;
        }
        if self.access_token.is_empty() {
            return true;
        }
        match self.expires_at {
            Some(exp) => Utc::now() >= exp - ChronoDuration::seconds(60),
            None => false,
        }
    }

    /// Exchanges the refresh token for a new access token in place.
    pub async fn refresh(&mut self, client: &Client, oauth: &OAuthClient) -> Result<()> {
        *self = refresh_access_token(client, oauth, &self.refresh_token).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

pub async fn refresh_access_token(
    client: &Client,
    oauth: &OAuthClient,
    refresh_token: &str,
) -> Result<GoogleAuth> {
    debug!("refreshing Google access token");
    let resp = client
        .post(&oauth.token_endpoint)
        .form(&[
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await?;
    let status = resp.status();
    let body: TokenResponse = resp.json().await?;

    if !status.is_success() {
        let reason = body
            .error_description
            .or(body.error)
            .unwrap_or_else(|| format!("status {}", status));
        warn!("Google token refresh failed: {reason}");
        return Err(MailError::Auth(format!("token refresh failed: {}", reason)));
    }

    let access_token = body
        .access_token
        .ok_or_else(|| MailError::Auth("missing access_token in refresh response".into()))?;
    let expires_at = Utc::now() + ChronoDuration::seconds(body.expires_in.unwrap_or(3600));

    Ok(GoogleAuth {
        access_token,
        // Google only sometimes rotates the refresh token.
        refresh_token: body
            .refresh_token
            .unwrap_or_else(|| refresh_token.to_string()),
        expires_at: Some(expires_at),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadListResponse {
    #[serde(default)]
    threads: Vec<ThreadRef>,
    next_page_token: Option<String>,
    result_size_estimate: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ThreadRef {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    #[serde(default)]
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    result_size_estimate: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    label_ids: Vec<String>,
    payload: Option<WirePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<WireHeader>,
    body: Option<WireBody>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Deserialize)]
struct WireHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct WireBody {
    data: Option<String>,
}

impl From<WirePart> for Part {
    fn from(wire: WirePart) -> Self {
        if wire.parts.is_empty() {
            Part::Leaf {
                mime_type: wire.mime_type,
                data: wire.body.and_then(|b| b.data),
            }
        } else {
            Part::Branch {
                mime_type: wire.mime_type,
                children: wire.parts.into_iter().map(Part::from).collect(),
            }
        }
    }
}

impl WireMessage {
    fn into_envelope(self) -> MessageEnvelope {
        let payload = self.payload.unwrap_or_default();
        MessageEnvelope {
            id: self.id,
            snippet: self.snippet,
            label_ids: self.label_ids,
            headers: payload
                .headers
                .into_iter()
                .map(|h| Header::new(h.name, h.value))
                .collect(),
            body: payload.body.and_then(|b| b.data),
            parts: payload.parts.into_iter().map(Part::from).collect(),
        }
    }
}

pub struct GmailDriver {
    client: Client,
    base_url: String,
    auth: Mutex<GoogleAuth>,
    oauth_client: Option<OAuthClient>,
}

impl GmailDriver {
    pub fn new(config: DriverConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(GMAIL_API_BASE)
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            base_url,
            auth: Mutex::new(GoogleAuth {
                access_token: config.auth.access_token,
                refresh_token: config.auth.refresh_token,
                expires_at: None,
            }),
            oauth_client: config.oauth_client,
        })
    }

    /// Replaces the stored token state, e.g. with a known expiry.
    pub async fn set_auth(&self, auth: GoogleAuth) {
        *self.auth.lock().await = auth;
    }

    async fn access_token(&self) -> Result<String> {
        let mut auth = self.auth.lock().await;
        if auth.needs_refresh() {
            let oauth = self.oauth_client.as_ref().ok_or_else(|| {
                MailError::Auth(
                    "access token needs refresh but GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET are not set"
                        .into(),
                )
            })?;
            auth.refresh(&self.client, oauth).await?;
        }
        if auth.access_token.is_empty() {
            return Err(MailError::Auth("no access token configured".into()));
        }
        Ok(auth.access_token.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send_checked(request: RequestBuilder, token: &str) -> Result<reqwest::Response> {
        let resp = request.bearer_auth(token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder, token: &str) -> Result<T> {
        let resp = Self::send_checked(request, token).await?;
        Ok(resp.json().await?)
    }

    async fn thread_summary(&self, id: &str, token: &str) -> Result<Option<NormalizedMessage>> {
        validate_id(id)?;
        let mut params: Vec<(&str, &str)> = vec![("format", "metadata")];
        params.extend(METADATA_HEADERS.iter().map(|h| ("metadataHeaders", *h)));
        let request = self
            .client
            .get(self.url(&format!("threads/{}", id)))
            .query(&params);
        let thread: ThreadResponse = Self::fetch_json(request, token).await?;

        let total_replies = thread.messages.len();
        let Some(first) = thread.messages.into_iter().next() else {
            warn!("thread {id} has no messages, skipping");
            return Ok(None);
        };
        let summary = summarize(&first.into_envelope());
        Ok(Some(NormalizedMessage::metadata_only(summary, total_replies)))
    }

    async fn folder_count(&self, folder: &str, token: &str) -> Result<FolderCount> {
        let search = normalize_search(folder, "");
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(q) = search.query_param() {
            params.push(("q", q.to_string()));
        }
        for label in search.label_ids(&[]) {
            params.push(("labelIds", label));
        }
        let request = self.client.get(self.url("messages")).query(&params);
        let list: MessageListResponse = Self::fetch_json(request, token).await?;
        Ok(FolderCount {
            folder: folder.to_string(),
            result_size_estimate: list.result_size_estimate.unwrap_or(0),
        })
    }
}

#[async_trait::async_trait]
impl MailDriver for GmailDriver {
    async fn list(
        &self,
        folder: &str,
        query: Option<&str>,
        max_results: u32,
        label_ids: &[String],
    ) -> Result<ThreadPage> {
        let search = normalize_search(folder, query.unwrap_or(""));
        let token = self.access_token().await?;

        let mut params: Vec<(&str, String)> = vec![("maxResults", max_results.to_string())];
        if let Some(q) = search.query_param() {
            params.push(("q", q.to_string()));
        }
        for label in search.label_ids(label_ids) {
            params.push(("labelIds", label));
        }
        let request = self.client.get(self.url("threads")).query(&params);
        let listing: ThreadListResponse = Self::fetch_json(request, &token).await?;
        debug!(
            folder,
            threads = listing.threads.len(),
            "listed threads, fetching metadata"
        );

        let fetches = listing
            .threads
            .iter()
            .filter_map(|thread| thread.id.as_deref())
            .map(|id| self.thread_summary(id, &token));
        let threads = try_join_all(fetches).await?.into_iter().flatten().collect();

        Ok(ThreadPage {
            threads,
            next_page_token: listing.next_page_token,
            result_size_estimate: listing.result_size_estimate,
        })
    }

    async fn get(&self, id: &str) -> Result<Vec<NormalizedMessage>> {
        validate_id(id)?;
        let token = self.access_token().await?;
        let request = self
            .client
            .get(self.url(&format!("threads/{}", id)))
            .query(&[("format", "full")]);
        let thread: ThreadResponse = Self::fetch_json(request, &token).await?;

        let total_replies = thread.messages.len();
        let messages = thread
            .messages
            .into_iter()
            .map(|message| normalize_message(&message.into_envelope(), total_replies))
            .collect();
        Ok(messages)
    }

    async fn create(&self, message: OutgoingMessage) -> Result<SentMessage> {
        let token = self.access_token().await?;
        let request = self.client.post(self.url("messages/send")).json(&message);
        let sent: SentMessage = Self::fetch_json(request, &token).await?;
        debug!("sent Gmail message, id={}", sent.id);
        Ok(sent)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        validate_id(id)?;
        let token = self.access_token().await?;
        let request = self.client.delete(self.url(&format!("messages/{}", id)));
        Self::send_checked(request, &token).await?;
        debug!("deleted Gmail message, id={id}");
        Ok(())
    }

    async fn count(&self) -> Result<Vec<FolderCount>> {
        let token = self.access_token().await?;
        try_join_all(
            COUNTED_FOLDERS
                .iter()
                .map(|folder| self.folder_count(folder, &token)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use mailzero_content::encode_body;

    use super::{GmailDriver, GoogleAuth, OAuthClient};
    use crate::{Credentials, DriverConfig, MailDriver, MailError, OutgoingMessage};

    fn driver(server: &MockServer) -> GmailDriver {
        let mut config = DriverConfig::new(Credentials {
            access_token: "test-token".to_string(),
            refresh_token: String::new(),
        });
        config.base_url = Some(server.uri());
        GmailDriver::new(config).expect("client builds")
    }

    fn metadata_thread(id: &str, from: &str, labels: &[&str], replies: usize) -> serde_json::Value {
        let first = json!({
            "id": id,
            "snippet": "See you &amp; bye",
            "labelIds": labels,
            "payload": {
                "headers": [
                    {"name": "From", "value": from},
                    {"name": "Subject", "value": format!("Subject {id}")},
                    {"name": "Date", "value": "Wed, 3 Jan 2024 08:00:00 +0000"}
                ]
            }
        });
        let mut messages = vec![first];
        for n in 1..replies {
            messages.push(json!({"id": format!("{id}-{n}"), "payload": {"headers": []}}));
        }
        json!({"id": id, "messages": messages})
    }

    #[tokio::test]
    async fn list_fetches_metadata_and_keeps_listing_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/threads"))
            .and(header("Authorization", "Bearer test-token"))
            .and(query_param("labelIds", "INBOX"))
            .and(query_param("maxResults", "25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "threads": [{"id": "t1"}, {"id": "t2"}, {}],
                "nextPageToken": "page-2",
                "resultSizeEstimate": 2
            })))
            .expect(1)
            .mount(&server)
            .await;
        // t1 answers slowly so completion order differs from listing order.
        Mock::given(method("GET"))
            .and(path("/threads/t1"))
            .and(query_param("format", "metadata"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(metadata_thread(
                        "t1",
                        "\"Jane Doe\" <jane@example.com>",
                        &["UNREAD", "INBOX"],
                        3,
                    ))
                    .set_delay(std::time::Duration::from_millis(100)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/threads/t2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(metadata_thread(
                "t2",
                "bob@example.com",
                &["INBOX"],
                1,
            )))
            .mount(&server)
            .await;

        let page = driver(&server)
            .list("inbox", None, 25, &[])
            .await
            .expect("list succeeds");

        assert_eq!(page.next_page_token.as_deref(), Some("page-2"));
        assert_eq!(page.result_size_estimate, Some(2));
        assert_eq!(page.threads.len(), 2);

        let first = &page.threads[0];
        assert_eq!(first.summary.id, "t1");
        assert_eq!(first.summary.title, "See you & bye");
        assert_eq!(first.summary.sender.name, "Jane Doe");
        assert_eq!(first.summary.sender.email, "<jane@example.com");
        assert!(first.summary.unread);
        assert_eq!(first.total_replies, 3);
        assert!(first.body.is_empty());
        assert!(first.blob_url.is_empty());

        let second = &page.threads[1];
        assert_eq!(second.summary.id, "t2");
        assert_eq!(second.summary.sender.email, "<bob@example.com");
        assert!(!second.summary.unread);
        assert_eq!(second.total_replies, 1);
    }

    #[tokio::test]
    async fn list_trash_uses_query_modifier() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads"))
            .and(query_param("q", "in:trash invoice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let page = driver(&server)
            .list("trash", Some("invoice"), 10, &[])
            .await
            .expect("list succeeds");
        assert!(page.threads.is_empty());
    }

    #[tokio::test]
    async fn get_normalizes_every_message_in_thread() {
        let server = MockServer::start().await;
        let html = encode_body("<div><p onclick=\"x()\">Hi ✓</p><script>bad()</script></div>");
        Mock::given(method("GET"))
            .and(path("/threads/t9"))
            .and(query_param("format", "full"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "t9",
                "messages": [
                    {
                        "id": "m1",
                        "snippet": "Hi",
                        "labelIds": ["INBOX"],
                        "payload": {
                            "mimeType": "multipart/mixed",
                            "headers": [{"name": "From", "value": "Jane <jane@example.com>"}],
                            "parts": [
                                {"mimeType": "multipart/alternative", "parts": [
                                    {"mimeType": "text/plain", "body": {"data": encode_body("Hi")}},
                                    {"mimeType": "text/html", "body": {"data": html}}
                                ]}
                            ]
                        }
                    },
                    {
                        "id": "m2",
                        "labelIds": [],
                        "payload": {"mimeType": "text/plain", "headers": [], "body": {"size": 0}}
                    }
                ]
            })))
            .mount(&server)
            .await;

        let messages = driver(&server).get("t9").await.expect("get succeeds");
        assert_eq!(messages.len(), 2);

        let first = &messages[0];
        assert_eq!(first.summary.subject, "Failed");
        assert_eq!(first.total_replies, 2);
        assert_eq!(first.body, html);
        assert!(first.processed_html.contains("<p>Hi ✓</p>"));
        assert!(!first.processed_html.contains("onclick"));
        assert!(!first.processed_html.contains("bad()"));
        assert!(first.blob_url.starts_with("data:text/html;charset=utf-8,"));

        let second = &messages[1];
        assert!(second.body.is_empty());
        assert!(second.processed_html.is_empty());
        assert!(second.blob_url.is_empty());
    }

    #[tokio::test]
    async fn provider_errors_propagate_unmodified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Requested entity was not found."))
            .mount(&server)
            .await;

        let err = driver(&server).get("gone").await.unwrap_err();
        match err {
            MailError::Api { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn failed_thread_fetch_fails_the_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "threads": [{"id": "ok"}, {"id": "broken"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/threads/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(metadata_thread(
                "ok",
                "a@example.com",
                &[],
                1,
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/threads/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = driver(&server)
            .list("inbox", None, 10, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn invalid_ids_fail_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let driver = driver(&server);
        assert!(matches!(driver.delete("../x").await, Err(MailError::InvalidId(_))));
        assert!(matches!(driver.get("").await, Err(MailError::InvalidId(_))));
    }

    #[tokio::test]
    async fn delete_and_send_hit_message_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/messages/m1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/messages/send"))
            .and(body_string_contains("\"raw\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "sent-1",
                "threadId": "t-1",
                "labelIds": ["SENT"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let driver = driver(&server);
        driver.delete("m1").await.expect("delete succeeds");

        let message = OutgoingMessage::compose("me@example.com", "you@example.com", "Hi", "Body")
            .expect("valid message");
        let sent = driver.create(message).await.expect("send succeeds");
        assert_eq!(sent.id, "sent-1");
        assert_eq!(sent.thread_id.as_deref(), Some("t-1"));
        assert_eq!(sent.label_ids, vec!["SENT"]);
    }

    #[tokio::test]
    async fn count_reports_inbox_then_spam() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/messages"))
            .and(query_param("labelIds", "INBOX"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"resultSizeEstimate": 12}))
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/messages"))
            .and(query_param("labelIds", "SPAM"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resultSizeEstimate": 3})))
            .mount(&server)
            .await;

        let counts = driver(&server).count().await.expect("count succeeds");
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].folder, "inbox");
        assert_eq!(counts[0].result_size_estimate, 12);
        assert_eq!(counts[1].folder, "spam");
        assert_eq!(counts[1].result_size_estimate, 3);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_before_the_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh-token",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/messages"))
            .and(header("Authorization", "Bearer fresh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resultSizeEstimate": 1})))
            .expect(2)
            .mount(&server)
            .await;

        let mut oauth = OAuthClient::new("client-id", "client-secret");
        oauth.token_endpoint = format!("{}/token", server.uri());
        let mut config = DriverConfig::new(Credentials {
            access_token: "stale-token".to_string(),
            refresh_token: "refresh-1".to_string(),
        });
        config.base_url = Some(server.uri());
        config.oauth_client = Some(oauth);
        let driver = GmailDriver::new(config).expect("client builds");
        driver
            .set_auth(GoogleAuth {
                access_token: "stale-token".to_string(),
                refresh_token: "refresh-1".to_string(),
                expires_at: Some(Utc::now() - ChronoDuration::minutes(5)),
            })
            .await;

        let counts = driver.count().await.expect("count succeeds");
        assert_eq!(counts.len(), 2);
    }

    #[tokio::test]
    async fn refresh_without_client_credentials_is_an_auth_error() {
        let server = MockServer::start().await;
        let mut config = DriverConfig::new(Credentials {
            access_token: String::new(),
            refresh_token: "refresh-1".to_string(),
        });
        config.base_url = Some(server.uri());
        let driver = GmailDriver::new(config).expect("client builds");
        assert!(matches!(driver.count().await, Err(MailError::Auth(_))));
    }

    #[test]
    fn token_refresh_window() {
        let mut auth = GoogleAuth {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: None,
        };
        assert!(!auth.needs_refresh());
        auth.expires_at = Some(Utc::now() + ChronoDuration::seconds(30));
        assert!(auth.needs_refresh());
        auth.expires_at = Some(Utc::now() + ChronoDuration::hours(1));
        assert!(!auth.needs_refresh());
        auth.access_token.clear();
        assert!(auth.needs_refresh());
        auth.refresh_token.clear();
        assert!(!auth.needs_refresh());
    }
}
