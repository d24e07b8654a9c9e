use serde::{Deserialize, Serialize};

mod search;
mod settings;

pub use search::{Category, INBOXES, QuickFilter, SearchError, SearchFilters, SearchValue};
pub use settings::{
    InboxLayout, MAX_RESULTS_RANGE, Settings, SettingsError, SettingsStore,
};

/// Literal substituted for a required header the provider did not send.
pub const FALLBACK_HEADER: &str = "Failed";
pub const UNREAD_LABEL: &str = "UNREAD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A node of a message body tree.
///
/// Leaves carry the transport-encoded payload, branches only carry children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Part {
    Leaf {
        mime_type: String,
        data: Option<String>,
    },
    Branch {
        mime_type: String,
        children: Vec<Part>,
    },
}

impl Part {
    pub fn leaf(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::Leaf {
            mime_type: mime_type.into(),
            data: Some(data.into()),
        }
    }

    pub fn empty_leaf(mime_type: impl Into<String>) -> Self {
        Part::Leaf {
            mime_type: mime_type.into(),
            data: None,
        }
    }

    pub fn branch(mime_type: impl Into<String>, children: Vec<Part>) -> Self {
        Part::Branch {
            mime_type: mime_type.into(),
            children,
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            Part::Leaf { mime_type, .. } | Part::Branch { mime_type, .. } => mime_type,
        }
    }

    /// Inline payload of a leaf, `None` for branches and empty leaves.
    pub fn inline_data(&self) -> Option<&str> {
        match self {
            Part::Leaf {
                data: Some(data), ..
            } if !data.is_empty() => Some(data),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Part] {
        match self {
            Part::Leaf { .. } => &[],
            Part::Branch { children, .. } => children,
        }
    }
}

/// One raw provider message: headers, an optional inline body and a part tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub id: String,
    pub snippet: String,
    pub label_ids: Vec<String>,
    pub headers: Vec<Header>,
    pub body: Option<String>,
    pub parts: Vec<Part>,
}

impl MessageEnvelope {
    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn inline_body(&self) -> Option<&str> {
        self.body.as_deref().filter(|data| !data.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSummary {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub sender: Sender,
    pub subject: String,
    pub unread: bool,
    pub received_on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMessage {
    #[serde(flatten)]
    pub summary: NormalizedSummary,
    pub body: String,
    pub processed_html: String,
    pub blob_url: String,
    pub total_replies: usize,
}

impl NormalizedMessage {
    /// Listing shape: summary fields only, content left empty.
    pub fn metadata_only(summary: NormalizedSummary, total_replies: usize) -> Self {
        Self {
            summary,
            body: String::new(),
            processed_html: String::new(),
            blob_url: String::new(),
            total_replies,
        }
    }

    pub fn has_content(&self) -> bool {
        !self.processed_html.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPage {
    pub threads: Vec<NormalizedMessage>,
    pub next_page_token: Option<String>,
    pub result_size_estimate: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderCount {
    pub folder: String,
    pub result_size_estimate: u32,
}
