use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub const MAX_RESULTS_RANGE: RangeInclusive<u32> = 10..=200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InboxLayout {
    All,
    #[default]
    Important,
    Unread,
}

impl InboxLayout {
    /// Label the inbox listing is narrowed to.
    pub fn label(self) -> Option<&'static str> {
        match self {
            InboxLayout::All => None,
            InboxLayout::Important => Some("IMPORTANT"),
            InboxLayout::Unread => Some(crate::UNREAD_LABEL),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InboxLayout::All => "all",
            InboxLayout::Important => "important",
            InboxLayout::Unread => "unread",
        }
    }
}

impl fmt::Display for InboxLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InboxLayout {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(InboxLayout::All),
            "important" => Ok(InboxLayout::Important),
            "unread" => Ok(InboxLayout::Unread),
            other => Err(SettingsError::UnknownLayout(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("max_results must be between {min} and {max} (got {got})", min = MAX_RESULTS_RANGE.start(), max = MAX_RESULTS_RANGE.end())]
    MaxResultsOutOfRange { got: u32 },

    #[error("unknown inbox layout '{0}' (expected all, important or unread)")]
    UnknownLayout(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_results: u32,
    pub inbox_layout: InboxLayout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_results: 30,
            inbox_layout: InboxLayout::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !MAX_RESULTS_RANGE.contains(&self.max_results) {
            return Err(SettingsError::MaxResultsOutOfRange {
                got: self.max_results,
            });
        }
        Ok(())
    }
}

/// Process-wide user preferences, handed to the front-end at startup.
///
/// Clones share the same state. Writers are validated; readers either poll
/// with [`SettingsStore::get`] or hold a receiver from
/// [`SettingsStore::subscribe`] and await changes.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    tx: Arc<watch::Sender<Settings>>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SettingsStore {
    pub fn new(initial: Settings) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> Settings {
        *self.tx.borrow()
    }

    pub fn set(&self, settings: Settings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.tx.send_if_modified(|current| {
            if *current == settings {
                return false;
            }
            *current = settings;
            true
        });
        Ok(())
    }

    /// Apply a partial change; the store is left untouched if the result is invalid.
    pub fn update<F>(&self, change: F) -> Result<Settings, SettingsError>
    where
        F: FnOnce(&mut Settings),
    {
        let mut next = self.get();
        change(&mut next);
        self.set(next)?;
        Ok(next)
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::{InboxLayout, Settings, SettingsError, SettingsStore};

    #[test]
    fn defaults_match_the_web_client() {
        let settings = Settings::default();
        assert_eq!(settings.max_results, 30);
        assert_eq!(settings.inbox_layout, InboxLayout::Important);
    }

    #[test]
    fn set_rejects_out_of_range_page_sizes() {
        let store = SettingsStore::default();
        let err = store
            .set(Settings {
                max_results: 500,
                inbox_layout: InboxLayout::All,
            })
            .unwrap_err();
        assert_eq!(err, SettingsError::MaxResultsOutOfRange { got: 500 });
        assert_eq!(store.get(), Settings::default());
    }

    #[test]
    fn update_keeps_unchanged_fields() {
        let store = SettingsStore::default();
        let next = store
            .update(|s| s.inbox_layout = InboxLayout::Unread)
            .expect("valid update");
        assert_eq!(next.max_results, 30);
        assert_eq!(store.get().inbox_layout, InboxLayout::Unread);
    }

    #[test]
    fn layout_parsing_and_labels() {
        assert_eq!("Unread".parse::<InboxLayout>(), Ok(InboxLayout::Unread));
        assert!("starred".parse::<InboxLayout>().is_err());
        assert_eq!(InboxLayout::All.label(), None);
        assert_eq!(InboxLayout::Important.label(), Some("IMPORTANT"));
        assert_eq!(InboxLayout::Unread.label(), Some("UNREAD"));
    }

    #[tokio::test]
    async fn subscribers_see_changes_from_clones() {
        let store = SettingsStore::default();
        let mut rx = store.subscribe();
        let writer = store.clone();

        writer
            .update(|s| s.max_results = 50)
            .expect("valid update");
        rx.changed().await.expect("sender alive");
        assert_eq!(rx.borrow_and_update().max_results, 50);

        // Writing identical settings does not wake subscribers.
        writer.set(store.get()).expect("valid settings");
        assert!(!rx.has_changed().expect("sender alive"));
    }
}
