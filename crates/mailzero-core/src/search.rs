use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Folders offered by the search form.
pub const INBOXES: [&str; 8] = [
    "inbox", "spam", "trash", "unread", "starred", "important", "sent", "draft",
];

const DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Primary,
    Updates,
    Promotions,
    Social,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Primary => "primary",
            Category::Updates => "updates",
            Category::Promotions => "promotions",
            Category::Social => "social",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("unknown category '{0}' (expected primary, updates, promotions or social)")]
    UnknownCategory(String),
}

impl FromStr for Category {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Category::Primary),
            "updates" => Ok(Category::Updates),
            "promotions" => Ok(Category::Promotions),
            "social" => Ok(Category::Social),
            other => Err(SearchError::UnknownCategory(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickFilter {
    Unread,
    HasAttachment,
    Starred,
}

impl QuickFilter {
    pub fn query(self) -> &'static str {
        match self {
            QuickFilter::Unread => "is:unread",
            QuickFilter::HasAttachment => "has:attachment",
            QuickFilter::Starred => "is:starred",
        }
    }
}

/// Structured fields of the search form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub q: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub category: Option<Category>,
    pub folder: String,
}

/// What the list view searches with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchValue {
    pub value: String,
    pub highlight: String,
    pub folder: String,
}

impl SearchFilters {
    /// Replaces the free-text part with a preset, like the quick filter buttons.
    pub fn apply_quick_filter(&mut self, filter: QuickFilter) {
        self.q = filter.query().to_string();
    }

    pub fn is_filtering(&self) -> bool {
        !self.q.is_empty()
            || !self.from.is_empty()
            || !self.to.is_empty()
            || !self.subject.is_empty()
            || self.date_from.is_some()
            || self.date_to.is_some()
            || self.category.is_some()
            || !self.folder.is_empty()
    }

    /// Provider search string, e.g. `invoice from:(bob) after:01/31/2024`.
    pub fn to_query(&self) -> String {
        let mut terms: Vec<String> = Vec::new();
        let q = self.q.trim();
        if !q.is_empty() {
            terms.push(q.to_string());
        }
        push_grouped(&mut terms, "from", &self.from);
        push_grouped(&mut terms, "to", &self.to);
        push_grouped(&mut terms, "subject", &self.subject);
        if let Some(date) = self.date_from {
            terms.push(format!("after:{}", date.format(DATE_FORMAT)));
        }
        if let Some(date) = self.date_to {
            terms.push(format!("before:{}", date.format(DATE_FORMAT)));
        }
        if let Some(category) = self.category {
            terms.push(format!("category:({})", category));
        }
        terms.join(" ")
    }

    pub fn search_value(&self) -> SearchValue {
        SearchValue {
            value: self.to_query(),
            highlight: self.q.clone(),
            folder: self.folder.trim().to_ascii_uppercase(),
        }
    }
}

fn push_grouped(terms: &mut Vec<String>, operator: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        terms.push(format!("{}:({})", operator, value));
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Category, QuickFilter, SearchError, SearchFilters, SearchValue};

    #[test]
    fn empty_form_builds_empty_query() {
        let filters = SearchFilters::default();
        assert_eq!(filters.to_query(), "");
        assert!(!filters.is_filtering());
        assert_eq!(filters.search_value(), SearchValue::default());
    }

    #[test]
    fn all_fields_are_rendered_in_form_order() {
        let filters = SearchFilters {
            q: "invoice".to_string(),
            from: "bob@example.com".to_string(),
            to: "alice".to_string(),
            subject: "March report".to_string(),
            date_from: NaiveDate::from_ymd_opt(2024, 1, 5),
            date_to: NaiveDate::from_ymd_opt(2024, 12, 31),
            category: Some(Category::Updates),
            folder: "sent".to_string(),
        };
        assert_eq!(
            filters.to_query(),
            "invoice from:(bob@example.com) to:(alice) subject:(March report) \
             after:01/05/2024 before:12/31/2024 category:(updates)"
        );
        let value = filters.search_value();
        assert_eq!(value.highlight, "invoice");
        assert_eq!(value.folder, "SENT");
    }

    #[test]
    fn blank_fields_are_skipped() {
        let filters = SearchFilters {
            from: "  ".to_string(),
            subject: "hello".to_string(),
            ..Default::default()
        };
        assert_eq!(filters.to_query(), "subject:(hello)");
        assert!(filters.is_filtering());
    }

    #[test]
    fn quick_filter_replaces_free_text() {
        let mut filters = SearchFilters {
            q: "old".to_string(),
            ..Default::default()
        };
        filters.apply_quick_filter(QuickFilter::HasAttachment);
        assert_eq!(filters.to_query(), "has:attachment");
        assert!(filters.is_filtering());
    }

    #[test]
    fn category_parsing() {
        assert_eq!("Social".parse::<Category>(), Ok(Category::Social));
        assert_eq!(
            "Forums".parse::<Category>(),
            Err(SearchError::UnknownCategory("forums".to_string()))
        );
    }
}
