//! Domain types for the two content collections.
//!
//! The API is loosely typed, so details are decoded from `serde_json::Value`
//! with per-field defaults instead of strict `Deserialize` impls: a record with
//! a title is usable even when other fields are missing or malformed.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::{join_paragraphs, string_entries};
use crate::form::{ProjectForm, PublicationForm, RecordForm};

/// Reference to a detail resource, as returned by a collection's index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Absolute (or API-relative) URL of the detail document.
    pub url: String,
    /// Storage pathname; the identity of the record.
    pub pathname: String,
}

/// A list entry merged with its detail, or with the reason it has none.
///
/// Once the detail fetch settles exactly one of `detail`/`error` is set. Both
/// are `None` when the fetch was aborted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedItem<D> {
    pub url: String,
    pub pathname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<D> EnrichedItem<D> {
    pub fn with_detail(item: ListItem, detail: D) -> Self {
        Self {
            url: item.url,
            pathname: item.pathname,
            detail: Some(detail),
            error: None,
        }
    }

    pub fn with_error(item: ListItem, error: impl Into<String>) -> Self {
        Self {
            url: item.url,
            pathname: item.pathname,
            detail: None,
            error: Some(error.into()),
        }
    }

    /// Entry whose detail request was aborted.
    pub fn bare(item: ListItem) -> Self {
        Self {
            url: item.url,
            pathname: item.pathname,
            detail: None,
            error: None,
        }
    }
}

/// Fields every detail exposes to the list pipeline.
pub trait ListedDetail {
    fn title(&self) -> &str;
    fn date(&self) -> &str;
}

/// A content collection served under `<api_root>/<NAME>/`.
pub trait Collection: Send + Sync + 'static {
    /// Path segment and tab name, e.g. `publications`.
    const NAME: &'static str;
    /// Singular label used in prompts and messages.
    const LABEL: &'static str;

    type Detail: ListedDetail + Clone + Debug + PartialEq + Serialize + Send + Sync;
    type Payload: Clone + Debug + PartialEq + Serialize + Send + Sync;
    type Form: RecordForm<Detail = Self::Detail, Payload = Self::Payload>;

    /// Decodes a detail document; `None` when it has no usable title.
    fn parse_detail(value: &Value) -> Option<Self::Detail>;
}

/// Publication body: either free text or a list of paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Paragraphs(Vec<String>),
}

impl Default for Content {
    fn default() -> Self {
        Content::Text(String::new())
    }
}

impl Content {
    /// Text for an edit form; paragraphs are joined with a blank line.
    pub fn to_edit_text(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Paragraphs(paragraphs) => join_paragraphs(paragraphs.iter().map(String::as_str)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationDetail {
    pub title: String,
    pub content: Content,
    pub date: String,
    pub publication_url: String,
    pub authors: Vec<String>,
    pub venue: String,
}

impl ListedDetail for PublicationDetail {
    fn title(&self) -> &str {
        &self.title
    }

    fn date(&self) -> &str {
        &self.date
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub title: String,
    pub content: String,
    pub date: String,
    pub partner: Partner,
}

impl ListedDetail for ProjectDetail {
    fn title(&self) -> &str {
        &self.title
    }

    fn date(&self) -> &str {
        &self.date
    }
}

/// Body sent when creating or updating a publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationPayload {
    pub title: String,
    pub content: Vec<String>,
    /// `YYYY-MM-DD`
    pub date: String,
    pub publication_url: String,
    pub authors: Vec<String>,
    pub venue: String,
}

/// Body sent when creating or updating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPayload {
    pub title: String,
    pub content: Vec<String>,
    /// `YYYY-MM-DD`
    pub date: String,
    pub partner: Partner,
}

/// The `publications` collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Publications;

impl Collection for Publications {
    const NAME: &'static str = "publications";
    const LABEL: &'static str = "publication";

    type Detail = PublicationDetail;
    type Payload = PublicationPayload;
    type Form = PublicationForm;

    fn parse_detail(value: &Value) -> Option<PublicationDetail> {
        let record = value.as_object()?;
        let title = non_empty_str(record.get("title"))?;

        let content = match record.get("content") {
            Some(Value::String(text)) => Content::Text(text.clone()),
            Some(Value::Array(entries)) => Content::Paragraphs(string_entries(entries)),
            _ => Content::default(),
        };

        let authors = match record.get("authors") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        Some(PublicationDetail {
            title,
            content,
            date: str_or_empty(record.get("date")),
            publication_url: str_or_empty(record.get("publicationUrl")),
            authors,
            venue: str_or_empty(record.get("venue")),
        })
    }
}

/// The `projects` collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Projects;

impl Collection for Projects {
    const NAME: &'static str = "projects";
    const LABEL: &'static str = "project";

    type Detail = ProjectDetail;
    type Payload = ProjectPayload;
    type Form = ProjectForm;

    fn parse_detail(value: &Value) -> Option<ProjectDetail> {
        let record = value.as_object()?;
        let title = non_empty_str(record.get("title"))?;

        let content = match record.get("content") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Array(entries)) => string_entries(entries).join("\n\n"),
            _ => String::new(),
        };

        let partner = match record.get("partner") {
            Some(Value::Object(partner)) => Partner {
                name: str_or_empty(partner.get("name")),
                url: str_or_empty(partner.get("url")),
            },
            _ => Partner::default(),
        };

        Some(ProjectDetail {
            title,
            content,
            date: str_or_empty(record.get("date")),
            partner,
        })
    }
}

/// Decodes a collection index.
///
/// Accepts a bare array or an object wrapping it in `data` or `items`. Entries
/// without a non-empty string `url` and `pathname` are skipped.
pub fn parse_list(value: &Value) -> Vec<ListItem> {
    let entries: &[Value] = match value {
        Value::Array(entries) => entries.as_slice(),
        Value::Object(record) => match (record.get("data"), record.get("items")) {
            (Some(Value::Array(entries)), _) => entries.as_slice(),
            (_, Some(Value::Array(entries))) => entries.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    entries
        .iter()
        .filter_map(|entry| {
            let record = entry.as_object()?;
            Some(ListItem {
                url: non_empty_str(record.get("url"))?,
                pathname: non_empty_str(record.get("pathname"))?,
            })
        })
        .collect()
}

fn str_or_empty(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
