//! Add/edit form state and its conversion into API payloads.

use std::fmt::Debug;

use thiserror::Error;
use url::Url;

use crate::content::normalize_content;
use crate::models::{Partner, ProjectDetail, ProjectPayload, PublicationDetail, PublicationPayload};

/// Validation failures shown inline on a form. No request is made.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    #[error("Please fill in all required fields.")]
    MissingFields,

    #[error("Please enter a valid URL (e.g., https://example.com)")]
    InvalidUrl,

    #[error("Please enter a valid partner URL (e.g., https://example.com)")]
    InvalidPartnerUrl,
}

/// Describes one input of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub multiline: bool,
    pub hint: Option<&'static str>,
}

const fn field(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        multiline: false,
        hint: None,
    }
}

/// A form editing one record of a collection.
///
/// Fields are addressed by key so that presentation code can prompt for them
/// generically. Every field is required.
pub trait RecordForm: Default + Clone + Debug + Send + Sync {
    type Detail;
    type Payload;

    const FIELDS: &'static [FieldSpec];

    /// Message used when saving fails without a message of its own.
    const SAVE_FAILED: &'static str;

    /// Populates the form from an existing record.
    fn from_detail(detail: &Self::Detail) -> Self;

    fn value(&self, key: &str) -> Option<&str>;

    /// Sets a field; returns false for unknown keys.
    fn set_value(&mut self, key: &str, value: String) -> bool;

    /// Validates the form and builds the request payload.
    fn to_payload(&self) -> Result<Self::Payload, FormError>;

    fn has_empty_field(&self) -> bool {
        Self::FIELDS
            .iter()
            .any(|f| self.value(f.key).is_none_or(str::is_empty))
    }
}

/// Adds `https://` to scheme-less input and checks that the result parses.
///
/// # Examples
///
/// ```
/// use polyshape_core::form::normalize_url;
///
/// assert_eq!(normalize_url("example.com/page").as_deref(), Some("https://example.com/page"));
/// assert_eq!(normalize_url(" http://x.org ").as_deref(), Some("http://x.org"));
/// assert_eq!(normalize_url("invalid url"), None);
/// ```
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let normalized = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    Url::parse(&normalized).ok().map(|_| normalized)
}

/// Matches `^[A-Za-z][A-Za-z0-9+.-]*:`.
fn has_scheme(value: &str) -> bool {
    let mut chars = value.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    for c in chars {
        match c {
            ':' => return true,
            c if c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-') => {}
            _ => return false,
        }
    }
    false
}

/// Paragraphs of `raw`, or the trimmed text alone when there are none.
pub fn content_paragraphs(raw: &str) -> Vec<String> {
    let paragraphs = normalize_content(raw);
    if paragraphs.is_empty() {
        vec![raw.trim().to_string()]
    } else {
        paragraphs
    }
}

/// Splits a comma-separated author list.
pub fn split_authors(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationForm {
    pub title: String,
    pub content: String,
    pub date: String,
    pub url: String,
    /// Comma-separated.
    pub authors: String,
    pub venue: String,
}

impl RecordForm for PublicationForm {
    type Detail = PublicationDetail;
    type Payload = PublicationPayload;

    const FIELDS: &'static [FieldSpec] = &[
        field("title", "Title"),
        FieldSpec {
            key: "content",
            label: "Content",
            multiline: true,
            hint: Some("blank line between paragraphs"),
        },
        FieldSpec {
            key: "date",
            label: "Date",
            multiline: false,
            hint: Some("YYYY-MM-DD"),
        },
        field("url", "Publication URL"),
        FieldSpec {
            key: "authors",
            label: "Authors",
            multiline: false,
            hint: Some("comma-separated"),
        },
        field("venue", "Venue"),
    ];

    const SAVE_FAILED: &'static str = "Failed to save publication";

    fn from_detail(detail: &PublicationDetail) -> Self {
        Self {
            title: detail.title.clone(),
            content: detail.content.to_edit_text(),
            date: detail.date.clone(),
            url: detail.publication_url.clone(),
            authors: detail.authors.join(", "),
            venue: detail.venue.clone(),
        }
    }

    fn value(&self, key: &str) -> Option<&str> {
        let value = match key {
            "title" => &self.title,
            "content" => &self.content,
            "date" => &self.date,
            "url" => &self.url,
            "authors" => &self.authors,
            "venue" => &self.venue,
            _ => return None,
        };
        Some(value)
    }

    fn set_value(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "title" => &mut self.title,
            "content" => &mut self.content,
            "date" => &mut self.date,
            "url" => &mut self.url,
            "authors" => &mut self.authors,
            "venue" => &mut self.venue,
            _ => return false,
        };
        *slot = value;
        true
    }

    fn to_payload(&self) -> Result<PublicationPayload, FormError> {
        if self.has_empty_field() {
            return Err(FormError::MissingFields);
        }
        let publication_url = normalize_url(&self.url).ok_or(FormError::InvalidUrl)?;

        Ok(PublicationPayload {
            title: self.title.clone(),
            content: content_paragraphs(&self.content),
            date: self.date.clone(),
            publication_url,
            authors: split_authors(&self.authors),
            venue: self.venue.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectForm {
    pub title: String,
    pub content: String,
    pub date: String,
    pub partner_name: String,
    pub partner_url: String,
}

impl RecordForm for ProjectForm {
    type Detail = ProjectDetail;
    type Payload = ProjectPayload;

    const FIELDS: &'static [FieldSpec] = &[
        field("title", "Title"),
        FieldSpec {
            key: "content",
            label: "Content",
            multiline: true,
            hint: Some("blank line between paragraphs"),
        },
        FieldSpec {
            key: "date",
            label: "Date",
            multiline: false,
            hint: Some("YYYY-MM-DD"),
        },
        field("partner_name", "Partner name"),
        field("partner_url", "Partner URL"),
    ];

    const SAVE_FAILED: &'static str = "Failed to save project";

    fn from_detail(detail: &ProjectDetail) -> Self {
        Self {
            title: detail.title.clone(),
            content: detail.content.clone(),
            date: detail.date.clone(),
            partner_name: detail.partner.name.clone(),
            partner_url: detail.partner.url.clone(),
        }
    }

    fn value(&self, key: &str) -> Option<&str> {
        let value = match key {
            "title" => &self.title,
            "content" => &self.content,
            "date" => &self.date,
            "partner_name" => &self.partner_name,
            "partner_url" => &self.partner_url,
            _ => return None,
        };
        Some(value)
    }

    fn set_value(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "title" => &mut self.title,
            "content" => &mut self.content,
            "date" => &mut self.date,
            "partner_name" => &mut self.partner_name,
            "partner_url" => &mut self.partner_url,
            _ => return false,
        };
        *slot = value;
        true
    }

    fn to_payload(&self) -> Result<ProjectPayload, FormError> {
        if self.has_empty_field() {
            return Err(FormError::MissingFields);
        }
        let url = normalize_url(&self.partner_url).ok_or(FormError::InvalidPartnerUrl)?;

        Ok(ProjectPayload {
            title: self.title.clone(),
            content: content_paragraphs(&self.content),
            date: self.date.clone(),
            partner: Partner {
                name: self.partner_name.clone(),
                url,
            },
        })
    }
}
