//! Conversion between free-text content and paragraph arrays.
//!
//! Records store their body as a list of paragraphs, while forms edit it as a
//! single block of text with blank lines between paragraphs.

use serde_json::Value;

/// Splits raw text into trimmed, non-empty paragraphs.
///
/// Line endings are normalized to `\n` first; any run of two or more newlines
/// separates paragraphs. Single newlines stay inside a paragraph.
///
/// # Examples
///
/// ```
/// use polyshape_core::content::normalize_content;
///
/// let paragraphs = normalize_content(" First \r\n\r\n Second \n\n\n Third ");
/// assert_eq!(paragraphs, vec!["First", "Second", "Third"]);
/// assert!(normalize_content("  \n ").is_empty());
/// ```
pub fn normalize_content(raw: &str) -> Vec<String> {
    let normalized = raw.replace("\r\n", "\n");
    let mut paragraphs = Vec::new();
    let mut rest = normalized.as_str();

    loop {
        match rest.find("\n\n") {
            Some(idx) => {
                push_paragraph(&mut paragraphs, &rest[..idx]);
                rest = rest[idx..].trim_start_matches('\n');
            }
            None => {
                push_paragraph(&mut paragraphs, rest);
                break;
            }
        }
    }

    paragraphs
}

fn push_paragraph(paragraphs: &mut Vec<String>, segment: &str) {
    let trimmed = segment.trim();
    if !trimmed.is_empty() {
        paragraphs.push(trimmed.to_string());
    }
}

/// Joins stored content back into text suitable for editing.
///
/// Arrays keep only their string entries (trimmed, empties dropped) joined by a
/// blank line, strings are returned unchanged, and any other value yields an
/// empty string.
///
/// # Examples
///
/// ```
/// use polyshape_core::content::join_content_for_edit;
/// use serde_json::json;
///
/// assert_eq!(join_content_for_edit(&json!(["a", 1, " b ", ""])), "a\n\nb");
/// assert_eq!(join_content_for_edit(&json!("as is ")), "as is ");
/// assert_eq!(join_content_for_edit(&json!(42)), "");
/// ```
pub fn join_content_for_edit(content: &Value) -> String {
    match content {
        Value::Array(entries) => join_paragraphs(entries.iter().filter_map(Value::as_str)),
        Value::String(text) => text.clone(),
        _ => String::new(),
    }
}

/// Trims paragraphs, drops empty ones and joins the rest with a blank line.
pub fn join_paragraphs<'a, I>(paragraphs: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    paragraphs
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Keeps the trimmed, non-empty string entries of a JSON array.
pub(crate) fn string_entries(entries: &[Value]) -> Vec<String> {
    entries
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
