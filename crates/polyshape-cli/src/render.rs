//! Terminal output for lists, details and session notices.

use std::time::Duration;

use polyshape_core::actions::ListState;
use polyshape_core::listing::{Page, PAGE_SIZE};
use polyshape_core::models::{
    Collection, EnrichedItem, ListedDetail, ProjectDetail, PublicationDetail,
};
use polyshape_core::path::last_path_segment;

use crate::config::CollectionArg;

const TITLE_WIDTH: usize = 60;

/// Collection-specific parts of a list row and detail view.
pub trait RowDisplay: ListedDetail {
    /// Short secondary text shown after the title.
    fn summary(&self) -> String;

    /// Labelled fields for the detail view, content excluded.
    fn fields(&self) -> Vec<(&'static str, String)>;

    fn paragraphs(&self) -> Vec<String>;
}

impl RowDisplay for PublicationDetail {
    fn summary(&self) -> String {
        let authors = self.authors.join(", ");
        [authors.as_str(), self.venue.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" · ")
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Date", self.date.clone()),
            ("Authors", self.authors.join(", ")),
            ("Venue", self.venue.clone()),
            ("URL", self.publication_url.clone()),
        ]
    }

    fn paragraphs(&self) -> Vec<String> {
        self.content
            .to_edit_text()
            .split("\n\n")
            .map(str::to_string)
            .collect()
    }
}

impl RowDisplay for ProjectDetail {
    fn summary(&self) -> String {
        self.partner.name.clone()
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Date", self.date.clone()),
            ("Partner", self.partner.name.clone()),
            ("Partner URL", self.partner.url.clone()),
        ]
    }

    fn paragraphs(&self) -> Vec<String> {
        self.content.split("\n\n").map(str::to_string).collect()
    }
}

/// Truncate text to a maximum number of characters, adding ellipsis if needed
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() <= max_chars {
        cleaned
    } else {
        let head: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", head.trim_end())
    }
}

/// One list row, numbered from 1 across pages.
pub fn format_row<D: RowDisplay>(row: usize, item: &EnrichedItem<D>) -> String {
    match (&item.detail, &item.error) {
        (Some(detail), _) => {
            let mut line = format!("{:>3}. {}", row, truncate_text(detail.title(), TITLE_WIDTH));
            if !detail.date().is_empty() {
                line.push_str(&format!("  ({})", detail.date()));
            }
            let summary = detail.summary();
            if !summary.is_empty() {
                line.push_str(&format!("\n     {}", truncate_text(&summary, TITLE_WIDTH + 10)));
            }
            line
        }
        (None, Some(error)) => format!(
            "{:>3}. {}  ✗ Error: {}",
            row,
            last_path_segment(&item.pathname),
            error
        ),
        (None, None) => format!(
            "{:>3}. {}  (details not loaded)",
            row,
            last_path_segment(&item.pathname)
        ),
    }
}

pub fn format_toolbar<C: Collection, T>(state: &ListState<C>, page: &Page<T>) -> String {
    let search = state.search_query.trim();
    let mut parts = Vec::new();
    if !search.is_empty() {
        parts.push(format!("Search: \"{}\"", search));
    }
    parts.push(format!("Page {}/{}", page.current_page, page.total_pages));
    parts.push(match page.total_items {
        1 => "1 item".to_string(),
        n => format!("{} items", n),
    });
    if state.creating {
        parts.push(format!("Saving {}...", C::LABEL));
    }
    parts.join("  ·  ")
}

/// Rows of one page, marking rows whose deletion is still pending.
pub fn format_rows<C>(state: &ListState<C>, page: &Page<&EnrichedItem<C::Detail>>) -> Vec<String>
where
    C: Collection,
    C::Detail: RowDisplay,
{
    let first = page.first_row(PAGE_SIZE);
    page.items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let row = format_row(first + i, item);
            if state.deleting.contains(&item.pathname) {
                match row.split_once('\n') {
                    Some((head, rest)) => format!("{}  (deleting...)\n{}", head, rest),
                    None => format!("{}  (deleting...)", row),
                }
            } else {
                row
            }
        })
        .collect()
}

/// Tab bar with the active tab bracketed.
pub fn format_tabs(active: CollectionArg) -> String {
    [CollectionArg::Publications, CollectionArg::Projects]
        .iter()
        .map(|tab| {
            if *tab == active {
                format!("[{}]", tab.title())
            } else {
                format!(" {} ", tab.title())
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn print_header(api_root: &str, authenticated: bool) {
    println!("\n🗂  Polyshape Admin  ·  {}", api_root);
    if authenticated {
        println!("   Signed in (bearer token configured)");
    } else {
        println!("   No token configured: requests are sent anonymously");
    }
}

/// Prints the list area: error, loading placeholder, empty notice or rows.
pub fn print_list<C>(state: &ListState<C>, view: Option<Page<&EnrichedItem<C::Detail>>>)
where
    C: Collection,
    C::Detail: RowDisplay,
{
    if let Some(error) = &state.error {
        println!("\n✗ {}\n", error);
        return;
    }

    let Some(page) = view else {
        println!("\nLoading {}...\n", C::NAME);
        return;
    };

    println!();
    if page.items.is_empty() {
        if state.search_query.trim().is_empty() {
            println!("No {} found.", C::NAME);
        } else {
            println!("No {} match \"{}\".", C::NAME, state.search_query.trim());
        }
    } else {
        for row in format_rows(state, &page) {
            println!("{}", row);
        }
    }
    println!("\n{}\n", format_toolbar(state, &page));
}

pub fn print_detail<D: RowDisplay>(item: &EnrichedItem<D>) {
    println!();
    let Some(detail) = &item.detail else {
        println!("{}", item.pathname);
        if let Some(error) = &item.error {
            println!("   ✗ {}", error);
        }
        println!();
        return;
    };

    println!("{}", detail.title());
    for (label, value) in detail.fields() {
        if !value.is_empty() {
            println!("   {:<12} {}", format!("{}:", label), value);
        }
    }
    println!("   {:<12} {}", "Path:", item.pathname);
    println!();
    for paragraph in detail.paragraphs() {
        println!("   {}", paragraph);
        println!();
    }
}

pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

pub fn print_session_warning(remaining: Duration) {
    println!(
        "\n⚠️  You will be signed out in {} due to inactivity. Type 'stay' to remain signed in.",
        format_remaining(remaining)
    );
}

pub fn print_signed_out(expired: bool, logout_url: Option<&str>) {
    if expired {
        println!("\n🔒 You were signed out after a period of inactivity.");
    } else {
        println!("\n🔒 Signed out.");
    }
    if let Some(url) = logout_url {
        println!("   Finish signing out with your identity provider: {}", url);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyshape_core::listing::paginate;
    use polyshape_core::models::{Content, ListItem, Partner, Projects, Publications};

    fn item() -> ListItem {
        ListItem {
            url: "https://api.test/p/a.json".to_string(),
            pathname: "publications/a.json".to_string(),
        }
    }

    fn publication() -> PublicationDetail {
        PublicationDetail {
            title: "Quantum Paper".to_string(),
            content: Content::Paragraphs(vec!["One".to_string(), "Two".to_string()]),
            date: "2024-05-01".to_string(),
            publication_url: "https://doi.org/1".to_string(),
            authors: vec!["Ada".to_string(), "Grace".to_string()],
            venue: "Nature".to_string(),
        }
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a  b\n c", 10), "a b c");
        assert_eq!(truncate_text("abcdef ghij", 6), "abcdef...");
        assert_eq!(truncate_text("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_format_row_with_detail() {
        let row = format_row(3, &EnrichedItem::with_detail(item(), publication()));
        assert_eq!(
            row,
            "  3. Quantum Paper  (2024-05-01)\n     Ada, Grace · Nature"
        );
    }

    #[test]
    fn test_format_row_with_error() {
        let row = format_row(1, &EnrichedItem::<PublicationDetail>::with_error(item(), "HTTP 404"));
        assert_eq!(row, "  1. a.json  ✗ Error: HTTP 404");
    }

    #[test]
    fn test_format_row_without_detail() {
        let row = format_row(12, &EnrichedItem::<ProjectDetail>::bare(item()));
        assert_eq!(row, " 12. a.json  (details not loaded)");
    }

    #[test]
    fn test_project_summary() {
        let detail = ProjectDetail {
            title: "Bridge".to_string(),
            content: "One\n\nTwo".to_string(),
            date: String::new(),
            partner: Partner {
                name: "ACME".to_string(),
                url: "https://acme.example".to_string(),
            },
        };
        assert_eq!(detail.summary(), "ACME");
        assert_eq!(detail.paragraphs(), vec!["One", "Two"]);
        assert_eq!(
            format_row(1, &EnrichedItem::with_detail(item(), detail)),
            "  1. Bridge\n     ACME"
        );
    }

    #[test]
    fn test_publication_paragraphs() {
        assert_eq!(publication().paragraphs(), vec!["One", "Two"]);
    }

    #[test]
    fn test_format_toolbar() {
        let mut state = ListState::<Publications>::default();
        let page = paginate(vec![1, 2, 3, 4, 5, 6], 2, PAGE_SIZE);
        assert_eq!(format_toolbar(&state, &page), "Page 2/2  ·  6 items");

        state.search_query = " beta ".to_string();
        assert_eq!(
            format_toolbar(&state, &paginate(vec![1], 1, PAGE_SIZE)),
            "Search: \"beta\"  ·  Page 1/1  ·  1 item"
        );
    }

    #[test]
    fn test_format_toolbar_while_saving() {
        let state = ListState::<Projects> {
            creating: true,
            ..ListState::default()
        };
        let page = paginate(Vec::<u8>::new(), 1, PAGE_SIZE);
        assert_eq!(
            format_toolbar(&state, &page),
            "Page 1/1  ·  0 items  ·  Saving project..."
        );
    }

    #[test]
    fn test_format_rows_marks_pending_delete() {
        let mut state = ListState::<Publications>::default();
        state.deleting.insert("publications/a.json".to_string());
        let other = ListItem {
            url: "https://api.test/p/b.json".to_string(),
            pathname: "publications/b.json".to_string(),
        };
        let items = vec![
            EnrichedItem::with_detail(item(), publication()),
            EnrichedItem::bare(other),
        ];
        let page = paginate(items.iter().collect(), 1, PAGE_SIZE);

        assert_eq!(
            format_rows(&state, &page),
            vec![
                "  1. Quantum Paper  (2024-05-01)  (deleting...)\n     Ada, Grace · Nature".to_string(),
                "  2. b.json  (details not loaded)".to_string(),
            ]
        );
    }

    #[test]
    fn test_format_tabs() {
        assert_eq!(
            format_tabs(CollectionArg::Projects),
            " Publications   [Projects]"
        );
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::from_secs(60)), "1m 00s");
        assert_eq!(format_remaining(Duration::from_secs(42)), "42s");
    }
}
