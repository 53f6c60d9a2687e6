//! Sorting, searching and pagination of enriched items.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::{EnrichedItem, ListedDetail};

/// Rows per page in every list.
pub const PAGE_SIZE: usize = 5;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses a record date into epoch milliseconds.
///
/// Naive dates and times are read as UTC. Returns `None` for empty or
/// unrecognized input.
pub fn parse_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Orders items newest first and keeps those whose title contains `query`.
///
/// Items without a parseable date sort after every dated item, keeping their
/// relative order. The match is case-insensitive on the trimmed query; an empty
/// query keeps everything, a non-empty one drops items without a detail.
pub fn filter_and_sort<'a, D: ListedDetail>(
    items: &'a [EnrichedItem<D>],
    query: &str,
) -> Vec<&'a EnrichedItem<D>> {
    let mut keyed: Vec<(Option<i64>, &EnrichedItem<D>)> = items
        .iter()
        .map(|item| (item.detail.as_ref().and_then(|d| parse_date(d.date())), item))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| b.cmp(a));

    let query = query.trim().to_lowercase();
    keyed
        .into_iter()
        .map(|(_, item)| item)
        .filter(|item| {
            query.is_empty()
                || item.detail.as_ref().is_some_and(|d| {
                    !d.title().is_empty() && d.title().to_lowercase().contains(&query)
                })
        })
        .collect()
}

/// One page of a list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub current_page: usize,
    pub total_pages: usize,
    /// Number of matching rows across all pages.
    pub total_items: usize,
}

impl<T> Page<T> {
    /// 1-based row number of the first item on this page.
    pub fn first_row(&self, page_size: usize) -> usize {
        (self.current_page - 1) * page_size + 1
    }
}

/// Slices `items` into the requested page, clamping it into range.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let current_page = page.clamp(1, total_pages);

    let items = items
        .into_iter()
        .skip((current_page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        current_page,
        total_pages,
        total_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListItem, Partner, ProjectDetail};

    fn item(pathname: &str, title: &str, date: &str) -> EnrichedItem<ProjectDetail> {
        EnrichedItem::with_detail(
            ListItem {
                url: format!("https://api.test{}", pathname),
                pathname: pathname.to_string(),
            },
            ProjectDetail {
                title: title.to_string(),
                content: String::new(),
                date: date.to_string(),
                partner: Partner::default(),
            },
        )
    }

    fn paths<D>(items: &[&EnrichedItem<D>]) -> Vec<String> {
        items.iter().map(|i| i.pathname.clone()).collect()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("1970-01-02"), Some(86_400_000));
        assert_eq!(parse_date("1970-01-01T00:00:01Z"), Some(1_000));
        assert_eq!(parse_date("1970-01-01T00:01"), Some(60_000));
        assert_eq!(parse_date("Thu, 01 Jan 1970 00:00:02 +0000"), Some(2_000));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("someday"), None);
    }

    #[test]
    fn test_sorts_newest_first_with_undated_last() {
        let items = vec![
            item("/a.json", "Alpha", "2023-01-01"),
            item("/b.json", "beta item", "2024-05-01"),
            item("/c.json", "Gamma", ""),
        ];
        let sorted = filter_and_sort(&items, "");
        assert_eq!(paths(&sorted), vec!["/b.json", "/a.json", "/c.json"]);
    }

    #[test]
    fn test_undated_and_errored_items_keep_order() {
        let errored = EnrichedItem::with_error(
            ListItem {
                url: "u".into(),
                pathname: "/e.json".into(),
            },
            "HTTP 500",
        );
        let items = vec![
            item("/x.json", "X", "garbage"),
            errored,
            item("/y.json", "Y", "2020-01-01"),
            item("/z.json", "Z", ""),
        ];
        let sorted = filter_and_sort(&items, "");
        assert_eq!(paths(&sorted), vec!["/y.json", "/x.json", "/e.json", "/z.json"]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let items = vec![
            item("/a.json", "Alpha", "2023-01-01"),
            item("/b.json", "beta item", "2024-05-01"),
            item("/c.json", "Gamma", ""),
        ];
        let found = filter_and_sort(&items, "beta");
        assert_eq!(paths(&found), vec!["/b.json"]);

        let found = filter_and_sort(&items, "  GAM ");
        assert_eq!(paths(&found), vec!["/c.json"]);

        assert!(filter_and_sort(&items, "delta").is_empty());
    }

    #[test]
    fn test_search_drops_items_without_detail() {
        let items = vec![EnrichedItem::<ProjectDetail>::bare(ListItem {
            url: "u".into(),
            pathname: "/p.json".into(),
        })];
        assert_eq!(filter_and_sort(&items, "").len(), 1);
        assert!(filter_and_sort(&items, "p").is_empty());
    }

    #[test]
    fn test_paginate() {
        let rows: Vec<usize> = (1..=12).collect();
        let page = paginate(rows.clone(), 1, PAGE_SIZE);
        assert_eq!(page.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 12);

        let page = paginate(rows.clone(), 3, PAGE_SIZE);
        assert_eq!(page.items, vec![11, 12]);
        assert_eq!(page.first_row(PAGE_SIZE), 11);

        let page = paginate(rows, 9, PAGE_SIZE);
        assert_eq!(page.current_page, 3);
    }

    #[test]
    fn test_paginate_empty() {
        let page = paginate(Vec::<u8>::new(), 0, PAGE_SIZE);
        assert!(page.items.is_empty());
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 1);
    }
}
