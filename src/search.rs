//! In-memory substring search shared by every list view.

use serde::Serialize;
use std::collections::BTreeMap;

/// A record that can be matched against a free-text search term.
pub trait Searchable {
    /// Text fields the term is matched against. `None` fields never match.
    fn search_fields(&self) -> Vec<Option<&str>>;
}

pub fn matches<T: Searchable>(item: &T, needle_lower: &str) -> bool {
    item.search_fields()
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle_lower))
}

/// Keep the items where any searchable field contains `term`, ignoring case.
/// A blank term keeps everything, in list order.
pub fn filter<T: Searchable>(items: Vec<T>, term: &str) -> Vec<T> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| matches(item, &needle))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView<T> {
    pub items: Vec<T>,
    /// Size of the collection before filtering.
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
    /// Per-status counts over the whole collection.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub counts: BTreeMap<&'static str, usize>,
}

impl<T: Searchable> ListView<T> {
    /// Filter `all` by `term`; when nothing survives, `empty_message` is
    /// called with the trimmed term to describe the empty state.
    pub fn build<F>(all: Vec<T>, term: &str, empty_message: F) -> Self
    where
        F: FnOnce(&str) -> String,
    {
        let total = all.len();
        let items = filter(all, term);
        let empty_message = items.is_empty().then(|| empty_message(term.trim()));
        ListView {
            items,
            total,
            empty_message,
            counts: BTreeMap::new(),
        }
    }

    /// Like `build`, also counting every record under `status_of`. Each of
    /// `statuses` is reported, zero included.
    pub fn build_counted<F, S>(
        all: Vec<T>,
        term: &str,
        empty_message: F,
        statuses: &[&'static str],
        status_of: S,
    ) -> Self
    where
        F: FnOnce(&str) -> String,
        S: Fn(&T) -> &'static str,
    {
        let mut counts: BTreeMap<&'static str, usize> =
            statuses.iter().map(|s| (*s, 0)).collect();
        for item in &all {
            *counts.entry(status_of(item)).or_insert(0) += 1;
        }
        let mut view = Self::build(all, term, empty_message);
        view.counts = counts;
        view
    }
}
