//! Label index over every loaded entity, with two-tier ranked lookup.
//!
//! Entries are sorted once at build time, alphabetically with accents and
//! case folded at the first level. A query keeps that order within
//! each tier: labels starting with the query first, then labels containing it
//! anywhere else.

mod highlight;

pub use highlight::{Highlight, highlight};

use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::classify::{Category, Feature, Incident, Municipality, Park};
use crate::config::DEFAULT_SEARCH_RESULT_LIMIT;

#[derive(Debug, Clone, Serialize)]
pub struct SearchEntry {
    pub label: String,
    pub normalized_label: String,
    pub entity_type: String,
    #[serde(skip)]
    collation_key: String,
    #[serde(skip)]
    pub feature: Arc<Feature>,
}

impl SearchEntry {
    fn new(label: String, entity_type: String, feature: &Arc<Feature>) -> Self {
        SearchEntry {
            normalized_label: label.to_lowercase(),
            collation_key: collation_key(&label),
            label,
            entity_type,
            feature: Arc::clone(feature),
        }
    }

    pub fn category(&self) -> Category {
        self.feature.category
    }
}

#[derive(Debug, Clone)]
pub struct SearchIndex {
    entries: Vec<SearchEntry>,
    limit: usize,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            limit: DEFAULT_SEARCH_RESULT_LIMIT,
        }
    }
}

impl SearchIndex {
    pub fn build(municipalities: &[Municipality], parks: &[Park], incidents: &[Incident]) -> Self {
        let mut entries =
            Vec::with_capacity(municipalities.len() + parks.len() + incidents.len());

        entries.extend(municipalities.iter().map(|m| {
            let prefix = m.status.map_or("RM of", |s| s.label_prefix());
            let entity_type = m.status.map_or("Municipality", |s| s.label());
            SearchEntry::new(
                format!("{prefix} {} MB", m.name),
                entity_type.to_string(),
                &m.feature,
            )
        }));
        entries.extend(parks.iter().map(|p| {
            SearchEntry::new(
                format!("{} (Park)", p.display_name),
                "Park".to_string(),
                &p.feature,
            )
        }));
        entries.extend(incidents.iter().map(|i| {
            let kind = match title_case(&i.kind) {
                kind if kind.is_empty() => "Incident".to_string(),
                kind => kind,
            };
            SearchEntry::new(format!("{} ({kind})", i.name), kind, &i.feature)
        }));

        // sort_by is stable, equal labels keep dataset order
        entries.sort_by(label_order);

        tracing::debug!("Search index built with {} entries", entries.len());
        SearchIndex {
            entries,
            limit: DEFAULT_SEARCH_RESULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranked matches for `raw`. A blank query means "no active search" and
    /// returns nothing.
    pub fn query(&self, raw: &str) -> Vec<&SearchEntry> {
        let needle = normalize_query(raw);
        if needle.is_empty() {
            return Vec::new();
        }

        let mut prefix = Vec::new();
        let mut substring = Vec::new();
        for entry in &self.entries {
            match entry.normalized_label.find(&needle) {
                Some(0) => prefix.push(entry),
                Some(_) => substring.push(entry),
                None => {}
            }
        }

        tracing::debug!(
            "Query {:?}: {} prefix, {} substring matches",
            needle,
            prefix.len(),
            substring.len()
        );
        prefix
            .into_iter()
            .chain(substring)
            .take(self.limit)
            .collect()
    }

    /// The entry a "go to first result" action should pick.
    pub fn best_match(&self, raw: &str) -> Option<&SearchEntry> {
        self.query(raw).into_iter().next()
    }
}

pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Primary sort key: lowercase with diacritics stripped, so "Île" sorts
/// next to "ile" rather than after "z".
pub fn collation_key(label: &str) -> String {
    label
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Base letters first, then accents, then case.
fn label_order(a: &SearchEntry, b: &SearchEntry) -> Ordering {
    a.collation_key
        .cmp(&b.collation_key)
        .then_with(|| a.normalized_label.cmp(&b.normalized_label))
        .then_with(|| a.label.cmp(&b.label))
}

/// Uppercase the first letter of every word, leaving the spacing alone.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for ch in text.chars() {
        if word_start && !ch.is_whitespace() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        word_start = ch.is_whitespace();
    }
    out
}
