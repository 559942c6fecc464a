//! Header Queue
//!
//! Elements destined for `<head>` are collected here instead of being
//! written immediately. Entries are keyed by a content fingerprint so the
//! same stylesheet or script requested twice (by a page and by a partial it
//! embeds, or by every iteration of a repeat) lands in the output once.

use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Attributes that do not take part in the fingerprint
pub const FINGERPRINT_EXCLUDED: &[&str] = &["type", "content", "data-trace"];

/// Pending `<head>` insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    /// Element name: script, style, link or meta
    pub tag: String,
    /// Attributes in output order
    pub attrs: Vec<(String, String)>,
    /// Text content (inline script or style)
    pub value: String,
    /// `id` of the element to insert before, resolved at freeze time
    pub anchor: Option<String>,
}

impl HeaderEntry {
    pub fn new(tag: &str, attrs: &[(&str, &str)], value: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            value: value.to_string(),
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, anchor: &str) -> Self {
        self.anchor = Some(anchor.to_string());
        self
    }

    pub fn is_meta(&self) -> bool {
        self.tag == "meta"
    }

    /// Content fingerprint: tag, value and the non-volatile attributes
    pub fn fingerprint(&self) -> u64 {
        let mut attrs: Vec<&(String, String)> = self
            .attrs
            .iter()
            .filter(|(name, _)| !FINGERPRINT_EXCLUDED.contains(&name.to_ascii_lowercase().as_str()))
            .collect();
        attrs.sort();

        let mut hasher = DefaultHasher::new();
        self.tag.hash(&mut hasher);
        self.value.hash(&mut hasher);
        attrs.hash(&mut hasher);
        hasher.finish()
    }
}

/// Deduplicated, insertion-ordered queue of header entries
#[derive(Debug, Clone, Default)]
pub struct HeaderQueue {
    entries: Vec<HeaderEntry>,
    seen: HashSet<u64>,
}

impl HeaderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entry; returns false when identical content is already queued
    pub fn push(&mut self, entry: HeaderEntry) -> bool {
        if !self.seen.insert(entry.fingerprint()) {
            tracing::trace!("Header <{}> already queued", entry.tag);
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Append every entry of `other`, keeping its order
    pub fn merge(&mut self, other: &HeaderQueue) {
        for entry in &other.entries {
            self.push(entry.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderEntry> {
        self.entries.iter()
    }

    /// Output order: meta entries first, queue order within each group
    pub fn ordered(&self) -> Vec<&HeaderEntry> {
        let (meta, rest): (Vec<_>, Vec<_>) = self.entries.iter().partition(|e| e.is_meta());
        meta.into_iter().chain(rest).collect()
    }

    /// Remove all entries but remember their fingerprints
    pub fn drain(&mut self) -> Vec<HeaderEntry> {
        std::mem::take(&mut self.entries)
    }
}
