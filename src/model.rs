//! Typed data model for search index fragments.
//!
//! A fragment maps lowercase search tokens to destination links. The model
//! replaces the file format's positional nesting with typed records so the
//! structural invariants (non-empty target lists, key uniqueness policy)
//! are enforceable at construction.

use crate::error::MalformedIndex;
use crate::parse;
use ahash::AHashMap;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A destination reference: a base path plus an optional anchor.
///
/// The on-disk form is `"<base>#<anchor>"` or just `"<base>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetUrl {
    pub base: String,
    pub anchor: Option<String>,
}

impl TargetUrl {
    /// Splits a raw reference on its first `#`.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('#') {
            Some((base, anchor)) => Self {
                base: base.to_string(),
                anchor: Some(anchor.to_string()),
            },
            None => Self {
                base: raw.to_string(),
                anchor: None,
            },
        }
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.anchor {
            Some(anchor) => write!(f, "{}#{}", self.base, anchor),
            None => f.write_str(&self.base),
        }
    }
}

/// One destination a token resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub url: TargetUrl,
    /// Opaque category tag assigned by the generator. Carried for equality
    /// and round-trips only; its value space is external to the fragment.
    pub group_id: u32,
    /// Qualified name shown in the results dropdown, entities decoded.
    /// May end in a scope marker such as `(Global Namespace)`.
    pub label: String,
}

/// One row of the index: a searchable key and its destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The searchable token: lowercase, symbols escaped per [`encode_key`].
    pub key: String,
    /// The token as displayed, without key escaping.
    pub display: String,
    /// Destinations in generation order. Never empty in a loaded index.
    pub targets: Vec<Target>,
}

/// Policy for keys that occur more than once within one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeys {
    /// Treat later occurrences as additional matches for the same token and
    /// append their targets to the first entry.
    #[default]
    Concatenate,
    /// Fail the load with [`MalformedIndex::DuplicateKey`].
    Reject,
}

/// Options applied when assembling entries into a [`SearchIndex`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub duplicate_keys: DuplicateKeys,
}

/// An immutable, loaded search index fragment (or a merge of fragments).
///
/// Entries keep their original order; an auxiliary key map makes lookups
/// O(1). There is no mutation API after construction, so shared references
/// are safe across threads without synchronization.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
    by_key: AHashMap<String, usize>,
}

impl PartialEq for SearchIndex {
    fn eq(&self, other: &Self) -> bool {
        // by_key is derived from entries
        self.entries == other.entries
    }
}

impl Eq for SearchIndex {}

impl SearchIndex {
    /// Parses a fragment with the default duplicate-key policy.
    pub fn parse(src: &str) -> Result<Self, MalformedIndex> {
        Self::parse_with(src, ParseOptions::default())
    }

    /// Parses a fragment. All-or-nothing: on error no table is produced.
    pub fn parse_with(src: &str, options: ParseOptions) -> Result<Self, MalformedIndex> {
        let entries = parse::parse_table(src)?;
        Self::from_entries(entries, options)
    }

    /// Reads and parses a fragment file with the default options.
    pub fn load_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        Self::load_file_with(path, ParseOptions::default())
    }

    /// Reads and parses a fragment file, wrapping I/O and format errors
    /// with the offending path.
    pub fn load_file_with<P: AsRef<Path>>(
        path: P,
        options: ParseOptions,
    ) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading fragment {}", path.display()))?;
        Self::parse_with(&source, options)
            .with_context(|| format!("malformed fragment {}", path.display()))
    }

    /// Assembles an index from already-typed entries, applying the same
    /// validation as [`SearchIndex::parse_with`].
    pub fn from_entries(
        entries: Vec<IndexEntry>,
        options: ParseOptions,
    ) -> Result<Self, MalformedIndex> {
        let mut index = Self {
            entries: Vec::with_capacity(entries.len()),
            by_key: AHashMap::with_capacity(entries.len()),
        };
        for entry in entries {
            if entry.targets.is_empty() {
                return Err(MalformedIndex::EmptyTargets { key: entry.key });
            }
            match index.by_key.get(&entry.key) {
                Some(&pos) => match options.duplicate_keys {
                    DuplicateKeys::Reject => {
                        return Err(MalformedIndex::DuplicateKey { key: entry.key });
                    }
                    DuplicateKeys::Concatenate => {
                        index.entries[pos].targets.extend(entry.targets);
                    }
                },
                None => {
                    index.by_key.insert(entry.key.clone(), index.entries.len());
                    index.entries.push(entry);
                }
            }
        }
        Ok(index)
    }

    /// Exact-match lookup of `token` against entry keys.
    ///
    /// Returns the targets in their original order, or an empty slice if the
    /// token is absent. No partial matching and no case normalization beyond
    /// what the generator baked into the keys.
    pub fn lookup(&self, token: &str) -> &[Target] {
        self.by_key
            .get(token)
            .map_or(&[], |&pos| self.entries[pos].targets.as_slice())
    }

    /// Concatenates two fragments.
    ///
    /// On key collision the right operand's targets append to the left
    /// entry, preserving each operand's internal order; the left operand's
    /// display text wins. New keys append in the right operand's order.
    pub fn merge(mut self, other: Self) -> Self {
        tracing::debug!(
            left = self.entries.len(),
            right = other.entries.len(),
            "merging index fragments"
        );
        for entry in other.entries {
            match self.by_key.get(&entry.key) {
                Some(&pos) => self.entries[pos].targets.extend(entry.targets),
                None => {
                    self.by_key.insert(entry.key.clone(), self.entries.len());
                    self.entries.push(entry);
                }
            }
        }
        self
    }

    /// The entries in original order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes back to the `var searchData=` on-disk form.
    ///
    /// `SearchIndex::parse(index.to_js())` reproduces `index` exactly.
    pub fn to_js(&self) -> String {
        parse::serialize_table(&self.entries)
    }

    /// JSON export of the typed model, for tooling that does not speak the
    /// JS fragment format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}

impl<'a> IntoIterator for &'a SearchIndex {
    type Item = &'a IndexEntry;
    type IntoIter = std::slice::Iter<'a, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Escapes a symbol name into the key form used by the generator.
///
/// ASCII alphanumerics are lowercased; every other character is escaped as
/// `_` plus two lowercase hex digits per UTF-8 byte. The original artifact
/// pairs the key `valid_5fprefix` with the display text `valid_prefix`.
pub fn encode_key(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("_{byte:02x}"));
            }
        }
    }
    out
}

/// Reverses [`encode_key`]'s escaping.
///
/// Lossy with respect to the original casing, which the generator discards:
/// `decode_key(&encode_key("ValueBuilder")) == "valuebuilder"`.
pub fn decode_key(key: &str) -> Result<String, MalformedIndex> {
    let raw = key.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'_' {
            let hex = raw
                .get(i + 1..i + 3)
                .and_then(|pair| std::str::from_utf8(pair).ok())
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| MalformedIndex::syntax(i, "invalid key escape"))?;
            bytes.push(hex);
            i += 3;
        } else {
            bytes.push(raw[i]);
            i += 1;
        }
    }
    String::from_utf8(bytes).map_err(|_| MalformedIndex::syntax(0, "key is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn target(url: &str, label: &str) -> Target {
        Target {
            url: TargetUrl::parse(url),
            group_id: 1,
            label: label.to_string(),
        }
    }

    fn entry(key: &str, targets: Vec<Target>) -> IndexEntry {
        IndexEntry {
            key: key.to_string(),
            display: key.to_string(),
            targets,
        }
    }

    fn index(entries: Vec<IndexEntry>) -> SearchIndex {
        SearchIndex::from_entries(entries, ParseOptions::default()).unwrap()
    }

    #[test]
    fn lookup_returns_targets_in_order() {
        let idx = index(vec![entry(
            "view",
            vec![target("a.html#1", "A::view()"), target("b.html", "B::view()")],
        )]);
        let hits = idx.lookup("view");
        check!(hits.len() == 2);
        check!(hits[0].label == "A::view()");
        check!(hits[1].label == "B::view()");
    }

    #[test]
    fn lookup_missing_token_is_empty() {
        let idx = index(vec![entry("view", vec![target("a.html", "view()")])]);
        check!(idx.lookup("nonexistent").is_empty());
        check!(idx.lookup("VIEW").is_empty()); // keys are pre-normalized
    }

    #[test]
    fn empty_targets_rejected_programmatically() {
        let result = SearchIndex::from_entries(vec![entry("k", vec![])], ParseOptions::default());
        check!(result == Err(MalformedIndex::EmptyTargets { key: "k".into() }));
    }

    #[test]
    fn duplicate_keys_concatenate_by_default() {
        let idx = index(vec![
            entry("value", vec![target("a.html", "A::value()")]),
            entry("value", vec![target("b.html", "B::value()")]),
        ]);
        check!(idx.len() == 1);
        let labels: Vec<_> = idx.lookup("value").iter().map(|t| t.label.as_str()).collect();
        check!(labels == ["A::value()", "B::value()"]);
    }

    #[test]
    fn duplicate_keys_rejected_on_request() {
        let options = ParseOptions {
            duplicate_keys: DuplicateKeys::Reject,
        };
        let result = SearchIndex::from_entries(
            vec![
                entry("value", vec![target("a.html", "a")]),
                entry("value", vec![target("b.html", "b")]),
            ],
            options,
        );
        check!(result == Err(MalformedIndex::DuplicateKey { key: "value".into() }));
    }

    #[test]
    fn merge_concatenates_colliding_targets() {
        let a = index(vec![
            entry("vector", vec![target("a.html#1", "std::vector::vector()")]),
            entry("value", vec![target("v.html", "value()")]),
        ]);
        let b = index(vec![entry(
            "vector",
            vec![target("b.html#2", "std::__debug::vector::vector()")],
        )]);
        let merged = a.merge(b);
        check!(merged.len() == 2);
        let labels: Vec<_> = merged
            .lookup("vector")
            .iter()
            .map(|t| t.label.as_str())
            .collect();
        check!(labels == ["std::vector::vector()", "std::__debug::vector::vector()"]);
    }

    #[test]
    fn merge_appends_new_keys_in_right_order() {
        let a = index(vec![entry("alpha", vec![target("a.html", "a")])]);
        let b = index(vec![
            entry("gamma", vec![target("g.html", "g")]),
            entry("beta", vec![target("b.html", "b")]),
        ]);
        let keys: Vec<_> = a.merge(b).entries().iter().map(|e| e.key.clone()).collect();
        check!(keys == ["alpha", "gamma", "beta"]);
    }

    #[test]
    fn merge_is_associative() {
        let a = index(vec![
            entry("x", vec![target("a.html", "a::x")]),
            entry("y", vec![target("a.html", "a::y")]),
        ]);
        let b = index(vec![
            entry("y", vec![target("b.html", "b::y")]),
            entry("z", vec![target("b.html", "b::z")]),
        ]);
        let c = index(vec![
            entry("x", vec![target("c.html", "c::x")]),
            entry("z", vec![target("c.html", "c::z")]),
        ]);

        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.merge(b.merge(c));
        check!(left == right);
    }

    #[rstest]
    #[case("a00965.html#a67a4f", "a00965.html", Some("a67a4f"))]
    #[case("a00298.html", "a00298.html", None)]
    #[case("dir/page.html#frag#ment", "dir/page.html", Some("frag#ment"))]
    fn target_url_splits_on_first_hash(
        #[case] raw: &str,
        #[case] base: &str,
        #[case] anchor: Option<&str>,
    ) {
        let url = TargetUrl::parse(raw);
        check!(url.base == base);
        check!(url.anchor.as_deref() == anchor);
        check!(url.to_string() == raw);
    }

    #[rstest]
    #[case("valid_prefix", "valid_5fprefix")]
    #[case("ValueBuilder", "valuebuilder")]
    #[case("operator<<", "operator_3c_3c")]
    #[case("vector", "vector")]
    fn key_encoding(#[case] text: &str, #[case] key: &str) {
        check!(encode_key(text) == key);
    }

    #[rstest]
    #[case("valid_5fprefix", "valid_prefix")]
    #[case("operator_3c_3c", "operator<<")]
    #[case("vector", "vector")]
    fn key_decoding(#[case] key: &str, #[case] text: &str) {
        check!(decode_key(key).unwrap() == text);
    }

    #[rstest]
    #[case("bad_")]
    #[case("bad_z9")]
    fn key_decoding_rejects_invalid_escapes(#[case] key: &str) {
        check!(let Err(MalformedIndex::Syntax { .. }) = decode_key(key));
    }

    #[test]
    fn json_export_is_valid() {
        let idx = index(vec![entry("view", vec![target("a.html#1", "view()")])]);
        let json = idx.to_json().unwrap();
        let parsed: Vec<IndexEntry> = serde_json::from_str(&json).unwrap();
        check!(parsed == idx.entries());
    }
}
