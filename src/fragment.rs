//! Fragment naming convention and bulk loading of search directories.
//!
//! A generated documentation tree keeps its search index sharded under
//! `search/`, one file per category and key bucket: `functions_15.js`,
//! `classes_0.js`, `variables_a.js`, and so on. The kind names the symbol
//! category; the shard suffix is a lowercase-hex bucket index.

use crate::error::Result;
use crate::model::{ParseOptions, SearchIndex, Target};
use anyhow::Context;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static FRAGMENT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]+)_([0-9a-f]+)\.js$").expect("fragment name regex"));

/// Symbol category of a fragment, from the file-name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FragmentKind {
    All,
    Classes,
    Defines,
    Enums,
    EnumValues,
    Events,
    Files,
    Functions,
    Groups,
    Namespaces,
    Pages,
    Properties,
    Related,
    Typedefs,
    Variables,
}

/// Error for an unrecognized fragment category name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown fragment kind '{0}'")]
pub struct UnknownFragmentKind(pub String);

impl FragmentKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Classes => "classes",
            Self::Defines => "defines",
            Self::Enums => "enums",
            Self::EnumValues => "enumvalues",
            Self::Events => "events",
            Self::Files => "files",
            Self::Functions => "functions",
            Self::Groups => "groups",
            Self::Namespaces => "namespaces",
            Self::Pages => "pages",
            Self::Properties => "properties",
            Self::Related => "related",
            Self::Typedefs => "typedefs",
            Self::Variables => "variables",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FragmentKind {
    type Err = UnknownFragmentKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "classes" => Ok(Self::Classes),
            "defines" => Ok(Self::Defines),
            "enums" => Ok(Self::Enums),
            "enumvalues" => Ok(Self::EnumValues),
            "events" => Ok(Self::Events),
            "files" => Ok(Self::Files),
            "functions" => Ok(Self::Functions),
            "groups" => Ok(Self::Groups),
            "namespaces" => Ok(Self::Namespaces),
            "pages" => Ok(Self::Pages),
            "properties" => Ok(Self::Properties),
            "related" => Ok(Self::Related),
            "typedefs" => Ok(Self::Typedefs),
            "variables" => Ok(Self::Variables),
            other => Err(UnknownFragmentKind(other.to_string())),
        }
    }
}

/// A parsed fragment file name: category plus hex bucket index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FragmentName {
    pub kind: FragmentKind,
    pub shard: u32,
}

impl FragmentName {
    /// Parses `<kind>_<shard>.js`. Returns `None` for anything else, so
    /// unrelated files in a search directory can be skipped rather than
    /// treated as errors.
    pub fn parse(file_name: &str) -> Option<Self> {
        let captures = FRAGMENT_NAME.captures(file_name)?;
        let kind = captures[1].parse().ok()?;
        let shard = u32::from_str_radix(&captures[2], 16).ok()?;
        Some(Self { kind, shard })
    }
}

impl fmt::Display for FragmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:x}.js", self.kind, self.shard)
    }
}

/// All search indexes of one documentation tree, keyed by category.
///
/// Shards of the same kind are merged at load time, in ascending shard
/// order, so lookups see one table per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentSet {
    indexes: BTreeMap<FragmentKind, SearchIndex>,
}

impl FragmentSet {
    /// Loads every fragment in a `search/` directory with default options.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        Self::load_dir_with(dir, ParseOptions::default())
    }

    /// Loads every fragment in a `search/` directory.
    ///
    /// Non-fragment files are skipped. A malformed fragment fails the whole
    /// load, naming the offending file; no partial set is returned.
    pub fn load_dir_with(dir: &Path, options: ParseOptions) -> Result<Self> {
        let mut fragments: Vec<(FragmentName, PathBuf)> = Vec::new();
        let listing = fs::read_dir(dir)
            .with_context(|| format!("reading search directory {}", dir.display()))?;
        for dirent in listing {
            let dirent =
                dirent.with_context(|| format!("reading search directory {}", dir.display()))?;
            match dirent.file_name().to_str().and_then(FragmentName::parse) {
                Some(name) => fragments.push((name, dirent.path())),
                None => {
                    tracing::debug!("skipping non-fragment file {:?}", dirent.file_name());
                }
            }
        }

        // Kind groups shards; ascending shard order makes merges deterministic.
        fragments.sort_unstable_by_key(|(name, _)| *name);

        let mut indexes: BTreeMap<FragmentKind, SearchIndex> = BTreeMap::new();
        for (name, path) in fragments {
            let index = SearchIndex::load_file_with(&path, options)?;
            tracing::debug!(
                fragment = %name,
                entries = index.len(),
                "loaded search index fragment"
            );
            let merged = match indexes.remove(&name.kind) {
                Some(existing) => existing.merge(index),
                None => index,
            };
            indexes.insert(name.kind, merged);
        }

        tracing::info!(
            kinds = indexes.len(),
            "loaded search indexes from {}",
            dir.display()
        );
        Ok(Self { indexes })
    }

    /// The merged index for one category, if any fragment of that kind was
    /// present.
    pub fn index(&self, kind: FragmentKind) -> Option<&SearchIndex> {
        self.indexes.get(&kind)
    }

    /// Categories present in this set, in `FragmentKind` order.
    pub fn kinds(&self) -> impl Iterator<Item = FragmentKind> + '_ {
        self.indexes.keys().copied()
    }

    /// Exact-match lookup within one category.
    pub fn lookup(&self, kind: FragmentKind, token: &str) -> &[Target] {
        self.indexes.get(&kind).map_or(&[], |index| index.lookup(token))
    }

    /// Exact-match lookup across every category, in `FragmentKind` order.
    pub fn lookup_all<'a>(&'a self, token: &str) -> Vec<(FragmentKind, &'a Target)> {
        self.indexes
            .iter()
            .flat_map(|(&kind, index)| {
                index.lookup(token).iter().map(move |target| (kind, target))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}
