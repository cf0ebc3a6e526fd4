//! Typed loader for Doxygen-style documentation search index fragments.
//!
//! A generated documentation tree ships its client-side search index as
//! `search/*.js` fragments, each a `var searchData= [...]` table mapping
//! lowercase tokens to destination links and display labels. This crate
//! loads those fragments into a typed, validated model, answers exact-match
//! token lookups, merges fragments, and serializes back to the same format.
//!
//! ```no_run
//! use searchdata::{FragmentKind, FragmentSet};
//!
//! # fn main() -> searchdata::Result<()> {
//! let set = FragmentSet::load_dir("docs/html/search".as_ref())?;
//! for target in set.lookup(FragmentKind::Functions, "vector") {
//!     println!("{} -> {}", target.label, target.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fragment;
pub mod model;
mod parse;
pub mod tracing;

pub use error::{MalformedIndex, Result};
pub use fragment::{FragmentKind, FragmentName, FragmentSet, UnknownFragmentKind};
pub use model::{
    DuplicateKeys, IndexEntry, ParseOptions, SearchIndex, Target, TargetUrl, decode_key,
    encode_key,
};
