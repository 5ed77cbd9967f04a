//! The narrow view of the external item catalog that the rest of the crate
//! relies on.
//!
//! Implementations are only ever called from inside a [`CatalogContext`]; the
//! trait itself therefore needs no `Sync` bound.

mod context;
mod dump;

pub use context::{CatalogContext, Pending};
pub use dump::{CatalogDump, CatalogRecord};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemComposition {
    pub name: String,
    pub stackable: bool,
    pub noted: bool,
    pub placeholder: bool,
    pub members: bool,
    pub actions: Vec<String>,
}

pub trait ItemCatalog {
    /// Base id for noted and other variant ids. Must be idempotent.
    fn canonicalize(&self, id: i32) -> i32;

    fn composition(&self, id: i32) -> Option<ItemComposition>;

    /// Best-effort free-text search. Results are ordered by relevance as the
    /// catalog sees it and may omit valid matches.
    fn search(&self, query: &str) -> Vec<i32>;
}

const MEMBERS_SUFFIX: &str = " (members)";

/// Display name as used in text protocols: a trailing `" (Members)"` is
/// dropped and the literal `"null"` counts as no name.
pub fn clean_display_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_suffix = match trimmed.len().checked_sub(MEMBERS_SUFFIX.len()) {
        Some(cut)
            if trimmed.is_char_boundary(cut)
                && trimmed[cut..].eq_ignore_ascii_case(MEMBERS_SUFFIX) =>
        {
            trimmed[..cut].trim_end()
        }
        _ => trimmed,
    };
    if without_suffix.eq_ignore_ascii_case("null") {
        return String::new();
    }
    without_suffix.to_string()
}
