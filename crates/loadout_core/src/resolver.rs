//! Free-text item name to catalog id resolution.
//!
//! Resolution order, first hit wins:
//!
//! 1. a positive integer naming an existing item is taken as that id;
//! 2. a name ending in `(` tries the dose variants `(4)`, `(3)`, `(2)`, `(1)`;
//! 3. exact case-insensitive lookup in the memoized [`NameIndex`];
//! 4. an exact case-insensitive name among the catalog's search results;
//! 5. the best-scoring candidate among the search results, or among index
//!    names sharing the query as a prefix when the search found nothing.
//!
//! Every method taking `&dyn ItemCatalog` must run inside the catalog's
//! serial context.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{ItemCatalog, ItemComposition, clean_display_name};
use crate::core_api::forced_stackables;
use crate::core_api::{CoreError, CoreErrorCode};

pub const DEFAULT_MAX_ITEM_ID: i32 = 50_000;
pub const DEFAULT_PREFIX_CANDIDATE_LIMIT: usize = 200;

const DOSE_SUFFIXES: [&str; 4] = ["(4)", "(3)", "(2)", "(1)"];

const EXACT_NAME_BONUS: f64 = 200.0;
const PREFIX_BONUS: f64 = 40.0;
const LENGTH_PENALTY_PER_CHAR: f64 = 1.1;
const NOTED_PENALTY: f64 = 20.0;
const PLACEHOLDER_PENALTY: f64 = 20.0;
const FREE_TO_PLAY_BONUS: f64 = 2.0;
const RAW_PENALTY: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Highest id scanned when building the name index.
    pub max_item_id: i32,
    /// Cap on index names considered by the prefix-scan fallback.
    pub prefix_candidate_limit: usize,
    /// Ids treated as stackable regardless of what the catalog reports.
    pub forced_stackables: BTreeSet<i32>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_item_id: DEFAULT_MAX_ITEM_ID,
            prefix_candidate_limit: DEFAULT_PREFIX_CANDIDATE_LIMIT,
            forced_stackables: forced_stackables::default_ids(),
        }
    }
}

impl ResolverConfig {
    /// Read a JSON configuration file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read resolver config {}: {e}", path.display()),
            )
        })?;
        serde_json::from_str(&text).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Parse,
                format!("invalid resolver config {}: {e}", path.display()),
            )
        })
    }
}

/// Lowercased display name to id, built by scanning `0..=max_item_id`.
///
/// When several ids share a display name the first one scanned wins, which is
/// the lowest id rather than the most relevant variant.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    by_name: HashMap<String, i32>,
    names: Vec<(String, i32)>,
}

impl NameIndex {
    pub fn build(catalog: &dyn ItemCatalog, max_item_id: i32) -> Self {
        let mut index = Self::default();
        for id in 0..=max_item_id {
            let Some(composition) = catalog.composition(id) else {
                continue;
            };
            let name = clean_display_name(&composition.name);
            if name.is_empty() {
                continue;
            }
            index.insert(name.to_lowercase(), catalog.canonicalize(id));
        }
        index
    }

    fn insert(&mut self, lower_name: String, id: i32) {
        if self.by_name.contains_key(&lower_name) {
            return;
        }
        self.by_name.insert(lower_name.clone(), id);
        self.names.push((lower_name, id));
    }

    pub fn get(&self, lower_name: &str) -> Option<i32> {
        self.by_name.get(lower_name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn prefix_matches(&self, lower_prefix: &str, limit: usize) -> Vec<i32> {
        self.names
            .iter()
            .filter(|(name, _)| name.starts_with(lower_prefix))
            .map(|(_, id)| *id)
            .take(limit)
            .collect()
    }
}

pub struct ItemResolver {
    config: ResolverConfig,
    index: Mutex<Option<Arc<NameIndex>>>,
    index_built: AtomicBool,
}

impl ItemResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            index: Mutex::new(None),
            index_built: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn is_index_built(&self) -> bool {
        self.index_built.load(Ordering::Acquire)
    }

    /// The memoized index, building it on first use. Concurrent first callers
    /// wait for the one build instead of scanning again.
    pub fn index(&self, catalog: &dyn ItemCatalog) -> Arc<NameIndex> {
        let mut slot = self.index.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = slot.as_ref() {
            return Arc::clone(index);
        }
        let index = Arc::new(self.scan(catalog));
        *slot = Some(Arc::clone(&index));
        self.index_built.store(true, Ordering::Release);
        index
    }

    pub fn rebuild_index(&self, catalog: &dyn ItemCatalog) -> Arc<NameIndex> {
        let mut slot = self.index.lock().unwrap_or_else(PoisonError::into_inner);
        let index = Arc::new(self.scan(catalog));
        *slot = Some(Arc::clone(&index));
        self.index_built.store(true, Ordering::Release);
        index
    }

    pub fn invalidate_index(&self) {
        let mut slot = self.index.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        self.index_built.store(false, Ordering::Release);
    }

    fn scan(&self, catalog: &dyn ItemCatalog) -> NameIndex {
        info!(max_item_id = self.config.max_item_id, "building item name index");
        let index = NameIndex::build(catalog, self.config.max_item_id);
        info!(names = index.len(), "item name index built");
        index
    }

    pub fn resolve(&self, catalog: &dyn ItemCatalog, name: &str) -> Option<i32> {
        let query = name.trim();
        if query.is_empty() {
            return None;
        }

        if let Ok(id) = query.parse::<i32>()
            && id > 0
            && catalog.composition(id).is_some()
        {
            debug!(name = query, id, "resolved numeric item id");
            return Some(catalog.canonicalize(id));
        }

        let lower = clean_display_name(query).to_lowercase();
        if lower.is_empty() {
            return None;
        }
        let index = self.index(catalog);

        if let Some(stem) = lower.strip_suffix('(') {
            for suffix in DOSE_SUFFIXES {
                if let Some(id) = index.get(&format!("{stem}{suffix}")) {
                    debug!(name = query, id, suffix, "resolved by dose heuristic");
                    return Some(id);
                }
            }
        }

        if let Some(id) = index.get(&lower) {
            debug!(name = query, id, "resolved from name index");
            return Some(id);
        }

        let results = catalog.search(query);
        if let Some(id) = exact_search_match(catalog, &results, &lower) {
            debug!(name = query, id, "resolved from catalog search");
            return Some(id);
        }

        let candidates = if results.is_empty() {
            index.prefix_matches(&lower, self.config.prefix_candidate_limit)
        } else {
            results
        };
        let best = best_candidate(catalog, &candidates, &lower);
        match best {
            Some(id) => debug!(name = query, id, "resolved by candidate scoring"),
            None => debug!(name = query, "could not resolve item name"),
        }
        best
    }

    /// Whether the item occupies a single inventory slot whatever its quantity.
    pub fn is_stackable(&self, catalog: &dyn ItemCatalog, id: i32) -> bool {
        if id <= 0 {
            return false;
        }
        let forced = &self.config.forced_stackables;
        if forced.contains(&id) || forced.contains(&catalog.canonicalize(id)) {
            return true;
        }
        catalog
            .composition(id)
            .is_some_and(|c| c.stackable || c.noted)
    }

    /// Cleaned display name for `id`, or `"Item <id>"` when the catalog has none.
    pub fn display_name(&self, catalog: &dyn ItemCatalog, id: i32) -> String {
        let name = catalog
            .composition(id)
            .or_else(|| catalog.composition(catalog.canonicalize(id)))
            .map(|c| clean_display_name(&c.name))
            .unwrap_or_default();
        if name.is_empty() {
            format!("Item {id}")
        } else {
            name
        }
    }
}

impl Default for ItemResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

fn exact_search_match(catalog: &dyn ItemCatalog, results: &[i32], lower: &str) -> Option<i32> {
    let matches: Vec<i32> = results
        .iter()
        .copied()
        .filter(|&id| id > 0)
        .filter(|&id| {
            catalog
                .composition(id)
                .is_some_and(|c| clean_display_name(&c.name).to_lowercase() == lower)
        })
        .collect();
    let first = *matches.first()?;
    let preferred = matches
        .iter()
        .copied()
        .find(|&id| catalog.canonicalize(id) == id)
        .unwrap_or_else(|| catalog.canonicalize(first));
    Some(preferred)
}

fn best_candidate(catalog: &dyn ItemCatalog, candidates: &[i32], lower: &str) -> Option<i32> {
    let mut best: Option<(i32, f64)> = None;
    for &id in candidates {
        if id <= 0 {
            continue;
        }
        let Some(composition) = catalog.composition(id) else {
            continue;
        };
        let score = score_candidate(lower, &composition);
        if score == f64::NEG_INFINITY {
            continue;
        }
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((id, score));
        }
    }
    best.map(|(id, _)| catalog.canonicalize(id))
}

/// Relevance of `candidate` for the lowercased query; higher is better.
/// Unnamed candidates score negative infinity.
pub fn score_candidate(query_lower: &str, candidate: &ItemComposition) -> f64 {
    let name = clean_display_name(&candidate.name).to_lowercase();
    if name.is_empty() {
        return f64::NEG_INFINITY;
    }

    let mut score = 0.0;
    if name == query_lower {
        score += EXACT_NAME_BONUS;
    } else if name.starts_with(query_lower) {
        score += PREFIX_BONUS;
    }
    let length_gap = name.chars().count().abs_diff(query_lower.chars().count());
    score -= LENGTH_PENALTY_PER_CHAR * length_gap as f64;
    if candidate.noted {
        score -= NOTED_PENALTY;
    }
    if candidate.placeholder {
        score -= PLACEHOLDER_PENALTY;
    }
    if !candidate.members {
        score += FREE_TO_PLAY_BONUS;
    }
    if name.starts_with("raw ") && !query_lower.starts_with("raw ") {
        score -= RAW_PENALTY;
    }
    score
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::{ItemResolver, NameIndex, ResolverConfig, score_candidate};
    use crate::catalog::{CatalogDump, CatalogRecord, ItemCatalog, ItemComposition};

    struct CountingCatalog {
        inner: CatalogDump,
        lookups: Cell<usize>,
        search_results: Option<Vec<i32>>,
    }

    impl CountingCatalog {
        fn new(records: Vec<CatalogRecord>) -> Self {
            Self {
                inner: CatalogDump::from_records(records),
                lookups: Cell::new(0),
                search_results: None,
            }
        }
    }

    impl ItemCatalog for CountingCatalog {
        fn canonicalize(&self, id: i32) -> i32 {
            self.inner.canonicalize(id)
        }

        fn composition(&self, id: i32) -> Option<ItemComposition> {
            self.lookups.set(self.lookups.get() + 1);
            self.inner.composition(id)
        }

        fn search(&self, query: &str) -> Vec<i32> {
            match &self.search_results {
                Some(results) => results.clone(),
                None => self.inner.search(query),
            }
        }
    }

    fn small_config() -> ResolverConfig {
        ResolverConfig {
            max_item_id: 13_000,
            ..ResolverConfig::default()
        }
    }

    fn potions() -> Vec<CatalogRecord> {
        vec![
            CatalogRecord::new(3030, "Super restore(1)"),
            CatalogRecord::new(3024, "Super restore(4)"),
            CatalogRecord::new(3025, "Super restore(4)").noted_of(3024),
            CatalogRecord::new(385, "Shark"),
            CatalogRecord::new(386, "Shark").noted_of(385),
        ]
    }

    #[test]
    fn dose_heuristic_prefers_highest_dose() {
        let catalog = CountingCatalog::new(potions());
        let resolver = ItemResolver::new(small_config());
        assert_eq!(resolver.resolve(&catalog, "Super restore("), Some(3024));
    }

    #[test]
    fn exact_name_is_case_insensitive() {
        let catalog = CountingCatalog::new(potions());
        let resolver = ItemResolver::new(small_config());
        assert_eq!(resolver.resolve(&catalog, "  sHaRk "), Some(385));
        assert_eq!(resolver.resolve(&catalog, "Nonexistent thing"), None);
        assert_eq!(resolver.resolve(&catalog, ""), None);
    }

    #[test]
    fn numeric_name_resolves_existing_id() {
        let catalog = CountingCatalog::new(potions());
        let resolver = ItemResolver::new(small_config());
        assert_eq!(resolver.resolve(&catalog, "386"), Some(385));
        assert_eq!(resolver.resolve(&catalog, "999999"), None);
    }

    #[test]
    fn index_is_built_once() {
        let catalog = CountingCatalog::new(potions());
        let resolver = ItemResolver::new(small_config());
        assert!(!resolver.is_index_built());

        resolver.resolve(&catalog, "Shark");
        assert!(resolver.is_index_built());
        let after_first = catalog.lookups.get();
        assert!(after_first > 13_000);

        resolver.resolve(&catalog, "Shark");
        resolver.resolve(&catalog, "super restore(1)");
        assert!(catalog.lookups.get() - after_first < 10);

        resolver.invalidate_index();
        assert!(!resolver.is_index_built());
        resolver.resolve(&catalog, "Shark");
        assert!(catalog.lookups.get() - after_first > 13_000);
    }

    #[test]
    fn duplicate_names_keep_first_scanned_id() {
        let catalog = CatalogDump::from_records(vec![
            CatalogRecord::new(20, "Dragon dagger"),
            CatalogRecord::new(10, "Dragon dagger"),
        ]);
        let index = NameIndex::build(&catalog, 100);
        assert_eq!(index.get("dragon dagger"), Some(10));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn search_exact_match_prefers_canonical_id() {
        let mut catalog = CountingCatalog::new(vec![
            CatalogRecord::new(200, "Rune scimitar"),
            CatalogRecord::new(201, "Rune scimitar").noted_of(200),
        ]);
        // The index only scans up to 100, so resolution must go through search.
        catalog.search_results = Some(vec![201, 200]);
        let resolver = ItemResolver::new(ResolverConfig {
            max_item_id: 100,
            ..ResolverConfig::default()
        });
        assert_eq!(resolver.resolve(&catalog, "rune scimitar"), Some(200));
    }

    #[test]
    fn scoring_prefers_unnoted_prefix_match() {
        let mut catalog = CountingCatalog::new(vec![
            CatalogRecord::new(1, "Raw shark"),
            CatalogRecord::new(2, "Shark lure").noted_of(3),
            CatalogRecord::new(3, "Shark lure"),
            CatalogRecord::new(4, "Sharks tooth necklace"),
        ]);
        catalog.search_results = Some(vec![1, 2, 3, 4]);
        let resolver = ItemResolver::new(ResolverConfig {
            max_item_id: 0,
            ..ResolverConfig::default()
        });
        assert_eq!(resolver.resolve(&catalog, "shark"), Some(3));
    }

    #[test]
    fn scored_variant_resolves_to_canonical_id() {
        let mut catalog = CountingCatalog::new(vec![
            CatalogRecord::new(385, "Shark"),
            CatalogRecord::new(386, "Shark").noted_of(385),
        ]);
        catalog.search_results = Some(vec![386]);
        let resolver = ItemResolver::new(ResolverConfig {
            max_item_id: 0,
            ..ResolverConfig::default()
        });
        assert_eq!(resolver.resolve(&catalog, "shark"), Some(385));
        assert_eq!(resolver.resolve(&catalog, "shar"), Some(385));
    }

    #[test]
    fn prefix_scan_is_used_when_search_is_empty() {
        let mut catalog = CountingCatalog::new(vec![
            CatalogRecord::new(5, "Dragon scimitar"),
            CatalogRecord::new(6, "Dragon scimitar (or)"),
        ]);
        catalog.search_results = Some(Vec::new());
        let resolver = ItemResolver::new(ResolverConfig {
            max_item_id: 10,
            ..ResolverConfig::default()
        });
        assert_eq!(resolver.resolve(&catalog, "dragon scim"), Some(5));
    }

    #[test]
    fn score_components() {
        let plain = ItemComposition {
            name: "Shark".to_string(),
            stackable: false,
            noted: false,
            placeholder: false,
            members: true,
            actions: Vec::new(),
        };
        assert_eq!(score_candidate("shark", &plain), 200.0);

        let raw = ItemComposition {
            name: "Raw shark".to_string(),
            ..plain.clone()
        };
        assert!(score_candidate("shark", &raw) < 0.0);
        assert!(score_candidate("raw shark", &raw) > 199.0);

        let unnamed = ItemComposition {
            name: "null".to_string(),
            ..plain
        };
        assert_eq!(score_candidate("shark", &unnamed), f64::NEG_INFINITY);
    }

    #[test]
    fn stackability_combines_catalog_and_overrides() {
        let catalog = CatalogDump::from_records(vec![
            CatalogRecord::new(385, "Shark"),
            CatalogRecord::new(386, "Shark").noted_of(385),
            CatalogRecord::new(892, "Rune arrow").stackable(),
            CatalogRecord::new(995, "Coins"),
        ]);
        let resolver = ItemResolver::default();
        assert!(!resolver.is_stackable(&catalog, 385));
        assert!(resolver.is_stackable(&catalog, 386));
        assert!(resolver.is_stackable(&catalog, 892));
        assert!(resolver.is_stackable(&catalog, 995));
        assert!(!resolver.is_stackable(&catalog, -1));
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let catalog = CatalogDump::from_records(vec![
            CatalogRecord::new(4151, "Abyssal whip (Members)"),
            CatalogRecord::new(7, "null"),
        ]);
        let resolver = ItemResolver::default();
        assert_eq!(resolver.display_name(&catalog, 4151), "Abyssal whip");
        assert_eq!(resolver.display_name(&catalog, 7), "Item 7");
        assert_eq!(resolver.display_name(&catalog, 8), "Item 8");
    }
}
