use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

use super::{ItemCatalog, ItemComposition};
use crate::core_api::{CoreError, CoreErrorCode};

const SEARCH_LIMIT: usize = 250;
const MAX_CANONICAL_HOPS: usize = 8;

/// One item as written in a catalog dump file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default)]
    pub noted: bool,
    #[serde(default)]
    pub placeholder: bool,
    #[serde(default)]
    pub members: bool,
    #[serde(default)]
    pub actions: Vec<String>,
    /// Base item id for noted and placeholder variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<i32>,
}

impl CatalogRecord {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            stackable: false,
            noted: false,
            placeholder: false,
            members: false,
            actions: Vec::new(),
            canonical: None,
        }
    }

    pub fn stackable(mut self) -> Self {
        self.stackable = true;
        self
    }

    pub fn members(mut self) -> Self {
        self.members = true;
        self
    }

    pub fn noted_of(mut self, base: i32) -> Self {
        self.noted = true;
        self.canonical = Some(base);
        self
    }

    pub fn placeholder_of(mut self, base: i32) -> Self {
        self.placeholder = true;
        self.canonical = Some(base);
        self
    }
}

/// In-memory item catalog loaded from a JSON dump (a top-level array of
/// [`CatalogRecord`]s). Files ending in `.gz` are gzip-decoded first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogDump {
    entries: BTreeMap<i32, CatalogRecord>,
}

impl CatalogDump {
    pub fn from_records(records: Vec<CatalogRecord>) -> Self {
        let entries = records.into_iter().map(|r| (r.id, r)).collect();
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let file = File::open(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to open catalog {}: {e}", path.display()),
            )
        })?;
        let reader: Box<dyn Read> = if is_gzip_path(path) {
            Box::new(GzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        let records: Vec<CatalogRecord> = serde_json::from_reader(reader).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Parse,
                format!("failed to parse catalog {}: {e}", path.display()),
            )
        })?;
        if records.is_empty() {
            return Err(CoreError::new(
                CoreErrorCode::Parse,
                format!("catalog {} contains no items", path.display()),
            ));
        }
        Ok(Self::from_records(records))
    }

    pub fn get(&self, id: i32) -> Option<&CatalogRecord> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ItemCatalog for CatalogDump {
    fn canonicalize(&self, id: i32) -> i32 {
        let mut current = id;
        for _ in 0..MAX_CANONICAL_HOPS {
            match self.entries.get(&current).and_then(|r| r.canonical) {
                Some(base) if base != current => current = base,
                _ => break,
            }
        }
        current
    }

    fn composition(&self, id: i32) -> Option<ItemComposition> {
        self.entries.get(&id).map(|record| ItemComposition {
            name: record.name.clone(),
            stackable: record.stackable,
            noted: record.noted,
            placeholder: record.placeholder,
            members: record.members,
            actions: record.actions.clone(),
        })
    }

    fn search(&self, query: &str) -> Vec<i32> {
        let tokens: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(|t| t.replace('*', ""))
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::new();
        if let [single] = tokens.as_slice()
            && let Ok(id) = single.parse::<i32>()
            && self.entries.contains_key(&id)
        {
            out.push(id);
        }

        for record in self.entries.values() {
            if out.len() >= SEARCH_LIMIT {
                break;
            }
            let name = record.name.to_lowercase();
            if tokens.iter().all(|t| name.contains(t.as_str())) && !out.contains(&record.id) {
                out.push(record.id);
            }
        }
        out
    }
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
