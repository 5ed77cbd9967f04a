use std::fmt;
use std::sync::Arc;

use crate::catalog::{CatalogContext, ItemCatalog, Pending};
use crate::exchange::kittykeys::{self, KittyKeysOptions};
use crate::exchange::repcal::{self, DecodeReport};
use crate::exchange::{DescribedLoadout, json};
use crate::legacy;
use crate::loadout::Loadout;
use crate::resolver::{ItemResolver, ResolverConfig};

use super::error::{CoreError, CoreErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeFormat {
    Repcal,
    KittyKeys,
    Json,
    Legacy,
}

impl ExchangeFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Repcal => "repcal",
            Self::KittyKeys => "kittykeys",
            Self::Json => "json",
            Self::Legacy => "legacy",
        }
    }

    /// `Json` for text starting with `{`, otherwise `Repcal`.
    pub fn detect(text: &str) -> Self {
        if json::looks_like_json(text) {
            Self::Json
        } else {
            Self::Repcal
        }
    }
}

impl fmt::Display for ExchangeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub loadout: Loadout,
    pub report: DecodeReport,
}

/// Loadout codec front end.
///
/// Anything needing the catalog is sent to the [`CatalogContext`] as one
/// request per document: a whole encode, or a whole decode with every name
/// resolution batched inside it.
pub struct Engine {
    context: CatalogContext,
    resolver: Arc<ItemResolver>,
}

impl Engine {
    pub fn new<C>(catalog: C, config: ResolverConfig) -> Result<Self, CoreError>
    where
        C: ItemCatalog + Send + 'static,
    {
        Ok(Self {
            context: CatalogContext::spawn(catalog)?,
            resolver: Arc::new(ItemResolver::new(config)),
        })
    }

    pub fn resolver(&self) -> &ItemResolver {
        &self.resolver
    }

    /// Build the resolver's name index ahead of the first lookup. Yields the
    /// number of indexed names.
    pub fn warm_index(&self) -> Pending<usize> {
        let resolver = Arc::clone(&self.resolver);
        self.context.submit(move |catalog| resolver.index(catalog).len())
    }

    pub fn resolve(&self, name: &str) -> Pending<Option<i32>> {
        let resolver = Arc::clone(&self.resolver);
        let name = name.to_string();
        self.context
            .submit(move |catalog| resolver.resolve(catalog, &name))
    }

    pub fn describe(&self, loadout: &Loadout) -> Pending<DescribedLoadout> {
        let resolver = Arc::clone(&self.resolver);
        let loadout = loadout.clone();
        self.context
            .submit(move |catalog| DescribedLoadout::describe(catalog, &resolver, &loadout))
    }

    pub fn encode_repcal(&self, loadout: &Loadout) -> Pending<String> {
        let resolver = Arc::clone(&self.resolver);
        let loadout = loadout.clone();
        self.context.submit(move |catalog| {
            repcal::encode(&DescribedLoadout::describe(catalog, &resolver, &loadout))
        })
    }

    pub fn encode_kittykeys(&self, loadout: &Loadout, options: KittyKeysOptions) -> Pending<String> {
        let resolver = Arc::clone(&self.resolver);
        let loadout = loadout.clone();
        self.context.submit(move |catalog| {
            let described = DescribedLoadout::describe(catalog, &resolver, &loadout);
            kittykeys::encode(&described, &options)
        })
    }

    /// Decode Repcal `text` over `loadout`.
    pub fn decode_repcal(&self, text: &str, loadout: Loadout) -> Pending<DecodeOutcome> {
        let resolver = Arc::clone(&self.resolver);
        let entries = repcal::parse(text);
        self.context
            .submit(move |catalog| apply_entries(catalog, &resolver, &entries, loadout))
    }

    /// Like [`Engine::decode_repcal`], handing the outcome to `on_complete`
    /// on the catalog context instead of returning a handle.
    pub fn decode_repcal_with<K>(&self, text: &str, loadout: Loadout, on_complete: K)
    where
        K: FnOnce(DecodeOutcome) + Send + 'static,
    {
        let resolver = Arc::clone(&self.resolver);
        let entries = repcal::parse(text);
        self.context.submit_with(
            move |catalog: &dyn ItemCatalog| apply_entries(catalog, &resolver, &entries, loadout),
            on_complete,
        );
    }

    /// Encode `loadout` in `format`, waiting for the catalog when needed.
    pub fn export(
        &self,
        format: ExchangeFormat,
        loadout: &Loadout,
        options: KittyKeysOptions,
    ) -> Result<String, CoreError> {
        match format {
            ExchangeFormat::Repcal => self.encode_repcal(loadout).wait(),
            ExchangeFormat::KittyKeys => self.encode_kittykeys(loadout, options).wait(),
            ExchangeFormat::Json => json::export(loadout),
            ExchangeFormat::Legacy => Ok(format!("{}\n", legacy::encode(loadout))),
        }
    }

    /// Import `text` into `target`, keeping `target`'s name and slot counts.
    ///
    /// `format` defaults to [`ExchangeFormat::detect`]. JSON and legacy
    /// documents replace every slot and fail as a whole; Repcal replaces only
    /// the slots it names and reports per-line problems in the outcome.
    pub fn import(
        &self,
        format: Option<ExchangeFormat>,
        text: &str,
        mut target: Loadout,
    ) -> Result<DecodeOutcome, CoreError> {
        let equipment_slots = target.equipment_slot_count();
        let inventory_slots = target.inventory_slot_count();
        let replaced = match format.unwrap_or_else(|| ExchangeFormat::detect(text)) {
            ExchangeFormat::Repcal => {
                if repcal::parse(text).is_empty() {
                    return Err(CoreError::new(CoreErrorCode::Parse, "No valid lines found."));
                }
                return self.decode_repcal(text, target).wait();
            }
            ExchangeFormat::KittyKeys => {
                return Err(CoreError::new(
                    CoreErrorCode::UnsupportedOperation,
                    "KittyKeys scripts cannot be imported",
                ));
            }
            ExchangeFormat::Json => json::import(text, equipment_slots, inventory_slots)?,
            ExchangeFormat::Legacy => legacy::decode(text.trim(), equipment_slots, inventory_slots)
                .ok_or_else(|| {
                    CoreError::new(
                        CoreErrorCode::Parse,
                        "legacy storage string must have 3 or 5 fields",
                    )
                })?,
        };
        replaced.copy_into(&mut target);
        Ok(DecodeOutcome {
            loadout: target,
            report: DecodeReport::default(),
        })
    }
}

fn apply_entries(
    catalog: &dyn ItemCatalog,
    resolver: &ItemResolver,
    entries: &[repcal::ImportEntry],
    mut loadout: Loadout,
) -> DecodeOutcome {
    let report = repcal::apply(&mut loadout, entries, |name| {
        resolver
            .resolve(catalog, name)
            .map(|id| (id, resolver.is_stackable(catalog, id)))
    });
    DecodeOutcome { loadout, report }
}
