pub mod catalog;
pub mod core_api;
pub mod exchange;
pub mod legacy;
pub mod loadout;
pub mod resolver;
pub mod slot;
pub mod store;

pub use catalog::{CatalogDump, ItemCatalog};
pub use core_api::{CoreError, CoreErrorCode, DecodeOutcome, Engine, ExchangeFormat};
pub use loadout::Loadout;
pub use resolver::{ItemResolver, ResolverConfig};
pub use store::{LoadoutStore, StoreOptions};
