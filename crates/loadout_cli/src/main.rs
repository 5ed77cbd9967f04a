use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use loadout_core::catalog::CatalogDump;
use loadout_core::core_api::{Engine, ExchangeFormat};
use loadout_core::exchange::DescribedLoadout;
use loadout_core::exchange::json;
use loadout_core::exchange::kittykeys::{DEFAULT_TICKS, KittyKeysOptions, WieldVerb};
use loadout_core::resolver::ResolverConfig;
use loadout_core::slot::EquipmentSlot;
use loadout_core::store::{LoadoutStore, StoreOptions};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Repcal,
    Kittykeys,
    Json,
    Legacy,
}

impl FormatArg {
    fn to_core(self) -> ExchangeFormat {
        match self {
            Self::Repcal => ExchangeFormat::Repcal,
            Self::Kittykeys => ExchangeFormat::KittyKeys,
            Self::Json => ExchangeFormat::Json,
            Self::Legacy => ExchangeFormat::Legacy,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Directory holding `loadouts/`, `loadouts.dat` and the backup mirror.
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,
    /// Item catalog dump (JSON array, optionally `.gz`).
    #[arg(long, value_name = "PATH", global = true)]
    catalog: Option<PathBuf>,
    /// Resolver configuration (JSON).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List stored loadouts.
    List,
    /// Print one loadout.
    Show {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Write a loadout to stdout in an exchange format.
    Export {
        name: String,
        #[arg(long, value_enum)]
        format: FormatArg,
        /// KittyKeys TICK lines per pause; 0 uses blank lines.
        #[arg(long, default_value_t = DEFAULT_TICKS)]
        ticks: usize,
        /// KittyKeys: BANK_EQUIP instead of BANK_WIELD.
        #[arg(long)]
        equip: bool,
    },
    /// Import text into a loadout, creating it if needed.
    Import {
        name: String,
        /// Read from this file instead of stdin.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Defaults to JSON for `{...}` input and Repcal otherwise.
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    Rename {
        old: String,
        new: String,
    },
    Delete {
        name: String,
    },
    /// Resolve a free-text item name to a catalog id.
    Resolve {
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let base_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(StoreOptions::default_base_dir);
    let mut store = LoadoutStore::open(StoreOptions::new(&base_dir)).unwrap_or_else(|e| {
        eprintln!("Error opening loadout store {}: {e}", base_dir.display());
        process::exit(1);
    });

    match cli.command {
        Command::List => {
            for loadout in store.all() {
                println!("{}", loadout.name());
            }
        }
        Command::Show { ref name, json } => {
            let loadout = store.get(name).cloned().unwrap_or_else(|| missing(name));
            if json {
                print!("{}", json::export(&loadout).unwrap_or_else(|e| fail("rendering JSON", e)));
                return;
            }
            let engine = open_engine(&cli);
            let described = engine
                .describe(&loadout)
                .wait()
                .unwrap_or_else(|e| fail("describing loadout", e));
            print_loadout(&described);
        }
        Command::Export {
            ref name,
            format,
            ticks,
            equip,
        } => {
            let loadout = store.get(name).cloned().unwrap_or_else(|| missing(name));
            let options = KittyKeysOptions {
                ticks,
                verb: if equip {
                    WieldVerb::BankEquip
                } else {
                    WieldVerb::BankWield
                },
            };
            let engine = open_engine(&cli);
            let text = engine
                .export(format.to_core(), &loadout, options)
                .unwrap_or_else(|e| fail("exporting loadout", e));
            print!("{text}");
        }
        Command::Import {
            ref name,
            ref file,
            format,
        } => {
            let text = read_input(file.as_deref());
            let format = format
                .map(FormatArg::to_core)
                .unwrap_or_else(|| ExchangeFormat::detect(&text));
            if format == ExchangeFormat::Repcal {
                require_catalog(&cli, "importing Repcal text");
            }
            let target = store
                .get(name)
                .cloned()
                .unwrap_or_else(|| store.new_loadout(name.as_str()));
            let engine = open_engine(&cli);
            let outcome = engine
                .import(Some(format), &text, target)
                .unwrap_or_else(|e| fail("importing loadout", e));
            for error in &outcome.report.errors {
                eprintln!("{error}");
            }
            let saved = outcome.loadout.name().to_string();
            store.add(outcome.loadout);
            println!("Saved {saved} ({format})");
        }
        Command::Rename { ref old, ref new } => {
            if store.get(old).is_none() {
                missing(old);
            }
            if !store.rename(old, new) {
                eprintln!("Cannot rename {old} to {new}: name unchanged or already taken");
                process::exit(1);
            }
            println!("Renamed {old} to {new}");
        }
        Command::Delete { ref name } => {
            let removed = store.remove(name).unwrap_or_else(|| missing(name));
            println!("Deleted {}", removed.name());
        }
        Command::Resolve { ref words } => {
            require_catalog(&cli, "resolving item names");
            let query = words.join(" ");
            let engine = open_engine(&cli);
            match engine.resolve(&query).wait() {
                Ok(Some(id)) => println!("{id}"),
                Ok(None) => {
                    eprintln!("Item not found: {query}");
                    process::exit(1);
                }
                Err(e) => fail("resolving item name", e),
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn open_engine(cli: &Cli) -> Engine {
    let catalog = match &cli.catalog {
        Some(path) => CatalogDump::load(path).unwrap_or_else(|e| fail("loading catalog", e)),
        None => {
            debug!("no catalog given; item names fall back to ids");
            CatalogDump::default()
        }
    };
    let config = match &cli.config {
        Some(path) => ResolverConfig::load(path).unwrap_or_else(|e| fail("loading config", e)),
        None => ResolverConfig::default(),
    };
    Engine::new(catalog, config).unwrap_or_else(|e| fail("starting item catalog", e))
}

fn require_catalog(cli: &Cli, action: &str) {
    if cli.catalog.is_none() {
        eprintln!("--catalog <PATH> is required when {action}");
        process::exit(2);
    }
}

fn read_input(file: Option<&Path>) -> String {
    match file {
        Some(path) => fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Error reading {}: {e}", path.display());
            process::exit(1);
        }),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).unwrap_or_else(|e| {
                eprintln!("Error reading stdin: {e}");
                process::exit(1);
            });
            text
        }
    }
}

fn print_loadout(loadout: &DescribedLoadout) {
    println!("{}", loadout.name);
    println!("Equipment:");
    for slot in EquipmentSlot::ALL {
        if let Some(item) = loadout.equipped(slot) {
            println!("  {:<7} {} x{} [{}]", slot.as_str(), item.name, item.quantity, item.id);
        }
    }
    println!("Inventory:");
    for (index, item) in loadout.inventory.iter().enumerate() {
        if let Some(item) = item {
            println!("  {:>2}      {} x{} [{}]", index + 1, item.name, item.quantity, item.id);
        }
    }
}

fn missing(name: &str) -> ! {
    eprintln!("No loadout named {name}");
    process::exit(1);
}

fn fail(action: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("Error {action}: {error}");
    process::exit(1);
}
