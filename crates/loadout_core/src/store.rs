//! On-disk loadout persistence.
//!
//! Layout under the base directory:
//!
//! ```text
//! <base>/loadouts.dat          legacy aggregated file, one storage string per line
//! <base>/loadouts.dat.migrated the same file after its loadouts were rewritten as JSON
//! <base>/loadouts.backup       backup mirror (FileMirror)
//! <base>/loadouts/<name>.json  current format, one file per loadout
//! <base>/loadouts/<name>.txt   legacy single-loadout container, read only
//! ```
//!
//! Write failures are logged and otherwise ignored, so a failed write leaves
//! the in-memory store ahead of the disk.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::exchange::json;
use crate::legacy;
use crate::loadout::{INVENTORY_SLOT_COUNT, Loadout};
use crate::slot::EQUIPMENT_SLOT_COUNT;

pub const DEFAULT_BASE_DIR_NAME: &str = ".kp";
pub const LOADOUT_DIR_NAME: &str = "loadouts";
pub const LEGACY_FILE_NAME: &str = "loadouts.dat";
pub const BACKUP_FILE_NAME: &str = "loadouts.backup";
pub const MIGRATED_SUFFIX: &str = "migrated";
pub const JSON_EXTENSION: &str = "json";
pub const TEXT_EXTENSION: &str = "txt";

/// Separator between storage strings in the backup mirror.
pub const MIRROR_SEPARATOR: &str = ";;";

/// File stem used when a name sanitizes to nothing.
const FALLBACK_FILE_STEM: &str = "loadout";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub base_dir: PathBuf,
    pub loadout_dir_name: String,
    pub legacy_file_name: String,
    pub equipment_slots: usize,
    pub inventory_slots: usize,
}

impl StoreOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            loadout_dir_name: LOADOUT_DIR_NAME.to_string(),
            legacy_file_name: LEGACY_FILE_NAME.to_string(),
            equipment_slots: EQUIPMENT_SLOT_COUNT,
            inventory_slots: INVENTORY_SLOT_COUNT,
        }
    }

    /// `$HOME/.kp`, or `./.kp` when no home directory is known.
    pub fn default_base_dir() -> PathBuf {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_BASE_DIR_NAME)
    }

    pub fn loadout_dir(&self) -> PathBuf {
        self.base_dir.join(&self.loadout_dir_name)
    }

    pub fn legacy_file(&self) -> PathBuf {
        self.base_dir.join(&self.legacy_file_name)
    }

    /// Where the legacy file is moved once it has been imported.
    pub fn migrated_legacy_file(&self) -> PathBuf {
        self.base_dir
            .join(format!("{}.{MIGRATED_SUFFIX}", self.legacy_file_name))
    }
}

/// Secondary copy of every loadout as `;;`-joined legacy storage strings,
/// consulted only when nothing else could be loaded.
pub trait BackupMirror: Send {
    fn load(&self) -> Option<String>;
    fn store(&self, serialized: &str);
}

#[derive(Debug, Clone)]
pub struct FileMirror {
    path: PathBuf,
}

impl FileMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_base_dir(options: &StoreOptions) -> Self {
        Self::new(options.base_dir.join(BACKUP_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackupMirror for FileMirror {
    fn load(&self) -> Option<String> {
        fs::read_to_string(&self.path).ok()
    }

    fn store(&self, serialized: &str) {
        if let Err(e) = fs::write(&self.path, serialized) {
            warn!(path = %self.path.display(), error = %e, "failed to write backup mirror");
        }
    }
}

/// In-process mirror. Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct MemoryMirror {
    value: Arc<Mutex<Option<String>>>,
}

impl MemoryMirror {
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(value.into()))),
        }
    }

    pub fn value(&self) -> Option<String> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BackupMirror for MemoryMirror {
    fn load(&self) -> Option<String> {
        self.value()
    }

    fn store(&self, serialized: &str) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(serialized.to_string());
    }
}

/// File name for a loadout: characters outside `[A-Za-z0-9._ -]` become `_`,
/// whitespace runs collapse to one space, and the result is trimmed.
pub fn file_name_for(name: &str, extension: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ' ' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let stem = if stem.is_empty() {
        FALLBACK_FILE_STEM
    } else {
        stem.as_str()
    };
    format!("{stem}.{}", extension.trim_start_matches('.'))
}

/// Read a legacy `.txt` container. Checked in order: a `SERIAL=` line, a
/// `JSON` section holding the panel form, then the first line that is not
/// blank, a `#` comment or a `[` header.
pub fn read_legacy_text(text: &str, equipment_slots: usize, inventory_slots: usize) -> Option<Loadout> {
    let lines: Vec<&str> = text.lines().collect();

    if let Some(serial) = lines.iter().find_map(|line| line.strip_prefix("SERIAL=")) {
        return legacy::decode(serial.trim(), equipment_slots, inventory_slots);
    }

    if let Some(header) = lines.iter().position(|line| line.trim().eq_ignore_ascii_case("JSON")) {
        let start = header + 1;
        let end = lines[start..]
            .iter()
            .position(|line| is_section_header(line))
            .map_or(lines.len(), |offset| start + offset);
        let block = lines[start..end].join("\n");
        if let Some(loadout) = json::from_panel_json(block.trim(), equipment_slots, inventory_slots) {
            return Some(loadout);
        }
    }

    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('['))
        .find_map(|line| legacy::decode(line, equipment_slots, inventory_slots))
}

fn is_section_header(line: &str) -> bool {
    let trimmed = line.trim();
    ["JSON", "Repcal", "KittyKeys"]
        .iter()
        .any(|header| trimmed.eq_ignore_ascii_case(header))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Named loadouts backed by one JSON file each. Names are unique ignoring
/// ASCII case.
pub struct LoadoutStore {
    options: StoreOptions,
    mirror: Box<dyn BackupMirror>,
    loadouts: Vec<Loadout>,
}

impl LoadoutStore {
    /// Open with a [`FileMirror`] in the base directory.
    pub fn open(options: StoreOptions) -> Result<Self, CoreError> {
        let mirror = FileMirror::in_base_dir(&options);
        Self::open_with_mirror(options, Box::new(mirror))
    }

    /// Create the directories if needed, load every loadout, then rewrite
    /// them all as canonical JSON. A legacy aggregated file is read at most
    /// once: after the rewrite it is moved aside.
    pub fn open_with_mirror(options: StoreOptions, mirror: Box<dyn BackupMirror>) -> Result<Self, CoreError> {
        let dir = options.loadout_dir();
        fs::create_dir_all(&dir).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to create loadout directory {}: {e}", dir.display()),
            )
        })?;
        let mut store = Self {
            options,
            mirror,
            loadouts: Vec::new(),
        };
        let legacy_read = store.load();
        store.persist_all();
        if legacy_read {
            store.retire_legacy_file();
        }
        Ok(store)
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn all(&self) -> &[Loadout] {
        &self.loadouts
    }

    pub fn len(&self) -> usize {
        self.loadouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loadouts.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Loadout> {
        self.position(name).map(|index| &self.loadouts[index])
    }

    /// Mutable access for in-place edits; call [`LoadoutStore::update`] to
    /// write them out.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Loadout> {
        let index = self.position(name)?;
        Some(&mut self.loadouts[index])
    }

    /// A blank loadout sized for this store.
    pub fn new_loadout(&self, name: impl Into<String>) -> Loadout {
        Loadout::new(name, self.options.equipment_slots, self.options.inventory_slots)
    }

    /// Insert `loadout`, replacing any loadout with the same name ignoring
    /// case, and write it to disk.
    pub fn add(&mut self, loadout: Loadout) {
        if let Some(index) = self.position(loadout.name()) {
            let replaced = self.loadouts.remove(index);
            if self.json_path(replaced.name()) != self.json_path(loadout.name()) {
                self.remove_file(&self.json_path(replaced.name()));
            }
        }
        self.write_single(&loadout);
        self.loadouts.push(loadout);
        self.mirror_all();
    }

    /// Rewrite every loadout file and drop orphaned ones.
    pub fn update(&mut self) {
        self.persist_all();
    }

    /// Returns `false` when `old` is unknown, `new` equals `old`, or `new`
    /// already names a different loadout.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let Some(index) = self.position(old) else {
            return false;
        };
        let current = self.loadouts[index].name().to_string();
        if current == new || self.position(new).is_some_and(|other| other != index) {
            return false;
        }

        let old_json = self.json_path(&current);
        let old_text = self.text_path(&current);
        let new_json = self.json_path(new);
        let source = if old_json.is_file() {
            Some(old_json)
        } else if old_text.is_file() {
            Some(old_text)
        } else {
            None
        };
        if let Some(source) = source
            && let Err(e) = fs::rename(&source, &new_json)
        {
            warn!(from = %source.display(), to = %new_json.display(), error = %e, "failed to rename loadout file");
        }

        self.loadouts[index].set_name(new);
        self.write_single(&self.loadouts[index]);
        self.mirror_all();
        debug!(from = %current, to = new, "renamed loadout");
        true
    }

    /// Remove the loadout and both of its possible files.
    pub fn remove(&mut self, name: &str) -> Option<Loadout> {
        let index = self.position(name)?;
        let removed = self.loadouts.remove(index);
        self.remove_file(&self.json_path(removed.name()));
        self.remove_file(&self.text_path(removed.name()));
        self.mirror_all();
        Some(removed)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.loadouts
            .iter()
            .position(|l| l.name().eq_ignore_ascii_case(name))
    }

    fn push_unique(&mut self, loadout: Loadout) -> bool {
        if self.position(loadout.name()).is_some() {
            return false;
        }
        self.loadouts.push(loadout);
        true
    }

    /// Returns whether the legacy aggregated file was read.
    fn load(&mut self) -> bool {
        let (eq, inv) = (self.options.equipment_slots, self.options.inventory_slots);

        let legacy_file = self.options.legacy_file();
        let legacy_text = fs::read_to_string(&legacy_file).ok();
        if let Some(text) = &legacy_text {
            let mut imported = 0;
            for line in text.lines().filter(|line| !line.is_empty()) {
                if let Some(loadout) = legacy::decode(line, eq, inv)
                    && self.push_unique(loadout)
                {
                    imported += 1;
                }
            }
            info!(path = %legacy_file.display(), imported, "imported legacy loadout file");
        }

        let mut files: Vec<PathBuf> = match fs::read_dir(self.options.loadout_dir()) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .filter(|path| has_extension(path, JSON_EXTENSION) || has_extension(path, TEXT_EXTENSION))
                .collect(),
            Err(e) => {
                warn!(error = %e, "failed to list loadout directory");
                Vec::new()
            }
        };
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        for path in files {
            let Ok(text) = fs::read_to_string(&path) else {
                warn!(path = %path.display(), "failed to read loadout file");
                continue;
            };
            let loadout = if has_extension(&path, JSON_EXTENSION) {
                json::from_file_json(&text, eq, inv)
            } else {
                read_legacy_text(&text, eq, inv)
            };
            match loadout {
                Some(loadout) => {
                    self.push_unique(loadout);
                }
                None => debug!(path = %path.display(), "skipped unreadable loadout file"),
            }
        }

        if self.loadouts.is_empty()
            && let Some(raw) = self.mirror.load()
        {
            for part in raw.split(MIRROR_SEPARATOR).filter(|part| !part.is_empty()) {
                if let Some(loadout) = legacy::decode(part, eq, inv) {
                    self.push_unique(loadout);
                }
            }
            if !self.loadouts.is_empty() {
                info!(restored = self.loadouts.len(), "restored loadouts from backup mirror");
            }
        }

        info!(loadouts = self.loadouts.len(), "loaded loadouts");
        legacy_text.is_some()
    }

    fn retire_legacy_file(&self) {
        let from = self.options.legacy_file();
        let to = self.options.migrated_legacy_file();
        match fs::rename(&from, &to) {
            Ok(()) => info!(path = %to.display(), "retired legacy loadout file"),
            Err(e) => warn!(path = %from.display(), error = %e, "failed to retire legacy loadout file"),
        }
    }

    fn persist_all(&self) {
        let dir = self.options.loadout_dir();
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!(path = %dir.display(), error = %e, "failed to create loadout directory");
        }

        let expected: HashSet<String> = self
            .loadouts
            .iter()
            .map(|l| file_name_for(l.name(), JSON_EXTENSION))
            .collect();
        if let Ok(entries) = fs::read_dir(&dir) {
            for path in entries.filter_map(Result::ok).map(|entry| entry.path()) {
                let orphan = has_extension(&path, JSON_EXTENSION)
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_none_or(|n| !expected.contains(n));
                if orphan {
                    self.remove_file(&path);
                }
            }
        }

        for loadout in &self.loadouts {
            self.write_single(loadout);
        }
        self.mirror_all();
    }

    fn write_single(&self, loadout: &Loadout) {
        let path = self.json_path(loadout.name());
        let result = json::export(loadout).and_then(|text| {
            fs::write(&path, text).map_err(|e| CoreError::new(CoreErrorCode::Io, e.to_string()))
        });
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "failed to write loadout file");
        }
    }

    fn remove_file(&self, path: &Path) {
        if !path.exists() {
            return;
        }
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "failed to delete loadout file");
        }
    }

    fn mirror_all(&self) {
        let serialized = self
            .loadouts
            .iter()
            .map(legacy::encode)
            .collect::<Vec<_>>()
            .join(MIRROR_SEPARATOR);
        self.mirror.store(&serialized);
    }

    fn json_path(&self, name: &str) -> PathBuf {
        self.options
            .loadout_dir()
            .join(file_name_for(name, JSON_EXTENSION))
    }

    fn text_path(&self, name: &str) -> PathBuf {
        self.options
            .loadout_dir()
            .join(file_name_for(name, TEXT_EXTENSION))
    }
}
