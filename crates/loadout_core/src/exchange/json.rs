//! JSON forms of a single loadout.
//!
//! The canonical file form is `{"name", "eq", "inv"}` where `eq` and `inv`
//! hold one entry per slot, either `{"id", "q"}` or `null`. The older panel
//! form wraps the same fields in `{"setup": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::loadout::Loadout;

const PANEL_DEFAULT_NAME: &str = "Loadout";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotJson {
    pub id: i32,
    #[serde(default)]
    pub q: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutFile {
    pub name: String,
    #[serde(default)]
    pub eq: Vec<Option<SlotJson>>,
    #[serde(default)]
    pub inv: Vec<Option<SlotJson>>,
}

#[derive(Debug, Deserialize)]
struct PanelRoot {
    setup: PanelSetup,
}

#[derive(Debug, Deserialize)]
struct PanelSetup {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    eq: Vec<Option<SlotJson>>,
    #[serde(default)]
    inv: Vec<Option<SlotJson>>,
}

impl LoadoutFile {
    pub fn from_loadout(loadout: &Loadout) -> Self {
        Self {
            name: loadout.name().to_string(),
            eq: slots_json(loadout.equipment_ids(), loadout.equipment_quantities()),
            inv: slots_json(loadout.inventory_ids(), loadout.inventory_quantities()),
        }
    }

    /// Entries past the loadout's capacity are dropped; `null` entries and
    /// ids `<= 0` leave the slot empty; a missing or non-positive `q` is 1.
    pub fn into_loadout(self, equipment_slots: usize, inventory_slots: usize) -> Loadout {
        build_loadout(self.name, &self.eq, &self.inv, equipment_slots, inventory_slots)
    }
}

fn slots_json(ids: &[i32], quantities: &[i32]) -> Vec<Option<SlotJson>> {
    ids.iter()
        .zip(quantities)
        .map(|(&id, &q)| (id > 0).then_some(SlotJson { id, q: Some(q.max(1)) }))
        .collect()
}

fn build_loadout(
    name: String,
    eq: &[Option<SlotJson>],
    inv: &[Option<SlotJson>],
    equipment_slots: usize,
    inventory_slots: usize,
) -> Loadout {
    let mut loadout = Loadout::new(name, equipment_slots, inventory_slots);
    for (index, slot) in eq.iter().take(equipment_slots).enumerate() {
        if let Some(SlotJson { id, q }) = *slot
            && id > 0
        {
            loadout.put_equipment(index, id, q.filter(|q| *q > 0).unwrap_or(1));
        }
    }
    for (index, slot) in inv.iter().take(inventory_slots).enumerate() {
        if let Some(SlotJson { id, q }) = *slot
            && id > 0
        {
            loadout.put_inventory(index, id, q.filter(|q| *q > 0).unwrap_or(1));
        }
    }
    loadout
}

/// Canonical JSON for `loadout`, pretty-printed with a trailing newline.
pub fn export(loadout: &Loadout) -> Result<String, CoreError> {
    let mut text = serde_json::to_string_pretty(&LoadoutFile::from_loadout(loadout)).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Parse,
            format!("failed to serialize loadout '{}': {e}", loadout.name()),
        )
    })?;
    text.push('\n');
    Ok(text)
}

/// Whether `text` should be treated as a JSON document rather than Repcal.
pub fn looks_like_json(text: &str) -> bool {
    text.trim_start().starts_with('{')
}

/// Explicit import of a canonical or panel-form document. Any syntax or
/// shape error rejects the whole document.
pub fn import(text: &str, equipment_slots: usize, inventory_slots: usize) -> Result<Loadout, CoreError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| CoreError::new(CoreErrorCode::Parse, format!("Invalid JSON: {e}")))?;
    let Value::Object(map) = &value else {
        return Err(CoreError::new(
            CoreErrorCode::Parse,
            "JSON loadout must be an object",
        ));
    };

    if map.contains_key("setup") {
        let root: PanelRoot = serde_json::from_value(value)
            .map_err(|e| CoreError::new(CoreErrorCode::Parse, format!("Invalid 'setup': {e}")))?;
        return Ok(panel_loadout(root.setup, equipment_slots, inventory_slots));
    }

    let file: LoadoutFile = serde_json::from_value(value)
        .map_err(|e| CoreError::new(CoreErrorCode::Parse, format!("Invalid loadout JSON: {e}")))?;
    Ok(file.into_loadout(equipment_slots, inventory_slots))
}

/// Tolerant read of a canonical loadout file; anything unreadable is `None`.
pub fn from_file_json(text: &str, equipment_slots: usize, inventory_slots: usize) -> Option<Loadout> {
    let file: LoadoutFile = serde_json::from_str(text).ok()?;
    Some(file.into_loadout(equipment_slots, inventory_slots))
}

/// Tolerant read of a panel-form document; anything unreadable is `None`.
pub fn from_panel_json(text: &str, equipment_slots: usize, inventory_slots: usize) -> Option<Loadout> {
    let root: PanelRoot = serde_json::from_str(text).ok()?;
    Some(panel_loadout(root.setup, equipment_slots, inventory_slots))
}

fn panel_loadout(setup: PanelSetup, equipment_slots: usize, inventory_slots: usize) -> Loadout {
    let name = setup
        .name
        .unwrap_or_else(|| PANEL_DEFAULT_NAME.to_string());
    build_loadout(name, &setup.eq, &setup.inv, equipment_slots, inventory_slots)
}
