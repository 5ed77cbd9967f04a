//! Repcal text protocol.
//!
//! One line per item, `<code>:<name>:<quantity>`, where `code` is an
//! equipment slot code (see [`EquipmentSlot::repcal_code`]) or `I` for an
//! inventory group. Equipment quantities may be the `*` wildcard.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use tracing::debug;

use super::{DescribedLoadout, WILDCARD, equipment_quantity_token};
use crate::loadout::{EMPTY_SLOT, Loadout};
use crate::slot::EquipmentSlot;

pub const INVENTORY_CODE: &str = "I";

/// Amount recorded for a `*` quantity.
pub const WILDCARD_AMOUNT: i32 = -1;

pub fn encode(loadout: &DescribedLoadout) -> String {
    let mut out = String::new();
    for slot in EquipmentSlot::REPCAL_ORDER {
        if let Some(item) = loadout.equipped(slot) {
            let _ = writeln!(
                out,
                "{}:{}:{}",
                slot.repcal_code(),
                item.name,
                equipment_quantity_token(slot, item)
            );
        }
    }
    for (name, count) in loadout.inventory_totals() {
        let _ = writeln!(out, "{INVENTORY_CODE}:{name}:{count}");
    }
    out
}

/// One parsed Repcal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    pub code: String,
    pub name: String,
    /// Positive count, or [`WILDCARD_AMOUNT`].
    pub amount: i32,
}

impl ImportEntry {
    pub fn is_inventory(&self) -> bool {
        self.code.eq_ignore_ascii_case(INVENTORY_CODE)
    }

    pub fn is_wildcard(&self) -> bool {
        self.amount == WILDCARD_AMOUNT
    }

    /// Quantity to place. A wildcard places a single unit; the user adjusts it.
    pub fn quantity(&self) -> i32 {
        self.amount.max(1)
    }
}

/// Parse Repcal text into entries. Markdown code fences, blank lines and
/// `#` or `//` comments are skipped, as are lines without both a code and a
/// name. A missing, unparseable or non-positive quantity becomes 1.
pub fn parse(text: &str) -> Vec<ImportEntry> {
    let cleaned = text.replace("```", "").replace('\r', "\n");
    let mut entries = Vec::new();
    for raw in cleaned.split('\n') {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 2 {
            continue;
        }
        let code = parts[0].trim();
        let name = parts[1].trim();
        if code.is_empty() || name.is_empty() {
            continue;
        }
        let amount = match parts.get(2).map(|token| token.trim()) {
            Some(WILDCARD) => WILDCARD_AMOUNT,
            Some(token) => token.parse::<i32>().ok().filter(|q| *q > 0).unwrap_or(1),
            None => 1,
        };
        entries.push(ImportEntry {
            code: code.to_string(),
            name: name.to_string(),
            amount,
        });
    }
    entries
}

/// Outcome of applying entries: the per-line problems, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub errors: Vec<String>,
    pub applied: usize,
}

impl DecodeReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Apply parsed entries to `loadout`.
///
/// Every equipment slot named by an entry is cleared first, and the whole
/// inventory is cleared when any inventory entry is present. `resolve` maps a
/// name to `(id, stackable)`. Lines that fail are reported and skipped; the
/// remaining lines are still applied.
pub fn apply<R>(loadout: &mut Loadout, entries: &[ImportEntry], mut resolve: R) -> DecodeReport
where
    R: FnMut(&str) -> Option<(i32, bool)>,
{
    let mut report = DecodeReport::default();

    let named_slots: BTreeSet<EquipmentSlot> = entries
        .iter()
        .filter(|e| !e.is_inventory())
        .filter_map(|e| EquipmentSlot::from_repcal_code(&e.code))
        .collect();
    for slot in named_slots {
        loadout.put_equipment(slot.index(), EMPTY_SLOT, 0);
    }
    if entries.iter().any(ImportEntry::is_inventory) {
        loadout.clear_inventory();
    }

    let mut cursor = 0;
    for entry in entries {
        if entry.is_inventory() {
            let Some((id, stackable)) = resolve_or_report(&mut resolve, entry, &mut report) else {
                continue;
            };
            let quantity = entry.quantity();
            if stackable {
                match loadout.next_free_inventory_slot(cursor) {
                    Some(index) => {
                        loadout.put_inventory(index, id, quantity);
                        cursor = index + 1;
                        report.applied += 1;
                    }
                    None => report.errors.push(inventory_full(&entry.name)),
                }
            } else {
                let mut placed = false;
                for _ in 0..quantity {
                    let Some(index) = loadout.next_free_inventory_slot(cursor) else {
                        report.errors.push(inventory_full(&entry.name));
                        break;
                    };
                    loadout.put_inventory(index, id, 1);
                    cursor = index + 1;
                    placed = true;
                }
                if placed {
                    report.applied += 1;
                }
            }
            continue;
        }

        let Some(slot) = EquipmentSlot::from_repcal_code(&entry.code) else {
            report.errors.push(format!("Unknown code: {}", entry.code));
            continue;
        };
        let Some((id, _)) = resolve_or_report(&mut resolve, entry, &mut report) else {
            continue;
        };
        if loadout.set_equipment(slot.index(), id, entry.quantity()).is_ok() {
            report.applied += 1;
        }
    }

    debug!(
        applied = report.applied,
        errors = report.errors.len(),
        "applied repcal entries"
    );
    report
}

fn resolve_or_report<R>(
    resolve: &mut R,
    entry: &ImportEntry,
    report: &mut DecodeReport,
) -> Option<(i32, bool)>
where
    R: FnMut(&str) -> Option<(i32, bool)>,
{
    match resolve(&entry.name) {
        Some((id, stackable)) if id > 0 => Some((id, stackable)),
        _ => {
            report.errors.push(format!("Item not found: {}", entry.name));
            None
        }
    }
}

fn inventory_full(name: &str) -> String {
    format!("Inventory full ({name})")
}
