//! Pipe-delimited storage strings from before per-file JSON storage.
//!
//! Two layouts exist and both stay decodable:
//!
//! - v1: `name|eqIds|invIds` (no quantities; occupied slots get quantity 1)
//! - v2: `name|eqIds|eqQty|invIds|invQty`
//!
//! Every array is a comma-joined list of integers. Encoding always writes v2.
//! A `|` inside the name is written as `_`; the original character is lost.

use crate::loadout::Loadout;

const FIELD_SEPARATOR: &str = "|";
const NAME_ESCAPE: &str = "_";

pub fn encode(loadout: &Loadout) -> String {
    [
        escape_name(loadout.name()),
        join(loadout.equipment_ids()),
        join(loadout.equipment_quantities()),
        join(loadout.inventory_ids()),
        join(loadout.inventory_quantities()),
    ]
    .join(FIELD_SEPARATOR)
}

/// Returns `None` unless the string has exactly 3 or 5 fields. Trailing empty
/// fields are dropped before counting.
pub fn decode(raw: &str, equipment_slots: usize, inventory_slots: usize) -> Option<Loadout> {
    let mut parts: Vec<&str> = raw.split(FIELD_SEPARATOR).collect();
    while parts.last().is_some_and(|part| part.is_empty()) {
        parts.pop();
    }

    let mut loadout = Loadout::new(parts.first()?.to_string(), equipment_slots, inventory_slots);
    match parts.len() {
        3 => {
            let [eq_ids, eq_qty, inv_ids, inv_qty] = loadout.arrays_mut();
            parse_into(parts[1], eq_ids);
            parse_into(parts[2], inv_ids);
            implicit_single_quantity(eq_ids, eq_qty);
            implicit_single_quantity(inv_ids, inv_qty);
        }
        5 => {
            let [eq_ids, eq_qty, inv_ids, inv_qty] = loadout.arrays_mut();
            parse_into(parts[1], eq_ids);
            parse_into(parts[2], eq_qty);
            parse_into(parts[3], inv_ids);
            parse_into(parts[4], inv_qty);
            loadout.normalize_quantities();
        }
        _ => return None,
    }
    Some(loadout)
}

fn escape_name(name: &str) -> String {
    name.replace(FIELD_SEPARATOR, NAME_ESCAPE)
}

fn join(values: &[i32]) -> String {
    values
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

// Short input stops early; unparseable tokens keep the slot's prior value.
fn parse_into(csv: &str, target: &mut [i32]) {
    if csv.is_empty() {
        return;
    }
    for (slot, token) in target.iter_mut().zip(csv.split(',')) {
        if let Ok(value) = token.trim().parse::<i32>() {
            *slot = value;
        }
    }
}

fn implicit_single_quantity(ids: &[i32], qty: &mut [i32]) {
    for (id, q) in ids.iter().zip(qty.iter_mut()) {
        if *id > 0 {
            *q = 1;
        }
    }
}
