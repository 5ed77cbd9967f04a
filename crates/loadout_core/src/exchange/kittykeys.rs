//! KittyKeys bank-script output. Write-only: scripts are never read back.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::{DescribedLoadout, equipment_quantity_token, sanitize_kittykeys_name};
use crate::slot::EquipmentSlot;

pub const DEFAULT_TICKS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WieldVerb {
    #[default]
    BankWield,
    BankEquip,
}

impl WieldVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BankWield => "BANK_WIELD",
            Self::BankEquip => "BANK_EQUIP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KittyKeysOptions {
    /// `TICK` lines between the withdraw and wield phases; `0` separates the
    /// phases with a blank line instead.
    pub ticks: usize,
    pub verb: WieldVerb,
}

impl Default for KittyKeysOptions {
    fn default() -> Self {
        Self {
            ticks: DEFAULT_TICKS,
            verb: WieldVerb::default(),
        }
    }
}

pub fn encode(loadout: &DescribedLoadout, options: &KittyKeysOptions) -> String {
    let mut out = String::new();

    let mut worn = Vec::new();
    for slot in EquipmentSlot::KITTYKEYS_ORDER {
        if let Some(item) = loadout.equipped(slot) {
            let name = sanitize_kittykeys_name(&item.name);
            let _ = writeln!(out, "WITHDRAW {name} {}", equipment_quantity_token(slot, item));
            worn.push(name);
        }
    }

    if !worn.is_empty() {
        push_separator(&mut out, options.ticks);
        for name in &worn {
            let _ = writeln!(out, "{} {name}", options.verb.as_str());
        }
        push_separator(&mut out, options.ticks);
    }

    for (name, count) in loadout.inventory_totals() {
        let _ = writeln!(out, "WITHDRAW {} {count}", sanitize_kittykeys_name(&name));
    }

    let trimmed = out.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

fn push_separator(out: &mut String, ticks: usize) {
    out.push('\n');
    if ticks > 0 {
        for _ in 0..ticks {
            out.push_str("TICK\n");
        }
        out.push('\n');
    }
}
