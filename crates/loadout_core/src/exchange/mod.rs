//! Text exchange formats for loadouts.
//!
//! Encoders work on a [`DescribedLoadout`]: the loadout's slots with the
//! catalog facts they need (display name, stackability) gathered in one pass
//! inside the catalog context. The text formatting itself never touches the
//! catalog.

pub mod json;
pub mod kittykeys;
pub mod repcal;
mod sanitize;

pub use sanitize::sanitize_kittykeys_name;

use crate::catalog::ItemCatalog;
use crate::loadout::{Loadout, SlotItem};
use crate::resolver::ItemResolver;
use crate::slot::EquipmentSlot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedItem {
    pub id: i32,
    pub quantity: i32,
    pub name: String,
    pub stackable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescribedLoadout {
    pub name: String,
    /// Indexed by [`EquipmentSlot::index`].
    pub equipment: Vec<Option<DescribedItem>>,
    pub inventory: Vec<Option<DescribedItem>>,
}

impl DescribedLoadout {
    pub fn describe(catalog: &dyn ItemCatalog, resolver: &ItemResolver, loadout: &Loadout) -> Self {
        let describe_slot = |slot: Option<SlotItem>| {
            slot.map(|item| DescribedItem {
                id: item.id,
                quantity: item.quantity,
                name: resolver.display_name(catalog, item.id),
                stackable: resolver.is_stackable(catalog, item.id),
            })
        };
        Self {
            name: loadout.name().to_string(),
            equipment: (0..loadout.equipment_slot_count())
                .map(|i| describe_slot(loadout.equipment(i)))
                .collect(),
            inventory: (0..loadout.inventory_slot_count())
                .map(|i| describe_slot(loadout.inventory(i)))
                .collect(),
        }
    }

    pub fn equipped(&self, slot: EquipmentSlot) -> Option<&DescribedItem> {
        self.equipment.get(slot.index()).and_then(Option::as_ref)
    }

    /// Inventory grouped by display name in first-seen order. Stackable items
    /// add their quantity, others count one per occupied slot.
    pub fn inventory_totals(&self) -> Vec<(String, i64)> {
        let mut totals: Vec<(String, i64)> = Vec::new();
        for item in self.inventory.iter().flatten() {
            let add = if item.stackable {
                i64::from(item.quantity.max(1))
            } else {
                1
            };
            match totals.iter_mut().find(|(name, _)| *name == item.name) {
                Some((_, total)) => *total += add,
                None => totals.push((item.name.clone(), add)),
            }
        }
        totals
    }
}

/// Ranged-ammunition name fragments. Weapon/ammo stacks of these are exported
/// with the `*` quantity wildcard.
const RANGED_AMMO_TERMS: &[&str] = &[
    "dart",
    "knife",
    "javelin",
    "throwing axe",
    "chinchompa",
    "arrow",
    "bolt",
    "gem bolt",
    "bolt rack",
    "brutal",
    "cannonball",
];

pub const WILDCARD: &str = "*";

fn is_ranged_ammo_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    RANGED_AMMO_TERMS.iter().any(|term| lower.contains(term))
}

/// Quantity token for an equipped item: `*` for a stack of ranged ammunition
/// in the weapon or ammo slot, otherwise the literal count.
pub fn equipment_quantity_token(slot: EquipmentSlot, item: &DescribedItem) -> String {
    if slot.holds_ammunition()
        && item.stackable
        && item.quantity > 1
        && is_ranged_ammo_name(&item.name)
    {
        WILDCARD.to_string()
    } else {
        item.quantity.max(1).to_string()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{DescribedItem, DescribedLoadout};
    use crate::loadout::INVENTORY_SLOT_COUNT;
    use crate::slot::{EQUIPMENT_SLOT_COUNT, EquipmentSlot};

    pub fn item(id: i32, name: &str, quantity: i32, stackable: bool) -> DescribedItem {
        DescribedItem {
            id,
            quantity,
            name: name.to_string(),
            stackable,
        }
    }

    pub fn described(
        equipment: Vec<(EquipmentSlot, DescribedItem)>,
        inventory: Vec<DescribedItem>,
    ) -> DescribedLoadout {
        let mut out = DescribedLoadout {
            name: "Test".to_string(),
            equipment: vec![None; EQUIPMENT_SLOT_COUNT],
            inventory: vec![None; INVENTORY_SLOT_COUNT],
        };
        for (slot, item) in equipment {
            out.equipment[slot.index()] = Some(item);
        }
        for (index, item) in inventory.into_iter().enumerate() {
            out.inventory[index] = Some(item);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::equipment_quantity_token;
    use super::fixtures::{described, item};
    use crate::slot::EquipmentSlot;

    #[test]
    fn wildcard_only_for_ranged_stacks_in_weapon_or_ammo() {
        let darts = item(811, "Adamant dart", 500, true);
        assert_eq!(equipment_quantity_token(EquipmentSlot::Weapon, &darts), "*");
        assert_eq!(equipment_quantity_token(EquipmentSlot::Ammo, &darts), "*");
        assert_eq!(equipment_quantity_token(EquipmentSlot::Shield, &darts), "500");

        let single = item(811, "Adamant dart", 1, true);
        assert_eq!(equipment_quantity_token(EquipmentSlot::Weapon, &single), "1");

        let not_ammo = item(4151, "Abyssal whip", 2, true);
        assert_eq!(equipment_quantity_token(EquipmentSlot::Weapon, &not_ammo), "2");

        let unstackable = item(9185, "Rune crossbow bolt", 5, false);
        assert_eq!(equipment_quantity_token(EquipmentSlot::Ammo, &unstackable), "5");
    }

    #[test]
    fn inventory_totals_sum_stacks_and_count_slots() {
        let loadout = described(
            Vec::new(),
            vec![
                item(385, "Shark", 1, false),
                item(995, "Coins", 100, true),
                item(385, "Shark", 1, false),
                item(995, "Coins", 50, true),
            ],
        );
        assert_eq!(
            loadout.inventory_totals(),
            vec![("Shark".to_string(), 2), ("Coins".to_string(), 150)]
        );
    }
}
