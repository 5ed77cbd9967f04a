use std::fmt;

use serde::{Deserialize, Serialize};

/// Worn-equipment slot kinds. The discriminant is the slot's index in a
/// [`Loadout`](crate::loadout::Loadout)'s equipment arrays and in the `eq`
/// array of the JSON file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipmentSlot {
    Head = 0,
    Cape = 1,
    Amulet = 2,
    Weapon = 3,
    Body = 4,
    Shield = 5,
    Legs = 6,
    Gloves = 7,
    Boots = 8,
    Ring = 9,
    Ammo = 10,
}

pub const EQUIPMENT_SLOT_COUNT: usize = 11;

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; EQUIPMENT_SLOT_COUNT] = [
        Self::Head,
        Self::Cape,
        Self::Amulet,
        Self::Weapon,
        Self::Body,
        Self::Shield,
        Self::Legs,
        Self::Gloves,
        Self::Boots,
        Self::Ring,
        Self::Ammo,
    ];

    /// Gearing order used by Repcal output: bottom-up, weapon and ammo last.
    pub const REPCAL_ORDER: [EquipmentSlot; EQUIPMENT_SLOT_COUNT] = [
        Self::Boots,
        Self::Amulet,
        Self::Shield,
        Self::Cape,
        Self::Gloves,
        Self::Body,
        Self::Head,
        Self::Ring,
        Self::Legs,
        Self::Weapon,
        Self::Ammo,
    ];

    pub const KITTYKEYS_ORDER: [EquipmentSlot; EQUIPMENT_SLOT_COUNT] = [
        Self::Head,
        Self::Body,
        Self::Ring,
        Self::Cape,
        Self::Amulet,
        Self::Weapon,
        Self::Shield,
        Self::Legs,
        Self::Gloves,
        Self::Boots,
        Self::Ammo,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn repcal_code(self) -> &'static str {
        match self {
            Self::Head => "H",
            Self::Cape => "Ca",
            Self::Amulet => "N",
            Self::Weapon => "W",
            Self::Body => "C",
            Self::Shield => "S",
            Self::Legs => "L",
            Self::Gloves => "G",
            Self::Boots => "B",
            Self::Ring => "R",
            Self::Ammo => "A",
        }
    }

    /// Case-insensitive; `"CA"` and `"ca"` both map to [`EquipmentSlot::Cape`].
    pub fn from_repcal_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|slot| slot.repcal_code().eq_ignore_ascii_case(code))
    }

    /// Weapon and ammo slots may hold stacks emitted as the `*` wildcard.
    pub fn holds_ammunition(self) -> bool {
        matches!(self, Self::Weapon | Self::Ammo)
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Head => "Head",
            Self::Cape => "Cape",
            Self::Amulet => "Amulet",
            Self::Weapon => "Weapon",
            Self::Body => "Body",
            Self::Shield => "Shield",
            Self::Legs => "Legs",
            Self::Gloves => "Gloves",
            Self::Boots => "Boots",
            Self::Ring => "Ring",
            Self::Ammo => "Ammo",
        }
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
