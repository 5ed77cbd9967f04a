//! Items whose catalog-reported stackability is wrong or inconsistent for
//! loadout purposes. They are always packed into a single inventory slot.
//!
//! This is the default for `ResolverConfig::forced_stackables`; deployments
//! can replace it through the resolver configuration file.

use std::collections::BTreeSet;

#[rustfmt::skip]
const FORCED_STACKABLE_IDS: &[i32] = &[
    // Currency
     995,  // Coins
     617,  // Coins (noted)
    6529,  // Tokkul

    // Runes
     554,  // Fire rune
     555,  // Water rune
     556,  // Air rune
     557,  // Earth rune
     558,  // Mind rune

    // Raw materials
    8778,  // Oak plank
];

pub fn default_ids() -> BTreeSet<i32> {
    FORCED_STACKABLE_IDS.iter().copied().collect()
}
