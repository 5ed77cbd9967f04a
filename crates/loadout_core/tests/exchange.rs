use std::thread;

use loadout_core::catalog::{CatalogDump, CatalogRecord};
use loadout_core::core_api::Engine;
use loadout_core::exchange::kittykeys::KittyKeysOptions;
use loadout_core::exchange::sanitize_kittykeys_name;
use loadout_core::loadout::Loadout;
use loadout_core::resolver::{ItemResolver, ResolverConfig};
use loadout_core::slot::EquipmentSlot;

fn catalog() -> CatalogDump {
    CatalogDump::from_records(vec![
        CatalogRecord::new(385, "Shark"),
        CatalogRecord::new(386, "Shark").noted_of(385),
        CatalogRecord::new(995, "Coins").stackable(),
        CatalogRecord::new(811, "Adamant dart").stackable(),
        CatalogRecord::new(3024, "Super restore(4)").members(),
        CatalogRecord::new(3030, "Super restore(1)").members(),
        CatalogRecord::new(4151, "Abyssal whip").members(),
        CatalogRecord::new(14_000, "Abyssal whip").placeholder_of(4151),
    ])
}

fn config() -> ResolverConfig {
    ResolverConfig {
        max_item_id: 20_000,
        ..ResolverConfig::default()
    }
}

fn engine() -> Engine {
    Engine::new(catalog(), config()).expect("engine should start")
}

#[test]
fn dose_heuristic_picks_highest_dose() {
    let catalog = catalog();
    let resolver = ItemResolver::new(config());
    assert_eq!(resolver.resolve(&catalog, "Super restore("), Some(3024));
    assert_eq!(resolver.resolve(&catalog, "super restore(1)"), Some(3030));
}

#[test]
fn wildcard_only_for_ammo_stacks() {
    let engine = engine();
    let mut loadout = Loadout::empty("Darts");
    loadout
        .set_equipment_in(EquipmentSlot::Weapon, 811, 500)
        .expect("weapon slot exists");
    assert_eq!(
        engine.encode_repcal(&loadout).wait().expect("encode runs"),
        "W:Adamant dart:*\n"
    );

    loadout
        .set_equipment_in(EquipmentSlot::Weapon, 811, 1)
        .expect("weapon slot exists");
    assert_eq!(
        engine.encode_repcal(&loadout).wait().expect("encode runs"),
        "W:Adamant dart:1\n"
    );
}

#[test]
fn inventory_groups_by_name() {
    let engine = engine();
    let mut loadout = Loadout::empty("Food");
    loadout.set_inventory(0, 385, 1).expect("inventory slot exists");
    loadout.set_inventory(4, 995, 100).expect("inventory slot exists");
    loadout.set_inventory(9, 385, 1).expect("inventory slot exists");
    loadout.set_inventory(27, 995, 50).expect("inventory slot exists");
    assert_eq!(
        engine.encode_repcal(&loadout).wait().expect("encode runs"),
        "I:Shark:2\nI:Coins:150\n"
    );
}

#[test]
fn partial_import_reports_only_the_bad_line() {
    let engine = engine();
    let outcome = engine
        .decode_repcal(
            "I:Shark:2\nI:Coins:500\nI:Definitely not an item:1\nI:Super restore(:1\n",
            Loadout::empty("Partial"),
        )
        .wait()
        .expect("decode runs");
    assert_eq!(
        outcome.report.errors,
        vec!["Item not found: Definitely not an item".to_string()]
    );
    assert_eq!(&outcome.loadout.inventory_ids()[..5], &[385, 385, 995, 3024, -1]);
    assert_eq!(outcome.loadout.inventory(2).map(|s| s.quantity), Some(500));
}

#[test]
fn repcal_export_reimports_to_same_slots() {
    let engine = engine();
    let mut loadout = Loadout::empty("Round");
    loadout
        .set_equipment_in(EquipmentSlot::Weapon, 4151, 1)
        .expect("weapon slot exists");
    loadout.set_inventory(0, 385, 1).expect("inventory slot exists");
    loadout.set_inventory(1, 385, 1).expect("inventory slot exists");
    loadout.set_inventory(2, 995, 1234).expect("inventory slot exists");

    let text = engine.encode_repcal(&loadout).wait().expect("encode runs");
    let outcome = engine
        .decode_repcal(&text, Loadout::empty("Round"))
        .wait()
        .expect("decode runs");
    assert!(outcome.report.is_clean());
    assert_eq!(outcome.loadout, loadout);
}

#[test]
fn kittykeys_names_are_sanitized() {
    let engine = engine();
    let mut loadout = Loadout::empty("Kitty");
    loadout.set_inventory(0, 3024, 1).expect("inventory slot exists");
    let text = engine
        .encode_kittykeys(&loadout, KittyKeysOptions::default())
        .wait()
        .expect("encode runs");
    assert_eq!(text, "WITHDRAW super_restore_(4) 1\n");

    for name in ["Super restore(4)", "Karil\u{2019}s  coif", "__(x)__", ""] {
        let once = sanitize_kittykeys_name(name);
        assert_eq!(sanitize_kittykeys_name(&once), once);
    }
}

#[test]
fn concurrent_resolution_shares_one_index() {
    let engine = engine();
    let ids: Vec<Option<i32>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| engine.resolve("abyssal whip").wait().expect("resolve runs")))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("resolver thread panicked"))
            .collect()
    });
    assert!(ids.iter().all(|id| *id == Some(4151)));
    assert!(engine.resolver().is_index_built());
    assert_eq!(engine.warm_index().wait().expect("index runs"), 6);
}
