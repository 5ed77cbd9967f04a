use crate::core_api::{CoreError, CoreErrorCode};
use crate::slot::{EQUIPMENT_SLOT_COUNT, EquipmentSlot};

pub const INVENTORY_SLOT_COUNT: usize = 28;

/// Id stored in a slot that holds nothing.
pub const EMPTY_SLOT: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotItem {
    pub id: i32,
    pub quantity: i32,
}

/// A named equipment + inventory setup.
///
/// Slot arrays are sized at construction and never resized. An id of
/// [`EMPTY_SLOT`] (or any id `<= 0`) marks the slot empty and its quantity is
/// ignored; setters keep the paired quantity at `0` for empty slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loadout {
    name: String,
    equipment_ids: Vec<i32>,
    equipment_qty: Vec<i32>,
    inventory_ids: Vec<i32>,
    inventory_qty: Vec<i32>,
}

impl Loadout {
    pub fn new(name: impl Into<String>, equipment_slots: usize, inventory_slots: usize) -> Self {
        Self {
            name: name.into(),
            equipment_ids: vec![EMPTY_SLOT; equipment_slots],
            equipment_qty: vec![0; equipment_slots],
            inventory_ids: vec![EMPTY_SLOT; inventory_slots],
            inventory_qty: vec![0; inventory_slots],
        }
    }

    /// Empty loadout with the standard 11 equipment and 28 inventory slots.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, EQUIPMENT_SLOT_COUNT, INVENTORY_SLOT_COUNT)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn equipment_slot_count(&self) -> usize {
        self.equipment_ids.len()
    }

    pub fn inventory_slot_count(&self) -> usize {
        self.inventory_ids.len()
    }

    pub fn equipment_ids(&self) -> &[i32] {
        &self.equipment_ids
    }

    pub fn equipment_quantities(&self) -> &[i32] {
        &self.equipment_qty
    }

    pub fn inventory_ids(&self) -> &[i32] {
        &self.inventory_ids
    }

    pub fn inventory_quantities(&self) -> &[i32] {
        &self.inventory_qty
    }

    /// Raw mutable access for codecs that fill arrays positionally.
    pub(crate) fn arrays_mut(&mut self) -> [&mut [i32]; 4] {
        [
            &mut self.equipment_ids,
            &mut self.equipment_qty,
            &mut self.inventory_ids,
            &mut self.inventory_qty,
        ]
    }

    pub fn equipment(&self, index: usize) -> Option<SlotItem> {
        occupied(&self.equipment_ids, &self.equipment_qty, index)
    }

    pub fn equipment_in(&self, slot: EquipmentSlot) -> Option<SlotItem> {
        self.equipment(slot.index())
    }

    pub fn inventory(&self, index: usize) -> Option<SlotItem> {
        occupied(&self.inventory_ids, &self.inventory_qty, index)
    }

    pub fn set_equipment(&mut self, index: usize, id: i32, quantity: i32) -> Result<(), CoreError> {
        store_slot(
            &mut self.equipment_ids,
            &mut self.equipment_qty,
            index,
            id,
            quantity,
            "equipment",
        )
    }

    pub fn set_equipment_in(
        &mut self,
        slot: EquipmentSlot,
        id: i32,
        quantity: i32,
    ) -> Result<(), CoreError> {
        self.set_equipment(slot.index(), id, quantity)
    }

    pub fn clear_equipment(&mut self, index: usize) -> Result<(), CoreError> {
        self.set_equipment(index, EMPTY_SLOT, 0)
    }

    pub fn set_inventory(&mut self, index: usize, id: i32, quantity: i32) -> Result<(), CoreError> {
        store_slot(
            &mut self.inventory_ids,
            &mut self.inventory_qty,
            index,
            id,
            quantity,
            "inventory",
        )
    }

    pub fn clear_inventory_slot(&mut self, index: usize) -> Result<(), CoreError> {
        self.set_inventory(index, EMPTY_SLOT, 0)
    }

    /// Like [`Loadout::set_equipment`], but an index past the last slot is a no-op.
    pub(crate) fn put_equipment(&mut self, index: usize, id: i32, quantity: i32) {
        put_slot(&mut self.equipment_ids, &mut self.equipment_qty, index, id, quantity);
    }

    /// Like [`Loadout::set_inventory`], but an index past the last slot is a no-op.
    pub(crate) fn put_inventory(&mut self, index: usize, id: i32, quantity: i32) {
        put_slot(&mut self.inventory_ids, &mut self.inventory_qty, index, id, quantity);
    }

    pub fn clear_inventory(&mut self) {
        self.inventory_ids.fill(EMPTY_SLOT);
        self.inventory_qty.fill(0);
    }

    pub fn is_empty(&self) -> bool {
        self.equipment_ids.iter().all(|&id| id <= 0) && self.inventory_ids.iter().all(|&id| id <= 0)
    }

    /// Index of the first empty inventory slot at or after `from`.
    pub fn next_free_inventory_slot(&self, from: usize) -> Option<usize> {
        (from..self.inventory_ids.len()).find(|&i| self.inventory_ids[i] <= 0)
    }

    /// Occupied slots get a quantity of at least 1; empty slots get the
    /// [`EMPTY_SLOT`] id and a quantity of 0.
    pub fn normalize_quantities(&mut self) {
        normalize(&mut self.equipment_ids, &mut self.equipment_qty);
        normalize(&mut self.inventory_ids, &mut self.inventory_qty);
    }

    /// Deep copy under a new name with quantities normalized.
    pub fn snapshot(&self, name: impl Into<String>) -> Loadout {
        let mut copy = self.clone();
        copy.name = name.into();
        copy.normalize_quantities();
        copy
    }

    /// Overwrite `target`'s slots with this loadout's slots. `target` keeps its
    /// own name and array lengths; slots past the shorter length are cleared.
    pub fn copy_into(&self, target: &mut Loadout) {
        copy_slots(
            &self.equipment_ids,
            &self.equipment_qty,
            &mut target.equipment_ids,
            &mut target.equipment_qty,
        );
        copy_slots(
            &self.inventory_ids,
            &self.inventory_qty,
            &mut target.inventory_ids,
            &mut target.inventory_qty,
        );
    }
}

fn occupied(ids: &[i32], qty: &[i32], index: usize) -> Option<SlotItem> {
    let id = *ids.get(index)?;
    if id <= 0 {
        return None;
    }
    Some(SlotItem {
        id,
        quantity: qty.get(index).copied().unwrap_or(1).max(1),
    })
}

fn store_slot(
    ids: &mut [i32],
    qty: &mut [i32],
    index: usize,
    id: i32,
    quantity: i32,
    section: &str,
) -> Result<(), CoreError> {
    if index >= ids.len() {
        return Err(CoreError::new(
            CoreErrorCode::InvalidSlot,
            format!(
                "{section} slot {index} out of range, loadout has {} slots",
                ids.len()
            ),
        ));
    }
    put_slot(ids, qty, index, id, quantity);
    Ok(())
}

fn put_slot(ids: &mut [i32], qty: &mut [i32], index: usize, id: i32, quantity: i32) {
    let (Some(slot_id), Some(slot_qty)) = (ids.get_mut(index), qty.get_mut(index)) else {
        return;
    };
    if id > 0 {
        *slot_id = id;
        *slot_qty = quantity;
    } else {
        *slot_id = EMPTY_SLOT;
        *slot_qty = 0;
    }
}

fn normalize(ids: &mut [i32], qty: &mut [i32]) {
    for (id, q) in ids.iter_mut().zip(qty.iter_mut()) {
        if *id > 0 {
            if *q <= 0 {
                *q = 1;
            }
        } else {
            *id = EMPTY_SLOT;
            *q = 0;
        }
    }
}

fn copy_slots(src_ids: &[i32], src_qty: &[i32], dst_ids: &mut [i32], dst_qty: &mut [i32]) {
    for i in 0..dst_ids.len() {
        match (src_ids.get(i), src_qty.get(i)) {
            (Some(&id), Some(&q)) => {
                dst_ids[i] = id;
                dst_qty[i] = q;
            }
            _ => {
                dst_ids[i] = EMPTY_SLOT;
                dst_qty[i] = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EMPTY_SLOT, Loadout, SlotItem};
    use crate::core_api::CoreErrorCode;
    use crate::slot::EquipmentSlot;

    #[test]
    fn new_loadout_is_empty_with_fixed_sizes() {
        let loadout = Loadout::empty("Melee");
        assert_eq!(loadout.equipment_slot_count(), 11);
        assert_eq!(loadout.inventory_slot_count(), 28);
        assert!(loadout.is_empty());
        assert!(loadout.equipment_ids().iter().all(|&id| id == EMPTY_SLOT));
        assert!(loadout.inventory_quantities().iter().all(|&q| q == 0));
    }

    #[test]
    fn setting_empty_id_resets_quantity() {
        let mut loadout = Loadout::empty("x");
        loadout.set_inventory(3, 385, 1).expect("slot 3 should exist");
        assert_eq!(loadout.inventory(3), Some(SlotItem { id: 385, quantity: 1 }));

        loadout.set_inventory(3, 0, 7).expect("slot 3 should exist");
        assert_eq!(loadout.inventory(3), None);
        assert_eq!(loadout.inventory_ids()[3], EMPTY_SLOT);
        assert_eq!(loadout.inventory_quantities()[3], 0);
    }

    #[test]
    fn out_of_range_slot_is_rejected() {
        let mut loadout = Loadout::empty("x");
        let err = loadout.set_inventory(28, 1, 1).expect_err("slot 28 must not exist");
        assert_eq!(err.code, CoreErrorCode::InvalidSlot);
    }

    #[test]
    fn put_ignores_slots_past_the_end() {
        let mut loadout = Loadout::new("narrow", 2, 1);
        loadout.put_equipment(EquipmentSlot::Weapon.index(), 4151, 1);
        loadout.put_inventory(1, 385, 1);
        assert!(loadout.is_empty());

        loadout.put_inventory(0, 995, 10);
        assert_eq!(loadout.inventory(0), Some(SlotItem { id: 995, quantity: 10 }));
        loadout.put_inventory(0, EMPTY_SLOT, 10);
        assert_eq!(loadout.inventory_quantities(), &[0]);
    }

    #[test]
    fn snapshot_is_a_normalized_deep_copy() {
        let mut original = Loadout::empty("a");
        original
            .set_equipment_in(EquipmentSlot::Weapon, 4151, 0)
            .expect("weapon slot exists");

        let mut copy = original.snapshot("b");
        assert_eq!(copy.name(), "b");
        assert_eq!(copy.equipment_in(EquipmentSlot::Weapon).map(|s| s.quantity), Some(1));
        assert_eq!(copy.equipment_quantities()[EquipmentSlot::Weapon.index()], 1);

        copy.clear_equipment(EquipmentSlot::Weapon.index()).expect("weapon slot exists");
        assert_eq!(original.equipment_ids()[EquipmentSlot::Weapon.index()], 4151);
    }

    #[test]
    fn copy_into_keeps_target_name_and_sizes() {
        let mut source = Loadout::new("src", 2, 3);
        source.set_inventory(2, 995, 100).expect("slot exists");
        source.set_equipment(1, 1052, 1).expect("slot exists");

        let mut target = Loadout::empty("dst");
        target.set_inventory(10, 385, 1).expect("slot exists");
        source.copy_into(&mut target);

        assert_eq!(target.name(), "dst");
        assert_eq!(target.inventory_slot_count(), 28);
        assert_eq!(target.inventory(2), Some(SlotItem { id: 995, quantity: 100 }));
        assert_eq!(target.equipment(1), Some(SlotItem { id: 1052, quantity: 1 }));
        assert_eq!(target.inventory(10), None);
    }

    #[test]
    fn next_free_inventory_slot_skips_occupied() {
        let mut loadout = Loadout::new("x", 0, 3);
        loadout.set_inventory(0, 1, 1).expect("slot exists");
        assert_eq!(loadout.next_free_inventory_slot(0), Some(1));
        loadout.set_inventory(1, 1, 1).expect("slot exists");
        loadout.set_inventory(2, 1, 1).expect("slot exists");
        assert_eq!(loadout.next_free_inventory_slot(0), None);
    }
}
