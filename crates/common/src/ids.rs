// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// The stable identifier of an atom.  Interaction lists refer to atoms by id; the per-atom device
/// arrays are indexed by slot, and the two are connected by an id-to-slot translation table that
/// is rebuilt whenever atoms are reordered.
pub type AtomId = u32;

/// Marks an id with no atom behind it in a translation table.
pub const INVALID_SLOT: u32 = u32::MAX;

/// The same atom id was given to more than one slot.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
#[error("Atom id {0} is stored in more than one slot")]
pub struct DuplicateAtomId(pub AtomId);

/// Builds the id-to-slot translation table for atoms stored in `slot_ids` order.
///
/// Entry `id` of the returned table holds the slot of the atom with that id, or
/// [`INVALID_SLOT`] for ids that are not present.
pub fn build_id_to_idx(slot_ids: &[AtomId]) -> Result<Vec<u32>, DuplicateAtomId> {
    let len = slot_ids.iter().max().map_or(0, |&max| max as usize + 1);
    let mut table = vec![INVALID_SLOT; len];
    for (slot, &id) in slot_ids.iter().enumerate() {
        let entry = &mut table[id as usize];
        if *entry != INVALID_SLOT {
            return Err(DuplicateAtomId(id));
        }
        *entry = slot as u32;
    }
    Ok(table)
}


// End of File
