// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use bytemuck::{Pod, Zeroable};
use common::AtomId;
use static_assertions::const_assert_eq;
use std::mem;

const COMPONENT_SHIFT: u32 = 29;
const TYPE_MASK: u32 = (1 << COMPONENT_SHIFT) - 1;

/// One dihedral quadruplet of the device interaction list.
///
/// Atoms are referred to by id.  `param_type` indexes the parameter table; `component` is the
/// position (0 to 3) of the owning atom in per-atom energy lists.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DihedralRecord {
    pub ids: [AtomId; 4],
    pub param_type: u32,
    pub component: u32,
}

const_assert_eq!(mem::size_of::<DihedralRecord>(), 24);

impl DihedralRecord {
    pub fn new(ids: [AtomId; 4], param_type: u32) -> Self {
        debug_assert!(param_type <= TYPE_MASK);
        Self {
            ids,
            param_type,
            component: 0,
        }
    }

    /// Unpacks the restart-file layout: component in the top 3 bits, type in the low 29.
    pub fn from_packed(ids: [AtomId; 4], packed: u32) -> Self {
        Self {
            ids,
            param_type: packed & TYPE_MASK,
            component: packed >> COMPONENT_SHIFT,
        }
    }

    pub fn packed(&self) -> u32 {
        (self.component << COMPONENT_SHIFT) | (self.param_type & TYPE_MASK)
    }
}

/// The three atom slots of one water molecule, oxygen first.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct MoleculeRecord {
    pub atoms: [u32; 3],
}

const_assert_eq!(mem::size_of::<MoleculeRecord>(), 12);


// End of File
