// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::ForceError;
use common::{build_id_to_idx, AtomId, Bounds, Vec3, Vec4, Virial, INVALID_SLOT};
use device::{Device, ForceAccumulator, GlobalArray, VirialAccumulator};

/// Device-resident per-atom state read and accumulated into by the force kernels.
///
/// Atoms are stored by slot.  Interaction lists refer to atoms by id and go through the
/// `id_to_idx` table.  Forces and virials are accumulated atomically and are zeroed by the caller
/// between steps.
pub struct ParticleState {
    positions: GlobalArray<Vec4>,
    ids: Vec<AtomId>,
    id_to_idx: GlobalArray<u32>,
    forces: ForceAccumulator,
    virials: Option<VirialAccumulator>,
    bounds: Bounds,
}

impl ParticleState {
    /// Uploads `positions`, stored in the slot order given by `ids`.
    pub fn new(
        device: &Device,
        positions: &[Vec4],
        ids: &[AtomId],
        bounds: Bounds,
        with_virials: bool,
    ) -> Result<Self, ForceError> {
        assert_eq!(positions.len(), ids.len(), "one id per position");
        let id_to_idx = build_id_to_idx(ids)?;
        let virials = if with_virials {
            Some(VirialAccumulator::zeroed(device, positions.len())?)
        } else {
            None
        };
        Ok(Self {
            positions: GlobalArray::from_host(device, positions)?,
            ids: ids.to_vec(),
            id_to_idx: GlobalArray::from_host(device, &id_to_idx)?,
            forces: ForceAccumulator::zeroed(device, positions.len())?,
            virials,
            bounds,
        })
    }

    /// Atoms with ids `0..positions.len()` stored in id order.
    pub fn with_sequential_ids(
        device: &Device,
        positions: &[Vec4],
        bounds: Bounds,
        with_virials: bool,
    ) -> Result<Self, ForceError> {
        let ids: Vec<AtomId> = (0..positions.len() as AtomId).collect();
        Self::new(device, positions, &ids, bounds, with_virials)
    }

    pub fn num_atoms(&self) -> usize {
        self.positions.len()
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn positions(&self) -> &GlobalArray<Vec4> {
        &self.positions
    }

    pub fn id_to_idx(&self) -> &GlobalArray<u32> {
        &self.id_to_idx
    }

    pub fn ids(&self) -> &[AtomId] {
        &self.ids
    }

    pub fn force_accumulator(&self) -> &ForceAccumulator {
        &self.forces
    }

    pub fn virial_accumulator(&self) -> Option<&VirialAccumulator> {
        self.virials.as_ref()
    }

    /// Slot of the atom with `id`.
    pub fn slot_of(&self, id: AtomId) -> Result<u32, ForceError> {
        match self.id_to_idx.as_slice().get(id as usize) {
            Some(&slot) if slot != INVALID_SLOT => Ok(slot),
            _ => Err(ForceError::UnknownAtomId(id)),
        }
    }

    /// Replaces the positions, keeping the slot order.
    pub fn set_positions(&mut self, positions: &[Vec4]) -> Result<(), ForceError> {
        Ok(self.positions.write(positions)?)
    }

    pub fn zero_forces(&self) {
        self.forces.zero();
        if let Some(virials) = &self.virials {
            virials.zero();
        }
    }

    /// Accumulated force on the atom in `slot`.
    pub fn force(&self, slot: usize) -> Vec3 {
        Vec4::from_array(self.forces.get(slot)).truncate()
    }

    pub fn forces(&self) -> Vec<Vec3> {
        (0..self.forces.len()).map(|slot| self.force(slot)).collect()
    }

    /// Force on the atom with `id`.
    pub fn force_of(&self, id: AtomId) -> Result<Vec3, ForceError> {
        Ok(self.force(self.slot_of(id)? as usize))
    }

    pub fn virials(&self) -> Option<Vec<Virial>> {
        self.virials
            .as_ref()
            .map(|v| v.to_vec().into_iter().map(|vals| Virial { vals }).collect())
    }
}

// End of File
