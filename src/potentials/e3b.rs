// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::{
    evaluators::{E3bEvaluator, E3bParams},
    interactions::MoleculeRecord,
    kernels::{compute_energy_e3b, compute_force_e3b, E3bInputs},
    neighbor_list::{DeviceNeighborList, MoleculeNeighborList},
    state::ParticleState,
    ForceError,
};
use common::AtomId;
use device::{Device, GlobalArray};
use rayon::prelude::*;

/// The E3B three-body water correction over a particle state.
pub struct E3bPotential {
    device: Device,
    evaluator: E3bEvaluator,
    molecules: Vec<[AtomId; 3]>,
    records: Option<GlobalArray<MoleculeRecord>>,
}

impl E3bPotential {
    pub fn new(device: &Device, params: E3bParams) -> Self {
        Self {
            device: device.clone(),
            evaluator: E3bEvaluator::new(params),
            molecules: Vec::new(),
            records: None,
        }
    }

    pub fn evaluator(&self) -> &E3bEvaluator {
        &self.evaluator
    }

    pub fn num_molecules(&self) -> usize {
        self.molecules.len()
    }

    /// Adds a water molecule and returns its index, which is also its index in neighbor lists.
    pub fn add_molecule(&mut self, oxygen: AtomId, h1: AtomId, h2: AtomId) -> usize {
        self.molecules.push([oxygen, h1, h2]);
        self.records = None;
        self.molecules.len() - 1
    }

    /// Translates every molecule's atom ids to slots of `state`.
    ///
    /// Must be repeated whenever atoms are reordered.
    pub fn prepare_for_run(&mut self, state: &ParticleState) -> Result<(), ForceError> {
        let records = self
            .molecules
            .par_iter()
            .map(|ids| {
                let mut atoms = [0; 3];
                for (slot, &id) in atoms.iter_mut().zip(ids) {
                    *slot = state.slot_of(id)?;
                }
                Ok(MoleculeRecord { atoms })
            })
            .collect::<Result<Vec<_>, ForceError>>()?;

        log::info!("Prepared {} E3B molecules", records.len());
        self.records = Some(GlobalArray::from_host(&self.device, &records)?);
        Ok(())
    }

    /// Uploads `neighbors` and adds the E3B forces to `state`.
    pub fn compute(
        &self,
        state: &ParticleState,
        neighbors: &MoleculeNeighborList,
        compute_virials: bool,
    ) -> Result<(), ForceError> {
        let neighbors = neighbors.upload(&self.device)?;
        self.compute_on_device(state, &neighbors, compute_virials)
    }

    /// Adds the E3B forces to `state` using an already uploaded neighbor list.
    pub fn compute_on_device(
        &self,
        state: &ParticleState,
        neighbors: &DeviceNeighborList,
        compute_virials: bool,
    ) -> Result<(), ForceError> {
        let molecules = self.records.as_ref().ok_or(ForceError::NotPrepared)?;
        compute_force_e3b(
            &self.device,
            &E3bInputs {
                molecules,
                neighbor_list: neighbors,
                state,
                compute_virials,
            },
            &self.evaluator,
        )
    }

    /// Per-atom E3B energies.
    pub fn single_point_energy(
        &self,
        state: &ParticleState,
        neighbors: &DeviceNeighborList,
    ) -> Result<Vec<f32>, ForceError> {
        let molecules = self.records.as_ref().ok_or(ForceError::NotPrepared)?;
        let mut energies = vec![0.0; state.num_atoms()];
        compute_energy_e3b(
            &self.device,
            &E3bInputs {
                molecules,
                neighbor_list: neighbors,
                state,
                compute_virials: false,
            },
            &self.evaluator,
            &mut energies,
        )?;
        Ok(energies)
    }
}

// End of File
