// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::{
    config::DihedralConfig,
    evaluators::{DihedralOplsEvaluator, DihedralOplsType},
    interactions::DihedralRecord,
    kernels::{compute_energy_dihedral, compute_force_dihedral, DihedralInputs},
    state::ParticleState,
    ForceError,
};
use common::AtomId;
use device::{Device, DeviceParameterStore, GlobalArray};
use rayon::prelude::*;
use std::{collections::BTreeMap, mem};

#[derive(Copy, Clone, Debug, PartialEq)]
enum Coefficients {
    Type(u32),
    Inline([f32; 4]),
}

#[derive(Copy, Clone, Debug)]
struct HostDihedral {
    ids: [AtomId; 4],
    coefs: Coefficients,
}

struct Prepared {
    records: GlobalArray<DihedralRecord>,
    parameters: DeviceParameterStore<DihedralOplsType>,
    use_shared_params: bool,
}

/// OPLS dihedrals over a particle state.
pub struct DihedralOplsPotential {
    device: Device,
    config: DihedralConfig,
    evaluator: DihedralOplsEvaluator,
    dihedrals: Vec<HostDihedral>,
    type_coefs: BTreeMap<u32, [f32; 4]>,
    prepared: Option<Prepared>,
}

impl DihedralOplsPotential {
    pub fn new(device: &Device, config: DihedralConfig) -> Self {
        Self {
            device: device.clone(),
            config,
            evaluator: DihedralOplsEvaluator,
            dihedrals: Vec::new(),
            type_coefs: BTreeMap::new(),
            prepared: None,
        }
    }

    pub fn num_dihedrals(&self) -> usize {
        self.dihedrals.len()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    /// Adds a dihedral over the atoms with `ids` and returns its index.
    ///
    /// With only `coefs`, the dihedral gets its own parameter record.  With only `type_id`, it
    /// shares the coefficients of that type, which must be set before `prepare_for_run`.  With
    /// both, the coefficients of `type_id` are set to `coefs`.
    ///
    /// # Panics
    ///
    /// Panics if neither `coefs` nor `type_id` is given.
    pub fn create_dihedral(
        &mut self,
        ids: [AtomId; 4],
        coefs: Option<[f32; 4]>,
        type_id: Option<u32>,
    ) -> usize {
        let coefs = match (coefs, type_id) {
            (Some(coefs), Some(type_id)) => {
                self.set_type_coefs(type_id, coefs);
                Coefficients::Type(type_id)
            }
            (None, Some(type_id)) => Coefficients::Type(type_id),
            (Some(coefs), None) => Coefficients::Inline(coefs),
            (None, None) => panic!("dihedral {ids:?} has neither coefficients nor a type"),
        };
        self.dihedrals.push(HostDihedral { ids, coefs });
        self.prepared = None;
        self.dihedrals.len() - 1
    }

    pub fn set_type_coefs(&mut self, type_id: u32, coefs: [f32; 4]) {
        self.type_coefs.insert(type_id, coefs);
        self.prepared = None;
    }

    /// Builds the device parameter table and interaction list.
    ///
    /// Types that are actually used are numbered densely in ascending id order, followed by one
    /// record per dihedral with inline coefficients.
    pub fn prepare_for_run(&mut self, state: &ParticleState) -> Result<(), ForceError> {
        let mut rows: BTreeMap<u32, u32> = BTreeMap::new();
        for dihedral in &self.dihedrals {
            if let Coefficients::Type(type_id) = dihedral.coefs {
                if !self.type_coefs.contains_key(&type_id) {
                    return Err(ForceError::UnknownParameterType(type_id));
                }
                rows.insert(type_id, 0);
            }
        }
        let mut table: Vec<DihedralOplsType> = Vec::with_capacity(rows.len());
        for (type_id, row) in rows.iter_mut() {
            *row = table.len() as u32;
            table.push(DihedralOplsType::new(self.type_coefs[type_id]));
        }
        let mut param_types = Vec::with_capacity(self.dihedrals.len());
        for dihedral in &self.dihedrals {
            param_types.push(match dihedral.coefs {
                Coefficients::Type(type_id) => rows[&type_id],
                Coefficients::Inline(coefs) => {
                    table.push(DihedralOplsType::new(coefs));
                    table.len() as u32 - 1
                }
            });
        }

        let records = self
            .dihedrals
            .par_iter()
            .zip(param_types.par_iter())
            .map(|(dihedral, &param_type)| {
                for id in dihedral.ids {
                    state.slot_of(id)?;
                }
                Ok(DihedralRecord::new(dihedral.ids, param_type))
            })
            .collect::<Result<Vec<_>, ForceError>>()?;

        let mut parameters = DeviceParameterStore::with_size(&self.device, table.len())?;
        parameters.write(&table)?;

        let table_bytes = table.len() * mem::size_of::<DihedralOplsType>();
        let use_shared_params = self
            .config
            .shared_params
            .use_shared(table_bytes, self.device.properties().shared_mem_per_block);

        log::info!(
            "Prepared {} dihedrals with {} parameter records ({} bytes, shared: {})",
            records.len(),
            table.len(),
            table_bytes,
            use_shared_params
        );

        self.prepared = Some(Prepared {
            records: GlobalArray::from_host(&self.device, &records)?,
            parameters,
            use_shared_params,
        });
        Ok(())
    }

    /// Parameter table of the last `prepare_for_run`.
    pub fn parameters(&self) -> Option<&DeviceParameterStore<DihedralOplsType>> {
        self.prepared.as_ref().map(|p| &p.parameters)
    }

    /// Whether the last `prepare_for_run` chose to stage parameters in shared memory.
    pub fn uses_shared_params(&self) -> Option<bool> {
        self.prepared.as_ref().map(|p| p.use_shared_params)
    }

    /// Adds the dihedral forces, and virials if requested, to `state`.
    pub fn compute(&self, state: &ParticleState, compute_virials: bool) -> Result<(), ForceError> {
        let prepared = self.prepared.as_ref().ok_or(ForceError::NotPrepared)?;
        compute_force_dihedral(
            &self.device,
            &DihedralInputs {
                dihedrals: &prepared.records,
                parameters: &prepared.parameters,
                state,
                use_shared_params: prepared.use_shared_params,
                compute_virials,
            },
            &self.evaluator,
        )
    }

    /// Per-atom dihedral energies.
    pub fn single_point_energy(&self, state: &ParticleState) -> Result<Vec<f32>, ForceError> {
        let prepared = self.prepared.as_ref().ok_or(ForceError::NotPrepared)?;
        let mut energies = vec![0.0; state.num_atoms()];
        compute_energy_dihedral(
            &self.device,
            &DihedralInputs {
                dihedrals: &prepared.records,
                parameters: &prepared.parameters,
                state,
                use_shared_params: prepared.use_shared_params,
                compute_virials: false,
            },
            &self.evaluator,
            &mut energies,
        )?;
        Ok(energies)
    }
}

// End of File
