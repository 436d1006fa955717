// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use super::PERBLOCK;
use crate::{
    evaluators::Evaluator, geometry::TorsionGeometry, interactions::DihedralRecord,
    state::ParticleState, ForceError,
};
use bytemuck::Pod;
use common::{pack, xyz, Bounds, Vec3, Vec4};
use device::{
    BlockContext, Device, DeviceParameterStore, ForceAccumulator, GlobalArray, Kernel,
    LaunchConfig, TextureView, ThreadContext, VirialAccumulator,
};
use std::mem;

/// Everything a dihedral launch reads.
pub struct DihedralInputs<'a, P: Pod + Send + Sync> {
    pub dihedrals: &'a GlobalArray<DihedralRecord>,
    pub parameters: &'a DeviceParameterStore<P>,
    pub state: &'a ParticleState,
    /// Stage the whole parameter table in shared memory before the threads run.
    pub use_shared_params: bool,
    pub compute_virials: bool,
}

struct DihedralKernel<'a, E: Evaluator>
where
    E::Params: Pod + Send + Sync,
{
    dihedrals: &'a [DihedralRecord],
    positions: &'a [Vec4],
    id_to_idx: &'a [u32],
    bounds: Bounds,
    parameters: TextureView<'a, E::Params>,
    use_shared_params: bool,
    forces: &'a ForceAccumulator,
    virials: Option<&'a VirialAccumulator>,
    evaluator: &'a E,
}

impl<E> Kernel for DihedralKernel<'_, E>
where
    E: Evaluator<Geometry = TorsionGeometry>,
    E::Params: Pod + Send + Sync,
{
    type Shared = Vec<E::Params>;

    fn stage(&self, _block: &BlockContext) -> Vec<E::Params> {
        if !self.use_shared_params {
            return Vec::new();
        }
        (0..self.parameters.len())
            .map(|i| self.parameters.fetch(i))
            .collect()
    }

    fn run(&self, thread: &ThreadContext, shared: &Vec<E::Params>) {
        let idx = thread.global_idx();
        if idx >= self.dihedrals.len() {
            return;
        }
        let dihedral = &self.dihedrals[idx];
        let param_type = dihedral.param_type as usize;
        let params = if self.use_shared_params {
            shared[param_type]
        } else {
            self.parameters.fetch(param_type)
        };

        let mut slots = [0usize; 4];
        let mut positions = [Vec3::ZERO; 4];
        for i in 0..4 {
            let slot = self.id_to_idx[dihedral.ids[i] as usize] as usize;
            slots[i] = slot;
            positions[i] = xyz(self.positions[slot]);
        }
        let geometry = TorsionGeometry::from_wrapped(positions, &self.bounds);

        let d_potential = self.evaluator.derivative(&params, &geometry);
        let forces = geometry.distribute(d_potential);
        for (slot, force) in slots.iter().zip(&forces) {
            self.forces.add(*slot, pack(*force, 0.0).to_array());
        }

        if let Some(virials) = self.virials {
            // The whole dihedral's virial goes to its first atom.
            virials.add(slots[0], geometry.virial(&forces).vals);
        }
    }
}

/// Adds the forces of every dihedral in `inputs` to the particle state.
pub fn compute_force_dihedral<E>(
    device: &Device,
    inputs: &DihedralInputs<'_, E::Params>,
    evaluator: &E,
) -> Result<(), ForceError>
where
    E: Evaluator<Geometry = TorsionGeometry>,
    E::Params: Pod + Send + Sync,
{
    let state = inputs.state;
    let virials = if inputs.compute_virials {
        Some(
            state
                .virial_accumulator()
                .ok_or(ForceError::VirialsUnavailable)?,
        )
    } else {
        None
    };

    let n_dihedrals = inputs.dihedrals.len();
    let shared_mem_bytes = if inputs.use_shared_params {
        inputs.parameters.size() * mem::size_of::<E::Params>()
    } else {
        0
    };
    let config =
        LaunchConfig::for_num_elems(n_dihedrals as u32, PERBLOCK).with_shared_mem(shared_mem_bytes);

    let kernel = DihedralKernel {
        dihedrals: inputs.dihedrals.as_slice(),
        positions: state.positions().as_slice(),
        id_to_idx: state.id_to_idx().as_slice(),
        bounds: *state.bounds(),
        parameters: inputs.parameters.texture(),
        use_shared_params: inputs.use_shared_params,
        forces: state.force_accumulator(),
        virials,
        evaluator,
    };
    device.launch(&config, &kernel)?;

    log::debug!(
        "Computed {} dihedrals ({} parameter types, shared: {}, virials: {})",
        n_dihedrals,
        inputs.parameters.size(),
        inputs.use_shared_params,
        inputs.compute_virials
    );
    Ok(())
}

/// Per-atom dihedral energies.  Not implemented; always fails with
/// [`ForceError::EnergyUnimplemented`].
pub fn compute_energy_dihedral<E>(
    device: &Device,
    inputs: &DihedralInputs<'_, E::Params>,
    evaluator: &E,
    per_particle_energy: &mut [f32],
) -> Result<(), ForceError>
where
    E: Evaluator<Geometry = TorsionGeometry>,
    E::Params: Pod + Send + Sync,
{
    let _ = (device, inputs, evaluator, per_particle_energy);
    Err(ForceError::EnergyUnimplemented("dihedrals"))
}

// End of File
