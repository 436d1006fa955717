// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use super::PERBLOCK;
use crate::{
    evaluators::{SwitchedExp, ThreeBodyEvaluator},
    geometry::{contact::*, TrimerDistances},
    interactions::MoleculeRecord,
    neighbor_list::{base_index, index, DeviceNeighborList},
    state::ParticleState,
    ForceError,
};
use common::{pack, xyz, Bounds, Vec3, Vec4};
use device::{
    BlockContext, Device, ForceAccumulator, GlobalArray, Kernel, LaunchConfig, ThreadContext,
};

/// Everything a three-body launch reads.
pub struct E3bInputs<'a> {
    pub molecules: &'a GlobalArray<MoleculeRecord>,
    pub neighbor_list: &'a DeviceNeighborList,
    pub state: &'a ParticleState,
    pub compute_virials: bool,
}

struct E3bKernel<'a, E> {
    molecules: &'a [MoleculeRecord],
    counts: &'a [u32],
    neighbors: &'a [u32],
    cumul_max_per_block: &'a [u32],
    positions: &'a [Vec4],
    bounds: Bounds,
    forces: &'a ForceAccumulator,
    evaluator: &'a E,
}

impl<E> E3bKernel<'_, E> {
    #[inline]
    fn molecule(&self, idx: usize) -> ([usize; 3], [Vec3; 3]) {
        let atoms = self.molecules[idx].atoms.map(|a| a as usize);
        (atoms, atoms.map(|a| xyz(self.positions[a])))
    }
}

impl<E: ThreeBodyEvaluator> Kernel for E3bKernel<'_, E> {
    type Shared = ();

    fn stage(&self, _block: &BlockContext) {}

    fn run(&self, thread: &ThreadContext, _shared: &()) {
        let idx = thread.global_idx();
        if idx >= self.molecules.len() {
            return;
        }
        let eval = self.evaluator;
        let bounds = &self.bounds;

        let (atoms, [a1, b1, c1]) = self.molecule(idx);
        let mut fs = [Vec3::ZERO; 3];

        let n_neighbors = self.counts[idx] as usize;
        let base = base_index(
            self.cumul_max_per_block,
            thread.block_dim,
            thread.warp_size,
            thread.block_idx,
            thread.thread_idx,
        );

        for j in 0..n_neighbors {
            let j_idx = self.neighbors[index(base, thread.warp_size, j)] as usize;
            let (_, [a2, b2, c2]) = self.molecule(j_idx);

            let mut pair = TrimerDistances::default();
            pair.set(B2A1, bounds.min_image(b2 - a1));
            pair.set(C2A1, bounds.min_image(c2 - a1));
            pair.set(B1A2, bounds.min_image(b1 - a2));
            pair.set(C1A2, bounds.min_image(c1 - a2));

            let r_a1a2 = bounds.min_image(a1 - a2);
            fs[0] += eval.two_body_force(r_a1a2, r_a1a2.length());

            let pair_magnitudes = [
                pair.magnitudes[B2A1],
                pair.magnitudes[C2A1],
                pair.magnitudes[B1A2],
                pair.magnitudes[C1A2],
            ];
            let pair_count = eval.count_within_cutoff(pair_magnitudes);
            let pair_scalars: [SwitchedExp; 4] =
                pair_magnitudes.map(|r| eval.three_body_force_scalar(r));

            // Each unordered trimer of this base molecule is visited once.
            for k in j + 1..n_neighbors {
                let k_idx = self.neighbors[index(base, thread.warp_size, k)] as usize;
                let (_, [a3, b3, c3]) = self.molecule(k_idx);

                let mut trimer = pair;
                trimer.set(B3A1, bounds.min_image(b3 - a1));
                trimer.set(C3A1, bounds.min_image(c3 - a1));
                trimer.set(B3A2, bounds.min_image(b3 - a2));
                trimer.set(C3A2, bounds.min_image(c3 - a2));
                trimer.set(B1A3, bounds.min_image(b1 - a3));
                trimer.set(C1A3, bounds.min_image(c1 - a3));
                trimer.set(B2A3, bounds.min_image(b2 - a3));
                trimer.set(C2A3, bounds.min_image(c2 - a3));

                let m = &trimer.magnitudes;
                let count = pair_count
                    + eval.count_within_cutoff([m[B3A1], m[C3A1], m[B3A2], m[C3A2]])
                    + eval.count_within_cutoff([m[B1A3], m[C1A3], m[B2A3], m[C2A3]]);

                // With at most one short contact every term vanishes.
                if count > 1 {
                    eval.three_body_force(&mut fs, &pair_scalars, &trimer);
                }
            }
        }

        for (atom, force) in atoms.iter().zip(fs) {
            self.forces.add(*atom, pack(force, 0.0).to_array());
        }
    }
}

/// Adds the two- and three-body forces of every molecule in `inputs` to the particle state.
///
/// The neighbor list must be laid out for the device's execution group width and for
/// [`PERBLOCK`]-thread blocks.  Forces obey Newton's third law only in aggregate: each molecule
/// receives the forces of the trimers it is the base of, so a trimer is complete only when all
/// three of its molecules list the other two as neighbors.
pub fn compute_force_e3b<E: ThreeBodyEvaluator>(
    device: &Device,
    inputs: &E3bInputs<'_>,
    evaluator: &E,
) -> Result<(), ForceError> {
    let list = inputs.neighbor_list;
    if list.group_width != device.warp_size() {
        return Err(ForceError::GroupWidthMismatch {
            list: list.group_width,
            device: device.warp_size(),
        });
    }
    if list.block_dim != PERBLOCK {
        return Err(ForceError::BlockDimMismatch {
            list: list.block_dim,
            launch: PERBLOCK,
        });
    }
    let n_molecules = inputs.molecules.len();
    if list.counts.len() != n_molecules {
        return Err(ForceError::NeighborListSize {
            expected: n_molecules,
            actual: list.counts.len(),
        });
    }
    if inputs.compute_virials {
        log::warn!("Three-body virials are not implemented; skipping virial accumulation");
    }

    let state = inputs.state;
    let kernel = E3bKernel {
        molecules: inputs.molecules.as_slice(),
        counts: list.counts.as_slice(),
        neighbors: list.indices.as_slice(),
        cumul_max_per_block: list.cumul_max_per_block.as_slice(),
        positions: state.positions().as_slice(),
        bounds: *state.bounds(),
        forces: state.force_accumulator(),
        evaluator,
    };
    let config = LaunchConfig::for_num_elems(n_molecules as u32, PERBLOCK);
    device.launch(&config, &kernel)?;

    log::debug!("Computed three-body forces for {} molecules", n_molecules);
    Ok(())
}

/// Per-atom three-body energies.  Not implemented; always fails with
/// [`ForceError::EnergyUnimplemented`].
pub fn compute_energy_e3b<E: ThreeBodyEvaluator>(
    device: &Device,
    inputs: &E3bInputs<'_>,
    evaluator: &E,
    per_particle_energy: &mut [f32],
) -> Result<(), ForceError> {
    let _ = (device, inputs, evaluator, per_particle_energy);
    Err(ForceError::EnergyUnimplemented("three-body water"))
}

// End of File
