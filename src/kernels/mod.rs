// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Force kernels.
//!
//! Each entry point is one launch over an interaction list, with one thread per dihedral or per
//! molecule.  Threads add their forces into the particle state's accumulators atomically, so any
//! number of kernels may contribute to the same step.

mod dihedral;
mod three_body;

pub use dihedral::{compute_energy_dihedral, compute_force_dihedral, DihedralInputs};
pub use three_body::{compute_energy_e3b, compute_force_e3b, E3bInputs};

/// Threads per block for every force kernel.
pub const PERBLOCK: u32 = 256;

// End of File
