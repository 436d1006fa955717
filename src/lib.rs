// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! # molforce
//!
//! Force kernels for molecular dynamics, written against the accelerator model of
//! [`molforce-device`](device).  Two interaction kinds are provided:
//!
//! - OPLS dihedrals, one thread per quadruplet of atoms, with per-type parameters read from a
//!   texture-backed [`DeviceParameterStore`] or staged in shared memory.
//! - The E3B three-body water correction, one thread per molecule, walking a warp-strided
//!   [`MoleculeNeighborList`] over every trimer the molecule forms with its partners.
//!
//! Kernels are split from the physics: an evaluator ([`Evaluator`], [`ThreeBodyEvaluator`]) maps
//! local geometry and parameters to forces, and the kernels in [`kernels`] handle traversal,
//! periodic images, id translation and atomic accumulation.  The [`potentials`] wrap both for
//! host code that builds interaction lists by atom id.

pub mod config;
mod error;
pub mod evaluators;
pub mod geometry;
pub mod interactions;
pub mod kernels;
pub mod neighbor_list;
pub mod potentials;
pub mod state;

pub use config::{DihedralConfig, ForceConfig, SharedParamPolicy};
pub use error::{ConfigError, ForceError};
pub use evaluators::{
    DihedralOplsEvaluator, DihedralOplsType, E3bEvaluator, E3bParams, Evaluator,
    ThreeBodyEvaluator,
};
pub use interactions::{DihedralRecord, MoleculeRecord};
pub use neighbor_list::{DeviceNeighborList, MoleculeNeighborList};
pub use potentials::{DihedralOplsPotential, E3bPotential};
pub use state::ParticleState;

pub use common::{AtomId, Bounds, Vec3, Vec4, Virial};
pub use device::{Device, DeviceError, DeviceParameterStore, DeviceProperties, GlobalArray};

/// Starts logging for molforce and its accelerator crates.
///
/// Logging can only be initialized once per process; later calls are ignored.
pub fn init_logging() {
    logging::Logging::new(vec![
        env!("CARGO_PKG_NAME"),
        "molforce_common",
        "molforce_device",
        "molforce_logging",
    ])
    .init();
}

// End of File
