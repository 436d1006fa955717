// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Evaluators turn local geometry and a parameter record into forces.
//!
//! Evaluators are pure: they hold only constants, touch no device memory, and are shared by every
//! thread of a launch.  The kernels own traversal and memory access, so a new interaction kind
//! needs a new evaluator and nothing else.

mod dihedral_opls;
mod e3b;

pub use dihedral_opls::{DihedralOplsEvaluator, DihedralOplsType};
pub use e3b::{E3bEvaluator, E3bParams, SwitchedExp};

use crate::geometry::TrimerDistances;
use common::Vec3;

/// An evaluator for a bonded interaction with per-type parameters.
pub trait Evaluator: Sync {
    /// One record of the parameter table.
    type Params: Copy;
    /// Local geometry of one interaction.
    type Geometry;

    /// Derivative of the potential with respect to the interaction's generalized coordinate.
    fn derivative(&self, params: &Self::Params, geometry: &Self::Geometry) -> f32;

    /// Force on participant `participant` of the interaction.
    fn force(&self, params: &Self::Params, geometry: &Self::Geometry, participant: usize) -> Vec3;
}

/// An evaluator for three-body water corrections.
///
/// The three-body kernel calls it for every candidate trimer of a base molecule; forces are
/// accumulated for the three atoms of the base molecule only.
pub trait ThreeBodyEvaluator: Sync {
    /// Two-body force on the base oxygen, given the O-O vector pointing at it.
    fn two_body_force(&self, r: Vec3, magnitude: f32) -> Vec3;

    /// How many of four O-H distances lie within the three-body cutoff.
    fn count_within_cutoff(&self, magnitudes: [f32; 4]) -> u32;

    /// Switched exponential of one O-H distance, with its derivative.
    fn three_body_force_scalar(&self, magnitude: f32) -> SwitchedExp;

    /// Adds the three-body force of one trimer to the base molecule's `[oxygen, hydrogen,
    /// hydrogen]` accumulators.
    ///
    /// `pair_scalars` are the switched exponentials of the first four contacts, which depend only
    /// on the base molecule and its partner `j` and are reused across every third molecule.
    fn three_body_force(
        &self,
        forces: &mut [Vec3; 3],
        pair_scalars: &[SwitchedExp; 4],
        trimer: &TrimerDistances,
    );
}

// End of File
