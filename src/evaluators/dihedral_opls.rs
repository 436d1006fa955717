// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use super::Evaluator;
use crate::geometry::{TorsionGeometry, EPSILON};
use bytemuck::{Pod, Zeroable};
use common::Vec3;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::mem;

/// Coefficients of one OPLS torsion type.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct DihedralOplsType {
    pub coefs: [f32; 4],
}

const_assert_eq!(mem::size_of::<DihedralOplsType>(), 16);

impl DihedralOplsType {
    pub fn new(coefs: [f32; 4]) -> Self {
        Self { coefs }
    }
}

/// The OPLS torsion
///
/// `E = 1/2 (k0 (1 + cos phi) + k1 (1 - cos 2phi) + k2 (1 + cos 3phi) + k3 (1 - cos 4phi))`.
#[derive(Copy, Clone, Debug, Default)]
pub struct DihedralOplsEvaluator;

impl DihedralOplsEvaluator {
    /// The derivative used to scale the torsion forces,
    /// `1/2 (k0 - 2 k1 sin 2phi / sin phi + 3 k2 sin 3phi / sin phi - 4 k3 sin 4phi / sin phi)`,
    /// which is `dE/d(cos phi)`.
    ///
    /// `|sin phi|` is floored at [`EPSILON`], keeping its sign, so the result stays finite at
    /// `phi = 0` and `phi = pi`.
    pub fn d_potential(&self, params: &DihedralOplsType, phi: f32) -> f32 {
        let [k0, k1, k2, k3] = params.coefs;
        let mut sin_phi = phi.sin();
        if sin_phi.abs() < EPSILON {
            sin_phi = EPSILON.copysign(sin_phi);
        }
        let inv_sin_phi = 1.0 / sin_phi;
        0.5 * (k0 - 2.0 * k1 * (2.0 * phi).sin() * inv_sin_phi
            + 3.0 * k2 * (3.0 * phi).sin() * inv_sin_phi
            - 4.0 * k3 * (4.0 * phi).sin() * inv_sin_phi)
    }

    /// Torsion energy at `phi`.
    pub fn potential(&self, params: &DihedralOplsType, phi: f32) -> f32 {
        let [k0, k1, k2, k3] = params.coefs;
        0.5 * (k0 * (1.0 + phi.cos())
            + k1 * (1.0 - (2.0 * phi).cos())
            + k2 * (1.0 + (3.0 * phi).cos())
            + k3 * (1.0 - (4.0 * phi).cos()))
    }

    /// Forces on all four atoms.
    pub fn forces(&self, params: &DihedralOplsType, geometry: &TorsionGeometry) -> [Vec3; 4] {
        geometry.distribute(self.derivative(params, geometry))
    }
}

impl Evaluator for DihedralOplsEvaluator {
    type Params = DihedralOplsType;
    type Geometry = TorsionGeometry;

    fn derivative(&self, params: &DihedralOplsType, geometry: &TorsionGeometry) -> f32 {
        self.d_potential(params, geometry.phi)
    }

    fn force(&self, params: &DihedralOplsType, geometry: &TorsionGeometry, participant: usize) -> Vec3 {
        self.forces(params, geometry)[participant]
    }
}

// End of File
