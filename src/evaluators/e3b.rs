// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! The E3B explicit three-body water correction.
//!
//! A trimer's energy is a sum over pairs of intermolecular O-H contacts that together touch all
//! three molecules.  Each contact contributes a switched exponential of its length, and each pair
//! is weighted by the kind of hydrogen-bond pattern it forms: both hydrogens donated by one
//! molecule (type A), a donor-acceptor chain (type B), or both accepted by one oxygen (type C).
//! A repulsive O-O exponential is added for every pair of molecules.

use super::ThreeBodyEvaluator;
use crate::geometry::TrimerDistances;
use common::Vec3;
use serde::{Deserialize, Serialize};

/// E3B constants.  Energies in kJ/mol, lengths in angstroms.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct E3bParams {
    /// Type A (double donor) prefactor.
    pub ea: f32,
    /// Type B (donor-acceptor chain) prefactor.
    pub eb: f32,
    /// Type C (double acceptor) prefactor.
    pub ec: f32,
    /// Decay of the three-body exponential.
    pub k3: f32,
    /// Two-body prefactor.
    pub e2: f32,
    /// Decay of the two-body exponential.
    pub k2: f32,
    /// Start of the three-body switching region.
    pub rs: f32,
    /// Three-body cutoff.
    pub rc3: f32,
    /// Two-body cutoff.
    pub rc2: f32,
}

impl E3bParams {
    /// The E3B3 parameterization.
    pub const E3B3: Self = Self {
        ea: 150.0,
        eb: -1005.0,
        ec: 1880.0,
        k3: 1.907,
        e2: 453000.0,
        k2: 4.872,
        rs: 5.0,
        rc3: 5.2,
        rc2: 5.2,
    };
}

impl Default for E3bParams {
    fn default() -> Self {
        Self::E3B3
    }
}

/// `f(r)` and `df/dr` for the switched three-body exponential.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SwitchedExp {
    pub value: f32,
    pub derivative: f32,
}

impl SwitchedExp {
    pub const ZERO: Self = Self {
        value: 0.0,
        derivative: 0.0,
    };
}

#[derive(Copy, Clone, Debug)]
struct OhContact {
    donor: usize,
    hydrogen: usize,
    acceptor: usize,
}

const fn oh(donor: usize, hydrogen: usize, acceptor: usize) -> OhContact {
    OhContact {
        donor,
        hydrogen,
        acceptor,
    }
}

// Same order as `geometry::contact`; molecules are numbered from zero.
const CONTACTS: [OhContact; 12] = [
    oh(1, 0, 0),
    oh(1, 1, 0),
    oh(0, 0, 1),
    oh(0, 1, 1),
    oh(2, 0, 0),
    oh(2, 1, 0),
    oh(2, 0, 1),
    oh(2, 1, 1),
    oh(0, 0, 2),
    oh(0, 1, 2),
    oh(1, 0, 2),
    oh(1, 1, 2),
];

#[derive(Clone, Debug)]
pub struct E3bEvaluator {
    params: E3bParams,
    inv_switch_width_cubed: f32,
    /// Energy prefactor of every contact pair, zero for pairs that miss a molecule.
    couplings: [[f32; 12]; 12],
}

impl E3bEvaluator {
    pub fn new(params: E3bParams) -> Self {
        let couplings = std::array::from_fn(|i| {
            std::array::from_fn(|j| Self::coupling(&params, CONTACTS[i], CONTACTS[j]))
        });
        Self {
            params,
            inv_switch_width_cubed: 1.0 / (params.rc3 - params.rs).powi(3),
            couplings,
        }
    }

    pub fn params(&self) -> &E3bParams {
        &self.params
    }

    fn coupling(params: &E3bParams, a: OhContact, b: OhContact) -> f32 {
        let molecules = (1 << a.donor) | (1 << a.acceptor) | (1 << b.donor) | (1 << b.acceptor);
        if molecules != 0b111 {
            0.0
        } else if a.donor == b.donor {
            params.ea
        } else if a.acceptor == b.acceptor {
            params.ec
        } else {
            params.eb
        }
    }

    /// Two-body energy at O-O distance `magnitude`.
    pub fn two_body_energy(&self, magnitude: f32) -> f32 {
        if magnitude >= self.params.rc2 {
            return 0.0;
        }
        self.params.e2 * (-self.params.k2 * magnitude).exp()
    }

    /// Three-body energy of one trimer.
    pub fn trimer_energy(&self, trimer: &TrimerDistances) -> f32 {
        let f: [f32; 12] =
            std::array::from_fn(|h| self.three_body_force_scalar(trimer.magnitudes[h]).value);
        let mut energy = 0.0;
        for h in 0..12 {
            for g in h + 1..12 {
                energy += self.couplings[h][g] * f[h] * f[g];
            }
        }
        energy
    }
}

impl Default for E3bEvaluator {
    fn default() -> Self {
        Self::new(E3bParams::default())
    }
}

impl ThreeBodyEvaluator for E3bEvaluator {
    fn two_body_force(&self, r: Vec3, magnitude: f32) -> Vec3 {
        if magnitude >= self.params.rc2 {
            return Vec3::ZERO;
        }
        let scalar = self.params.e2 * self.params.k2 * (-self.params.k2 * magnitude).exp();
        r * (scalar / magnitude)
    }

    fn count_within_cutoff(&self, magnitudes: [f32; 4]) -> u32 {
        magnitudes
            .iter()
            .filter(|&&r| r < self.params.rc3)
            .count() as u32
    }

    fn three_body_force_scalar(&self, r: f32) -> SwitchedExp {
        let E3bParams { k3, rs, rc3, .. } = self.params;
        if r >= rc3 {
            return SwitchedExp::ZERO;
        }
        let exp = (-k3 * r).exp();
        if r < rs {
            return SwitchedExp {
                value: exp,
                derivative: -k3 * exp,
            };
        }
        let u = rc3 - r;
        let switch = u * u * (rc3 + 2.0 * r - 3.0 * rs) * self.inv_switch_width_cubed;
        let d_switch = 6.0 * u * (rs - r) * self.inv_switch_width_cubed;
        SwitchedExp {
            value: exp * switch,
            derivative: exp * (d_switch - k3 * switch),
        }
    }

    fn three_body_force(
        &self,
        forces: &mut [Vec3; 3],
        pair_scalars: &[SwitchedExp; 4],
        trimer: &TrimerDistances,
    ) {
        let f: [SwitchedExp; 12] = std::array::from_fn(|h| {
            if h < 4 {
                pair_scalars[h]
            } else {
                self.three_body_force_scalar(trimer.magnitudes[h])
            }
        });

        for (h, contact) in CONTACTS.iter().enumerate() {
            if f[h].derivative == 0.0 {
                continue;
            }
            let partners: f32 = (0..12).map(|g| self.couplings[h][g] * f[g].value).sum();
            if partners == 0.0 {
                continue;
            }
            // dE/dr along the contact, pointing from the oxygen to the hydrogen.
            let along = trimer.vectors[h] * (partners * f[h].derivative / trimer.magnitudes[h]);
            if contact.acceptor == 0 {
                forces[0] += along;
            }
            if contact.donor == 0 {
                forces[1 + contact.hydrogen] -= along;
            }
        }
    }
}

// End of File
