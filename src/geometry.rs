// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Local geometry handed from the kernels to the evaluators.

use common::{compute_virial, Bounds, Vec3, Virial};

/// Floor applied to the sines of the bond angles, and to `|sin phi|` in the torsion derivative.
pub const EPSILON: f32 = 0.00001;

/// The geometry of one dihedral quadruplet, in the bond-director decomposition.
///
/// Directors run `p0 - p1`, `p2 - p1` and `p3 - p2`.  `phi` lies in `[-pi, pi]`, signed by the
/// handedness of the three directors.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TorsionGeometry {
    pub directors: [Vec3; 3],
    pub inv_lens: [f32; 3],
    pub inv_len_sqrs: [f32; 3],
    /// Inverse length products of the director pairs `(0, 1)` and `(1, 2)`.
    pub inv_mag_prods: [f32; 2],
    /// Cosines of the two bond angles.
    pub c12_mags: [f32; 2],
    /// Squared inverse sines of the two bond angles, then the product of the (unsquared) inverse
    /// sines.
    pub sc_values: [f32; 3],
    /// Cosine between the outer directors.
    pub c0: f32,
    /// Cosine of the torsion angle, clamped to `[-1, 1]`.
    pub c: f32,
    pub phi: f32,
}

impl TorsionGeometry {
    /// Geometry of four positions that are already unwrapped into one periodic image.
    pub fn new(positions: [Vec3; 4]) -> Self {
        Self::from_directors([
            positions[0] - positions[1],
            positions[2] - positions[1],
            positions[3] - positions[2],
        ])
    }

    /// Geometry of four stored positions, each bond taken at its minimum image.
    pub fn from_wrapped(positions: [Vec3; 4], bounds: &Bounds) -> Self {
        Self::from_directors([
            bounds.min_image(positions[0] - positions[1]),
            bounds.min_image(positions[2] - positions[1]),
            bounds.min_image(positions[3] - positions[2]),
        ])
    }

    pub fn from_directors(directors: [Vec3; 3]) -> Self {
        let mut inv_lens = [0.0; 3];
        let mut inv_len_sqrs = [0.0; 3];
        for i in 0..3 {
            let len_sqr = directors[i].length_squared();
            inv_len_sqrs[i] = 1.0 / len_sqr;
            inv_lens[i] = 1.0 / len_sqr.sqrt();
        }

        let c0 = directors[0].dot(directors[2]) * inv_lens[0] * inv_lens[2];

        let mut inv_mag_prods = [0.0; 2];
        let mut c12_mags = [0.0; 2];
        for i in 0..2 {
            let mut dot = directors[i + 1].dot(directors[i]);
            if i == 1 {
                dot = -dot;
            }
            inv_mag_prods[i] = inv_lens[i] * inv_lens[i + 1];
            c12_mags[i] = dot * inv_mag_prods[i];
        }

        let mut sc_values = [0.0; 3];
        for i in 0..2 {
            let sin = (1.0 - c12_mags[i] * c12_mags[i]).max(0.0).sqrt().max(EPSILON);
            sc_values[i] = 1.0 / sin;
        }
        sc_values[2] = sc_values[0] * sc_values[1];
        sc_values[0] *= sc_values[0];
        sc_values[1] *= sc_values[1];

        let c = ((c0 + c12_mags[0] * c12_mags[1]) * sc_values[2]).clamp(-1.0, 1.0);

        let normal = directors[0].cross(directors[1]);
        let dx = normal.dot(directors[2]) * inv_lens[2] / normal.length();
        let mut phi = c.acos();
        if dx < 0.0 {
            phi = -phi;
        }

        Self {
            directors,
            inv_lens,
            inv_len_sqrs,
            inv_mag_prods,
            c12_mags,
            sc_values,
            c0,
            c,
            phi,
        }
    }

    /// Distributes a torsion potential derivative over the four atoms.
    ///
    /// The four forces always sum to zero.
    pub fn distribute(&self, d_potential: f32) -> [Vec3; 4] {
        let [d0, d1, d2] = self.directors;
        let [sc0, sc1, sc2] = self.sc_values;
        let c = self.c * d_potential;
        let sc2 = sc2 * d_potential;

        let a11 = c * self.inv_len_sqrs[0] * sc0;
        let a22 = -self.inv_len_sqrs[1] * (2.0 * self.c0 * sc2 - c * (sc0 + sc1));
        let a33 = c * self.inv_len_sqrs[2] * sc1;
        let a12 = -self.inv_mag_prods[0] * (self.c12_mags[0] * c * sc0 + self.c12_mags[1] * sc2);
        let a13 = -self.inv_lens[0] * self.inv_lens[2] * sc2;
        let a23 = self.inv_mag_prods[1] * (self.c12_mags[1] * c * sc1 + self.c12_mags[0] * sc2);

        let s = a12 * d0 + a22 * d1 + a23 * d2;
        let f0 = a11 * d0 + a12 * d1 + a13 * d2;
        let f3 = a13 * d0 + a23 * d1 + a33 * d2;
        [f0, -s - f0, s - f3, f3]
    }

    /// Virial of the four forces returned by [`TorsionGeometry::distribute`].
    pub fn virial(&self, forces: &[Vec3; 4]) -> Virial {
        let [d0, d1, d2] = self.directors;
        let mut virial = Virial::ZERO;
        compute_virial(&mut virial, forces[0], d0);
        compute_virial(&mut virial, forces[2], d1);
        compute_virial(&mut virial, forces[3], d1 + d2);
        virial
    }
}

/// Index of each intermolecular O-H contact of a trimer in [`TrimerDistances`].
///
/// `B2A1` is the vector from the oxygen (`a`) of molecule 1 to the first hydrogen (`b`) of
/// molecule 2, and so on.  The first four connect the base molecule to its partner `j`; the other
/// eight involve the third molecule.
pub mod contact {
    pub const B2A1: usize = 0;
    pub const C2A1: usize = 1;
    pub const B1A2: usize = 2;
    pub const C1A2: usize = 3;
    pub const B3A1: usize = 4;
    pub const C3A1: usize = 5;
    pub const B3A2: usize = 6;
    pub const C3A2: usize = 7;
    pub const B1A3: usize = 8;
    pub const C1A3: usize = 9;
    pub const B2A3: usize = 10;
    pub const C2A3: usize = 11;
}

/// Minimum-image O-H vectors (hydrogen minus oxygen) and their lengths for the twelve
/// intermolecular contacts of a trimer.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TrimerDistances {
    pub vectors: [Vec3; 12],
    pub magnitudes: [f32; 12],
}

impl TrimerDistances {
    #[inline]
    pub fn set(&mut self, contact: usize, r: Vec3) {
        self.vectors[contact] = r;
        self.magnitudes[contact] = r.length();
    }

    /// All twelve contacts of three molecules given as `[oxygen, hydrogen, hydrogen]`.
    pub fn from_molecules(molecules: &[[Vec3; 3]; 3], bounds: &Bounds) -> Self {
        use contact::*;
        let [m1, m2, m3] = molecules;
        let mut trimer = Self::default();
        for (idx, h, o) in [
            (B2A1, m2[1], m1[0]),
            (C2A1, m2[2], m1[0]),
            (B1A2, m1[1], m2[0]),
            (C1A2, m1[2], m2[0]),
            (B3A1, m3[1], m1[0]),
            (C3A1, m3[2], m1[0]),
            (B3A2, m3[1], m2[0]),
            (C3A2, m3[2], m2[0]),
            (B1A3, m1[1], m3[0]),
            (C1A3, m1[2], m3[0]),
            (B2A3, m2[1], m3[0]),
            (C2A3, m2[2], m3[0]),
        ] {
            trimer.set(idx, bounds.min_image(h - o));
        }
        trimer
    }
}

// End of File
