// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::{
    mem,
    ops::{Add, AddAssign, Index, IndexMut},
};

/// The six independent components of a symmetric stress tensor, ordered
/// `xx, yy, zz, xy, xz, yz`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Virial {
    pub vals: [f32; 6],
}

const_assert_eq!(mem::size_of::<Virial>(), 24);

impl Virial {
    pub const ZERO: Self = Self { vals: [0.0; 6] };

    pub fn new(xx: f32, yy: f32, zz: f32, xy: f32, xz: f32, yz: f32) -> Self {
        Self {
            vals: [xx, yy, zz, xy, xz, yz],
        }
    }

    /// Trace of the tensor, the quantity that enters the scalar pressure.
    pub fn trace(&self) -> f32 {
        self.vals[0] + self.vals[1] + self.vals[2]
    }
}

impl Index<usize> for Virial {
    type Output = f32;

    fn index(&self, i: usize) -> &f32 {
        &self.vals[i]
    }
}

impl IndexMut<usize> for Virial {
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        &mut self.vals[i]
    }
}

impl Add for Virial {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for Virial {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.vals.iter_mut().zip(rhs.vals) {
            *a += b;
        }
    }
}

/// Accumulates the outer product of `force` and the displacement `dr` it acts along.
#[inline]
pub fn compute_virial(virial: &mut Virial, force: Vec3, dr: Vec3) {
    virial.vals[0] += force.x * dr.x;
    virial.vals[1] += force.y * dr.y;
    virial.vals[2] += force.z * dr.z;
    virial.vals[3] += force.x * dr.y;
    virial.vals[4] += force.x * dr.z;
    virial.vals[5] += force.y * dr.z;
}

// End of File
