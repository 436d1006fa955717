// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use glam::{BVec3, Vec3};

/// A rectangular simulation box defined by its lower corner (`lo`) and edge lengths (`trace`),
/// with periodic wrap-around enabled per axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub lo: Vec3,
    pub trace: Vec3,
    pub periodic: BVec3,
}

impl Bounds {
    /// Creates a box spanning `lo..hi` with the given per-axis periodicity.
    pub fn new(lo: Vec3, hi: Vec3, periodic: BVec3) -> Self {
        debug_assert!(
            hi.cmpgt(lo).all(),
            "box upper corner must exceed lower corner"
        );
        Self {
            lo,
            trace: hi - lo,
            periodic,
        }
    }

    /// A cube of side `side` anchored at the origin, periodic in every direction.
    pub fn cubic(side: f32) -> Self {
        Self::new(Vec3::ZERO, Vec3::splat(side), BVec3::TRUE)
    }

    /// A box with no periodic axis.  [`Bounds::min_image`] is the identity for it.
    pub fn open(lo: Vec3, hi: Vec3) -> Self {
        Self::new(lo, hi, BVec3::FALSE)
    }

    /// Upper corner of the box.
    pub fn hi(&self) -> Vec3 {
        self.lo + self.trace
    }

    /// Returns the shortest displacement equivalent to `v` under the periodic wrap of this box.
    ///
    /// Only axes flagged in `periodic` are wrapped; the others pass through unchanged.
    #[inline]
    pub fn min_image(&self, v: Vec3) -> Vec3 {
        let images = (v / self.trace).round();
        let shift = Vec3::select(self.periodic, self.trace * images, Vec3::ZERO);
        v - shift
    }
}


// End of File
