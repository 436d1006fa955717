// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! # Shared geometry for the molforce kernels
//!
//! Positions and forces travel as [`Vec4`]: three Cartesian components plus a scalar slot that
//! carries packed per-atom metadata (the atom type for positions) or padding.  Periodic images are
//! resolved through [`Bounds::min_image`], and stress contributions are collected as six-component
//! [`Virial`]s.

mod bounds;
pub mod ids;
mod virial;

pub use bounds::Bounds;
pub use glam::{Vec3, Vec4};
pub use ids::{build_id_to_idx, AtomId, DuplicateAtomId, INVALID_SLOT};
pub use virial::{compute_virial, Virial};

/// Drops the metadata slot of a packed position or force.
#[inline]
pub fn xyz(v: Vec4) -> Vec3 {
    v.truncate()
}

/// Packs a Cartesian vector and a metadata scalar into the four-lane device layout.
#[inline]
pub fn pack(v: Vec3, w: f32) -> Vec4 {
    v.extend(w)
}

// End of File
