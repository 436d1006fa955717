// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! # Accelerator model
//!
//! Force kernels in molforce are written against a small accelerator model: a [`Device`] owns a
//! pool of memory, kernels are launched over a grid of blocks of threads ([`LaunchConfig`],
//! [`Kernel`]), threads that write to the same location go through atomic accumulators, and
//! copies back to the host can be queued on an in-order [`Stream`].  The device executes kernels
//! in software, running blocks in parallel on the [`rayon`] thread pool.
//!
//! Force-field parameters live in a [`DeviceParameterStore`], a resizable array backed by a
//! two-dimensional texture and read by kernels through a cached [`TextureView`].

mod atomic;
mod device;
mod error;
mod global_array;
mod launch;
mod stream;
mod texture;

pub use atomic::{AtomicArray, AtomicF32, ForceAccumulator, VirialAccumulator};
pub use device::{
    Device, DeviceAllocation, DeviceProperties, MemoryInfo, SurfaceObject, TextureObject,
};
pub use error::DeviceError;
pub use global_array::GlobalArray;
pub use launch::{BlockContext, Kernel, LaunchConfig, ThreadContext};
pub use stream::Stream;
pub use texture::{DeviceParameterStore, Layout2d, PendingRead, SurfaceView, TextureView};

// End of File
