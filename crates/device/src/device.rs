// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::DeviceError;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
};

/// Static capabilities of an accelerator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProperties {
    /// Width of an execution group (warp).  Warp-strided layouts must be built for this width.
    pub warp_size: u32,
    /// Largest block a kernel may be launched with.
    pub max_threads_per_block: u32,
    /// Bytes of on-chip memory available to one block for cooperative staging.
    pub shared_mem_per_block: usize,
    /// Total device memory available for allocations.
    pub memory_bytes: usize,
    /// Byte cap on one row of a two-dimensional texture array.
    pub texture_row_bytes: usize,
    /// Row pitch alignment of texture arrays, in bytes.
    pub texture_pitch_alignment: usize,
}

impl Default for DeviceProperties {
    fn default() -> Self {
        Self {
            warp_size: 32,
            max_threads_per_block: 1024,
            shared_mem_per_block: 48 * 1024,
            memory_bytes: 1 << 30,
            texture_row_bytes: 65536,
            texture_pitch_alignment: 512,
        }
    }
}

/// A snapshot of the resources currently held on a [`Device`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub used_bytes: usize,
    pub live_allocations: usize,
    pub live_views: usize,
}

struct DeviceInner {
    properties: DeviceProperties,
    used_bytes: AtomicUsize,
    live_allocations: AtomicUsize,
    live_views: AtomicUsize,
    next_handle: AtomicU64,
}

/// A handle to an accelerator.
///
/// Cloning the handle is cheap; every clone refers to the same device and the same memory pool.
/// Resources allocated from the device ([`DeviceAllocation`], [`TextureObject`],
/// [`SurfaceObject`]) hold a handle of their own and give their resources back when dropped.
#[derive(Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl Device {
    pub fn new(properties: DeviceProperties) -> Self {
        log::debug!(
            "Creating device: warp size {}, {} bytes of memory",
            properties.warp_size,
            properties.memory_bytes
        );
        Self {
            inner: Arc::new(DeviceInner {
                properties,
                used_bytes: AtomicUsize::new(0),
                live_allocations: AtomicUsize::new(0),
                live_views: AtomicUsize::new(0),
                next_handle: AtomicU64::new(1),
            }),
        }
    }

    pub fn properties(&self) -> &DeviceProperties {
        &self.inner.properties
    }

    pub fn warp_size(&self) -> u32 {
        self.inner.properties.warp_size
    }

    pub fn memory_info(&self) -> MemoryInfo {
        MemoryInfo {
            used_bytes: self.inner.used_bytes.load(Ordering::Acquire),
            live_allocations: self.inner.live_allocations.load(Ordering::Acquire),
            live_views: self.inner.live_views.load(Ordering::Acquire),
        }
    }

    /// Returns true if both handles refer to the same device.
    pub fn same_device(&self, other: &Device) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Reserves `bytes` of device memory.
    pub fn allocate(&self, bytes: usize) -> Result<DeviceAllocation, DeviceError> {
        let capacity = self.inner.properties.memory_bytes;
        self.inner
            .used_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(bytes).filter(|&total| total <= capacity)
            })
            .map_err(|used| DeviceError::OutOfMemory {
                requested: bytes,
                available: capacity.saturating_sub(used),
            })?;
        self.inner.live_allocations.fetch_add(1, Ordering::AcqRel);

        let id = self.next_handle();
        log::trace!("Allocated {bytes} bytes as allocation #{id}");
        Ok(DeviceAllocation {
            device: self.clone(),
            id,
            bytes,
        })
    }

    pub(crate) fn create_texture_object(&self, allocation: &DeviceAllocation) -> TextureObject {
        TextureObject(self.create_view(allocation))
    }

    pub(crate) fn create_surface_object(&self, allocation: &DeviceAllocation) -> SurfaceObject {
        SurfaceObject(self.create_view(allocation))
    }

    fn create_view(&self, allocation: &DeviceAllocation) -> ViewHandle {
        debug_assert!(allocation.device.same_device(self));
        self.inner.live_views.fetch_add(1, Ordering::AcqRel);
        ViewHandle {
            device: self.clone(),
            handle: self.next_handle(),
            allocation: allocation.id,
        }
    }

    fn next_handle(&self) -> u64 {
        self.inner.next_handle.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new(DeviceProperties::default())
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("properties", &self.inner.properties)
            .field("memory", &self.memory_info())
            .finish()
    }
}

/// A block of device memory.  The bytes are returned to the device when this value is dropped.
#[derive(Debug)]
pub struct DeviceAllocation {
    device: Device,
    id: u64,
    bytes: usize,
}

impl DeviceAllocation {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl Drop for DeviceAllocation {
    fn drop(&mut self) {
        let inner = &self.device.inner;
        inner.used_bytes.fetch_sub(self.bytes, Ordering::AcqRel);
        inner.live_allocations.fetch_sub(1, Ordering::AcqRel);
        log::trace!("Freed allocation #{} ({} bytes)", self.id, self.bytes);
    }
}

#[derive(Debug)]
struct ViewHandle {
    device: Device,
    handle: u64,
    allocation: u64,
}

impl Drop for ViewHandle {
    fn drop(&mut self) {
        self.device.inner.live_views.fetch_sub(1, Ordering::AcqRel);
    }
}

/// The cached, read-only sampling view of a texture allocation.
#[derive(Debug)]
pub struct TextureObject(ViewHandle);

/// The raw read/write view of a texture allocation.
#[derive(Debug)]
pub struct SurfaceObject(ViewHandle);

impl TextureObject {
    pub fn handle(&self) -> u64 {
        self.0.handle
    }

    /// Id of the allocation this view was created over.
    pub fn allocation(&self) -> u64 {
        self.0.allocation
    }
}

impl SurfaceObject {
    pub fn handle(&self) -> u64 {
        self.0.handle
    }

    /// Id of the allocation this view was created over.
    pub fn allocation(&self) -> u64 {
        self.0.allocation
    }
}

// End of File
