// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Texture-backed parameter arrays.
//!
//! Per-type force-field parameters are small, read by every thread, and rarely written.  They live
//! in a two-dimensional texture array: each row holds at most `texture_row_bytes` worth of
//! records and is padded out to the device's pitch alignment.  Kernels read the array through a
//! cached [`TextureView`]; the host and the occasional writing kernel go through a
//! [`SurfaceView`].

use crate::{
    Device, DeviceAllocation, DeviceError, DeviceProperties, Stream, SurfaceObject, TextureObject,
};
use bytemuck::Pod;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rayon::prelude::*;
use std::{fmt, mem, sync::Arc};

/// Shape of a texture array holding some number of records.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout2d {
    /// Records per row actually in use.
    pub nx: usize,
    /// Number of rows.
    pub ny: usize,
    /// Most records one row may hold.
    pub row_capacity: usize,
    /// Distance between the starts of consecutive rows, in records.
    pub pitch: usize,
}

impl Layout2d {
    /// Layout of an array of `n` records of type `T` on a device with the given properties.
    pub fn for_records<T>(props: &DeviceProperties, n: usize) -> Self {
        if n == 0 {
            return Self::default();
        }
        let record_bytes = mem::size_of::<T>().max(1);
        let row_capacity = (props.texture_row_bytes / record_bytes).max(1);
        let nx = row_capacity.min(n);
        let ny = n.div_ceil(row_capacity);
        let pitch_bytes = (nx * record_bytes).next_multiple_of(props.texture_pitch_alignment.max(1));
        Self {
            nx,
            ny,
            row_capacity,
            pitch: pitch_bytes.div_ceil(record_bytes),
        }
    }

    /// Records the array can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.nx * self.ny
    }

    /// Records of backing storage, pitch padding included.
    pub fn padded_len(&self) -> usize {
        self.pitch * self.ny
    }

    /// `(row, column)` of logical index `i`.
    #[inline]
    pub fn coords(&self, i: usize) -> (usize, usize) {
        (i / self.row_capacity, i % self.row_capacity)
    }

    /// Position of logical index `i` in the padded backing storage.
    #[inline]
    pub fn offset(&self, i: usize) -> usize {
        let (row, col) = self.coords(i);
        row * self.pitch + col
    }
}

// Field order matters: views drop before the allocation they were created over.
struct StoreHandles {
    texture: TextureObject,
    surface: SurfaceObject,
    allocation: DeviceAllocation,
}

/// A resizable device array of parameter records, readable by kernels through a cached texture
/// view.
///
/// The store has a logical `size` and a `capacity`; growing past the capacity discards the
/// contents and reallocates, shrinking never does.  An empty store holds no device resources.
/// Views borrow the store, so a store cannot be resized or dropped while a view is alive.
pub struct DeviceParameterStore<T: Pod + Send + Sync> {
    device: Device,
    size: usize,
    layout: Layout2d,
    storage: Arc<RwLock<Box<[T]>>>,
    handles: Option<StoreHandles>,
}

impl<T: Pod + Send + Sync> DeviceParameterStore<T> {
    /// An empty store on `device`.
    pub fn new(device: &Device) -> Self {
        Self {
            device: device.clone(),
            size: 0,
            layout: Layout2d::default(),
            storage: Arc::new(RwLock::new(Box::default())),
            handles: None,
        }
    }

    /// A store of `n` zeroed records.
    pub fn with_size(device: &Device, n: usize) -> Result<Self, DeviceError> {
        let mut store = Self::new(device);
        store.resize(n)?;
        Ok(store)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn capacity(&self) -> usize {
        self.layout.capacity()
    }

    pub fn layout(&self) -> Layout2d {
        self.layout
    }

    pub fn is_allocated(&self) -> bool {
        self.handles.is_some()
    }

    /// Handle of the texture view, if the store holds an allocation.
    pub fn texture_handle(&self) -> Option<u64> {
        self.handles.as_ref().map(|h| h.texture.handle())
    }

    /// Handle of the surface view, if the store holds an allocation.
    pub fn surface_handle(&self) -> Option<u64> {
        self.handles.as_ref().map(|h| h.surface.handle())
    }

    /// Sets the logical size to `n`.
    ///
    /// Within the current capacity this only changes the size.  Past it, the old views and
    /// allocation are released, an allocation laid out for `n` records is made, and the previous
    /// contents are lost.
    pub fn resize(&mut self, n: usize) -> Result<(), DeviceError> {
        if n > self.capacity() {
            let layout = Layout2d::for_records::<T>(self.device.properties(), n);
            log::info!(
                "Reallocating parameter store: {} -> {} records ({} x {} rows)",
                self.capacity(),
                layout.capacity(),
                layout.nx,
                layout.ny
            );
            self.release();
            self.allocate(layout)?;
        }
        self.size = n;
        Ok(())
    }

    fn allocate(&mut self, layout: Layout2d) -> Result<(), DeviceError> {
        let allocation = self
            .device
            .allocate(layout.padded_len() * mem::size_of::<T>())?;
        let texture = self.device.create_texture_object(&allocation);
        let surface = self.device.create_surface_object(&allocation);
        self.storage = Arc::new(RwLock::new(
            vec![T::zeroed(); layout.padded_len()].into_boxed_slice(),
        ));
        self.layout = layout;
        self.handles = Some(StoreHandles {
            texture,
            surface,
            allocation,
        });
        Ok(())
    }

    fn release(&mut self) {
        self.handles = None;
        self.storage = Arc::new(RwLock::new(Box::default()));
        self.layout = Layout2d::default();
        self.size = 0;
    }

    fn check_transfer(&self, len: usize) -> Result<(), DeviceError> {
        if len != self.size {
            return Err(DeviceError::TransferSizeMismatch {
                expected: self.size,
                actual: len,
            });
        }
        Ok(())
    }

    /// Copies `src` into the store.  `src` must hold exactly `size()` records.
    pub fn write(&mut self, src: &[T]) -> Result<(), DeviceError> {
        self.check_transfer(src.len())?;
        scatter(&mut self.storage.write(), self.layout, src);
        Ok(())
    }

    /// Copies the store into `dst`, which must hold exactly `size()` records.
    pub fn read(&self, dst: &mut [T]) -> Result<(), DeviceError> {
        self.check_transfer(dst.len())?;
        gather(&self.storage.read(), self.layout, dst);
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<T> {
        let mut out = vec![T::zeroed(); self.size];
        gather(&self.storage.read(), self.layout, &mut out);
        out
    }

    /// Queues a copy of the contents on `stream`.
    ///
    /// The result becomes available once the stream has executed the copy; see
    /// [`PendingRead::take`].
    pub fn read_async(&self, stream: &Stream) -> Result<PendingRead<T>, DeviceError> {
        let storage = Arc::clone(&self.storage);
        let layout = self.layout;
        let size = self.size;
        let slot = Arc::new(Mutex::new(None));
        let result = Arc::clone(&slot);
        stream.enqueue(move || {
            let mut out = vec![T::zeroed(); size];
            gather(&storage.read(), layout, &mut out);
            *result.lock() = Some(out);
        })?;
        Ok(PendingRead { slot })
    }

    /// Sets every record of the allocation to `value`.
    ///
    /// Records must be 4, 8 or 16 bytes wide.
    pub fn fill(&mut self, value: T) {
        assert!(
            matches!(mem::size_of::<T>(), 4 | 8 | 16),
            "fill needs 4, 8 or 16 byte records, got {}",
            mem::size_of::<T>()
        );
        let mut data = self.storage.write();
        let records: &mut [T] = &mut data;
        records.par_iter_mut().for_each(|v| *v = value);
    }

    /// The read-only, cached view used by kernels.
    pub fn texture(&self) -> TextureView<'_, T> {
        TextureView {
            data: self.storage.read(),
            layout: self.layout,
            size: self.size,
        }
    }

    /// The read/write view.
    pub fn surface(&mut self) -> SurfaceView<'_, T> {
        SurfaceView {
            data: self.storage.write(),
            layout: self.layout,
            size: self.size,
        }
    }

    /// Fallible deep copy into a fresh allocation with the same layout.
    pub fn try_clone(&self) -> Result<Self, DeviceError> {
        let mut copy = Self::new(&self.device);
        if self.is_allocated() {
            copy.allocate(self.layout)?;
            copy.storage.write().copy_from_slice(&self.storage.read());
        }
        copy.size = self.size;
        Ok(copy)
    }

    /// Copies `source` into this store, reusing the current allocation when it is large enough.
    pub fn try_clone_from(&mut self, source: &Self) -> Result<(), DeviceError> {
        if source.size > self.capacity() {
            self.release();
            self.allocate(source.layout)?;
        }
        self.size = source.size;
        let src = source.to_vec();
        scatter(&mut self.storage.write(), self.layout, &src);
        Ok(())
    }

    /// Moves the contents out, leaving this store empty and without device resources.
    pub fn take(&mut self) -> Self {
        let empty = Self::new(&self.device);
        mem::replace(self, empty)
    }
}

impl<T: Pod + Send + Sync> Clone for DeviceParameterStore<T> {
    /// Deep copy.  Panics if the device cannot hold a second copy.
    fn clone(&self) -> Self {
        self.try_clone()
            .unwrap_or_else(|err| panic!("cloning parameter store: {err}"))
    }

    fn clone_from(&mut self, source: &Self) {
        self.try_clone_from(source)
            .unwrap_or_else(|err| panic!("cloning parameter store: {err}"))
    }
}

impl<T: Pod + Send + Sync> fmt::Debug for DeviceParameterStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceParameterStore")
            .field("size", &self.size)
            .field("layout", &self.layout)
            .field("allocated", &self.is_allocated())
            .finish()
    }
}

fn scatter<T: Copy>(storage: &mut [T], layout: Layout2d, src: &[T]) {
    if src.is_empty() {
        return;
    }
    for (row, chunk) in src.chunks(layout.row_capacity).enumerate() {
        let start = row * layout.pitch;
        storage[start..start + chunk.len()].copy_from_slice(chunk);
    }
}

fn gather<T: Copy>(storage: &[T], layout: Layout2d, dst: &mut [T]) {
    if dst.is_empty() {
        return;
    }
    for (row, chunk) in dst.chunks_mut(layout.row_capacity).enumerate() {
        let start = row * layout.pitch;
        chunk.copy_from_slice(&storage[start..start + chunk.len()]);
    }
}

/// Cached read-only access to a [`DeviceParameterStore`].
pub struct TextureView<'a, T> {
    data: RwLockReadGuard<'a, Box<[T]>>,
    layout: Layout2d,
    size: usize,
}

impl<T: Copy> TextureView<'_, T> {
    #[inline]
    pub fn fetch(&self, i: usize) -> T {
        debug_assert!(i < self.size, "texture fetch {i} past size {}", self.size);
        self.data[self.layout.offset(i)]
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Read/write access to a [`DeviceParameterStore`].
pub struct SurfaceView<'a, T> {
    data: RwLockWriteGuard<'a, Box<[T]>>,
    layout: Layout2d,
    size: usize,
}

impl<T: Copy> SurfaceView<'_, T> {
    #[inline]
    pub fn read(&self, i: usize) -> T {
        debug_assert!(i < self.size);
        self.data[self.layout.offset(i)]
    }

    #[inline]
    pub fn write(&mut self, i: usize, value: T) {
        debug_assert!(i < self.size);
        self.data[self.layout.offset(i)] = value;
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// The result of [`DeviceParameterStore::read_async`].
pub struct PendingRead<T> {
    slot: Arc<Mutex<Option<Vec<T>>>>,
}

impl<T> PendingRead<T> {
    pub fn is_ready(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Takes the copied records.
    ///
    /// Fails with [`DeviceError::NotReady`] until the stream has executed the copy, and after the
    /// records were taken once.
    pub fn take(&self) -> Result<Vec<T>, DeviceError> {
        self.slot.lock().take().ok_or(DeviceError::NotReady)
    }
}

// End of File
