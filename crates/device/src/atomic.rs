// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::{Device, DeviceAllocation, DeviceError};
use std::{
    fmt, mem,
    sync::atomic::{AtomicU32, Ordering},
};

/// An `f32` supporting atomic read-modify-write, built on the bit pattern of an [`AtomicU32`].
#[derive(Default)]
#[repr(transparent)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }

    /// Adds `delta` and returns the previous value.
    pub fn fetch_add(&self, delta: f32) -> f32 {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f32::from_bits(current) + delta).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(prev) => return f32::from_bits(prev),
                Err(actual) => current = actual,
            }
        }
    }
}

impl fmt::Debug for AtomicF32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.load(), f)
    }
}

/// A device array of `LANES`-wide float records that any number of threads may add into.
///
/// Each lane is updated atomically on its own; a record as a whole is not.
pub struct AtomicArray<const LANES: usize> {
    data: Box<[AtomicF32]>,
    _allocation: DeviceAllocation,
}

/// Per-atom force accumulator.  Lanes hold `x, y, z, w`; kernels add zero to `w`.
pub type ForceAccumulator = AtomicArray<4>;

/// Per-atom virial accumulator, lanes ordered `xx, yy, zz, xy, xz, yz`.
pub type VirialAccumulator = AtomicArray<6>;

impl<const LANES: usize> AtomicArray<LANES> {
    pub fn zeroed(device: &Device, len: usize) -> Result<Self, DeviceError> {
        let allocation = device.allocate(len * LANES * mem::size_of::<f32>())?;
        let data = (0..len * LANES).map(|_| AtomicF32::default()).collect();
        Ok(Self {
            data,
            _allocation: allocation,
        })
    }

    pub fn from_host(device: &Device, values: &[[f32; LANES]]) -> Result<Self, DeviceError> {
        let allocation = device.allocate(values.len() * LANES * mem::size_of::<f32>())?;
        let data = values.iter().flatten().map(|&v| AtomicF32::new(v)).collect();
        Ok(Self {
            data,
            _allocation: allocation,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len() / LANES
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn add(&self, idx: usize, delta: [f32; LANES]) {
        let record = &self.data[idx * LANES..(idx + 1) * LANES];
        for (lane, d) in record.iter().zip(delta) {
            lane.fetch_add(d);
        }
    }

    pub fn get(&self, idx: usize) -> [f32; LANES] {
        let record = &self.data[idx * LANES..(idx + 1) * LANES];
        std::array::from_fn(|lane| record[lane].load())
    }

    pub fn zero(&self) {
        for v in self.data.iter() {
            v.store(0.0);
        }
    }

    pub fn to_vec(&self) -> Vec<[f32; LANES]> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }
}

impl<const LANES: usize> fmt::Debug for AtomicArray<LANES> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

// End of File
