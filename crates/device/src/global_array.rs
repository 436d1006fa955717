// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Device, DeviceAllocation, DeviceError};
use bytemuck::Pod;
use std::mem;

/// A plain linear array in device memory, read by kernels through an ordinary slice.
pub struct GlobalArray<T> {
    data: Box<[T]>,
    _allocation: DeviceAllocation,
}

impl<T: Pod> GlobalArray<T> {
    pub fn from_host(device: &Device, values: &[T]) -> Result<Self, DeviceError> {
        let allocation = device.allocate(mem::size_of_val(values))?;
        Ok(Self {
            data: values.into(),
            _allocation: allocation,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Replaces the contents with `values`, which must have the same length.
    pub fn write(&mut self, values: &[T]) -> Result<(), DeviceError> {
        if values.len() != self.data.len() {
            return Err(DeviceError::TransferSizeMismatch {
                expected: self.data.len(),
                actual: values.len(),
            });
        }
        self.data.copy_from_slice(values);
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.data.to_vec()
    }
}

// End of File
