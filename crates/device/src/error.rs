// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use thiserror::Error;

/// Errors raised by accelerator operations.
///
/// These are resource and transfer failures surfaced at the call site that issued the operation.
/// None of them are retried internally; a failed allocation usually means the device is exhausted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// The device does not have enough free memory for the requested allocation.
    #[error("Out of device memory: requested {requested} bytes with {available} bytes free")]
    OutOfMemory { requested: usize, available: usize },

    /// A host buffer handed to a transfer does not match the logical size of the device array.
    #[error("Transfer size mismatch: device holds {expected} elements, host buffer has {actual}")]
    TransferSizeMismatch { expected: usize, actual: usize },

    /// A kernel launch requested more resources than one block may use.
    #[error("Invalid launch configuration: {0}")]
    InvalidLaunch(String),

    /// An asynchronous result was consumed before its stream executed the copy.
    ///
    /// Synchronize the stream the operation was issued on before taking the result.
    #[error("Asynchronous transfer has not completed; synchronize its stream first")]
    NotReady,

    /// The worker behind an execution stream has shut down.
    #[error("Execution stream is closed")]
    StreamClosed,
}

// End of File
