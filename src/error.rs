// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use common::{AtomId, DuplicateAtomId};
use device::DeviceError;
use thiserror::Error;

/// Errors raised while preparing or running force computations.
#[derive(Debug, Error)]
pub enum ForceError {
    /// An accelerator operation failed.
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The neighbor list was laid out for a different execution group width than the device runs.
    ///
    /// Warp-strided lists must be rebuilt whenever the group width changes.
    #[error("Neighbor list built for group width {list}, device executes groups of {device}")]
    GroupWidthMismatch { list: u32, device: u32 },

    /// The neighbor list was laid out for a different block size than the kernel launches with.
    #[error("Neighbor list built for blocks of {list} threads, kernel launches {launch}")]
    BlockDimMismatch { list: u32, launch: u32 },

    /// The neighbor list covers a different number of molecules than the interaction list.
    #[error("Neighbor list covers {actual} molecules, expected {expected}")]
    NeighborListSize { expected: usize, actual: usize },

    /// Two slots of a particle state carry the same atom id.
    #[error(transparent)]
    DuplicateAtomId(#[from] DuplicateAtomId),

    /// An interaction refers to an atom id with no slot in the current particle state.
    #[error("Atom id {0} has no slot in the particle state")]
    UnknownAtomId(AtomId),

    /// An interaction uses a parameter type that was never given coefficients.
    #[error("Parameter type {0} has no coefficients")]
    UnknownParameterType(u32),

    /// Virial accumulation was requested from a particle state without virial storage.
    #[error("Particle state has no virial storage")]
    VirialsUnavailable,

    /// Per-atom energies are not implemented for this interaction kind.
    #[error("Per-atom energy is not implemented for {0}")]
    EnergyUnimplemented(&'static str),

    /// A potential was asked to compute before `prepare_for_run`.
    #[error("Potential has not been prepared for a run")]
    NotPrepared,
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

// End of File
