// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Run configuration.
//!
//! Every section is optional in the TOML source and falls back to its defaults, so a
//! configuration file only needs to name what it changes:
//!
//! ```toml
//! [device]
//! warp_size = 64
//!
//! [dihedral]
//! shared_params = "never"
//!
//! [e3b]
//! rc3 = 5.5
//! ```

use crate::{evaluators::E3bParams, ConfigError};
use device::DeviceProperties;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Whether the dihedral kernel stages the parameter table in shared memory.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedParamPolicy {
    /// Stage the table whenever it fits in one block's shared memory.
    #[default]
    Auto,
    Always,
    Never,
}

impl SharedParamPolicy {
    pub fn use_shared(self, table_bytes: usize, shared_mem_per_block: usize) -> bool {
        match self {
            Self::Auto => table_bytes <= shared_mem_per_block,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DihedralConfig {
    pub shared_params: SharedParamPolicy,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub device: DeviceProperties,
    pub dihedral: DihedralConfig,
    pub e3b: E3bParams,
}

impl ForceConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        log::info!("Loaded force configuration from {}", path.display());
        Ok(config)
    }
}

// End of File
