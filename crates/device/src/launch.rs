// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::{Device, DeviceError};
use rayon::prelude::*;

/// Grid geometry of a kernel launch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Number of blocks.
    pub grid_dim: u32,
    /// Threads per block.
    pub block_dim: u32,
    /// Bytes of per-block shared memory the kernel stages into.
    pub shared_mem_bytes: usize,
}

impl LaunchConfig {
    /// The smallest grid of `block_dim`-wide blocks covering `n` elements, one thread each.
    pub fn for_num_elems(n: u32, block_dim: u32) -> Self {
        assert!(block_dim > 0, "block_dim must be positive");
        Self {
            grid_dim: n.div_ceil(block_dim),
            block_dim,
            shared_mem_bytes: 0,
        }
    }

    pub fn with_shared_mem(mut self, bytes: usize) -> Self {
        self.shared_mem_bytes = bytes;
        self
    }

    pub fn total_threads(&self) -> usize {
        self.grid_dim as usize * self.block_dim as usize
    }
}

/// What every thread of one block sees while the block's shared memory is being staged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockContext {
    pub block_idx: u32,
    pub block_dim: u32,
    pub grid_dim: u32,
    pub warp_size: u32,
    pub shared_mem_bytes: usize,
}

/// Coordinates of one thread of a launch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ThreadContext {
    pub block_idx: u32,
    pub thread_idx: u32,
    pub block_dim: u32,
    pub warp_size: u32,
}

impl ThreadContext {
    #[inline]
    pub fn global_idx(&self) -> usize {
        self.block_idx as usize * self.block_dim as usize + self.thread_idx as usize
    }

    /// Index of this thread's execution group within its block.
    #[inline]
    pub fn warp_idx(&self) -> u32 {
        self.thread_idx / self.warp_size
    }

    /// Position of this thread within its execution group.
    #[inline]
    pub fn lane(&self) -> u32 {
        self.thread_idx % self.warp_size
    }
}

/// A device kernel.
///
/// A launch runs [`Kernel::stage`] once per block, standing in for the block's threads
/// cooperatively filling shared memory, and then [`Kernel::run`] for every thread of the block.
/// Staging completes before any thread of its block runs, which is the only barrier a kernel gets.
/// Blocks run concurrently and in no particular order, so anything written to global memory by
/// more than one thread must go through an atomic accumulator.
pub trait Kernel: Sync {
    type Shared;

    fn stage(&self, block: &BlockContext) -> Self::Shared;

    fn run(&self, thread: &ThreadContext, shared: &Self::Shared);
}

impl Device {
    /// Runs `kernel` over the grid described by `config` and returns once every block finished.
    pub fn launch<K: Kernel>(&self, config: &LaunchConfig, kernel: &K) -> Result<(), DeviceError> {
        let props = self.properties();
        if config.block_dim == 0 || config.block_dim > props.max_threads_per_block {
            return Err(DeviceError::InvalidLaunch(format!(
                "block of {} threads, device allows 1..={}",
                config.block_dim, props.max_threads_per_block
            )));
        }
        if config.shared_mem_bytes > props.shared_mem_per_block {
            return Err(DeviceError::InvalidLaunch(format!(
                "{} bytes of shared memory requested, device allows {}",
                config.shared_mem_bytes, props.shared_mem_per_block
            )));
        }

        log::debug!(
            "Launching {} blocks of {} threads ({} bytes shared)",
            config.grid_dim,
            config.block_dim,
            config.shared_mem_bytes
        );

        let warp_size = props.warp_size;
        (0..config.grid_dim).into_par_iter().for_each(|block_idx| {
            let block = BlockContext {
                block_idx,
                block_dim: config.block_dim,
                grid_dim: config.grid_dim,
                warp_size,
                shared_mem_bytes: config.shared_mem_bytes,
            };
            let shared = kernel.stage(&block);
            for thread_idx in 0..config.block_dim {
                let thread = ThreadContext {
                    block_idx,
                    thread_idx,
                    block_dim: config.block_dim,
                    warp_size,
                };
                kernel.run(&thread, &shared);
            }
        });
        Ok(())
    }
}

// End of File
