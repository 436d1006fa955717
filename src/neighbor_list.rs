// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Warp-strided molecule neighbor lists.
//!
//! The partners of all molecules handled by one block are interleaved so that the threads of an
//! execution group read consecutive words: partner `j` of the thread in lane `l` sits at
//! `base + group_width * j`, where the base of each group lies `max_neighbors * group_width` past
//! the previous one and `max_neighbors` is the largest partner count in the block.

use crate::ForceError;
use device::{Device, GlobalArray};

/// Start of a thread's partner column.
///
/// `cumul_max_per_block[b]` is the sum of the largest partner counts of all blocks before `b`.
#[inline]
pub fn base_index(
    cumul_max_per_block: &[u32],
    block_dim: u32,
    group_width: u32,
    block_idx: u32,
    thread_idx: u32,
) -> usize {
    let block = block_idx as usize;
    let cumul = cumul_max_per_block[block] as usize;
    let max_in_block = cumul_max_per_block[block + 1] as usize - cumul;
    let warp = (thread_idx / group_width) as usize;
    let lane = (thread_idx % group_width) as usize;
    block_dim as usize * cumul + max_in_block * group_width as usize * warp + lane
}

/// Position of partner `j` in a column starting at `base`.
#[inline]
pub fn index(base: usize, group_width: u32, j: usize) -> usize {
    base + group_width as usize * j
}

/// Marks unused slots of the index array.
pub const EMPTY_SLOT: u32 = u32::MAX;

/// A host-side neighbor list in the warp-strided layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoleculeNeighborList {
    pub counts: Vec<u32>,
    pub indices: Vec<u32>,
    pub cumul_max_per_block: Vec<u32>,
    pub block_dim: u32,
    pub group_width: u32,
}

impl MoleculeNeighborList {
    /// Packs per-molecule partner lists into the warp-strided layout.
    ///
    /// Only the layout is built here; which molecules are partners is up to the caller.
    pub fn from_partners(partners: &[Vec<u32>], block_dim: u32, group_width: u32) -> Self {
        assert!(group_width > 0, "group width must be positive");
        assert!(
            block_dim % group_width == 0,
            "block of {block_dim} threads is not a whole number of {group_width}-wide groups"
        );

        let n_blocks = partners.len().div_ceil(block_dim as usize);
        let mut cumul_max_per_block = Vec::with_capacity(n_blocks + 1);
        cumul_max_per_block.push(0u32);
        for block in partners.chunks(block_dim as usize) {
            let max = block.iter().map(Vec::len).max().unwrap_or(0) as u32;
            let last = cumul_max_per_block[cumul_max_per_block.len() - 1];
            cumul_max_per_block.push(last + max);
        }

        let total = block_dim as usize * cumul_max_per_block[n_blocks] as usize;
        let mut indices = vec![EMPTY_SLOT; total];
        for (idx, list) in partners.iter().enumerate() {
            let base = base_index(
                &cumul_max_per_block,
                block_dim,
                group_width,
                idx as u32 / block_dim,
                idx as u32 % block_dim,
            );
            for (j, &partner) in list.iter().enumerate() {
                indices[index(base, group_width, j)] = partner;
            }
        }

        log::debug!(
            "Packed neighbor list: {} molecules, {} slots",
            partners.len(),
            indices.len()
        );

        Self {
            counts: partners.iter().map(|p| p.len() as u32).collect(),
            indices,
            cumul_max_per_block,
            block_dim,
            group_width,
        }
    }

    pub fn num_molecules(&self) -> usize {
        self.counts.len()
    }

    /// Base index of molecule `idx`, for the layout's own block size and group width.
    pub fn base(&self, idx: usize) -> usize {
        base_index(
            &self.cumul_max_per_block,
            self.block_dim,
            self.group_width,
            idx as u32 / self.block_dim,
            idx as u32 % self.block_dim,
        )
    }

    /// Partners of molecule `idx`, read back through the strided layout.
    pub fn partners(&self, idx: usize) -> Vec<u32> {
        let base = self.base(idx);
        (0..self.counts[idx] as usize)
            .map(|j| self.indices[index(base, self.group_width, j)])
            .collect()
    }

    pub fn upload(&self, device: &Device) -> Result<DeviceNeighborList, ForceError> {
        Ok(DeviceNeighborList {
            counts: GlobalArray::from_host(device, &self.counts)?,
            indices: GlobalArray::from_host(device, &self.indices)?,
            cumul_max_per_block: GlobalArray::from_host(device, &self.cumul_max_per_block)?,
            block_dim: self.block_dim,
            group_width: self.group_width,
        })
    }
}

/// A [`MoleculeNeighborList`] resident on the device.
pub struct DeviceNeighborList {
    pub counts: GlobalArray<u32>,
    pub indices: GlobalArray<u32>,
    pub cumul_max_per_block: GlobalArray<u32>,
    pub block_dim: u32,
    pub group_width: u32,
}


// End of File
