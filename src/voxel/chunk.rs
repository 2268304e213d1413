//! Fixed-size chunks for the three-level voxel grid
//!
//! - Top level: one entry per 16x16x16 region
//! - Layer 1 chunk: 4x4x4 indices into the layer 2 chunk list
//! - Layer 2 chunk: 4x4x4 voxel items

use bytemuck::{Pod, Zeroable};

/// Layer 1 chunk extent, in layer 2 chunks per axis
pub const LAYER1_SIZE: u32 = 4;

/// Layer 2 chunk extent, in voxels per axis
pub const LAYER2_SIZE: u32 = 4;

/// Voxels per axis covered by one top-level entry (16)
pub const TOP_CHUNK_VOXELS: u32 = LAYER1_SIZE * LAYER2_SIZE;

/// Slots per chunk at either layer (4^3 = 64)
pub const CHUNK_SLOTS: usize = (LAYER1_SIZE * LAYER1_SIZE * LAYER1_SIZE) as usize;

/// Sentinel for "no chunk allocated"
pub const NO_CHUNK: i32 = -1;

/// Linear index into a 4x4x4 chunk (x fastest)
#[inline]
pub fn chunk_slot_index(x: u32, y: u32, z: u32) -> usize {
    debug_assert!(x < LAYER2_SIZE && y < LAYER2_SIZE && z < LAYER2_SIZE);
    (x + y * LAYER2_SIZE + z * LAYER2_SIZE * LAYER2_SIZE) as usize
}

/// Voxel item in a layer 2 chunk - 16 bytes
///
/// `filled` is -1.0 for empty slots and 1.0 once written (float so the
/// kernel can read the whole item as a float4).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GridItem {
    pub filled: f32,
    pub color: [f32; 3],
}

impl GridItem {
    pub const EMPTY: GridItem = GridItem {
        filled: -1.0,
        color: [0.0; 3],
    };

    /// Filled item with the given color
    pub fn new(color: [f32; 3]) -> Self {
        Self { filled: 1.0, color }
    }

    pub fn is_filled(&self) -> bool {
        self.filled > 0.0
    }
}

impl Default for GridItem {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// 4x4x4 indices into the layer 2 chunk list (256 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Layer1Chunk {
    pub item_indices: [i32; CHUNK_SLOTS],
}

impl Layer1Chunk {
    /// Chunk with every slot unallocated
    pub const fn new() -> Self {
        Self {
            item_indices: [NO_CHUNK; CHUNK_SLOTS],
        }
    }

    /// Number of allocated slots
    pub fn allocated(&self) -> usize {
        self.item_indices.iter().filter(|i| **i != NO_CHUNK).count()
    }
}

impl Default for Layer1Chunk {
    fn default() -> Self {
        Self::new()
    }
}

/// 4x4x4 voxel items (1 KiB)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Layer2Chunk {
    pub items: [GridItem; CHUNK_SLOTS],
}

impl Layer2Chunk {
    /// Chunk with every item empty
    pub const fn new() -> Self {
        Self {
            items: [GridItem::EMPTY; CHUNK_SLOTS],
        }
    }

    /// Number of filled items
    pub fn filled(&self) -> usize {
        self.items.iter().filter(|i| i.is_filled()).count()
    }
}

impl Default for Layer2Chunk {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(std::mem::size_of::<GridItem>(), 16);
        assert_eq!(std::mem::size_of::<Layer1Chunk>(), 256);
        assert_eq!(std::mem::size_of::<Layer2Chunk>(), 1024);
        assert_eq!(TOP_CHUNK_VOXELS, 16);
    }

    #[test]
    fn test_slot_index() {
        assert_eq!(chunk_slot_index(0, 0, 0), 0);
        assert_eq!(chunk_slot_index(3, 0, 0), 3);
        assert_eq!(chunk_slot_index(0, 1, 0), 4);
        assert_eq!(chunk_slot_index(3, 3, 3), 63);
    }

    #[test]
    fn test_new_chunks() {
        let l1 = Layer1Chunk::new();
        assert!(l1.item_indices.iter().all(|i| *i == NO_CHUNK));
        assert_eq!(l1.allocated(), 0);

        let mut l2 = Layer2Chunk::new();
        assert_eq!(l2.filled(), 0);
        l2.items[5] = GridItem::new([1.0, 0.0, 0.0]);
        assert_eq!(l2.filled(), 1);
    }
}
