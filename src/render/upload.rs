//! Buffers and scalar metadata handed to the GPU upload step
//!
//! The renderer copies these verbatim into storage buffers; nothing here
//! touches a device.

use super::frame::TraceParams;
use crate::core::{Error, Result};
use crate::voxel::grid::ChunkedVoxelGrid;
use crate::voxel::svo::SparseOctree;

/// Flat octree buffer plus the scalars the traversal kernel needs
#[derive(Clone, Debug)]
pub struct OctreeUpload {
    /// `slab_count * 128` bytes, little-endian
    pub bytes: Vec<u8>,
    pub slab_count: u32,
    /// Side of the bounding cube
    pub size: u32,
    pub layer_count: u32,
}

impl OctreeUpload {
    /// Traversal constants for a frame
    pub fn trace_params(&self, frame_seed: u32) -> TraceParams {
        TraceParams::new(frame_seed, self.layer_count, self.size)
    }
}

/// Byte views of the three grid levels
#[derive(Clone, Copy, Debug)]
pub struct GridUpload<'a> {
    pub top_level: &'a [u8],
    pub layer1: &'a [u8],
    pub layer2: &'a [u8],
    /// Voxel dimensions
    pub size: [u32; 3],
    /// Top-level entries per axis
    pub top_counts: [u32; 3],
}

impl GridUpload<'_> {
    /// Total bytes across the three buffers
    pub fn total_bytes(&self) -> usize {
        self.top_level.len() + self.layer1.len() + self.layer2.len()
    }
}

impl SparseOctree {
    /// Upload payload, failing if nothing was inserted
    pub fn upload(&self) -> Result<OctreeUpload> {
        let slabs = self.checked_slabs()?;
        let slab_count = u32::try_from(slabs.len())
            .map_err(|_| Error::MalformedBuffer(format!("{} slabs exceed u32", slabs.len())))?;
        Ok(OctreeUpload {
            bytes: self.to_bytes(),
            slab_count,
            size: self.size(),
            layer_count: self.layer_count(),
        })
    }
}

impl ChunkedVoxelGrid {
    /// Upload views, failing if nothing was inserted
    pub fn upload(&self) -> Result<GridUpload<'_>> {
        let layer1 = self.checked_layer1_chunks()?;
        let layer2 = self.checked_layer2_chunks()?;
        Ok(GridUpload {
            top_level: self.top_level_bytes(),
            layer1: bytemuck::cast_slice(layer1),
            layer2: bytemuck::cast_slice(layer2),
            size: self.size(),
            top_counts: self.top_counts(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::chunk::GridItem;
    use crate::voxel::svo::node::SLAB_BYTES;
    use crate::voxel::voxel::VoxelItem;

    #[test]
    fn test_octree_upload() {
        let mut octree = SparseOctree::new(8, 8, 8).unwrap();
        assert!(matches!(octree.upload(), Err(Error::EmptyStructureAccess(_))));

        octree.insert_item(7, 7, 7, VoxelItem::new(9, [1.0, 1.0, 1.0]));
        let upload = octree.upload().unwrap();
        assert_eq!(upload.slab_count, 4);
        assert_eq!(upload.bytes.len(), 4 * SLAB_BYTES);
        assert_eq!(upload.size, 8);
        assert_eq!(upload.layer_count, 4);

        let params = upload.trace_params(123);
        assert_eq!(params.frame_seed, 123);
        assert_eq!(params.octree_size, 8);
        assert_eq!(params.octree_layer_count, 4);
    }

    #[test]
    fn test_grid_upload() {
        let mut grid = ChunkedVoxelGrid::new(32, 16, 16).unwrap();
        assert!(matches!(grid.upload(), Err(Error::EmptyStructureAccess(_))));

        grid.insert_item(17, 3, 3, GridItem::new([0.0, 1.0, 0.0]));
        let upload = grid.upload().unwrap();
        assert_eq!(upload.top_counts, [2, 1, 1]);
        assert_eq!(upload.top_level.len(), 2 * 4);
        assert_eq!(upload.layer1.len(), 256);
        assert_eq!(upload.layer2.len(), 1024);
        assert_eq!(upload.total_bytes(), 8 + 256 + 1024);
        // Second top-level entry points at layer 1 chunk 0
        assert_eq!(&upload.top_level[4..8], &0i32.to_le_bytes());
        assert_eq!(&upload.top_level[0..4], &(-1i32).to_le_bytes());
    }
}
