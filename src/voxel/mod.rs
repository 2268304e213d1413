//! Voxel data structures and operations

pub mod voxel;
pub mod volume;
pub mod palette;
pub mod svo;
pub mod chunk;
pub mod grid;

pub use voxel::VoxelItem;
pub use volume::{VoxelVolume, EMPTY_MATERIAL};
pub use palette::{AtlasEntry, Palette};
pub use svo::{OctreeNode, OctreeSlot, SparseOctree};
pub use chunk::{GridItem, Layer1Chunk, Layer2Chunk, LAYER1_SIZE, LAYER2_SIZE, NO_CHUNK};
pub use grid::ChunkedVoxelGrid;
