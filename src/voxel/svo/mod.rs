//! Sparse Voxel Octree implementation

pub mod node;
pub mod octree;

pub use node::{OctreeNode, OctreeSlot, Slab, EMPTY_SLAB, SLAB_BYTES, SLAB_SLOTS, SLOT_BYTES};
pub use octree::{SparseOctree, cube_size_for, layer_count_for};
