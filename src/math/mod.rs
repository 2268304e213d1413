//! Integer voxel-space math

pub mod aabb;
pub mod octant;

pub use aabb::VoxelRegion;
pub use octant::{OctantPath, OctantStep, octant_index, octant_of, octant_offset};
