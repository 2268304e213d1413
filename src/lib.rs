//! Voxtrace - sparse voxel spatial indices for a GPU voxel raytracer

pub mod core;
pub mod math;
pub mod voxel;
pub mod render;
pub mod scene;
