//! Per-frame constants for the traversal kernel

use bytemuck::{Pod, Zeroable};

/// Integer hash used to decorrelate per-frame RNG seeds
///
/// Thomas Wang's 32-bit hash with wrapping arithmetic.
pub fn wang_hash(mut seed: u32) -> u32 {
    seed = (seed ^ 61) ^ (seed >> 16);
    seed = seed.wrapping_mul(9);
    seed ^= seed >> 4;
    seed = seed.wrapping_mul(0x27d4_eb2d);
    seed ^= seed >> 15;
    seed
}

/// Frame counter producing hashed seeds
#[derive(Clone, Debug, Default)]
pub struct FrameSeed {
    frame: u32,
}

impl FrameSeed {
    pub fn new() -> Self {
        Self { frame: 0 }
    }

    /// Seed for the current frame, then advance
    pub fn next_seed(&mut self) -> u32 {
        let seed = wang_hash(self.frame);
        self.frame = self.frame.wrapping_add(1);
        seed
    }

    /// Frames handed out so far
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn reset(&mut self) {
        self.frame = 0;
    }
}

/// Traversal constants for the GPU (16 bytes, matches the shader struct)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct TraceParams {
    pub frame_seed: u32,
    pub octree_layer_count: u32,
    pub octree_size: u32,
    /// Rays per pixel per frame
    pub sample_count: u32,
}

impl TraceParams {
    pub fn new(frame_seed: u32, octree_layer_count: u32, octree_size: u32) -> Self {
        Self {
            frame_seed,
            octree_layer_count,
            octree_size,
            sample_count: 1,
        }
    }

    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count.max(1);
        self
    }
}
