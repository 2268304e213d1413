//! Integer axis-aligned voxel regions

use crate::core::types::IVec3;

/// Half-open integer box `[min, max)` in voxel coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoxelRegion {
    pub min: IVec3,
    pub max: IVec3,
}

impl VoxelRegion {
    /// Create region from min (inclusive) and max (exclusive) corners
    pub fn new(min: IVec3, max: IVec3) -> Self {
        Self { min, max }
    }

    /// Region covering `[0, extent)` on every axis
    pub fn from_extent(extent: [u32; 3]) -> Self {
        Self {
            min: IVec3::ZERO,
            max: IVec3::new(extent[0] as i32, extent[1] as i32, extent[2] as i32),
        }
    }

    /// Region starting at `origin` with the given extent
    pub fn from_origin_extent(origin: IVec3, extent: [u32; 3]) -> Self {
        Self::from_extent(extent).translated(origin)
    }

    /// Size along each axis (zero for empty axes)
    pub fn size(&self) -> IVec3 {
        self.max.saturating_sub(self.min).max(IVec3::ZERO)
    }

    /// True if the region holds no voxels
    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y || self.max.z <= self.min.z
    }

    /// Number of voxels inside the region
    pub fn volume(&self) -> u64 {
        let s = self.size();
        s.x as u64 * s.y as u64 * s.z as u64
    }

    /// Check if a voxel coordinate lies inside the region
    pub fn contains(&self, p: IVec3) -> bool {
        p.x >= self.min.x && p.x < self.max.x &&
        p.y >= self.min.y && p.y < self.max.y &&
        p.z >= self.min.z && p.z < self.max.z
    }

    /// Overlap of two regions (may be empty)
    pub fn intersection(&self, other: &VoxelRegion) -> VoxelRegion {
        VoxelRegion {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// Shift the region by `offset`, saturating at the i32 range
    pub fn translated(&self, offset: IVec3) -> VoxelRegion {
        VoxelRegion {
            min: self.min.saturating_add(offset),
            max: self.max.saturating_add(offset),
        }
    }

    /// Visit every coordinate in X-fastest order
    pub fn for_each(&self, mut f: impl FnMut(IVec3)) {
        if self.is_empty() {
            return;
        }
        for z in self.min.z..self.max.z {
            for y in self.min.y..self.max.y {
                for x in self.min.x..self.max.x {
                    f(IVec3::new(x, y, z));
                }
            }
        }
    }
}
