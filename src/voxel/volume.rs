//! Dense voxel volume of material indices

use glam::{I64Vec3, IVec3, UVec3, Vec3};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::core::{Error, Result};
use crate::math::VoxelRegion;

/// Material index reserved for empty space
pub const EMPTY_MATERIAL: u32 = 0;

/// Dense 3D array of 32-bit material indices
///
/// Layout is X-fastest: `index = x + y * size_x + z * size_x * size_y`.
/// Material 0 means the voxel is empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelVolume {
    size: [u32; 3],
    data: Vec<u32>,
}

impl VoxelVolume {
    /// Create a zero-filled volume
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Result<Self> {
        if size_x == 0 || size_y == 0 || size_z == 0 {
            return Err(Error::InvalidDimension {
                x: size_x as i64,
                y: size_y as i64,
                z: size_z as i64,
            });
        }
        let len = size_x as usize * size_y as usize * size_z as usize;
        Ok(Self {
            size: [size_x, size_y, size_z],
            data: vec![EMPTY_MATERIAL; len],
        })
    }

    /// Create a cubic volume
    pub fn cube(size: u32) -> Result<Self> {
        Self::new(size, size, size)
    }

    /// Create a volume from existing X-fastest data
    pub fn from_data(size_x: u32, size_y: u32, size_z: u32, data: Vec<u32>) -> Result<Self> {
        let mut volume = Self::new(size_x, size_y, size_z)?;
        if data.len() != volume.data.len() {
            return Err(Error::MalformedBuffer(format!(
                "expected {} voxels for {}x{}x{}, got {}",
                volume.data.len(), size_x, size_y, size_z, data.len()
            )));
        }
        volume.data = data;
        Ok(volume)
    }

    /// Dimensions as `[x, y, z]`
    pub fn size(&self) -> [u32; 3] {
        self.size
    }

    pub fn size_x(&self) -> u32 {
        self.size[0]
    }

    pub fn size_y(&self) -> u32 {
        self.size[1]
    }

    pub fn size_z(&self) -> u32 {
        self.size[2]
    }

    /// Largest dimension
    pub fn max_dimension(&self) -> u32 {
        self.size[0].max(self.size[1]).max(self.size[2])
    }

    /// Total number of voxels
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: a volume has at least one voxel
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw material indices (for upload)
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Raw material indices as bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Region covering the whole volume
    pub fn region(&self) -> VoxelRegion {
        VoxelRegion::from_extent(self.size)
    }

    /// Check if a coordinate lies inside the volume
    #[inline]
    pub fn contains(&self, x: u32, y: u32, z: u32) -> bool {
        x < self.size[0] && y < self.size[1] && z < self.size[2]
    }

    /// Linear index of an in-bounds coordinate
    #[inline]
    pub fn linear_index(&self, x: u32, y: u32, z: u32) -> usize {
        debug_assert!(self.contains(x, y, z));
        x as usize
            + y as usize * self.size[0] as usize
            + z as usize * self.size[0] as usize * self.size[1] as usize
    }

    /// Coordinate of a linear index
    #[inline]
    pub fn coord_of(&self, index: usize) -> UVec3 {
        debug_assert!(index < self.data.len());
        let sx = self.size[0] as usize;
        let sy = self.size[1] as usize;
        UVec3::new(
            (index % sx) as u32,
            ((index / sx) % sy) as u32,
            (index / (sx * sy)) as u32,
        )
    }

    fn checked_index(&self, x: u32, y: u32, z: u32) -> Result<usize> {
        if self.contains(x, y, z) {
            Ok(self.linear_index(x, y, z))
        } else {
            Err(Error::out_of_bounds(x, y, z, self.size))
        }
    }

    /// Material at a coordinate
    ///
    /// # Panics
    /// Panics if the coordinate is outside the volume. Use [`Self::try_get`]
    /// for a checked read.
    pub fn get(&self, x: u32, y: u32, z: u32) -> u32 {
        assert!(self.contains(x, y, z), "voxel ({x}, {y}, {z}) outside {:?}", self.size);
        self.data[self.linear_index(x, y, z)]
    }

    /// Set the material at a coordinate
    ///
    /// # Panics
    /// Panics if the coordinate is outside the volume. Use [`Self::try_set`]
    /// for a checked write.
    pub fn set(&mut self, x: u32, y: u32, z: u32, material: u32) {
        assert!(self.contains(x, y, z), "voxel ({x}, {y}, {z}) outside {:?}", self.size);
        let idx = self.linear_index(x, y, z);
        self.data[idx] = material;
    }

    /// Checked read
    pub fn try_get(&self, x: u32, y: u32, z: u32) -> Result<u32> {
        Ok(self.data[self.checked_index(x, y, z)?])
    }

    /// Checked write
    pub fn try_set(&mut self, x: u32, y: u32, z: u32, material: u32) -> Result<()> {
        let idx = self.checked_index(x, y, z)?;
        self.data[idx] = material;
        Ok(())
    }

    /// Paste the non-empty voxels of `other` into this volume at `offset`.
    ///
    /// Offsets may be negative. Source voxels that land outside this volume
    /// are clipped; empty source voxels never overwrite the destination.
    /// Returns the number of voxels written.
    pub fn composite(&mut self, offset: IVec3, other: &VoxelVolume) -> usize {
        let placed = other.region().translated(offset);
        let overlap = self.region().intersection(&placed);
        if overlap.volume() < placed.volume() {
            log::debug!(
                "composite at {:?}: clipped {} of {} source voxels",
                offset,
                placed.volume() - overlap.volume(),
                placed.volume()
            );
        }

        let mut written = 0;
        overlap.for_each(|dst| {
            let src = (dst - offset).as_uvec3();
            let material = other.data[other.linear_index(src.x, src.y, src.z)];
            if material != EMPTY_MATERIAL {
                let idx = self.linear_index(dst.x as u32, dst.y as u32, dst.z as u32);
                self.data[idx] = material;
                written += 1;
            }
        });
        written
    }

    /// Part of the inclusive box `[lo, hi]` inside the volume
    fn clamp_inclusive(&self, lo: I64Vec3, hi: I64Vec3) -> VoxelRegion {
        let extent = UVec3::from_array(self.size).as_i64vec3();
        let min = lo.clamp(I64Vec3::ZERO, extent);
        let max = hi.saturating_add(I64Vec3::ONE).clamp(I64Vec3::ZERO, extent);
        VoxelRegion::new(min.as_ivec3(), max.as_ivec3())
    }

    /// Fill every voxel whose distance to `center` is `<= radius`.
    ///
    /// Only the sphere's bounding box, clamped to the volume, is visited.
    /// Returns the number of voxels written.
    pub fn fill_sphere(&mut self, center: IVec3, radius: f32, material: u32) -> usize {
        if radius < 0.0 {
            return 0;
        }
        // Saturating f32 -> i64 cast keeps huge radii finite
        let reach = I64Vec3::splat(radius.ceil() as i64);
        let center_wide = center.as_i64vec3();
        let clamped = self.clamp_inclusive(
            center_wide.saturating_sub(reach),
            center_wide.saturating_add(reach),
        );

        let center_f = center.as_vec3();
        let mut written = 0;
        clamped.for_each(|p| {
            if p.as_vec3().distance(center_f) <= radius {
                let idx = self.linear_index(p.x as u32, p.y as u32, p.z as u32);
                self.data[idx] = material;
                written += 1;
            }
        });
        written
    }

    /// Same as [`Self::fill_sphere`] with a fractional center
    pub fn fill_sphere_at(&mut self, center: Vec3, radius: f32, material: u32) -> usize {
        if radius < 0.0 {
            return 0;
        }
        let clamped = self.clamp_inclusive(
            (center - Vec3::splat(radius)).floor().as_i64vec3(),
            (center + Vec3::splat(radius)).ceil().as_i64vec3(),
        );

        let mut written = 0;
        clamped.for_each(|p| {
            if p.as_vec3().distance(center) <= radius {
                let idx = self.linear_index(p.x as u32, p.y as u32, p.z as u32);
                self.data[idx] = material;
                written += 1;
            }
        });
        written
    }

    /// Set every voxel to `material`
    pub fn fill_all(&mut self, material: u32) {
        self.data.fill(material);
    }

    /// Fill each voxel independently with probability `1 / one_in`.
    ///
    /// Not cryptographic; determinism comes from the injected generator.
    /// `one_in <= 1` fills every voxel. Returns the number of voxels written.
    pub fn fill_random<R: Rng + ?Sized>(&mut self, material: u32, one_in: u32, rng: &mut R) -> usize {
        let mut written = 0;
        for voxel in &mut self.data {
            if one_in <= 1 || rng.gen_range(0..one_in) == 0 {
                *voxel = material;
                written += 1;
            }
        }
        written
    }

    /// [`Self::fill_random`] driven by a seeded `StdRng`
    pub fn fill_random_seeded(&mut self, material: u32, one_in: u32, seed: u64) -> usize {
        let mut rng = StdRng::seed_from_u64(seed);
        self.fill_random(material, one_in, &mut rng)
    }

    /// Iterate non-empty voxels in linear scan order
    pub fn iter_filled(&self) -> impl Iterator<Item = (UVec3, u32)> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, m)| **m != EMPTY_MATERIAL)
            .map(|(i, m)| (self.coord_of(i), *m))
    }

    /// Number of non-empty voxels
    pub fn filled_count(&self) -> usize {
        self.data.iter().filter(|m| **m != EMPTY_MATERIAL).count()
    }
}
