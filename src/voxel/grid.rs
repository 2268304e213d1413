//! Three-level chunked voxel grid
//!
//! Top-level dense array (one `i32` per 16^3 region) -> layer 1 chunks
//! (4^3 indices) -> layer 2 chunks (4^3 items). Chunks are appended the
//! first time a voxel inside them is written and never removed until
//! [`ChunkedVoxelGrid::clear`].

use glam::UVec3;

use super::chunk::{
    GridItem, LAYER1_SIZE, LAYER2_SIZE, Layer1Chunk, Layer2Chunk, NO_CHUNK, TOP_CHUNK_VOXELS,
    chunk_slot_index,
};
use crate::core::{Error, Result};
use crate::voxel::palette::Palette;
use crate::voxel::volume::VoxelVolume;

/// Sparse voxel grid with two levels of lazily allocated chunks
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkedVoxelGrid {
    /// Voxel dimensions
    size: [u32; 3],
    /// Top-level entries per axis (`ceil(size / 16)`)
    top_counts: [u32; 3],
    /// One entry per 16^3 region: index into `layer1_chunks` or -1
    top: Vec<i32>,
    layer1_chunks: Vec<Layer1Chunk>,
    layer2_chunks: Vec<Layer2Chunk>,
}

impl ChunkedVoxelGrid {
    /// Create an empty grid for the given voxel dimensions
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Result<Self> {
        validate_dimensions(size_x, size_y, size_z)?;
        Ok(Self::with_size([size_x, size_y, size_z]))
    }

    fn with_size(size: [u32; 3]) -> Self {
        let top_counts = size.map(|d| d.div_ceil(TOP_CHUNK_VOXELS));
        let top_len = top_counts.iter().map(|c| *c as usize).product();
        Self {
            size,
            top_counts,
            top: vec![NO_CHUNK; top_len],
            layer1_chunks: Vec::new(),
            layer2_chunks: Vec::new(),
        }
    }

    /// Resize the grid and reset every level
    pub fn init(&mut self, size_x: u32, size_y: u32, size_z: u32) -> Result<()> {
        validate_dimensions(size_x, size_y, size_z)?;
        *self = Self::with_size([size_x, size_y, size_z]);
        Ok(())
    }

    /// Build a grid holding every non-empty voxel of `volume`
    pub fn from_volume(volume: &VoxelVolume, palette: &Palette) -> Self {
        let mut grid = Self::with_size(volume.size());

        let mut count = 0usize;
        for (coord, material) in volume.iter_filled() {
            grid.insert_unchecked(coord, GridItem::new(palette.color(material)));
            count += 1;
        }
        log::info!(
            "voxel grid built: {} voxels, {} layer 1 chunks, {} layer 2 chunks",
            count,
            grid.layer1_chunks.len(),
            grid.layer2_chunks.len()
        );
        grid
    }

    /// Reassemble a grid from its three levels
    ///
    /// Every index must be -1 or point inside the next level.
    pub fn from_raw_parts(
        size: [u32; 3],
        top: Vec<i32>,
        layer1_chunks: Vec<Layer1Chunk>,
        layer2_chunks: Vec<Layer2Chunk>,
    ) -> Result<Self> {
        let mut grid = Self::new(size[0], size[1], size[2])?;
        if top.len() != grid.top.len() {
            return Err(Error::MalformedBuffer(format!(
                "top level has {} entries, expected {}",
                top.len(),
                grid.top.len()
            )));
        }
        let in_range = |index: i32, len: usize| index == NO_CHUNK || (index >= 0 && (index as usize) < len);
        if let Some(bad) = top.iter().find(|i| !in_range(**i, layer1_chunks.len())) {
            return Err(Error::MalformedBuffer(format!("layer 1 index {bad} out of range")));
        }
        for chunk in &layer1_chunks {
            if let Some(bad) = chunk.item_indices.iter().find(|i| !in_range(**i, layer2_chunks.len())) {
                return Err(Error::MalformedBuffer(format!("layer 2 index {bad} out of range")));
            }
        }
        grid.top = top;
        grid.layer1_chunks = layer1_chunks;
        grid.layer2_chunks = layer2_chunks;
        Ok(grid)
    }

    /// Reset the top level to -1 and drop every chunk
    pub fn clear(&mut self) {
        self.top.fill(NO_CHUNK);
        self.layer1_chunks.clear();
        self.layer2_chunks.clear();
    }

    /// Check if a coordinate lies inside the grid
    pub fn contains(&self, x: u32, y: u32, z: u32) -> bool {
        x < self.size[0] && y < self.size[1] && z < self.size[2]
    }

    fn top_index(&self, coord: UVec3) -> usize {
        let c = coord / TOP_CHUNK_VOXELS;
        (c.x + c.y * self.top_counts[0] + c.z * self.top_counts[0] * self.top_counts[1]) as usize
    }

    fn layer1_slot(coord: UVec3) -> usize {
        let local = (coord % TOP_CHUNK_VOXELS) / LAYER2_SIZE;
        debug_assert!(local.max_element() < LAYER1_SIZE);
        chunk_slot_index(local.x, local.y, local.z)
    }

    fn layer2_slot(coord: UVec3) -> usize {
        let local = coord % LAYER2_SIZE;
        chunk_slot_index(local.x, local.y, local.z)
    }

    /// Insert an item, marking it filled
    ///
    /// # Panics
    /// Panics if the coordinate is outside the grid. Use
    /// [`Self::try_insert_item`] for a checked insert.
    pub fn insert_item(&mut self, x: u32, y: u32, z: u32, item: GridItem) {
        assert!(
            self.contains(x, y, z),
            "grid insert ({x}, {y}, {z}) outside {:?}",
            self.size
        );
        self.insert_unchecked(UVec3::new(x, y, z), item);
    }

    /// Checked insert
    pub fn try_insert_item(&mut self, x: u32, y: u32, z: u32, item: GridItem) -> Result<()> {
        if !self.contains(x, y, z) {
            return Err(Error::out_of_bounds(x, y, z, self.size));
        }
        self.insert_unchecked(UVec3::new(x, y, z), item);
        Ok(())
    }

    fn insert_unchecked(&mut self, coord: UVec3, mut item: GridItem) {
        let top_index = self.top_index(coord);
        if self.top[top_index] == NO_CHUNK {
            self.top[top_index] = self.layer1_chunks.len() as i32;
            self.layer1_chunks.push(Layer1Chunk::new());
        }
        let layer1 = self.top[top_index] as usize;

        let slot = Self::layer1_slot(coord);
        if self.layer1_chunks[layer1].item_indices[slot] == NO_CHUNK {
            self.layer1_chunks[layer1].item_indices[slot] = self.layer2_chunks.len() as i32;
            self.layer2_chunks.push(Layer2Chunk::new());
        }
        let layer2 = self.layer1_chunks[layer1].item_indices[slot] as usize;

        item.filled = 1.0;
        self.layer2_chunks[layer2].items[Self::layer2_slot(coord)] = item;
    }

    /// Filled item at a coordinate, if any
    pub fn lookup(&self, x: u32, y: u32, z: u32) -> Option<GridItem> {
        if !self.contains(x, y, z) {
            return None;
        }
        let coord = UVec3::new(x, y, z);
        let layer1 = self.top[self.top_index(coord)];
        if layer1 == NO_CHUNK {
            return None;
        }
        let layer2 = self.layer1_chunks[layer1 as usize].item_indices[Self::layer1_slot(coord)];
        if layer2 == NO_CHUNK {
            return None;
        }
        let item = self.layer2_chunks[layer2 as usize].items[Self::layer2_slot(coord)];
        item.is_filled().then_some(item)
    }

    /// Voxel dimensions
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

    /// Top-level entries per axis
    pub fn top_counts(&self) -> [u32; 3] {
        self.top_counts
    }

    /// Top-level array (`countX * countY * countZ` entries)
    pub fn top_level(&self) -> &[i32] {
        &self.top
    }

    pub fn layer1_chunks(&self) -> &[Layer1Chunk] {
        &self.layer1_chunks
    }

    pub fn layer2_chunks(&self) -> &[Layer2Chunk] {
        &self.layer2_chunks
    }

    /// Layer 1 chunks, failing if nothing was inserted yet
    pub fn checked_layer1_chunks(&self) -> Result<&[Layer1Chunk]> {
        if self.layer1_chunks.is_empty() {
            return Err(Error::EmptyStructureAccess("grid layer 1 chunks"));
        }
        Ok(&self.layer1_chunks)
    }

    /// Layer 2 chunks, failing if nothing was inserted yet
    pub fn checked_layer2_chunks(&self) -> Result<&[Layer2Chunk]> {
        if self.layer2_chunks.is_empty() {
            return Err(Error::EmptyStructureAccess("grid layer 2 chunks"));
        }
        Ok(&self.layer2_chunks)
    }

    pub fn top_level_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.top)
    }

    pub fn layer1_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.layer1_chunks)
    }

    pub fn layer2_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.layer2_chunks)
    }

    pub fn is_empty(&self) -> bool {
        self.layer2_chunks.is_empty()
    }

    /// Total bytes across the three levels
    pub fn memory_usage(&self) -> usize {
        self.top_level_bytes().len() + self.layer1_bytes().len() + self.layer2_bytes().len()
    }
}

fn validate_dimensions(size_x: u32, size_y: u32, size_z: u32) -> Result<()> {
    if size_x == 0 || size_y == 0 || size_z == 0 {
        return Err(Error::InvalidDimension {
            x: size_x as i64,
            y: size_y as i64,
            z: size_z as i64,
        });
    }
    Ok(())
}
