//! Built-scene snapshots: rkyv archive compressed with LZ4
//!
//! Stores the flat octree buffer and the three grid levels so a scene can
//! be uploaded again without rebuilding from the volume.

use std::path::Path;

use rkyv::{Archive, Deserialize, Serialize};

use super::builder::SceneStructures;
use crate::core::{Error, Result};
use crate::voxel::chunk::{CHUNK_SLOTS, GridItem, Layer1Chunk, Layer2Chunk};
use crate::voxel::grid::ChunkedVoxelGrid;
use crate::voxel::svo::SparseOctree;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// File extension for snapshot files
pub const SNAPSHOT_EXTENSION: &str = "vxs";

/// Serialized octree
#[derive(Clone, Debug, PartialEq, Archive, Deserialize, Serialize)]
pub struct OctreeSnapshot {
    pub size: u32,
    pub layer_count: u32,
    /// Flat little-endian slab buffer
    pub bytes: Vec<u8>,
}

/// Serialized grid, chunks flattened to their scalar words
#[derive(Clone, Debug, PartialEq, Archive, Deserialize, Serialize)]
pub struct GridSnapshot {
    pub size: [u32; 3],
    pub top_level: Vec<i32>,
    /// 64 indices per layer 1 chunk
    pub layer1: Vec<i32>,
    /// 64 `[filled, r, g, b]` items per layer 2 chunk
    pub layer2: Vec<f32>,
}

/// Serialized scene indices
#[derive(Clone, Debug, PartialEq, Archive, Deserialize, Serialize)]
pub struct SceneSnapshot {
    pub version: u32,
    pub volume_size: [u32; 3],
    pub octree: Option<OctreeSnapshot>,
    pub grid: Option<GridSnapshot>,
}

impl OctreeSnapshot {
    pub fn capture(octree: &SparseOctree) -> Self {
        Self {
            size: octree.size(),
            layer_count: octree.layer_count(),
            bytes: octree.to_bytes(),
        }
    }

    pub fn restore(&self) -> Result<SparseOctree> {
        let octree = SparseOctree::from_bytes(&self.bytes, self.size)?;
        if octree.layer_count() != self.layer_count {
            return Err(Error::MalformedBuffer(format!(
                "layer count {} does not match cube size {}",
                self.layer_count, self.size
            )));
        }
        Ok(octree)
    }
}

impl GridSnapshot {
    pub fn capture(grid: &ChunkedVoxelGrid) -> Self {
        Self {
            size: grid.size(),
            top_level: grid.top_level().to_vec(),
            layer1: grid
                .layer1_chunks()
                .iter()
                .flat_map(|c| c.item_indices)
                .collect(),
            layer2: grid
                .layer2_chunks()
                .iter()
                .flat_map(|c| c.items.iter().flat_map(|i| [i.filled, i.color[0], i.color[1], i.color[2]]))
                .collect(),
        }
    }

    pub fn restore(&self) -> Result<ChunkedVoxelGrid> {
        if self.layer1.len() % CHUNK_SLOTS != 0 || self.layer2.len() % (CHUNK_SLOTS * 4) != 0 {
            return Err(Error::MalformedBuffer("grid chunk data is not a whole number of chunks".into()));
        }

        let layer1 = self
            .layer1
            .chunks_exact(CHUNK_SLOTS)
            .map(|words| {
                let mut chunk = Layer1Chunk::new();
                chunk.item_indices.copy_from_slice(words);
                chunk
            })
            .collect();
        let layer2 = self
            .layer2
            .chunks_exact(CHUNK_SLOTS * 4)
            .map(|words| {
                let mut chunk = Layer2Chunk::new();
                for (item, w) in chunk.items.iter_mut().zip(words.chunks_exact(4)) {
                    *item = GridItem {
                        filled: w[0],
                        color: [w[1], w[2], w[3]],
                    };
                }
                chunk
            })
            .collect();

        ChunkedVoxelGrid::from_raw_parts(self.size, self.top_level.clone(), layer1, layer2)
    }
}

impl SceneSnapshot {
    /// Snapshot whichever indices the scene built
    pub fn capture(scene: &SceneStructures) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            volume_size: scene.volume.size(),
            octree: scene.octree.as_ref().map(OctreeSnapshot::capture),
            grid: scene.grid.as_ref().map(GridSnapshot::capture),
        }
    }

    /// Serialize (uncompressed)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Deserialize (uncompressed), rejecting other format versions
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        // Archive access needs the buffer aligned for its widest field
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(data.len());
        aligned.extend_from_slice(data);
        let archived = rkyv::access::<ArchivedSceneSnapshot, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let snapshot: SceneSnapshot = rkyv::deserialize::<SceneSnapshot, rkyv::rancor::Error>(archived)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::Serialization(format!(
                "snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        Ok(snapshot)
    }

    /// Serialize and compress with LZ4
    pub fn compress(&self) -> Result<Vec<u8>> {
        Ok(lz4_flex::compress_prepend_size(&self.to_bytes()?))
    }

    pub fn decompress(data: &[u8]) -> Result<Self> {
        let raw = lz4_flex::decompress_size_prepended(data)
            .map_err(|e| Error::Serialization(format!("LZ4 decompression failed: {}", e)))?;
        Self::from_bytes(&raw)
    }

    /// Write compressed, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let compressed = self.compress()?;
        std::fs::write(path, &compressed)?;
        log::info!("wrote snapshot {} ({} bytes)", path.display(), compressed.len());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::decompress(&data)
    }

    pub fn restore_octree(&self) -> Result<Option<SparseOctree>> {
        self.octree.as_ref().map(OctreeSnapshot::restore).transpose()
    }

    pub fn restore_grid(&self) -> Result<Option<ChunkedVoxelGrid>> {
        self.grid.as_ref().map(GridSnapshot::restore).transpose()
    }
}
