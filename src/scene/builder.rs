//! Turns a [`SceneConfig`] into a voxel volume and its spatial indices

use std::time::{Duration, Instant};

use glam::IVec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::config::{SceneConfig, ShapeOp};
use crate::core::Result;
use crate::voxel::grid::ChunkedVoxelGrid;
use crate::voxel::palette::Palette;
use crate::voxel::svo::SparseOctree;
use crate::voxel::volume::VoxelVolume;

/// Counters collected while building a scene
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildStats {
    pub volume_size: [u32; 3],
    pub filled_voxels: usize,
    pub octree_slabs: usize,
    pub octree_leaves: usize,
    pub octree_bytes: usize,
    pub grid_layer1_chunks: usize,
    pub grid_layer2_chunks: usize,
    pub grid_bytes: usize,
    pub volume_time: Duration,
    pub index_time: Duration,
}

/// Everything produced from one scene description
#[derive(Clone, Debug)]
pub struct SceneStructures {
    pub volume: VoxelVolume,
    pub palette: Palette,
    pub octree: Option<SparseOctree>,
    pub grid: Option<ChunkedVoxelGrid>,
    pub stats: BuildStats,
}

/// Voxelize the config's shapes into a dense volume
pub fn build_volume(config: &SceneConfig) -> Result<VoxelVolume> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    apply_shapes(config.size, &config.shapes, &mut rng)
}

fn apply_shapes(size: [u32; 3], shapes: &[ShapeOp], rng: &mut StdRng) -> Result<VoxelVolume> {
    let mut volume = VoxelVolume::new(size[0], size[1], size[2])?;

    for shape in shapes {
        match shape {
            ShapeOp::Fill { material } => volume.fill_all(*material),
            ShapeOp::Sphere {
                center,
                radius,
                material,
            } => {
                let written = volume.fill_sphere(IVec3::from_array(*center), *radius, *material);
                log::debug!("sphere at {:?} r={}: {} voxels", center, radius, written);
            }
            ShapeOp::Random { material, one_in } => {
                let written = volume.fill_random(*material, *one_in, rng);
                log::debug!("random 1/{}: {} voxels", one_in, written);
            }
            ShapeOp::Voxel { position, material } => {
                volume.try_set(position[0], position[1], position[2], *material)?;
            }
            ShapeOp::Composite {
                offset,
                size,
                shapes,
            } => {
                let sub = apply_shapes(*size, shapes, rng)?;
                let written = volume.composite(IVec3::from_array(*offset), &sub);
                log::debug!("composite at {:?}: {} voxels", offset, written);
            }
        }
    }
    Ok(volume)
}

/// Build the volume and whichever indices the config asks for
pub fn build_scene(config: &SceneConfig) -> Result<SceneStructures> {
    config.validate()?;

    let start = Instant::now();
    let volume = build_volume(config)?;
    let volume_time = start.elapsed();
    let palette = Palette::from_colors(&config.palette);

    let start = Instant::now();
    let octree = config
        .index
        .wants_octree()
        .then(|| SparseOctree::from_volume(&volume, &palette));
    let grid = config
        .index
        .wants_grid()
        .then(|| ChunkedVoxelGrid::from_volume(&volume, &palette));
    let index_time = start.elapsed();

    let mut stats = BuildStats {
        volume_size: volume.size(),
        filled_voxels: volume.filled_count(),
        volume_time,
        index_time,
        ..Default::default()
    };
    if let Some(octree) = &octree {
        stats.octree_slabs = octree.slab_count();
        stats.octree_leaves = octree.leaf_count();
        stats.octree_bytes = octree.byte_len();
    }
    if let Some(grid) = &grid {
        stats.grid_layer1_chunks = grid.layer1_chunks().len();
        stats.grid_layer2_chunks = grid.layer2_chunks().len();
        stats.grid_bytes = grid.memory_usage();
    }

    log::info!(
        "scene built: {:?} volume, {} filled voxels in {:.1?} (+{:.1?} indexing)",
        stats.volume_size,
        stats.filled_voxels,
        stats.volume_time,
        stats.index_time
    );

    Ok(SceneStructures {
        volume,
        palette,
        octree,
        grid,
        stats,
    })
}
