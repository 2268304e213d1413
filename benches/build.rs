use criterion::{criterion_group, criterion_main, Criterion, black_box};
use glam::IVec3;

use voxtrace::voxel::{ChunkedVoxelGrid, Palette, SparseOctree, VoxelVolume};

fn sphere_volume(size: u32) -> VoxelVolume {
    let mut volume = VoxelVolume::cube(size).unwrap();
    let center = IVec3::splat(size as i32 / 2);
    volume.fill_sphere(center, size as f32 * 0.44, 1);
    volume
}

fn bench_octree_build_32(c: &mut Criterion) {
    let volume = sphere_volume(32);
    let palette = Palette::from_colors(&[[0.8, 0.8, 0.8]]);

    c.bench_function("octree_build_32", |b| {
        b.iter(|| SparseOctree::from_volume(black_box(&volume), &palette));
    });
}

fn bench_octree_build_64(c: &mut Criterion) {
    let volume = sphere_volume(64);
    let palette = Palette::from_colors(&[[0.8, 0.8, 0.8]]);

    c.bench_function("octree_build_64", |b| {
        b.iter(|| SparseOctree::from_volume(black_box(&volume), &palette));
    });
}

fn bench_octree_build_128(c: &mut Criterion) {
    let volume = sphere_volume(128);
    let palette = Palette::from_colors(&[[0.8, 0.8, 0.8]]);

    c.bench_function("octree_build_128", |b| {
        b.iter(|| SparseOctree::from_volume(black_box(&volume), &palette));
    });
}

fn bench_grid_build_64(c: &mut Criterion) {
    let volume = sphere_volume(64);
    let palette = Palette::from_colors(&[[0.8, 0.8, 0.8]]);

    c.bench_function("grid_build_64", |b| {
        b.iter(|| ChunkedVoxelGrid::from_volume(black_box(&volume), &palette));
    });
}

fn bench_grid_build_128(c: &mut Criterion) {
    let volume = sphere_volume(128);
    let palette = Palette::from_colors(&[[0.8, 0.8, 0.8]]);

    c.bench_function("grid_build_128", |b| {
        b.iter(|| ChunkedVoxelGrid::from_volume(black_box(&volume), &palette));
    });
}

fn bench_octree_lookup(c: &mut Criterion) {
    let volume = sphere_volume(64);
    let octree = SparseOctree::from_volume(&volume, &Palette::new());

    c.bench_function("octree_lookup_64", |b| {
        b.iter(|| {
            let mut hits = 0u32;
            for i in 0..64u32 {
                if octree.lookup(black_box(i), 32, 32).is_some() {
                    hits += 1;
                }
            }
            hits
        });
    });
}

criterion_group!(
    benches,
    bench_octree_build_32,
    bench_octree_build_64,
    bench_octree_build_128,
    bench_grid_build_64,
    bench_grid_build_128,
    bench_octree_lookup,
);
criterion_main!(benches);
