//! Scene builder binary: voxelizes scene configs and writes index snapshots.
//!
//! Usage: cargo run --release --bin build_scene -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>       Scene config JSON; repeat for several scenes
//!                         (default: built-in demo scene)
//!   --out <PATH>          Snapshot file for a single scene, or output
//!                         directory when several configs are given
//!   --seed <SEED>         Override the random seed of every scene
//!   --dump-config <PATH>  Write the demo scene config as JSON and exit
//!
//! Output structure with several configs:
//!   <out>/
//!     <config stem>.vxs

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use voxtrace::core::Result;
use voxtrace::scene::{SNAPSHOT_EXTENSION, SceneConfig, SceneSnapshot, build_scene};

fn main() {
    voxtrace::core::logging::init();

    let args: Vec<String> = std::env::args().collect();

    if let Some(path) = parse_str_arg(&args, "--dump-config") {
        match SceneConfig::default().save(&path) {
            Ok(()) => println!("Wrote demo config to {}", path),
            Err(e) => {
                log::error!("failed to write {}: {}", path, e);
                std::process::exit(1);
            }
        }
        return;
    }

    let config_paths = parse_all_str_args(&args, "--config");
    let out = parse_str_arg(&args, "--out").map(PathBuf::from);
    let seed = parse_u64_arg(&args, "--seed");

    println!("=== Voxtrace Scene Builder ===");
    println!("Scenes: {}", config_paths.len().max(1));
    if let Some(seed) = seed {
        println!("Seed:   {} (override)", seed);
    }
    if let Some(out) = &out {
        println!("Output: {}", out.display());
    }
    println!();

    let start = Instant::now();
    let failures = if config_paths.is_empty() {
        let mut config = SceneConfig::default();
        if let Some(seed) = seed {
            config.seed = seed;
        }
        usize::from(run_scene("demo", &config, out.as_deref()).is_err())
    } else {
        let multiple = config_paths.len() > 1;
        config_paths
            .par_iter()
            .map(|path| {
                let path = Path::new(path.as_str());
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "scene".to_string());
                let target = match (&out, multiple) {
                    (Some(dir), true) => Some(dir.join(format!("{}.{}", name, SNAPSHOT_EXTENSION))),
                    (Some(file), false) => Some(file.clone()),
                    (None, _) => None,
                };
                SceneConfig::load(path).and_then(|mut config| {
                    if let Some(seed) = seed {
                        config.seed = seed;
                    }
                    run_scene(&name, &config, target.as_deref())
                })
            })
            .filter(|result| result.is_err())
            .count()
    };

    println!();
    println!("Done in {:.2}s", start.elapsed().as_secs_f64());
    if failures > 0 {
        log::error!("{} scene(s) failed", failures);
        std::process::exit(1);
    }
}

/// Build one scene, print its stats, and optionally write a snapshot
fn run_scene(name: &str, config: &SceneConfig, out: Option<&Path>) -> Result<()> {
    let scene = build_scene(config).inspect_err(|e| log::error!("{}: {}", name, e))?;
    let stats = &scene.stats;

    println!(
        "[{}] {}x{}x{} volume, {} filled voxels ({:.1}ms)",
        name,
        stats.volume_size[0],
        stats.volume_size[1],
        stats.volume_size[2],
        stats.filled_voxels,
        stats.volume_time.as_secs_f64() * 1000.0
    );
    if scene.octree.is_some() {
        println!(
            "[{}]   octree: {} slabs, {} leaves, {:.1} KB",
            name,
            stats.octree_slabs,
            stats.octree_leaves,
            stats.octree_bytes as f64 / 1024.0
        );
    }
    if scene.grid.is_some() {
        println!(
            "[{}]   grid:   {} layer 1 chunks, {} layer 2 chunks, {:.1} KB",
            name,
            stats.grid_layer1_chunks,
            stats.grid_layer2_chunks,
            stats.grid_bytes as f64 / 1024.0
        );
    }

    if let Some(path) = out {
        SceneSnapshot::capture(&scene)
            .save(path)
            .inspect_err(|e| log::error!("{}: failed to write {}: {}", name, path.display(), e))?;
    }
    Ok(())
}

fn parse_u64_arg(args: &[String], flag: &str) -> Option<u64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_all_str_args(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|pair| pair[0] == flag)
        .map(|pair| pair[1].clone())
        .collect()
}
