//! Scene descriptions, building, and snapshots

pub mod builder;
pub mod config;
pub mod snapshot;

pub use builder::{BuildStats, SceneStructures, build_scene, build_volume};
pub use config::{IndexKind, SceneConfig, ShapeOp};
pub use snapshot::{SceneSnapshot, SNAPSHOT_EXTENSION};
