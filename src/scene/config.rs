//! Scene description: volume size, palette, and the shapes to voxelize

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Largest accepted volume side
pub const MAX_DIMENSION: u32 = 4096;

/// Which spatial indices to build from the volume
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Octree,
    Grid,
    #[default]
    Both,
}

impl IndexKind {
    pub fn wants_octree(self) -> bool {
        matches!(self, IndexKind::Octree | IndexKind::Both)
    }

    pub fn wants_grid(self) -> bool {
        matches!(self, IndexKind::Grid | IndexKind::Both)
    }
}

/// One edit applied to the volume, in order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ShapeOp {
    /// Set every voxel
    Fill { material: u32 },
    /// Solid sphere, inclusive radius
    Sphere {
        center: [i32; 3],
        radius: f32,
        material: u32,
    },
    /// Fill each voxel with probability `1 / one_in`
    Random { material: u32, one_in: u32 },
    /// Single voxel
    Voxel { position: [u32; 3], material: u32 },
    /// Build a sub-volume and copy its non-empty voxels in at `offset`
    Composite {
        offset: [i32; 3],
        size: [u32; 3],
        shapes: Vec<ShapeOp>,
    },
}

/// Full scene description, loaded from JSON
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Volume dimensions in voxels
    pub size: [u32; 3],
    /// Seed for `Random` shapes
    pub seed: u64,
    /// Linear RGB colors for materials 1..=N
    pub palette: Vec<[f32; 3]>,
    pub shapes: Vec<ShapeOp>,
    pub index: IndexKind,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            size: [64, 64, 64],
            seed: 12345,
            palette: vec![
                [0.8, 0.8, 0.8], // stone
                [0.9, 0.3, 0.2], // red
                [0.2, 0.5, 0.9], // blue
            ],
            shapes: vec![
                ShapeOp::Sphere {
                    center: [32, 32, 32],
                    radius: 20.0,
                    material: 1,
                },
                ShapeOp::Random {
                    material: 2,
                    one_in: 500,
                },
                ShapeOp::Composite {
                    offset: [-4, 48, -4],
                    size: [16, 16, 16],
                    shapes: vec![ShapeOp::Sphere {
                        center: [8, 8, 8],
                        radius: 7.0,
                        material: 3,
                    }],
                },
            ],
            index: IndexKind::Both,
        }
    }
}

impl SceneConfig {
    /// Parse and validate a JSON description
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SceneConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: SceneConfig = serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        log::debug!("loaded scene config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Check dimensions and shape parameters
    pub fn validate(&self) -> Result<()> {
        validate_volume(self.size, &self.shapes, "scene")?;

        let max_material = max_material(&self.shapes);
        if max_material as usize > self.palette.len() {
            log::warn!(
                "material {} has no palette entry ({} colors), using fallback color",
                max_material,
                self.palette.len()
            );
        }
        Ok(())
    }
}

fn validate_volume(size: [u32; 3], shapes: &[ShapeOp], context: &str) -> Result<()> {
    if size.iter().any(|d| *d == 0 || *d > MAX_DIMENSION) {
        return Err(Error::Config(format!(
            "{context}: size {size:?} must be within 1..={MAX_DIMENSION} on every axis"
        )));
    }

    for (i, shape) in shapes.iter().enumerate() {
        match shape {
            ShapeOp::Sphere { radius, .. } if !radius.is_finite() || *radius < 0.0 => {
                return Err(Error::Config(format!("{context}: shape {i}: invalid radius {radius}")));
            }
            ShapeOp::Voxel { position, .. }
                if position.iter().zip(size.iter()).any(|(p, s)| p >= s) =>
            {
                return Err(Error::Config(format!(
                    "{context}: shape {i}: voxel {position:?} outside {size:?}"
                )));
            }
            ShapeOp::Composite { size, shapes, .. } => {
                validate_volume(*size, shapes, &format!("{context}: shape {i}"))?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn max_material(shapes: &[ShapeOp]) -> u32 {
    shapes
        .iter()
        .map(|shape| match shape {
            ShapeOp::Fill { material }
            | ShapeOp::Sphere { material, .. }
            | ShapeOp::Random { material, .. }
            | ShapeOp::Voxel { material, .. } => *material,
            ShapeOp::Composite { shapes, .. } => max_material(shapes),
        })
        .max()
        .unwrap_or(0)
}
