//! Material palette (voxel atlas) uploaded alongside the spatial index

use bytemuck::{Pod, Zeroable};

/// Convert an sRGB byte triple to linear-ish unit floats
pub fn rgb8_to_unit(r: u8, g: u8, b: u8) -> [f32; 3] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

/// One palette entry - exactly 16 bytes (float3 + pad, matches HLSL/WGSL layout)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct AtlasEntry {
    pub color: [f32; 3],
    pub padding: f32,
}

impl AtlasEntry {
    pub const fn new(color: [f32; 3]) -> Self {
        Self { color, padding: 0.0 }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(rgb8_to_unit(r, g, b))
    }
}

/// Material index -> color table. Entry 0 is reserved for empty space.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    entries: Vec<AtlasEntry>,
    /// Color returned for materials without an entry
    fallback: [f32; 3],
}

impl Palette {
    /// Palette with only the reserved empty entry
    pub fn new() -> Self {
        Self {
            entries: vec![AtlasEntry::default()],
            fallback: [1.0, 1.0, 1.0],
        }
    }

    /// Palette whose entries 1.. are the given colors
    pub fn from_colors(colors: &[[f32; 3]]) -> Self {
        let mut palette = Self::new();
        for color in colors {
            palette.push(*color);
        }
        palette
    }

    /// Append a color and return its material index
    pub fn push(&mut self, color: [f32; 3]) -> u32 {
        let index = self.entries.len() as u32;
        self.entries.push(AtlasEntry::new(color));
        index
    }

    /// Override the color used for unknown materials
    pub fn with_fallback(mut self, color: [f32; 3]) -> Self {
        self.fallback = color;
        self
    }

    /// Drop every entry except the reserved one
    pub fn clear(&mut self) {
        self.entries.truncate(1);
    }

    /// Color for a material index
    pub fn color(&self, material: u32) -> [f32; 3] {
        if material == 0 {
            return [0.0; 3];
        }
        self.entries
            .get(material as usize)
            .map(|e| e.color)
            .unwrap_or(self.fallback)
    }

    /// Number of entries including the reserved one
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Entries for GPU upload
    pub fn entries(&self) -> &[AtlasEntry] {
        &self.entries
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.entries)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}
