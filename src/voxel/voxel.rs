//! Voxel payload stored in octree leaves

use bytemuck::{Pod, Zeroable};

use super::palette::Palette;

/// Leaf payload - exactly 16 bytes
///
/// Word 0 is the material index, words 1-3 the RGB color as f32.
/// An all-zero item is an unfilled leaf slot.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct VoxelItem {
    /// Material index (0 = empty)
    pub material: u32,
    /// Linear RGB color
    pub color: [f32; 3],
}

impl VoxelItem {
    /// Empty leaf slot
    pub const EMPTY: VoxelItem = VoxelItem {
        material: 0,
        color: [0.0; 3],
    };

    pub fn new(material: u32, color: [f32; 3]) -> Self {
        Self { material, color }
    }

    /// Item for a material, colored through the palette
    pub fn from_material(material: u32, palette: &Palette) -> Self {
        Self::new(material, palette.color(material))
    }

    /// Check if the slot holds nothing
    pub fn is_empty(&self) -> bool {
        self.material == 0 && self.color == [0.0; 3]
    }

    /// Pack into four little-endian-ready words
    pub fn to_words(&self) -> [u32; 4] {
        [
            self.material,
            self.color[0].to_bits(),
            self.color[1].to_bits(),
            self.color[2].to_bits(),
        ]
    }

    pub fn from_words(words: [u32; 4]) -> Self {
        Self {
            material: words[0],
            color: [
                f32::from_bits(words[1]),
                f32::from_bits(words[2]),
                f32::from_bits(words[3]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size() {
        assert_eq!(std::mem::size_of::<VoxelItem>(), 16);
    }

    #[test]
    fn test_empty() {
        assert!(VoxelItem::EMPTY.is_empty());
        assert!(!VoxelItem::new(3, [0.0; 3]).is_empty());
    }

    #[test]
    fn test_words() {
        let item = VoxelItem::new(9, [0.25, 1.0, -2.0]);
        let words = item.to_words();
        assert_eq!(words[0], 9);
        assert_eq!(words[1], 0.25f32.to_bits());
        assert_eq!(VoxelItem::from_words(words), item);
    }

    #[test]
    fn test_from_material() {
        let palette = Palette::from_colors(&[[0.1, 0.2, 0.3]]);
        let item = VoxelItem::from_material(1, &palette);
        assert_eq!(item.color, [0.1, 0.2, 0.3]);
        assert_eq!(item.material, 1);
    }
}
