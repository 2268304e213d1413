//! Octant addressing for power-of-two cubes
//!
//! Octant index packs one bit per axis: bit 0 = x, bit 1 = y, bit 2 = z.
//! A coordinate falls in the upper half of an axis when it is `>= scale / 2`.

use crate::core::types::UVec3;

/// Combine per-axis half selectors into an octant index (0-7)
#[inline]
pub fn octant_index(ox: u32, oy: u32, oz: u32) -> u8 {
    debug_assert!(ox < 2 && oy < 2 && oz < 2);
    (ox + oy * 2 + oz * 4) as u8
}

/// Octant of `local` within a cube of side `scale`
#[inline]
pub fn octant_of(local: UVec3, scale: u32) -> u8 {
    let half = scale / 2;
    octant_index(
        (local.x >= half) as u32,
        (local.y >= half) as u32,
        (local.z >= half) as u32,
    )
}

/// Minimum corner offset of `octant` inside a cube whose half side is `half`
#[inline]
pub fn octant_offset(octant: u8, half: u32) -> UVec3 {
    debug_assert!(octant < 8);
    UVec3::new(
        if octant & 1 != 0 { half } else { 0 },
        if octant & 2 != 0 { half } else { 0 },
        if octant & 4 != 0 { half } else { 0 },
    )
}

/// One step of an octant descent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OctantStep {
    /// Octant chosen at this level
    pub octant: u8,
    /// Side length of the cube the octant was chosen in
    pub scale: u32,
}

/// Iterator over the octants visited when descending from a cube of side
/// `size` down to the 2x2x2 cell that holds `coord`.
///
/// Yields `log2(size)` steps; the last one has `scale == 2`.
#[derive(Clone, Debug)]
pub struct OctantPath {
    local: UVec3,
    scale: u32,
}

impl OctantPath {
    /// `size` must be a power of two >= 2 and `coord` must lie in `[0, size)`
    pub fn new(coord: UVec3, size: u32) -> Self {
        debug_assert!(size.is_power_of_two() && size >= 2);
        debug_assert!(coord.max_element() < size);
        Self { local: coord, scale: size }
    }
}

impl Iterator for OctantPath {
    type Item = OctantStep;

    fn next(&mut self) -> Option<OctantStep> {
        if self.scale < 2 {
            return None;
        }
        let scale = self.scale;
        let octant = octant_of(self.local, scale);
        self.local -= octant_offset(octant, scale / 2);
        self.scale /= 2;
        Some(OctantStep { octant, scale })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.scale.max(1).trailing_zeros() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for OctantPath {}
