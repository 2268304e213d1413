//! Slab-based sparse voxel octree built by incremental insertion

use glam::UVec3;

use super::node::{
    EMPTY_SLAB, OctreeNode, OctreeSlot, SLAB_BYTES, SLOT_BYTES, Slab, read_slot_words,
};
use crate::core::{Error, Result};
use crate::math::OctantPath;
use crate::voxel::palette::Palette;
use crate::voxel::volume::VoxelVolume;
use crate::voxel::voxel::VoxelItem;

/// Slab that holds the root node (slot 0)
pub const ROOT_SLAB: u32 = 0;
/// Slab that holds the root's children
pub const ROOT_CHILDREN_SLAB: u32 = 1;

/// Side of the bounding cube for the given dimensions: the smallest power of
/// two >= the largest dimension, and never below 2.
pub fn cube_size_for(size_x: u32, size_y: u32, size_z: u32) -> u32 {
    size_x.max(size_y).max(size_z).next_power_of_two().max(2)
}

/// Number of tree layers for a power-of-two cube: `log2(size) + 1`
pub fn layer_count_for(size: u32) -> u32 {
    debug_assert!(size.is_power_of_two());
    size.trailing_zeros() + 1
}

/// Sparse voxel octree stored as a flat sequence of 8-slot slabs
///
/// The root is slab 0, slot 0, and its children live in slab 1. Every other
/// slab is appended lazily the first time a path needs it, so empty octants
/// cost only their occupancy bit. Leaves sit one level above unit voxels:
/// the node whose cube has side 2 stores items directly in its children slab.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseOctree {
    slabs: Vec<Slab>,
    /// Side of the bounding cube (power of two)
    size: u32,
    /// `log2(size) + 1`
    layer_count: u32,
    /// Number of leaf slots written
    leaf_count: usize,
}

impl SparseOctree {
    /// Create an empty octree bounding the given dimensions
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Result<Self> {
        if size_x == 0 || size_y == 0 || size_z == 0 {
            return Err(Error::InvalidDimension {
                x: size_x as i64,
                y: size_y as i64,
                z: size_z as i64,
            });
        }
        let size = cube_size_for(size_x, size_y, size_z);
        Ok(Self {
            slabs: Vec::new(),
            size,
            layer_count: layer_count_for(size),
            leaf_count: 0,
        })
    }

    /// Build an octree from every non-empty voxel of `volume`
    pub fn from_volume(volume: &VoxelVolume, palette: &Palette) -> Self {
        let [x, y, z] = volume.size();
        let size = cube_size_for(x, y, z);
        let mut octree = Self {
            slabs: Vec::new(),
            size,
            layer_count: layer_count_for(size),
            leaf_count: 0,
        };
        octree.insert_volume(volume, palette);
        octree
    }

    /// Discard the current contents and rebuild from `volume`
    pub fn init(&mut self, volume: &VoxelVolume, palette: &Palette) {
        *self = Self::from_volume(volume, palette);
    }

    fn insert_volume(&mut self, volume: &VoxelVolume, palette: &Palette) {
        for (coord, material) in volume.iter_filled() {
            self.insert_unchecked(coord, VoxelItem::from_material(material, palette));
        }
        log::info!(
            "octree built: size {} ({} layers), {} slabs, {} leaves, {} bytes",
            self.size,
            self.layer_count,
            self.slabs.len(),
            self.leaf_count,
            self.byte_len()
        );
    }

    /// Check if a coordinate lies inside the bounding cube
    pub fn contains(&self, x: u32, y: u32, z: u32) -> bool {
        x < self.size && y < self.size && z < self.size
    }

    /// Insert an item at an integer coordinate
    ///
    /// # Panics
    /// Panics if the coordinate is outside `[0, size)`. Use
    /// [`Self::try_insert_item`] for a checked insert.
    pub fn insert_item(&mut self, x: u32, y: u32, z: u32, item: VoxelItem) {
        assert!(
            self.contains(x, y, z),
            "octree insert ({x}, {y}, {z}) outside cube of side {}",
            self.size
        );
        self.insert_unchecked(UVec3::new(x, y, z), item);
    }

    /// Checked insert
    pub fn try_insert_item(&mut self, x: u32, y: u32, z: u32, item: VoxelItem) -> Result<()> {
        if !self.contains(x, y, z) {
            return Err(Error::out_of_bounds(x, y, z, [self.size; 3]));
        }
        self.insert_unchecked(UVec3::new(x, y, z), item);
        Ok(())
    }

    fn allocate_slab(&mut self) -> u32 {
        let index = self.slabs.len() as u32;
        self.slabs.push(EMPTY_SLAB);
        index
    }

    fn insert_unchecked(&mut self, coord: UVec3, item: VoxelItem) {
        if self.slabs.is_empty() {
            self.allocate_slab();
            self.allocate_slab();
            self.slabs[ROOT_SLAB as usize][0] =
                OctreeSlot::Node(OctreeNode::with_children(ROOT_CHILDREN_SLAB));
        }

        let mut slab = ROOT_SLAB as usize;
        let mut slot = 0usize;

        for step in OctantPath::new(coord, self.size) {
            let octant = step.octant as usize;
            let children = {
                let node = self.slabs[slab][slot].node_mut();
                node.set_child_occupied(step.octant);
                node.children_index as usize
            };

            if step.scale == 2 {
                let leaf = &mut self.slabs[children][octant];
                if !matches!(leaf, OctreeSlot::Leaf(_)) {
                    self.leaf_count += 1;
                }
                *leaf = OctreeSlot::Leaf(item);
                return;
            }

            let allocated = self.slabs[children][octant]
                .as_node()
                .is_some_and(|n| n.has_children_slab());
            if !allocated {
                // Slabs are addressed by index, so growing the Vec is safe here
                let new_slab = self.allocate_slab();
                self.slabs[children][octant].node_mut().children_index = new_slab;
            }

            slab = children;
            slot = octant;
        }
    }

    /// Item stored at a coordinate, if any
    pub fn lookup(&self, x: u32, y: u32, z: u32) -> Option<VoxelItem> {
        if !self.contains(x, y, z) || self.slabs.is_empty() {
            return None;
        }
        let mut node = self.slabs[ROOT_SLAB as usize][0].as_node()?;
        for step in OctantPath::new(UVec3::new(x, y, z), self.size) {
            if !node.is_child_occupied(step.octant) {
                return None;
            }
            let child = &self.slabs.get(node.children_index as usize)?[step.octant as usize];
            if step.scale == 2 {
                return child.as_leaf().copied();
            }
            node = child.as_node()?;
        }
        None
    }

    /// Root node (absent until the first insert)
    pub fn root(&self) -> Option<&OctreeNode> {
        self.slabs.first().and_then(|s| s[0].as_node())
    }

    /// Slot at `(slab, octant)`
    pub fn slot(&self, slab: u32, octant: u8) -> Option<&OctreeSlot> {
        self.slabs.get(slab as usize).map(|s| &s[octant as usize])
    }

    /// All slabs (empty before the first insert)
    pub fn slabs(&self) -> &[Slab] {
        &self.slabs
    }

    /// Slabs, failing if nothing was inserted yet
    pub fn checked_slabs(&self) -> Result<&[Slab]> {
        if self.slabs.is_empty() {
            return Err(Error::EmptyStructureAccess("octree slabs"));
        }
        Ok(&self.slabs)
    }

    /// Number of slabs
    pub fn slab_count(&self) -> usize {
        self.slabs.len()
    }

    /// Side of the bounding cube
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Tree layer count, bounds the traversal kernel's descent
    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }

    /// Number of leaf items
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of interior node slots
    pub fn node_count(&self) -> usize {
        self.slabs
            .iter()
            .flat_map(|s| s.iter())
            .filter(|slot| matches!(slot, OctreeSlot::Node(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.slabs.is_empty()
    }

    /// Size of the flat buffer in bytes
    pub fn byte_len(&self) -> usize {
        self.slabs.len() * SLAB_BYTES
    }

    /// Encode the flat buffer: `slab_count * 8 * 16` bytes, little-endian
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for slab in &self.slabs {
            for slot in slab {
                slot.write_bytes(&mut out);
            }
        }
        out
    }

    /// Re-parse a flat buffer produced by [`Self::to_bytes`]
    ///
    /// Slot kinds are recovered by walking from the root: occupied octants
    /// of a side-2 node are leaves, every other occupied octant is a node.
    pub fn from_bytes(bytes: &[u8], size: u32) -> Result<Self> {
        if !size.is_power_of_two() || size < 2 {
            return Err(Error::MalformedBuffer(format!("cube size {size} is not a power of two >= 2")));
        }
        if bytes.len() % SLAB_BYTES != 0 {
            return Err(Error::MalformedBuffer(format!(
                "{} bytes is not a whole number of {}-byte slabs",
                bytes.len(),
                SLAB_BYTES
            )));
        }

        let mut octree = Self {
            slabs: Vec::new(),
            size,
            layer_count: layer_count_for(size),
            leaf_count: 0,
        };
        let slab_count = bytes.len() / SLAB_BYTES;
        if slab_count == 0 {
            return Ok(octree);
        }
        if slab_count < 2 {
            return Err(Error::MalformedBuffer("root slab without children slab".into()));
        }

        let words = |slab: usize, octant: usize| {
            let start = slab * SLAB_BYTES + octant * SLOT_BYTES;
            read_slot_words(&bytes[start..start + SLOT_BYTES])
        };
        let decode_node = |slab: usize, octant: usize| {
            OctreeNode::from_words(words(slab, octant)).ok_or_else(|| {
                Error::MalformedBuffer(format!("slab {slab} slot {octant}: occupancy exceeds 8 bits"))
            })
        };

        octree.slabs = vec![EMPTY_SLAB; slab_count];
        let root = decode_node(ROOT_SLAB as usize, 0)?;
        if root.children_index != ROOT_CHILDREN_SLAB {
            return Err(Error::MalformedBuffer(format!(
                "root children index {} (expected {})",
                root.children_index, ROOT_CHILDREN_SLAB
            )));
        }
        octree.slabs[0][0] = OctreeSlot::Node(root);

        let mut visited = vec![false; slab_count];
        visited[ROOT_SLAB as usize] = true;
        // (node, side of the node's cube)
        let mut stack = vec![(root, size)];

        while let Some((node, scale)) = stack.pop() {
            let children = node.children_index as usize;
            if children == 0 || children >= slab_count {
                return Err(Error::MalformedBuffer(format!("children index {children} out of range")));
            }
            if std::mem::replace(&mut visited[children], true) {
                return Err(Error::MalformedBuffer(format!("slab {children} referenced twice")));
            }

            for octant in 0..8u8 {
                if !node.is_child_occupied(octant) {
                    continue;
                }
                let o = octant as usize;
                if scale == 2 {
                    octree.slabs[children][o] = OctreeSlot::Leaf(VoxelItem::from_words(words(children, o)));
                    octree.leaf_count += 1;
                } else {
                    let child = decode_node(children, o)?;
                    octree.slabs[children][o] = OctreeSlot::Node(child);
                    stack.push((child, scale / 2));
                }
            }
        }

        if let Some(orphan) = visited.iter().position(|v| !v) {
            return Err(Error::MalformedBuffer(format!("slab {orphan} is unreachable")));
        }
        Ok(octree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    fn item(material: u32) -> VoxelItem {
        VoxelItem::new(material, [1.0, 1.0, 1.0])
    }

    #[test]
    fn test_cube_size() {
        assert_eq!(cube_size_for(8, 8, 8), 8);
        assert_eq!(cube_size_for(5, 17, 3), 32);
        assert_eq!(cube_size_for(1, 1, 1), 2);
        assert_eq!(layer_count_for(8), 4);
        assert_eq!(layer_count_for(2), 2);
    }

    #[test]
    fn test_new_empty() {
        let octree = SparseOctree::new(10, 4, 4).unwrap();
        assert_eq!(octree.size(), 16);
        assert_eq!(octree.layer_count(), 5);
        assert_eq!(octree.slab_count(), 0);
        assert!(octree.root().is_none());
        assert!(matches!(octree.checked_slabs(), Err(Error::EmptyStructureAccess(_))));
        assert!(matches!(SparseOctree::new(0, 1, 1), Err(Error::InvalidDimension { .. })));
    }

    #[test]
    fn test_init_replaces_contents() {
        let mut big = VoxelVolume::cube(16).unwrap();
        big.fill_sphere(IVec3::splat(8), 6.0, 1);
        let mut octree = SparseOctree::from_volume(&big, &Palette::new());
        assert_eq!(octree.size(), 16);
        assert!(octree.slab_count() > 4);

        let mut small = VoxelVolume::new(3, 2, 2).unwrap();
        small.set(2, 1, 0, 5);
        octree.init(&small, &Palette::new());

        assert_eq!(octree.size(), 4);
        assert_eq!(octree.layer_count(), 3);
        assert_eq!(octree.leaf_count(), 1);
        // Root slab, root children, one leaf slab
        assert_eq!(octree.slab_count(), 3);
        assert_eq!(octree.lookup(2, 1, 0).map(|l| l.material), Some(5));
        assert!(octree.lookup(1, 1, 1).is_none());
        assert_eq!(octree, SparseOctree::from_volume(&small, &Palette::new()));
    }

    #[test]
    fn test_single_corner_voxel() {
        let mut volume = VoxelVolume::cube(8).unwrap();
        volume.set(7, 7, 7, 9);
        let octree = SparseOctree::from_volume(&volume, &Palette::new());

        assert_eq!(octree.layer_count(), 4);
        assert_eq!(octree.size(), 8);
        // Root slab + one slab per branch level along the path
        assert_eq!(octree.slab_count(), 4);
        assert_eq!(octree.leaf_count(), 1);
        assert_eq!(octree.to_bytes().len(), 4 * 8 * 16);

        let leaf = octree.lookup(7, 7, 7).unwrap();
        assert_eq!(leaf.material, 9);
        assert_eq!(octree.slot(3, 7).and_then(|s| s.as_leaf()).map(|l| l.material), Some(9));
    }

    #[test]
    fn test_root_mask_origin() {
        let mut octree = SparseOctree::new(8, 8, 8).unwrap();
        octree.insert_item(0, 0, 0, item(1));
        let root = octree.root().unwrap();
        assert_eq!(root.occupancy_mask(), 0b0000_0001);
        assert_eq!(root.children_index, ROOT_CHILDREN_SLAB);
    }

    #[test]
    fn test_no_node_targets_root_slab() {
        let mut volume = VoxelVolume::cube(16).unwrap();
        volume.fill_random_seeded(3, 5, 11);
        let octree = SparseOctree::from_volume(&volume, &Palette::new());
        for slab in octree.slabs() {
            for slot in slab {
                if let Some(node) = slot.as_node() {
                    assert_ne!(node.children_index, ROOT_SLAB);
                }
            }
        }
    }

    #[test]
    fn test_every_voxel_reachable() {
        let mut volume = VoxelVolume::new(13, 9, 20).unwrap();
        volume.fill_sphere(IVec3::new(6, 4, 10), 5.0, 2);
        volume.fill_random_seeded(4, 30, 99);
        let octree = SparseOctree::from_volume(&volume, &Palette::new());

        assert_eq!(octree.size(), 32);
        assert_eq!(octree.leaf_count(), volume.filled_count());
        for (p, material) in volume.iter_filled() {
            assert_eq!(octree.lookup(p.x, p.y, p.z).map(|l| l.material), Some(material));
        }
        volume.region().for_each(|p| {
            let (x, y, z) = (p.x as u32, p.y as u32, p.z as u32);
            if volume.get(x, y, z) == 0 {
                assert!(octree.lookup(x, y, z).is_none());
            }
        });
    }

    /// Recursively checks bit b <=> a leaf is reachable through octant b
    fn subtree_has_leaf(octree: &SparseOctree, node: &OctreeNode, scale: u32) -> bool {
        let mut any = false;
        for octant in 0..8u8 {
            let child = octree.slot(node.children_index, octant).unwrap();
            let reachable = if scale == 2 {
                child.as_leaf().is_some()
            } else {
                child.as_node().is_some_and(|n| subtree_has_leaf(octree, n, scale / 2))
            };
            assert_eq!(node.is_child_occupied(octant), reachable);
            any |= reachable;
        }
        any
    }

    #[test]
    fn test_occupancy_invariant() {
        let mut volume = VoxelVolume::cube(32).unwrap();
        volume.fill_sphere(IVec3::new(8, 20, 12), 6.0, 1);
        volume.set(31, 0, 31, 5);
        let octree = SparseOctree::from_volume(&volume, &Palette::new());
        assert!(subtree_has_leaf(&octree, octree.root().unwrap(), octree.size()));
    }

    #[test]
    fn test_insertion_order_independent() {
        let points = [(1, 2, 3), (7, 0, 5), (4, 4, 4), (0, 7, 7), (1, 2, 2)];
        let mut forward = SparseOctree::new(8, 8, 8).unwrap();
        let mut backward = SparseOctree::new(8, 8, 8).unwrap();
        for (i, (x, y, z)) in points.iter().enumerate() {
            forward.insert_item(*x, *y, *z, item(i as u32 + 1));
        }
        for (i, (x, y, z)) in points.iter().enumerate().rev() {
            backward.insert_item(*x, *y, *z, item(i as u32 + 1));
        }
        assert_eq!(forward.slab_count(), backward.slab_count());
        for (x, y, z) in points {
            assert_eq!(forward.lookup(x, y, z), backward.lookup(x, y, z));
        }
        assert_eq!(forward.root(), backward.root());
    }

    #[test]
    fn test_reinsert_overwrites() {
        let mut octree = SparseOctree::new(4, 4, 4).unwrap();
        octree.insert_item(1, 1, 1, item(1));
        octree.insert_item(1, 1, 1, item(2));
        assert_eq!(octree.leaf_count(), 1);
        assert_eq!(octree.lookup(1, 1, 1).map(|l| l.material), Some(2));
    }

    #[test]
    fn test_sibling_leaves_share_slab() {
        let mut octree = SparseOctree::new(8, 8, 8).unwrap();
        octree.insert_item(0, 0, 0, item(1));
        let before = octree.slab_count();
        octree.insert_item(1, 1, 0, item(2));
        assert_eq!(octree.slab_count(), before);
    }

    #[test]
    fn test_size_two() {
        let mut octree = SparseOctree::new(1, 1, 1).unwrap();
        octree.insert_item(1, 0, 1, item(4));
        assert_eq!(octree.slab_count(), 2);
        assert_eq!(octree.layer_count(), 2);
        assert_eq!(octree.root().unwrap().occupancy_mask(), 1 << 5);
        assert_eq!(octree.lookup(1, 0, 1).map(|l| l.material), Some(4));
    }

    #[test]
    fn test_try_insert_out_of_bounds() {
        let mut octree = SparseOctree::new(6, 6, 6).unwrap();
        // Cube is 8, so 7 is inside, 8 is not
        assert!(octree.try_insert_item(7, 7, 7, item(1)).is_ok());
        assert!(matches!(
            octree.try_insert_item(8, 0, 0, item(1)),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    #[should_panic]
    fn test_insert_out_of_bounds_panics() {
        let mut octree = SparseOctree::new(4, 4, 4).unwrap();
        octree.insert_item(0, 4, 0, item(1));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let mut volume = VoxelVolume::new(20, 12, 7).unwrap();
        volume.fill_sphere(IVec3::new(10, 6, 3), 4.0, 3);
        volume.set(19, 11, 6, 8);
        let palette = Palette::from_colors(&[[0.1, 0.2, 0.3], [0.4, 0.5, 0.6], [0.7, 0.8, 0.9]]);
        let octree = SparseOctree::from_volume(&volume, &palette);

        let parsed = SparseOctree::from_bytes(&octree.to_bytes(), octree.size()).unwrap();
        assert_eq!(parsed, octree);
        assert_eq!(parsed.lookup(10, 6, 3).map(|l| l.color), Some([0.7, 0.8, 0.9]));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(SparseOctree::from_bytes(&[0u8; 100], 8).is_err());
        assert!(SparseOctree::from_bytes(&[0u8; SLAB_BYTES], 8).is_err());
        // Root children index must be 1
        assert!(SparseOctree::from_bytes(&[0u8; 2 * SLAB_BYTES], 8).is_err());
        assert!(SparseOctree::from_bytes(&[], 6).is_err());
        assert!(SparseOctree::from_bytes(&[], 8).unwrap().is_empty());
    }

    #[test]
    fn test_from_bytes_rejects_cycle() {
        let mut octree = SparseOctree::new(8, 8, 8).unwrap();
        octree.insert_item(0, 0, 0, item(1));
        let mut bytes = octree.to_bytes();
        // Point the level-1 node at slab 1 (its own slab) instead of slab 2
        let start = SLAB_BYTES;
        bytes[start..start + 4].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(
            SparseOctree::from_bytes(&bytes, 8),
            Err(Error::MalformedBuffer(_))
        ));
    }
}
