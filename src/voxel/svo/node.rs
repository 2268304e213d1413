//! Sparse Voxel Octree slots and slabs
//!
//! Binary layout (little-endian, tightly packed, no padding between slabs):
//! - slot = 16 bytes = 4 x u32
//! - slab = 8 slots = 128 bytes, the full child set of one node
//!
//! An interior node slot is `{children_index, occupancy_mask, 0, 0}`.
//! A leaf slot is the [`VoxelItem`] payload. The kind of a slot is not
//! stored; it follows from its depth in the tree.

use crate::voxel::voxel::VoxelItem;

/// Bytes per slot
pub const SLOT_BYTES: usize = 16;
/// Slots per slab
pub const SLAB_SLOTS: usize = 8;
/// Bytes per slab
pub const SLAB_BYTES: usize = SLOT_BYTES * SLAB_SLOTS;

/// Interior octree node
///
/// `children_index == 0` means no children slab has been allocated yet;
/// slab 0 holds the root and is never a child target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OctreeNode {
    /// Index of the slab holding this node's 8 children
    pub children_index: u32,
    /// Bit i set = octant i has a non-empty subtree
    occupancy: u8,
}

impl OctreeNode {
    /// Node with no children
    pub const fn empty() -> Self {
        Self {
            children_index: 0,
            occupancy: 0,
        }
    }

    /// Node pointing at an allocated children slab
    pub const fn with_children(children_index: u32) -> Self {
        Self {
            children_index,
            occupancy: 0,
        }
    }

    /// Occupancy bitmask
    pub fn occupancy_mask(&self) -> u8 {
        self.occupancy
    }

    /// Check if octant is occupied
    pub fn is_child_occupied(&self, octant: u8) -> bool {
        debug_assert!(octant < 8);
        (self.occupancy >> octant) & 1 != 0
    }

    /// Mark octant as occupied
    pub fn set_child_occupied(&mut self, octant: u8) {
        debug_assert!(octant < 8);
        self.occupancy |= 1 << octant;
    }

    /// Number of occupied octants
    pub fn child_count(&self) -> u8 {
        self.occupancy.count_ones() as u8
    }

    /// Check if a children slab is allocated
    pub fn has_children_slab(&self) -> bool {
        self.children_index != 0
    }

    pub fn to_words(&self) -> [u32; 4] {
        [self.children_index, self.occupancy as u32, 0, 0]
    }

    /// Decode node words; the occupancy word must fit in 8 bits
    pub fn from_words(words: [u32; 4]) -> Option<Self> {
        if words[1] > 0xFF {
            return None;
        }
        Some(Self {
            children_index: words[0],
            occupancy: words[1] as u8,
        })
    }
}

/// One 16-byte slot of a slab
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum OctreeSlot {
    /// Never written (encodes as zeros)
    #[default]
    Empty,
    /// Interior node
    Node(OctreeNode),
    /// Leaf payload
    Leaf(VoxelItem),
}

impl OctreeSlot {
    pub fn is_empty(&self) -> bool {
        matches!(self, OctreeSlot::Empty)
    }

    pub fn as_node(&self) -> Option<&OctreeNode> {
        match self {
            OctreeSlot::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&VoxelItem> {
        match self {
            OctreeSlot::Leaf(item) => Some(item),
            _ => None,
        }
    }

    /// Node in this slot, turning an empty slot into a fresh node.
    ///
    /// Only called at interior depths, where a slot is never a leaf.
    pub(crate) fn node_mut(&mut self) -> &mut OctreeNode {
        debug_assert!(!matches!(self, OctreeSlot::Leaf(_)), "leaf slot at interior depth");
        if !matches!(self, OctreeSlot::Node(_)) {
            *self = OctreeSlot::Node(OctreeNode::empty());
        }
        match self {
            OctreeSlot::Node(node) => node,
            _ => unreachable!(),
        }
    }

    /// Encode as four words
    pub fn to_words(&self) -> [u32; 4] {
        match self {
            OctreeSlot::Empty => [0; 4],
            OctreeSlot::Node(node) => node.to_words(),
            OctreeSlot::Leaf(item) => item.to_words(),
        }
    }

    /// Append the 16-byte little-endian encoding to `out`
    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        for word in self.to_words() {
            out.extend_from_slice(&word.to_le_bytes());
        }
    }
}

/// The 8 child slots of one node
pub type Slab = [OctreeSlot; SLAB_SLOTS];

/// Slab with every slot empty
pub const EMPTY_SLAB: Slab = [OctreeSlot::Empty; SLAB_SLOTS];

/// Read the four little-endian words of a 16-byte slot
pub fn read_slot_words(bytes: &[u8]) -> [u32; 4] {
    debug_assert_eq!(bytes.len(), SLOT_BYTES);
    let mut words = [0u32; 4];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupancy() {
        let mut node = OctreeNode::empty();
        node.set_child_occupied(0);
        node.set_child_occupied(3);
        node.set_child_occupied(7);
        node.set_child_occupied(3);

        assert!(node.is_child_occupied(0));
        assert!(!node.is_child_occupied(1));
        assert!(node.is_child_occupied(7));
        assert_eq!(node.child_count(), 3);
        assert_eq!(node.occupancy_mask(), 0b1000_1001);
    }

    #[test]
    fn test_node_words() {
        let mut node = OctreeNode::with_children(42);
        node.set_child_occupied(5);
        assert_eq!(node.to_words(), [42, 0b10_0000, 0, 0]);
        assert_eq!(OctreeNode::from_words(node.to_words()), Some(node));
        assert_eq!(OctreeNode::from_words([1, 0x100, 0, 0]), None);
    }

    #[test]
    fn test_slot_bytes() {
        let mut out = Vec::new();
        OctreeSlot::Node(OctreeNode::with_children(1)).write_bytes(&mut out);
        OctreeSlot::Empty.write_bytes(&mut out);
        OctreeSlot::Leaf(VoxelItem::new(9, [1.0, 0.0, 0.0])).write_bytes(&mut out);

        assert_eq!(out.len(), 3 * SLOT_BYTES);
        assert_eq!(&out[0..4], &[1, 0, 0, 0]);
        assert!(out[16..32].iter().all(|b| *b == 0));
        assert_eq!(read_slot_words(&out[32..48])[0], 9);
        assert_eq!(read_slot_words(&out[32..48])[1], 1.0f32.to_bits());
    }

    #[test]
    fn test_node_mut_promotes_empty() {
        let mut slot = OctreeSlot::Empty;
        slot.node_mut().set_child_occupied(2);
        assert_eq!(slot.as_node().map(|n| n.occupancy_mask()), Some(0b100));
        assert!(slot.as_leaf().is_none());
    }
}
