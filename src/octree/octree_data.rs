//! Linear Octree Data
//!
//! The octree travels as a flat `Vec<u32>`: root at index 0, one level after
//! another from coarsest to finest, siblings contiguous in octant order.
//! `OctreeNode` wraps a single word so the bit layout is decoded in one place.

use crate::constants::node_layout::{
    LEAF_FLAG, MAX_POINTER, OCTANT_ZERO_BIT, POINTER_BITS, POINTER_SHIFT, VALID_MASK_BITS,
    VALID_MASK_SHIFT,
};
use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

/// One packed octree node word
///
/// - Bit 0: leaf flag
/// - Bits 1-8: child valid mask, octant `r` at bit `8 - r`
/// - Bits 9-31: offset from this node to its first child
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct OctreeNode(pub u32);

const_assert_eq!(std::mem::size_of::<OctreeNode>(), 4);

/// Word bit marking `octant` as present; `octant` must be below 8
#[inline]
pub const fn octant_bit(octant: u32) -> u32 {
    debug_assert!(octant < 8, "octant out of range");
    1 << (OCTANT_ZERO_BIT - octant)
}

impl OctreeNode {
    pub const EMPTY: Self = Self(0);

    #[inline]
    pub const fn leaf() -> Self {
        Self(LEAF_FLAG)
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        self.0 & LEAF_FLAG != 0
    }

    /// Raw 8-bit mask; octant `r` is bit `7 - r`
    #[inline]
    pub fn valid_mask(self) -> u8 {
        ((self.0 & VALID_MASK_BITS) >> VALID_MASK_SHIFT) as u8
    }

    #[inline]
    pub fn has_child(self, octant: u32) -> bool {
        self.0 & octant_bit(octant) != 0
    }

    #[inline]
    pub fn child_count(self) -> u32 {
        (self.0 & VALID_MASK_BITS).count_ones()
    }

    /// Relative pointer to the first child (0 for leaves)
    #[inline]
    pub fn child_offset(self) -> u32 {
        self.0 >> POINTER_SHIFT
    }

    /// Number of present siblings stored before `octant`
    #[inline]
    pub fn child_slot(self, octant: u32) -> u32 {
        let preceding = VALID_MASK_BITS & !((octant_bit(octant) << 1) - 1);
        (self.0 & preceding).count_ones()
    }

    #[inline]
    pub fn with_octant(self, octant: u32) -> Self {
        Self(self.0 | octant_bit(octant))
    }

    #[inline]
    pub fn with_child_offset(self, offset: u32) -> Self {
        debug_assert!(offset < MAX_POINTER);
        Self((self.0 & !POINTER_BITS) | (offset << POINTER_SHIFT))
    }

    /// Same occupancy, pointer cleared, leaf flag set
    #[inline]
    pub fn into_leaf(self) -> Self {
        Self((self.0 & VALID_MASK_BITS) | LEAF_FLAG)
    }
}

/// Octree statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OctreeStats {
    pub total_nodes: usize,
    pub leaf_nodes: usize,
    /// Occupied cells below leaf nodes
    pub filled_cells: usize,
    pub memory_bytes: usize,
}

/// Result of locating a cell in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafHit {
    /// Buffer position of the leaf node
    pub position: usize,
    /// Octant of the cell inside that leaf
    pub octant: u32,
}
