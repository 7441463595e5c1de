//! Bit-layout contracts shared by the codec and its consumers
//!
//! The renderer interprets the octree and voxel type data buffers verbatim,
//! so every field offset lives here and nowhere else.

/// Octree node word layout
///
/// - Bit 0: leaf flag
/// - Bits 1-8: child valid mask (octant `r` at bit `8 - r`)
/// - Bits 9-31: relative pointer to the first child
pub mod node_layout {
    pub const LEAF_FLAG: u32 = 1;
    pub const VALID_MASK_SHIFT: u32 = 1;
    pub const VALID_MASK_BITS: u32 = 0xFF << VALID_MASK_SHIFT;
    /// Bit index of octant 0 inside the node word
    pub const OCTANT_ZERO_BIT: u32 = 8;
    pub const POINTER_SHIFT: u32 = 9;
    pub const POINTER_WIDTH: u32 = 23;
    /// Exclusive upper bound of a relative child pointer
    pub const MAX_POINTER: u32 = 1 << POINTER_WIDTH;
    pub const POINTER_BITS: u32 = !((1 << POINTER_SHIFT) - 1);
}

/// Voxel type data layout (three `u32` words per leaf voxel)
pub mod type_data_layout {
    pub const WORDS_PER_VOXEL: usize = 3;

    pub const COLOR_RED_SHIFT: u32 = 20;
    pub const COLOR_GREEN_SHIFT: u32 = 10;
    pub const COLOR_BLUE_SHIFT: u32 = 0;
    pub const COLOR_CHANNEL_MASK: u32 = 0x3FF;
    /// 8-bit channels are widened into 10-bit fields by this factor
    pub const COLOR_CHANNEL_SCALE: u32 = 4;

    pub const NORMAL_X_SHIFT: u32 = 20;
    pub const NORMAL_Y_SHIFT: u32 = 10;
    pub const NORMAL_Z_SHIFT: u32 = 0;
    /// Sign bit sits directly above each 9-bit magnitude
    pub const NORMAL_SIGN_BIT: u32 = 1 << 9;
    pub const NORMAL_MAGNITUDE_MASK: u32 = 0x1FF;
    pub const NORMAL_MAGNITUDE_MAX: f32 = 511.0;
}

/// Morton codec limits
pub mod morton_limits {
    /// Widest per-axis depth that fits a 64-bit index
    pub const MAX_BIT_DEPTH_U64: u32 = 21;
    /// Widest per-axis depth that fits a 32-bit index
    pub const MAX_BIT_DEPTH_U32: u32 = 10;
}

pub mod defaults {
    pub const RESOLUTION: u32 = 128;
    pub const VOXEL_SCALE: f32 = 1.0;
    pub const CHUNK_SCALE: f32 = 1.0;
    pub const STORAGE_ROOT: &str = "chunks";
}
