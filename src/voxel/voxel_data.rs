//! Sparse Voxel Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in voxel_operations.rs

use serde::{Deserialize, Serialize};

/// 8-bit RGB voxel color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VoxelColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl VoxelColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A filled cell. Empty cells are never materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voxel {
    /// Morton index of the cell
    pub index: u64,
    pub color: VoxelColor,
}

/// Sorted sparse voxel store
///
/// `voxels` is strictly ascending by Morton index once any operation in
/// voxel_operations.rs returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoxelGrid {
    /// Bits per axis; the grid spans `2^bit_depth` cells per axis
    pub bit_depth: u32,
    pub voxels: Vec<Voxel>,
}

/// Unordered staging buffer for bulk edits
///
/// May hold several entries for one cell until it is merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoxelBatch {
    pub bit_depth: u32,
    pub voxels: Vec<Voxel>,
}
