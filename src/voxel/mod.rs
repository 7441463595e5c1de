//! Sparse voxel storage
//!
//! Filled voxels kept sorted by Morton index, plus the unordered batch used
//! to stage bulk edits before they are merged.

pub mod voxel_data;
pub mod voxel_operations;

pub use voxel_data::{Voxel, VoxelBatch, VoxelColor, VoxelGrid};
