//! Sparse voxel octree codec
//!
//! Builds the linear, GPU-traversable octree and its voxel type data side
//! table from a sorted voxel grid.

pub mod octree_data;
pub mod octree_operations;
pub mod type_data_operations;

pub use octree_data::{octant_bit, LeafHit, OctreeNode, OctreeStats};

use crate::morton::MortonError;

pub type OctreeResult<T> = Result<T, OctreeError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OctreeError {
    #[error(
        "Capacity exceeded: node {position} needs child pointer {pointer} (max {max}); resolution or voxel count too large"
    )]
    CapacityExceeded { position: usize, pointer: u64, max: u32 },

    #[error("Invalid octree bit depth: {depth}")]
    InvalidBitDepth { depth: u32 },

    #[error(transparent)]
    Morton(#[from] MortonError),
}
