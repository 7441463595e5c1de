//! Chunk Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in chunk_operations.rs and lod_operations.rs

use crate::voxel::VoxelBatch;
use glam::UVec3;
use serde::{Deserialize, Serialize};

/// Metadata persisted alongside a chunk's buffers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkHeader {
    /// Morton-packed chunk position
    pub chunk_id: u32,
    /// Position in chunk grid coordinates
    pub position: UVec3,
    /// World size of the chunk
    pub scale: f32,
    /// Cells per axis at LOD 0
    pub resolution: u32,
    /// World size of one full-resolution voxel
    pub voxel_scale: f32,
}

/// A chunk and the buffers it owns exclusively
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkData {
    pub header: ChunkHeader,
    /// Linear octree handed to the renderer
    pub geometry_data: Vec<u32>,
    /// `[index, color, normal]` triples handed to the renderer
    pub voxel_type_data: Vec<u32>,
    /// Number of finest levels truncated; 0 is full resolution
    pub lod: u32,
    /// Edits not yet baked into the buffers
    pub chunk_queue: VoxelBatch,
}

/// Outcome of an LOD update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LodTransition {
    /// Already at the requested LOD
    Unchanged,
    /// Buffers truncated in memory
    Downsampled { from: u32, to: u32 },
    /// Buffers reloaded from storage, then reduced to `lod` if needed
    Reloaded { lod: u32 },
}
