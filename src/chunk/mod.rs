//! Chunks: baked octree buffers with their LOD state
//!
//! A chunk owns its geometry, type data and pending edit queue. Baking turns
//! the queue into buffers; the LOD reducer truncates those buffers in place
//! or reloads them from a `ChunkStorage`.

pub mod chunk_data;
pub mod chunk_operations;
pub mod lod_operations;

pub use chunk_data::{ChunkData, ChunkHeader, LodTransition};

use crate::morton::MortonError;
use crate::octree::OctreeError;
use crate::persistence::PersistenceError;

pub type ChunkResult<T> = Result<T, ChunkError>;
pub type LodResult<T> = Result<T, LodError>;

#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("Chunk {chunk_id} is at LOD {lod}; edits can only be baked at full resolution")]
    NotFullResolution { chunk_id: u32, lod: u32 },

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Morton(#[from] MortonError),

    #[error(transparent)]
    Octree(#[from] OctreeError),
}

#[derive(Debug, thiserror::Error)]
pub enum LodError {
    #[error("Target LOD {target} out of range (max {max})")]
    LodOutOfRange { target: u32, max: u32 },

    #[error("Malformed octree: node {position} has no children to descend into")]
    MalformedOctree { position: usize },

    #[error("Chunk {chunk_id} has no persisted data to reload")]
    MissingPersistedChunk { chunk_id: u32 },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
