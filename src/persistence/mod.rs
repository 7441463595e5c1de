//! Persistence Module - chunk storage collaborator
//!
//! The codec only exchanges plain buffers with storage. `ChunkStorage` is the
//! seam the LOD reducer reloads through; `DiskChunkStorage` keeps a JSON
//! header and a binary blob per chunk.

pub mod blob_operations;
pub mod disk_storage;

pub use disk_storage::DiskChunkStorage;

use crate::chunk::ChunkData;

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Chunk {chunk_id} not found in storage")]
    MissingChunk { chunk_id: u32 },
    #[error("IO error for {path}: {error}")]
    IoError { path: String, error: String },
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Corrupted data: {0}")]
    CorruptedData(String),
}

/// Where chunks are saved to and reloaded from
pub trait ChunkStorage: Send + Sync {
    fn save_chunk(&self, chunk: &ChunkData) -> PersistenceResult<()>;

    /// Load a chunk's buffers; an unknown id is `MissingChunk`
    fn load_chunk(&self, chunk_id: u32) -> PersistenceResult<ChunkData>;

    fn contains_chunk(&self, chunk_id: u32) -> bool;
}
