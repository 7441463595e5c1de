// SVO Codec - Data-Oriented Programming (DOP) Architecture
//
// Converts sparse colored voxels into a linear sparse voxel octree the GPU can
// walk directly, plus the side table of per-voxel colors and normals.
// - *_data modules hold plain data
// - *_operations modules hold the pure functions that transform it
//
// Pipeline:
//   points -> voxel::VoxelGrid (sorted by Morton index)
//          -> octree::create_octree      (geometry buffer)
//          -> octree::create_voxel_type_data (type data buffer)
//   chunk::lod_operations trims both buffers to a coarser level of detail and
//   reloads them through persistence::ChunkStorage when detail is needed again.

// Constants module
pub mod constants;

pub mod config;
pub mod error;
pub mod morton;

// Core codec
pub mod chunk;
pub mod octree;
pub mod persistence;
pub mod voxel;

pub use chunk::chunk_operations::{
    bake_chunk_queue, bake_chunks, create_chunk, create_chunk_header, queue_voxel,
};
pub use chunk::lod_operations::update_lod;
pub use chunk::{ChunkData, ChunkError, ChunkHeader, LodError, LodTransition};
pub use config::{CodecConfig, ConfigError};
pub use error::{CodecError, CodecResult, ErrorContext};
pub use morton::{morton_decode, morton_encode, MortonError};
pub use octree::octree_operations::create_octree;
pub use octree::type_data_operations::create_voxel_type_data;
pub use octree::{OctreeError, OctreeNode};
pub use persistence::{ChunkStorage, DiskChunkStorage, PersistenceError};
pub use voxel::{Voxel, VoxelBatch, VoxelColor, VoxelGrid};
