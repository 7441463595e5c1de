//! Chunk Operations - Pure DOP Functions
//!
//! Creating chunks, queueing edits and baking the queue into the octree and
//! type data buffers.

use super::chunk_data::{ChunkData, ChunkHeader};
use super::{ChunkError, ChunkResult};
use crate::config::CodecConfig;
use crate::constants::morton_limits::MAX_BIT_DEPTH_U32;
use crate::morton::encode_u32;
use crate::octree::octree_operations::create_octree;
use crate::octree::type_data_operations::{create_voxel_type_data, voxels_from_type_data};
use crate::voxel::voxel_operations::{create_batch, merge_batch, push};
use crate::voxel::{VoxelBatch, VoxelColor, VoxelGrid};
use glam::UVec3;
use rayon::prelude::*;

/// Header for the chunk at `position`; its id is the Morton-packed position
pub fn create_chunk_header(position: UVec3, config: &CodecConfig) -> ChunkResult<ChunkHeader> {
    config.validate()?;
    let chunk_id = encode_u32(position, MAX_BIT_DEPTH_U32)?;
    Ok(ChunkHeader {
        chunk_id,
        position,
        scale: config.chunk_scale,
        resolution: config.resolution,
        voxel_scale: config.voxel_scale,
    })
}

/// New chunk with empty buffers at full resolution
pub fn create_chunk(header: ChunkHeader) -> ChunkData {
    let bit_depth = chunk_bit_depth(&header);
    ChunkData {
        header,
        geometry_data: Vec::new(),
        voxel_type_data: Vec::new(),
        lod: 0,
        chunk_queue: create_batch(bit_depth),
    }
}

/// Full-resolution bits per axis
pub fn chunk_bit_depth(header: &ChunkHeader) -> u32 {
    header.resolution.trailing_zeros()
}

/// Bits per axis of the buffers at the chunk's current LOD
pub fn current_bit_depth(chunk: &ChunkData) -> u32 {
    chunk_bit_depth(&chunk.header).saturating_sub(chunk.lod)
}

pub fn queue_voxel(chunk: &mut ChunkData, coord: UVec3, color: VoxelColor) -> ChunkResult<()> {
    push(&mut chunk.chunk_queue, coord, color)?;
    Ok(())
}

pub fn queue_batch(chunk: &mut ChunkData, batch: VoxelBatch) {
    debug_assert_eq!(chunk.chunk_queue.bit_depth, batch.bit_depth);
    chunk.chunk_queue.voxels.extend(batch.voxels);
}

pub fn has_pending_edits(chunk: &ChunkData) -> bool {
    !chunk.chunk_queue.voxels.is_empty()
}

/// Voxels currently baked into the chunk, decoded from its type data
pub fn baked_voxels(chunk: &ChunkData) -> VoxelGrid {
    voxels_from_type_data(&chunk.voxel_type_data, current_bit_depth(chunk))
}

/// Bake queued edits into the chunk's buffers
///
/// Queued voxels are merged over the voxels already baked (first queued edit
/// per cell wins) and both buffers are rebuilt. The queue is cleared only if
/// the rebuild succeeds.
pub fn bake_chunk_queue(chunk: &mut ChunkData) -> ChunkResult<()> {
    if chunk.lod != 0 {
        return Err(ChunkError::NotFullResolution {
            chunk_id: chunk.header.chunk_id,
            lod: chunk.lod,
        });
    }
    if !has_pending_edits(chunk) {
        return Ok(());
    }

    let mut grid = baked_voxels(chunk);
    let queued = chunk.chunk_queue.voxels.len();
    merge_batch(&mut grid, chunk.chunk_queue.clone());

    let geometry_data = create_octree(&grid)?;
    let voxel_type_data = create_voxel_type_data(&grid)?;

    chunk.geometry_data = geometry_data;
    chunk.voxel_type_data = voxel_type_data;
    chunk.chunk_queue.voxels.clear();

    log::debug!(
        "[chunk_operations::bake_chunk_queue] Chunk {}: baked {} queued edits, {} voxels, {} nodes",
        chunk.header.chunk_id,
        queued,
        grid.voxels.len(),
        chunk.geometry_data.len()
    );
    Ok(())
}

/// Bake many chunks in parallel, one thread per chunk at a time
pub fn bake_chunks(chunks: &mut [ChunkData]) -> Vec<ChunkResult<()>> {
    chunks.par_iter_mut().map(bake_chunk_queue).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morton::morton_encode;
    use crate::octree::octree_operations::{collect_voxel_indices, contains_voxel};

    const RED: VoxelColor = VoxelColor::new(255, 0, 0);
    const BLUE: VoxelColor = VoxelColor::new(0, 0, 255);

    fn create_test_chunk(resolution: u32) -> ChunkData {
        let config = CodecConfig {
            resolution,
            ..Default::default()
        };
        let header = create_chunk_header(UVec3::new(1, 2, 3), &config).expect("valid header");
        create_chunk(header)
    }

    #[test]
    fn test_header_from_config() {
        let config = CodecConfig {
            resolution: 256,
            voxel_scale: 0.5,
            ..Default::default()
        };
        let header = create_chunk_header(UVec3::new(1, 0, 0), &config).expect("valid header");

        assert_eq!(header.chunk_id, 2);
        assert_eq!(header.resolution, 256);
        assert_eq!(header.voxel_scale, 0.5);
        assert_eq!(chunk_bit_depth(&header), 8);
    }

    #[test]
    fn test_header_rejects_far_position() {
        let result = create_chunk_header(UVec3::new(1024, 0, 0), &CodecConfig::default());
        assert!(matches!(result, Err(ChunkError::Morton(_))));
    }

    #[test]
    fn test_header_rejects_unbakeable_resolution() {
        let config = CodecConfig {
            resolution: 2048,
            ..Default::default()
        };
        let result = create_chunk_header(UVec3::ZERO, &config);
        assert!(matches!(result, Err(ChunkError::Config(_))));
    }

    #[test]
    fn test_new_chunk_is_empty() {
        let chunk = create_test_chunk(64);
        assert!(chunk.geometry_data.is_empty());
        assert!(chunk.voxel_type_data.is_empty());
        assert_eq!(chunk.lod, 0);
        assert_eq!(chunk.chunk_queue.bit_depth, 6);
    }

    #[test]
    fn test_bake_builds_buffers_and_clears_queue() {
        let mut chunk = create_test_chunk(8);
        queue_voxel(&mut chunk, UVec3::new(0, 0, 0), RED).expect("in range");
        queue_voxel(&mut chunk, UVec3::new(7, 7, 7), RED).expect("in range");
        assert!(has_pending_edits(&chunk));

        bake_chunk_queue(&mut chunk).expect("bake");

        assert!(!has_pending_edits(&chunk));
        assert_eq!(chunk.geometry_data.len(), 5);
        assert_eq!(chunk.voxel_type_data.len(), 6);
        assert_eq!(collect_voxel_indices(&chunk.geometry_data), vec![0, 511]);
    }

    #[test]
    fn test_bake_is_incremental() {
        let mut chunk = create_test_chunk(16);
        queue_voxel(&mut chunk, UVec3::new(1, 1, 1), RED).expect("in range");
        bake_chunk_queue(&mut chunk).expect("bake");

        queue_voxel(&mut chunk, UVec3::new(9, 2, 14), BLUE).expect("in range");
        queue_voxel(&mut chunk, UVec3::new(1, 1, 1), BLUE).expect("in range");
        bake_chunk_queue(&mut chunk).expect("bake");

        let grid = baked_voxels(&chunk);
        assert_eq!(grid.voxels.len(), 2);
        assert!(grid.voxels.iter().all(|v| v.color == BLUE));
        for voxel in &grid.voxels {
            assert!(contains_voxel(&chunk.geometry_data, voxel.index, 4));
        }
    }

    #[test]
    fn test_bake_duplicate_edits_first_wins() {
        let mut chunk = create_test_chunk(16);
        queue_voxel(&mut chunk, UVec3::new(4, 4, 4), RED).expect("in range");
        queue_voxel(&mut chunk, UVec3::new(4, 4, 4), BLUE).expect("in range");
        bake_chunk_queue(&mut chunk).expect("bake");

        let grid = baked_voxels(&chunk);
        assert_eq!(grid.voxels.len(), 1);
        assert_eq!(grid.voxels[0].color, RED);
    }

    #[test]
    fn test_bake_empty_queue_is_noop() {
        let mut chunk = create_test_chunk(16);
        bake_chunk_queue(&mut chunk).expect("bake");
        assert!(chunk.geometry_data.is_empty());
    }

    #[test]
    fn test_bake_rejected_below_full_resolution() {
        let mut chunk = create_test_chunk(16);
        chunk.lod = 1;
        queue_voxel(&mut chunk, UVec3::new(4, 4, 4), RED).expect("in range");
        assert!(matches!(
            bake_chunk_queue(&mut chunk),
            Err(ChunkError::NotFullResolution { lod: 1, .. })
        ));
        assert!(has_pending_edits(&chunk));
    }

    #[test]
    fn test_queue_batch() {
        let mut chunk = create_test_chunk(32);
        let mut batch = create_batch(5);
        push(&mut batch, UVec3::new(31, 0, 31), RED).expect("in range");
        push(&mut batch, UVec3::new(0, 31, 0), RED).expect("in range");
        queue_batch(&mut chunk, batch);
        bake_chunk_queue(&mut chunk).expect("bake");

        let index = morton_encode(UVec3::new(31, 0, 31), 5).expect("in range");
        assert!(contains_voxel(&chunk.geometry_data, index, 5));
    }

    #[test]
    fn test_bake_chunks_in_parallel() {
        let mut chunks: Vec<ChunkData> = (0..8u32)
            .map(|i| {
                let mut chunk = create_test_chunk(32);
                for j in 0..=i {
                    queue_voxel(&mut chunk, UVec3::new(j, j * 2, 31 - j), RED).expect("in range");
                }
                chunk
            })
            .collect();

        let results = bake_chunks(&mut chunks);
        assert!(results.iter().all(|result| result.is_ok()));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.voxel_type_data.len(), 3 * (i + 1));
        }
    }
}
