//! LOD Operations - Pure DOP Functions
//!
//! Moves a chunk between levels of detail. Coarsening is done in memory by
//! cutting the finest levels off the octree and folding the type data onto
//! the coarser grid. Truncation is lossy, so going back to a finer LOD
//! reloads the chunk from storage.

use super::chunk_data::{ChunkData, LodTransition};
use super::chunk_operations::chunk_bit_depth;
use super::{LodError, LodResult};
use crate::constants::type_data_layout::WORDS_PER_VOXEL;
use crate::octree::OctreeNode;
use crate::persistence::{ChunkStorage, PersistenceError};

/// Buffer position of the first child of the node at `position`
fn first_child(octree: &[u32], position: usize) -> LodResult<usize> {
    let node = octree
        .get(position)
        .map(|&word| OctreeNode(word))
        .ok_or(LodError::MalformedOctree { position })?;
    if node.is_leaf() || node.valid_mask() == 0 || node.child_offset() == 0 {
        return Err(LodError::MalformedOctree { position });
    }
    Ok(position + node.child_offset() as usize)
}

/// Keep the top `levels_kept` levels of a root-first octree
///
/// The first node of every level is reached by following first children from
/// the root, so the cut is where that walk lands after `levels_kept` steps.
/// Nodes of the new last level keep their masks and become leaves.
pub fn truncate_octree(octree: &mut Vec<u32>, levels_kept: u32) -> LodResult<()> {
    if levels_kept == 0 {
        return Err(LodError::LodOutOfRange {
            target: levels_kept,
            max: 0,
        });
    }

    let mut position = 0;
    let mut last_level_start = 0;
    for level in 0..levels_kept {
        if level + 1 == levels_kept {
            last_level_start = position;
        }
        position = first_child(octree, position)?;
    }
    if position > octree.len() {
        return Err(LodError::MalformedOctree { position });
    }

    octree.truncate(position);
    for word in &mut octree[last_level_start..] {
        *word = OctreeNode(*word).into_leaf().0;
    }
    Ok(())
}

/// Fold type data `steps` levels coarser
///
/// Indices shift right by three bits per level. Entries that land on the same
/// coarse cell collapse onto the first of them.
pub fn downsample_type_data(type_data: &mut Vec<u32>, steps: u32) {
    if steps == 0 {
        return;
    }
    let shift = 3 * steps;
    let mut folded = Vec::with_capacity(type_data.len());
    let mut last_index = None;

    for triple in type_data.chunks_exact(WORDS_PER_VOXEL) {
        let index = triple[0] >> shift;
        if last_index == Some(index) {
            continue;
        }
        last_index = Some(index);
        folded.extend_from_slice(&[index, triple[1], triple[2]]);
    }
    *type_data = folded;
}

/// Reduce a chunk in memory to the coarser `target_lod`
pub fn downsample_chunk(chunk: &mut ChunkData, target_lod: u32) -> LodResult<()> {
    let depth = chunk_bit_depth(&chunk.header);
    if target_lod >= depth {
        return Err(LodError::LodOutOfRange {
            target: target_lod,
            max: depth.saturating_sub(1),
        });
    }
    if target_lod <= chunk.lod {
        return Ok(());
    }

    if chunk.geometry_data.is_empty() {
        log::warn!(
            "[lod_operations::downsample_chunk] Chunk {} has no geometry; setting LOD {} without truncating",
            chunk.header.chunk_id,
            target_lod
        );
        chunk.lod = target_lod;
        return Ok(());
    }

    let nodes_before = chunk.geometry_data.len();
    truncate_octree(&mut chunk.geometry_data, depth - target_lod)?;
    downsample_type_data(&mut chunk.voxel_type_data, target_lod - chunk.lod);

    log::debug!(
        "[lod_operations::downsample_chunk] Chunk {}: LOD {} -> {}, {} -> {} nodes",
        chunk.header.chunk_id,
        chunk.lod,
        target_lod,
        nodes_before,
        chunk.geometry_data.len()
    );
    chunk.lod = target_lod;
    Ok(())
}

/// Replace a chunk's buffers with its persisted copy
///
/// The header and pending edits of the in-memory chunk are kept.
fn reload_chunk(chunk: &mut ChunkData, storage: &dyn ChunkStorage) -> LodResult<()> {
    let chunk_id = chunk.header.chunk_id;
    match storage.load_chunk(chunk_id) {
        Ok(persisted) => {
            if persisted.header.resolution != chunk.header.resolution {
                return Err(PersistenceError::CorruptedData(format!(
                    "chunk {} persisted at resolution {}, expected {}",
                    chunk_id, persisted.header.resolution, chunk.header.resolution
                ))
                .into());
            }
            chunk.geometry_data = persisted.geometry_data;
            chunk.voxel_type_data = persisted.voxel_type_data;
            chunk.lod = persisted.lod;
            Ok(())
        }
        Err(PersistenceError::MissingChunk { .. }) => {
            log::warn!(
                "[lod_operations::reload_chunk] Chunk {} is not persisted; clearing buffers",
                chunk_id
            );
            chunk.geometry_data.clear();
            chunk.voxel_type_data.clear();
            chunk.lod = 0;
            Err(LodError::MissingPersistedChunk { chunk_id })
        }
        Err(e) => Err(e.into()),
    }
}

/// Move a chunk to `target_lod`
///
/// A coarser target is reached in memory. A finer target, or `force_reload`,
/// reloads the chunk from `storage` first and then coarsens if needed.
pub fn update_lod(
    chunk: &mut ChunkData,
    target_lod: u32,
    force_reload: bool,
    storage: &dyn ChunkStorage,
) -> LodResult<LodTransition> {
    let depth = chunk_bit_depth(&chunk.header);
    if target_lod >= depth {
        return Err(LodError::LodOutOfRange {
            target: target_lod,
            max: depth.saturating_sub(1),
        });
    }

    if target_lod == chunk.lod && !force_reload {
        return Ok(LodTransition::Unchanged);
    }

    if force_reload || target_lod < chunk.lod {
        reload_chunk(chunk, storage)?;
        if chunk.lod > target_lod {
            log::warn!(
                "[lod_operations::update_lod] Chunk {} was persisted at LOD {}, finer than requested LOD {} is unavailable",
                chunk.header.chunk_id,
                chunk.lod,
                target_lod
            );
        }
        downsample_chunk(chunk, target_lod)?;
        log::info!(
            "[lod_operations::update_lod] Chunk {} reloaded at LOD {}",
            chunk.header.chunk_id,
            chunk.lod
        );
        return Ok(LodTransition::Reloaded { lod: chunk.lod });
    }

    let from = chunk.lod;
    downsample_chunk(chunk, target_lod)?;
    log::info!(
        "[lod_operations::update_lod] Chunk {} downsampled from LOD {} to {}",
        chunk.header.chunk_id,
        from,
        target_lod
    );
    Ok(LodTransition::Downsampled {
        from,
        to: target_lod,
    })
}
