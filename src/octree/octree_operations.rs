//! Octree Operations - Pure DOP Functions
//!
//! Bottom-up construction of the linear octree plus the read-side traversal
//! used to locate and enumerate cells.
//!
//! Construction groups Morton indices by `index / 8` one level at a time,
//! starting from the leaf-parent level, until a single root remains. Levels
//! are then written root first so every child pointer is a forward offset.

use super::octree_data::{LeafHit, OctreeNode, OctreeStats};
use super::{OctreeError, OctreeResult};
use crate::constants::morton_limits::MAX_BIT_DEPTH_U64;
use crate::constants::node_layout::MAX_POINTER;
use crate::morton::octant_at;
use crate::voxel::voxel_operations::is_strictly_sorted;
use crate::voxel::VoxelGrid;

/// One octree level: node words and the Morton key each node covers
struct Level {
    keys: Vec<u64>,
    nodes: Vec<u32>,
}

/// Group sorted child keys under their parents
fn build_level(child_keys: &[u64], leaf: bool) -> Level {
    let mut level = Level {
        keys: Vec::with_capacity(child_keys.len() / 2 + 1),
        nodes: Vec::with_capacity(child_keys.len() / 2 + 1),
    };
    let seed = if leaf { OctreeNode::leaf() } else { OctreeNode::EMPTY };

    for &key in child_keys {
        let parent = key >> 3;
        let octant = (key & 0b111) as u32;
        match (level.keys.last(), level.nodes.last_mut()) {
            (Some(&last), Some(node)) if last == parent => {
                *node = OctreeNode(*node).with_octant(octant).0;
            }
            _ => {
                level.keys.push(parent);
                level.nodes.push(seed.with_octant(octant).0);
            }
        }
    }
    level
}

/// Fill in relative child pointers over a root-first buffer
pub(crate) fn assign_child_pointers(octree: &mut [u32]) -> OctreeResult<()> {
    // Children emitted so far; the root occupies slot 0
    let mut next_child: u64 = 0;

    for position in 0..octree.len() {
        let node = OctreeNode(octree[position]);
        if node.is_leaf() || node.valid_mask() == 0 {
            continue;
        }

        let pointer = next_child + 1 - position as u64;
        if pointer >= MAX_POINTER as u64 {
            log::error!(
                "[octree_operations::assign_child_pointers] Node {} needs pointer {} which exceeds 23 bits",
                position,
                pointer
            );
            return Err(OctreeError::CapacityExceeded {
                position,
                pointer,
                max: MAX_POINTER - 1,
            });
        }

        octree[position] = node.with_child_offset(pointer as u32).0;
        next_child += node.child_count() as u64;
    }
    Ok(())
}

/// Build the linear octree for a sorted voxel grid
///
/// Produces exactly `bit_depth` levels. An empty grid yields an empty buffer.
pub fn create_octree(grid: &VoxelGrid) -> OctreeResult<Vec<u32>> {
    let depth = grid.bit_depth;
    if depth == 0 || depth > MAX_BIT_DEPTH_U64 {
        return Err(OctreeError::InvalidBitDepth { depth });
    }
    if grid.voxels.is_empty() {
        log::debug!("[octree_operations::create_octree] Empty grid, nothing to build");
        return Ok(Vec::new());
    }
    debug_assert!(is_strictly_sorted(grid), "voxel grid must be sorted and unique");

    let voxel_keys: Vec<u64> = grid.voxels.iter().map(|v| v.index).collect();
    let mut levels: Vec<Level> = Vec::with_capacity(depth as usize);
    levels.push(build_level(&voxel_keys, true));
    for _ in 1..depth {
        let next = match levels.last() {
            Some(previous) => build_level(&previous.keys, false),
            None => break,
        };
        levels.push(next);
    }

    let total_nodes: usize = levels.iter().map(|level| level.nodes.len()).sum();
    let mut octree = Vec::with_capacity(total_nodes);
    for level in levels.iter().rev() {
        octree.extend_from_slice(&level.nodes);
    }
    assign_child_pointers(&mut octree)?;

    log::debug!(
        "[octree_operations::create_octree] Built {} nodes over {} levels from {} voxels",
        octree.len(),
        depth,
        grid.voxels.len()
    );
    Ok(octree)
}

/// Buffer position of `octant`'s child under the node at `position`
#[inline]
pub fn child_position(node: OctreeNode, position: usize, octant: u32) -> usize {
    position + node.child_offset() as usize + node.child_slot(octant) as usize
}

/// Descend toward the cell `index` in a tree of `bit_depth` levels
///
/// Returns the leaf whose mask covers the cell, or `None` if the cell is
/// empty or the buffer is malformed.
pub fn find_leaf(octree: &[u32], index: u64, bit_depth: u32) -> Option<LeafHit> {
    let mut position = 0usize;
    for level in (0..bit_depth).rev() {
        let node = OctreeNode(*octree.get(position)?);
        let octant = octant_at(index, level);
        if !node.has_child(octant) {
            return None;
        }
        if node.is_leaf() {
            return Some(LeafHit { position, octant });
        }
        if node.child_offset() == 0 {
            return None;
        }
        position = child_position(node, position, octant);
    }
    None
}

/// True if the cell `index` is filled
pub fn contains_voxel(octree: &[u32], index: u64, bit_depth: u32) -> bool {
    find_leaf(octree, index, bit_depth).is_some()
}

/// Every filled cell's Morton index, ascending
pub fn collect_voxel_indices(octree: &[u32]) -> Vec<u64> {
    let mut indices = Vec::new();
    if octree.is_empty() {
        return indices;
    }

    // (position, key prefix of the node)
    let mut stack: Vec<(usize, u64)> = vec![(0, 0)];
    while let Some((position, prefix)) = stack.pop() {
        let Some(&word) = octree.get(position) else {
            log::warn!(
                "[octree_operations::collect_voxel_indices] Pointer to {} past end of buffer",
                position
            );
            continue;
        };
        let node = OctreeNode(word);

        if node.is_leaf() {
            indices.extend(
                (0..8u32)
                    .filter(|&octant| node.has_child(octant))
                    .map(|octant| (prefix << 3) | octant as u64),
            );
            continue;
        }
        if node.child_offset() == 0 {
            log::warn!(
                "[octree_operations::collect_voxel_indices] Interior node {} has no child pointer, skipping",
                position
            );
            continue;
        }
        // Reverse so the lowest octant pops first
        for octant in (0..8u32).rev() {
            if node.has_child(octant) {
                stack.push((
                    child_position(node, position, octant),
                    (prefix << 3) | octant as u64,
                ));
            }
        }
    }
    indices
}

pub fn octree_stats(octree: &[u32]) -> OctreeStats {
    let mut stats = OctreeStats {
        total_nodes: octree.len(),
        memory_bytes: std::mem::size_of_val(octree),
        ..Default::default()
    };
    for &word in octree {
        let node = OctreeNode(word);
        if node.is_leaf() {
            stats.leaf_nodes += 1;
            stats.filled_cells += node.child_count() as usize;
        }
    }
    stats
}
