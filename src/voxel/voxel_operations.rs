//! Sparse Voxel Operations - Pure DOP Functions
//!
//! Functions over VoxelGrid and VoxelBatch. The grid stays sorted by Morton
//! index after every call. Duplicate cells resolve first-after-stable-sort:
//! the earliest entry for an index survives, and batch entries are placed
//! ahead of the store's own entries so merged edits override stored colors.

use super::voxel_data::{Voxel, VoxelBatch, VoxelColor, VoxelGrid};
use crate::morton::{morton_encode, MortonResult};
use glam::UVec3;

/// Create an empty grid spanning `2^bit_depth` cells per axis
pub fn create_empty(bit_depth: u32) -> VoxelGrid {
    VoxelGrid {
        bit_depth,
        voxels: Vec::new(),
    }
}

/// Create an empty staging batch for a grid of the same depth
pub fn create_batch(bit_depth: u32) -> VoxelBatch {
    VoxelBatch {
        bit_depth,
        voxels: Vec::new(),
    }
}

/// Insert or recolor the voxel at `coord`
pub fn insert(grid: &mut VoxelGrid, coord: UVec3, color: VoxelColor) -> MortonResult<()> {
    let index = morton_encode(coord, grid.bit_depth)?;
    insert_indexed(grid, Voxel { index, color });
    Ok(())
}

/// Insert a voxel whose Morton index is already known
pub fn insert_indexed(grid: &mut VoxelGrid, voxel: Voxel) {
    match grid.voxels.binary_search_by_key(&voxel.index, |v| v.index) {
        Ok(position) => grid.voxels[position].color = voxel.color,
        Err(position) => grid.voxels.insert(position, voxel),
    }
}

/// Color of the voxel at `coord`, if filled
pub fn get(grid: &VoxelGrid, coord: UVec3) -> MortonResult<Option<VoxelColor>> {
    let index = morton_encode(coord, grid.bit_depth)?;
    Ok(get_indexed(grid, index))
}

pub fn get_indexed(grid: &VoxelGrid, index: u64) -> Option<VoxelColor> {
    grid.voxels
        .binary_search_by_key(&index, |v| v.index)
        .ok()
        .map(|position| grid.voxels[position].color)
}

/// Clear the voxel at `coord`, returning its previous color
pub fn remove(grid: &mut VoxelGrid, coord: UVec3) -> MortonResult<Option<VoxelColor>> {
    let index = morton_encode(coord, grid.bit_depth)?;
    Ok(grid
        .voxels
        .binary_search_by_key(&index, |v| v.index)
        .ok()
        .map(|position| grid.voxels.remove(position).color))
}

/// Stage an edit in a batch
pub fn push(batch: &mut VoxelBatch, coord: UVec3, color: VoxelColor) -> MortonResult<()> {
    let index = morton_encode(coord, batch.bit_depth)?;
    batch.voxels.push(Voxel { index, color });
    Ok(())
}

/// Stable sort by Morton index, keeping the first entry of each run
pub fn sort_and_dedup(voxels: &mut Vec<Voxel>) {
    voxels.sort_by_key(|v| v.index);
    voxels.dedup_by_key(|v| v.index);
}

/// Merge a batch into the grid
///
/// Within the batch the earliest edit to a cell wins. Batch entries
/// override colors already stored for the same cell.
pub fn merge_batch(grid: &mut VoxelGrid, batch: VoxelBatch) {
    debug_assert_eq!(grid.bit_depth, batch.bit_depth);
    if batch.voxels.is_empty() {
        return;
    }

    let incoming = batch.voxels.len();
    let mut merged = batch.voxels;
    merged.append(&mut grid.voxels);
    sort_and_dedup(&mut merged);

    log::debug!(
        "[voxel_operations::merge_batch] Merged {} staged voxels, grid now holds {}",
        incoming,
        merged.len()
    );
    grid.voxels = merged;
}

/// Build a grid from raw (position, color) point data
pub fn from_points<I>(points: I, bit_depth: u32) -> MortonResult<VoxelGrid>
where
    I: IntoIterator<Item = (UVec3, VoxelColor)>,
{
    let mut batch = create_batch(bit_depth);
    for (coord, color) in points {
        push(&mut batch, coord, color)?;
    }
    let mut grid = create_empty(bit_depth);
    merge_batch(&mut grid, batch);
    Ok(grid)
}

pub fn voxel_count(grid: &VoxelGrid) -> usize {
    grid.voxels.len()
}

pub fn is_empty(grid: &VoxelGrid) -> bool {
    grid.voxels.is_empty()
}

/// True when the grid holds no duplicates and is ascending by index
pub fn is_strictly_sorted(grid: &VoxelGrid) -> bool {
    grid.voxels.windows(2).all(|pair| pair[0].index < pair[1].index)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: VoxelColor = VoxelColor::new(255, 0, 0);
    const GREEN: VoxelColor = VoxelColor::new(0, 255, 0);
    const BLUE: VoxelColor = VoxelColor::new(0, 0, 255);

    #[test]
    fn test_insert_keeps_order() {
        let mut grid = create_empty(3);
        insert(&mut grid, UVec3::new(7, 7, 7), RED).expect("in range");
        insert(&mut grid, UVec3::new(0, 0, 0), GREEN).expect("in range");
        insert(&mut grid, UVec3::new(3, 1, 2), BLUE).expect("in range");

        assert_eq!(voxel_count(&grid), 3);
        assert!(is_strictly_sorted(&grid));
        assert_eq!(grid.voxels[0].index, 0);
        assert_eq!(grid.voxels[2].index, 511);
    }

    #[test]
    fn test_insert_overwrites_existing_cell() {
        let mut grid = create_empty(3);
        insert(&mut grid, UVec3::new(1, 2, 3), RED).expect("in range");
        insert(&mut grid, UVec3::new(1, 2, 3), BLUE).expect("in range");

        assert_eq!(voxel_count(&grid), 1);
        assert_eq!(get(&grid, UVec3::new(1, 2, 3)), Ok(Some(BLUE)));
    }

    #[test]
    fn test_get_and_remove() {
        let mut grid = create_empty(4);
        insert(&mut grid, UVec3::new(9, 4, 1), GREEN).expect("in range");

        assert_eq!(get(&grid, UVec3::new(9, 4, 2)), Ok(None));
        assert_eq!(remove(&mut grid, UVec3::new(9, 4, 1)), Ok(Some(GREEN)));
        assert_eq!(remove(&mut grid, UVec3::new(9, 4, 1)), Ok(None));
        assert!(is_empty(&grid));
    }

    #[test]
    fn test_insert_out_of_range_fails() {
        let mut grid = create_empty(3);
        assert!(insert(&mut grid, UVec3::new(8, 0, 0), RED).is_err());
        assert!(is_empty(&grid));
    }

    #[test]
    fn test_merge_batch_first_edit_wins_within_batch() {
        let mut grid = create_empty(3);
        let mut batch = create_batch(3);
        push(&mut batch, UVec3::new(2, 2, 2), RED).expect("in range");
        push(&mut batch, UVec3::new(0, 0, 0), GREEN).expect("in range");
        push(&mut batch, UVec3::new(2, 2, 2), BLUE).expect("in range");

        merge_batch(&mut grid, batch);

        assert_eq!(voxel_count(&grid), 2);
        assert!(is_strictly_sorted(&grid));
        assert_eq!(get(&grid, UVec3::new(2, 2, 2)), Ok(Some(RED)));
    }

    #[test]
    fn test_merge_batch_overrides_store() {
        let mut grid = create_empty(3);
        insert(&mut grid, UVec3::new(5, 5, 5), RED).expect("in range");
        insert(&mut grid, UVec3::new(1, 1, 1), RED).expect("in range");

        let mut batch = create_batch(3);
        push(&mut batch, UVec3::new(5, 5, 5), BLUE).expect("in range");
        merge_batch(&mut grid, batch);

        assert_eq!(voxel_count(&grid), 2);
        assert_eq!(get(&grid, UVec3::new(5, 5, 5)), Ok(Some(BLUE)));
        assert_eq!(get(&grid, UVec3::new(1, 1, 1)), Ok(Some(RED)));
    }

    #[test]
    fn test_from_points() {
        let points = (0..8u32).map(|i| (UVec3::new(i, 7 - i, i / 2), GREEN));
        let grid = from_points(points, 3).expect("points in range");

        assert_eq!(voxel_count(&grid), 8);
        assert!(is_strictly_sorted(&grid));
    }
}
