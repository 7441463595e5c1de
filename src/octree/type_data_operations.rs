//! Voxel Type Data Operations - Pure DOP Functions
//!
//! The side table the renderer reads next to the octree: one
//! `[morton_index, packed_color, packed_normal]` triple per filled voxel,
//! ascending by index.
//!
//! Color word: three 10-bit channels at bits 20/10/0, each the 8-bit source
//! value times 4.
//! Normal word: per axis a sign bit above a 9-bit magnitude; X at bits 29/28-20,
//! Y at 19/18-10, Z at 9/8-0. A set sign bit means the component is not
//! negative.

use super::OctreeResult;
use crate::constants::morton_limits::MAX_BIT_DEPTH_U32;
use crate::constants::type_data_layout::{
    COLOR_BLUE_SHIFT, COLOR_CHANNEL_MASK, COLOR_CHANNEL_SCALE, COLOR_GREEN_SHIFT, COLOR_RED_SHIFT,
    NORMAL_MAGNITUDE_MASK, NORMAL_MAGNITUDE_MAX, NORMAL_SIGN_BIT, NORMAL_X_SHIFT, NORMAL_Y_SHIFT,
    NORMAL_Z_SHIFT, WORDS_PER_VOXEL,
};
use crate::morton::MortonError;
use crate::voxel::{Voxel, VoxelColor, VoxelGrid};
use glam::Vec3;

/// Normal word written while no real normals are computed (a zero vector)
pub const NORMAL_PLACEHOLDER: u32 = (NORMAL_SIGN_BIT << NORMAL_X_SHIFT)
    | (NORMAL_SIGN_BIT << NORMAL_Y_SHIFT)
    | (NORMAL_SIGN_BIT << NORMAL_Z_SHIFT);

#[inline]
pub fn pack_color(color: VoxelColor) -> u32 {
    ((color.r as u32 * COLOR_CHANNEL_SCALE) << COLOR_RED_SHIFT)
        | ((color.g as u32 * COLOR_CHANNEL_SCALE) << COLOR_GREEN_SHIFT)
        | ((color.b as u32 * COLOR_CHANNEL_SCALE) << COLOR_BLUE_SHIFT)
}

#[inline]
pub fn unpack_color(packed: u32) -> VoxelColor {
    let channel = |shift: u32| ((packed >> shift) & COLOR_CHANNEL_MASK) / COLOR_CHANNEL_SCALE;
    VoxelColor::new(
        channel(COLOR_RED_SHIFT) as u8,
        channel(COLOR_GREEN_SHIFT) as u8,
        channel(COLOR_BLUE_SHIFT) as u8,
    )
}

fn pack_normal_component(value: f32) -> u32 {
    let sign = if value >= 0.0 { NORMAL_SIGN_BIT } else { 0 };
    let magnitude = (value.abs().min(1.0) * NORMAL_MAGNITUDE_MAX).round() as u32;
    sign | (magnitude & NORMAL_MAGNITUDE_MASK)
}

fn unpack_normal_component(bits: u32) -> f32 {
    let magnitude = (bits & NORMAL_MAGNITUDE_MASK) as f32 / NORMAL_MAGNITUDE_MAX;
    if bits & NORMAL_SIGN_BIT != 0 {
        magnitude
    } else {
        -magnitude
    }
}

/// Pack a unit normal; components are clamped to [-1, 1]
pub fn pack_normal(normal: Vec3) -> u32 {
    (pack_normal_component(normal.x) << NORMAL_X_SHIFT)
        | (pack_normal_component(normal.y) << NORMAL_Y_SHIFT)
        | (pack_normal_component(normal.z) << NORMAL_Z_SHIFT)
}

pub fn unpack_normal(packed: u32) -> Vec3 {
    Vec3::new(
        unpack_normal_component(packed >> NORMAL_X_SHIFT),
        unpack_normal_component(packed >> NORMAL_Y_SHIFT),
        unpack_normal_component(packed >> NORMAL_Z_SHIFT),
    )
}

/// Type data for every voxel of a sorted grid
///
/// Indices are stored as `u32`, so the grid may be at most 10 bits deep.
pub fn create_voxel_type_data(grid: &VoxelGrid) -> OctreeResult<Vec<u32>> {
    if grid.bit_depth > MAX_BIT_DEPTH_U32 {
        return Err(MortonError::BitDepthTooLarge {
            depth: grid.bit_depth,
            max: MAX_BIT_DEPTH_U32,
        }
        .into());
    }

    let mut type_data = Vec::with_capacity(grid.voxels.len() * WORDS_PER_VOXEL);
    for voxel in &grid.voxels {
        type_data.extend_from_slice(&[
            voxel.index as u32,
            pack_color(voxel.color),
            NORMAL_PLACEHOLDER,
        ]);
    }

    log::debug!(
        "[type_data_operations::create_voxel_type_data] Encoded {} voxels",
        grid.voxels.len()
    );
    Ok(type_data)
}

/// Rebuild a sorted grid from a type data table
///
/// Trailing words that do not form a full triple are ignored.
pub fn voxels_from_type_data(type_data: &[u32], bit_depth: u32) -> VoxelGrid {
    let triples = type_data.chunks_exact(WORDS_PER_VOXEL);
    if !triples.remainder().is_empty() {
        log::warn!(
            "[type_data_operations::voxels_from_type_data] Ignoring {} trailing words",
            triples.remainder().len()
        );
    }

    VoxelGrid {
        bit_depth,
        voxels: triples
            .map(|triple| Voxel {
                index: triple[0] as u64,
                color: unpack_color(triple[1]),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::voxel_operations::{create_empty, from_points, insert};
    use glam::UVec3;

    #[test]
    fn test_pack_color_layout() {
        assert_eq!(pack_color(VoxelColor::new(255, 0, 0)), 0x3FC0_0000);
        assert_eq!(pack_color(VoxelColor::new(0, 255, 0)), 0x000F_F000);
        assert_eq!(pack_color(VoxelColor::new(0, 0, 255)), 0x0000_03FC);
        assert_eq!(pack_color(VoxelColor::new(1, 2, 3)), (4 << 20) | (8 << 10) | 12);
    }

    #[test]
    fn test_color_unpacks_exactly() {
        for value in [0u8, 1, 17, 128, 254, 255] {
            let color = VoxelColor::new(value, 255 - value, value / 3);
            assert_eq!(unpack_color(pack_color(color)), color);
        }
    }

    #[test]
    fn test_normal_placeholder_layout() {
        assert_eq!(NORMAL_PLACEHOLDER, 0x2008_0200);
        assert_eq!(pack_normal(Vec3::ZERO), NORMAL_PLACEHOLDER);
    }

    #[test]
    fn test_normal_axes() {
        assert_eq!(pack_normal(Vec3::X), (0x3FF << 20) | (1 << 19) | (1 << 9));
        assert_eq!(pack_normal(Vec3::NEG_Z), (1 << 29) | (1 << 19) | 0x1FF);

        let normal = Vec3::new(0.5, -0.25, 1.0);
        let decoded = unpack_normal(pack_normal(normal));
        assert!((decoded - normal).abs().max_element() < 1.0 / 511.0);
    }

    #[test]
    fn test_single_red_voxel() {
        let mut grid = create_empty(3);
        insert(&mut grid, UVec3::ZERO, VoxelColor::new(255, 0, 0)).expect("in range");

        let type_data = create_voxel_type_data(&grid).expect("encode");
        assert_eq!(type_data, vec![0, 0x3FC0_0000, 0x2008_0200]);
    }

    #[test]
    fn test_type_data_length_and_order() {
        let points = (0..50u32).map(|i| {
            let coord = UVec3::new(i % 16, (i * 3) % 16, (i * 5) % 16);
            (coord, VoxelColor::new(i as u8, 1, 2))
        });
        let grid = from_points(points, 4).expect("points in range");
        let type_data = create_voxel_type_data(&grid).expect("encode");

        assert_eq!(type_data.len(), 3 * grid.voxels.len());
        let indices: Vec<u32> = type_data.chunks_exact(3).map(|t| t[0]).collect();
        assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(voxels_from_type_data(&type_data, 4), grid);
    }

    #[test]
    fn test_deep_grid_rejected() {
        let grid = create_empty(11);
        assert!(create_voxel_type_data(&grid).is_err());
    }
}
