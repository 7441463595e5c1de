//! Morton (Z-order) index codec
//!
//! Interleaves the bits of a voxel coordinate into a single index. Bit `3i`
//! holds `y_i`, bit `3i + 1` holds `x_i` and bit `3i + 2` holds `z_i`. The
//! renderer decodes indices with the same permutation, so it must not change.
//!
//! The hot path goes through lookup tables built once on first use. The
//! loop-based functions at the bottom are the reference the tables are
//! checked against.

use crate::constants::morton_limits::{MAX_BIT_DEPTH_U32, MAX_BIT_DEPTH_U64};
use glam::UVec3;
use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

/// Bit offset of each axis inside an interleaved triple
const Y_OFFSET: u32 = 0;
const X_OFFSET: u32 = 1;
const Z_OFFSET: u32 = 2;

/// Interleaved bits covered by one decode table lookup (3 per axis)
const DECODE_FRAGMENT_BITS: u32 = 9;
const DECODE_FRAGMENT_MASK: u64 = (1 << DECODE_FRAGMENT_BITS) - 1;

pub type MortonResult<T> = Result<T, MortonError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MortonError {
    #[error("Bit depth {depth} exceeds maximum of {max}")]
    BitDepthTooLarge { depth: u32, max: u32 },

    #[error("Coordinate {coord} out of range for bit depth {depth}")]
    CoordinateOutOfRange { coord: UVec3, depth: u32 },

    #[error("Morton index {index} out of range for bit depth {depth}")]
    IndexOutOfRange { index: u64, depth: u32 },
}

/// Per-axis tables mapping one coordinate byte to its spread bit pattern
struct EncodeTables {
    x: [u64; 256],
    y: [u64; 256],
    z: [u64; 256],
}

lazy_static! {
    static ref ENCODE_TABLES: EncodeTables = build_encode_tables();
    /// Interleaved 9-bit fragment -> [x, y, z] 3-bit components
    static ref DECODE_TABLE: FxHashMap<u64, [u32; 3]> = build_decode_table();
}

fn spread_byte(value: u32) -> u64 {
    let mut spread = 0u64;
    for bit in 0..8 {
        spread |= (((value >> bit) & 1) as u64) << (3 * bit);
    }
    spread
}

fn build_encode_tables() -> EncodeTables {
    let mut tables = EncodeTables {
        x: [0; 256],
        y: [0; 256],
        z: [0; 256],
    };
    for value in 0..256u32 {
        let spread = spread_byte(value);
        tables.x[value as usize] = spread << X_OFFSET;
        tables.y[value as usize] = spread << Y_OFFSET;
        tables.z[value as usize] = spread << Z_OFFSET;
    }
    tables
}

fn build_decode_table() -> FxHashMap<u64, [u32; 3]> {
    let mut table = FxHashMap::default();
    table.reserve(1 << DECODE_FRAGMENT_BITS);
    for x in 0..8u32 {
        for y in 0..8u32 {
            for z in 0..8u32 {
                let fragment = encode_reference(UVec3::new(x, y, z), 3);
                table.insert(fragment, [x, y, z]);
            }
        }
    }
    table
}

fn check_bit_depth(bit_depth: u32, max: u32) -> MortonResult<()> {
    if bit_depth > max {
        return Err(MortonError::BitDepthTooLarge {
            depth: bit_depth,
            max,
        });
    }
    Ok(())
}

fn check_coordinate(coord: UVec3, bit_depth: u32) -> MortonResult<()> {
    let extent = 1u64 << bit_depth;
    if coord.max_element() as u64 >= extent {
        return Err(MortonError::CoordinateOutOfRange {
            coord,
            depth: bit_depth,
        });
    }
    Ok(())
}

fn check_index(index: u64, bit_depth: u32) -> MortonResult<()> {
    let bits = 3 * bit_depth;
    if bits < u64::BITS && index >> bits != 0 {
        return Err(MortonError::IndexOutOfRange {
            index,
            depth: bit_depth,
        });
    }
    Ok(())
}

/// Encode a coordinate whose components all fit in 21 bits
#[inline]
pub(crate) fn encode_unchecked(coord: UVec3) -> u64 {
    let tables = &*ENCODE_TABLES;
    let mut index = 0u64;
    for chunk in 0..3 {
        let shift = 8 * chunk;
        let x = ((coord.x >> shift) & 0xFF) as usize;
        let y = ((coord.y >> shift) & 0xFF) as usize;
        let z = ((coord.z >> shift) & 0xFF) as usize;
        index |= (tables.x[x] | tables.y[y] | tables.z[z]) << (24 * chunk);
    }
    index
}

/// Decode every interleaved bit of `index` (up to 21 bits per axis)
#[inline]
pub(crate) fn decode_unchecked(index: u64) -> UVec3 {
    let table = &*DECODE_TABLE;
    let mut coord = UVec3::ZERO;
    let mut fragment_index = 0;
    let mut remaining = index;
    while remaining != 0 {
        if let Some(&[x, y, z]) = table.get(&(remaining & DECODE_FRAGMENT_MASK)) {
            let shift = 3 * fragment_index;
            coord.x |= x << shift;
            coord.y |= y << shift;
            coord.z |= z << shift;
        }
        remaining >>= DECODE_FRAGMENT_BITS;
        fragment_index += 1;
    }
    coord
}

/// Morton index of `coord` in a grid of `2^bit_depth` cells per axis
pub fn morton_encode(coord: UVec3, bit_depth: u32) -> MortonResult<u64> {
    check_bit_depth(bit_depth, MAX_BIT_DEPTH_U64)?;
    check_coordinate(coord, bit_depth)?;
    Ok(encode_unchecked(coord))
}

/// Coordinate of `index` in a grid of `2^bit_depth` cells per axis
pub fn morton_decode(index: u64, bit_depth: u32) -> MortonResult<UVec3> {
    check_bit_depth(bit_depth, MAX_BIT_DEPTH_U64)?;
    check_index(index, bit_depth)?;
    Ok(decode_unchecked(index))
}

/// 32-bit variant used to pack chunk header positions (10 bits per axis max)
pub fn encode_u32(coord: UVec3, bit_depth: u32) -> MortonResult<u32> {
    check_bit_depth(bit_depth, MAX_BIT_DEPTH_U32)?;
    check_coordinate(coord, bit_depth)?;
    Ok(encode_unchecked(coord) as u32)
}

pub fn decode_u32(index: u32, bit_depth: u32) -> MortonResult<UVec3> {
    check_bit_depth(bit_depth, MAX_BIT_DEPTH_U32)?;
    check_index(index as u64, bit_depth)?;
    Ok(decode_unchecked(index as u64))
}

/// Octant (0-7) selected by `index` at `level` levels above the finest one
#[inline]
pub fn octant_at(index: u64, level: u32) -> u32 {
    ((index >> (3 * level)) & 0b111) as u32
}

/// Bit-by-bit interleave, kept as the reference for the table path
pub fn encode_reference(coord: UVec3, bit_depth: u32) -> u64 {
    let mut index = 0u64;
    for bit in 0..bit_depth {
        index |= (((coord.y >> bit) & 1) as u64) << (3 * bit + Y_OFFSET);
        index |= (((coord.x >> bit) & 1) as u64) << (3 * bit + X_OFFSET);
        index |= (((coord.z >> bit) & 1) as u64) << (3 * bit + Z_OFFSET);
    }
    index
}

pub fn decode_reference(index: u64, bit_depth: u32) -> UVec3 {
    let mut coord = UVec3::ZERO;
    for bit in 0..bit_depth {
        coord.y |= (((index >> (3 * bit + Y_OFFSET)) & 1) as u32) << bit;
        coord.x |= (((index >> (3 * bit + X_OFFSET)) & 1) as u32) << bit;
        coord.z |= (((index >> (3 * bit + Z_OFFSET)) & 1) as u32) << bit;
    }
    coord
}
