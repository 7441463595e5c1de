//! Blob Operations - Pure DOP Functions
//!
//! Count-prefixed native-endian `u32` arrays, the byte form of the octree and
//! type data buffers.

use super::{PersistenceError, PersistenceResult};

const WORD_BYTES: usize = std::mem::size_of::<u32>();

/// Append `words` to `out` as a `u32` count followed by the words
pub fn write_u32_array(out: &mut Vec<u8>, words: &[u32]) -> PersistenceResult<()> {
    let count = u32::try_from(words.len()).map_err(|_| {
        PersistenceError::SerializationError(format!("{} words exceed a u32 count", words.len()))
    })?;
    out.reserve(WORD_BYTES + words.len() * WORD_BYTES);
    out.extend_from_slice(&count.to_ne_bytes());
    out.extend_from_slice(bytemuck::cast_slice(words));
    Ok(())
}

/// Read one count-prefixed array starting at `*offset`, advancing it
pub fn read_u32_array(bytes: &[u8], offset: &mut usize) -> PersistenceResult<Vec<u32>> {
    let prefix = bytes.get(*offset..*offset + WORD_BYTES).ok_or_else(|| {
        PersistenceError::CorruptedData(format!("missing array count at byte {}", offset))
    })?;
    let count = bytemuck::pod_read_unaligned::<u32>(prefix) as usize;

    let start = *offset + WORD_BYTES;
    let end = start + count * WORD_BYTES;
    let body = bytes.get(start..end).ok_or_else(|| {
        PersistenceError::CorruptedData(format!(
            "array of {} words at byte {} runs past {} bytes",
            count,
            start,
            bytes.len()
        ))
    })?;

    let words = bytemuck::pod_collect_to_vec::<u8, u32>(body);
    *offset = end;
    Ok(words)
}

pub fn encode_u32_blob(words: &[u32]) -> PersistenceResult<Vec<u8>> {
    let mut out = Vec::new();
    write_u32_array(&mut out, words)?;
    Ok(out)
}

/// Decode a blob holding exactly one array
pub fn decode_u32_blob(bytes: &[u8]) -> PersistenceResult<Vec<u32>> {
    let mut offset = 0;
    let words = read_u32_array(bytes, &mut offset)?;
    if offset != bytes.len() {
        return Err(PersistenceError::CorruptedData(format!(
            "{} trailing bytes after array",
            bytes.len() - offset
        )));
    }
    Ok(words)
}
