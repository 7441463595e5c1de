//! Disk-backed chunk storage
//!
//! Each chunk is two files under the storage root:
//! - `<chunk_id>.json`: header and current LOD
//! - `<chunk_id>.bin`: geometry array then type data array, each count-prefixed
//!
//! Files are written to a temporary sibling and renamed into place.

use super::blob_operations::{read_u32_array, write_u32_array};
use super::{ChunkStorage, PersistenceError, PersistenceResult};
use crate::chunk::chunk_operations::chunk_bit_depth;
use crate::chunk::{ChunkData, ChunkHeader};
use crate::config::CodecConfig;
use crate::voxel::voxel_operations::create_batch;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct ChunkRecord {
    header: ChunkHeader,
    lod: u32,
}

pub struct DiskChunkStorage {
    root: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PersistenceError + '_ {
    move |error| PersistenceError::IoError {
        path: path.display().to_string(),
        error: error.to_string(),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> PersistenceResult<()> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, bytes).map_err(io_error(&temp_path))?;
    fs::rename(&temp_path, path).map_err(io_error(path))?;
    Ok(())
}

impl DiskChunkStorage {
    /// Open storage rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(io_error(&root))?;
        log::debug!("[DiskChunkStorage::new] Storage root {}", root.display());
        Ok(Self { root })
    }

    /// Open storage at the configured `storage_root`
    pub fn from_config(config: &CodecConfig) -> PersistenceResult<Self> {
        Self::new(config.storage_root.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn header_path(&self, chunk_id: u32) -> PathBuf {
        self.root.join(format!("{}.json", chunk_id))
    }

    fn blob_path(&self, chunk_id: u32) -> PathBuf {
        self.root.join(format!("{}.bin", chunk_id))
    }
}

impl ChunkStorage for DiskChunkStorage {
    fn save_chunk(&self, chunk: &ChunkData) -> PersistenceResult<()> {
        let chunk_id = chunk.header.chunk_id;
        let record = ChunkRecord {
            header: chunk.header.clone(),
            lod: chunk.lod,
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;

        let mut blob = Vec::new();
        write_u32_array(&mut blob, &chunk.geometry_data)?;
        write_u32_array(&mut blob, &chunk.voxel_type_data)?;

        // Blob first so a header never points at a missing blob
        write_atomic(&self.blob_path(chunk_id), &blob)?;
        write_atomic(&self.header_path(chunk_id), json.as_bytes())?;

        log::info!(
            "[DiskChunkStorage::save_chunk] Saved chunk {} at LOD {} ({} bytes)",
            chunk_id,
            chunk.lod,
            blob.len()
        );
        Ok(())
    }

    fn load_chunk(&self, chunk_id: u32) -> PersistenceResult<ChunkData> {
        let header_path = self.header_path(chunk_id);
        let blob_path = self.blob_path(chunk_id);
        if !header_path.is_file() || !blob_path.is_file() {
            return Err(PersistenceError::MissingChunk { chunk_id });
        }

        let json = fs::read_to_string(&header_path).map_err(io_error(&header_path))?;
        let record: ChunkRecord = serde_json::from_str(&json)
            .map_err(|e| PersistenceError::DeserializationError(e.to_string()))?;
        if record.header.chunk_id != chunk_id {
            return Err(PersistenceError::CorruptedData(format!(
                "header in {} belongs to chunk {}",
                header_path.display(),
                record.header.chunk_id
            )));
        }

        let bytes = fs::read(&blob_path).map_err(io_error(&blob_path))?;
        let mut offset = 0;
        let geometry_data = read_u32_array(&bytes, &mut offset)?;
        let voxel_type_data = read_u32_array(&bytes, &mut offset)?;
        if offset != bytes.len() {
            return Err(PersistenceError::CorruptedData(format!(
                "{} trailing bytes in {}",
                bytes.len() - offset,
                blob_path.display()
            )));
        }

        log::info!(
            "[DiskChunkStorage::load_chunk] Loaded chunk {} at LOD {} ({} nodes)",
            chunk_id,
            record.lod,
            geometry_data.len()
        );
        let bit_depth = chunk_bit_depth(&record.header);
        Ok(ChunkData {
            header: record.header,
            geometry_data,
            voxel_type_data,
            lod: record.lod,
            chunk_queue: create_batch(bit_depth),
        })
    }

    fn contains_chunk(&self, chunk_id: u32) -> bool {
        self.header_path(chunk_id).is_file() && self.blob_path(chunk_id).is_file()
    }
}
