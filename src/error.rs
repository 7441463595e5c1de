//! Crate-wide error type
//!
//! Each module reports its own error enum. `CodecError` wraps all of them so
//! callers driving a whole chunk pipeline can use a single `?`.

use crate::chunk::{ChunkError, LodError};
use crate::config::ConfigError;
use crate::morton::MortonError;
use crate::octree::OctreeError;
use crate::persistence::PersistenceError;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Morton(#[from] MortonError),

    #[error(transparent)]
    Octree(#[from] OctreeError),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    Lod(#[from] LodError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{message}: {source}")]
    Context {
        message: String,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// True for failures the caller can retry or regenerate around
    pub fn is_recoverable(&self) -> bool {
        match self {
            CodecError::Lod(LodError::MissingPersistedChunk { .. })
            | CodecError::Persistence(PersistenceError::MissingChunk { .. })
            | CodecError::Persistence(PersistenceError::IoError { .. }) => true,
            CodecError::Lod(LodError::Persistence(PersistenceError::IoError { .. })) => true,
            CodecError::Context { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> CodecResult<T>;
    fn with_context<F>(self, f: F) -> CodecResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: Into<CodecError>,
{
    fn context(self, msg: &str) -> CodecResult<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> CodecResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| CodecError::Context {
            message: f(),
            source: Box::new(e.into()),
        })
    }
}
