//! # Puzzle Store
//!
//! Persistence for [`PuzzleDescriptorSet`] values: the precomputed, ordered
//! collection of region descriptors for one reference image. A set is written
//! once at puzzle ingestion, read on every match request, and deleted only
//! when the puzzle itself is deleted — it is immutable in between, so the
//! store offers exactly `save`/`load`/`delete` plus an existence probe.
//!
//! ## Core Features
//!
//! - **Pluggable backends** through the [`StoreBackend`] trait:
//!   an in-memory `HashMap` backend for tests and ephemeral use, and a
//!   RocksDB backend for on-disk persistence (enabled via the default
//!   `backend-rocksdb` feature).
//! - **Compact records**: sets are bincode-encoded and zstd-compressed before
//!   they reach the backend; [`CompressionConfig`] controls codec and level.
//! - **Schema versioning**: [`PuzzleDescriptorSet::schema_version`] is stamped
//!   on write and defaulted on read so layout changes stay detectable.
//!
//! ## Example
//!
//! ```
//! use grid::RegionGeometry;
//! use descriptor::Descriptor;
//! use store::{DescriptorStore, PuzzleDescriptorSet, Region, STORE_SCHEMA_VERSION};
//!
//! let store = DescriptorStore::in_memory();
//! let set = PuzzleDescriptorSet {
//!     schema_version: STORE_SCHEMA_VERSION,
//!     source_width: 300,
//!     source_height: 200,
//!     grid_size: (1, 1),
//!     regions: vec![Region {
//!         geometry: RegionGeometry { x: 0, y: 0, width: 100, height: 100 },
//!         descriptor: Descriptor::zeroed(64),
//!     }],
//! };
//! store.save("puzzle-1", &set).unwrap();
//! assert_eq!(store.load("puzzle-1").unwrap(), set);
//! ```

mod backend;

#[cfg(feature = "backend-rocksdb")]
pub use backend::RocksDbBackend;
pub use backend::{BackendConfig, InMemoryBackend, StoreBackend};

use bincode::config::standard;
use bincode::error::{DecodeError, EncodeError};
use bincode::serde::{decode_from_slice, encode_to_vec};
use descriptor::Descriptor;
use grid::RegionGeometry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use zstd::{decode_all, encode_all};

/// Bump this value whenever the persisted set layout changes.
pub const STORE_SCHEMA_VERSION: u16 = 1;

/// One indexed region: placement plus precomputed descriptor.
///
/// The position of a region in [`PuzzleDescriptorSet::regions`] is its
/// discovery-order index from grid construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub geometry: RegionGeometry,
    pub descriptor: Descriptor,
}

/// The persisted descriptor collection for one puzzle, keyed 1:1 by puzzle
/// id and immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PuzzleDescriptorSet {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    /// Dimensions of the source image the grid was built from; the ranker
    /// phrases locations against these.
    pub source_width: u32,
    pub source_height: u32,
    /// `(rows, cols)` of the generating grid.
    pub grid_size: (usize, usize),
    /// Regions in row-major discovery order.
    pub regions: Vec<Region>,
}

const fn default_schema_version() -> u16 {
    STORE_SCHEMA_VERSION
}

/// Errors produced by the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("compression error: {0}")]
    Compression(String),
    #[error("no descriptor set stored for puzzle {puzzle_id}")]
    NotFound { puzzle_id: String },
}

impl From<EncodeError> for StoreError {
    fn from(e: EncodeError) -> Self {
        StoreError::Encode(e.to_string())
    }
}

impl From<DecodeError> for StoreError {
    fn from(e: DecodeError) -> Self {
        StoreError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Compression(e.to_string())
    }
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Compression codec options for stored sets.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    /// No compression (useful for debugging).
    None,
    /// Zstd (default; descriptor vectors compress well).
    #[default]
    Zstd,
}

/// Compression behavior configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Zstd level (1-22; higher is smaller but slower).
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(encode_all(data, self.level)?),
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(decode_all(data)?),
        }
    }
}

/// Config for initializing a [`DescriptorStore`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }
}

/// High-level store over a pluggable backend.
pub struct DescriptorStore {
    backend: Box<dyn StoreBackend>,
    cfg: StoreConfig,
}

impl DescriptorStore {
    pub fn new(cfg: StoreConfig) -> Result<Self, StoreError> {
        let backend = cfg.backend.build()?;
        Ok(Self { backend, cfg })
    }

    /// Ephemeral store for tests and single-process use.
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(InMemoryBackend::new()),
            cfg: StoreConfig::new().with_backend(BackendConfig::in_memory()),
        }
    }

    /// Persist `set` under `puzzle_id`, replacing any previous set.
    pub fn save(&self, puzzle_id: &str, set: &PuzzleDescriptorSet) -> Result<(), StoreError> {
        let encoded = encode_to_vec(set, standard())?;
        let compressed = self.cfg.compression.compress(&encoded)?;
        self.backend.put(puzzle_id, &compressed)?;
        debug!(
            puzzle_id,
            regions = set.regions.len(),
            bytes = compressed.len(),
            "descriptor set saved"
        );
        Ok(())
    }

    /// Load the set for `puzzle_id`, or [`StoreError::NotFound`].
    pub fn load(&self, puzzle_id: &str) -> Result<PuzzleDescriptorSet, StoreError> {
        let raw = self
            .backend
            .get(puzzle_id)?
            .ok_or_else(|| StoreError::NotFound {
                puzzle_id: puzzle_id.to_string(),
            })?;
        let decoded = self.cfg.compression.decompress(&raw)?;
        let (set, _): (PuzzleDescriptorSet, usize) = decode_from_slice(&decoded, standard())?;
        Ok(set)
    }

    /// Drop the set for `puzzle_id`. Removing an unknown id is a no-op.
    pub fn delete(&self, puzzle_id: &str) -> Result<(), StoreError> {
        self.backend.delete(puzzle_id)?;
        debug!(puzzle_id, "descriptor set deleted");
        Ok(())
    }

    pub fn contains(&self, puzzle_id: &str) -> Result<bool, StoreError> {
        Ok(self.backend.get(puzzle_id)?.is_some())
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.backend.flush()
    }
}
