//! Configuration types for hnswdb.
//!
//! The [`Config`] struct controls database behavior including:
//! - HNSW graph parameters ([`HnswConfig`])
//! - Cache size and durability settings
//! - When the in-memory index is rebuilt
//!
//! # Example
//! ```rust
//! use hnswdb::{Config, SyncMode};
//!
//! // Use defaults (M = 16, ef_construction = 200, rebuild after every write)
//! let config = Config::default();
//!
//! // Bulk loading: defer rebuilds until an explicit rebuild_index()
//! let config = Config {
//!     auto_rebuild: false,
//!     sync_mode: SyncMode::Fast,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound on sampled graph layers.
pub const MAX_LAYERS: usize = 16;

/// Database configuration options.
///
/// All fields have sensible defaults. Use struct update syntax to override
/// specific settings:
///
/// ```rust
/// use hnswdb::Config;
///
/// let config = Config {
///     cache_size_mb: 256,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Parameters for every index built by this database.
    pub hnsw: HnswConfig,

    /// Cache size in megabytes for the storage engine.
    ///
    /// Higher values improve read performance but use more memory.
    /// Default: 64 MB
    pub cache_size_mb: usize,

    /// Durability mode for write operations.
    pub sync_mode: SyncMode,

    /// Rebuild the index after every add, update and delete.
    ///
    /// When `false` the index keeps serving the vector set it was built
    /// from until [`VectorDB::rebuild_index`](crate::VectorDB::rebuild_index)
    /// is called.
    pub auto_rebuild: bool,

    /// Build the index while opening an existing database.
    ///
    /// When `false`, searches fail with `IndexNotBuilt` until the first
    /// explicit rebuild.
    pub rebuild_on_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hnsw: HnswConfig::default(),
            cache_size_mb: 64,
            sync_mode: SyncMode::Normal,
            auto_rebuild: true,
            rebuild_on_open: true,
        }
    }
}

impl Config {
    /// Creates a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// Called automatically by `VectorDB::create()` and `VectorDB::open()`.
    ///
    /// # Errors
    /// Returns `ValidationError` if:
    /// - `cache_size_mb` is 0
    /// - the HNSW parameters are invalid (see [`HnswConfig::validate`])
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cache_size_mb == 0 {
            return Err(ValidationError::invalid_field(
                "cache_size_mb",
                "must be greater than 0",
            ));
        }

        self.hnsw.validate()
    }
}

/// HNSW graph construction parameters.
///
/// Defaults follow the usual small-graph settings: `m = 16`,
/// `m_max0 = 2 * m`, `ef_construction = 200`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Neighbors selected per layer on insert, and the degree cap above layer 0.
    pub m: usize,

    /// Degree cap at layer 0 (denser to preserve recall).
    pub m_max0: usize,

    /// Beam width while gathering neighbor candidates during insertion.
    pub ef_construction: usize,

    /// Seed for the layer-sampling RNG. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: 16,
            m_max0: 32,
            ef_construction: 200,
            seed: None,
        }
    }
}

impl HnswConfig {
    /// Validates the graph parameters.
    ///
    /// # Errors
    /// Returns `ValidationError` if:
    /// - `m` is below 2 (the level multiplier is `1 / ln(m)`)
    /// - `m_max0` is smaller than `m`
    /// - `ef_construction` is 0
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.m < 2 {
            return Err(ValidationError::invalid_field("m", "must be at least 2"));
        }

        if self.m_max0 < self.m {
            return Err(ValidationError::invalid_field(
                "m_max0",
                format!("must be at least m ({}), got {}", self.m, self.m_max0),
            ));
        }

        if self.ef_construction == 0 {
            return Err(ValidationError::invalid_field(
                "ef_construction",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Probability threshold for promoting a node one more layer: `1 / ln(m)`.
    #[inline]
    pub fn level_multiplier(&self) -> f64 {
        1.0 / (self.m as f64).ln()
    }

    /// Degree cap for the given layer.
    #[inline]
    pub fn max_degree(&self, layer: usize) -> usize {
        if layer == 0 {
            self.m_max0
        } else {
            self.m
        }
    }
}

/// Durability mode for write operations.
///
/// Controls the trade-off between write performance and crash safety.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// Sync to disk on transaction commit.
    ///
    /// This is the default and recommended setting.
    #[default]
    Normal,

    /// Async sync (faster writes, may lose recent data on crash).
    ///
    /// Useful for bulk loads that can be replayed.
    Fast,

    /// Sync every write with extra verification (slowest, maximum durability).
    Paranoid,
}

impl SyncMode {
    /// Returns true if this mode syncs on every write.
    pub fn is_paranoid(&self) -> bool {
        matches!(self, Self::Paranoid)
    }

    /// Returns true if this mode is async (may lose data on crash).
    pub fn is_fast(&self) -> bool {
        matches!(self, Self::Fast)
    }
}
