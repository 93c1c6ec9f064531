//! Aggregated configuration for the puzzlefit pipeline.
//!
//! Each member crate validates its own config; this type groups them into one
//! serde-friendly structure a host application can deserialize from its
//! config file and validate in one call.

use grid::{GridConfig, GridError};
use matcher::{MatchConfig, MatchError};
use serde::{Deserialize, Serialize};
use store::StoreConfig;
use thiserror::Error;

/// Errors from validating an aggregated configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid: {0}")]
    Grid(#[from] GridError),
    #[error("matcher: {0}")]
    Match(#[from] MatchError),
}

/// Top-level configuration covering every pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PuzzlefitConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub matcher: MatchConfig,
}

impl PuzzlefitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.matcher.validate()?;
        Ok(())
    }
}
