// src/config.rs
//! Tunables for a level build.
//!
//! Every field has a default matching the classic node builder, so an empty
//! JSON object (`{}`) is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// The first partition search only tries every `n / sample_divisor + 1`-th seg.
    pub sample_divisor: usize,
    /// Grade penalty paid for every seg a partition line would cut.
    pub split_penalty: i32,
    /// Sectors whose bounding box is narrower or shorter than this are never rejected.
    pub reject_min_sector_size: i32,
    /// Edge length, in map units, of a flood-fill grid cell.
    pub fill_cell_size: i32,
    pub build_reject: bool,
    pub build_blockmap: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            sample_divisor: 40,
            split_penalty: 8,
            reject_min_sector_size: 64,
            fill_cell_size: 8,
            build_reject: true,
            build_blockmap: true,
        }
    }
}

impl BuildConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
