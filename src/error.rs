// src/error.rs

use std::io;
use thiserror::Error;

/// Errors raised while compiling a level into its lumps.
///
/// The intercept variants mean the side classifier and the intersection math
/// disagree about a segment; the whole build is abandoned when that happens
/// rather than emitting broken geometry.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("intercept: divlines are parallel")]
    ParallelIntercept,

    #[error("intercept: fraction {0} lies outside the segment")]
    InterceptOutside(f64),

    #[error("line {line} references missing vertex {vertex}")]
    MissingVertex { line: usize, vertex: usize },

    #[error("seg refers to line {0}, which is deleted or missing")]
    UnknownLine(usize),

    #[error("level has no lines to build nodes from")]
    EmptyLevel,

    #[error("{what} value {value} does not fit its 16-bit field")]
    FieldOverflow { what: &'static str, value: i64 },

    #[error("blockmap needs {0} words, more than 16-bit offsets can address")]
    BlockmapOverflow(usize),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Errors raised by the editor's flood-fill region picker.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FillError {
    #[error("cannot allocate a {width}x{height} fill grid")]
    GridAllocation { width: i64, height: i64 },

    #[error("fill cell size must be positive, got {0}")]
    BadCellSize(i32),
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;
