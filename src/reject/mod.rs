// src/reject/mod.rs
pub mod chains;
pub mod matrix;
mod reject;

pub use chains::{build_chains, BlockingChain};
pub use matrix::RejectMatrix;
pub use self::reject::{build_reject, sector_boxes, Corridor};
