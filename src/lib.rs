// src/lib.rs

pub mod bsp;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod level;
pub mod lumps;
pub mod map;
pub mod reject;

pub use config::BuildConfig;
pub use error::{BuildError, FillError};
pub use level::{compile, BuildStats, CompiledLevel};
