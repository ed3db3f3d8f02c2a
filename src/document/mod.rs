// src/document/mod.rs
mod document;

pub use self::document::{Document, MapSnapshot};
