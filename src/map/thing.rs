// src/map/thing.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Thing {
    pub x: i32,
    pub y: i32,
    pub angle: i32,
    pub thing_type: i32,
    pub options: i32,
}
