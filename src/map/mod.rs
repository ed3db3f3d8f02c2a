// src/map/mod.rs
pub mod linedef;
pub mod sector;
pub mod sidedef;
pub mod thing;
pub mod vertex;

pub use linedef::{LineDef, LineFlags, LineSide};
pub use sector::Sector;
pub use sidedef::SideDef;
pub use thing::Thing;
pub use vertex::Vertex;
