// src/map/sidedef.rs

use serde::{Deserialize, Serialize};

use crate::map::Sector;

/// One side of an editor line: its wall textures, texel offsets and the sector
/// it faces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SideDef {
    /// Horizontal texture offset.
    pub x_offset: i32,

    /// Vertical texture offset.
    pub y_offset: i32,

    /// Upper texture name, up to 8 chars.
    pub upper_tex: String,

    /// Lower texture name, up to 8 chars.
    pub lower_tex: String,

    /// Middle (a.k.a. "mid" or "normal") texture name, up to 8 chars.
    pub mid_tex: String,

    /// The sector this side faces.
    pub sector: Sector,
}

impl SideDef {
    /// A solid wall side: `tex` on the middle, nothing above or below.
    pub fn solid(tex: &str, sector: Sector) -> Self {
        SideDef {
            x_offset: 0,
            y_offset: 0,
            upper_tex: "-".to_string(),
            lower_tex: "-".to_string(),
            mid_tex: tex.to_uppercase(),
            sector,
        }
    }

    /// A see-through side: `tex` above and below, empty middle.
    pub fn window(tex: &str, sector: Sector) -> Self {
        SideDef {
            x_offset: 0,
            y_offset: 0,
            upper_tex: tex.to_uppercase(),
            lower_tex: tex.to_uppercase(),
            mid_tex: "-".to_string(),
            sector,
        }
    }
}
