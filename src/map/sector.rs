// src/map/sector.rs

use serde::{Deserialize, Serialize};

/// A sector definition as carried by each sidedef in the editor.
///
/// The editor has no sector table of its own: every side embeds the full
/// definition, and the serializer folds identical definitions into one
/// SECTORS record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sector {
    /// The floor height (in map units).
    pub floor_height: i32,

    /// The ceiling height (in map units).
    pub ceiling_height: i32,

    /// The name of the floor flat, up to 8 chars.
    pub floor_tex: String,

    /// The name of the ceiling flat, up to 8 chars.
    pub ceiling_tex: String,

    /// Light level (0-255).
    pub light: i32,

    /// Special type (a.k.a. "effect" or "sector type").
    pub special: i32,

    /// Sector tag, used to link linedefs, etc.
    pub tag: i32,
}

impl Sector {
    /// Creates a sector with the given heights and flats, full light and no
    /// special or tag.
    ///
    /// **Example**:
    /// ```
    /// use rusted_nodes::map::Sector;
    /// let s = Sector::new(0, 128, "FLOOR4_8", "CEIL3_5");
    /// assert_eq!(s.light, 255);
    /// ```
    pub fn new(floor_height: i32, ceiling_height: i32, floor_tex: &str, ceiling_tex: &str) -> Self {
        Sector {
            floor_height,
            ceiling_height,
            floor_tex: floor_tex.to_uppercase(),
            ceiling_tex: ceiling_tex.to_uppercase(),
            light: 255,
            special: 0,
            tag: 0,
        }
    }

    pub fn with_tag(mut self, tag: i32) -> Self {
        self.tag = tag;
        self
    }
}
