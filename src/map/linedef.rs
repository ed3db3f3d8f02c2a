// src/map/linedef.rs
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::map::SideDef;

bitflags! {
    /// LINEDEFS flag word.
    #[derive(Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LineFlags: u16 {
        const BLOCKING       = 0x0001;
        const BLOCK_MONSTERS = 0x0002;
        const TWO_SIDED      = 0x0004;
        const UPPER_UNPEGGED = 0x0008;
        const LOWER_UNPEGGED = 0x0010;
        const SECRET         = 0x0020;
        const BLOCK_SOUND    = 0x0040;
        const NOT_ON_MAP     = 0x0080;
        /// Automap "already seen" bit. The engine sets it at runtime, so it
        /// must never be saved.
        const MAPPED         = 0x0100;
    }
}

/// Which side of a line something refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LineSide {
    Front, // Right side of linedef
    Back,  // Left side of linedef
}

impl LineSide {
    pub fn index(self) -> i16 {
        match self {
            LineSide::Front => 0,
            LineSide::Back => 1,
        }
    }
}

/// An editor line between two vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDef {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub flags: LineFlags,
    #[serde(default)]
    pub special: i32,
    #[serde(default)]
    pub tag: i32,
    pub front: SideDef,
    #[serde(default)]
    pub back: Option<SideDef>,
    /// Tombstone left by the editor so line indices stay stable.
    #[serde(default)]
    pub deleted: bool,
}

impl LineDef {
    /// A one-sided wall.
    pub fn one_sided(start: usize, end: usize, front: SideDef) -> Self {
        LineDef {
            start,
            end,
            flags: LineFlags::BLOCKING,
            special: 0,
            tag: 0,
            front,
            back: None,
            deleted: false,
        }
    }

    /// A line with sides on both faces; the two-sided flag is set to match.
    pub fn two_sided(start: usize, end: usize, front: SideDef, back: SideDef) -> Self {
        LineDef {
            start,
            end,
            flags: LineFlags::TWO_SIDED,
            special: 0,
            tag: 0,
            front,
            back: Some(back),
            deleted: false,
        }
    }

    pub fn is_two_sided(&self) -> bool {
        self.back.is_some()
    }
}
