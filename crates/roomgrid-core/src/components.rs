//! Components stored on placement entities.

use serde::{Deserialize, Serialize};

use crate::registry::ContentId;

/// Grid cell a placement occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

/// Z-order within a cell stack. Dense: a cell holding N placements has
/// depths exactly {0..N-1}, and stack order equals depth order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Depth(pub u32);

/// Content identity and per-instance weight, as stored in room files.
/// The weight is render/selection metadata, not geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    pub key: ContentId,
    pub weight: f32,
}

impl Spawn {
    pub fn new(key: ContentId) -> Self {
        Self { key, weight: 1.0 }
    }
}

/// Marker for grid-exclusive content: at most one per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridExclusive;

/// Per-render-pass scratch: the assigned rock frame and visual offset.
/// Never persisted; reset at the start of every full-grid sweep, and a
/// rock frame is cleared by the single render read that consumes it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TileScratch {
    pub rock_frame: Option<u16>,
    pub offset: Option<(f32, f32)>,
}
