//! Error taxonomy of the editing engine.
//!
//! Only genuinely programmatic failures surface as errors: unknown
//! shape ids and out-of-range placements arriving through import paths.
//! Routine user-input boundaries (full stacks, doubled grid content)
//! are silent no-ops, and a door whose open flag disagrees with its
//! occupancy count is a valid state, not an error.

use roomgrid_logic::shape::ShapeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RoomError>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RoomError {
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// Interactive input is clamped before it can get here; imports and
    /// other programmatic callers get the report instead of a silent
    /// clamp.
    #[error("placement at ({x}, {y}) is outside the {width}x{height} room grid")]
    OutOfBoundsPlacement {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
}
