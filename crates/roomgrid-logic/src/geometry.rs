//! Live room geometry — bounds testing, boundary snapping, and
//! door-adjacency queries for one room bound to a catalog shape.
//!
//! The wall tables are cloned from the catalog and immutable; the door
//! list is owned and mutable (open flags, mirroring). Changing shape
//! replaces the geometry wholesale and recomputes the doors from the
//! catalog defaults.

use serde::{Deserialize, Serialize};

use crate::door::Door;
use crate::shape::{Axis, Shape, ShapeCatalog, ShapeError, ShapeId};

/// Cell index of (x, y) in a `w`-wide grid.
pub fn grid_index(x: i32, y: i32, w: i32) -> i32 {
    y * w + x
}

/// Inverse of [`grid_index`].
pub fn grid_coords(idx: i32, w: i32) -> (i32, i32) {
    (idx % w, idx / w)
}

/// Geometry of one live room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomGeometry {
    shape: Shape,
    /// Dimensions of the full placement grid. For closet shapes this is
    /// the base shape's grid; the closet's own dims only describe its
    /// wall envelope.
    grid_dims: (i32, i32),
    /// Owned door state, recomputed from the catalog on shape change.
    pub doors: Vec<Door>,
}

impl RoomGeometry {
    pub fn new(catalog: &ShapeCatalog, id: ShapeId) -> Result<Self, ShapeError> {
        let shape = catalog.get(id)?.clone();
        let grid_dims = match shape.base_shape {
            Some(base) => catalog.get(base)?.dims,
            None => shape.dims,
        };
        let doors = shape.doors.iter().map(|&(x, y)| Door::new(x, y)).collect();
        Ok(Self {
            shape,
            grid_dims,
            doors,
        })
    }

    /// Replace the shape and recompute the door list from the catalog.
    /// Callers drop placements outside the new grid before swapping.
    pub fn set_shape(&mut self, catalog: &ShapeCatalog, id: ShapeId) -> Result<(), ShapeError> {
        *self = Self::new(catalog, id)?;
        Ok(())
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_id(&self) -> ShapeId {
        self.shape.id
    }

    pub fn width(&self) -> i32 {
        self.grid_dims.0
    }

    pub fn height(&self) -> i32 {
        self.grid_dims.1
    }

    pub fn grid_len(&self) -> i32 {
        self.grid_dims.0 * self.grid_dims.1
    }

    /// A point is inside the room unless it sits on the wrong side of
    /// some wall segment whose span covers it.
    pub fn is_in_bounds(&self, x: i32, y: i32) -> bool {
        self.shape.walls_x.iter().all(|w| w.clears(x, y))
            && self.shape.walls_y.iter().all(|w| w.clears(y, x))
    }

    /// Push a boundary-violating point back inside, `dist` cells off
    /// each violated wall. Segments are applied independently in their
    /// declared order; when two disagree the last applied wins, so the
    /// declaration order is load-bearing.
    pub fn snap_to_bounds(&self, x: i32, y: i32, dist: i32) -> (i32, i32) {
        let (mut x, mut y) = (x, y);
        for w in &self.shape.walls_x {
            if !w.clears(x, y) {
                y = w.level + w.dir * dist;
            }
        }
        for w in &self.shape.walls_y {
            if !w.clears(y, x) {
                x = w.level + w.dir * dist;
            }
        }
        (x, y)
    }

    /// The door slot whose blocking cell is (x, y): one cell inward
    /// from the door along its wall's normal. Returns the slot position
    /// as declared by the shape.
    pub fn blocking_slot(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        for dw in &self.shape.door_walls {
            let (dx, dy) = self.shape.doors[dw.door];
            let wall = self.shape.wall(*dw);
            let hit = match dw.axis {
                Axis::X => dx == x && y - dy == wall.dir,
                Axis::Y => dy == y && x - dx == wall.dir,
            };
            if hit {
                return Some((dx, dy));
            }
        }
        None
    }

    /// Index of the live door at the given position, if any. Door lists
    /// are matched by position rather than slot order so that mirrored
    /// door sets still resolve.
    pub fn door_at(&self, x: i32, y: i32) -> Option<usize> {
        self.doors.iter().position(|d| d.x == x && d.y == y)
    }
}
