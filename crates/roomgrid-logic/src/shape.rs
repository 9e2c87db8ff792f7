//! Room shape catalog — the 12 fixed room topologies.
//!
//! Each shape declares grid dimensions (including the one-cell border
//! used for out-of-bounds rendering), its door slots, and the wall
//! segments that bound the playable area. Closet shapes are rendered as
//! a sub-region of a larger base shape and carry a `base_shape` plus a
//! `top_left` grid offset. At catalog build time every door slot is
//! matched to the wall segment it sits on; that precomputed association
//! is the authority for all door-blocking queries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of one of the 12 built-in room shapes.
pub type ShapeId = u8;

/// Number of built-in shapes; valid ids are `1..=SHAPE_COUNT`.
pub const SHAPE_COUNT: u8 = 12;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ShapeError {
    #[error("unknown room shape id {0}")]
    UnknownShape(u8),
}

/// Wall axis. X segments run horizontally and constrain y; Y segments
/// run vertically and constrain x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

/// One wall segment: a span `[span_min, span_max]` along the wall's
/// axis at `level` on the cross axis. `dir` is +1 or -1 and points to
/// the inside of the room along the cross axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallSegment {
    pub span_min: i32,
    pub span_max: i32,
    pub level: i32,
    pub dir: i32,
}

impl WallSegment {
    /// True when the point (`span`, `cross`) is not on the wrong side
    /// of this wall: either the span coordinate falls outside the
    /// segment, or the cross coordinate sits on the inside.
    pub fn clears(&self, span: i32, cross: i32) -> bool {
        span < self.span_min || span > self.span_max || (cross - self.level).signum() == self.dir
    }
}

/// Association of a door slot with the wall segment it lies on,
/// derived once at catalog build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorWall {
    /// Index into [`Shape::doors`].
    pub door: usize,
    /// Axis of the matched wall.
    pub axis: Axis,
    /// Index into the matched axis' segment list.
    pub wall: usize,
}

/// One of the fixed room topologies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    /// Width and height of the shape's wall envelope, border included.
    pub dims: (i32, i32),
    /// Door slots in declared order; every slot defaults to open.
    pub doors: Vec<(i32, i32)>,
    pub walls_x: Vec<WallSegment>,
    pub walls_y: Vec<WallSegment>,
    /// For closets: the larger shape whose grid this one renders over.
    pub base_shape: Option<ShapeId>,
    /// Grid index of this shape's top-left cell within the base grid.
    pub top_left: Option<i32>,
    pub mirror_x: Option<ShapeId>,
    pub mirror_y: Option<ShapeId>,
    /// Door-to-wall association, in door order.
    pub door_walls: Vec<DoorWall>,
}

impl Shape {
    fn new(
        id: ShapeId,
        dims: (i32, i32),
        doors: &[(i32, i32)],
        walls_x: &[(i32, i32, i32, i32)],
        walls_y: &[(i32, i32, i32, i32)],
    ) -> Self {
        let seg = |&(span_min, span_max, level, dir): &(i32, i32, i32, i32)| WallSegment {
            span_min,
            span_max,
            level,
            dir,
        };
        Self {
            id,
            dims,
            doors: doors.to_vec(),
            walls_x: walls_x.iter().map(seg).collect(),
            walls_y: walls_y.iter().map(seg).collect(),
            base_shape: None,
            top_left: None,
            mirror_x: None,
            mirror_y: None,
            door_walls: Vec::new(),
        }
    }

    /// Match every door slot to the wall segment it lies on. X segments
    /// are scanned first and stop at the first hit; Y segments are
    /// scanned after. The shape data guarantees at most one match per
    /// door overall.
    fn associate_doors(&mut self) {
        for (d, &(dx, dy)) in self.doors.iter().enumerate() {
            for (w, wall) in self.walls_x.iter().enumerate() {
                if dx >= wall.span_min && dx <= wall.span_max && dy == wall.level {
                    self.door_walls.push(DoorWall {
                        door: d,
                        axis: Axis::X,
                        wall: w,
                    });
                    break;
                }
            }
            for (w, wall) in self.walls_y.iter().enumerate() {
                if dy >= wall.span_min && dy <= wall.span_max && dx == wall.level {
                    self.door_walls.push(DoorWall {
                        door: d,
                        axis: Axis::Y,
                        wall: w,
                    });
                }
            }
        }
    }

    /// The wall segment referenced by a [`DoorWall`] entry.
    pub fn wall(&self, dw: DoorWall) -> WallSegment {
        match dw.axis {
            Axis::X => self.walls_x[dw.wall],
            Axis::Y => self.walls_y[dw.wall],
        }
    }
}

/// Immutable table of all built-in shapes.
#[derive(Debug, Clone)]
pub struct ShapeCatalog {
    shapes: Vec<Shape>,
}

impl ShapeCatalog {
    /// Build the catalog of the 12 built-in shapes and derive every
    /// door-to-wall association. Deterministic and order independent.
    pub fn builtin() -> Self {
        let mut shapes = vec![
            // 1x1
            Shape::new(
                1,
                (15, 9),
                &[(7, 0), (0, 4), (14, 4), (7, 8)],
                &[(0, 14, 0, 1), (0, 14, 8, -1)],
                &[(0, 8, 0, 1), (0, 8, 14, -1)],
            ),
            // horizontal closet (1x0.5)
            Shape {
                top_left: Some(30),
                base_shape: Some(1),
                ..Shape::new(
                    2,
                    (15, 5),
                    &[(0, 4), (14, 4)],
                    &[(0, 14, 2, 1), (0, 14, 6, -1)],
                    &[(2, 6, 0, 1), (2, 6, 14, -1)],
                )
            },
            // vertical closet (0.5x1)
            Shape {
                top_left: Some(4),
                base_shape: Some(1),
                ..Shape::new(
                    3,
                    (7, 9),
                    &[(7, 0), (7, 8)],
                    &[(4, 10, 0, 1), (4, 10, 8, -1)],
                    &[(0, 8, 4, 1), (0, 8, 10, -1)],
                )
            },
            // 1x2
            Shape::new(
                4,
                (15, 16),
                &[(7, 0), (14, 4), (0, 4), (14, 11), (0, 11), (7, 15)],
                &[(0, 14, 0, 1), (0, 14, 15, -1)],
                &[(0, 15, 0, 1), (0, 15, 14, -1)],
            ),
            // tall closet (0.5x2)
            Shape {
                top_left: Some(4),
                base_shape: Some(4),
                ..Shape::new(
                    5,
                    (7, 16),
                    &[(7, 0), (7, 15)],
                    &[(4, 10, 0, 1), (4, 10, 15, -1)],
                    &[(0, 15, 4, 1), (0, 15, 10, -1)],
                )
            },
            // 2x1
            Shape::new(
                6,
                (28, 9),
                &[(7, 0), (0, 4), (7, 8), (20, 8), (27, 4), (20, 0)],
                &[(0, 27, 0, 1), (0, 27, 8, -1)],
                &[(0, 8, 0, 1), (0, 8, 27, -1)],
            ),
            // wide closet (2x0.5)
            Shape {
                top_left: Some(56),
                base_shape: Some(6),
                ..Shape::new(
                    7,
                    (28, 5),
                    &[(0, 4), (27, 4)],
                    &[(0, 27, 2, 1), (0, 27, 6, -1)],
                    &[(2, 6, 0, 1), (2, 6, 27, -1)],
                )
            },
            // 2x2
            Shape::new(
                8,
                (28, 16),
                &[
                    (7, 0),
                    (0, 4),
                    (0, 11),
                    (20, 0),
                    (7, 15),
                    (20, 15),
                    (27, 4),
                    (27, 11),
                ],
                &[(0, 27, 0, 1), (0, 27, 15, -1)],
                &[(0, 15, 0, 1), (0, 15, 27, -1)],
            ),
            // mirrored L
            Shape {
                base_shape: Some(8),
                mirror_x: Some(10),
                mirror_y: Some(11),
                ..Shape::new(
                    9,
                    (28, 16),
                    &[
                        (20, 0),
                        (27, 4),
                        (7, 15),
                        (20, 15),
                        (13, 4),
                        (0, 11),
                        (27, 11),
                        (7, 7),
                    ],
                    &[(0, 13, 7, 1), (13, 27, 0, 1), (0, 27, 15, -1)],
                    &[(7, 15, 0, 1), (0, 7, 13, 1), (0, 15, 27, -1)],
                )
            },
            // L
            Shape {
                base_shape: Some(8),
                mirror_x: Some(9),
                mirror_y: Some(12),
                ..Shape::new(
                    10,
                    (28, 16),
                    &[
                        (0, 4),
                        (14, 4),
                        (7, 0),
                        (20, 7),
                        (7, 15),
                        (20, 15),
                        (0, 11),
                        (27, 11),
                    ],
                    &[(0, 14, 0, 1), (14, 27, 7, 1), (0, 27, 15, -1)],
                    &[(0, 15, 0, 1), (0, 7, 14, -1), (7, 15, 27, -1)],
                )
            },
            // mirrored r
            Shape {
                base_shape: Some(8),
                mirror_x: Some(12),
                mirror_y: Some(9),
                ..Shape::new(
                    11,
                    (28, 16),
                    &[
                        (0, 4),
                        (7, 8),
                        (7, 0),
                        (13, 11),
                        (20, 0),
                        (27, 4),
                        (20, 15),
                        (27, 11),
                    ],
                    &[(0, 27, 0, 1), (0, 13, 8, -1), (13, 27, 15, -1)],
                    &[(0, 8, 0, 1), (8, 15, 13, 1), (0, 15, 27, -1)],
                )
            },
            // r
            Shape {
                base_shape: Some(8),
                mirror_x: Some(11),
                mirror_y: Some(10),
                ..Shape::new(
                    12,
                    (28, 16),
                    &[
                        (0, 4),
                        (7, 0),
                        (20, 0),
                        (14, 11),
                        (27, 4),
                        (7, 15),
                        (0, 11),
                        (20, 8),
                    ],
                    &[(0, 27, 0, 1), (14, 27, 8, -1), (0, 14, 15, -1)],
                    &[(0, 15, 0, 1), (8, 15, 14, -1), (0, 8, 27, -1)],
                )
            },
        ];

        for shape in &mut shapes {
            shape.associate_doors();
        }

        Self { shapes }
    }

    pub fn get(&self, id: ShapeId) -> Result<&Shape, ShapeError> {
        if (1..=SHAPE_COUNT).contains(&id) {
            Ok(&self.shapes[id as usize - 1])
        } else {
            Err(ShapeError::UnknownShape(id))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }
}
