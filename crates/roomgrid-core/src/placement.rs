//! Per-room placement index.
//!
//! Placements live as entities in a `hecs::World`; the index maps every
//! grid cell to its ordered stack of entity handles. Stack order always
//! equals depth order, and depths stay dense — a cell holding N
//! placements has depths exactly {0..N-1} after every operation.

use hecs::World;
use log::debug;

use crate::components::{Depth, GridExclusive, GridPosition, Spawn, TileScratch};
use crate::error::{Result, RoomError};

/// Most placements one cell can hold; inserts into a full cell are
/// dropped as no-ops.
pub const MAX_STACK_DEPTH: usize = 25;

/// Handle to one placed item.
pub type PlacementId = hecs::Entity;

/// Neighbor spot order: L, R, U, D, UL, DL, UR, DR.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

fn neighbor_spot(dx: i32, dy: i32) -> Option<usize> {
    NEIGHBOR_OFFSETS.iter().position(|&o| o == (dx, dy))
}

pub struct PlacementIndex {
    world: World,
    width: i32,
    height: i32,
    /// Cell -> stack of handles, bottom (depth 0) first.
    cells: Vec<Vec<PlacementId>>,
}

impl PlacementIndex {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            world: World::new(),
            width,
            height,
            cells: vec![Vec::new(); (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_grid(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn cell(&self, x: i32, y: i32) -> usize {
        roomgrid_logic::geometry::grid_index(x, y, self.width) as usize
    }

    /// The stack at a cell, bottom first.
    pub fn stack(&self, x: i32, y: i32) -> &[PlacementId] {
        if self.in_grid(x, y) {
            &self.cells[self.cell(x, y)]
        } else {
            &[]
        }
    }

    /// Insert a placement. `depth < 0` lands on top of the stack;
    /// an explicit depth pushes existing occupants at or above it up by
    /// one (restoring saved state). Full cells and doubled grid content
    /// are silent no-ops; out-of-range coordinates are reported — the
    /// interactive layer clamps before calling, so only programmatic
    /// paths can trip this.
    pub fn insert(
        &mut self,
        spawn: Spawn,
        x: i32,
        y: i32,
        depth: i32,
        grid_exclusive: bool,
    ) -> Result<Option<PlacementId>> {
        if !self.in_grid(x, y) {
            return Err(RoomError::OutOfBoundsPlacement {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let idx = self.cell(x, y);
        if self.cells[idx].len() >= MAX_STACK_DEPTH {
            debug!("cell ({x}, {y}) full, dropping {}", spawn.key);
            return Ok(None);
        }
        if grid_exclusive
            && self.cells[idx]
                .iter()
                .any(|&e| self.world.get::<&GridExclusive>(e).is_ok())
        {
            debug!("cell ({x}, {y}) already holds grid content, dropping {}", spawn.key);
            return Ok(None);
        }

        let slot = if depth < 0 {
            self.cells[idx].len()
        } else {
            (depth as usize).min(self.cells[idx].len())
        };
        for i in slot..self.cells[idx].len() {
            let other = self.cells[idx][i];
            if let Ok(mut d) = self.world.get::<&mut Depth>(other) {
                d.0 += 1;
            }
        }

        let id = self.world.spawn((
            GridPosition { x, y },
            Depth(slot as u32),
            spawn,
            TileScratch::default(),
        ));
        if grid_exclusive {
            let _ = self.world.insert_one(id, GridExclusive);
        }
        self.cells[idx].insert(slot, id);
        Ok(Some(id))
    }

    /// Move a placement. Coordinates are clamped into the grid, never
    /// rejected. The gap at the old cell closes (every deeper occupant
    /// steps down one) and the destination depth resolves exactly as in
    /// [`insert`](Self::insert). Returns the old and new positions, or
    /// `None` for a dead handle.
    pub fn move_to(
        &mut self,
        id: PlacementId,
        x: i32,
        y: i32,
        depth: i32,
    ) -> Option<(GridPosition, GridPosition)> {
        let x = x.clamp(0, self.width - 1);
        let y = y.clamp(0, self.height - 1);

        let old_pos = *self.world.get::<&GridPosition>(id).ok()?;
        let old_depth = self.world.get::<&Depth>(id).ok()?.0;
        let moving = old_pos.x != x || old_pos.y != y;
        if !moving && (depth < 0 || depth as u32 == old_depth) {
            return Some((old_pos, old_pos));
        }

        // detach from the old slot, closing the gap
        let old_idx = self.cell(old_pos.x, old_pos.y);
        let old_slot = self.cells[old_idx].iter().position(|&e| e == id)?;
        self.cells[old_idx].remove(old_slot);
        for i in old_slot..self.cells[old_idx].len() {
            let other = self.cells[old_idx][i];
            if let Ok(mut d) = self.world.get::<&mut Depth>(other) {
                d.0 -= 1;
            }
        }

        let new_idx = self.cell(x, y);
        let slot = if depth < 0 {
            self.cells[new_idx].len()
        } else {
            (depth as usize).min(self.cells[new_idx].len())
        };
        for i in slot..self.cells[new_idx].len() {
            let other = self.cells[new_idx][i];
            if let Ok(mut d) = self.world.get::<&mut Depth>(other) {
                d.0 += 1;
            }
        }
        self.cells[new_idx].insert(slot, id);

        if let Ok(mut pos) = self.world.get::<&mut GridPosition>(id) {
            *pos = GridPosition { x, y };
        }
        if let Ok(mut d) = self.world.get::<&mut Depth>(id) {
            d.0 = slot as u32;
        }
        Some((old_pos, GridPosition { x, y }))
    }

    /// Remove a placement, closing the depth gap it leaves. Returns its
    /// last position and spawn data.
    pub fn remove(&mut self, id: PlacementId) -> Option<(GridPosition, Spawn)> {
        let pos = *self.world.get::<&GridPosition>(id).ok()?;
        let spawn = *self.world.get::<&Spawn>(id).ok()?;
        let idx = self.cell(pos.x, pos.y);
        let slot = self.cells[idx].iter().position(|&e| e == id)?;
        self.cells[idx].remove(slot);
        for i in slot..self.cells[idx].len() {
            let other = self.cells[idx][i];
            if let Ok(mut d) = self.world.get::<&mut Depth>(other) {
                d.0 -= 1;
            }
        }
        let _ = self.world.despawn(id);
        Some((pos, spawn))
    }

    /// Stacks of the eight adjacent cells, ordered
    /// [L, R, U, D, UL, DL, UR, DR]. Cells off the grid come back
    /// empty. Served from the cell index.
    pub fn neighbors(&self, x: i32, y: i32) -> [Vec<PlacementId>; 8] {
        let mut res: [Vec<PlacementId>; 8] = Default::default();
        for (spot, &(dx, dy)) in NEIGHBOR_OFFSETS.iter().enumerate() {
            let (nx, ny) = (x + dx, y + dy);
            if self.in_grid(nx, ny) {
                res[spot] = self.cells[self.cell(nx, ny)].clone();
            }
        }
        res
    }

    /// Same answer as [`neighbors`](Self::neighbors), recomputed by a
    /// direct scan over the arena. The indexed path is a cache; the two
    /// must stay equivalent.
    pub fn neighbors_scan(&self, x: i32, y: i32) -> [Vec<PlacementId>; 8] {
        let mut found: [Vec<(u32, PlacementId)>; 8] = Default::default();
        for (e, (pos, depth)) in self.world.query::<(&GridPosition, &Depth)>().iter() {
            if let Some(spot) = neighbor_spot(pos.x - x, pos.y - y) {
                found[spot].push((depth.0, e));
            }
        }
        found.map(|mut v| {
            v.sort_by_key(|&(d, _)| d);
            v.into_iter().map(|(_, e)| e).collect()
        })
    }

    pub fn position(&self, id: PlacementId) -> Option<GridPosition> {
        self.world.get::<&GridPosition>(id).ok().map(|p| *p)
    }

    pub fn depth(&self, id: PlacementId) -> Option<u32> {
        self.world.get::<&Depth>(id).ok().map(|d| d.0)
    }

    pub fn spawn_data(&self, id: PlacementId) -> Option<Spawn> {
        self.world.get::<&Spawn>(id).ok().map(|s| *s)
    }

    /// Adjust a placement's weight (selection/render metadata).
    pub fn set_weight(&mut self, id: PlacementId, weight: f32) -> bool {
        match self.world.get::<&mut Spawn>(id) {
            Ok(mut s) => {
                s.weight = weight;
                true
            }
            Err(_) => false,
        }
    }

    /// Total number of live placements.
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major iteration over occupied cells: (x, y, stack).
    pub fn iter_cells(&self) -> impl Iterator<Item = (i32, i32, &[PlacementId])> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, stack)| !stack.is_empty())
            .map(move |(idx, stack)| {
                let (x, y) = roomgrid_logic::geometry::grid_coords(idx as i32, width);
                (x, y, stack.as_slice())
            })
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
