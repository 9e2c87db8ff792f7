//! One open room being edited.
//!
//! `RoomSession` owns the geometry, the placement index, and the room's
//! identity, and keeps the door-blocking rule applied to every edit.
//! All operations run synchronously on the editing thread; the session
//! is exclusively owned, so no locking is involved.

use std::sync::Arc;

use log::debug;

use roomgrid_logic::door::Door;
use roomgrid_logic::geometry::RoomGeometry;
use roomgrid_logic::shape::{ShapeCatalog, ShapeId};

use crate::components::{GridPosition, Spawn};
use crate::error::Result;
use crate::placement::{PlacementId, PlacementIndex};
use crate::registry::{ContentDb, ContentId};

/// Saved cell stacks: (x, y, spawns bottom-first).
pub type CellStacks = Vec<(i32, i32, Vec<Spawn>)>;

/// Stable 64-bit hash of the room name; rock tiling derives its
/// per-cell seeds from this, so it must not vary across sessions.
fn stable_seed(name: &str) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in name.bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

pub struct RoomSession {
    name: String,
    pub room_type: u16,
    pub variant: u16,
    pub subtype: u16,
    pub difficulty: u8,
    pub weight: f32,
    seed: u64,
    catalog: ShapeCatalog,
    geometry: RoomGeometry,
    placements: PlacementIndex,
    db: Arc<ContentDb>,
}

impl RoomSession {
    pub fn new(db: Arc<ContentDb>, name: &str, shape: ShapeId) -> Result<Self> {
        let catalog = ShapeCatalog::builtin();
        let geometry = RoomGeometry::new(&catalog, shape)?;
        let placements = PlacementIndex::new(geometry.width(), geometry.height());
        Ok(Self {
            name: name.to_string(),
            room_type: 1,
            variant: 0,
            subtype: 0,
            difficulty: 1,
            weight: 1.0,
            seed: stable_seed(name),
            catalog,
            geometry,
            placements,
            db,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renaming reseeds the rock pass, exactly as reopening the room
    /// under the new name would.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.seed = stable_seed(name);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Override the autotile seed (reproducing a saved room).
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    pub fn geometry(&self) -> &RoomGeometry {
        &self.geometry
    }

    pub fn placements(&self) -> &PlacementIndex {
        &self.placements
    }

    pub(crate) fn placements_mut(&mut self) -> &mut PlacementIndex {
        &mut self.placements
    }

    pub fn db(&self) -> &ContentDb {
        &self.db
    }

    pub fn doors(&self) -> &[Door] {
        &self.geometry.doors
    }

    // ── Editing ─────────────────────────────────────────────────────

    /// Programmatic insert; out-of-range coordinates are reported, not
    /// clamped. Grid content lands at the bottom of the stack.
    pub fn place(&mut self, key: ContentId, x: i32, y: i32) -> Result<Option<PlacementId>> {
        let depth = if self.db.is_grid_exclusive(key) { 0 } else { -1 };
        self.insert_spawn(Spawn::new(key), x, y, depth, false)
    }

    /// Interactive insert: coordinates clamp to the grid, and with
    /// `snap` enabled boundary-violating cells snap back inside first.
    pub fn paint(&mut self, key: ContentId, x: i32, y: i32, snap: bool) -> Option<PlacementId> {
        let (w, h) = (self.placements.width(), self.placements.height());
        let mut x = x.clamp(0, w - 1);
        let mut y = y.clamp(0, h - 1);
        if snap {
            let (sx, sy) = self.geometry.snap_to_bounds(x, y, 1);
            x = sx.clamp(0, w - 1);
            y = sy.clamp(0, h - 1);
        }
        let depth = if self.db.is_grid_exclusive(key) { 0 } else { -1 };
        self.insert_spawn(Spawn::new(key), x, y, depth, false)
            .ok()
            .flatten()
    }

    fn insert_spawn(
        &mut self,
        spawn: Spawn,
        x: i32,
        y: i32,
        depth: i32,
        count_only: bool,
    ) -> Result<Option<PlacementId>> {
        let exclusive = self.db.is_grid_exclusive(spawn.key);
        let id = self.placements.insert(spawn, x, y, depth, exclusive)?;
        if id.is_some() {
            self.door_delta(spawn.key, x, y, true, count_only);
            debug!("placed {} at ({x}, {y})", spawn.key);
        }
        Ok(id)
    }

    /// Move a placement; coordinates clamp, the item lands topmost at
    /// its destination.
    pub fn move_item(
        &mut self,
        id: PlacementId,
        x: i32,
        y: i32,
    ) -> Option<(GridPosition, GridPosition)> {
        let key = self.placements.spawn_data(id)?.key;
        let (old, new) = self.placements.move_to(id, x, y, -1)?;
        if (old.x, old.y) != (new.x, new.y) {
            self.door_delta(key, old.x, old.y, false, false);
            self.door_delta(key, new.x, new.y, true, false);
        }
        Some((old, new))
    }

    /// Adjust one placement's weight from the stack popup.
    pub fn set_weight(&mut self, id: PlacementId, weight: f32) -> bool {
        self.placements.set_weight(id, weight)
    }

    pub fn delete(&mut self, id: PlacementId) -> Option<(GridPosition, Spawn)> {
        let (pos, spawn) = self.placements.remove(id)?;
        self.door_delta(spawn.key, pos.x, pos.y, false, false);
        debug!("deleted {} at ({}, {})", spawn.key, pos.x, pos.y);
        Some((pos, spawn))
    }

    fn door_delta(&mut self, key: ContentId, x: i32, y: i32, arriving: bool, count_only: bool) {
        if !self.db.blocks_door(key) {
            return;
        }
        if let Some((sx, sy)) = self.geometry.blocking_slot(x, y) {
            if let Some(i) = self.geometry.door_at(sx, sy) {
                self.geometry.doors[i].record_occupancy(arriving, count_only);
            }
        }
    }

    // ── Doors ───────────────────────────────────────────────────────

    /// User toggle of the door at a slot position. Returns the new open
    /// flag.
    pub fn toggle_door(&mut self, x: i32, y: i32) -> Option<bool> {
        let i = self.geometry.door_at(x, y)?;
        self.geometry.doors[i].toggle();
        debug!("door ({x}, {y}) toggled to {}", self.geometry.doors[i].exists);
        Some(self.geometry.doors[i].exists)
    }

    /// Restore a door's open flag from saved state (no rule applied).
    pub fn set_door_open(&mut self, x: i32, y: i32, open: bool) -> bool {
        match self.geometry.door_at(x, y) {
            Some(i) => {
                self.geometry.doors[i].exists = open;
                true
            }
            None => false,
        }
    }

    // ── Bulk state ──────────────────────────────────────────────────

    /// Snapshot of every occupied cell, bottom-first.
    pub fn collect_stacks(&self) -> CellStacks {
        self.placements
            .iter_cells()
            .map(|(x, y, stack)| {
                let spawns = stack
                    .iter()
                    .filter_map(|&e| self.placements.spawn_data(e))
                    .collect();
                (x, y, spawns)
            })
            .collect()
    }

    /// Replace all placements from saved stacks. Blocking counts are
    /// rebuilt from scratch in count-only mode, so door open flags
    /// survive untouched — re-deriving the same room must not re-close
    /// anything.
    pub fn load_stacks(&mut self, stacks: CellStacks) {
        self.rebuild(stacks);
    }

    /// Change the room shape. Stacks outside the new grid are dropped;
    /// doors reset to the new shape's defaults.
    pub fn set_shape(&mut self, id: ShapeId) -> Result<()> {
        let saved = self.collect_stacks();
        self.geometry.set_shape(&self.catalog, id)?;
        self.rebuild(saved);
        debug!("room reshaped to {id}");
        Ok(())
    }

    /// Mirror the room horizontally: stacks and doors reflect across
    /// the vertical midline, directional content swaps through the
    /// registry's mirror ids, and L/r shapes flip to their declared
    /// counterparts.
    pub fn mirror_x(&mut self) -> Result<()> {
        self.mirror(false)
    }

    /// Mirror the room vertically.
    pub fn mirror_y(&mut self) -> Result<()> {
        self.mirror(true)
    }

    fn mirror(&mut self, vertical: bool) -> Result<()> {
        let (w, h) = (self.geometry.width(), self.geometry.height());

        let saved: CellStacks = self
            .collect_stacks()
            .into_iter()
            .map(|(x, y, stack)| {
                let (mx, my) = if vertical {
                    (x, h - 1 - y)
                } else {
                    (w - 1 - x, y)
                };
                let spawns = stack
                    .into_iter()
                    .map(|mut s| {
                        if let Some(m) = self.db.mirrored(s.key, vertical) {
                            s.key = m;
                        }
                        s
                    })
                    .collect();
                (mx, my, spawns)
            })
            .collect();

        let mut doors = self.geometry.doors.clone();
        for d in &mut doors {
            if vertical {
                d.y = h - 1 - d.y;
            } else {
                d.x = w - 1 - d.x;
            }
        }

        let mirrored_shape = if vertical {
            self.geometry.shape().mirror_y
        } else {
            self.geometry.shape().mirror_x
        };
        if let Some(m) = mirrored_shape {
            self.geometry.set_shape(&self.catalog, m)?;
        }
        // keep the reflected doors, open flags included
        self.geometry.doors = doors;
        self.rebuild(saved);
        Ok(())
    }

    /// Rebuild the placement index from stacks, re-deriving blocking
    /// counts without touching door open flags.
    fn rebuild(&mut self, saved: CellStacks) {
        let (w, h) = (self.geometry.width(), self.geometry.height());
        self.placements = PlacementIndex::new(w, h);
        for d in &mut self.geometry.doors {
            d.blocking_count = 0;
        }
        for (x, y, stack) in saved {
            if x < 0 || x >= w || y < 0 || y >= h {
                continue;
            }
            for spawn in stack {
                let _ = self.insert_spawn(spawn, x, y, -1, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ContentDef;

    fn test_db() -> Arc<ContentDb> {
        let mut db = ContentDb::new();
        db.insert(ContentDef {
            kind: 1000,
            variant: 0,
            subtype: 0,
            name: "Rock".into(),
            image: "rocks.png".into(),
            is_grid: true,
            blocks_door: true,
            pit_tiling: false,
            rock_tiling: true,
            extra_pit_frames: false,
            mirror_x: None,
            mirror_y: None,
            place_visual: None,
        });
        db.insert(ContentDef {
            kind: 5,
            variant: 100,
            subtype: 0,
            name: "Collectible".into(),
            image: "collectible.png".into(),
            is_grid: false,
            blocks_door: false,
            pit_tiling: false,
            rock_tiling: false,
            extra_pit_frames: false,
            mirror_x: None,
            mirror_y: None,
            place_visual: None,
        });
        db.insert(ContentDef {
            kind: 306,
            variant: 0,
            subtype: 0,
            name: "Leftward".into(),
            image: "leftward.png".into(),
            is_grid: false,
            blocks_door: true,
            pit_tiling: false,
            rock_tiling: false,
            extra_pit_frames: false,
            mirror_x: Some(ContentId::new(306, 1, 0)),
            mirror_y: None,
            place_visual: None,
        });
        Arc::new(db)
    }

    const ROCK: ContentId = ContentId::new(1000, 0, 0);
    const PICKUP: ContentId = ContentId::new(5, 100, 0);
    const LEFTWARD: ContentId = ContentId::new(306, 0, 0);

    fn door_at(room: &RoomSession, x: i32, y: i32) -> &Door {
        let i = room.geometry().door_at(x, y).unwrap();
        &room.doors()[i]
    }

    #[test]
    fn test_door_blocking_lifecycle() {
        let mut room = RoomSession::new(test_db(), "blocking", 1).unwrap();
        // (7,1) is the blocking cell of the top door (7,0)
        let id = room.place(ROCK, 7, 1).unwrap().unwrap();
        let door = door_at(&room, 7, 0);
        assert_eq!((door.blocking_count, door.exists), (1, false));

        room.delete(id).unwrap();
        let door = door_at(&room, 7, 0);
        assert_eq!((door.blocking_count, door.exists), (0, false));

        assert_eq!(room.toggle_door(7, 0), Some(true));
        room.place(ROCK, 7, 1).unwrap().unwrap();
        assert!(!door_at(&room, 7, 0).exists);
    }

    #[test]
    fn test_non_blocking_content_leaves_doors_alone() {
        let mut room = RoomSession::new(test_db(), "pickup", 1).unwrap();
        room.place(PICKUP, 7, 1).unwrap().unwrap();
        let door = door_at(&room, 7, 0);
        assert_eq!((door.blocking_count, door.exists), (0, true));
    }

    #[test]
    fn test_move_transfers_blocking() {
        let mut room = RoomSession::new(test_db(), "mover", 1).unwrap();
        let id = room.place(LEFTWARD, 7, 1).unwrap().unwrap();
        assert!(!door_at(&room, 7, 0).exists);

        // move onto the left door's blocking cell (1,4)
        room.toggle_door(7, 0);
        room.move_item(id, 1, 4).unwrap();
        assert_eq!(door_at(&room, 7, 0).blocking_count, 0);
        assert!(door_at(&room, 7, 0).exists);
        let left = door_at(&room, 0, 4);
        assert_eq!((left.blocking_count, left.exists), (1, false));
    }

    #[test]
    fn test_paint_clamps_and_snaps() {
        let mut room = RoomSession::new(test_db(), "painter", 1).unwrap();
        let id = room.paint(PICKUP, 200, 200, true).unwrap();
        let pos = room.placements().position(id).unwrap();
        assert!(room.geometry().is_in_bounds(pos.x, pos.y));
    }

    #[test]
    fn test_load_stacks_is_count_only() {
        let mut room = RoomSession::new(test_db(), "respawn", 1).unwrap();
        let stacks = vec![(7, 1, vec![Spawn::new(ROCK)])];
        room.load_stacks(stacks);
        let door = door_at(&room, 7, 0);
        // count recomputed, open flag untouched
        assert_eq!((door.blocking_count, door.exists), (1, true));
    }

    #[test]
    fn test_reshape_drops_out_of_range_stacks() {
        let mut room = RoomSession::new(test_db(), "reshape", 8).unwrap();
        room.place(PICKUP, 20, 12).unwrap().unwrap();
        room.place(PICKUP, 5, 5).unwrap().unwrap();
        room.set_shape(1).unwrap();
        assert_eq!(room.placements().len(), 1);
        assert_eq!(room.placements().stack(5, 5).len(), 1);
        assert_eq!(room.doors().len(), 4);
    }

    #[test]
    fn test_mirror_x_reflects_and_remaps() {
        let mut room = RoomSession::new(test_db(), "mirror", 1).unwrap();
        room.place(LEFTWARD, 2, 4).unwrap().unwrap();
        room.toggle_door(0, 4);
        room.mirror_x().unwrap();

        assert!(room.placements().stack(2, 4).is_empty());
        let stack = room.placements().stack(12, 4);
        assert_eq!(stack.len(), 1);
        let spawn = room.placements().spawn_data(stack[0]).unwrap();
        assert_eq!(spawn.key, ContentId::new(306, 1, 0));

        // the closed left door is now the closed right door
        assert!(!door_at(&room, 14, 4).exists);
        assert!(door_at(&room, 0, 4).exists);
    }

    #[test]
    fn test_mirror_l_room_swaps_shape() {
        let mut room = RoomSession::new(test_db(), "lroom", 9).unwrap();
        room.mirror_x().unwrap();
        assert_eq!(room.geometry().shape_id(), 10);
        // door sets of mirrored shapes line up position-for-position
        for door in room.doors() {
            assert!(
                room.geometry()
                    .shape()
                    .doors
                    .contains(&(door.x, door.y)),
                "door ({}, {})",
                door.x,
                door.y
            );
        }
        room.mirror_x().unwrap();
        assert_eq!(room.geometry().shape_id(), 9);
    }

    #[test]
    fn test_seed_tracks_name() {
        let mut room = RoomSession::new(test_db(), "one", 1).unwrap();
        let original = room.seed();
        room.set_name("two");
        assert_ne!(room.seed(), original);
        room.set_name("one");
        assert_eq!(room.seed(), original);
    }
}
