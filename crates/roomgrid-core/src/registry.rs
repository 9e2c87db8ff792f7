//! Content-definition registry — the engine's view of the entity
//! metadata supplied by the out-of-scope definition layer.
//!
//! The editor itself discovers and merges definitions from game and mod
//! files; this crate only consumes the resulting records. Unknown keys
//! fall back to the same defaults the definition layer uses: items
//! block doors unless declared otherwise, and ids above 999 are grid
//! kinds.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// `type.variant.subtype` triple identifying one content definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentId {
    pub kind: u16,
    pub variant: u16,
    pub subtype: u16,
}

impl ContentId {
    pub const fn new(kind: u16, variant: u16, subtype: u16) -> Self {
        Self {
            kind,
            variant,
            subtype,
        }
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.kind, self.variant, self.subtype)
    }
}

/// Default placement offset for a content kind: either a literal cell
/// fraction or a named rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceVisual {
    Offset { dx: f32, dy: f32 },
    /// Hug the nearest wall segment.
    WallSnap,
}

fn default_true() -> bool {
    true
}

/// One content definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDef {
    pub kind: u16,
    #[serde(default)]
    pub variant: u16,
    #[serde(default)]
    pub subtype: u16,
    pub name: String,
    /// Sprite key; autotiling matches neighbors by this value.
    #[serde(default)]
    pub image: String,
    /// Grid content: at most one per cell, inserted at the stack bottom.
    #[serde(default)]
    pub is_grid: bool,
    #[serde(default = "default_true")]
    pub blocks_door: bool,
    #[serde(default)]
    pub pit_tiling: bool,
    #[serde(default)]
    pub rock_tiling: bool,
    /// The pit sprite sheet is tall enough for the extended rule set.
    #[serde(default)]
    pub extra_pit_frames: bool,
    /// Replacement ids applied when mirroring a room.
    #[serde(default)]
    pub mirror_x: Option<ContentId>,
    #[serde(default)]
    pub mirror_y: Option<ContentId>,
    #[serde(default)]
    pub place_visual: Option<PlaceVisual>,
}

impl ContentDef {
    pub fn id(&self) -> ContentId {
        ContentId::new(self.kind, self.variant, self.subtype)
    }
}

/// Keyed lookup over all known content definitions.
#[derive(Debug, Clone, Default)]
pub struct ContentDb {
    defs: HashMap<ContentId, ContentDef>,
}

impl ContentDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a definition manifest (a JSON array of [`ContentDef`]).
    pub fn from_json(manifest: &str) -> Result<Self, serde_json::Error> {
        let defs: Vec<ContentDef> = serde_json::from_str(manifest)?;
        let mut db = Self::new();
        for def in defs {
            db.insert(def);
        }
        Ok(db)
    }

    pub fn insert(&mut self, def: ContentDef) {
        self.defs.insert(def.id(), def);
    }

    pub fn get(&self, key: ContentId) -> Option<&ContentDef> {
        self.defs.get(&key)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn blocks_door(&self, key: ContentId) -> bool {
        self.get(key).map_or(true, |d| d.blocks_door)
    }

    pub fn is_grid_exclusive(&self, key: ContentId) -> bool {
        self.get(key).map_or(key.kind > 999, |d| d.is_grid)
    }

    pub fn image(&self, key: ContentId) -> Option<&str> {
        self.get(key).map(|d| d.image.as_str())
    }

    /// The id a spawn turns into under an X (or Y) mirror, when the
    /// content is directional.
    pub fn mirrored(&self, key: ContentId, vertical: bool) -> Option<ContentId> {
        self.get(key).and_then(|d| {
            if vertical {
                d.mirror_y
            } else {
                d.mirror_x
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rock_def() -> ContentDef {
        ContentDef {
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
        }
    }

    #[test]
    fn test_lookup_and_defaults() {
        let mut db = ContentDb::new();
        db.insert(rock_def());
        let rock = ContentId::new(1000, 0, 0);
        assert!(db.is_grid_exclusive(rock));
        assert!(db.blocks_door(rock));
        assert_eq!(db.image(rock), Some("rocks.png"));

        // unknown keys: grid when the kind is in the grid range
        assert!(db.is_grid_exclusive(ContentId::new(3000, 0, 0)));
        assert!(!db.is_grid_exclusive(ContentId::new(5, 100, 0)));
        assert!(db.blocks_door(ContentId::new(5, 100, 0)));
    }

    #[test]
    fn test_manifest_round_trip() {
        let manifest = r#"[
            {"kind": 1000, "name": "Rock", "image": "rocks.png",
             "is_grid": true, "rock_tiling": true},
            {"kind": 3000, "name": "Pit", "image": "pits.png",
             "is_grid": true, "pit_tiling": true, "blocks_door": false},
            {"kind": 5, "variant": 100, "name": "Collectible",
             "place_visual": {"offset": {"dx": 0.0, "dy": 0.5}}},
            {"kind": 306, "name": "Host", "place_visual": "wall_snap",
             "mirror_x": {"kind": 306, "variant": 1, "subtype": 0}}
        ]"#;
        let db = ContentDb::from_json(manifest).unwrap();
        assert_eq!(db.len(), 4);
        assert!(!db.blocks_door(ContentId::new(3000, 0, 0)));
        assert_eq!(
            db.get(ContentId::new(5, 100, 0)).unwrap().place_visual,
            Some(PlaceVisual::Offset { dx: 0.0, dy: 0.5 })
        );
        assert_eq!(
            db.get(ContentId::new(306, 0, 0)).unwrap().place_visual,
            Some(PlaceVisual::WallSnap)
        );
        assert_eq!(
            db.mirrored(ContentId::new(306, 0, 0), false),
            Some(ContentId::new(306, 1, 0))
        );
        assert_eq!(db.mirrored(ContentId::new(306, 0, 0), true), None);
    }
}
