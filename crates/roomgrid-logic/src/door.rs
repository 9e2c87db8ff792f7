//! Runtime door state and the blocking-occupancy rule.
//!
//! A door is canonical when `exists == (blocking_count == 0)`. The rule
//! only ever closes doors: when a blocking item lands on the door's
//! blocking cell while the door is open and canonical, the door closes.
//! Nothing auto-opens a door — once closed it stays closed until the
//! user toggles it, even after the blocking item leaves. Manual toggles
//! may leave the door non-canonical; that is a valid state, not an
//! error, and it suspends the rule until occupancy changes again.

use serde::{Deserialize, Serialize};

/// One door of a live room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub x: i32,
    pub y: i32,
    /// Open flag, as persisted in room files.
    pub exists: bool,
    /// Number of door-blocking placements currently on the blocking
    /// cell. Derived state; rebuilt on respawn, never persisted.
    #[serde(skip)]
    pub blocking_count: u32,
}

impl Door {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            exists: true,
            blocking_count: 0,
        }
    }

    /// Whether the open flag agrees with the occupancy count.
    pub fn is_canonical(&self) -> bool {
        self.exists == (self.blocking_count == 0)
    }

    /// Record one blocking placement arriving at (`arriving`) or
    /// leaving the blocking cell. With `count_only` (bulk respawn of a
    /// previously saved room) the count is maintained but the open flag
    /// is never touched, so re-deriving the same occupancy cannot close
    /// doors a second time.
    pub fn record_occupancy(&mut self, arriving: bool, count_only: bool) {
        let was_canonical = self.is_canonical();
        if arriving {
            self.blocking_count += 1;
        } else {
            self.blocking_count = self.blocking_count.saturating_sub(1);
        }
        // Only close doors that were open and still following the rule.
        if was_canonical && self.exists && !count_only {
            self.exists = self.blocking_count == 0;
        }
    }

    /// User toggle. Unconditional; not re-validated until the next
    /// occupancy change.
    pub fn toggle(&mut self) {
        self.exists = !self.exists;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_closes_open_canonical_door() {
        let mut door = Door::new(7, 0);
        door.record_occupancy(true, false);
        assert_eq!(door.blocking_count, 1);
        assert!(!door.exists);
    }

    #[test]
    fn test_no_auto_reopen_after_unblocking() {
        let mut door = Door::new(7, 0);
        door.record_occupancy(true, false);
        door.record_occupancy(false, false);
        assert_eq!(door.blocking_count, 0);
        assert!(!door.exists, "doors never reopen on their own");
    }

    #[test]
    fn test_toggle_then_reblock_closes_again() {
        let mut door = Door::new(7, 0);
        door.record_occupancy(true, false);
        door.record_occupancy(false, false);
        door.toggle();
        assert!(door.exists);
        door.record_occupancy(true, false);
        assert!(!door.exists);
    }

    #[test]
    fn test_count_only_preserves_open_flag() {
        let mut door = Door::new(0, 4);
        door.record_occupancy(true, true);
        assert_eq!(door.blocking_count, 1);
        assert!(door.exists, "count-only restore must not close doors");
    }

    #[test]
    fn test_manually_closed_door_ignores_rule() {
        let mut door = Door::new(0, 4);
        door.toggle(); // closed by hand, count still 0 -> non-canonical
        assert!(!door.is_canonical());
        door.record_occupancy(true, false);
        assert!(!door.exists);
        // now count 1 and closed: canonical again
        assert!(door.is_canonical());
    }

    #[test]
    fn test_stacked_blockers_keep_door_closed() {
        let mut door = Door::new(7, 8);
        door.record_occupancy(true, false);
        door.record_occupancy(true, false);
        assert_eq!(door.blocking_count, 2);
        door.record_occupancy(false, false);
        assert_eq!(door.blocking_count, 1);
        assert!(!door.exists);
    }
}
