//! Rock-tile pairing — merging adjacent same-image rocks into wider
//! artwork.
//!
//! A rock starts as one of three single-cell base variants. Roughly one
//! cell in four attempts to pair with its right, down, and down-right
//! neighbors; a successful pairing assigns each participant a distinct
//! frame plus a sub-pixel offset so the merged artwork lines up. The
//! seeded sweep itself lives in the engine crate; this module owns the
//! candidate rule and the frame/offset tables.

/// Number of single-cell base variants.
pub const BASE_VARIANTS: u16 = 3;

/// Downward nudge applied to every unpaired rock, in cell fractions.
pub const BASE_OFFSET: (f32, f32) = (0.0, 3.0 / 26.0);

// Offsets that line the halves of merged artwork up with the grid. The
// horizontal pair is intentionally asymmetric; the artwork is not
// centered in its frame.
const LEFT_X: f32 = -0.235;
const RIGHT_X: f32 = 0.21;
const DOWN_Y: f32 = 6.0 / 26.0;

/// A merge grouping, in candidate-build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RockGrouping {
    /// Two cells wide: this rock and its right neighbor.
    Wide,
    /// Two cells tall: this rock and its down neighbor.
    Tall,
    /// Two by two: right, down, and down-right neighbors.
    Quad,
}

/// Build the candidate grouping set from partner availability. A
/// partner is available when a same-image neighbor exists and has not
/// been assigned a frame yet this sweep. `Quad` is only considered when
/// both two-cell groupings are, and the down-right partner is also
/// available.
pub fn pairing_candidates(right: bool, down: bool, down_right: bool) -> Vec<RockGrouping> {
    let mut candidates = Vec::with_capacity(3);
    if right {
        candidates.push(RockGrouping::Wide);
    }
    if down {
        candidates.push(RockGrouping::Tall);
    }
    if candidates.len() == 2 && down_right {
        candidates.push(RockGrouping::Quad);
    }
    candidates
}

/// Frame and visual offset for each participant of a grouping, in
/// anchor, right, down, down-right order.
pub fn grouping_layout(grouping: RockGrouping) -> &'static [(u16, (f32, f32))] {
    match grouping {
        RockGrouping::Wide => &[(3, (LEFT_X, 0.0)), (4, (RIGHT_X, 0.0))],
        RockGrouping::Tall => &[(5, (0.0, 0.0)), (6, (0.0, DOWN_Y))],
        RockGrouping::Quad => &[
            (7, (LEFT_X, 0.0)),
            (8, (RIGHT_X, 0.0)),
            (9, (LEFT_X, DOWN_Y)),
            (10, (RIGHT_X, DOWN_Y)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_partner_only() {
        assert_eq!(
            pairing_candidates(true, false, false),
            vec![RockGrouping::Wide]
        );
        // a free down-right partner alone contributes nothing
        assert_eq!(
            pairing_candidates(true, false, true),
            vec![RockGrouping::Wide]
        );
    }

    #[test]
    fn test_down_partner_only() {
        assert_eq!(
            pairing_candidates(false, true, true),
            vec![RockGrouping::Tall]
        );
    }

    #[test]
    fn test_quad_requires_all_three() {
        assert_eq!(
            pairing_candidates(true, true, true),
            vec![RockGrouping::Wide, RockGrouping::Tall, RockGrouping::Quad]
        );
        assert_eq!(
            pairing_candidates(true, true, false),
            vec![RockGrouping::Wide, RockGrouping::Tall]
        );
    }

    #[test]
    fn test_no_partners_no_candidates() {
        assert!(pairing_candidates(false, false, false).is_empty());
        assert!(pairing_candidates(false, false, true).is_empty());
    }

    #[test]
    fn test_layout_frames_are_distinct() {
        for grouping in [RockGrouping::Wide, RockGrouping::Tall, RockGrouping::Quad] {
            let layout = grouping_layout(grouping);
            let mut frames: Vec<u16> = layout.iter().map(|(f, _)| *f).collect();
            frames.dedup();
            assert_eq!(frames.len(), layout.len());
            // merged frames never collide with the base variants 0..=2
            assert!(frames.iter().all(|f| *f >= BASE_VARIANTS));
        }
    }

    #[test]
    fn test_quad_offsets_tile_the_square() {
        let layout = grouping_layout(RockGrouping::Quad);
        assert_eq!(layout[0].1, (LEFT_X, 0.0));
        assert_eq!(layout[1].1, (RIGHT_X, 0.0));
        assert_eq!(layout[2].1, (LEFT_X, DOWN_Y));
        assert_eq!(layout[3].1, (RIGHT_X, DOWN_Y));
    }
}
