//! Roomgrid Headless Validation Harness
//!
//! Exercises the spatial engine end to end without a UI or room files:
//! shape catalog audit, placement invariant sweeps, door blocking
//! walkthroughs, and autotile spot checks.
//!
//! Usage:
//!   cargo run -p roomgrid-simtest
//!   cargo run -p roomgrid-simtest -- --verbose

use std::sync::Arc;

use roomgrid_core::{resolve_room, ContentDb, ContentId, RoomSession, Spawn, MAX_STACK_DEPTH};
use roomgrid_logic::geometry::{grid_coords, grid_index, RoomGeometry};
use roomgrid_logic::pit::{pit_frame, PitNeighbors};
use roomgrid_logic::shape::{ShapeCatalog, SHAPE_COUNT};

// ── Content manifest (same JSON the editor ships) ───────────────────────
const MANIFEST_JSON: &str = include_str!("../../../data/content_manifest.json");

const ROCK: ContentId = ContentId::new(1000, 0, 0);
const PIT: ContentId = ContentId::new(3000, 0, 0);
const SPIKES: ContentId = ContentId::new(1930, 0, 0);
const PICKUP: ContentId = ContentId::new(5, 100, 0);
const SIDEWINDER_L: ContentId = ContentId::new(213, 0, 0);
const SIDEWINDER_R: ContentId = ContentId::new(213, 1, 0);

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail,
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Roomgrid Validation Harness ===\n");

    let db = match ContentDb::from_json(MANIFEST_JSON) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("manifest parse error: {e}");
            std::process::exit(1);
        }
    };

    let mut results = Vec::new();

    // 1. Shape catalog audit
    results.extend(validate_shape_catalog());

    // 2. Grid index arithmetic
    results.extend(validate_grid_index());

    // 3. Placement stacking invariants
    results.extend(validate_stacking(&db));

    // 4. Door blocking walkthrough
    results.extend(validate_door_blocking(&db));

    // 5. Autotile resolution
    results.extend(validate_autotiling(&db));

    // 6. Reshape and mirroring
    results.extend(validate_room_transforms(&db));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Shape catalog ────────────────────────────────────────────────────

fn validate_shape_catalog() -> Vec<TestResult> {
    println!("--- Shape Catalog ---");
    let mut results = Vec::new();
    let catalog = ShapeCatalog::builtin();

    let mut unmatched = Vec::new();
    let mut door_total = 0;
    for shape in catalog.iter() {
        door_total += shape.doors.len();
        if shape.door_walls.len() != shape.doors.len() {
            unmatched.push(shape.id);
        }
    }
    results.push(check(
        "shapes_doors_on_walls",
        unmatched.is_empty(),
        format!("{door_total} doors across {SHAPE_COUNT} shapes, unmatched in {unmatched:?}"),
    ));

    // every blocking cell is in bounds of its own room
    let mut bad_blocking = Vec::new();
    for shape in catalog.iter() {
        let geometry = RoomGeometry::new(&catalog, shape.id).unwrap();
        for door in &shape.doors {
            let found = (0..geometry.height()).any(|y| {
                (0..geometry.width()).any(|x| geometry.blocking_slot(x, y) == Some(*door))
            });
            if !found {
                bad_blocking.push((shape.id, *door));
            }
        }
    }
    results.push(check(
        "shapes_blocking_cells_resolve",
        bad_blocking.is_empty(),
        format!("unresolvable blocking cells: {bad_blocking:?}"),
    ));

    results.push(check(
        "shapes_reject_out_of_range",
        catalog.get(0).is_err() && catalog.get(13).is_err(),
        "ids outside 1..=12 rejected".into(),
    ));

    results
}

// ── 2. Grid index ───────────────────────────────────────────────────────

fn validate_grid_index() -> Vec<TestResult> {
    println!("--- Grid Index ---");
    let mut bad = 0;
    for w in [7, 15, 28] {
        for y in 0..16 {
            for x in 0..w {
                if grid_coords(grid_index(x, y, w), w) != (x, y) {
                    bad += 1;
                }
            }
        }
    }
    vec![check(
        "grid_index_round_trip",
        bad == 0,
        format!("{bad} coordinates failed to round-trip"),
    )]
}

// ── 3. Stacking ─────────────────────────────────────────────────────────

fn depths_at(room: &RoomSession, x: i32, y: i32) -> Vec<u32> {
    room.placements()
        .stack(x, y)
        .iter()
        .map(|&e| room.placements().depth(e).unwrap_or(u32::MAX))
        .collect()
}

fn validate_stacking(db: &Arc<ContentDb>) -> Vec<TestResult> {
    println!("--- Placement Stacking ---");
    let mut results = Vec::new();

    let mut room = RoomSession::new(db.clone(), "stacking", 1).unwrap();
    for _ in 0..10 {
        room.place(PICKUP, 5, 5).unwrap();
    }
    results.push(check(
        "stack_depths_dense",
        depths_at(&room, 5, 5) == (0..10).collect::<Vec<u32>>(),
        format!("depths after 10 inserts: {:?}", depths_at(&room, 5, 5)),
    ));

    let before = depths_at(&room, 5, 5);
    let id = room.place(PICKUP, 5, 5).unwrap().unwrap();
    room.delete(id).unwrap();
    results.push(check(
        "stack_insert_remove_restores",
        depths_at(&room, 5, 5) == before,
        "insert-then-remove restored the depth set".into(),
    ));

    let mut full = RoomSession::new(db.clone(), "ceiling", 1).unwrap();
    for _ in 0..MAX_STACK_DEPTH {
        full.place(PICKUP, 2, 2).unwrap();
    }
    let overflow = full.place(PICKUP, 2, 2).unwrap();
    results.push(check(
        "stack_ceiling_holds",
        overflow.is_none() && full.placements().stack(2, 2).len() == MAX_STACK_DEPTH,
        format!("26th insert rejected, {} in cell", full.placements().stack(2, 2).len()),
    ));

    // grid content cannot double up, and programmatic out-of-range is an error
    let doubled = full.place(ROCK, 3, 3).unwrap().is_some() && full.place(ROCK, 3, 3).unwrap().is_none();
    results.push(check(
        "stack_grid_exclusive",
        doubled,
        "second grid item in a cell dropped".into(),
    ));
    results.push(check(
        "stack_out_of_bounds_reported",
        full.place(PICKUP, 40, 2).is_err(),
        "import-path insert outside the grid errors".into(),
    ));

    // neighbor cache equals a fresh scan on a busy grid
    let mut busy = RoomSession::new(db.clone(), "busy", 1).unwrap();
    for (x, y) in [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1), (1, 2)] {
        for _ in 0..2 {
            busy.place(PICKUP, x, y).unwrap();
        }
    }
    let mut mismatches = 0;
    for y in 0..busy.placements().height() {
        for x in 0..busy.placements().width() {
            if busy.placements().neighbors(x, y) != busy.placements().neighbors_scan(x, y) {
                mismatches += 1;
            }
        }
    }
    results.push(check(
        "stack_neighbor_cache_equivalence",
        mismatches == 0,
        format!("{mismatches} cells disagreed between cache and scan"),
    ));

    results
}

// ── 4. Door blocking ────────────────────────────────────────────────────

fn validate_door_blocking(db: &Arc<ContentDb>) -> Vec<TestResult> {
    println!("--- Door Blocking ---");
    let mut results = Vec::new();

    let mut room = RoomSession::new(db.clone(), "doors", 1).unwrap();
    let top = |room: &RoomSession| {
        let i = room.geometry().door_at(7, 0).unwrap();
        let d = &room.doors()[i];
        (d.blocking_count, d.exists)
    };

    let id = room.place(ROCK, 7, 1).unwrap().unwrap();
    let after_block = top(&room);
    room.delete(id).unwrap();
    let after_clear = top(&room);
    room.toggle_door(7, 0);
    let after_toggle = top(&room);
    room.place(ROCK, 7, 1).unwrap().unwrap();
    let after_reblock = top(&room);

    results.push(check(
        "door_auto_close",
        after_block == (1, false),
        format!("after blocking: {after_block:?}"),
    ));
    results.push(check(
        "door_no_auto_reopen",
        after_clear == (0, false),
        format!("after clearing: {after_clear:?}"),
    ));
    results.push(check(
        "door_manual_reopen_then_reblock",
        after_toggle == (0, true) && after_reblock == (1, false),
        format!("toggle {after_toggle:?} -> reblock {after_reblock:?}"),
    ));

    // non-blockers leave doors alone
    let mut quiet = RoomSession::new(db.clone(), "quiet", 1).unwrap();
    quiet.place(SPIKES, 7, 1).unwrap().unwrap();
    results.push(check(
        "door_ignores_non_blockers",
        {
            let i = quiet.geometry().door_at(7, 0).unwrap();
            quiet.doors()[i].exists && quiet.doors()[i].blocking_count == 0
        },
        "spikes do not block doors".into(),
    ));

    // count-only restore keeps saved open flags
    let mut restored = RoomSession::new(db.clone(), "restored", 1).unwrap();
    restored.load_stacks(vec![(7, 1, vec![Spawn::new(ROCK)])]);
    let i = restored.geometry().door_at(7, 0).unwrap();
    results.push(check(
        "door_count_only_restore",
        restored.doors()[i].blocking_count == 1 && restored.doors()[i].exists,
        "respawn recounts without closing".into(),
    ));

    results
}

// ── 5. Autotiling ───────────────────────────────────────────────────────

fn validate_autotiling(db: &Arc<ContentDb>) -> Vec<TestResult> {
    println!("--- Autotiling ---");
    let mut results = Vec::new();

    // pit rule table spot checks
    let lone_left = pit_frame(
        PitNeighbors {
            left: true,
            ..Default::default()
        },
        false,
    );
    let ring = pit_frame(
        PitNeighbors {
            left: true,
            up: true,
            right: true,
            down: true,
            up_left: true,
            up_right: true,
            ..Default::default()
        },
        false,
    );
    results.push(check(
        "pit_rule_table",
        lone_left == 1 && ring == 24,
        format!("left-only -> {lone_left}, missing bottom corners -> {ring}"),
    ));

    // a 3x3 pit block resolves every cell without panicking, center is
    // fully surrounded
    let mut pits = RoomSession::new(db.clone(), "pits", 1).unwrap();
    for y in 3..6 {
        for x in 3..6 {
            pits.place(PIT, x, y).unwrap().unwrap();
        }
    }
    let frames = resolve_room(&mut pits);
    let center = frames.iter().find(|f| (f.x, f.y) == (4, 4)).unwrap();
    results.push(check(
        "pit_block_center_surrounded",
        center.frame == 15,
        format!("center of 3x3 pit block -> {}", center.frame),
    ));

    // rock sweep: deterministic, and pairs share merged frames
    let mut rocks = RoomSession::new(db.clone(), "rocks", 1).unwrap();
    rocks.set_seed(0);
    for (x, y) in [(1, 1), (2, 1), (6, 3), (6, 4)] {
        rocks.place(ROCK, x, y).unwrap().unwrap();
    }
    let first = resolve_room(&mut rocks);
    let second = resolve_room(&mut rocks);
    results.push(check(
        "rock_sweep_deterministic",
        first == second,
        "two sweeps with one seed agree".into(),
    ));

    let wide_anchor = first.iter().find(|f| (f.x, f.y) == (1, 1)).unwrap();
    let wide_partner = first.iter().find(|f| (f.x, f.y) == (2, 1)).unwrap();
    results.push(check(
        "rock_horizontal_pairing",
        wide_anchor.frame == 3 && wide_partner.frame == 4,
        format!(
            "cell 16 gate open: frames {} / {}",
            wide_anchor.frame, wide_partner.frame
        ),
    ));

    results
}

// ── 6. Room transforms ──────────────────────────────────────────────────

fn validate_room_transforms(db: &Arc<ContentDb>) -> Vec<TestResult> {
    println!("--- Reshape & Mirror ---");
    let mut results = Vec::new();

    let mut room = RoomSession::new(db.clone(), "transforms", 8).unwrap();
    room.place(SPIKES, 20, 12).unwrap().unwrap();
    room.place(SPIKES, 5, 5).unwrap().unwrap();
    room.set_shape(1).unwrap();
    results.push(check(
        "reshape_drops_out_of_range",
        room.placements().len() == 1 && room.placements().stack(5, 5).len() == 1,
        format!("{} placements survive 2x2 -> 1x1", room.placements().len()),
    ));

    let mut mirrored = RoomSession::new(db.clone(), "mirrored", 1).unwrap();
    mirrored.place(SIDEWINDER_L, 2, 4).unwrap().unwrap();
    mirrored.mirror_x().unwrap();
    let stack = mirrored.placements().stack(12, 4);
    let key = stack
        .first()
        .and_then(|&e| mirrored.placements().spawn_data(e))
        .map(|s| s.key);
    results.push(check(
        "mirror_reflects_and_remaps",
        key == Some(SIDEWINDER_R),
        format!("(2,4) sidewinder became {key:?} at (12,4)"),
    ));

    let mut l_room = RoomSession::new(db.clone(), "l-room", 9).unwrap();
    l_room.mirror_x().unwrap();
    let flipped = l_room.geometry().shape_id();
    l_room.mirror_x().unwrap();
    results.push(check(
        "mirror_l_shapes_round_trip",
        flipped == 10 && l_room.geometry().shape_id() == 9,
        format!("9 -> {flipped} -> {}", l_room.geometry().shape_id()),
    ));

    results
}
