//! Deterministic terrain synthesis: river walks, lakes, tree splashes and
//! the edge-smoothing passes that turn raw plops into a playable map.

use serde::{Deserialize, Serialize};

use crate::grid::{TileGrid, WORLD_H, WORLD_W};
use crate::rng::SimRng;
use crate::tiles::{self, CHANNEL, DIRT, REDGE, RIVER, RIVER_EDGE_LAST, WOODS};

/// Island coastline jitter radius.
const RADIUS: u16 = 18;

/// 8-direction walk table, clockwise from north.
const DIR_TAB: [[i32; 8]; 2] = [[0, 1, 1, 1, 0, -1, -1, -1], [-1, -1, 0, 1, 1, 1, 0, -1]];

/// Big river stamp. Zero cells leave the map untouched.
const BIG_RIVER: [[u16; 9]; 9] = [
    [0, 0, 0, 3, 3, 3, 0, 0, 0],
    [0, 0, 3, 2, 2, 2, 3, 0, 0],
    [0, 3, 2, 2, 2, 2, 2, 3, 0],
    [3, 2, 2, 2, 2, 2, 2, 2, 3],
    [3, 2, 2, 2, 4, 2, 2, 2, 3],
    [3, 2, 2, 2, 2, 2, 2, 2, 3],
    [0, 3, 2, 2, 2, 2, 2, 3, 0],
    [0, 0, 3, 2, 2, 2, 3, 0, 0],
    [0, 0, 0, 3, 3, 3, 0, 0, 0],
];

/// Small river stamp.
const SMALL_RIVER: [[u16; 6]; 6] = [
    [0, 0, 3, 3, 0, 0],
    [0, 3, 2, 2, 3, 0],
    [3, 2, 2, 2, 2, 3],
    [3, 2, 2, 2, 2, 3],
    [0, 3, 2, 2, 3, 0],
    [0, 0, 3, 3, 0, 0],
];

/// River-edge replacement table indexed by the 4-neighbor water mask.
const RIVER_EDGE_TAB: [u16; 16] = [13, 13, 17, 15, 5, 2, 19, 17, 9, 11, 2, 13, 7, 9, 5, 2];

/// Tree-edge replacement table indexed by the 4-neighbor tree mask.
/// Zero entries clear the tree entirely.
const TREE_EDGE_TAB: [u16; 16] = [0, 0, 0, 34, 0, 0, 36, 35, 0, 32, 0, 33, 30, 31, 29, 37];

/// Knobs for terrain synthesis. Negative levels select the classic
/// randomized behavior; zero disables the feature outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// `None` rolls a 10% island chance per map; `Some` forces the choice.
    pub island: Option<bool>,
    /// River curvature. Higher values straighten the walks.
    pub curve_level: i16,
    /// Lake count bias. Zero suppresses lakes.
    pub lake_level: i16,
    /// Tree splash count bias. Zero suppresses trees.
    pub tree_level: i16,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            island: None,
            curve_level: -1,
            lake_level: -1,
            tree_level: -1,
        }
    }
}

/// Current plop position and heading for a river walk.
struct Walk {
    x: i32,
    y: i32,
    dir: i32,
    last_dir: i32,
}

/// Synthesize a full terrain grid from a seed.
pub fn generate(seed: u64, config: &GenerationConfig) -> TileGrid {
    let mut rng = SimRng::new(seed);
    let grid = generate_with(&mut rng, config);
    tracing::debug!(seed, "terrain generated");
    grid
}

/// Same as [`generate`], driven by a caller-owned RNG.
pub fn generate_with(rng: &mut SimRng, config: &GenerationConfig) -> TileGrid {
    let mut grid = TileGrid::new();

    let island = match config.island {
        Some(forced) => forced,
        None => rng.next_int(100) < 10,
    };
    if island {
        make_island(&mut grid, rng, config);
        return grid;
    }

    let start_x = 40 + rng.next_int(WORLD_W as u16 - 80) as i32;
    let start_y = 33 + rng.next_int(WORLD_H as u16 - 67) as i32;

    if config.curve_level != 0 {
        do_rivers(&mut grid, rng, config, start_x, start_y);
    }
    if config.lake_level != 0 {
        make_lakes(&mut grid, rng, config);
    }
    smooth_water(&mut grid);
    smooth_river(&mut grid, rng);
    if config.tree_level != 0 {
        do_trees(&mut grid, rng, config);
    }
    grid
}

// ========================================================================
// Islands
// ========================================================================

/// Flood the map, carve out the central landmass and jitter the coast.
fn make_naked_island(grid: &mut TileGrid, rng: &mut SimRng) {
    grid.for_each_mut(|_, _, tile| *tile = tiles::blueprint(RIVER));
    for x in 5..WORLD_W as i32 - 5 {
        for y in 5..WORLD_H as i32 - 5 {
            // Interior write, always in bounds.
            let _ = grid.place(x, y, DIRT);
        }
    }

    for x in (0..WORLD_W as i32 - 5).step_by(2) {
        let y = edge_rand(rng, RADIUS) as i32;
        big_river_plop(grid, x, y);
        let y = (WORLD_H as i32 - 10) - edge_rand(rng, RADIUS) as i32;
        big_river_plop(grid, x, y);
        small_river_plop(grid, x, 0);
        small_river_plop(grid, x, WORLD_H as i32 - 6);
    }
    for y in (0..WORLD_H as i32 - 5).step_by(2) {
        let x = edge_rand(rng, RADIUS) as i32;
        big_river_plop(grid, x, y);
        let x = (WORLD_W as i32 - 10) - edge_rand(rng, RADIUS) as i32;
        big_river_plop(grid, x, y);
        small_river_plop(grid, 0, y);
        small_river_plop(grid, WORLD_W as i32 - 6, y);
    }
}

fn make_island(grid: &mut TileGrid, rng: &mut SimRng, config: &GenerationConfig) {
    make_naked_island(grid, rng);
    smooth_water(grid);
    smooth_river(grid, rng);
    do_trees(grid, rng, config);
}

/// Edge-biased draw: the minimum of two uniform draws.
fn edge_rand(rng: &mut SimRng, bound: u16) -> u16 {
    let a = rng.next_int(bound);
    let b = rng.next_int(bound);
    a.min(b)
}

// ========================================================================
// Rivers and lakes
// ========================================================================

/// Carve the main river system: two big branches leaving the start point in
/// opposite headings, plus one small tributary.
fn do_rivers(
    grid: &mut TileGrid,
    rng: &mut SimRng,
    config: &GenerationConfig,
    start_x: i32,
    start_y: i32,
) {
    let heading = rng.next_int(3) as i32;
    let mut walk = Walk {
        x: start_x,
        y: start_y,
        dir: heading,
        last_dir: heading,
    };
    run_river(grid, rng, config, &mut walk, true);

    walk.x = start_x;
    walk.y = start_y;
    walk.last_dir ^= 4;
    walk.dir = walk.last_dir;
    run_river(grid, rng, config, &mut walk, true);

    walk.x = start_x;
    walk.y = start_y;
    walk.last_dir = rng.next_int(3) as i32;
    run_river(grid, rng, config, &mut walk, false);
}

/// Walk one river branch until the plop window leaves the map.
fn run_river(
    grid: &mut TileGrid,
    rng: &mut SimRng,
    config: &GenerationConfig,
    walk: &mut Walk,
    big: bool,
) {
    let (r1, r2) = if config.curve_level < 0 {
        (100, 200)
    } else {
        (config.curve_level as u16 + 10, config.curve_level as u16 + 100)
    };
    let margin = if big { 4 } else { 3 };

    while grid.in_bounds(walk.x + margin, walk.y + margin) {
        if big {
            big_river_plop(grid, walk.x, walk.y);
        } else {
            small_river_plop(grid, walk.x, walk.y);
        }
        if rng.next_int(r1) < 10 {
            walk.dir = walk.last_dir;
        } else {
            if rng.next_int(r2) > 90 {
                walk.dir += 1;
            }
            if rng.next_int(r2) > 90 {
                walk.dir -= 1;
            }
        }
        let step = (walk.dir & 7) as usize;
        walk.x += DIR_TAB[0][step];
        walk.y += DIR_TAB[1][step];
    }
}

fn big_river_plop(grid: &mut TileGrid, x: i32, y: i32) {
    for (dy, row) in BIG_RIVER.iter().enumerate() {
        for (dx, &id) in row.iter().enumerate() {
            put_on_map(grid, id, x + dx as i32, y + dy as i32);
        }
    }
}

fn small_river_plop(grid: &mut TileGrid, x: i32, y: i32) {
    for (dy, row) in SMALL_RIVER.iter().enumerate() {
        for (dx, &id) in row.iter().enumerate() {
            put_on_map(grid, id, x + dx as i32, y + dy as i32);
        }
    }
}

/// Stamp one cell, respecting existing water: open river yields only to a
/// channel, and channels are never overwritten.
fn put_on_map(grid: &mut TileGrid, id: u16, x: i32, y: i32) {
    if id == 0 || !grid.in_bounds(x, y) {
        return;
    }
    let existing = grid.get_or_dirt(x, y).id();
    if existing != DIRT {
        if existing == RIVER && id != CHANNEL {
            return;
        }
        if existing == CHANNEL {
            return;
        }
    }
    let _ = grid.place(x, y, id);
}

/// Scatter lake clusters over the interior.
fn make_lakes(grid: &mut TileGrid, rng: &mut SimRng, config: &GenerationConfig) {
    let count = if config.lake_level < 0 {
        rng.next_int(10)
    } else {
        config.lake_level as u16 / 2
    };
    for _ in 0..count {
        let cx = rng.next_int(WORLD_W as u16 - 21) as i32 + 10;
        let cy = rng.next_int(WORLD_H as u16 - 20) as i32 + 10;
        let plops = rng.next_int(12) + 2;
        for _ in 0..plops {
            let x = cx - 6 + rng.next_int(12) as i32;
            let y = cy - 6 + rng.next_int(12) as i32;
            if rng.next_int(4) != 0 {
                small_river_plop(grid, x, y);
            } else {
                big_river_plop(grid, x, y);
            }
        }
    }
}

// ========================================================================
// Trees
// ========================================================================

/// Plant tree clusters at random spots, then smooth their outlines twice.
fn do_trees(grid: &mut TileGrid, rng: &mut SimRng, config: &GenerationConfig) {
    let amount = if config.tree_level < 0 {
        rng.next_int(100) + 50
    } else {
        config.tree_level as u16 + 3
    };
    for _ in 0..amount {
        let x = rng.next_int(WORLD_W as u16 - 1) as i32;
        let y = rng.next_int(WORLD_H as u16 - 1) as i32;
        tree_splash(grid, rng, config, x, y);
    }
    smooth_trees(grid);
    smooth_trees(grid);
}

/// Random walk from the splash point, planting woods on bare dirt.
fn tree_splash(grid: &mut TileGrid, rng: &mut SimRng, config: &GenerationConfig, x: i32, y: i32) {
    let steps = if config.tree_level < 0 {
        rng.next_int(150) + 50
    } else {
        rng.next_int(100 + config.tree_level as u16 * 2) + 50
    };
    let (mut x, mut y) = (x, y);
    for _ in 0..steps {
        let dir = rng.next_int(7) as usize;
        x += DIR_TAB[0][dir];
        y += DIR_TAB[1][dir];
        if !grid.in_bounds(x, y) {
            return;
        }
        if grid.get_or_dirt(x, y).id() == DIRT {
            let _ = grid.place(x, y, WOODS);
        }
    }
}

// ========================================================================
// Smoothing
// ========================================================================

const NEIGHBOR_DX: [i32; 4] = [-1, 0, 1, 0];
const NEIGHBOR_DY: [i32; 4] = [0, 1, 0, -1];

fn is_water_id(id: u16) -> bool {
    (RIVER..=RIVER_EDGE_LAST).contains(&id)
}

/// Replace raw river-edge markers with directional edge tiles chosen by the
/// 4-neighbor mask, with a coin flip between the two variants of each edge.
pub fn smooth_river(grid: &mut TileGrid, rng: &mut SimRng) {
    for x in 0..WORLD_W as i32 {
        for y in 0..WORLD_H as i32 {
            if grid.get_or_dirt(x, y).id() != REDGE {
                continue;
            }
            let mut mask = 0usize;
            for z in 0..4 {
                mask <<= 1;
                let (nx, ny) = (x + NEIGHBOR_DX[z], y + NEIGHBOR_DY[z]);
                if grid.in_bounds(nx, ny) {
                    let id = grid.get_or_dirt(nx, ny).id();
                    if id != DIRT && !grid.get_or_dirt(nx, ny).is_tree() {
                        mask += 1;
                    }
                }
            }
            let mut id = RIVER_EDGE_TAB[mask & 15];
            if id != RIVER && rng.next_int(1) != 0 {
                id += 1;
            }
            let _ = grid.place(x, y, id);
        }
    }
}

/// Replace uniform woods with directional forest-edge tiles; lone trees
/// are cleared outright.
pub fn smooth_trees(grid: &mut TileGrid) {
    for x in 0..WORLD_W as i32 {
        for y in 0..WORLD_H as i32 {
            if !grid.get_or_dirt(x, y).is_tree() {
                continue;
            }
            let mut mask = 0usize;
            for z in 0..4 {
                mask <<= 1;
                let (nx, ny) = (x + NEIGHBOR_DX[z], y + NEIGHBOR_DY[z]);
                if grid.in_bounds(nx, ny) && grid.get_or_dirt(nx, ny).is_tree() {
                    mask += 1;
                }
            }
            let mut id = TREE_EDGE_TAB[mask & 15];
            if id != 0 && id != WOODS && (x + y) & 1 == 1 {
                id -= 8;
            }
            let _ = grid.place(x, y, id);
        }
    }
}

/// Clean up plop seams: re-mark shorelines as raw edges, fill isolated
/// water back to open river, and push woods off the waterline.
pub fn smooth_water(grid: &mut TileGrid) {
    for x in 0..WORLD_W as i32 {
        for y in 0..WORLD_H as i32 {
            if !is_water_id(grid.get_or_dirt(x, y).id()) {
                continue;
            }
            let shoreline = (0..4).any(|z| {
                let (nx, ny) = (x + NEIGHBOR_DX[z], y + NEIGHBOR_DY[z]);
                grid.in_bounds(nx, ny) && !is_water_id(grid.get_or_dirt(nx, ny).id())
            });
            if shoreline {
                let _ = grid.place(x, y, REDGE);
            }
        }
    }

    for x in 0..WORLD_W as i32 {
        for y in 0..WORLD_H as i32 {
            let id = grid.get_or_dirt(x, y).id();
            if id == CHANNEL || !is_water_id(id) {
                continue;
            }
            let landlocked = (0..4).all(|z| {
                let (nx, ny) = (x + NEIGHBOR_DX[z], y + NEIGHBOR_DY[z]);
                !grid.in_bounds(nx, ny) || is_water_id(grid.get_or_dirt(nx, ny).id())
            });
            if landlocked {
                let _ = grid.place(x, y, RIVER);
            }
        }
    }

    for x in 0..WORLD_W as i32 {
        for y in 0..WORLD_H as i32 {
            if !grid.get_or_dirt(x, y).is_tree() {
                continue;
            }
            let waterline = (0..4).any(|z| {
                let (nx, ny) = (x + NEIGHBOR_DX[z], y + NEIGHBOR_DY[z]);
                let id = grid.get_or_dirt(nx, ny).id();
                grid.in_bounds(nx, ny) && (id == RIVER || id == CHANNEL)
            });
            if waterline {
                let _ = grid.place(x, y, REDGE);
            }
        }
    }
}
