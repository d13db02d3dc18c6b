//! Disaster engine: random catastrophes and the per-tile fire and flood
//! update passes.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::grid::{Overlays, TileGrid, WORLD_H, WORLD_W};
use crate::rng::SimRng;
use crate::sprites::{SpriteKind, SpritePool};
use crate::tiles::{self, FIRE_FIRST, FLOOD_FIRST, RADIOACTIVE, RUBBLE_FIRST};

/// Ticks a flood keeps spreading after its trigger.
const FLOOD_DURATION: u16 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisasterKind {
    Fire,
    Flood,
    Tornado,
    Earthquake,
    Monster,
    Meltdown,
}

/// Persistent disaster bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisasterState {
    /// Remaining ticks of flood spread; zero means receding or dry.
    pub flood_ticks: u16,
    /// Set while flood water is on the map, for the end event.
    pub flood_active: bool,
}

/// What the disaster pass did this tick.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisasterReport {
    pub started: Vec<(DisasterKind, i32, i32)>,
    pub ended: Vec<DisasterKind>,
    /// Tiles burning after this tick's fire pass.
    pub fire_tiles: u32,
    /// Tiles under water after this tick's flood pass.
    pub flood_tiles: u32,
}

/// One disaster tick: the auto-trigger roll, then the fire and flood
/// passes over the grid.
pub fn tick(
    grid: &mut TileGrid,
    overlays: &Overlays,
    sprites: &mut SpritePool,
    state: &mut DisasterState,
    rng: &mut SimRng,
    config: &SimConfig,
) -> DisasterReport {
    let mut report = DisasterReport::default();

    if config.disasters_enabled && rng.one_in(config.difficulty.disaster_odds()) {
        roll_disaster(grid, overlays, sprites, state, rng, &mut report);
    }

    fire_pass(grid, overlays, rng, &mut report);
    flood_pass(grid, state, rng, &mut report);

    if state.flood_active && report.flood_tiles == 0 && state.flood_ticks == 0 {
        state.flood_active = false;
        report.ended.push(DisasterKind::Flood);
        tracing::info!("flood has receded");
    }

    report
}

/// Even draw across the five random disasters. The monster only answers
/// when pollution is bad enough.
fn roll_disaster(
    grid: &mut TileGrid,
    overlays: &Overlays,
    sprites: &mut SpritePool,
    state: &mut DisasterState,
    rng: &mut SimRng,
    report: &mut DisasterReport,
) {
    match rng.next_int(4) {
        0 => start_fire(grid, rng, report),
        1 => start_flood(grid, state, rng, report),
        2 => start_tornado(sprites, rng, report),
        3 => start_earthquake(grid, rng, report),
        _ => {
            if overlays.pollution_average > 60 {
                start_monster(sprites, overlays, report);
            }
        }
    }
}

/// Ignite a random developed tile.
pub fn start_fire(grid: &mut TileGrid, rng: &mut SimRng, report: &mut DisasterReport) {
    for _ in 0..40 {
        let x = rng.next_int(WORLD_W as u16 - 1) as i32;
        let y = rng.next_int(WORLD_H as u16 - 1) as i32;
        let tile = grid.get_or_dirt(x, y);
        if tile.is_arsonable() {
            ignite(grid, x, y);
            report.started.push((DisasterKind::Fire, x, y));
            tracing::info!(x, y, "fire has broken out");
            return;
        }
    }
}

/// Seed flood water next to a river edge and start the flood counter.
/// A city with no shoreline cannot flood.
pub fn start_flood(
    grid: &mut TileGrid,
    state: &mut DisasterState,
    rng: &mut SimRng,
    report: &mut DisasterReport,
) {
    let mut seeds = Vec::new();
    for (x, y, tile) in grid.iter() {
        if !(tile.is_river_edge() || tile.id() == tiles::REDGE) {
            continue;
        }
        for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
            let (nx, ny) = (x + dx, y + dy);
            if grid.in_bounds(nx, ny) && grid.get_or_dirt(nx, ny).is_floodable() {
                seeds.push((nx, ny));
                break;
            }
        }
    }
    if seeds.is_empty() {
        return;
    }
    let (nx, ny) = seeds[rng.next_int(seeds.len() as u16 - 1) as usize];
    let _ = grid.place(nx, ny, FLOOD_FIRST);
    state.flood_ticks = FLOOD_DURATION;
    state.flood_active = true;
    report.started.push((DisasterKind::Flood, nx, ny));
    tracing::info!(x = nx, y = ny, "flooding has begun");
}

pub fn start_tornado(sprites: &mut SpritePool, rng: &mut SimRng, report: &mut DisasterReport) {
    let x = rng.next_int(WORLD_W as u16 - 1) as i32;
    let y = rng.next_int(WORLD_H as u16 - 1) as i32;
    sprites.spawn(SpriteKind::Tornado, x, y);
    report.started.push((DisasterKind::Tornado, x, y));
    tracing::info!(x, y, "tornado spotted");
}

pub fn start_monster(
    sprites: &mut SpritePool,
    overlays: &Overlays,
    report: &mut DisasterReport,
) {
    // It comes out of the water's edge nearest the filth it seeks.
    let (px, py) = overlays.pollution_max;
    let (x, y) = (px * 2, py * 2);
    sprites.spawn(SpriteKind::Monster, x, y);
    report.started.push((DisasterKind::Monster, x, y));
    tracing::info!(x, y, "a monster has been sighted");
}

/// Magnitude-scaled shake: 300 to 1000 strikes scattered around a random
/// epicenter, three quarters rubble and one quarter fire.
pub fn start_earthquake(grid: &mut TileGrid, rng: &mut SimRng, report: &mut DisasterReport) {
    let ex = rng.next_int(WORLD_W as u16 - 1) as i32;
    let ey = rng.next_int(WORLD_H as u16 - 1) as i32;
    let strikes = 300 + rng.next_int(700) as u32;
    tracing::info!(x = ex, y = ey, strikes, "earthquake");
    for _ in 0..strikes {
        let x = ex + rng.next_int(60) as i32 - 30;
        let y = ey + rng.next_int(60) as i32 - 30;
        if !grid.in_bounds(x, y) {
            continue;
        }
        let tile = grid.get_or_dirt(x, y);
        if !tile.is_vulnerable() {
            continue;
        }
        if rng.one_in(4) {
            ignite(grid, x, y);
        } else {
            let _ = grid.place(x, y, RUBBLE_FIRST + (rng.rand16() & 3));
        }
    }
    report.started.push((DisasterKind::Earthquake, ex, ey));
}

/// Nuclear meltdown at a plant center: explosions, a fire box over the
/// footprint, and radiation strewn across the neighborhood.
pub fn meltdown_at(
    grid: &mut TileGrid,
    sprites: &mut SpritePool,
    rng: &mut SimRng,
    x: i32,
    y: i32,
    report: &mut DisasterReport,
) {
    for (dx, dy) in [(-1, -1), (2, -1), (-1, 2), (2, 2)] {
        sprites.spawn(SpriteKind::Explosion, x + dx, y + dy);
    }
    for dy in -1..=2 {
        for dx in -1..=2 {
            if grid.in_bounds(x + dx, y + dy) {
                let _ = grid.place(x + dx, y + dy, FIRE_FIRST + (rng.rand16() & 7));
            }
        }
    }
    for _ in 0..200 {
        let rx = x - 20 + rng.next_int(40) as i32;
        let ry = y - 15 + rng.next_int(30) as i32;
        if !grid.in_bounds(rx, ry) {
            continue;
        }
        let tile = grid.get_or_dirt(rx, ry);
        if tile.is_dirt() || (tile.is_combustible() && !tile.is_zone_center()) {
            let _ = grid.place(rx, ry, RADIOACTIVE);
        }
    }
    report.started.push((DisasterKind::Meltdown, x, y));
    tracing::info!(x, y, "nuclear meltdown");
}

/// Set a tile burning. A zone center takes its whole footprint with it.
fn ignite(grid: &mut TileGrid, x: i32, y: i32) {
    if grid.get_or_dirt(x, y).is_zone_center() {
        for dy in -1..=1 {
            for dx in -1..=1 {
                if grid.in_bounds(x + dx, y + dy) {
                    let _ = grid.place(x + dx, y + dy, FIRE_FIRST);
                }
            }
        }
    } else if grid.in_bounds(x, y) {
        let _ = grid.place(x, y, FIRE_FIRST);
    }
}

/// Spread and extinguish every burning tile. Coverage from the fire-effect
/// overlay damps ignition and speeds extinguishing.
fn fire_pass(
    grid: &mut TileGrid,
    overlays: &Overlays,
    rng: &mut SimRng,
    report: &mut DisasterReport,
) {
    let burning: Vec<(i32, i32)> = grid
        .iter()
        .filter(|(_, _, t)| t.is_fire())
        .map(|(x, y, _)| (x, y))
        .collect();

    for (x, y) in burning {
        let coverage = overlays.fire_effect_at(x, y);
        let ignite_odds = 8 + (coverage / 20) as u16;
        for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
            let (nx, ny) = (x + dx, y + dy);
            if !grid.in_bounds(nx, ny) {
                continue;
            }
            let neighbor = grid.get_or_dirt(nx, ny);
            if neighbor.is_combustible() && !neighbor.is_fire() && rng.one_in(ignite_odds) {
                ignite(grid, nx, ny);
            }
        }

        let extinguish_odds = match coverage {
            0 => 10,
            1..=20 => 3,
            21..=100 => 2,
            _ => 1,
        };
        if rng.one_in(extinguish_odds) {
            let _ = grid.place(x, y, RUBBLE_FIRST + (rng.rand16() & 3));
        }
    }

    report.fire_tiles = grid.iter().filter(|(_, _, t)| t.is_fire()).count() as u32;
}

/// Spread flood water while the counter runs; recede it afterwards.
fn flood_pass(
    grid: &mut TileGrid,
    state: &mut DisasterState,
    rng: &mut SimRng,
    report: &mut DisasterReport,
) {
    let flooded: Vec<(i32, i32)> = grid
        .iter()
        .filter(|(_, _, t)| t.is_flooded())
        .map(|(x, y, _)| (x, y))
        .collect();

    if flooded.is_empty() && state.flood_ticks == 0 {
        return;
    }

    let spreading = state.flood_ticks > 0;
    for &(x, y) in &flooded {
        if spreading {
            for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
                let (nx, ny) = (x + dx, y + dy);
                if grid.in_bounds(nx, ny)
                    && grid.get_or_dirt(nx, ny).is_floodable()
                    && rng.one_in(8)
                {
                    let _ = grid.place(nx, ny, FLOOD_FIRST + (rng.rand16() & 3));
                }
            }
        } else if rng.one_in(16) {
            let _ = grid.place(x, y, tiles::DIRT);
        }
    }

    state.flood_ticks = state.flood_ticks.saturating_sub(1);
    report.flood_tiles = grid.iter().filter(|(_, _, t)| t.is_flooded()).count() as u32;
}

/// True when any orthogonal neighbor can burn; used by hosts probing for
/// fire exposure.
pub fn has_flammable_neighbor(grid: &TileGrid, x: i32, y: i32) -> bool {
    [(0, -1), (1, 0), (0, 1), (-1, 0)]
        .iter()
        .any(|&(dx, dy)| grid.get_or_dirt(x + dx, y + dy).is_combustible())
}
