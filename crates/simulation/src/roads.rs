//! Network upkeep: the per-tick pass over roads, rail and lingering
//! residue, plus the traffic and growth-map decay that keeps the overlays
//! from saturating.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::grid::{Overlays, TileGrid};
use crate::rng::SimRng;
use crate::tiles::{
    self, HEAVY_TRAFFIC_FIRST, LIGHT_TRAFFIC_FIRST, RIVER, ROAD_FIRST, RUBBLE_FIRST,
};

/// Ticks between rate-of-growth decay passes.
const GROWTH_DECAY_INTERVAL: u64 = 5;

/// Funding level below which roads can start crumbling.
const DETERIORATION_GUARD: u16 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpkeepReport {
    pub road_tiles: u32,
    pub rail_tiles: u32,
}

/// One upkeep pass: tile counts, deterioration, traffic retiling, residue
/// cleanup, and the overlay decays.
pub fn upkeep(
    grid: &mut TileGrid,
    overlays: &mut Overlays,
    rng: &mut SimRng,
    config: &SimConfig,
    clock: u64,
) -> UpkeepReport {
    let mut report = UpkeepReport::default();
    let road_effect = (config.road_funding * 32.0) as u16;

    grid.for_each_mut(|x, y, tile| {
        if tile.is_road() {
            report.road_tiles += 1;
            maintain_road(tile, overlays, rng, road_effect, x, y);
        } else if tile.is_rail() {
            report.rail_tiles += 1;
            maintain_rail(tile, rng, road_effect);
        } else if tile.is_radioactive() {
            // Radiation cools off very slowly.
            if rng.one_in(4096) {
                *tile = tiles::blueprint(tiles::DIRT);
            }
        } else if tile.is_explosion_residue() && rng.one_in(2) {
            *tile = tiles::blueprint(RUBBLE_FIRST + (rng.rand16() & 3));
        }
    });

    decay_traffic(overlays);
    if clock % GROWTH_DECAY_INTERVAL == 0 {
        decay_rate_of_growth(overlays);
    }
    report
}

fn maintain_road(
    tile: &mut tiles::Tile,
    overlays: &Overlays,
    rng: &mut SimRng,
    road_effect: u16,
    x: i32,
    y: i32,
) {
    let variant = (tile.id() - ROAD_FIRST) & 15;

    // Underfunded roads crumble; bridges collapse back into the river.
    if road_effect < DETERIORATION_GUARD
        && !tile.is_conductive()
        && rng.rand16() & 511 == 0
        && road_effect < rng.rand16() & 31
    {
        *tile = if variant < 2 {
            tiles::blueprint(RIVER)
        } else {
            tiles::blueprint(RUBBLE_FIRST + (rng.rand16() & 3))
        };
        return;
    }

    // Retile between the plain/light/heavy banks by measured density.
    // Bridges keep their own tiles.
    if variant < 2 {
        return;
    }
    let density = overlays.traffic_at(x, y);
    let bank = match density >> 6 {
        0 => ROAD_FIRST,
        1 => LIGHT_TRAFFIC_FIRST,
        _ => HEAVY_TRAFFIC_FIRST,
    };
    let wanted = bank + variant;
    if tile.id() != wanted {
        *tile = tiles::blueprint(wanted);
    }
}

fn maintain_rail(tile: &mut tiles::Tile, rng: &mut SimRng, road_effect: u16) {
    if road_effect < DETERIORATION_GUARD
        && !tile.is_conductive()
        && rng.rand16() & 511 == 0
        && road_effect < rng.rand16() & 31
    {
        *tile = tiles::blueprint(RUBBLE_FIRST + (rng.rand16() & 3));
    }
}

/// Fade the traffic overlay: heavy cells drop fast, light cells clear.
pub fn decay_traffic(overlays: &mut Overlays) {
    for cell in overlays.traffic_density.cells_mut() {
        *cell = match *cell {
            v if v > 200 => v - 34,
            v if v > 24 => v - 24,
            _ => 0,
        };
    }
}

/// Relax every rate-of-growth cell one step toward zero.
pub fn decay_rate_of_growth(overlays: &mut Overlays) {
    for cell in overlays.rate_of_growth.cells_mut() {
        *cell += match *cell {
            v if v > 0 => -1,
            v if v < 0 => 1,
            _ => 0,
        };
        *cell = (*cell).clamp(-200, 200);
    }
}
