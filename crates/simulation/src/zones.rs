//! Zone scan: the per-tick raster pass over zone centers.
//!
//! Growth zones run a desirability state machine; special zones run fixed
//! behavior (plants, stations, ports, hospitals). Raster order is part of
//! the contract: a zone processed earlier in the pass may see neighbor state
//! already updated this tick, and replays depend on that.

use serde::{Deserialize, Serialize};

use crate::census::CityStats;
use crate::config::{GrowthTuning, SimConfig};
use crate::grid::{Overlays, TileGrid, WORLD_H, WORLD_W};
use crate::rng::SimRng;
use crate::sprites::{SpriteKind, SpritePool};
use crate::tiles::{
    self, residential_population, SpecialZone, Tile, ZoneFamily, CHURCH_BASE, HOSPITAL_BASE,
    RES_BASE,
};
use crate::traffic;
use crate::valves::Valves;

/// Ticks between footprint self-repair passes.
const REPAIR_INTERVAL: u64 = 16;

/// Aggregate outcome of one zone scan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneScanReport {
    pub grown: u32,
    pub decayed: u32,
    /// Growth decisions reversed by a failed or missing route.
    pub growth_vetoes: u32,
    /// Nuclear plants that rolled a meltdown this tick.
    pub meltdowns: Vec<(i32, i32)>,
}

/// Run the raster scan. Census counts accumulate into `stats.census`,
/// which the scheduler resets beforehand.
#[allow(clippy::too_many_arguments)]
pub fn scan(
    grid: &mut TileGrid,
    overlays: &mut Overlays,
    stats: &mut CityStats,
    valves: &Valves,
    sprites: &mut SpritePool,
    rng: &mut SimRng,
    config: &SimConfig,
    clock: u64,
) -> ZoneScanReport {
    let mut report = ZoneScanReport::default();
    for y in 0..WORLD_H as i32 {
        for x in 0..WORLD_W as i32 {
            let tile = grid.get_or_dirt(x, y);
            if !tile.is_zone_center() {
                continue;
            }
            if let Some(family) = tile.zone_family() {
                do_growth_zone(
                    grid,
                    overlays,
                    stats,
                    valves,
                    rng,
                    config,
                    &mut report,
                    x,
                    y,
                    tile,
                    family,
                );
            } else if let Some(kind) = tile.special_zone() {
                do_special_zone(
                    grid,
                    stats,
                    sprites,
                    rng,
                    config,
                    &mut report,
                    clock,
                    x,
                    y,
                    tile,
                    kind,
                );
            }
        }
    }
    report
}

/// Desirability of growth at a zone location. Power is deliberately not a
/// term here; an unpowered zone is handled by the decay rule instead.
pub fn desirability(
    overlays: &Overlays,
    valves: &Valves,
    tuning: &GrowthTuning,
    x: i32,
    y: i32,
    family: ZoneFamily,
) -> i32 {
    let valve = match family {
        ZoneFamily::Residential => valves.res,
        ZoneFamily::Commercial => valves.com,
        ZoneFamily::Industrial => valves.ind,
    };
    let mut score = valve + tuning.land_value_weight * overlays.land_value_at(x, y) as i32
        - tuning.pollution_weight * overlays.pollution_at(x, y) as i32
        - tuning.crime_weight * overlays.crime_at(x, y) as i32;
    if family == ZoneFamily::Commercial {
        score += overlays.commercial_rate_at(x, y) as i32 * 8;
    }
    if overlays.traffic_at(x, y) > tuning.congestion_threshold {
        score -= tuning.congestion_penalty;
    }
    score
}

#[allow(clippy::too_many_arguments)]
fn do_growth_zone(
    grid: &mut TileGrid,
    overlays: &mut Overlays,
    stats: &mut CityStats,
    valves: &Valves,
    rng: &mut SimRng,
    config: &SimConfig,
    report: &mut ZoneScanReport,
    x: i32,
    y: i32,
    tile: Tile,
    family: ZoneFamily,
) {
    let tuning = &config.growth;
    let mut stage = tile.zone_stage().unwrap_or(0);
    let powered = tile.is_powered();

    // An empty residential lot can convert to the amenity the census says
    // the city is short of.
    if family == ZoneFamily::Residential && stage == 0 {
        if stats.hospital_need > 0 && rng.one_in(20) {
            let _ = grid.place_zone(x, y, HOSPITAL_BASE);
            return;
        }
        if stats.church_need > 0 && rng.one_in(20) {
            let _ = grid.place_zone(x, y, CHURCH_BASE);
            return;
        }
    }

    // Ambient traffic: a populated zone tries a trip when its population
    // beats a bounded draw, feeding the density overlay even on ticks with
    // no growth decision.
    let (pop, attempt_bound) = match family {
        ZoneFamily::Residential => (
            residential_population(stage),
            tuning.res_attempt_bound,
        ),
        _ => (stage as u32, tuning.biz_attempt_bound),
    };
    if pop > 0 && pop as u16 > rng.next_int(attempt_bound) {
        let _ = traffic::make_traffic(grid, overlays, rng, &config.traffic, x, y, family);
    }

    if !powered {
        stats.census.unpowered_zones += 1;
        // Unpowered zones rot probabilistically instead of scoring.
        if stage > 0 && rng.one_in(tuning.unpowered_decay) {
            stage -= 1;
            restamp(grid, x, y, family, stage);
            overlays.adjust_rate_of_growth(x, y, -8);
            report.decayed += 1;
        }
        tally(stats, family, stage);
        return;
    }
    stats.census.powered_zones += 1;

    let score = desirability(overlays, valves, tuning, x, y, family);
    if score > tuning.growth_threshold && stage < family.max_stage() {
        if footprint_intact(grid, x, y, family)
            && traffic::make_traffic(grid, overlays, rng, &config.traffic, x, y, family)
                .is_routed()
        {
            stage += 1;
            restamp(grid, x, y, family, stage);
            overlays.adjust_rate_of_growth(x, y, 8);
            report.grown += 1;
        } else {
            report.growth_vetoes += 1;
        }
    } else if score <= tuning.decay_threshold && stage > 0 {
        stage -= 1;
        restamp(grid, x, y, family, stage);
        overlays.adjust_rate_of_growth(x, y, -8);
        report.decayed += 1;
    }

    tally(stats, family, stage);
}

fn tally(stats: &mut CityStats, family: ZoneFamily, stage: u8) {
    let census = &mut stats.census;
    match family {
        ZoneFamily::Residential => {
            census.res_zones += 1;
            census.res_pop += residential_population(stage);
        }
        ZoneFamily::Commercial => {
            census.com_zones += 1;
            census.com_pop += stage as u32;
        }
        ZoneFamily::Industrial => {
            census.ind_zones += 1;
            census.ind_pop += stage as u32;
        }
    }
}

/// Every footprint tile still belongs to this family's block range. Damage
/// (fire, rubble, a road cut through) blocks growth until repaired.
/// Off-map cells of a border zone are ignored.
fn footprint_intact(grid: &TileGrid, cx: i32, cy: i32, family: ZoneFamily) -> bool {
    let lo = family.base();
    let hi = lo + (family.max_stage() as u16 + 1) * 9 - 1;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let (x, y) = (cx + dx, cy + dy);
            if !grid.in_bounds(x, y) {
                continue;
            }
            let id = grid.get_or_dirt(x, y).id();
            if !(lo..=hi).contains(&id) {
                return false;
            }
        }
    }
    true
}

/// Stamp the footprint for a new stage, keeping the powered bits so the
/// rest of this tick sees a consistent grid.
fn restamp(grid: &mut TileGrid, cx: i32, cy: i32, family: ZoneFamily, stage: u8) {
    let powered = grid.get_or_dirt(cx, cy).is_powered();
    let _ = grid.place_zone(cx, cy, family.base() + stage as u16 * 9);
    if powered {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (x, y) = (cx + dx, cy + dy);
                if grid.in_bounds(x, y) {
                    let t = grid.get_or_dirt(x, y).set(tiles::POWERED);
                    let _ = grid.set(x, y, t);
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn do_special_zone(
    grid: &mut TileGrid,
    stats: &mut CityStats,
    sprites: &mut SpritePool,
    rng: &mut SimRng,
    config: &SimConfig,
    report: &mut ZoneScanReport,
    clock: u64,
    x: i32,
    y: i32,
    tile: Tile,
    kind: SpecialZone,
) {
    let powered = tile.is_powered();
    if powered {
        stats.census.powered_zones += 1;
    } else {
        stats.census.unpowered_zones += 1;
    }

    let census = &mut stats.census;
    match kind {
        SpecialZone::CoalPlant => census.coal_plants += 1,
        SpecialZone::NuclearPlant => {
            census.nuclear_plants += 1;
            if config.disasters_enabled
                && rng.one_in(config.difficulty.meltdown_odds() as u16)
            {
                tracing::info!(x, y, "nuclear plant meltdown");
                report.meltdowns.push((x, y));
            }
        }
        SpecialZone::FireStation => census.fire_stations += 1,
        SpecialZone::PoliceStation => census.police_stations += 1,
        SpecialZone::Stadium => census.stadiums += 1,
        SpecialZone::Seaport => {
            census.seaports += 1;
            if powered && !sprites.any_of_kind(SpriteKind::Ship) {
                if let Some((wx, wy)) = nearby_water(grid, x, y) {
                    sprites.spawn(SpriteKind::Ship, wx, wy);
                }
            }
        }
        SpecialZone::Airport => {
            census.airports += 1;
            if powered {
                if !sprites.any_of_kind(SpriteKind::Plane) {
                    sprites.spawn(SpriteKind::Plane, x, y);
                }
                if !sprites.any_of_kind(SpriteKind::Helicopter) {
                    sprites.spawn(SpriteKind::Helicopter, x, y);
                }
            }
        }
        SpecialZone::Hospital => {
            census.hospitals += 1;
            // One too many: occasionally hand the lot back to housing.
            if stats.hospital_need < 0 && rng.one_in(20) {
                let _ = grid.place_zone(x, y, RES_BASE);
                return;
            }
        }
        SpecialZone::Church => {
            census.churches += 1;
            if stats.church_need < 0 && rng.one_in(20) {
                let _ = grid.place_zone(x, y, RES_BASE);
                return;
            }
        }
    }

    if clock % REPAIR_INTERVAL == 0 {
        repair_footprint(grid, x, y, special_base(kind));
    }
}

fn special_base(kind: SpecialZone) -> u16 {
    match kind {
        SpecialZone::FireStation => tiles::FIRE_STATION_BASE,
        SpecialZone::PoliceStation => tiles::POLICE_STATION_BASE,
        SpecialZone::CoalPlant => tiles::COAL_BASE,
        SpecialZone::NuclearPlant => tiles::NUCLEAR_BASE,
        SpecialZone::Stadium => tiles::STADIUM_BASE,
        SpecialZone::Seaport => tiles::SEAPORT_BASE,
        SpecialZone::Airport => tiles::AIRPORT_BASE,
        SpecialZone::Hospital => tiles::HOSPITAL_BASE,
        SpecialZone::Church => tiles::CHURCH_BASE,
    }
}

/// Restore damaged footprint tiles, unless something durable (rubble, a
/// road, flood water, fire, radiation) took the spot.
fn repair_footprint(grid: &mut TileGrid, cx: i32, cy: i32, base: u16) {
    let mut slot = 0u16;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let (x, y) = (cx + dx, cy + dy);
            let expected = base + slot;
            slot += 1;
            if (dx, dy) == (0, 0) || !grid.in_bounds(x, y) {
                continue;
            }
            let tile = grid.get_or_dirt(x, y);
            if tile.id() == expected {
                continue;
            }
            if tile.is_rubble()
                || tile.is_traversable()
                || tile.is_flooded()
                || tile.is_fire()
                || tile.is_radioactive()
            {
                continue;
            }
            let _ = grid.place(x, y, expected);
        }
    }
}

/// Probe the zone perimeter for open water to float a ship on.
fn nearby_water(grid: &TileGrid, cx: i32, cy: i32) -> Option<(i32, i32)> {
    for dy in -2..=2 {
        for dx in -2..=2 {
            let (x, y) = (cx + dx, cy + dy);
            if grid.in_bounds(x, y) && grid.get_or_dirt(x, y).is_water() {
                return Some((x, y));
            }
        }
    }
    None
}
