//! Overlay scanner: turns raw tile samples into the smoothed fields the
//! growth engine reads.
//!
//! Runs on its own interval. Each scan surveys the grid once, box-smooths
//! the point samples, and blends the result over the previous fields with a
//! configurable exponential decay. Traffic density is not produced here; the
//! router writes it directly and the scheduler decays it every tick.

use crate::config::SimConfig;
use crate::grid::{
    smooth_u16, smooth_u8, Overlay, Overlays, TileGrid, EIGHTH_H, EIGHTH_W, HALF_H, HALF_W,
    QUARTER_H, QUARTER_W,
};
use crate::rng::SimRng;
use crate::tiles::{self, SpecialZone, Tile, ZoneFamily};
use crate::traffic;

/// Fire/police station base strength at full funding.
const STATION_STRENGTH: f32 = 1000.0;

/// Run one full overlay scan.
pub fn scan(grid: &TileGrid, overlays: &mut Overlays, rng: &mut SimRng, config: &SimConfig) {
    population_scan(grid, overlays);
    station_scan(grid, overlays, config);
    pollution_terrain_land_value_scan(grid, overlays, rng, config);
    crime_scan(overlays, config);
}

/// Pollution emitted by one tile.
fn pollution_value(tile: Tile) -> u32 {
    let id = tile.id();
    if tile.is_radioactive() {
        255
    } else if tile.is_fire() {
        90
    } else if (tiles::HEAVY_TRAFFIC_FIRST..=tiles::ROAD_LAST).contains(&id) {
        75
    } else if (tiles::LIGHT_TRAFFIC_FIRST..tiles::HEAVY_TRAFFIC_FIRST).contains(&id) {
        50
    } else if (tiles::IND_BASE..=tiles::IND_LAST).contains(&id) {
        50
    } else if (tiles::COAL_BASE..tiles::COAL_BASE + 9).contains(&id)
        || (tiles::SEAPORT_BASE..tiles::SEAPORT_BASE + 9).contains(&id)
        || (tiles::AIRPORT_BASE..tiles::AIRPORT_BASE + 9).contains(&id)
    {
        100
    } else {
        0
    }
}

/// Natural, undeveloped ground that feeds the terrain map.
fn is_natural(tile: Tile) -> bool {
    let id = tile.id();
    id != tiles::DIRT && id < tiles::RUBBLE_FIRST
}

/// Manhattan distance from the city centroid in half-resolution cells,
/// capped at 32.
fn centroid_distance(overlays: &Overlays, x: i32, y: i32) -> i32 {
    let (cx, cy) = overlays.city_center;
    ((x - cx).abs() + (y - cy).abs()).min(32)
}

/// Blend a freshly computed field over the previous one. Weight 0 replaces
/// the field outright; 256 freezes it.
fn blend_u8(previous: &mut Overlay<u8>, fresh: &Overlay<u8>, weight: u16) {
    if weight == 0 {
        *previous = fresh.clone();
        return;
    }
    let w = weight as u32;
    for (old, &new) in previous.cells_mut().iter_mut().zip(fresh.cells()) {
        *old = ((*old as u32 * w + new as u32 * (256 - w)) >> 8) as u8;
    }
}

/// Population density at half resolution plus the city centroid and the
/// commercial-rate map derived from it.
fn population_scan(grid: &TileGrid, overlays: &mut Overlays) {
    let mut raw: Overlay<u8> = Overlay::new(HALF_W, HALF_H);
    let mut x_total = 0i64;
    let mut y_total = 0i64;
    let mut zones = 0i64;

    for (x, y, tile) in grid.iter() {
        if !tile.is_zone_center() {
            continue;
        }
        let pop = zone_point_population(tile);
        raw.set(x / 2, y / 2, (pop << 3).min(254) as u8);
        x_total += x as i64;
        y_total += y as i64;
        zones += 1;
    }

    let smoothed = smooth_u8(&smooth_u8(&smooth_u8(&raw)));
    let mut fresh: Overlay<u8> = Overlay::new(HALF_W, HALF_H);
    for (i, &v) in smoothed.cells().iter().enumerate() {
        fresh.cells_mut()[i] = ((v as u16) << 1).min(254) as u8;
    }
    // Density tracks the grid directly; no blend applies here.
    blend_u8(&mut overlays.population_density, &fresh, 0);

    overlays.city_center = if zones > 0 {
        (
            (x_total / zones / 2) as i32,
            (y_total / zones / 2) as i32,
        )
    } else {
        ((HALF_W / 2) as i32, (HALF_H / 2) as i32)
    };

    // Commercial rate: distance from the centroid at eighth resolution.
    for y in 0..EIGHTH_H as i32 {
        for x in 0..EIGHTH_W as i32 {
            let dist = centroid_distance(overlays, x * 4, y * 4);
            overlays.commercial_rate.set(x, y, (64 - dist * 4) as i16);
        }
    }
}

/// Point population a zone center contributes to the density survey.
fn zone_point_population(tile: Tile) -> u32 {
    match tile.zone_family() {
        Some(ZoneFamily::Residential) => {
            tiles::residential_population(tile.zone_stage().unwrap_or(0))
        }
        Some(_) => (tile.zone_stage().unwrap_or(0) as u32) << 3,
        None => 0,
    }
}

/// Fire and police station strengths spread into the eighth-resolution
/// effect maps. Strength scales with funding, halves without power, halves
/// again without road access.
fn station_scan(grid: &TileGrid, overlays: &mut Overlays, config: &SimConfig) {
    let mut fire: Overlay<u16> = Overlay::new(EIGHTH_W, EIGHTH_H);
    let mut police: Overlay<u16> = Overlay::new(EIGHTH_W, EIGHTH_H);

    for (x, y, tile) in grid.iter() {
        let (map, funding) = match tile.special_zone() {
            Some(SpecialZone::FireStation) => (&mut fire, config.fire_funding),
            Some(SpecialZone::PoliceStation) => (&mut police, config.police_funding),
            _ => continue,
        };
        let mut effect = (funding * STATION_STRENGTH) as u32;
        if !tile.is_powered() {
            effect /= 2;
        }
        if traffic::find_perimeter_road(grid, x, y).is_none() {
            effect /= 2;
        }
        let cell = map.get(x / 8, y / 8) as u32 + effect;
        map.set(x / 8, y / 8, cell.min(u16::MAX as u32) as u16);
    }

    overlays.fire_effect = smooth_u16(&smooth_u16(&smooth_u16(&fire)));
    overlays.police_effect = smooth_u16(&smooth_u16(&smooth_u16(&police)));
}

/// The combined pollution/terrain/land-value pass. Land value reads the
/// previous pollution and crime fields, so it runs before pollution is
/// replaced, matching the original's ordering.
fn pollution_terrain_land_value_scan(
    grid: &TileGrid,
    overlays: &mut Overlays,
    rng: &mut SimRng,
    config: &SimConfig,
) {
    let mut terrain_raw: Overlay<u8> = Overlay::new(QUARTER_W, QUARTER_H);
    let mut pollution_raw: Overlay<u8> = Overlay::new(HALF_W, HALF_H);
    let mut land_value_fresh: Overlay<u8> = Overlay::new(HALF_W, HALF_H);
    let mut lv_total = 0i64;
    let mut lv_cells = 0i64;

    for hy in 0..HALF_H as i32 {
        for hx in 0..HALF_W as i32 {
            let mut emission = 0u32;
            let mut developed = false;
            for dy in 0..2 {
                for dx in 0..2 {
                    let tile = grid.get_or_dirt(hx * 2 + dx, hy * 2 + dy);
                    if is_natural(tile) {
                        let cell = terrain_raw.get(hx / 2, hy / 2);
                        terrain_raw.set(hx / 2, hy / 2, cell.saturating_add(15));
                        continue;
                    }
                    emission += pollution_value(tile);
                    if tile.id() >= tiles::ROAD_FIRST {
                        developed = true;
                    }
                }
            }
            pollution_raw.set(hx, hy, emission.min(255) as u8);

            if developed {
                let mut value = (34 - centroid_distance(overlays, hx, hy)) << 2;
                value += overlays.terrain.get(hx / 2, hy / 2) as i32;
                value -= overlays.pollution.get(hx, hy) as i32;
                if overlays.crime.get(hx, hy) > 190 {
                    value -= 20;
                }
                let value = value.clamp(1, 250) as u8;
                land_value_fresh.set(hx, hy, value);
                lv_total += value as i64;
                lv_cells += 1;
            }
        }
    }

    overlays.terrain = smooth_u8(&terrain_raw);
    blend_u8(
        &mut overlays.land_value,
        &land_value_fresh,
        config.scan.land_value_decay,
    );
    overlays.land_value_average = if lv_cells > 0 {
        (lv_total / lv_cells) as i32
    } else {
        0
    };

    let pollution_fresh = smooth_u8(&smooth_u8(&pollution_raw));
    blend_u8(
        &mut overlays.pollution,
        &pollution_fresh,
        config.scan.pollution_decay,
    );

    // Average and peak over the blended field; the peak steers the monster.
    let mut total = 0i64;
    let mut cells = 0i64;
    let mut peak = 0u8;
    for y in 0..HALF_H as i32 {
        for x in 0..HALF_W as i32 {
            let v = overlays.pollution.get(x, y);
            if v == 0 {
                continue;
            }
            total += v as i64;
            cells += 1;
            if v > peak || (v == peak && rng.rand16() & 3 == 0) {
                peak = v;
                overlays.pollution_max = (x, y);
            }
        }
    }
    overlays.pollution_average = if cells > 0 { (total / cells) as i32 } else { 0 };
}

/// Crime pressure: inverse land value plus population density, suppressed
/// by police coverage. Only cells with land value participate.
fn crime_scan(overlays: &mut Overlays, config: &SimConfig) {
    let mut fresh: Overlay<u8> = Overlay::new(HALF_W, HALF_H);
    let mut total = 0i64;
    let mut cells = 0i64;

    for y in 0..HALF_H as i32 {
        for x in 0..HALF_W as i32 {
            let lv = overlays.land_value.get(x, y) as i32;
            if lv == 0 {
                continue;
            }
            let mut z = 128 - lv + overlays.population_density.get(x, y) as i32;
            z = z.min(300);
            z -= overlays.police_effect.get(x / 4, y / 4) as i32;
            let z = z.clamp(0, 250) as u8;
            fresh.set(x, y, z);
            total += z as i64;
            cells += 1;
        }
    }

    blend_u8(&mut overlays.crime, &fresh, config.scan.crime_decay);
    overlays.crime_average = if cells > 0 { (total / cells) as i32 } else { 0 };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanTuning;
    use crate::tiles::{
        COAL_BASE, IND_BASE, POLICE_STATION_BASE, POWERED, RES_BASE, ROAD_FIRST,
    };

    fn full_scan(grid: &TileGrid, overlays: &mut Overlays, config: &SimConfig) {
        let mut rng = SimRng::new(1);
        scan(grid, overlays, &mut rng, config);
    }

    #[test]
    fn test_empty_grid_scans_clean() {
        let grid = TileGrid::new();
        let mut overlays = Overlays::new();
        full_scan(&grid, &mut overlays, &SimConfig::default());
        assert_eq!(overlays.pollution_average, 0);
        assert_eq!(overlays.crime_average, 0);
        assert_eq!(overlays.land_value_average, 0);
        assert_eq!(
            overlays.city_center,
            ((HALF_W / 2) as i32, (HALF_H / 2) as i32)
        );
    }

    #[test]
    fn test_industry_pollutes_its_neighborhood() {
        let mut grid = TileGrid::new();
        grid.place_zone(30, 30, IND_BASE + 2 * 9).unwrap();
        let mut overlays = Overlays::new();
        full_scan(&grid, &mut overlays, &SimConfig::default());
        assert!(overlays.pollution_at(30, 30) > 0);
        assert!(overlays.pollution_average > 0);
        // Smoothing spreads it outward, decreasing with distance.
        assert!(overlays.pollution_at(30, 30) >= overlays.pollution_at(40, 30));
    }

    #[test]
    fn test_pollution_peak_lands_on_the_source() {
        let mut grid = TileGrid::new();
        grid.place_zone(30, 30, COAL_BASE).unwrap();
        let mut overlays = Overlays::new();
        full_scan(&grid, &mut overlays, &SimConfig::default());
        let (px, py) = overlays.pollution_max;
        assert!((px - 15).abs() <= 4, "peak x near the plant: {px}");
        assert!((py - 15).abs() <= 4, "peak y near the plant: {py}");
    }

    #[test]
    fn test_population_density_follows_zones() {
        let mut grid = TileGrid::new();
        grid.place_zone(20, 20, RES_BASE + 4 * 9).unwrap(); // stage 4
        let mut overlays = Overlays::new();
        full_scan(&grid, &mut overlays, &SimConfig::default());
        assert!(overlays.population_density.get(10, 10) > 0);
        assert_eq!(overlays.population_density.get(40, 40), 0);
    }

    #[test]
    fn test_centroid_tracks_the_zones() {
        let mut grid = TileGrid::new();
        grid.place_zone(10, 10, RES_BASE).unwrap();
        grid.place_zone(14, 10, RES_BASE).unwrap();
        let mut overlays = Overlays::new();
        full_scan(&grid, &mut overlays, &SimConfig::default());
        assert_eq!(overlays.city_center, (6, 5));
    }

    #[test]
    fn test_land_value_only_on_developed_cells() {
        let mut grid = TileGrid::new();
        grid.place(40, 40, ROAD_FIRST + 2).unwrap();
        let mut overlays = Overlays::new();
        full_scan(&grid, &mut overlays, &SimConfig::default());
        assert!(overlays.land_value_at(40, 40) > 0);
        assert_eq!(overlays.land_value_at(80, 80), 0);
    }

    #[test]
    fn test_police_station_suppresses_crime() {
        let build = |with_station: bool| {
            let mut grid = TileGrid::new();
            for x in 20..40 {
                grid.place(x, 20, ROAD_FIRST + 2).unwrap();
            }
            grid.place_zone(30, 24, RES_BASE + 4 * 9).unwrap();
            if with_station {
                grid.place_zone(30, 28, POLICE_STATION_BASE).unwrap();
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let t = grid.get_or_dirt(30 + dx, 28 + dy).set(POWERED);
                        grid.set(30 + dx, 28 + dy, t).unwrap();
                    }
                }
                // Road access for full strength.
                grid.place(30, 26, ROAD_FIRST + 2).unwrap();
            }
            let mut overlays = Overlays::new();
            // Two scans so land value exists when crime is derived.
            full_scan(&grid, &mut overlays, &SimConfig::default());
            full_scan(&grid, &mut overlays, &SimConfig::default());
            overlays
        };
        let without = build(false);
        let with = build(true);
        assert!(with.crime_at(30, 24) <= without.crime_at(30, 24));
        assert!(with.police_effect_at(30, 28) > 0);
    }

    #[test]
    fn test_station_effect_halves_without_power_and_road() {
        let build = |powered: bool, road: bool| {
            let mut grid = TileGrid::new();
            grid.place_zone(30, 30, POLICE_STATION_BASE).unwrap();
            if powered {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let t = grid.get_or_dirt(30 + dx, 30 + dy).set(POWERED);
                        grid.set(30 + dx, 30 + dy, t).unwrap();
                    }
                }
            }
            if road {
                grid.place(30, 28, ROAD_FIRST + 2).unwrap();
            }
            let mut overlays = Overlays::new();
            full_scan(&grid, &mut overlays, &SimConfig::default());
            overlays.police_effect_at(30, 30)
        };
        let full = build(true, true);
        let unpowered = build(false, true);
        let cut_off = build(false, false);
        assert!(full > unpowered);
        assert!(unpowered > cut_off);
        assert!(cut_off > 0);
    }

    #[test]
    fn test_decay_blend_moves_partway() {
        let mut grid = TileGrid::new();
        grid.place_zone(30, 30, IND_BASE + 2 * 9).unwrap();
        let config_replace = SimConfig::default();
        let config_blend = SimConfig {
            scan: ScanTuning {
                pollution_decay: 128,
                ..ScanTuning::default()
            },
            ..SimConfig::default()
        };

        let mut replaced = Overlays::new();
        full_scan(&grid, &mut replaced, &config_replace);
        let fresh_value = replaced.pollution_at(30, 30);

        let mut blended = Overlays::new();
        full_scan(&grid, &mut blended, &config_blend);
        let blended_value = blended.pollution_at(30, 30);

        // Half weight on a zero prior lands near half the fresh value.
        assert!(blended_value < fresh_value);
        assert!(blended_value as i32 >= fresh_value as i32 / 2 - 1);
    }

    #[test]
    fn test_commercial_rate_peaks_at_center() {
        let mut grid = TileGrid::new();
        grid.place_zone(60, 50, RES_BASE).unwrap();
        let mut overlays = Overlays::new();
        full_scan(&grid, &mut overlays, &SimConfig::default());
        let at_center = overlays.commercial_rate_at(60, 50);
        let far = overlays.commercial_rate_at(0, 0);
        assert!(at_center > far);
        assert!(far < 0, "far corners rate negative: {far}");
    }
}
