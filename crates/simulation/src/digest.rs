//! 32-bit state checksum for desync detection.
//!
//! Hashes the canonical simulation state in a fixed field order: tiles,
//! every overlay field, the city-wide aggregates, the RNG state, the clock
//! and the demand valves. Two simulations with equal digests are running
//! the same city; a diverging digest pins down the first bad tick.

use xxhash_rust::xxh32::Xxh32;

use crate::grid::{Overlay, Overlays, TileGrid};
use crate::rng::SimRng;
use crate::valves::Valves;

pub fn digest(
    grid: &TileGrid,
    overlays: &Overlays,
    rng: &SimRng,
    clock: u64,
    valves: &Valves,
) -> u32 {
    let mut hasher = Xxh32::new(0);

    for raw in grid.to_raw() {
        hasher.update(&raw.to_le_bytes());
    }

    feed_u8(&mut hasher, &overlays.population_density);
    feed_u8(&mut hasher, &overlays.traffic_density);
    feed_u8(&mut hasher, &overlays.pollution);
    feed_u8(&mut hasher, &overlays.land_value);
    feed_u8(&mut hasher, &overlays.crime);
    feed_u8(&mut hasher, &overlays.terrain);
    feed_u16(&mut hasher, &overlays.fire_effect);
    feed_u16(&mut hasher, &overlays.police_effect);
    feed_i16(&mut hasher, &overlays.commercial_rate);
    feed_i16(&mut hasher, &overlays.rate_of_growth);

    hasher.update(&overlays.land_value_average.to_le_bytes());
    hasher.update(&overlays.pollution_average.to_le_bytes());
    hasher.update(&overlays.crime_average.to_le_bytes());
    hasher.update(&overlays.city_center.0.to_le_bytes());
    hasher.update(&overlays.city_center.1.to_le_bytes());
    hasher.update(&overlays.pollution_max.0.to_le_bytes());
    hasher.update(&overlays.pollution_max.1.to_le_bytes());

    hasher.update(&rng.state().to_le_bytes());
    hasher.update(&clock.to_le_bytes());
    hasher.update(&valves.res.to_le_bytes());
    hasher.update(&valves.com.to_le_bytes());
    hasher.update(&valves.ind.to_le_bytes());
    hasher.update(&[valves.external as u8]);

    hasher.digest()
}

fn feed_u8(hasher: &mut Xxh32, field: &Overlay<u8>) {
    hasher.update(field.cells());
}

fn feed_u16(hasher: &mut Xxh32, field: &Overlay<u16>) {
    for cell in field.cells() {
        hasher.update(&cell.to_le_bytes());
    }
}

fn feed_i16(hasher: &mut Xxh32, field: &Overlay<i16>) {
    for cell in field.cells() {
        hasher.update(&cell.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::RES_BASE;

    fn fresh() -> (TileGrid, Overlays, SimRng, Valves) {
        (TileGrid::new(), Overlays::new(), SimRng::new(7), Valves::default())
    }

    #[test]
    fn test_equal_state_equal_digest() {
        let (grid, overlays, rng, valves) = fresh();
        let a = digest(&grid, &overlays, &rng, 0, &valves);
        let b = digest(&grid, &overlays, &rng, 0, &valves);
        assert_eq!(a, b);
    }

    #[test]
    fn test_tile_change_changes_digest() {
        let (mut grid, overlays, rng, valves) = fresh();
        let before = digest(&grid, &overlays, &rng, 0, &valves);
        grid.place(10, 10, RES_BASE + 4).unwrap();
        let after = digest(&grid, &overlays, &rng, 0, &valves);
        assert_ne!(before, after);
    }

    #[test]
    fn test_overlay_change_changes_digest() {
        let (grid, mut overlays, rng, valves) = fresh();
        let before = digest(&grid, &overlays, &rng, 0, &valves);
        overlays.pollution.set(3, 3, 99);
        let after = digest(&grid, &overlays, &rng, 0, &valves);
        assert_ne!(before, after);
    }

    #[test]
    fn test_clock_and_rng_feed_digest() {
        let (grid, overlays, mut rng, valves) = fresh();
        let at_zero = digest(&grid, &overlays, &rng, 0, &valves);
        assert_ne!(at_zero, digest(&grid, &overlays, &rng, 1, &valves));
        rng.rand16();
        assert_ne!(at_zero, digest(&grid, &overlays, &rng, 0, &valves));
    }

    #[test]
    fn test_valve_change_changes_digest() {
        let (grid, overlays, rng, mut valves) = fresh();
        let before = digest(&grid, &overlays, &rng, 0, &valves);
        valves.set_external(500, 0, 0);
        let after = digest(&grid, &overlays, &rng, 0, &valves);
        assert_ne!(before, after);
    }
}
