//! Randomized boundary safety for the route search: any start tile on any
//! road layout, the walk stays bounded and the overlay stays capped.

use proptest::prelude::*;
use rand::{Rng as _, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::TrafficTuning;
use crate::grid::{Overlays, TileGrid, WORLD_H, WORLD_W};
use crate::rng::SimRng;
use crate::tiles::{ZoneFamily, ROAD_FIRST};
use crate::traffic;

fn scattered_roads(seed: u64, count: usize) -> TileGrid {
    let mut chaos = ChaCha8Rng::seed_from_u64(seed);
    let mut grid = TileGrid::new();
    for _ in 0..count {
        let x = chaos.gen_range(0..WORLD_W as i32);
        let y = chaos.gen_range(0..WORLD_H as i32);
        grid.place(x, y, ROAD_FIRST + 2).unwrap();
    }
    grid
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_route_search_stays_in_bounds(
        grid_seed in 0u64..1000,
        rng_seed in 0u64..1000,
        cx in 0i32..WORLD_W as i32,
        cy in 0i32..WORLD_H as i32,
        family in prop_oneof![
            Just(ZoneFamily::Residential),
            Just(ZoneFamily::Commercial),
            Just(ZoneFamily::Industrial),
        ],
    ) {
        let grid = scattered_roads(grid_seed, 400);
        let mut overlays = Overlays::new();
        let mut rng = SimRng::new(rng_seed);
        let tuning = TrafficTuning::default();

        // Must return without panicking from any start tile, including the
        // map edges and corners.
        let _ = traffic::make_traffic(&grid, &mut overlays, &mut rng, &tuning, cx, cy, family);

        for &cell in overlays.traffic_density.cells() {
            prop_assert!(cell <= tuning.density_cap);
        }
    }

    #[test]
    fn test_roadless_map_always_reports_no_road(
        rng_seed in 0u64..1000,
        cx in 0i32..WORLD_W as i32,
        cy in 0i32..WORLD_H as i32,
    ) {
        let grid = TileGrid::new();
        let mut overlays = Overlays::new();
        let mut rng = SimRng::new(rng_seed);
        let tuning = TrafficTuning::default();
        let outcome = traffic::make_traffic(
            &grid, &mut overlays, &mut rng, &tuning, cx, cy, ZoneFamily::Residential,
        );
        prop_assert_eq!(outcome, traffic::RouteOutcome::NoRoad);
        prop_assert!(overlays.traffic_density.cells().iter().all(|&c| c == 0));
    }
}
