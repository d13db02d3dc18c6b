//! Checks the power flood-fill against an independent BFS on randomized
//! wire layouts.

use pathfinding::prelude::bfs_reach;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::grid::{TileGrid, WORLD_H, WORLD_W};
use crate::power;
use crate::tiles::{self, WIRE_FIRST};

fn random_wired_grid(seed: u64) -> TileGrid {
    let mut chaos = ChaCha8Rng::seed_from_u64(seed);
    let mut grid = TileGrid::new();
    for _ in 0..300 {
        let x = chaos.gen_range(0..WORLD_W as i32);
        let y = chaos.gen_range(0..WORLD_H as i32);
        grid.place(x, y, WIRE_FIRST + 2).unwrap();
    }
    // The plant goes down last so its footprint stays intact.
    grid.place_zone(30, 30, tiles::COAL_BASE).unwrap();
    grid
}

/// Every conductive tile reachable from the plant center through 4-adjacent
/// conductive tiles, computed by the `pathfinding` crate.
fn oracle_reach(grid: &TileGrid) -> Vec<(i32, i32)> {
    bfs_reach((30i32, 30i32), |&(x, y)| {
        [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
            .into_iter()
            .filter(|&(nx, ny)| grid.get_or_dirt(nx, ny).is_conductive())
            .collect::<Vec<_>>()
    })
    .collect()
}

#[test]
fn test_powered_iff_reachable() {
    for seed in 0..10 {
        let mut grid = random_wired_grid(seed);
        let report = power::scan(&mut grid);
        // Well under one plant's capacity, so no rolling outage interferes.
        assert!(!report.shortfall(), "seed {seed}");

        let reachable = oracle_reach(&grid);
        for (x, y, tile) in grid.iter() {
            if !tile.is_conductive() {
                assert!(!tile.is_powered(), "non-conductive powered at {x},{y}");
                continue;
            }
            assert_eq!(
                tile.is_powered(),
                reachable.contains(&(x, y)),
                "mismatch at {x},{y} (seed {seed})"
            );
        }
    }
}

#[test]
fn test_oracle_agrees_on_reached_count() {
    let mut grid = random_wired_grid(77);
    let report = power::scan(&mut grid);
    assert_eq!(report.reached as usize, oracle_reach(&grid).len());
}
