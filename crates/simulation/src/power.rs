//! Power propagation.
//!
//! A breadth-first flood fill from every generator through conductive tiles
//! recomputes the powered bit city-wide. When the reached tile count exceeds
//! total generation capacity the farthest tiles lose power for the tick, in
//! reverse flood-fill order. A rolling outage, not a random one: the same
//! grid always browns out the same tiles.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::grid::{TileGrid, WORLD_H, WORLD_W};
use crate::tiles::{self, SpecialZone};

/// Tiles one coal plant can power.
pub const COAL_OUTPUT: u32 = 700;
/// Tiles one nuclear plant can power.
pub const NUCLEAR_OUTPUT: u32 = 2000;

/// Outcome of one power scan, surfaced in the tick summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PowerReport {
    /// Conductive tiles reached by the flood fill.
    pub reached: u32,
    /// Total generation capacity in tiles.
    pub capacity: u32,
    /// Tiles that lost power to the rolling outage this scan.
    pub browned_out: u32,
}

impl PowerReport {
    pub fn shortfall(&self) -> bool {
        self.browned_out > 0
    }
}

/// Recompute the powered bit for the whole grid.
pub fn scan(grid: &mut TileGrid) -> PowerReport {
    // Drop every powered bit first; the fill below re-grants them.
    grid.for_each_mut(|_, _, tile| {
        *tile = tile.clear(tiles::POWERED);
    });

    let mut seeds = Vec::new();
    let mut capacity = 0u32;
    for (x, y, tile) in grid.iter() {
        match tile.special_zone() {
            Some(SpecialZone::CoalPlant) => {
                capacity += COAL_OUTPUT;
                seeds.push((x, y));
            }
            Some(SpecialZone::NuclearPlant) => {
                capacity += NUCLEAR_OUTPUT;
                seeds.push((x, y));
            }
            _ => {}
        }
    }

    if seeds.is_empty() {
        return PowerReport::default();
    }

    // Breadth-first fill; the visit order doubles as the distance ranking
    // the outage policy needs.
    let mut visited = vec![false; WORLD_W * WORLD_H];
    let mut queue = VecDeque::new();
    let mut order = Vec::new();
    for &(x, y) in &seeds {
        let idx = y as usize * WORLD_W + x as usize;
        if !visited[idx] {
            visited[idx] = true;
            queue.push_back((x, y));
            order.push((x, y));
        }
    }
    while let Some((x, y)) = queue.pop_front() {
        for (dx, dy) in [(0, -1), (-1, 0), (1, 0), (0, 1)] {
            let (nx, ny) = (x + dx, y + dy);
            if !grid.in_bounds(nx, ny) {
                continue;
            }
            let idx = ny as usize * WORLD_W + nx as usize;
            if visited[idx] || !grid.get_or_dirt(nx, ny).is_conductive() {
                continue;
            }
            visited[idx] = true;
            queue.push_back((nx, ny));
            order.push((nx, ny));
        }
    }

    let reached = order.len() as u32;
    let powered = reached.min(capacity) as usize;
    for &(x, y) in order.iter().take(powered) {
        let tile = grid.get_or_dirt(x, y).set(tiles::POWERED);
        // In-bounds by construction of the fill.
        let _ = grid.set(x, y, tile);
    }

    let report = PowerReport {
        reached,
        capacity,
        browned_out: reached - powered as u32,
    };
    if report.shortfall() {
        tracing::debug!(
            reached = report.reached,
            capacity = report.capacity,
            browned_out = report.browned_out,
            "power shortfall, rolling outage applied"
        );
    }
    report
}
