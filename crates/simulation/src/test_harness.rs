//! Shared scaffolding for tests and benches: a fluent city builder that
//! lays roads, wires and zones on a blank grid without going through the
//! terrain generator.

use crate::config::SimConfig;
use crate::grid::TileGrid;
use crate::tiles::{self, ZoneFamily};
use crate::{Simulation, TickSummary};

/// Builds a hand-laid city tile by tile, then hands over a [`Simulation`].
pub struct TestCity {
    grid: TileGrid,
    config: SimConfig,
    seed: u64,
}

impl Default for TestCity {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCity {
    pub fn new() -> Self {
        Self {
            grid: TileGrid::new(),
            config: SimConfig::default(),
            seed: 1,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Horizontal road segment, inclusive of both endpoints.
    pub fn road_h(mut self, x0: i32, x1: i32, y: i32) -> Self {
        for x in x0..=x1 {
            self.grid.place(x, y, tiles::ROAD_FIRST + 2).unwrap();
        }
        self
    }

    pub fn road_v(mut self, x: i32, y0: i32, y1: i32) -> Self {
        for y in y0..=y1 {
            self.grid.place(x, y, tiles::ROAD_FIRST + 3).unwrap();
        }
        self
    }

    pub fn wire_h(mut self, x0: i32, x1: i32, y: i32) -> Self {
        for x in x0..=x1 {
            self.grid.place(x, y, tiles::WIRE_FIRST + 2).unwrap();
        }
        self
    }

    pub fn wire_v(mut self, x: i32, y0: i32, y1: i32) -> Self {
        for y in y0..=y1 {
            self.grid.place(x, y, tiles::WIRE_FIRST + 3).unwrap();
        }
        self
    }

    /// Empty zone lot of the given family, centered at (cx, cy).
    pub fn zone(mut self, family: ZoneFamily, cx: i32, cy: i32) -> Self {
        self.grid.place_zone(cx, cy, family.base()).unwrap();
        self
    }

    /// Zone lot pre-grown to a stage.
    pub fn zone_at_stage(mut self, family: ZoneFamily, cx: i32, cy: i32, stage: u8) -> Self {
        self.grid
            .place_zone(cx, cy, family.center_id(stage) - 4)
            .unwrap();
        self
    }

    pub fn coal_plant(mut self, cx: i32, cy: i32) -> Self {
        self.grid.place_zone(cx, cy, tiles::COAL_BASE).unwrap();
        self
    }

    pub fn nuclear_plant(mut self, cx: i32, cy: i32) -> Self {
        self.grid.place_zone(cx, cy, tiles::NUCLEAR_BASE).unwrap();
        self
    }

    pub fn tile(mut self, x: i32, y: i32, id: u16) -> Self {
        self.grid.place(x, y, id).unwrap();
        self
    }

    pub fn build(self) -> Simulation {
        Simulation::from_parts(self.config, self.seed, self.grid, None).unwrap()
    }

    /// Build and immediately step, returning both halves.
    pub fn run(self, ticks: u32) -> (Simulation, TickSummary) {
        let mut sim = self.build();
        let summary = sim.step(ticks);
        (sim, summary)
    }
}

/// Stage of the zone centered at (cx, cy), for growth assertions.
pub fn stage_at(sim: &Simulation, cx: i32, cy: i32) -> u8 {
    sim.grid()
        .get_or_dirt(cx, cy)
        .zone_stage()
        .unwrap_or_default()
}

/// True when every tile of the 3x3 lot at (cx, cy) reports powered.
pub fn zone_powered(sim: &Simulation, cx: i32, cy: i32) -> bool {
    (-1..=1).all(|dy| {
        (-1..=1).all(|dx| sim.grid().get_or_dirt(cx + dx, cy + dy).is_powered())
    })
}
