//! Deterministic city-simulation core.
//!
//! The crate models a 120x100 tile city: zoned districts that grow and
//! decay, a power grid flood-filled from generator plants, a biased-walk
//! traffic model, smoothed overlay fields (pollution, crime, land value,
//! density), demand valves, disasters, and a fiscal cycle. Everything is
//! driven by [`Simulation::step`] in a fixed per-tick order from a seeded
//! RNG, so two simulations stepped from the same seed and grid stay
//! byte-identical; [`Simulation::digest`] is the oracle for that claim.
//!
//! The host owns persistence and presentation. State moves in and out
//! through [`Simulation::from_parts`] and [`Simulation::into_parts`];
//! terrain for a fresh city comes from the [`generation`] module.

pub mod ascii_map;
pub mod budget;
pub mod census;
pub mod config;
pub mod digest;
pub mod disasters;
pub mod error;
pub mod generation;
pub mod grid;
pub mod power;
pub mod rng;
pub mod roads;
pub mod scan;
pub mod sprites;
pub mod tiles;
pub mod traffic;
pub mod valves;
pub mod zones;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

#[cfg(test)]
mod integration_tests;

use serde::{Deserialize, Serialize};

pub use crate::budget::FiscalReport;
pub use crate::census::{Census, CityStats};
pub use crate::config::{Difficulty, GrowthTuning, ScanTuning, SimConfig, TrafficTuning};
pub use crate::disasters::{DisasterKind, DisasterState};
pub use crate::error::{Result, SimError};
pub use crate::generation::GenerationConfig;
pub use crate::grid::{Overlays, TileGrid, WORLD_H, WORLD_W};
pub use crate::rng::SimRng;
pub use crate::sprites::{SpriteKind, SpritePool};
pub use crate::tiles::{Tile, ZoneFamily};
pub use crate::valves::Valves;

/// Demand valves refresh on this cadence.
const VALVE_INTERVAL: u64 = 2;
/// Ticks per city month (census boundary).
const MONTH_TICKS: u64 = 4;
/// Ticks per city year (fiscal boundary).
const YEAR_TICKS: u64 = 48;

/// Ticks-per-second hint for the host's run loop. Tick content is
/// identical at every speed; this only paces the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Speed {
    Paused,
    Slow,
    #[default]
    Normal,
    Fast,
}

impl Speed {
    pub fn ticks_per_second(self) -> u32 {
        match self {
            Speed::Paused => 0,
            Speed::Slow => 1,
            Speed::Normal => 4,
            Speed::Fast => 16,
        }
    }
}

/// Boundary and disaster events surfaced by [`Simulation::step`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    DisasterStarted { kind: DisasterKind, x: i32, y: i32 },
    DisasterEnded { kind: DisasterKind },
    CensusTaken { census: Census },
    FiscalClosed { report: FiscalReport },
}

/// Aggregate of everything that happened across one `step` call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TickSummary {
    pub ticks: u32,
    pub zones_grown: u32,
    pub zones_decayed: u32,
    pub growth_vetoes: u32,
    /// True if any power scan in the window left demand unmet.
    pub power_shortfall: bool,
    /// Unpowered zone count as of the final tick.
    pub unpowered_zones: u32,
    pub events: Vec<SimEvent>,
}

/// The exclusively-owned mutable world. Every subsystem call borrows what
/// it needs from here; nothing lives in module globals.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub grid: TileGrid,
    pub overlays: Overlays,
    pub rng: SimRng,
    pub stats: CityStats,
    pub valves: Valves,
    pub sprites: SpritePool,
    pub disasters: DisasterState,
    pub clock: u64,
    pub funds: i64,
}

/// The embeddable simulation: configuration plus owned state, advanced by
/// [`step`](Self::step).
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    state: SimulationState,
    speed: Speed,
}

impl Simulation {
    /// Generate terrain from the seed and start a fresh city on it.
    pub fn new_city(config: SimConfig, seed: u64) -> Result<Self> {
        let grid = generation::generate(seed, &GenerationConfig::default());
        Self::from_parts(config, seed, grid, None)
    }

    /// Start from externally supplied state. Overlay dimensions are
    /// validated; tile ids were already validated by `TileGrid` itself.
    pub fn from_parts(
        config: SimConfig,
        seed: u64,
        grid: TileGrid,
        overlays: Option<Overlays>,
    ) -> Result<Self> {
        config.validate()?;
        let overlays = match overlays {
            Some(overlays) => {
                check_overlay_dims(&overlays)?;
                overlays
            }
            None => Overlays::new(),
        };
        let funds = config.starting_funds;
        Ok(Self {
            config,
            state: SimulationState {
                grid,
                overlays,
                rng: SimRng::new(seed),
                stats: CityStats::default(),
                valves: Valves::default(),
                sprites: SpritePool::default(),
                disasters: DisasterState::default(),
                clock: 0,
                funds,
            },
            speed: Speed::Normal,
        })
    }

    // --------------------------------------------------------------------
    // Accessors
    // --------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &TileGrid {
        &self.state.grid
    }

    pub fn parts(&self) -> (&TileGrid, &Overlays) {
        (&self.state.grid, &self.state.overlays)
    }

    pub fn into_parts(self) -> (TileGrid, Overlays) {
        (self.state.grid, self.state.overlays)
    }

    /// Mutable tile access for external editors; the same API internal
    /// subsystems use, no privileged path.
    pub fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.state.grid
    }

    pub fn overlays(&self) -> &Overlays {
        &self.state.overlays
    }

    pub fn stats(&self) -> &CityStats {
        &self.state.stats
    }

    pub fn valves(&self) -> Valves {
        self.state.valves
    }

    pub fn sprites(&self) -> &SpritePool {
        &self.state.sprites
    }

    pub fn clock(&self) -> u64 {
        self.state.clock
    }

    pub fn funds(&self) -> i64 {
        self.state.funds
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    /// Override the demand valves; the built-in model goes dormant until
    /// [`release_demand`](Self::release_demand).
    pub fn set_demand(&mut self, res: i32, com: i32, ind: i32) {
        self.state.valves.set_external(res, com, ind);
    }

    pub fn release_demand(&mut self) {
        self.state.valves.release_external();
    }

    /// Canonical state checksum for desync detection.
    pub fn digest(&self) -> u32 {
        let s = &self.state;
        digest::digest(&s.grid, &s.overlays, &s.rng, s.clock, &s.valves)
    }

    // --------------------------------------------------------------------
    // Stepping
    // --------------------------------------------------------------------

    /// Advance `ticks` ticks and aggregate what happened.
    pub fn step(&mut self, ticks: u32) -> TickSummary {
        let mut summary = TickSummary::default();
        for _ in 0..ticks {
            self.tick(&mut summary);
            summary.ticks += 1;
        }
        summary.unpowered_zones = self.state.stats.census.unpowered_zones;
        summary
    }

    /// Force a disaster right now, regardless of the auto-trigger roll.
    /// A meltdown needs a nuclear plant and is a no-op without one.
    pub fn trigger_disaster(&mut self, kind: DisasterKind) -> Vec<SimEvent> {
        let s = &mut self.state;
        let mut report = disasters::DisasterReport::default();
        match kind {
            DisasterKind::Fire => disasters::start_fire(&mut s.grid, &mut s.rng, &mut report),
            DisasterKind::Flood => {
                disasters::start_flood(&mut s.grid, &mut s.disasters, &mut s.rng, &mut report)
            }
            DisasterKind::Tornado => {
                disasters::start_tornado(&mut s.sprites, &mut s.rng, &mut report)
            }
            DisasterKind::Earthquake => {
                disasters::start_earthquake(&mut s.grid, &mut s.rng, &mut report)
            }
            DisasterKind::Monster => {
                disasters::start_monster(&mut s.sprites, &s.overlays, &mut report)
            }
            DisasterKind::Meltdown => {
                let plant = s
                    .grid
                    .iter()
                    .find(|(_, _, t)| t.id() == tiles::NUCLEAR_PLANT)
                    .map(|(x, y, _)| (x, y));
                if let Some((x, y)) = plant {
                    disasters::meltdown_at(
                        &mut s.grid,
                        &mut s.sprites,
                        &mut s.rng,
                        x,
                        y,
                        &mut report,
                    );
                }
            }
        }
        let mut events = Vec::new();
        collect_disaster_events(&report, &mut events);
        events
    }

    fn tick(&mut self, summary: &mut TickSummary) {
        let config = &self.config;
        let s = &mut self.state;

        // 1. New tick: advance the clock, clear the running census.
        s.clock += 1;
        s.stats.census.reset();

        // 2. Power flood-fill.
        if s.clock % config.power_interval as u64 == 0 {
            let report = power::scan(&mut s.grid);
            summary.power_shortfall |= report.shortfall();
        }

        // 3. Zone growth raster scan; accumulates the census.
        let zone_report = zones::scan(
            &mut s.grid,
            &mut s.overlays,
            &mut s.stats,
            &s.valves,
            &mut s.sprites,
            &mut s.rng,
            config,
            s.clock,
        );
        summary.zones_grown += zone_report.grown;
        summary.zones_decayed += zone_report.decayed;
        summary.growth_vetoes += zone_report.growth_vetoes;

        // 4. Network upkeep and the per-tick overlay decays.
        let upkeep = roads::upkeep(&mut s.grid, &mut s.overlays, &mut s.rng, config, s.clock);
        s.stats.census.road_tiles = upkeep.road_tiles;
        s.stats.census.rail_tiles = upkeep.rail_tiles;

        // 5. Overlay scanner.
        if s.clock % config.scan_interval as u64 == 0 {
            scan::scan(&s.grid, &mut s.overlays, &mut s.rng, config);
        }

        // 6. Disasters: auto-trigger roll, fire/flood passes, any meltdown
        //    the zone scan rolled, then sprite movement.
        let mut disaster_report = disasters::tick(
            &mut s.grid,
            &s.overlays,
            &mut s.sprites,
            &mut s.disasters,
            &mut s.rng,
            config,
        );
        for (x, y) in &zone_report.meltdowns {
            disasters::meltdown_at(
                &mut s.grid,
                &mut s.sprites,
                &mut s.rng,
                *x,
                *y,
                &mut disaster_report,
            );
        }
        s.sprites.advance_all(&mut s.grid, &s.overlays, &mut s.rng);
        s.stats.census.fire_tiles = disaster_report.fire_tiles;
        s.stats.census.flood_tiles = disaster_report.flood_tiles;
        collect_disaster_events(&disaster_report, &mut summary.events);

        // 7. Boundary work.
        if s.clock % VALVE_INTERVAL == 0 {
            s.valves.refresh(&s.stats, config);
        }
        if s.clock % MONTH_TICKS == 0 {
            s.stats.take_census(
                s.overlays.crime_average,
                s.overlays.pollution_average,
                s.funds,
            );
            summary.events.push(SimEvent::CensusTaken {
                census: s.stats.census,
            });
        }
        if s.clock % YEAR_TICKS == 0 {
            let report = budget::fiscal_year(&s.stats.census, s.overlays.land_value_average, config);
            s.funds += report.cash_flow;
            summary.events.push(SimEvent::FiscalClosed { report });
        }
    }
}

fn collect_disaster_events(report: &disasters::DisasterReport, events: &mut Vec<SimEvent>) {
    for (kind, x, y) in &report.started {
        events.push(SimEvent::DisasterStarted {
            kind: *kind,
            x: *x,
            y: *y,
        });
    }
    for kind in &report.ended {
        events.push(SimEvent::DisasterEnded { kind: *kind });
    }
}

fn check_overlay_dims(overlays: &Overlays) -> Result<()> {
    use crate::grid::{EIGHTH_H, EIGHTH_W, HALF_H, HALF_W, QUARTER_H, QUARTER_W};
    let half_ok = [
        &overlays.population_density,
        &overlays.traffic_density,
        &overlays.pollution,
        &overlays.land_value,
        &overlays.crime,
    ]
    .iter()
    .all(|o| o.width() == HALF_W && o.height() == HALF_H);
    let quarter_ok =
        overlays.terrain.width() == QUARTER_W && overlays.terrain.height() == QUARTER_H;
    let eighth_ok = overlays.fire_effect.width() == EIGHTH_W
        && overlays.fire_effect.height() == EIGHTH_H
        && overlays.police_effect.width() == EIGHTH_W
        && overlays.police_effect.height() == EIGHTH_H
        && overlays.commercial_rate.width() == EIGHTH_W
        && overlays.commercial_rate.height() == EIGHTH_H
        && overlays.rate_of_growth.width() == EIGHTH_W
        && overlays.rate_of_growth.height() == EIGHTH_H;
    if half_ok && quarter_ok && eighth_ok {
        Ok(())
    } else {
        Err(SimError::Format("overlay dimensions do not match the world".into()))
    }
}
