//! End-to-end scenarios: power reaching zones, forced decay, fire burnout
//! and overlay decay behavior.

use crate::config::{ScanTuning, SimConfig};
use crate::disasters::{self, DisasterState};
use crate::grid::Overlays;
use crate::rng::SimRng;
use crate::scan;
use crate::sprites::SpritePool;
use crate::test_harness::{stage_at, zone_powered, TestCity};
use crate::tiles::{self, ZoneFamily};

fn quiet_config() -> SimConfig {
    SimConfig {
        disasters_enabled: false,
        ..SimConfig::default()
    }
}

#[test]
fn test_wire_break_cuts_zone_power() {
    let mut sim = TestCity::new()
        .config(quiet_config())
        .coal_plant(10, 10)
        .wire_h(12, 20, 10)
        .zone(ZoneFamily::Residential, 22, 10)
        .build();
    sim.step(1);
    assert!(zone_powered(&sim, 22, 10));

    sim.grid_mut().place(16, 10, tiles::DIRT).unwrap();
    sim.step(1);
    assert!(!zone_powered(&sim, 22, 10));
}

#[test]
fn test_negative_demand_decays_one_stage_per_tick() {
    let mut sim = TestCity::new()
        .config(quiet_config())
        .coal_plant(10, 10)
        .wire_h(12, 20, 10)
        .zone_at_stage(ZoneFamily::Residential, 22, 10, 3)
        .build();
    sim.set_demand(-2000, -1500, -1500);

    for expected in [2, 1, 0] {
        sim.step(1);
        assert_eq!(stage_at(&sim, 22, 10), expected);
    }
    // Stage never goes below the empty lot.
    sim.step(5);
    assert_eq!(stage_at(&sim, 22, 10), 0);
}

#[test]
fn test_unpowered_zone_decays_eventually() {
    let mut sim = TestCity::new()
        .config(quiet_config())
        .zone_at_stage(ZoneFamily::Residential, 22, 10, 2)
        .build();
    sim.set_demand(2000, 0, 0);
    // Demand cannot save a dark zone; the 1-in-16 roll grinds it down.
    sim.step(300);
    assert_eq!(stage_at(&sim, 22, 10), 0);
}

#[test]
fn test_isolated_fire_burns_out() {
    let mut grid = TestCity::new().build().into_parts().0;
    grid.place(50, 50, tiles::FIRE_FIRST).unwrap();

    let overlays = Overlays::new();
    let mut sprites = SpritePool::default();
    let mut state = DisasterState::default();
    let mut rng = SimRng::new(5);
    let config = quiet_config();

    let mut burning = 1;
    for _ in 0..200 {
        let report = disasters::tick(
            &mut grid,
            &overlays,
            &mut sprites,
            &mut state,
            &mut rng,
            &config,
        );
        burning = report.fire_tiles;
        if burning == 0 {
            break;
        }
        // Nothing around it can catch; the fire never spreads.
        assert_eq!(burning, 1);
    }
    assert_eq!(burning, 0, "fire should self-extinguish");
    assert!(grid.get_or_dirt(50, 50).is_rubble());
}

#[test]
fn test_overlay_decay_halves_stale_pollution() {
    let grid = crate::grid::TileGrid::new();
    let mut overlays = Overlays::new();
    overlays.pollution.set(10, 10, 200);
    let mut rng = SimRng::new(1);
    let config = SimConfig {
        scan: ScanTuning {
            pollution_decay: 128,
            ..ScanTuning::default()
        },
        ..SimConfig::default()
    };
    scan::scan(&grid, &mut overlays, &mut rng, &config);
    // No sources on an empty map: the old reading decays by the blend
    // weight, 200 * 128 >> 8 = 100.
    assert_eq!(overlays.pollution.get(10, 10), 100);
}

#[test]
fn test_trigger_fire_starts_a_fire() {
    // Enough zoned area that the 40 arson probes cannot miss.
    let mut city = TestCity::new().config(quiet_config());
    for cx in (10..90).step_by(3) {
        for cy in (10..90).step_by(3) {
            city = city.zone(ZoneFamily::Residential, cx, cy);
        }
    }
    let mut sim = city.build();
    let events = sim.trigger_disaster(crate::DisasterKind::Fire);
    assert!(!events.is_empty());
    let burning = sim
        .grid()
        .iter()
        .filter(|(_, _, t)| t.is_fire())
        .count();
    assert!(burning > 0);
}
