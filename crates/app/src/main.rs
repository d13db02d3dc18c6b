//! Headless sandbox host: generates a city, steps it, and prints what the
//! embedding contract exposes: tick summaries, census lines and an ASCII
//! map. No UI; this is the reference for wiring the library into a host.

use std::env;
use std::error::Error;

use simulation::{ascii_map, SimConfig, SimEvent, Simulation, Speed};
use tracing_subscriber::EnvFilter;

struct Args {
    seed: u64,
    ticks: u32,
    speed: Speed,
}

/// Positional `seed ticks speed` arguments, falling back to
/// `MICROCITY_SEED` / `MICROCITY_TICKS` / `MICROCITY_SPEED`, then defaults.
fn parse_args() -> Result<Args, Box<dyn Error>> {
    let argv: Vec<String> = env::args().skip(1).collect();
    let pick = |idx: usize, var: &str| -> Option<String> {
        argv.get(idx).cloned().or_else(|| env::var(var).ok())
    };

    let seed = match pick(0, "MICROCITY_SEED") {
        Some(raw) => raw.parse()?,
        None => 12345,
    };
    let ticks = match pick(1, "MICROCITY_TICKS") {
        Some(raw) => raw.parse()?,
        None => 240,
    };
    let speed = match pick(2, "MICROCITY_SPEED").as_deref() {
        Some("slow") => Speed::Slow,
        Some("fast") => Speed::Fast,
        Some("normal") | None => Speed::Normal,
        Some(other) => return Err(format!("unknown speed {other:?}").into()),
    };
    Ok(Args { seed, ticks, speed })
}

fn describe(event: &SimEvent) -> String {
    match event {
        SimEvent::DisasterStarted { kind, x, y } => {
            format!("disaster: {kind:?} at ({x}, {y})")
        }
        SimEvent::DisasterEnded { kind } => format!("disaster over: {kind:?}"),
        SimEvent::CensusTaken { census } => format!(
            "census: pop {} ({} res / {} com / {} ind zones), {} unpowered",
            census.total_pop(),
            census.res_zones,
            census.com_zones,
            census.ind_zones,
            census.unpowered_zones,
        ),
        SimEvent::FiscalClosed { report } => format!(
            "fiscal: tax {} spend {} flow {}",
            report.tax_income,
            report.total_spend(),
            report.cash_flow,
        ),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = parse_args()?;
    let mut sim = Simulation::new_city(SimConfig::default(), args.seed)?;
    sim.set_speed(args.speed);
    tracing::info!(
        seed = args.seed,
        ticks = args.ticks,
        tps = sim.speed().ticks_per_second(),
        "city ready"
    );

    println!("{}", ascii_map::overview(sim.grid(), 4));

    // One city month per step call, so the summaries line up with the
    // census boundary.
    let mut remaining = args.ticks;
    while remaining > 0 {
        let batch = remaining.min(4);
        let summary = sim.step(batch);
        remaining -= batch;

        if summary.zones_grown + summary.zones_decayed > 0 || !summary.events.is_empty() {
            println!(
                "tick {:>5}: +{} -{} zones, {} vetoes{}",
                sim.clock(),
                summary.zones_grown,
                summary.zones_decayed,
                summary.growth_vetoes,
                if summary.power_shortfall { ", POWER SHORTFALL" } else { "" },
            );
        }
        for event in &summary.events {
            println!("  {}", describe(event));
        }
    }

    println!("{}", ascii_map::overview(sim.grid(), 4));
    println!("funds: {}", sim.funds());
    println!("digest: {:#010x}", sim.digest());
    println!("{}", serde_json::to_string_pretty(&sim.stats().census)?);
    Ok(())
}
