use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use simulation::test_harness::TestCity;
use simulation::{SimConfig, Simulation, ZoneFamily};

fn hand_laid_city() -> Simulation {
    let mut city = TestCity::new()
        .config(SimConfig {
            disasters_enabled: false,
            ..SimConfig::default()
        })
        .coal_plant(10, 10)
        .wire_h(12, 60, 10)
        .road_h(5, 80, 12);
    for cx in (16..76).step_by(4) {
        let family = match (cx / 4) % 3 {
            0 => ZoneFamily::Residential,
            1 => ZoneFamily::Commercial,
            _ => ZoneFamily::Industrial,
        };
        city = city.zone(family, cx, 15);
    }
    city.build()
}

fn bench_ticks(c: &mut Criterion) {
    c.bench_function("tick_hand_laid", |b| {
        b.iter_batched(
            hand_laid_city,
            |mut sim| sim.step(1),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("month_hand_laid", |b| {
        b.iter_batched(
            hand_laid_city,
            |mut sim| sim.step(4),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("tick_generated", |b| {
        b.iter_batched(
            || Simulation::new_city(SimConfig::default(), 42).expect("valid default config"),
            |mut sim| sim.step(1),
            BatchSize::SmallInput,
        )
    });
}

fn bench_generation(c: &mut Criterion) {
    c.bench_function("generate_terrain", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            simulation::generation::generate(seed, &simulation::GenerationConfig::default())
        })
    });
}

criterion_group!(benches, bench_ticks, bench_generation);
criterion_main!(benches);
