//! Performance benchmarks for the per-update hot path

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use server::config::MineConfig;
use server::messages::{classic_detonation_templates, render, Bindings};
use server::mine::Candidate;
use server::minefield::MineField;
use server::testing::MockHost;
use shared::{Team, Vec3};
use std::time::{Duration, Instant};

const MINE_COUNT: usize = 1_000;

/// Fills a field with mines scattered over a large map, all owned by one
/// red player.
fn scattered_field(host: &mut MockHost) -> MineField {
    let config = MineConfig::default();
    let mut field = MineField::new(&config);
    let mut rng = StdRng::seed_from_u64(42);

    host.add_player(1, "owner", Team::Red, Vec3::default());
    for _ in 0..MINE_COUNT {
        host.move_player(1, Vec3::new(rng.gen_range(-400.0..400.0), rng.gen_range(-400.0..400.0), 0.0));
        let owner = host.players[&1].clone();
        let now = host.now;
        field.place(host, &owner, now);
    }
    field
}

/// Benchmarks evaluating updates that miss every mine
#[test]
fn benchmark_evaluate_misses() {
    let mut host = MockHost::new();
    let mut field = scattered_field(&mut host);
    host.add_player(2, "runner", Team::Blue, Vec3::new(1_000.0, 1_000.0, 0.0));
    let candidate = Candidate::from_record(&host.players[&2], "BD");
    let now = host.now;

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        assert!(field.evaluate(&mut host, &candidate, now, Duration::ZERO).is_none());
    }

    let duration = start.elapsed();
    println!(
        "Evaluate over {} mines: {} iterations in {:?} ({:.2} μs/iter)",
        MINE_COUNT,
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds even in debug builds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks a runner sweeping the map until every mine is gone
#[test]
fn benchmark_clear_field() {
    let mut host = MockHost::new();
    let mut field = scattered_field(&mut host);
    host.add_player(2, "runner", Team::Blue, Vec3::default());

    let start = Instant::now();
    let mut triggered = 0;

    let positions: Vec<Vec3> = field.mines().map(|mine| mine.position()).collect();
    for position in positions {
        host.move_player(2, position);
        let candidate = Candidate::from_record(&host.players[&2], "BD");
        let now = host.now;
        while field.evaluate(&mut host, &candidate, now, Duration::ZERO).is_some() {
            triggered += 1;
        }
    }

    let duration = start.elapsed();
    println!("Cleared {} mines in {:?}", triggered, duration);

    assert_eq!(triggered, MINE_COUNT);
    assert_eq!(field.count(false), 0);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks rendering flavor text
#[test]
fn benchmark_render() {
    let templates = classic_detonation_templates();
    let bindings = Bindings {
        owner: "alice",
        victim: "bob",
        defuser: None,
        mine_count: 12,
    };

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let text = render(&templates[i % templates.len()], &bindings);
        assert!(!text.is_empty());
    }

    let duration = start.elapsed();
    println!(
        "Render: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}
