use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use warfront::ai::{plan_faction, FactionAiState};
use warfront::core::types::FactionId;
use warfront::scenario::demo_state;
use warfront::turn::simulate_turn;
use warfront::world::GameState;

/// Demo map played forward `turns` turns
fn warmed_up(turns: u32) -> GameState {
    let mut state = demo_state(Some(7)).expect("demo scenario loads");
    for _ in 0..turns {
        state = simulate_turn(&state).0;
    }
    state
}

fn bench_turn(c: &mut Criterion) {
    let mut group = c.benchmark_group("turn");

    for warmup in [0u32, 5, 15] {
        let start = warmed_up(warmup);
        group.bench_with_input(BenchmarkId::new("simulate", warmup), &start, |b, start| {
            b.iter_batched(
                || start.clone(),
                |state| simulate_turn(&state),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_planner(c: &mut Criterion) {
    let state = warmed_up(5);
    let faction = FactionId(1);
    let prior = state
        .ai_state(faction)
        .cloned()
        .unwrap_or_else(|| FactionAiState::new(faction));

    c.bench_function("plan_faction", |b| {
        b.iter_batched(
            || (prior.clone(), ChaCha8Rng::seed_from_u64(3)),
            |(prior, mut rng)| plan_faction(&state, prior, faction, &mut rng),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(turn_benches, bench_turn, bench_planner);
criterion_main!(turn_benches);
