use cell_survivor::monsters::{Position, Viewport};
use cell_survivor::{GameConfig, Simulation, TickInput};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

const FRAME_MS: u64 = 16;

fn populated_sim() -> (Simulation, TickInput) {
    let mut sim = Simulation::new(GameConfig::default()).expect("default config is valid");
    let player = Position::new(2400.0, 2400.0);
    let input = TickInput {
        delta_ms: FRAME_MS,
        player,
        viewport: Viewport::centered_on(player, 1600.0, 900.0),
    };

    sim.start();
    if let Some(&first) = sim.pending_choice().and_then(|o| o.first()) {
        sim.choose_skill(first);
    }
    sim.set_spawning(false);
    let unit = sim.config().units().unit();
    for i in 0..200 {
        let angle = i as f64 * 0.31;
        let distance = (6.0 + (i % 20) as f64) * unit;
        let kind = ["slime", "bat", "skeleton", "golem"][i % 4];
        sim.spawn_monster(kind, player.offset(angle, distance))
            .expect("catalog monster");
    }
    (sim, input)
}

fn bench_tick(c: &mut Criterion) {
    c.bench_function("tick_200_monsters", |b| {
        b.iter_batched(
            populated_sim,
            |(mut sim, input)| {
                for _ in 0..10 {
                    black_box(sim.tick(input));
                }
                sim.drain_events().len()
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
