use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gsemu_core::Timestamp;
use gsemu_game::{GameState, Target, DEFAULT_PLAYER_SLOTS};
use gsemu_protocol::{Encoder, PhaseSelection};

fn full_server() -> GameState {
    let mut state = GameState::default();
    for slot in 0..DEFAULT_PLAYER_SLOTS {
        let _ = state.set(Target::Player(slot), "player_", format!("Player{:02}", slot));
        let _ = state.set(Target::Player(slot), "score_", (slot * 7).to_string());
        let _ = state.set(Target::Player(slot), "ping_", "45");
        let _ = state.set(Target::Player(slot), "team_", (slot % 2 + 1).to_string());
        let _ = state.set(Target::Player(slot), "pid_", (40_000_000 + slot).to_string());
    }
    state
}

fn bench_encode(c: &mut Criterion) {
    let empty = GameState::default();
    let full = full_server();
    let timestamp = Timestamp::new([1, 2, 3, 4]);

    c.bench_function("encode_empty_server", |b| {
        b.iter(|| Encoder::new(black_box(&empty), timestamp).encode(PhaseSelection::ALL))
    });
    c.bench_function("encode_full_server", |b| {
        b.iter(|| Encoder::new(black_box(&full), timestamp).encode(PhaseSelection::ALL))
    });
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
