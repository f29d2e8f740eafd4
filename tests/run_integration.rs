//! Whole-run tests: seed a simulated plate, run the loop, inspect the result

use platelife::patterns;
use platelife::{simulate, SnapshotSink};
use platelife_core::{Dimensions, LifeState, RunConfig};
use platelife_engine::{LoopState, NullSink};
use platelife_hw::{CommandKind, SimConfig};
use std::sync::Arc;

fn config(max_cycles: usize) -> RunConfig {
    let mut config = RunConfig::default();
    config.life.max_cycles = max_cycles;
    config
}

fn builtin(name: &str) -> LifeState {
    patterns::find(name).unwrap().state().unwrap()
}

fn on_plate(seed: &LifeState) -> LifeState {
    patterns::place(seed, Dimensions::plate_96()).unwrap()
}

// ===========================================================================
// Built-in patterns
// ===========================================================================

#[tokio::test]
async fn block_terminates_on_first_read() {
    let run = simulate(config(50), &builtin("block"), SimConfig::default(), Arc::new(NullSink))
        .await
        .unwrap();
    assert_eq!(run.summary.final_state, LoopState::Terminated);
    assert_eq!(run.summary.reads, 1);
    assert_eq!(run.summary.last_state, on_plate(&builtin("block")));
}

#[tokio::test]
async fn blinker_returns_to_seed_every_two_cycles() {
    let seed = builtin("blinker");
    let run = simulate(config(4), &seed, SimConfig::default(), Arc::new(NullSink))
        .await
        .unwrap();
    assert_eq!(run.summary.final_state, LoopState::Exhausted);
    assert_eq!(run.summary.cycles, 4);
    assert_eq!(run.summary.last_state, on_plate(&seed));
}

#[tokio::test]
async fn beacon_and_toad_oscillate() {
    for name in ["beacon", "toad"] {
        let seed = builtin(name);
        let run = simulate(config(2), &seed, SimConfig::default(), Arc::new(NullSink))
            .await
            .unwrap();
        assert_eq!(run.summary.final_state, LoopState::Exhausted, "{name}");
        assert_eq!(run.summary.last_state, on_plate(&seed), "{name}");
    }
}

#[tokio::test]
async fn glider_moves_across_the_plate() {
    let seed = builtin("glider");
    let run = simulate(config(4), &seed, SimConfig::default(), Arc::new(NullSink))
        .await
        .unwrap();
    let start = on_plate(&seed);
    let last = &run.summary.last_state;
    assert_eq!(last.alive(), 5);
    for ((row, column), &alive) in start.iter() {
        if alive {
            assert!(last[(row + 1, column + 1)]);
        }
    }
}

#[tokio::test]
async fn liquid_is_conserved_across_a_run() {
    let seed = builtin("glider");
    let run = simulate(config(6), &seed, SimConfig::default(), Arc::new(NullSink))
        .await
        .unwrap();
    let wells: f64 = run.workcell.well_volumes().await.iter().map(|(_, &v)| v).sum();
    let reservoir = run.workcell.reservoir_volume().await;
    assert!((wells + reservoir - (500.0 + SimConfig::default().reservoir_volume)).abs() < 1e-6);
}

// ===========================================================================
// Faults and validation
// ===========================================================================

#[tokio::test]
async fn under_aspiration_is_tolerated_for_the_whole_run() {
    let sim = SimConfig {
        aspirate_efficiency: 0.9,
        ..SimConfig::default()
    };
    let seed = builtin("blinker");
    let run = simulate(config(4), &seed, sim, Arc::new(NullSink)).await.unwrap();
    assert_eq!(run.summary.final_state, LoopState::Exhausted);
    assert_eq!(run.summary.tolerated.len(), 4);
    assert!(run
        .summary
        .tolerated
        .iter()
        .all(|(_, f)| f.command == CommandKind::Dispense));
    assert_eq!(run.summary.last_state, on_plate(&seed));
}

#[tokio::test]
async fn invalid_config_is_rejected_before_any_command() {
    let mut config = config(5);
    config.transfer.alive_volume = -1.0;
    let result = simulate(config, &builtin("block"), SimConfig::default(), Arc::new(NullSink)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn oversized_seed_is_rejected() {
    let seed = LifeState::from_pattern(&["#############"]).unwrap();
    let result = simulate(config(5), &seed, SimConfig::default(), Arc::new(NullSink)).await;
    assert!(result.is_err());
}

// ===========================================================================
// Snapshots
// ===========================================================================

#[tokio::test]
async fn snapshots_are_written_per_read() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(SnapshotSink::new(dir.path().join("readings")).unwrap());
    simulate(config(2), &builtin("blinker"), SimConfig::default(), sink.clone())
        .await
        .unwrap();

    for cycle in 0..3 {
        let json = sink.dir().join(format!("plate_reading_{cycle}.json"));
        let text = std::fs::read_to_string(&json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["cycle"], cycle);
        assert_eq!(value["dimensions"]["rows"], 8);
        assert_eq!(value["values"].as_array().unwrap().len(), 8);
        assert!(value["timestamp"].is_string());
        assert!(sink.dir().join(format!("plate_reading_{cycle}.txt")).exists());
    }
    assert!(!sink.dir().join("plate_reading_3.json").exists());
}
