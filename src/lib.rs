//! Platelife - Conway's Game of Life played on a 96-well plate by a liquid handler

pub mod patterns;
pub mod simulate;
pub mod snapshot;

pub use simulate::{simulate, SimulatedRun};
pub use snapshot::SnapshotSink;
