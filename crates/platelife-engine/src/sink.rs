//! Per-cycle reading output

use platelife_core::MeasurementGrid;

/// Receives every plate reading with its cycle index.
///
/// Fire-and-forget: implementations handle their own failures, the control
/// loop never waits on or reacts to a sink.
pub trait ReadingSink: Send + Sync {
    fn publish(&self, reading: &MeasurementGrid, cycle: usize);
}

/// Discards readings.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ReadingSink for NullSink {
    fn publish(&self, _reading: &MeasurementGrid, _cycle: usize) {}
}
