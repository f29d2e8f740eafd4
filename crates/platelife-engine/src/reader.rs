//! Optical reading -> life state

use platelife_core::{LifeState, MeasurementGrid};

/// Thresholds absorbance readings into alive/dead wells.
#[derive(Clone, Copy, Debug)]
pub struct StateReader {
    threshold: f64,
}

impl StateReader {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// A well is alive iff its reading is strictly above the threshold.
    pub fn read(&self, reading: &MeasurementGrid) -> LifeState {
        reading.map(|&od| od > self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platelife_core::Grid;

    #[test]
    fn threshold_is_exclusive() {
        let reading = Grid::from_rows(vec![vec![0.29, 0.3, 0.31]]).unwrap();
        let state = StateReader::new(0.3).read(&reading);
        assert_eq!(state.to_pattern(), "..#");
    }
}
