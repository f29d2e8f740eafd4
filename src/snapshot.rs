//! Per-cycle plate reading snapshots on disk

use chrono::{DateTime, Utc};
use platelife_core::{Dimensions, MeasurementGrid};
use platelife_engine::ReadingSink;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct Snapshot<'a> {
    cycle: usize,
    timestamp: DateTime<Utc>,
    dimensions: Dimensions,
    values: &'a [Vec<f64>],
}

/// Writes `plate_reading_{cycle}.json` and `plate_reading_{cycle}.txt` for
/// every reading. Write failures are logged and otherwise ignored.
pub struct SnapshotSink {
    dir: PathBuf,
}

impl SnapshotSink {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, reading: &MeasurementGrid, cycle: usize) -> anyhow::Result<()> {
        let values = reading.to_rows();
        let snapshot = Snapshot {
            cycle,
            timestamp: Utc::now(),
            dimensions: reading.dims(),
            values: &values,
        };
        let stem = format!("plate_reading_{cycle}");
        let json = self.dir.join(format!("{stem}.json"));
        std::fs::write(&json, serde_json::to_string_pretty(&snapshot)?)?;
        std::fs::write(self.dir.join(format!("{stem}.txt")), render_table(&values))?;
        debug!("wrote {}", json.display());
        Ok(())
    }
}

impl ReadingSink for SnapshotSink {
    fn publish(&self, reading: &MeasurementGrid, cycle: usize) {
        if let Err(e) = self.write(reading, cycle) {
            warn!("snapshot for cycle {} not written: {}", cycle, e);
        }
    }
}

/// Plate-style table: column numbers across, row letters down, two decimals.
pub fn render_table(values: &[Vec<f64>]) -> String {
    let columns = values.first().map_or(0, Vec::len);
    let mut out = String::from("  ");
    for column in 1..=columns {
        let _ = write!(out, " {column:>5}");
    }
    out.push('\n');
    for (row, cells) in values.iter().enumerate() {
        let letter = (b'A' + (row % 26) as u8) as char;
        let _ = write!(out, "{letter} ");
        for value in cells {
            let _ = write!(out, " {value:>5.2}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rounds_to_two_decimals() {
        let table = render_table(&[vec![0.05, 0.4512], vec![1.0, 0.333]]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "       1     2");
        assert_eq!(lines[1], "A   0.05  0.45");
        assert_eq!(lines[2], "B   1.00  0.33");
    }
}
