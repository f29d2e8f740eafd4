//! Built-in seed patterns and seed files
//!
//! Patterns are drawn in `#`/`.` rows and placed with their top-left corner
//! on well A1. Each one leaves a margin so it evolves the same way on the
//! bounded plate as it would on an open board for the first generations.

use platelife_core::{Dimensions, Error, Grid, LifeState, Result};
use std::path::Path;

pub struct Pattern {
    pub name: &'static str,
    pub description: &'static str,
    pub rows: &'static [&'static str],
}

impl Pattern {
    pub fn state(&self) -> Result<LifeState> {
        LifeState::from_pattern(self.rows)
    }
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "blinker",
        description: "period-2 oscillator",
        rows: &[".....", "..#..", "..#..", "..#..", "....."],
    },
    Pattern {
        name: "block",
        description: "still life, terminates after one read",
        rows: &["....", ".##.", ".##.", "...."],
    },
    Pattern {
        name: "glider",
        description: "moves one well diagonally every 4 generations",
        rows: &["..#..", "...#.", ".###.", "....."],
    },
    Pattern {
        name: "toad",
        description: "period-2 oscillator",
        rows: &["......", "......", "..###.", ".###..", "......", "......"],
    },
    Pattern {
        name: "beacon",
        description: "period-2 oscillator",
        rows: &["......", ".##...", ".##...", "...##.", "...##.", "......"],
    },
];

/// Look up a built-in pattern by name, ignoring case.
pub fn find(name: &str) -> Option<&'static Pattern> {
    PATTERNS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Parse a plaintext seed. Blank lines and lines starting with `!` are skipped.
pub fn parse_seed(text: &str) -> Result<LifeState> {
    let rows: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('!'))
        .collect();
    if rows.is_empty() {
        return Err(Error::InvalidPattern("seed contains no rows".into()));
    }
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let padded: Vec<String> = rows.iter().map(|r| format!("{r:.<width$}")).collect();
    LifeState::from_pattern(&padded)
}

pub fn load_seed(path: &Path) -> Result<LifeState> {
    let text = std::fs::read_to_string(path)?;
    parse_seed(&text)
}

/// Place `seed` at A1 of a plate of shape `dims`.
pub fn place(seed: &LifeState, dims: Dimensions) -> Result<LifeState> {
    if seed.rows() > dims.rows || seed.columns() > dims.columns {
        return Err(Error::InvalidPattern(format!(
            "seed is {} but the plate is {}",
            seed.dims(),
            dims
        )));
    }
    Ok(Grid::from_fn(dims, |row, column| {
        seed.get(row, column).copied().unwrap_or(false)
    }))
}
