//! Game of Life rule on a bounded grid
//!
//! Neighbourhoods do not wrap: edge and corner wells simply have fewer
//! neighbours.

use platelife_core::{Grid, LifeState};

#[derive(Clone, Copy, Debug, Default)]
pub struct LifeEngine;

impl LifeEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute the next generation.
    pub fn step(&self, state: &LifeState) -> LifeState {
        Grid::from_fn(state.dims(), |row, column| {
            Self::rule(state[(row, column)], Self::live_neighbors(state, row, column))
        })
    }

    /// Living cells in the in-bounds Moore neighbourhood of `(row, column)`.
    pub fn live_neighbors(state: &LifeState, row: usize, column: usize) -> usize {
        let rows = row.saturating_sub(1)..=(row + 1).min(state.rows() - 1);
        let mut count = 0;
        for r in rows {
            let columns = column.saturating_sub(1)..=(column + 1).min(state.columns() - 1);
            for c in columns {
                if (r, c) != (row, column) && state[(r, c)] {
                    count += 1;
                }
            }
        }
        count
    }

    /// Fewer than 2 dies, exactly 2 keeps its state, exactly 3 is born, more than 3 dies.
    pub fn rule(alive: bool, neighbors: usize) -> bool {
        match neighbors {
            2 => alive,
            3 => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_has_three_neighbors_at_most() {
        let full = LifeState::from_pattern(&["###", "###", "###"]).unwrap();
        assert_eq!(LifeEngine::live_neighbors(&full, 0, 0), 3);
        assert_eq!(LifeEngine::live_neighbors(&full, 0, 1), 5);
        assert_eq!(LifeEngine::live_neighbors(&full, 1, 1), 8);
    }

    #[test]
    fn rule_table() {
        assert!(!LifeEngine::rule(true, 1));
        assert!(LifeEngine::rule(true, 2));
        assert!(!LifeEngine::rule(false, 2));
        assert!(LifeEngine::rule(false, 3));
        assert!(!LifeEngine::rule(true, 4));
    }
}
