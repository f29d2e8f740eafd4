//! Generation diff and fixed-point detection

use platelife_core::{Grid, LifeState, Transition, TransitionGrid};

/// Per-well transitions between two generations.
#[derive(Clone, Debug, PartialEq)]
pub struct Diff {
    pub transitions: TransitionGrid,
    /// `next == current` everywhere: the pattern reached a fixed point.
    pub terminal: bool,
}

impl Diff {
    pub fn fills(&self) -> usize {
        self.transitions.count(|&t| t == Transition::Fill)
    }

    pub fn empties(&self) -> usize {
        self.transitions.count(|&t| t == Transition::Empty)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DiffPlanner;

impl DiffPlanner {
    pub fn new() -> Self {
        Self
    }

    /// `next - current` per well. Both states must share dimensions.
    pub fn plan(&self, current: &LifeState, next: &LifeState) -> Diff {
        assert_eq!(
            current.dims(),
            next.dims(),
            "generations must share dimensions"
        );
        let transitions = Grid::from_fn(current.dims(), |row, column| {
            Transition::between(current[(row, column)], next[(row, column)])
        });
        let terminal = transitions.count(|&t| t != Transition::Keep) == 0;
        Diff { transitions, terminal }
    }
}
