//! Core types for Platelife

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// Number of pipetting channels on the head. One channel per plate row.
pub const HEAD_CHANNELS: usize = 8;

/// Columns on a 96-tip rack.
pub const TIP_RACK_COLUMNS: usize = 12;

/// Grid shape: rows follow the pipetting channels, columns follow the plate format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub rows: usize,
    pub columns: usize,
}

impl Dimensions {
    pub const fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns }
    }

    /// Standard 96-well plate, 8 x 12.
    pub const fn plate_96() -> Self {
        Self::new(HEAD_CHANNELS, 12)
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.columns
    }

    pub fn contains(&self, row: usize, column: usize) -> bool {
        row < self.rows && column < self.columns
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.columns)
    }
}

/// Row-major rectangular grid.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Grid<T> {
    dims: Dimensions,
    cells: Vec<T>,
}

/// Optical readings, one per well.
pub type MeasurementGrid = Grid<f64>;

/// Alive/dead state per well.
pub type LifeState = Grid<bool>;

/// Required physical action per well.
pub type TransitionGrid = Grid<Transition>;

impl<T: Clone> Grid<T> {
    pub fn filled(dims: Dimensions, value: T) -> Self {
        Self {
            dims,
            cells: vec![value; dims.cell_count()],
        }
    }

    /// Build a grid from nested rows. Ragged or empty input is rejected.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let columns = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.is_empty() || columns == 0 {
            return Err(Error::InvalidPattern("grid has no cells".into()));
        }
        let dims = Dimensions::new(rows.len(), columns);
        let mut cells = Vec::with_capacity(dims.cell_count());
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != columns {
                return Err(Error::InvalidPattern(format!(
                    "row {index} has {} cells, expected {columns}",
                    row.len()
                )));
            }
            cells.extend(row);
        }
        Ok(Self { dims, cells })
    }

    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.cells
            .chunks(self.dims.columns)
            .map(|row| row.to_vec())
            .collect()
    }

    pub fn set(&mut self, row: usize, column: usize, value: T) {
        let index = self.offset(row, column);
        self.cells[index] = value;
    }
}

impl<T> Grid<T> {
    pub fn from_fn(dims: Dimensions, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(dims.cell_count());
        for row in 0..dims.rows {
            for column in 0..dims.columns {
                cells.push(f(row, column));
            }
        }
        Self { dims, cells }
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn rows(&self) -> usize {
        self.dims.rows
    }

    pub fn columns(&self) -> usize {
        self.dims.columns
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&T> {
        if self.dims.contains(row, column) {
            self.cells.get(self.offset(row, column))
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.dims.columns;
        &self.cells[start..start + self.dims.columns]
    }

    /// Iterate cells as `((row, column), value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
        let columns = self.dims.columns;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, v)| ((i / columns, i % columns), v))
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            dims: self.dims,
            cells: self.cells.iter().map(f).collect(),
        }
    }

    pub fn count(&self, mut pred: impl FnMut(&T) -> bool) -> usize {
        self.cells.iter().filter(|v| pred(v)).count()
    }

    fn offset(&self, row: usize, column: usize) -> usize {
        assert!(
            self.dims.contains(row, column),
            "cell ({row}, {column}) outside {} grid",
            self.dims
        );
        row * self.dims.columns + column
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (row, column): (usize, usize)) -> &T {
        &self.cells[self.offset(row, column)]
    }
}

impl Grid<bool> {
    /// Parse rows of `#` (alive) and `.` (dead).
    pub fn from_pattern<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let parsed = rows
            .iter()
            .map(|line| {
                line.as_ref()
                    .trim()
                    .chars()
                    .map(|c| match c {
                        '#' => Ok(true),
                        '.' => Ok(false),
                        other => Err(Error::InvalidPattern(format!(
                            "unexpected character {other:?}, use '#' or '.'"
                        ))),
                    })
                    .collect::<Result<Vec<bool>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_rows(parsed)
    }

    pub fn to_pattern(&self) -> String {
        self.to_rows()
            .iter()
            .map(|row| row.iter().map(|&a| if a { '#' } else { '.' }).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn alive(&self) -> usize {
        self.count(|&a| a)
    }
}

/// Signed per-well change between two generations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// Alive -> dead: the well must be emptied (-1).
    Empty,
    /// No change (0).
    #[default]
    Keep,
    /// Dead -> alive: the well must be filled (+1).
    Fill,
}

impl Transition {
    pub fn between(current: bool, next: bool) -> Self {
        match (current, next) {
            (true, false) => Self::Empty,
            (false, true) => Self::Fill,
            _ => Self::Keep,
        }
    }

    pub fn signum(self) -> i8 {
        match self {
            Self::Empty => -1,
            Self::Keep => 0,
            Self::Fill => 1,
        }
    }
}

/// A pipetting channel. Channel `n` always serves plate row `n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Channel(usize);

impl Channel {
    pub const fn for_row(row: usize) -> Self {
        Self(row)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Linear well address on the plate: `column * rows + row`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WellId(usize);

impl WellId {
    pub const fn at(row: usize, column: usize, rows: usize) -> Self {
        Self(column * rows + row)
    }

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    pub const fn row(self, rows: usize) -> usize {
        self.0 % rows
    }

    pub const fn column(self, rows: usize) -> usize {
        self.0 / rows
    }

    /// Plate label such as `A1` or `H12`.
    pub fn label(self, rows: usize) -> String {
        let row = self.row(rows);
        let letter = (b'A' + (row % 26) as u8) as char;
        format!("{}{}", letter, self.column(rows) + 1)
    }
}

impl fmt::Display for WellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
