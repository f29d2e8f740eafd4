//! Typed deck handles
//!
//! The deck is described once at start-up and each component receives the
//! handles it needs. Nothing is looked up by name at run time.

use platelife_core::{Dimensions, HEAD_CHANNELS, TIP_RACK_COLUMNS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The well plate that carries the life state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plate {
    name: String,
    dims: Dimensions,
}

impl Plate {
    pub fn new(name: impl Into<String>, dims: Dimensions) -> Self {
        Self { name: name.into(), dims }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }
}

/// Shared trough used as liquid source and sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reservoir {
    name: String,
}

impl Reservoir {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TipRack {
    name: String,
    rows: usize,
    columns: usize,
}

impl TipRack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: HEAD_CHANNELS,
            columns: TIP_RACK_COLUMNS,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// One full rack column, first `channels` rows, one tip per channel.
    pub fn column_span(&self, column: usize, channels: usize) -> TipSpan {
        TipSpan {
            rack: self.name.clone(),
            column: column.min(self.columns - 1),
            rows: channels.min(self.rows),
        }
    }
}

/// A contiguous run of tips down one rack column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipSpan {
    pub rack: String,
    pub column: usize,
    pub rows: usize,
}

impl fmt::Display for TipSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = (b'A' + self.rows.saturating_sub(1) as u8) as char;
        write!(f, "{}[A{}:{}{}]", self.rack, self.column + 1, last, self.column + 1)
    }
}

/// Where the plate can sit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateSite {
    Carrier { slot: usize },
    Reader,
}

impl fmt::Display for PlateSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Carrier { slot } => write!(f, "carrier[{slot}]"),
            Self::Reader => write!(f, "reader"),
        }
    }
}

/// Every resource the control loop touches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    pub plate: Plate,
    pub reservoir: Reservoir,
    pub tip_rack: TipRack,
    /// Carrier position the plate returns to after each read.
    pub plate_home: PlateSite,
}

impl Deck {
    /// STARlet-style layout: tip rack on a tip carrier, plate on carrier slot 1,
    /// a trough, and a plate reader.
    pub fn standard(dims: Dimensions) -> Self {
        Self {
            plate: Plate::new("plate", dims),
            reservoir: Reservoir::new("trough"),
            tip_rack: TipRack::new("tip rack"),
            plate_home: PlateSite::Carrier { slot: 1 },
        }
    }
}
