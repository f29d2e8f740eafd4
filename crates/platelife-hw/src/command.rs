//! Hardware command vocabulary
//!
//! Batches are the unit the pipetting head executes atomically. `Command`
//! is the journal record of what was issued to a device.

use crate::deck::{Plate, PlateSite, Reservoir, TipSpan};
use platelife_core::{Channel, GripMove, WellId};
use serde::Serialize;
use std::fmt;

/// Per-channel volume within one batch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChannelLoad {
    pub channel: Channel,
    pub volume: f64,
}

impl ChannelLoad {
    pub fn new(channel: Channel, volume: f64) -> Self {
        Self { channel, volume }
    }
}

/// What a batch aspirates from or dispenses into.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum LiquidTarget {
    Reservoir { name: String },
    /// `wells[i]` is served by the i-th load of the batch.
    Wells { plate: String, wells: Vec<WellId> },
}

/// One multi-channel aspirate or dispense.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PipetteBatch {
    target: LiquidTarget,
    loads: Vec<ChannelLoad>,
    liquid_height: Option<f64>,
}

impl PipetteBatch {
    pub fn reservoir(
        reservoir: &Reservoir,
        loads: Vec<ChannelLoad>,
        liquid_height: Option<f64>,
    ) -> Self {
        Self {
            target: LiquidTarget::Reservoir {
                name: reservoir.name().to_string(),
            },
            loads,
            liquid_height,
        }
    }

    /// Same volume into or out of each `(channel, well)` pair.
    pub fn wells(
        plate: &Plate,
        pairs: &[(Channel, WellId)],
        volume: f64,
        liquid_height: Option<f64>,
    ) -> Self {
        Self {
            target: LiquidTarget::Wells {
                plate: plate.name().to_string(),
                wells: pairs.iter().map(|&(_, well)| well).collect(),
            },
            loads: pairs
                .iter()
                .map(|&(channel, _)| ChannelLoad::new(channel, volume))
                .collect(),
            liquid_height,
        }
    }

    pub fn target(&self) -> &LiquidTarget {
        &self.target
    }

    pub fn loads(&self) -> &[ChannelLoad] {
        &self.loads
    }

    pub fn liquid_height(&self) -> Option<f64> {
        self.liquid_height
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.loads.iter().map(|l| l.channel).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.loads.iter().map(|l| l.volume).collect()
    }

    /// Wells addressed by this batch, empty for reservoir batches.
    pub fn wells_addressed(&self) -> &[WellId] {
        match &self.target {
            LiquidTarget::Wells { wells, .. } => wells,
            LiquidTarget::Reservoir { .. } => &[],
        }
    }

    pub fn is_reservoir(&self) -> bool {
        matches!(self.target, LiquidTarget::Reservoir { .. })
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn total_volume(&self) -> f64 {
        self.loads.iter().map(|l| l.volume).sum()
    }
}

/// Gripper parameters for a plate move.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlateMove {
    pub pickup_distance_from_top: f64,
    pub grip: GripMove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    SetupHandler,
    SetupReader,
    PickUpTips,
    Aspirate,
    Dispense,
    ReturnTips,
    MovePlate,
    OpenReader,
    CloseReader,
    ReadAbsorbance,
    StopHandler,
    StopReader,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SetupHandler => "setup_handler",
            Self::SetupReader => "setup_reader",
            Self::PickUpTips => "pick_up_tips",
            Self::Aspirate => "aspirate",
            Self::Dispense => "dispense",
            Self::ReturnTips => "return_tips",
            Self::MovePlate => "move_plate",
            Self::OpenReader => "open_reader",
            Self::CloseReader => "close_reader",
            Self::ReadAbsorbance => "read_absorbance",
            Self::StopHandler => "stop_handler",
            Self::StopReader => "stop_reader",
        };
        f.write_str(name)
    }
}

/// A command as issued to a device.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Command {
    SetupHandler,
    SetupReader,
    PickUpTips(TipSpan),
    Aspirate(PipetteBatch),
    Dispense(PipetteBatch),
    ReturnTips,
    MovePlate {
        plate: String,
        to: PlateSite,
        motion: PlateMove,
    },
    OpenReader,
    CloseReader,
    ReadAbsorbance { wavelength_nm: f64 },
    StopHandler,
    StopReader,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::SetupHandler => CommandKind::SetupHandler,
            Self::SetupReader => CommandKind::SetupReader,
            Self::PickUpTips(_) => CommandKind::PickUpTips,
            Self::Aspirate(_) => CommandKind::Aspirate,
            Self::Dispense(_) => CommandKind::Dispense,
            Self::ReturnTips => CommandKind::ReturnTips,
            Self::MovePlate { .. } => CommandKind::MovePlate,
            Self::OpenReader => CommandKind::OpenReader,
            Self::CloseReader => CommandKind::CloseReader,
            Self::ReadAbsorbance { .. } => CommandKind::ReadAbsorbance,
            Self::StopHandler => CommandKind::StopHandler,
            Self::StopReader => CommandKind::StopReader,
        }
    }

    /// The pipetting batch carried by an aspirate or dispense.
    pub fn batch(&self) -> Option<&PipetteBatch> {
        match self {
            Self::Aspirate(b) | Self::Dispense(b) => Some(b),
            _ => None,
        }
    }
}
