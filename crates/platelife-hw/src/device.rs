//! Device capability traits

use crate::command::{CommandKind, PipetteBatch, PlateMove};
use crate::deck::{Plate, PlateSite, TipSpan};
use platelife_core::{Channel, MeasurementGrid};

/// Result type for device commands
pub type HwResult<T> = Result<T, HardwareError>;

/// Failure reported by a device command.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HardwareError {
    #[error("{command} failed: {message}")]
    CommandFailed {
        command: CommandKind,
        message: String,
    },

    #[error("channel {channel} not present on a {channels}-channel head")]
    InvalidChannel { channel: Channel, channels: usize },

    #[error("channel {0} used twice in one batch")]
    DuplicateChannel(Channel),

    #[error("no tips mounted")]
    NoTips,

    #[error("tips already mounted")]
    TipsMounted,

    #[error("{channel} holds {available} uL, cannot dispense {requested} uL")]
    InsufficientVolume {
        channel: Channel,
        requested: f64,
        available: f64,
    },

    #[error("{channel} would hold {requested} uL, tip capacity is {capacity} uL")]
    TipOverflow {
        channel: Channel,
        requested: f64,
        capacity: f64,
    },

    #[error("reservoir holds {available} uL, cannot aspirate {requested} uL")]
    ReservoirEmpty { requested: f64, available: f64 },

    #[error("plate not accessible: {0}")]
    PlateNotAccessible(String),

    #[error("unknown target: {0}")]
    UnknownTarget(String),

    #[error("reader lid is {0}")]
    ReaderLid(&'static str),

    #[error("device not set up")]
    NotSetUp,
}

impl HardwareError {
    pub fn command(command: CommandKind, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command,
            message: message.into(),
        }
    }

    /// Lift into the workspace error, tagged with the command that raised it.
    pub fn into_error(self, command: CommandKind) -> platelife_core::Error {
        platelife_core::Error::hardware(command.to_string(), self.to_string())
    }
}

/// Attach the issuing command to a device result.
pub trait CommandContext<T> {
    fn during(self, command: CommandKind) -> platelife_core::Result<T>;
}

impl<T> CommandContext<T> for HwResult<T> {
    fn during(self, command: CommandKind) -> platelife_core::Result<T> {
        self.map_err(|e| e.into_error(command))
    }
}

/// Multi-channel pipetting robot with a plate gripper.
///
/// Every method is one awaited hardware instruction. A batch either
/// completes on all its channels or fails as a whole.
#[async_trait::async_trait]
pub trait LiquidHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Channels on the pipetting head.
    fn channels(&self) -> usize;

    async fn setup(&self) -> HwResult<()>;

    async fn pick_up_tips(&self, tips: &TipSpan) -> HwResult<()>;

    async fn aspirate(&self, batch: &PipetteBatch) -> HwResult<()>;

    async fn dispense(&self, batch: &PipetteBatch) -> HwResult<()>;

    /// Put mounted tips back where they were picked up.
    async fn return_tips(&self) -> HwResult<()>;

    async fn move_plate(&self, plate: &Plate, to: PlateSite, motion: PlateMove) -> HwResult<()>;

    async fn stop(&self) -> HwResult<()>;
}

/// Absorbance plate reader with a motorised lid.
#[async_trait::async_trait]
pub trait PlateReader: Send + Sync {
    fn name(&self) -> &str;

    async fn setup(&self) -> HwResult<()>;

    async fn open(&self) -> HwResult<()>;

    async fn close(&self) -> HwResult<()>;

    /// Optical density per well at `wavelength_nm`, shaped like the plate.
    async fn read_absorbance(&self, wavelength_nm: f64) -> HwResult<MeasurementGrid>;

    async fn stop(&self) -> HwResult<()>;
}
