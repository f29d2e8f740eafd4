//! SimulatedWorkcell: in-memory liquid handler and plate reader
//!
//! Implements both device traits over one shared model of the deck: well,
//! reservoir and tip volumes, plate location and reader lid. Optical density
//! is derived from well volume, so a run against the simulator closes the
//! same read → transfer → read loop as real hardware.
//!
//! Every command is journaled with its outcome. Faults can be injected per
//! command kind, and an aspiration efficiency below 1.0 leaves liquid behind
//! in emptied wells the way a real head occasionally does.

use crate::command::{Command, CommandKind, LiquidTarget, PipetteBatch, PlateMove};
use crate::deck::{Deck, Plate, PlateSite, TipSpan};
use crate::device::{HardwareError, HwResult, LiquidHandler, PlateReader};
use platelife_core::{Grid, LifeState, MeasurementGrid, WellId, HEAD_CHANNELS};
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::debug;

const EPSILON: f64 = 1e-6;

/// Physical parameters of the simulated workcell.
#[derive(Clone, Debug)]
pub struct SimConfig {
    pub channels: usize,
    /// OD of an empty well.
    pub background_od: f64,
    /// OD added per uL of liquid in a well.
    pub od_per_microliter: f64,
    /// Fraction of the requested volume actually drawn from a well (0.0 - 1.0).
    pub aspirate_efficiency: f64,
    pub tip_capacity: f64,
    pub reservoir_volume: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            channels: HEAD_CHANNELS,
            background_od: 0.05,
            od_per_microliter: 0.004,
            aspirate_efficiency: 1.0,
            tip_capacity: 1000.0,
            reservoir_volume: 100_000.0,
        }
    }
}

/// One issued command and how it ended.
#[derive(Clone, Debug)]
pub struct JournalEntry {
    pub command: Command,
    pub outcome: HwResult<()>,
}

impl JournalEntry {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

struct MountedTips {
    span: TipSpan,
    volumes: Vec<f64>,
}

struct SimState {
    handler_ready: bool,
    reader_ready: bool,
    wells: Grid<f64>,
    reservoir: f64,
    tips: Option<MountedTips>,
    plate_at: PlateSite,
    lid_open: bool,
    faults: Vec<(CommandKind, String)>,
    journal: Vec<JournalEntry>,
}

impl SimState {
    fn take_fault(&mut self, kind: CommandKind) -> Option<HardwareError> {
        let index = self.faults.iter().position(|(k, _)| *k == kind)?;
        let (_, message) = self.faults.remove(index);
        Some(HardwareError::command(kind, message))
    }
}

pub struct SimulatedWorkcell {
    name: String,
    deck: Deck,
    config: SimConfig,
    state: Mutex<SimState>,
}

impl SimulatedWorkcell {
    pub fn new(deck: Deck, config: SimConfig) -> Self {
        let state = SimState {
            handler_ready: false,
            reader_ready: false,
            wells: Grid::filled(deck.plate.dims(), 0.0),
            reservoir: config.reservoir_volume,
            tips: None,
            plate_at: deck.plate_home,
            lid_open: false,
            faults: Vec::new(),
            journal: Vec::new(),
        };
        Self {
            name: "simulated-workcell".to_string(),
            deck,
            config,
            state: Mutex::new(state),
        }
    }

    /// Fill the wells alive in `pattern` with `volume` uL. The pattern is
    /// anchored at A1; cells outside the plate are ignored.
    pub fn with_pattern(mut self, pattern: &LifeState, volume: f64) -> Self {
        let state = self.state.get_mut();
        for ((row, column), &alive) in pattern.iter() {
            if alive && state.wells.dims().contains(row, column) {
                state.wells.set(row, column, volume);
            }
        }
        self
    }

    /// Fail the next command of `kind` with `message`.
    pub fn with_fault(mut self, kind: CommandKind, message: impl Into<String>) -> Self {
        self.state.get_mut().faults.push((kind, message.into()));
        self
    }

    pub async fn inject_fault(&self, kind: CommandKind, message: impl Into<String>) {
        self.state.lock().await.faults.push((kind, message.into()));
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub async fn journal(&self) -> Vec<JournalEntry> {
        self.state.lock().await.journal.clone()
    }

    pub async fn well_volumes(&self) -> Grid<f64> {
        self.state.lock().await.wells.clone()
    }

    pub async fn reservoir_volume(&self) -> f64 {
        self.state.lock().await.reservoir
    }

    /// Volumes held by mounted tips, or `None` when no tips are on the head.
    pub async fn tip_volumes(&self) -> Option<Vec<f64>> {
        self.state
            .lock()
            .await
            .tips
            .as_ref()
            .map(|t| t.volumes.clone())
    }

    pub async fn plate_site(&self) -> PlateSite {
        self.state.lock().await.plate_at
    }

    pub async fn lid_open(&self) -> bool {
        self.state.lock().await.lid_open
    }

    /// Run one command against the model and journal the outcome. An injected
    /// fault for the command's kind pre-empts the model.
    async fn run<T>(
        &self,
        command: Command,
        apply: impl FnOnce(&mut SimState) -> HwResult<T>,
    ) -> HwResult<T> {
        let mut state = self.state.lock().await;
        let kind = command.kind();
        let result = match state.take_fault(kind) {
            Some(fault) => Err(fault),
            None => apply(&mut state),
        };
        match &result {
            Ok(_) => debug!("{} ok", kind),
            Err(e) => debug!("{} failed: {}", kind, e),
        }
        state.journal.push(JournalEntry {
            command,
            outcome: result.as_ref().map(|_| ()).map_err(Clone::clone),
        });
        result
    }

    fn well_position(&self, well: WellId) -> HwResult<(usize, usize)> {
        let dims = self.deck.plate.dims();
        let (row, column) = (well.row(dims.rows), well.column(dims.rows));
        if dims.contains(row, column) {
            Ok((row, column))
        } else {
            Err(HardwareError::UnknownTarget(format!(
                "{}[{}]",
                self.deck.plate.name(),
                well
            )))
        }
    }

    /// Checks shared by aspirate and dispense. Returns the addressed well
    /// position for each load (`None` for the reservoir).
    fn check_batch(
        &self,
        state: &SimState,
        batch: &PipetteBatch,
    ) -> HwResult<Vec<Option<(usize, usize)>>> {
        if !state.handler_ready {
            return Err(HardwareError::NotSetUp);
        }
        if state.tips.is_none() {
            return Err(HardwareError::NoTips);
        }
        let mut seen = HashSet::new();
        for load in batch.loads() {
            if load.channel.index() >= self.config.channels {
                return Err(HardwareError::InvalidChannel {
                    channel: load.channel,
                    channels: self.config.channels,
                });
            }
            if !seen.insert(load.channel) {
                return Err(HardwareError::DuplicateChannel(load.channel));
            }
        }
        match batch.target() {
            LiquidTarget::Reservoir { name } => {
                if name != self.deck.reservoir.name() {
                    return Err(HardwareError::UnknownTarget(name.clone()));
                }
                Ok(vec![None; batch.len()])
            }
            LiquidTarget::Wells { plate, wells } => {
                if plate != self.deck.plate.name() {
                    return Err(HardwareError::UnknownTarget(plate.clone()));
                }
                if state.plate_at != self.deck.plate_home {
                    return Err(HardwareError::PlateNotAccessible(format!(
                        "plate is at {}",
                        state.plate_at
                    )));
                }
                wells
                    .iter()
                    .map(|&w| self.well_position(w).map(Some))
                    .collect()
            }
        }
    }

    fn apply_aspirate(&self, state: &mut SimState, batch: &PipetteBatch) -> HwResult<()> {
        let positions = self.check_batch(state, batch)?;
        let tips = state.tips.as_ref().ok_or(HardwareError::NoTips)?;

        let mut drawn = Vec::with_capacity(batch.len());
        for (load, position) in batch.loads().iter().zip(&positions) {
            let amount = match position {
                Some(cell) => (load.volume * self.config.aspirate_efficiency).min(state.wells[*cell]),
                None => load.volume,
            };
            let held = tips.volumes[load.channel.index()];
            if held + load.volume > self.config.tip_capacity + EPSILON {
                return Err(HardwareError::TipOverflow {
                    channel: load.channel,
                    requested: held + load.volume,
                    capacity: self.config.tip_capacity,
                });
            }
            drawn.push(amount.max(0.0));
        }
        if batch.is_reservoir() {
            let total: f64 = drawn.iter().sum();
            if total > state.reservoir + EPSILON {
                return Err(HardwareError::ReservoirEmpty {
                    requested: total,
                    available: state.reservoir,
                });
            }
        }

        for ((load, position), amount) in batch.loads().iter().zip(&positions).zip(drawn) {
            match position {
                Some((row, column)) => {
                    let left = state.wells[(*row, *column)] - amount;
                    state.wells.set(*row, *column, left.max(0.0));
                }
                None => state.reservoir -= amount,
            }
            if let Some(tips) = state.tips.as_mut() {
                tips.volumes[load.channel.index()] += amount;
            }
        }
        Ok(())
    }

    fn apply_dispense(&self, state: &mut SimState, batch: &PipetteBatch) -> HwResult<()> {
        let positions = self.check_batch(state, batch)?;
        let tips = state.tips.as_ref().ok_or(HardwareError::NoTips)?;

        for load in batch.loads() {
            let held = tips.volumes[load.channel.index()];
            if held + EPSILON < load.volume {
                return Err(HardwareError::InsufficientVolume {
                    channel: load.channel,
                    requested: load.volume,
                    available: held,
                });
            }
        }

        for (load, position) in batch.loads().iter().zip(&positions) {
            match position {
                Some((row, column)) => {
                    let filled = state.wells[(*row, *column)] + load.volume;
                    state.wells.set(*row, *column, filled);
                }
                None => state.reservoir += load.volume,
            }
            if let Some(tips) = state.tips.as_mut() {
                let left = tips.volumes[load.channel.index()] - load.volume;
                tips.volumes[load.channel.index()] = left.max(0.0);
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LiquidHandler for SimulatedWorkcell {
    fn name(&self) -> &str {
        &self.name
    }

    fn channels(&self) -> usize {
        self.config.channels
    }

    async fn setup(&self) -> HwResult<()> {
        self.run(Command::SetupHandler, |state| {
            state.handler_ready = true;
            Ok(())
        })
        .await
    }

    async fn pick_up_tips(&self, tips: &TipSpan) -> HwResult<()> {
        self.run(Command::PickUpTips(tips.clone()), |state| {
            if !state.handler_ready {
                return Err(HardwareError::NotSetUp);
            }
            if state.tips.is_some() {
                return Err(HardwareError::TipsMounted);
            }
            if tips.rack != self.deck.tip_rack.name() {
                return Err(HardwareError::UnknownTarget(tips.rack.clone()));
            }
            if tips.rows > self.config.channels {
                return Err(HardwareError::command(
                    CommandKind::PickUpTips,
                    format!("{} tips for {} channels", tips.rows, self.config.channels),
                ));
            }
            state.tips = Some(MountedTips {
                span: tips.clone(),
                volumes: vec![0.0; self.config.channels],
            });
            Ok(())
        })
        .await
    }

    async fn aspirate(&self, batch: &PipetteBatch) -> HwResult<()> {
        self.run(Command::Aspirate(batch.clone()), |state| {
            self.apply_aspirate(state, batch)
        })
        .await
    }

    async fn dispense(&self, batch: &PipetteBatch) -> HwResult<()> {
        self.run(Command::Dispense(batch.clone()), |state| {
            self.apply_dispense(state, batch)
        })
        .await
    }

    async fn return_tips(&self) -> HwResult<()> {
        self.run(Command::ReturnTips, |state| {
            let tips = state.tips.take().ok_or(HardwareError::NoTips)?;
            let residual: f64 = tips.volumes.iter().sum();
            if residual > EPSILON {
                debug!("returning tips to {} holding {:.1} uL", tips.span, residual);
            }
            Ok(())
        })
        .await
    }

    async fn move_plate(&self, plate: &Plate, to: PlateSite, motion: PlateMove) -> HwResult<()> {
        let command = Command::MovePlate {
            plate: plate.name().to_string(),
            to,
            motion,
        };
        self.run(command, |state| {
            if !state.handler_ready {
                return Err(HardwareError::NotSetUp);
            }
            if plate.name() != self.deck.plate.name() {
                return Err(HardwareError::UnknownTarget(plate.name().to_string()));
            }
            if state.plate_at == to {
                return Err(HardwareError::PlateNotAccessible(format!("plate already at {to}")));
            }
            let touches_reader = to == PlateSite::Reader || state.plate_at == PlateSite::Reader;
            if touches_reader && !state.lid_open {
                return Err(HardwareError::ReaderLid("closed"));
            }
            state.plate_at = to;
            Ok(())
        })
        .await
    }

    async fn stop(&self) -> HwResult<()> {
        self.run(Command::StopHandler, |state| {
            state.handler_ready = false;
            Ok(())
        })
        .await
    }
}

#[async_trait::async_trait]
impl PlateReader for SimulatedWorkcell {
    fn name(&self) -> &str {
        &self.name
    }

    async fn setup(&self) -> HwResult<()> {
        self.run(Command::SetupReader, |state| {
            state.reader_ready = true;
            Ok(())
        })
        .await
    }

    async fn open(&self) -> HwResult<()> {
        self.run(Command::OpenReader, |state| {
            if !state.reader_ready {
                return Err(HardwareError::NotSetUp);
            }
            state.lid_open = true;
            Ok(())
        })
        .await
    }

    async fn close(&self) -> HwResult<()> {
        self.run(Command::CloseReader, |state| {
            if !state.reader_ready {
                return Err(HardwareError::NotSetUp);
            }
            state.lid_open = false;
            Ok(())
        })
        .await
    }

    async fn read_absorbance(&self, wavelength_nm: f64) -> HwResult<MeasurementGrid> {
        self.run(Command::ReadAbsorbance { wavelength_nm }, |state| {
            if !state.reader_ready {
                return Err(HardwareError::NotSetUp);
            }
            if state.plate_at != PlateSite::Reader {
                return Err(HardwareError::PlateNotAccessible("no plate in reader".into()));
            }
            if state.lid_open {
                return Err(HardwareError::ReaderLid("open"));
            }
            let background = self.config.background_od;
            let slope = self.config.od_per_microliter;
            Ok(state.wells.map(|&volume| background + volume * slope))
        })
        .await
    }

    async fn stop(&self) -> HwResult<()> {
        self.run(Command::StopReader, |state| {
            state.reader_ready = false;
            Ok(())
        })
        .await
    }
}
