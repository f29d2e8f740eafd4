//! Transfer scheduling: turns a transition grid into pipetting batches
//!
//! One cycle uses one tip set and runs in a fixed order:
//!
//! 1. pick up one tip per channel
//! 2. aspirate from the reservoir exactly what each channel will dispense
//! 3. dispense into newly alive wells, columns ascending
//! 4. aspirate from newly dead wells, columns descending (the return sweep)
//! 5. dispense what each channel collected back into the reservoir
//! 6. return the tips
//!
//! Planning is pure: `need` and `excess` are fixed before the first command
//! is issued and the plan is executed as-is. Only step 5 may fail without
//! aborting the cycle, since an under-aspirated well leaves the tip short of
//! its expected excess and the next optical read re-derives the true state.

use platelife_core::{
    Channel, Error, Result, Transition, TransitionGrid, TransferConfig, WellId,
};
use platelife_hw::{
    ChannelLoad, CommandKind, Deck, HardwareError, LiquidHandler, PipetteBatch, Plate, Reservoir,
    TipSpan,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// One hardware instruction in a transfer plan.
#[derive(Clone, Debug, PartialEq)]
pub enum TransferStep {
    PickUpTips(TipSpan),
    /// Reservoir aspirate of each channel's `need`.
    Preload(PipetteBatch),
    /// Dispense into wells of one column that come alive.
    Fill { column: usize, batch: PipetteBatch },
    /// Aspirate from wells of one column that die.
    Drain { column: usize, batch: PipetteBatch },
    /// Reservoir dispense of each channel's `excess`.
    ReturnExcess(PipetteBatch),
    ReturnTips,
}

impl TransferStep {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::PickUpTips(_) => CommandKind::PickUpTips,
            Self::Preload(_) | Self::Drain { .. } => CommandKind::Aspirate,
            Self::Fill { .. } | Self::ReturnExcess(_) => CommandKind::Dispense,
            Self::ReturnTips => CommandKind::ReturnTips,
        }
    }

    pub fn batch(&self) -> Option<&PipetteBatch> {
        match self {
            Self::Preload(batch)
            | Self::Fill { batch, .. }
            | Self::Drain { batch, .. }
            | Self::ReturnExcess(batch) => Some(batch),
            Self::PickUpTips(_) | Self::ReturnTips => None,
        }
    }

    /// Whether a device failure on this step leaves the cycle intact.
    pub fn tolerates_failure(&self) -> bool {
        matches!(self, Self::ReturnExcess(_))
    }
}

/// Classified failure of a single transfer step.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Fault {
    /// Aborts the run.
    #[error("fatal: {0}")]
    Fatal(HardwareError),
    /// Logged; the cycle continues.
    #[error("tolerated: {0}")]
    Tolerated(HardwareError),
}

/// A tolerated failure as recorded in a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ToleratedFault {
    pub command: CommandKind,
    pub error: HardwareError,
}

/// A frozen, ordered plan for one cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferPlan {
    need: Vec<f64>,
    excess: Vec<f64>,
    steps: Vec<TransferStep>,
}

impl TransferPlan {
    /// Volume each channel loads from the reservoir, indexed by row.
    pub fn need(&self) -> &[f64] {
        &self.need
    }

    /// Volume each channel returns to the reservoir, indexed by row.
    pub fn excess(&self) -> &[f64] {
        &self.excess
    }

    pub fn steps(&self) -> &[TransferStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferReport {
    pub steps_run: usize,
    pub tolerated: Vec<ToleratedFault>,
}

pub struct TransferScheduler {
    liquid: Arc<dyn LiquidHandler>,
    plate: Plate,
    reservoir: Reservoir,
    tips: TipSpan,
    settings: TransferConfig,
}

impl TransferScheduler {
    pub fn new(liquid: Arc<dyn LiquidHandler>, deck: &Deck, settings: TransferConfig) -> Self {
        let tips = deck
            .tip_rack
            .column_span(settings.tip_column, deck.plate.dims().rows);
        Self {
            liquid,
            plate: deck.plate.clone(),
            reservoir: deck.reservoir.clone(),
            tips,
            settings,
        }
    }

    pub fn settings(&self) -> &TransferConfig {
        &self.settings
    }

    /// Build the ordered plan for `diff`. Issues no hardware commands.
    ///
    /// An all-`Keep` diff yields an empty plan: no tips are touched.
    pub fn plan(&self, diff: &TransitionGrid) -> Result<TransferPlan> {
        let rows = diff.rows();
        let volume = self.settings.alive_volume;

        let per_row = |wanted: Transition| -> Vec<f64> {
            (0..rows)
                .map(|row| diff.row(row).iter().filter(|&&t| t == wanted).count() as f64 * volume)
                .collect()
        };
        let need = per_row(Transition::Fill);
        let excess = per_row(Transition::Empty);

        for (row, load) in need.iter().zip(&excess).map(|(n, e)| n.max(*e)).enumerate() {
            if load > self.settings.tip_capacity {
                return Err(Error::TipCapacity {
                    channel: row,
                    required: load,
                    capacity: self.settings.tip_capacity,
                });
            }
        }

        let mut steps = Vec::new();
        if need.iter().chain(&excess).all(|&v| v == 0.0) {
            return Ok(TransferPlan { need, excess, steps });
        }

        steps.push(TransferStep::PickUpTips(self.tips.clone()));

        let preload = Self::reservoir_loads(&need);
        if !preload.is_empty() {
            steps.push(TransferStep::Preload(PipetteBatch::reservoir(
                &self.reservoir,
                preload,
                Some(self.settings.reservoir_liquid_height),
            )));
        }

        for column in 0..diff.columns() {
            let pairs = self.column_pairs(diff, column, Transition::Fill);
            if !pairs.is_empty() {
                let batch = PipetteBatch::wells(
                    &self.plate,
                    &pairs,
                    volume,
                    self.settings.well_dispense_height,
                );
                steps.push(TransferStep::Fill { column, batch });
            }
        }

        for column in (0..diff.columns()).rev() {
            let pairs = self.column_pairs(diff, column, Transition::Empty);
            if !pairs.is_empty() {
                let batch = PipetteBatch::wells(
                    &self.plate,
                    &pairs,
                    volume,
                    Some(self.settings.well_aspirate_height),
                );
                steps.push(TransferStep::Drain { column, batch });
            }
        }

        let returns = Self::reservoir_loads(&excess);
        if !returns.is_empty() {
            steps.push(TransferStep::ReturnExcess(PipetteBatch::reservoir(
                &self.reservoir,
                returns,
                Some(self.settings.reservoir_liquid_height),
            )));
        }

        steps.push(TransferStep::ReturnTips);
        Ok(TransferPlan { need, excess, steps })
    }

    /// Run a plan step by step. The first fatal fault stops execution.
    pub async fn execute(&self, plan: &TransferPlan) -> Result<TransferReport> {
        let mut report = TransferReport::default();
        for step in plan.steps() {
            match self.run_step(step).await {
                Ok(()) => report.steps_run += 1,
                Err(Fault::Tolerated(e)) => {
                    warn!("{} failed, continuing: {}", step.kind(), e);
                    report.tolerated.push(ToleratedFault {
                        command: step.kind(),
                        error: e,
                    });
                }
                Err(Fault::Fatal(e)) => {
                    error!("{} failed: {}", step.kind(), e);
                    return Err(e.into_error(step.kind()));
                }
            }
        }
        Ok(report)
    }

    /// Issue one step and classify any failure.
    pub async fn run_step(&self, step: &TransferStep) -> std::result::Result<(), Fault> {
        if let Some(batch) = step.batch() {
            debug!(
                "{} {:?} channels={:?} vols={:?} wells={:?}",
                step.kind(),
                batch.target(),
                batch.channels(),
                batch.volumes(),
                batch.wells_addressed()
            );
        }
        let result = match step {
            TransferStep::PickUpTips(tips) => self.liquid.pick_up_tips(tips).await,
            TransferStep::Preload(batch) | TransferStep::Drain { batch, .. } => {
                self.liquid.aspirate(batch).await
            }
            TransferStep::Fill { batch, .. } | TransferStep::ReturnExcess(batch) => {
                self.liquid.dispense(batch).await
            }
            TransferStep::ReturnTips => self.liquid.return_tips().await,
        };
        result.map_err(|e| {
            if step.tolerates_failure() {
                Fault::Tolerated(e)
            } else {
                Fault::Fatal(e)
            }
        })
    }

    fn reservoir_loads(volumes: &[f64]) -> Vec<ChannelLoad> {
        volumes
            .iter()
            .enumerate()
            .filter(|(_, &v)| v > 0.0)
            .map(|(row, &v)| ChannelLoad::new(Channel::for_row(row), v))
            .collect()
    }

    fn column_pairs(
        &self,
        diff: &TransitionGrid,
        column: usize,
        wanted: Transition,
    ) -> Vec<(Channel, WellId)> {
        (0..diff.rows())
            .filter(|&row| diff[(row, column)] == wanted)
            .map(|row| (Channel::for_row(row), WellId::at(row, column, diff.rows())))
            .collect()
    }
}
