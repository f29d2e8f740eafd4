//! Control loop: read -> threshold -> step -> diff -> transfer, repeated
//!
//! Single thread of control. Each hardware command is awaited before the
//! next is issued and no command is retried. Devices are always stopped
//! before `run` returns, whatever the outcome.

use crate::diff::DiffPlanner;
use crate::life::LifeEngine;
use crate::reader::StateReader;
use crate::scheduler::{ToleratedFault, TransferScheduler};
use crate::sink::{NullSink, ReadingSink};
use platelife_core::{Error, LifeState, MeasurementGrid, Result, RunConfig};
use platelife_hw::{
    CommandContext, CommandKind, Deck, LiquidHandler, PlateMove, PlateReader, PlateSite,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Reading,
    Stepping,
    Scheduling,
    /// The plate reached a fixed point.
    Terminated,
    /// `max_cycles` transfer cycles ran without reaching a fixed point.
    Exhausted,
}

impl LoopState {
    pub fn is_final(self) -> bool {
        matches!(self, Self::Terminated | Self::Exhausted)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reading => write!(f, "reading"),
            Self::Stepping => write!(f, "stepping"),
            Self::Scheduling => write!(f, "scheduling"),
            Self::Terminated => write!(f, "terminated"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// How a run ended.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub final_state: LoopState,
    /// Transfer cycles executed.
    pub cycles: usize,
    /// Plate reads taken.
    pub reads: usize,
    /// Life state derived from the last read.
    pub last_state: LifeState,
    /// Tolerated faults, tagged with the cycle they happened in.
    pub tolerated: Vec<(usize, ToleratedFault)>,
}

pub struct ControlLoop {
    liquid: Arc<dyn LiquidHandler>,
    reader: Arc<dyn PlateReader>,
    deck: Deck,
    config: RunConfig,
    state_reader: StateReader,
    engine: LifeEngine,
    planner: DiffPlanner,
    scheduler: TransferScheduler,
    sink: Arc<dyn ReadingSink>,
    state: LoopState,
}

impl ControlLoop {
    pub fn new(
        liquid: Arc<dyn LiquidHandler>,
        reader: Arc<dyn PlateReader>,
        deck: Deck,
        config: RunConfig,
    ) -> Self {
        let scheduler = TransferScheduler::new(liquid.clone(), &deck, config.transfer.clone());
        Self {
            liquid,
            reader,
            state_reader: StateReader::new(config.life.threshold),
            engine: LifeEngine::new(),
            planner: DiffPlanner::new(),
            scheduler,
            sink: Arc::new(NullSink),
            deck,
            config,
            state: LoopState::Reading,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReadingSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Drive cycles until a fixed point or `max_cycles`, then tear down.
    ///
    /// Teardown failures are logged; they never replace the run's result.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let outcome = self.run_cycles().await;
        if let Err(e) = &outcome {
            error!("run aborted in {} state: {}", self.state, e);
        }
        self.teardown().await;
        outcome
    }

    async fn run_cycles(&mut self) -> Result<RunSummary> {
        self.liquid.setup().await.during(CommandKind::SetupHandler)?;
        self.reader.setup().await.during(CommandKind::SetupReader)?;
        self.reader.open().await.during(CommandKind::OpenReader)?;

        let max_cycles = self.config.life.max_cycles;
        let mut cycle = 0;
        let mut reads = 0;
        let mut tolerated = Vec::new();

        loop {
            self.state = LoopState::Reading;
            info!("cycle {}", cycle);
            let reading = self.read_plate().await?;
            reads += 1;
            if reading.dims() != self.config.dims() {
                return Err(Error::shape_mismatch(self.config.dims(), reading.dims()));
            }
            self.sink.publish(&reading, cycle);
            let current = self.state_reader.read(&reading);
            debug!("read {} alive wells\n{}", current.alive(), current.to_pattern());

            if cycle >= max_cycles {
                self.state = LoopState::Exhausted;
                info!("reached {} cycles, stopping", max_cycles);
                return Ok(self.summary(cycle, reads, current, tolerated));
            }

            self.state = LoopState::Stepping;
            let next = self.engine.step(&current);
            let diff = self.planner.plan(&current, &next);
            if diff.terminal {
                self.state = LoopState::Terminated;
                info!("reached terminal state, stopping");
                return Ok(self.summary(cycle, reads, current, tolerated));
            }

            self.state = LoopState::Scheduling;
            info!("{} wells to fill, {} to empty", diff.fills(), diff.empties());
            let plan = self.scheduler.plan(&diff.transitions)?;
            let report = self.scheduler.execute(&plan).await?;
            tolerated.extend(report.tolerated.into_iter().map(|f| (cycle, f)));

            cycle += 1;
        }
    }

    /// Move the plate into the reader, read it, and bring it back.
    async fn read_plate(&self) -> Result<MeasurementGrid> {
        let plate = &self.deck.plate;
        let pickup = self.config.reader.pickup_distance_from_top;

        let load = PlateMove {
            pickup_distance_from_top: pickup,
            grip: self.config.reader.load,
        };
        self.liquid
            .move_plate(plate, PlateSite::Reader, load)
            .await
            .during(CommandKind::MovePlate)?;

        self.reader.close().await.during(CommandKind::CloseReader)?;
        let reading = self
            .reader
            .read_absorbance(self.config.reader.wavelength_nm)
            .await
            .during(CommandKind::ReadAbsorbance)?;
        self.reader.open().await.during(CommandKind::OpenReader)?;

        let unload = PlateMove {
            pickup_distance_from_top: pickup,
            grip: self.config.reader.unload,
        };
        self.liquid
            .move_plate(plate, self.deck.plate_home, unload)
            .await
            .during(CommandKind::MovePlate)?;

        Ok(reading)
    }

    async fn teardown(&self) {
        if let Err(e) = self.liquid.stop().await {
            warn!("{} stop failed: {}", self.liquid.name(), e);
        }
        if let Err(e) = self.reader.stop().await {
            warn!("{} stop failed: {}", self.reader.name(), e);
        }
    }

    fn summary(
        &self,
        cycles: usize,
        reads: usize,
        last_state: LifeState,
        tolerated: Vec<(usize, ToleratedFault)>,
    ) -> RunSummary {
        RunSummary {
            final_state: self.state,
            cycles,
            reads,
            last_state,
            tolerated,
        }
    }
}
