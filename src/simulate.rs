//! Wire a simulated workcell to the control loop and run it

use crate::patterns;
use platelife_core::{LifeState, Result, RunConfig};
use platelife_engine::{ControlLoop, ReadingSink, RunSummary};
use platelife_hw::{Deck, SimConfig, SimulatedWorkcell};
use std::sync::Arc;
use tracing::info;

/// A finished simulated run together with the workcell it ran on.
pub struct SimulatedRun {
    pub summary: RunSummary,
    pub workcell: Arc<SimulatedWorkcell>,
}

/// Seed a simulated plate with `seed` at A1 and run the loop to completion.
///
/// The seed is dispensed at `config.transfer.alive_volume` per alive well.
pub async fn simulate(
    config: RunConfig,
    seed: &LifeState,
    sim: SimConfig,
    sink: Arc<dyn ReadingSink>,
) -> Result<SimulatedRun> {
    config.validate()?;
    let dims = config.dims();
    let seed = patterns::place(seed, dims)?;

    let deck = Deck::standard(dims);
    let workcell = Arc::new(
        SimulatedWorkcell::new(deck.clone(), sim).with_pattern(&seed, config.transfer.alive_volume),
    );
    info!(
        "seeded {} plate with {} alive wells, max {} cycles",
        dims,
        seed.alive(),
        config.life.max_cycles
    );

    let mut control = ControlLoop::new(workcell.clone(), workcell.clone(), deck, config).with_sink(sink);
    let summary = control.run().await?;
    Ok(SimulatedRun { summary, workcell })
}
