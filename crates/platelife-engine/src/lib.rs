//! Platelife Engine - Life rule, transfer planning, and the read/step/transfer control loop

pub mod control;
pub mod diff;
pub mod life;
pub mod reader;
pub mod scheduler;
pub mod sink;

pub use control::{ControlLoop, LoopState, RunSummary};
pub use diff::{Diff, DiffPlanner};
pub use life::LifeEngine;
pub use reader::StateReader;
pub use scheduler::{Fault, ToleratedFault, TransferPlan, TransferReport, TransferScheduler, TransferStep};
pub use sink::{NullSink, ReadingSink};
