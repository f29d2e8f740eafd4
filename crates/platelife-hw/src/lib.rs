//! Platelife Hardware - Device capability traits, typed deck handles, and a simulated workcell

pub mod command;
pub mod deck;
pub mod device;
pub mod sim;

pub use command::*;
pub use deck::*;
pub use device::{CommandContext, HardwareError, HwResult, LiquidHandler, PlateReader};
pub use sim::{JournalEntry, SimConfig, SimulatedWorkcell};
