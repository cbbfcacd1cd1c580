pub mod commands;
pub mod sequencer;
pub mod services;

pub use commands::{Action, BuiltinAction, CommandEntry, CommandTable};
pub use sequencer::{BootstrapOutcome, BootstrapSequencer, RunPath};
pub use services::ServiceSet;
