//! Session engine: command surface, signals and the engine itself.

mod command;
mod session_engine;
mod signal;

pub use command::EngineCommand;
pub use session_engine::SessionEngine;
pub use signal::EngineSignal;
