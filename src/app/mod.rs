mod handle;
mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use handle::SessionHandle;
pub use orchestrator::SessionRuntime;
pub use crate::session::SessionInput;
pub use types::{ComponentState, SessionSummary, ShutdownReason};
