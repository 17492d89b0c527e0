//! Shared utilities for the txq workspace.

pub mod clock;
pub mod logging;

pub use clock::{Clock, SystemClock};
pub use logging::init_tracing;
