//! Price monitoring daemon: poll loop, heartbeat, and signal handling.

pub mod heartbeat;
pub mod poll_loop;
pub mod signals;

pub use poll_loop::{Daemon, Phase, TickOutcome};
pub use signals::ShutdownFlag;
