//! Quiz server module.
//!
//! Provides the WebSocket transport and the single-threaded session
//! coordinator behind it.

mod coordinator;
mod gateway;
mod registry;
mod server;
mod tally;
mod timer;

pub use coordinator::{Coordinator, Event};
pub use gateway::{Gateway, Outbound};
pub use registry::{ConnectionId, ConnectionRegistry, Participant, Student};
pub use server::{run, run_event_loop, serve};
pub use tally::PollTally;
pub use timer::{IntervalScheduler, QuestionTimer, TickOutcome, TickScheduler, TimerState};
