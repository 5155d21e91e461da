//! One mounted diagram per session: owns the engine state, applies host
//! actions, and produces paint instructions and events.

mod events;
mod flow;
mod network;
mod schedule;
mod tree;

pub use events::{DiagramEvent, EventQueue};
pub use flow::{FlowHover, FlowSession, FlowTarget};
pub use network::{NetworkSession, NetworkTarget};
pub use schedule::{Scheduler, TaskKind, TickOutcome};
pub use tree::TreeSession;
