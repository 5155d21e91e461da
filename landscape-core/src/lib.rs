//! Layout and interaction engine for enterprise architecture diagrams.
//!
//! Two diagram families share one model:
//! - a collapsible capability tree (`tree`, `layout::tree_layout`)
//! - integration flows, drawn as a priority-ordered sankey
//!   (`layout::flow`) or a force-directed network (`layout::force`)
//!
//! `session` ties each family to host actions, timers and events;
//! `wasm` exposes the sessions to JavaScript.

pub mod config;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod output;
pub mod session;
pub mod tree;
mod wasm;

pub use config::DiagramConfig;
pub use model::{GraphModel, InputError};
pub use session::{DiagramEvent, FlowSession, NetworkSession, TickOutcome, TreeSession};
pub use wasm::{FlowDiagram, NetworkDiagram, TreeDiagram, init_logging};
