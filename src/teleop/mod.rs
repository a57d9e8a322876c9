// Operator control for the X-drive base
//
// Provides:
// - Debounced button edges (one event per physical press)
// - Heading mode / kill switch state machine

pub mod debounce;
pub mod state;

pub use debounce::{Action, EdgeLatch, InputId};
pub use state::{Actuation, ControlState, Cycle, MODE_COUNT, heading_label};
