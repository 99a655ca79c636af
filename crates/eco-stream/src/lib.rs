//! The stream view (component C3): presents a window of adjacent terminals
//! as a flat character stream for the DFA lexer, and records which nodes
//! each emitted token actually consumed.

mod view;

pub use view::{ConsumedSpan, StreamError, StreamView, MARKER_PLACEHOLDER};
