//! Automatic language-box detection (component C7): when the outer
//! parser hits a token it cannot shift, three heuristics (stack, history,
//! line) each propose `(start, end, language)` candidates for wrapping a
//! span of text in a language box, and each candidate is validated by
//! replaying the outer grammar with [`eco_recognizer::IncrementalRecognizer`]
//! before anything is reported back to the editor.
//!
//! The editor owns all tree mutation; this crate only proposes and
//! validates, leaving [`eco_tree::LangBoxMarker::tbd_remove`] and the
//! actual insertion of a `<lang>` marker to the caller.

mod candidate;
mod detector;
mod find;
mod heuristics;
mod position;
mod remove;
mod stack;
mod validate;

pub use candidate::{Candidate, DetectOutcome};
pub use detector::{Detector, HeuristicConfig};
pub use remove::check_remove_lbox;
pub use stack::StackEntry;
pub use validate::parse_after_lbox_h1;
