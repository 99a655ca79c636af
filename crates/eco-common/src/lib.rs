pub mod error;
pub mod span;
pub mod symbol;

pub use error::{EcoError, InvariantViolation, LexError, ParseError};
pub use span::{LineIndex, Span};
pub use symbol::{Interner, Symbol};
