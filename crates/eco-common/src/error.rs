use crate::span::Span;
use std::fmt;

/// Farthest-progress diagnostic from the DFA lexer.
///
/// No rule matched at `at`; `salvaged` is the text that had matched so far
/// within the current token attempt, kept so the relexer can fold it into an
/// `<E>` error token instead of discarding it.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub at: u32,
    pub salvaged: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no lexer rule matches at offset {}", self.at)
    }
}

impl std::error::Error for LexError {}

/// An LR action table lookup returned `null` for the current (state, symbol).
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self { span, message: message.into() }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}..{}: {}", self.span.start, self.span.end, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Merge-back produced `generated` and `read` streams of different total
/// length. Always a bug in the relexer, never user-triggerable.
#[derive(Debug, Clone, PartialEq)]
pub struct InvariantViolation {
    pub detail: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invariant violated: {}", self.detail)
    }
}

impl std::error::Error for InvariantViolation {}

/// The union of everything the core can surface to a host.
///
/// `DetectorEmpty` and `UserRevert` are not wrapped here: producing zero
/// candidates, and a user-reverted `autobox == false`, are normal outcomes
/// represented with `Option`/`bool` at the call site, not errors — see
/// `eco-lbox`.
#[derive(Debug, Clone, PartialEq)]
pub enum EcoError {
    Lex(LexError),
    Parse(ParseError),
    Invariant(InvariantViolation),
}

impl fmt::Display for EcoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcoError::Lex(e) => e.fmt(f),
            EcoError::Parse(e) => e.fmt(f),
            EcoError::Invariant(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for EcoError {}

impl From<LexError> for EcoError {
    fn from(e: LexError) -> Self {
        EcoError::Lex(e)
    }
}

impl From<ParseError> for EcoError {
    fn from(e: ParseError) -> Self {
        EcoError::Parse(e)
    }
}

impl From<InvariantViolation> for EcoError {
    fn from(e: InvariantViolation) -> Self {
        EcoError::Invariant(e)
    }
}
