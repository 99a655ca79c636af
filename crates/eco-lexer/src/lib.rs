//! The DFA lexer (component C2): compiles a priority-ordered regex rule
//! list into a single DFA and performs longest-match, priority-tie-broken
//! tokenization over an [`eco_stream::StreamView`].

mod cursor;
mod dfa;
mod grammar;
mod lexer;
mod nfa;
mod regex;

pub use cursor::Cursor;
pub use grammar::{parse as parse_grammar, GrammarError, GrammarFile, GrammarOptions, Rule};
pub use lexer::{Lexer, TokenMatch};
pub use regex::{parse as parse_regex, Ast, RegexError};
