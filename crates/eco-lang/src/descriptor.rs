use eco_common::Symbol;
use eco_lexer::Lexer;
use eco_recognizer::{IndentKinds, SyntaxTable, Whitespace};

/// Everything the core needs to know about one grammar: the external
/// interface section 6 names as `LanguageDescriptor`.
///
/// `load()` in the distilled spec ("`load() -> (parser, lexer)`") is
/// modeled as eager construction at registration time rather than a
/// lazy per-call hook — the registry is built once at startup and never
/// mutated afterward (section 5's "LR tables and lexer DFAs are immutable
/// after construction and may be shared across sessions"), so there is
/// nothing `load()` would defer.
pub struct LanguageDescriptor {
    pub name: Symbol,
    pub table: Box<dyn SyntaxTable>,
    pub lexer: Lexer,
    pub whitespace: Whitespace,
    /// `Some` selects `RecognizerIndent`'s synthetic-token behavior for
    /// this language; `None` uses the plain recognizer.
    pub indent: Option<IndentKinds>,
    /// The languages this grammar allows embedding as language boxes —
    /// `included_langs` from section 6.
    pub included_langs: Vec<Symbol>,
    /// If true, the recognizer only accepts `possible_ends` from nodes
    /// newer than the version at which the run started (section 6's
    /// `auto_limit_new`).
    pub auto_limit_new: bool,
    /// `auto_allows(sub, token_kind) -> bool`: whether a recognizer run
    /// for the embedded language `sub` may *start* on a token of kind
    /// `token_kind`. Declared by the host grammar, not the embedded one.
    pub auto_allows: Box<dyn Fn(Symbol, Symbol) -> bool + Send + Sync>,
    /// The magic terminal symbol (`<lang>`) this grammar's own LR table
    /// recognizes when embedding this language as a box, i.e. the symbol
    /// a *different* host descriptor's `included_langs` entry maps to
    /// when it names this language. Stored on the descriptor for the
    /// embedded language itself so a host only needs this language's name
    /// to look the marker symbol up.
    pub magic_kind: Symbol,
}

impl LanguageDescriptor {
    pub fn allows_everything(name: Symbol, table: Box<dyn SyntaxTable>, lexer: Lexer, whitespace: Whitespace, magic_kind: Symbol) -> Self {
        Self {
            name,
            table,
            lexer,
            whitespace,
            indent: None,
            included_langs: Vec::new(),
            auto_limit_new: false,
            auto_allows: Box::new(|_, _| true),
            magic_kind,
        }
    }
}
