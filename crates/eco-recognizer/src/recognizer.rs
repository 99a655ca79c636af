use crate::table::{drive_reductions, Action, LookupSymbol, SyntaxTable};
use eco_common::Symbol;
use eco_lexer::Lexer;
use eco_stream::StreamView;
use eco_tree::{NodeData, NodeId, Sentinel, Tree};
use std::collections::VecDeque;

/// One lookahead symbol pulled from the DFA: either a real terminal, or
/// the synthetic end-of-input marker the stream produces once it runs out
/// (or a lex error leaves nothing further to read — section 4.4 treats
/// both the same way, as "nothing more to shift").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookahead {
    Tok(Symbol),
    Finish,
}

impl Lookahead {
    fn as_lookup(self) -> LookupSymbol {
        match self {
            Lookahead::Tok(k) => LookupSymbol::Terminal(k),
            Lookahead::Finish => LookupSymbol::Finish,
        }
    }
}

/// A point at which the recognizer, after all possible reductions, could
/// reach `Accept` on end-of-input — the anchor point C7's heuristics rank
/// language-box candidates by (section 4.4's "possible end").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PossibleEnd {
    pub node: NodeId,
    pub distance: u32,
    pub split: Option<u32>,
}

/// Gates which token kinds are legal to *start* an embedded-language
/// recognizer run with (section 4.4's `valid_start`): the host grammar's
/// `auto_allows(embedded_lang, token_kind)` rule, supplied by `eco-lang`
/// without this crate depending on it.
pub trait TokenGate {
    fn allows(&self, token_kind: Symbol) -> bool;
}

impl<F: Fn(Symbol) -> bool> TokenGate for F {
    fn allows(&self, token_kind: Symbol) -> bool {
        self(token_kind)
    }
}

/// Always-true gate for validators that don't need to restrict the start
/// token (C6's incremental recognizer runs by construction from a point
/// the outer parser already committed to).
pub struct AllowAll;

impl TokenGate for AllowAll {
    fn allows(&self, _token_kind: Symbol) -> bool {
        true
    }
}

/// The trivia symbols a recognizer needs named to implement section 4.4's
/// `ws_tokens` handling: `<ws>`/`<return>` stop a valid start and are
/// filtered out of `possible_ends`; all four are skipped (but not counted
/// toward `parse_distance`) while advancing through `parse_after`.
#[derive(Debug, Clone, Copy)]
pub struct Whitespace {
    pub ws: Symbol,
    /// The real DFA token for a line terminator (`<return>`), distinct
    /// from [`IndentKinds::newline`]'s synthetic grammar-facing `NEWLINE`.
    pub line_break: Symbol,
    pub line_comment: Option<Symbol>,
    pub block_comment: Option<Symbol>,
}

impl Whitespace {
    pub fn is_stop(&self, kind: Symbol) -> bool {
        kind == self.ws || kind == self.line_break
    }

    pub fn is_skip(&self, kind: Symbol) -> bool {
        self.is_stop(kind) || Some(kind) == self.line_comment || Some(kind) == self.block_comment
    }
}

/// The synthetic terminal names an indentation-aware recognizer injects
/// from its indent-column stack (section 4.4's `RecognizerIndent`).
#[derive(Debug, Clone, Copy)]
pub struct IndentKinds {
    pub newline: Symbol,
    pub indent: Symbol,
    pub dedent: Symbol,
}

struct IndentState {
    todo: VecDeque<Lookahead>,
    indents: Vec<u32>,
    last_ws: u32,
    logical_line: bool,
}

impl IndentState {
    fn new() -> Self {
        Self { todo: VecDeque::new(), indents: vec![0], last_ws: 0, logical_line: false }
    }
}

/// Simulates an LR automaton as a state stack without constructing a tree
/// (component C5). Reusable across validation calls — [`Recognizer::reset`]
/// clears `state`/`possible_ends`/`abs_parse_distance` per section 5's
/// "Recognizers are reusable per embedded language" note.
pub struct Recognizer<'a> {
    table: &'a dyn SyntaxTable,
    lexer: &'a Lexer,
    ws: Whitespace,
    indent: Option<(IndentState, IndentKinds)>,
    pub state: Vec<u32>,
    pub reached_eos: bool,
    pub seen_error: bool,
    pub possible_ends: Vec<PossibleEnd>,
    pub last_read: Option<NodeId>,
    last_token_len: u32,
    last_split: Option<u32>,
    pub abs_parse_distance: u32,
    /// When set, `possible_ends` only accepts nodes whose `version` is at
    /// least the start node's version — the `auto_limit_new` gate from
    /// section 6's `LanguageDescriptor`, captured fresh at the start of
    /// each `parse` call.
    pub mode_limit_tokens_new: bool,
    min_version: Option<u32>,
}

impl<'a> Recognizer<'a> {
    pub fn new(table: &'a dyn SyntaxTable, lexer: &'a Lexer, ws: Whitespace) -> Self {
        Self {
            table,
            lexer,
            ws,
            indent: None,
            state: vec![0],
            reached_eos: false,
            seen_error: false,
            possible_ends: Vec::new(),
            last_read: None,
            last_token_len: 0,
            last_split: None,
            abs_parse_distance: 0,
            mode_limit_tokens_new: false,
            min_version: None,
        }
    }

    /// The indentation variant (section 4.4): injects `INDENT`/`DEDENT`/
    /// `NEWLINE` on logical-line transitions computed from an indent-column
    /// stack, and redefines `is_finished` as "can shift `NEWLINE` (and
    /// optionally `DEDENT`) into `Accept`".
    pub fn new_indent(table: &'a dyn SyntaxTable, lexer: &'a Lexer, ws: Whitespace, kinds: IndentKinds) -> Self {
        let mut r = Self::new(table, lexer, ws);
        r.indent = Some((IndentState::new(), kinds));
        r
    }

    /// Clears per-run state; must be called before reusing a recognizer
    /// instance for a different validation (section 5).
    pub fn reset(&mut self) {
        self.state = vec![0];
        self.reached_eos = false;
        self.seen_error = false;
        self.possible_ends.clear();
        self.last_read = None;
        self.last_token_len = 0;
        self.last_split = None;
        self.abs_parse_distance = 0;
        self.min_version = None;
        if let Some((st, _)) = &mut self.indent {
            *st = IndentState::new();
        }
    }

    /// Feeds tokens from the DFA starting at `start`, performing
    /// Shift/Reduce/Goto until `Accept`, a lex error, or an invalid action
    /// (section 4.4). Returns the last fully-lexed node on `Accept`, else
    /// `None`.
    pub fn parse(&mut self, tree: &Tree, start: NodeId, gate: &dyn TokenGate) -> Option<NodeId> {
        self.reset();
        if self.mode_limit_tokens_new {
            self.min_version = Some(tree.node(start).map(|n| n.version()).unwrap_or(0));
        }

        let mut stream = StreamView::new(tree, start);
        let mut pos = 0u32;
        let mut token = self.next_token(tree, &mut stream, &mut pos);

        if !self.valid_start(token, gate) {
            return None;
        }

        loop {
            let lookup = token.as_lookup();
            let top = *self.state.last().expect("state stack is never empty");
            match self.table.lookup(top, lookup) {
                Some(Action::Shift(next)) => {
                    self.abs_parse_distance += self.last_token_len;
                    self.state.push(next);
                    if self.is_finished() {
                        if let Some(last_read) = self.last_read {
                            if self.end_allowed(tree, last_read) {
                                self.possible_ends.push(PossibleEnd {
                                    node: last_read,
                                    distance: self.abs_parse_distance,
                                    split: self.last_split,
                                });
                            }
                        }
                    }
                    token = self.next_token(tree, &mut stream, &mut pos);
                }
                Some(Action::Reduce(prod)) => {
                    for _ in 0..prod.amount() {
                        self.state.pop();
                    }
                    let goto_state = *self.state.last().expect("state stack is never empty");
                    match self.table.lookup(goto_state, LookupSymbol::Nonterminal(prod.left)) {
                        Some(Action::Goto(g)) => self.state.push(g),
                        _ => return None,
                    }
                }
                Some(Action::Accept) => return self.last_read,
                _ => return None,
            }
        }
    }

    fn end_allowed(&self, tree: &Tree, node: NodeId) -> bool {
        match self.min_version {
            Some(min) => tree.node(node).map(|n| n.version() >= min).unwrap_or(false),
            None => true,
        }
    }

    fn valid_start(&self, token: Lookahead, gate: &dyn TokenGate) -> bool {
        match token {
            Lookahead::Finish => false,
            Lookahead::Tok(kind) => !self.ws.is_stop(kind) && gate.allows(kind),
        }
    }

    fn next_token(&mut self, tree: &Tree, stream: &mut StreamView, pos: &mut u32) -> Lookahead {
        if self.indent.is_some() {
            return self.next_token_indent(tree, stream, pos);
        }
        if stream.is_out_of_range(*pos) {
            self.reached_eos = true;
            return Lookahead::Finish;
        }
        match self.lexer.next_token(stream, *pos) {
            Ok(tok) => {
                let len = tok.text.chars().count() as u32;
                *pos += len;
                self.last_read = tok.consumed.last().map(|s| s.node);
                self.last_token_len = len;
                self.last_split = tok.split_index;
                Lookahead::Tok(tok.kind)
            }
            Err(_) => Lookahead::Finish,
        }
    }

    fn next_token_indent(&mut self, tree: &Tree, stream: &mut StreamView, pos: &mut u32) -> Lookahead {
        if let Some(tok) = self.indent.as_mut().unwrap().0.todo.pop_front() {
            return tok;
        }
        if stream.is_out_of_range(*pos) {
            self.reached_eos = true;
            let (st, kinds) = self.indent.as_mut().unwrap();
            st.todo.push_back(Lookahead::Tok(kinds.newline));
            while *st.indents.last().unwrap() != 0 {
                st.todo.push_back(Lookahead::Tok(kinds.dedent));
                st.indents.pop();
            }
            st.todo.push_back(Lookahead::Finish);
            return st.todo.pop_front().unwrap();
        }

        let tok = match self.lexer.next_token(stream, *pos) {
            Ok(tok) => tok,
            Err(_) => return Lookahead::Finish,
        };
        let len = tok.text.chars().count() as u32;
        *pos += len;

        let fully_matched = tok.consumed.last().is_some_and(|span| {
            tree.node(span.node).is_some_and(|n| !n.is_lang_box() && tree.rendered_text(span.node).ends_with(&tok.text))
        });
        if fully_matched {
            self.last_read = tok.consumed.last().map(|s| s.node);
            self.last_token_len = len;
            self.last_split = tok.split_index;
        }

        let ws = self.ws;
        let (st, kinds) = self.indent.as_mut().unwrap();
        if tok.kind == ws.line_break {
            if st.logical_line {
                st.todo.push_back(Lookahead::Tok(kinds.newline));
                st.logical_line = false;
                st.last_ws = 0;
            }
            return Lookahead::Tok(tok.kind);
        }
        if tok.kind == ws.ws {
            st.last_ws = len;
            return Lookahead::Tok(tok.kind);
        }
        if !st.logical_line {
            st.logical_line = true;
            if st.last_ws > *st.indents.last().unwrap() {
                st.todo.push_back(Lookahead::Tok(kinds.indent));
                st.indents.push(st.last_ws);
            } else if st.last_ws < *st.indents.last().unwrap() {
                while st.last_ws < *st.indents.last().unwrap() {
                    st.todo.push_back(Lookahead::Tok(kinds.dedent));
                    st.indents.pop();
                }
            }
            st.todo.push_back(Lookahead::Tok(tok.kind));
            return st.todo.pop_front().unwrap();
        }
        Lookahead::Tok(tok.kind)
    }

    /// Whether the automaton, after all reductions the current top state
    /// allows, could shift end-of-input into `Accept`. The plain variant
    /// probes `Finish` directly; the indentation variant first requires a
    /// `NEWLINE` (and optionally a `DEDENT`) to be shiftable, per section
    /// 4.4.
    fn is_finished(&self) -> bool {
        if let Some((_, kinds)) = &self.indent {
            let mut states = self.state.clone();
            if temp_parse(self.table, &mut states, LookupSymbol::Terminal(kinds.newline)) {
                if self.table.lookup(*states.last().unwrap(), LookupSymbol::Finish).is_some() {
                    return true;
                }
                return temp_parse(self.table, &mut states, LookupSymbol::Terminal(kinds.dedent));
            }
            return false;
        }
        let mut states = self.state.clone();
        matches!(drive_reductions(self.table, &mut states, LookupSymbol::Finish), Some(Action::Accept))
    }
}

/// Advances `states` by one terminal: reduces until a `Shift` fires (then
/// pushes and returns `true`), or returns `false` on anything else
/// (including `Accept`, mirroring the source project's `temp_parse`, which
/// only recognizes `Shift` as progress here).
fn temp_parse(table: &dyn SyntaxTable, states: &mut Vec<u32>, symbol: LookupSymbol) -> bool {
    match drive_reductions(table, states, symbol) {
        Some(Action::Shift(next)) => {
            states.push(next);
            true
        }
        _ => false,
    }
}

pub(crate) fn is_bos(tree: &Tree, id: NodeId) -> bool {
    matches!(tree.node(id).map(|n| &n.data), Some(NodeData::Sentinel(Sentinel::Bos)))
}
