use crate::arena::NodeId;
use eco_common::Symbol;

/// `INDENT`/`DEDENT`/`NEWLINE` carry no source characters; `eco-stream`
/// skips them and the recognizer's indentation variant injects them from an
/// indent-column stack rather than the DFA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoKind {
    Indent,
    Dedent,
    Newline,
}

/// One lexed token. Section 3's "Terminal node".
#[derive(Debug, Clone)]
pub struct Terminal {
    pub kind: Symbol,
    pub text: String,
    /// Characters the DFA consumed past this node's text while deciding the
    /// match; drives the successor's `lookback`.
    pub lookahead: u32,
    /// How many preceding terminals must be revisited when this node
    /// changes. `-1` means "unknown", the sentinel the origin search treats
    /// as "assume adjacent, step back one and stop".
    pub lookback: i32,
    pub changed: bool,
    pub deleted: bool,
    /// LR state assigned by the parser; `None` until the parser visits it.
    pub state: Option<u32>,
    pub pseudo: Option<PseudoKind>,
    /// Set on synthetic `<E>` tokens the relexer salvages from a lex error.
    pub is_error: bool,
    /// The tree-edit generation this node was created or last relexed in.
    /// Used by the recognizer's `auto_limit_new` gate (section 6) to tell
    /// text the user just typed apart from text that merely happens to sit
    /// downstream of a language-box insertion point.
    pub version: u32,
    /// Set by the editor when the user explicitly reverts an auto-inserted
    /// box at this error node; suppresses further detector suggestions here
    /// (section 4.6) regardless of what the heuristics would otherwise find.
    pub autobox_rejected: bool,
}

impl Terminal {
    pub fn new(kind: Symbol, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            lookahead: 0,
            lookback: -1,
            changed: false,
            deleted: false,
            state: None,
            pseudo: None,
            is_error: false,
            version: 0,
            autobox_rejected: false,
        }
    }

    pub fn pseudo(kind: Symbol, pseudo: PseudoKind) -> Self {
        let mut t = Self::new(kind, "");
        t.pseudo = Some(pseudo);
        t
    }

    pub fn is_pseudo(&self) -> bool {
        self.pseudo.is_some()
    }
}

/// A terminal-like node whose `text` is the concatenation of its children's
/// text: a lexeme the grammar treats as one token but that may contain
/// embedded language boxes (strings, comments). Section 3's "Composite
/// terminal node".
#[derive(Debug, Clone)]
pub struct Composite {
    pub kind: Symbol,
    pub children: Vec<NodeId>,
    pub lookahead: u32,
    pub lookback: i32,
    pub changed: bool,
    pub deleted: bool,
    pub state: Option<u32>,
    pub version: u32,
}

impl Composite {
    pub fn new(kind: Symbol) -> Self {
        Self {
            kind,
            children: Vec::new(),
            lookahead: 0,
            lookback: -1,
            changed: false,
            deleted: false,
            state: None,
            version: 0,
        }
    }
}

/// A magic terminal `<lang>` standing for an embedded-language box. Owns a
/// subtree parsed under the embedded grammar, reached via `root`.
#[derive(Debug, Clone)]
pub struct LangBoxMarker {
    pub language: Symbol,
    pub root: Option<NodeId>,
    pub changed: bool,
    pub deleted: bool,
    pub state: Option<u32>,
    /// `false` once the user has explicitly reverted an auto-inserted box
    /// at this node; suppresses further detector suggestions (section 4.6).
    pub autobox: bool,
    /// Set by `eco-lbox::check_remove_lbox` once the box's contents parse
    /// cleanly in the outer grammar on their own (section 4.6's
    /// `box.tbd = "remove"`); the editor acts on this outside the core.
    pub tbd_remove: bool,
}

impl LangBoxMarker {
    pub fn new(language: Symbol) -> Self {
        Self { language, root: None, changed: false, deleted: false, state: None, autobox: true, tbd_remove: false }
    }
}

/// A parent node in the parse tree, grouping the terminals (and nested
/// nonterminals) that make up one production's right-hand side.
#[derive(Debug, Clone)]
pub struct Nonterminal {
    pub symbol: Symbol,
    pub children: Vec<NodeId>,
}

impl Nonterminal {
    pub fn new(symbol: Symbol) -> Self {
        Self { symbol, children: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    Bos,
    Eos,
}

/// The tagged union of every shape a tree node can take. Terminals,
/// composites, language-box markers and sentinels all present through the
/// "terminal-like" view (`Node::text`, `Node::lookahead`, ...) without
/// needing trait objects or inheritance.
#[derive(Debug, Clone)]
pub enum NodeData {
    Sentinel(Sentinel),
    Terminal(Terminal),
    Composite(Composite),
    LangBox(LangBoxMarker),
    Nonterminal(Nonterminal),
}

/// One slot in the arena: the node's own data plus the edges the spec's
/// data model assigns it (parent, and for terminal-like nodes, the
/// previous/next pointers along the flat terminal chain).
#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub prev_term: Option<NodeId>,
    pub next_term: Option<NodeId>,
    pub data: NodeData,
}

impl Node {
    pub fn new(data: NodeData) -> Self {
        Self { parent: None, prev_term: None, next_term: None, data }
    }

    pub fn terminal(t: Terminal) -> Self {
        Self::new(NodeData::Terminal(t))
    }

    pub fn composite(c: Composite) -> Self {
        Self::new(NodeData::Composite(c))
    }

    pub fn lang_box(m: LangBoxMarker) -> Self {
        Self::new(NodeData::LangBox(m))
    }

    /// Whether this node sits on the flat terminal chain (everything except
    /// parent-only `Nonterminal` nodes).
    pub fn is_terminal_like(&self) -> bool {
        !matches!(self.data, NodeData::Nonterminal(_))
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self.data, NodeData::Sentinel(_))
    }

    pub fn is_lang_box(&self) -> bool {
        matches!(self.data, NodeData::LangBox(_))
    }

    pub fn is_pseudo(&self) -> bool {
        matches!(&self.data, NodeData::Terminal(t) if t.is_pseudo())
    }

    pub fn deleted(&self) -> bool {
        match &self.data {
            NodeData::Terminal(t) => t.deleted,
            NodeData::Composite(c) => c.deleted,
            NodeData::LangBox(m) => m.deleted,
            NodeData::Sentinel(_) | NodeData::Nonterminal(_) => false,
        }
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        match &mut self.data {
            NodeData::Terminal(t) => t.deleted = deleted,
            NodeData::Composite(c) => c.deleted = deleted,
            NodeData::LangBox(m) => m.deleted = deleted,
            NodeData::Sentinel(_) | NodeData::Nonterminal(_) => {}
        }
    }

    pub fn changed(&self) -> bool {
        match &self.data {
            NodeData::Terminal(t) => t.changed,
            NodeData::Composite(c) => c.changed,
            NodeData::LangBox(m) => m.changed,
            NodeData::Sentinel(_) | NodeData::Nonterminal(_) => false,
        }
    }

    pub fn set_changed(&mut self, changed: bool) {
        match &mut self.data {
            NodeData::Terminal(t) => t.changed = changed,
            NodeData::Composite(c) => c.changed = changed,
            NodeData::LangBox(m) => m.changed = changed,
            NodeData::Sentinel(_) | NodeData::Nonterminal(_) => {}
        }
    }

    pub fn lookahead(&self) -> u32 {
        match &self.data {
            NodeData::Terminal(t) => t.lookahead,
            NodeData::Composite(c) => c.lookahead,
            NodeData::Sentinel(_) | NodeData::LangBox(_) => 0,
            NodeData::Nonterminal(_) => 0,
        }
    }

    pub fn lookback(&self) -> i32 {
        match &self.data {
            NodeData::Terminal(t) => t.lookback,
            NodeData::Composite(c) => c.lookback,
            NodeData::Sentinel(_) | NodeData::LangBox(_) => -1,
            NodeData::Nonterminal(_) => -1,
        }
    }

    pub fn set_lookback(&mut self, lookback: i32) {
        match &mut self.data {
            NodeData::Terminal(t) => t.lookback = lookback,
            NodeData::Composite(c) => c.lookback = lookback,
            _ => {}
        }
    }

    pub fn state(&self) -> Option<u32> {
        match &self.data {
            NodeData::Terminal(t) => t.state,
            NodeData::Composite(c) => c.state,
            NodeData::LangBox(m) => m.state,
            NodeData::Sentinel(_) | NodeData::Nonterminal(_) => None,
        }
    }

    pub fn set_state(&mut self, state: Option<u32>) {
        match &mut self.data {
            NodeData::Terminal(t) => t.state = state,
            NodeData::Composite(c) => c.state = state,
            NodeData::LangBox(m) => m.state = state,
            NodeData::Sentinel(_) | NodeData::Nonterminal(_) => {}
        }
    }

    /// `kind` and `text` as the lexer/DFA see this node; used to compare
    /// a regenerated token against an existing one during merge-back.
    pub fn kind(&self) -> Option<Symbol> {
        match &self.data {
            NodeData::Terminal(t) => Some(t.kind),
            NodeData::Composite(c) => Some(c.kind),
            _ => None,
        }
    }

    /// The tree-edit generation this node was stamped with; `0` for nodes
    /// that predate version tracking (sentinels, nonterminals, markers).
    pub fn version(&self) -> u32 {
        match &self.data {
            NodeData::Terminal(t) => t.version,
            NodeData::Composite(c) => c.version,
            NodeData::Sentinel(_) | NodeData::LangBox(_) | NodeData::Nonterminal(_) => 0,
        }
    }

    pub fn set_version(&mut self, version: u32) {
        match &mut self.data {
            NodeData::Terminal(t) => t.version = version,
            NodeData::Composite(c) => c.version = version,
            _ => {}
        }
    }

    pub fn autobox_rejected(&self) -> bool {
        matches!(&self.data, NodeData::Terminal(t) if t.autobox_rejected)
    }

    pub fn own_text(&self) -> &str {
        match &self.data {
            NodeData::Terminal(t) => &t.text,
            _ => "",
        }
    }
}
