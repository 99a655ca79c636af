//! Command implementations. `lex` loads a real grammar file; `check` and
//! `box` additionally need an LR table and (for `box`) a second embedded
//! grammar, which this core has no compiler for (section 1), so they work
//! against a small bundled demo grammar/table instead of the user's file
//! contents directly — the file is still read and lexed for real, only
//! the table and the embedded language are canned.

use crate::diagnostics::{render_lex_error, render_recognizer_rejection};
use eco_common::{Interner, Symbol};
use eco_incremental::{relex_import, RelexConfig};
use eco_lang::{LanguageDescriptor, LanguageRegistry};
use eco_lbox::{Detector, StackEntry};
use eco_lexer::{parse_grammar, Lexer};
use eco_recognizer::{Action, AllowAll, LookupSymbol, Production, Recognizer, SyntaxTable, Whitespace};
use eco_tree::{NodeData, Terminal, Tree};
use std::fs;
use std::path::Path;

fn read_file(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("failed to read '{}': {}", path.display(), e))
}

/// Inserts `text` as one raw placeholder terminal and lexes it for real
/// via `relex_import`, the same bulk-import fast path a freshly-opened
/// file takes in the host editor (section 2's "`relex_import`"). The raw
/// node's own kind is irrelevant since `relex_import` replaces it outright
/// with properly lexed tokens.
fn lex_into_tree(text: &str, lexer: &Lexer, raw_kind: Symbol, error_kind: Symbol) -> (Tree, Option<eco_common::LexError>) {
    let mut tree = Tree::new();
    let bos = tree.bos();
    let root = tree.insert_after(bos, NodeData::Terminal(Terminal::new(raw_kind, text)));
    let outcome = relex_import(&mut tree, lexer, root, &RelexConfig { error_kind });
    (tree, outcome.trailing_error)
}

pub fn run_lex(grammar_path: &Path, file_path: &Path) -> Result<(), String> {
    let grammar_text = read_file(grammar_path)?;
    let source = read_file(file_path)?;

    let mut interner = Interner::new();
    let grammar = parse_grammar(&grammar_text, &mut interner).map_err(|e| e.to_string())?;
    let lexer = Lexer::compile(&grammar).map_err(|e| e.to_string())?;
    let error_kind = interner.intern("<E>");
    let raw_kind = interner.intern("RAW");

    let (tree, trailing_error) = lex_into_tree(&source, &lexer, raw_kind, error_kind);

    let mut cur = tree.next_term(tree.bos());
    while let Some(id) = cur {
        if id == tree.eos() {
            break;
        }
        if let Some(node) = tree.node(id) {
            if let Some(kind) = node.kind() {
                println!("{:>4}  {:?}", interner.resolve(kind), node.own_text());
            }
        }
        cur = tree.next_term(id);
    }

    if let Some(err) = trailing_error {
        eprint!("{}", render_lex_error(&err, &source));
        return Err("lexing did not fully resync".into());
    }
    Ok(())
}

/// `S -> ( S ) | a`, the same illustrative table `eco-recognizer`'s own
/// tests use, wired up as a `LanguageDescriptor` so `check`/`box` can
/// drive it through the real registry/recognizer path end to end.
struct ParenTable {
    lparen: Symbol,
    rparen: Symbol,
    a: Symbol,
    s: Symbol,
}

impl SyntaxTable for ParenTable {
    fn lookup(&self, state: u32, symbol: LookupSymbol) -> Option<Action> {
        use LookupSymbol::*;
        match (state, symbol) {
            (0, Terminal(k)) if k == self.lparen => Some(Action::Shift(1)),
            (0, Terminal(k)) if k == self.a => Some(Action::Shift(2)),
            (1, Terminal(k)) if k == self.lparen => Some(Action::Shift(1)),
            (1, Terminal(k)) if k == self.a => Some(Action::Shift(2)),
            (2, Terminal(_)) => Some(Action::Reduce(Production::new(1, self.s))),
            (2, Finish) => Some(Action::Reduce(Production::new(1, self.s))),
            (1, Nonterminal(k)) if k == self.s => Some(Action::Goto(3)),
            (0, Nonterminal(k)) if k == self.s => Some(Action::Goto(4)),
            (3, Terminal(k)) if k == self.rparen => Some(Action::Shift(5)),
            (5, Terminal(_)) => Some(Action::Reduce(Production::new(3, self.s))),
            (5, Finish) => Some(Action::Reduce(Production::new(3, self.s))),
            (4, Finish) => Some(Action::Accept),
            _ => None,
        }
    }
}

fn demo_grammar_text() -> &'static str {
    "LPAREN = \\(\nRPAREN = \\)\nA = a\n<ws> = [ ]+\n"
}

pub fn run_check(file_path: &Path) -> Result<(), String> {
    let source = read_file(file_path)?;

    let mut interner = Interner::new();
    let grammar = parse_grammar(demo_grammar_text(), &mut interner).map_err(|e| e.to_string())?;
    let lexer = Lexer::compile(&grammar).map_err(|e| e.to_string())?;
    let error_kind = interner.intern("<E>");
    let raw_kind = interner.intern("RAW");
    let table = ParenTable {
        lparen: interner.intern("LPAREN"),
        rparen: interner.intern("RPAREN"),
        a: interner.intern("A"),
        s: interner.intern("S"),
    };
    let whitespace = Whitespace {
        ws: interner.intern("<ws>"),
        line_break: interner.intern("<return>"),
        line_comment: None,
        block_comment: None,
    };

    let (tree, _) = lex_into_tree(&source, &lexer, raw_kind, error_kind);
    let start = tree.next_term(tree.bos()).filter(|&id| id != tree.eos());

    let mut rec = Recognizer::new(&table, &lexer, whitespace);
    let accepted = match start {
        Some(start) => rec.parse(&tree, start, &AllowAll).is_some(),
        None => false,
    };

    if accepted {
        println!("accepted: {} possible end(s)", rec.possible_ends.len());
        Ok(())
    } else {
        eprint!("{}", render_recognizer_rejection(&source, "does not match `S -> ( S ) | a` (the bundled demo grammar)"));
        Err("recognizer rejected input".into())
    }
}

pub fn run_box(file_path: &Path) -> Result<(), String> {
    let source = read_file(file_path)?;

    let mut interner = Interner::new();
    let grammar = parse_grammar(demo_grammar_text(), &mut interner).map_err(|e| e.to_string())?;
    let lexer = Lexer::compile(&grammar).map_err(|e| e.to_string())?;
    let error_kind = interner.intern("<E>");

    let embedded_grammar = parse_grammar("A = a\n<ws> = [ ]+\n", &mut interner).map_err(|e| e.to_string())?;
    let embedded_lexer = Lexer::compile(&embedded_grammar).map_err(|e| e.to_string())?;

    let a = interner.intern("A");
    let s = interner.intern("S");
    let lparen = interner.intern("LPAREN");
    let rparen = interner.intern("RPAREN");
    let marker = interner.intern("<embedded>");
    let whitespace = Whitespace {
        ws: interner.intern("<ws>"),
        line_break: interner.intern("<return>"),
        line_comment: None,
        block_comment: None,
    };

    struct HostTable {
        lparen: Symbol,
        rparen: Symbol,
        a: Symbol,
        s: Symbol,
        marker: Symbol,
    }
    impl SyntaxTable for HostTable {
        fn lookup(&self, state: u32, symbol: LookupSymbol) -> Option<Action> {
            use LookupSymbol::*;
            match (state, symbol) {
                (0, Terminal(k)) if k == self.lparen => Some(Action::Shift(1)),
                (0, Terminal(k)) if k == self.a => Some(Action::Shift(2)),
                (0, Terminal(k)) if k == self.marker => Some(Action::Shift(2)),
                (1, Terminal(k)) if k == self.lparen => Some(Action::Shift(1)),
                (1, Terminal(k)) if k == self.a => Some(Action::Shift(2)),
                (1, Terminal(k)) if k == self.marker => Some(Action::Shift(2)),
                (2, Terminal(_)) => Some(Action::Reduce(Production::new(1, self.s))),
                (2, Finish) => Some(Action::Reduce(Production::new(1, self.s))),
                (1, Nonterminal(k)) if k == self.s => Some(Action::Goto(3)),
                (0, Nonterminal(k)) if k == self.s => Some(Action::Goto(4)),
                (3, Terminal(k)) if k == self.rparen => Some(Action::Shift(5)),
                (5, Terminal(_)) => Some(Action::Reduce(Production::new(3, self.s))),
                (5, Finish) => Some(Action::Reduce(Production::new(3, self.s))),
                (4, Finish) => Some(Action::Accept),
                _ => None,
            }
        }
    }

    let raw_kind = interner.intern("RAW");
    let host_name = interner.intern("host-demo");
    let embedded_name = interner.intern("embedded-demo");

    let mut registry = LanguageRegistry::new();
    registry.register(LanguageDescriptor {
        name: embedded_name,
        table: Box::new(ParenTable { lparen, rparen, a, s }),
        lexer: embedded_lexer,
        whitespace,
        indent: None,
        included_langs: Vec::new(),
        auto_limit_new: false,
        auto_allows: Box::new(|_, _| true),
        magic_kind: marker,
    });
    registry.register(LanguageDescriptor {
        name: host_name,
        table: Box::new(HostTable { lparen, rparen, a, s, marker }),
        lexer,
        whitespace,
        indent: None,
        included_langs: vec![embedded_name],
        auto_limit_new: false,
        auto_allows: Box::new(|_, _| true),
        magic_kind: marker,
    });

    let (mut tree, _) = lex_into_tree(&source, &registry.get(host_name).unwrap().lexer, raw_kind, error_kind);
    let Some(errornode) = tree.next_term(tree.bos()).filter(|&id| id != tree.eos()) else {
        println!("no tokens to run the detector on");
        return Ok(());
    };

    // Wrap the flat token chain in one nonterminal so the validator has a
    // real parse-tree root to replay from (`preparse` reads
    // `outer_root.children[1..]`); a genuine parser would have built this
    // structure already.
    let outer_root = tree.new_nonterminal(s);
    tree.attach_child(outer_root, tree.bos());
    let mut cur = tree.next_term(tree.bos());
    while let Some(id) = cur {
        if id == tree.eos() {
            break;
        }
        tree.attach_child(outer_root, id);
        cur = tree.next_term(id);
    }

    let mut detector = Detector::new(&registry, host_name).ok_or("failed to build detector from demo registry".to_string())?;
    let stack = vec![StackEntry { state: 0, node: errornode }];
    let snapshot = tree.snapshot();
    let outcome = detector.detect_lbox(&tree, outer_root, &stack, &snapshot, errornode);

    if outcome.is_rejected() {
        println!("rejected: user previously reverted a box here");
        return Ok(());
    }
    let candidates = outcome.candidates();
    if candidates.is_empty() {
        println!("no language-box candidates found");
    } else {
        for c in candidates {
            println!("candidate: language={} parse_distance={}", interner.resolve(c.language), c.parse_distance);
        }
    }
    Ok(())
}
