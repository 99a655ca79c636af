use crate::candidate::DetectOutcome;
use crate::heuristics::{heuristic_history, heuristic_line, heuristic_stack};
use crate::stack::StackEntry;
use crate::validate::rank_and_filter;
use eco_common::Symbol;
use eco_lang::LanguageRegistry;
use eco_recognizer::{IndentKinds, Recognizer};
use eco_tree::{NodeId, Snapshot, Tree};
use rustc_hash::FxHashMap;

/// Which of the three heuristics to run; all on by default. Exposed so a
/// host can disable, say, the history heuristic when it has not kept a
/// previous-version snapshot around.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicConfig {
    pub stack: bool,
    pub history: bool,
    pub line: bool,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self { stack: true, history: true, line: true }
    }
}

/// Owns one [`Recognizer`] per embedded language so repeated detection
/// runs reuse the same automaton state rather than reallocate it, per
/// section 5's "recognizers are reusable per embedded language" note.
/// Built from a [`LanguageRegistry`] and the name of the grammar that is
/// doing the including.
pub struct Detector<'a> {
    registry: &'a LanguageRegistry,
    outer_name: Symbol,
    recognizers: FxHashMap<Symbol, Recognizer<'a>>,
    pub heuristics: HeuristicConfig,
}

impl<'a> Detector<'a> {
    pub fn new(registry: &'a LanguageRegistry, outer_name: Symbol) -> Option<Self> {
        let outer = registry.get(outer_name)?;
        let mut recognizers = FxHashMap::default();
        for &sub in &outer.included_langs {
            let desc = registry.get(sub)?;
            let rec = match desc.indent {
                Some(kinds) => new_indent_recognizer(desc, kinds),
                None => Recognizer::new(desc.table.as_ref(), &desc.lexer, desc.whitespace),
            };
            recognizers.insert(sub, rec);
        }
        Some(Self { registry, outer_name, recognizers, heuristics: HeuristicConfig::default() })
    }

    /// Runs every enabled heuristic for the error node `errornode`,
    /// ranks and validates the results, and reports what is left.
    /// `outer_root` is the current document's top-level parse tree node;
    /// `stack` is the outer parser's real LR state stack at the point the
    /// error was detected; `prev` is a [`Tree::snapshot`] taken before the
    /// edit that produced `errornode`, needed by the history heuristic.
    /// Section 4.6's full detection pipeline.
    pub fn detect_lbox(&mut self, tree: &Tree, outer_root: NodeId, stack: &[StackEntry], prev: &Snapshot, errornode: NodeId) -> DetectOutcome {
        if tree.node(errornode).map(|n| n.autobox_rejected()).unwrap_or(false) {
            return DetectOutcome::Rejected;
        }

        let Some(outer) = self.registry.get(self.outer_name) else {
            return DetectOutcome::Candidates(Vec::new());
        };

        let mut raw = Vec::new();
        if self.heuristics.history {
            raw.extend(heuristic_history(&mut self.recognizers, self.registry, outer, tree, prev, errornode));
        }
        if self.heuristics.stack {
            raw.extend(heuristic_stack(&mut self.recognizers, self.registry, outer, tree, stack, errornode));
        }
        if self.heuristics.line {
            raw.extend(heuristic_line(&mut self.recognizers, self.registry, outer, tree, errornode));
        }

        DetectOutcome::Candidates(rank_and_filter(outer, tree, outer_root, raw))
    }
}

fn new_indent_recognizer<'a>(desc: &'a eco_lang::LanguageDescriptor, kinds: IndentKinds) -> Recognizer<'a> {
    Recognizer::new_indent(desc.table.as_ref(), &desc.lexer, desc.whitespace, kinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_common::Interner;
    use eco_lexer::parse_grammar;
    use eco_recognizer::{Action, LookupSymbol};
    use eco_tree::{NodeData, Terminal};

    struct AcceptNothing;
    impl eco_recognizer::SyntaxTable for AcceptNothing {
        fn lookup(&self, _state: u32, _symbol: LookupSymbol) -> Option<Action> {
            None
        }
    }

    fn build_registry() -> (Interner, LanguageRegistry, Symbol) {
        let mut interner = Interner::new();
        let host = interner.intern("host");
        let magic = interner.intern("<host>");
        let ws_kind = interner.intern("<ws>");
        let ret_kind = interner.intern("<return>");
        let grammar = parse_grammar("A = a\n", &mut interner).unwrap();
        let lexer = eco_lexer::Lexer::compile(&grammar).unwrap();
        let whitespace = eco_recognizer::Whitespace { ws: ws_kind, line_break: ret_kind, line_comment: None, block_comment: None };

        let mut registry = LanguageRegistry::new();
        registry.register(eco_lang::LanguageDescriptor::allows_everything(host, Box::new(AcceptNothing), lexer, whitespace, magic));
        (interner, registry, host)
    }

    #[test]
    fn new_returns_none_for_an_unregistered_outer_language() {
        let (mut interner, registry, _host) = build_registry();
        let unknown = interner.intern("nope");
        assert!(Detector::new(&registry, unknown).is_none());
    }

    #[test]
    fn new_succeeds_for_a_language_with_no_included_langs() {
        let (_interner, registry, host) = build_registry();
        assert!(Detector::new(&registry, host).is_some());
    }

    #[test]
    fn detect_lbox_short_circuits_on_a_reverted_node() {
        let (_interner, registry, host) = build_registry();
        let mut detector = Detector::new(&registry, host).unwrap();

        let mut tree = Tree::new();
        let bos = tree.bos();
        let kind = registry.get(host).unwrap().magic_kind;
        let mut terminal = Terminal::new(kind, "x");
        terminal.autobox_rejected = true;
        let node = tree.insert_after(bos, NodeData::Terminal(terminal));

        let stack = Vec::new();
        let snapshot = tree.snapshot();
        let outcome = detector.detect_lbox(&tree, bos, &stack, &snapshot, node);
        assert!(outcome.is_rejected());
    }

    #[test]
    fn detect_lbox_reports_no_candidates_for_a_plain_error_node() {
        let (_interner, registry, host) = build_registry();
        let mut detector = Detector::new(&registry, host).unwrap();

        let mut tree = Tree::new();
        let bos = tree.bos();
        let kind = registry.get(host).unwrap().magic_kind;
        let node = tree.insert_after(bos, NodeData::Terminal(Terminal::new(kind, "x")));

        let stack = Vec::new();
        let snapshot = tree.snapshot();
        let outcome = detector.detect_lbox(&tree, bos, &stack, &snapshot, node);
        assert_eq!(outcome, DetectOutcome::Candidates(Vec::new()));
    }
}
