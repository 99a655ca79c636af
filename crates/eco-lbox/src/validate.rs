use crate::candidate::Candidate;
use crate::position::node_position;
use eco_lang::LanguageDescriptor;
use eco_recognizer::{IncrementalRecognizer, LookupSymbol, Recognizer};
use eco_tree::{NodeId, Tree};

struct ValidationResult {
    passed: bool,
    distance_past_end: u32,
    seen_error: bool,
}

/// Replays `outer`'s grammar from `outer_root` up to (but not through)
/// `candidate.start`, shifts the candidate's marker, then continues
/// parsing past `candidate.end` to see how much further the outer parse
/// survives. This is `parse_after_lbox_h2` from the source project: the
/// validation every ranked candidate must pass before it is accepted.
fn parse_after_lbox_h2(outer: &LanguageDescriptor, tree: &Tree, outer_root: NodeId, candidate: &Candidate, max_dist: u32) -> ValidationResult {
    let rec = Recognizer::new(outer.table.as_ref(), &outer.lexer, outer.whitespace);
    let mut ir = IncrementalRecognizer::new(rec, outer.table.as_ref(), outer.whitespace);
    ir.errornode = Some(candidate.errornode);

    if !ir.preparse(tree, outer_root, candidate.start) {
        return ValidationResult { passed: false, distance_past_end: 0, seen_error: false };
    }
    if !ir.parse_single(LookupSymbol::Terminal(candidate.marker)) {
        return ValidationResult { passed: false, distance_past_end: 0, seen_error: false };
    }

    let passed = match tree.next_term(candidate.end) {
        Some(after) => ir.parse_after(tree, after, 10, max_dist),
        None => true,
    };
    ValidationResult { passed, distance_past_end: ir.inner.abs_parse_distance, seen_error: ir.inner.seen_error }
}

/// Validates a candidate against an LR state stack the caller already has
/// in hand (typically the stack heuristic's own `StackEntry` walk) rather
/// than replaying the whole outer parse from `outer_root`. This is
/// `parse_after_lbox_h1` from the source project: a cheaper,
/// distance-limited alternative to [`parse_after_lbox_h2`] for callers
/// that already hold the cut-point stack and don't want to tie up one of
/// the detector's shared recognizer instances doing a full tree replay.
pub fn parse_after_lbox_h1(outer: &LanguageDescriptor, tree: &Tree, stack: &[u32], candidate: &Candidate, max_dist: u32) -> bool {
    let rec = Recognizer::new(outer.table.as_ref(), &outer.lexer, outer.whitespace);
    let mut ir = IncrementalRecognizer::new(rec, outer.table.as_ref(), outer.whitespace);
    ir.errornode = Some(candidate.errornode);
    ir.inner.state = stack.to_vec();

    if !ir.parse_single(LookupSymbol::Terminal(candidate.marker)) {
        return false;
    }

    match tree.next_term(candidate.end) {
        Some(after) => ir.parse_after(tree, after, 10, max_dist),
        None => true,
    }
}

fn contains_errornode(tree: &Tree, start: NodeId, end: NodeId, errornode: NodeId) -> bool {
    let mut cur = Some(start);
    while let Some(n) = cur {
        if n == errornode {
            return true;
        }
        if n == end {
            break;
        }
        cur = tree.next_term(n);
    }
    false
}

/// Sorts raw candidates by decreasing `reach` and validates each against
/// the outer grammar with `parse_after_lbox_h2`, keeping only those whose
/// validated reach is at least as far as the best candidate seen so far
/// and that either cover the error node or leave `seen_error` set.
/// Section 4.6's ranking and filtering pass; ties the three heuristics'
/// raw output back together into one ordered, validated list.
pub(crate) fn rank_and_filter(outer: &LanguageDescriptor, tree: &Tree, outer_root: NodeId, mut raw: Vec<Candidate>) -> Vec<Candidate> {
    if raw.is_empty() {
        return raw;
    }

    raw.sort_by(|a, b| {
        let ra = a.reach(node_position(tree, a.start));
        let rb = b.reach(node_position(tree, b.start));
        rb.cmp(&ra)
    });

    let mut filtered = Vec::new();
    let mut max_reach: Option<u32> = None;

    for cand in raw {
        let start_pos = node_position(tree, cand.start);
        let budget = match max_reach {
            Some(mr) => mr.saturating_sub(start_pos + cand.parse_distance),
            None => 0,
        };

        let result = parse_after_lbox_h2(outer, tree, outer_root, &cand, budget);
        if !result.passed {
            continue;
        }

        let covers_error = contains_errornode(tree, cand.start, cand.end, cand.errornode);
        if !covers_error && !result.seen_error {
            continue;
        }

        let reach = start_pos + cand.parse_distance + result.distance_past_end;
        match max_reach {
            Some(mr) if reach < mr => continue,
            _ => {
                max_reach = Some(reach);
                filtered.push(cand);
            }
        }
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_common::{Interner, Symbol};
    use eco_lexer::{parse_grammar, Lexer};
    use eco_recognizer::{Action, LookupSymbol as LS, Production, SyntaxTable, Whitespace};
    use eco_tree::{NodeData, Terminal};

    /// `S -> ( S ) | a`, with the candidate's marker wired up as an alias
    /// of `a` — the outer grammar shifts a language-box marker exactly
    /// where it would shift a bare `a`.
    struct ParenTable {
        lparen: Symbol,
        rparen: Symbol,
        a: Symbol,
        marker: Symbol,
        s: Symbol,
    }

    impl SyntaxTable for ParenTable {
        fn lookup(&self, state: u32, symbol: LS) -> Option<Action> {
            use LS::*;
            match (state, symbol) {
                (0, Terminal(k)) if k == self.lparen => Some(Action::Shift(1)),
                (0, Terminal(k)) if k == self.a || k == self.marker => Some(Action::Shift(2)),
                (1, Terminal(k)) if k == self.lparen => Some(Action::Shift(1)),
                (1, Terminal(k)) if k == self.a || k == self.marker => Some(Action::Shift(2)),
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

    fn build_descriptor() -> (Interner, eco_lang::LanguageDescriptor, ParenTable2) {
        let mut interner = Interner::new();
        let lparen = interner.intern("LPAREN");
        let rparen = interner.intern("RPAREN");
        let a = interner.intern("A");
        let marker = interner.intern("<lang>");
        let s = interner.intern("S");
        let name = interner.intern("host");
        let grammar = parse_grammar("LPAREN = \\(\nRPAREN = \\)\nA = a\n<ws> = [ ]+\n", &mut interner).unwrap();
        let lexer = Lexer::compile(&grammar).unwrap();
        let whitespace = Whitespace {
            ws: interner.intern("<ws>"),
            line_break: interner.intern("<return>"),
            line_comment: None,
            block_comment: None,
        };
        let kinds = ParenTable2 { lparen, rparen, a, marker, s };
        let table = ParenTable { lparen, rparen, a, marker, s };
        let desc = eco_lang::LanguageDescriptor::allows_everything(name, Box::new(table), lexer, whitespace, marker);
        (interner, desc, kinds)
    }

    #[derive(Clone, Copy)]
    struct ParenTable2 {
        lparen: Symbol,
        rparen: Symbol,
        a: Symbol,
        marker: Symbol,
        s: Symbol,
    }

    /// Builds `bos -> ( -> X -> ) -> eos` with an `outer_root` whose
    /// children are `[bos, lparen, X, rparen]` (`preparse`'s expected
    /// shape), and a single candidate proposing to wrap `X` in `marker`.
    fn build_tree_and_candidate(kinds: &ParenTable2) -> (Tree, NodeId, Candidate) {
        let mut tree = Tree::new();
        let bos = tree.bos();
        let lparen_id = tree.insert_after(bos, NodeData::Terminal(Terminal::new(kinds.lparen, "(")));
        let x_id = tree.insert_after(lparen_id, NodeData::Terminal(Terminal::new(kinds.a, "a")));
        let rparen_id = tree.insert_after(x_id, NodeData::Terminal(Terminal::new(kinds.rparen, ")")));

        let outer_root = tree.new_nonterminal(kinds.s);
        tree.attach_child(outer_root, bos);
        tree.attach_child(outer_root, lparen_id);
        tree.attach_child(outer_root, x_id);
        tree.attach_child(outer_root, rparen_id);

        let candidate = Candidate { start: x_id, end: x_id, language: kinds.s, parse_distance: 0, split: None, marker: kinds.marker, errornode: x_id };
        (tree, outer_root, candidate)
    }

    #[test]
    fn rank_and_filter_keeps_a_candidate_that_validates_and_covers_the_error() {
        let (_interner, desc, kinds) = build_descriptor();
        let (tree, outer_root, candidate) = build_tree_and_candidate(&kinds);

        let result = rank_and_filter(&desc, &tree, outer_root, vec![candidate]);
        assert_eq!(result, vec![candidate]);
    }

    #[test]
    fn rank_and_filter_drops_everything_when_given_no_candidates() {
        let (_interner, desc, kinds) = build_descriptor();
        let (tree, outer_root, _candidate) = build_tree_and_candidate(&kinds);

        let result = rank_and_filter(&desc, &tree, outer_root, Vec::new());
        assert!(result.is_empty());
    }

    /// `[0, 1]` is the exact stack `parse_after_lbox_h2` reaches by
    /// preparsing from `outer_root` up to (not through) `lparen`'s sibling
    /// `x_id`: state `0` shifted `(` into state `1`. Handing that stack to
    /// `parse_after_lbox_h1` directly should validate the same candidate
    /// `parse_after_lbox_h2` already validates in the test above.
    #[test]
    fn parse_after_lbox_h1_validates_from_a_caller_supplied_stack() {
        let (_interner, desc, kinds) = build_descriptor();
        let (tree, _outer_root, candidate) = build_tree_and_candidate(&kinds);

        let stack = vec![0u32, 1];
        assert!(parse_after_lbox_h1(&desc, &tree, &stack, &candidate, u32::MAX));
    }

    #[test]
    fn parse_after_lbox_h1_rejects_a_stack_that_cannot_shift_the_marker() {
        let (_interner, desc, kinds) = build_descriptor();
        let (tree, _outer_root, candidate) = build_tree_and_candidate(&kinds);

        let stack = vec![3u32];
        assert!(!parse_after_lbox_h1(&desc, &tree, &stack, &candidate, u32::MAX));
    }
}
