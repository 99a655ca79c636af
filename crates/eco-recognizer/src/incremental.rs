use crate::recognizer::{Recognizer, Whitespace};
use crate::table::{drive_reductions, Action, LookupSymbol, SyntaxTable};
use eco_tree::{NodeData, NodeId, Tree};
use std::collections::HashSet;

/// Extends [`Recognizer`] (component C5) with the ability to be
/// pre-positioned to the state the real parser has at a chosen cut point
/// (component C6), so a candidate language box can be validated against
/// exactly the context the outer parser would see.
pub struct IncrementalRecognizer<'a> {
    pub inner: Recognizer<'a>,
    table: &'a dyn SyntaxTable,
    ws: Whitespace,
    /// The terminal the detector is trying to fix; recorded so
    /// [`IncrementalRecognizer::parse_after`] can notice when shifting it
    /// directly (rather than wrapping it in the box) is what resolved the
    /// error (section 4.5's `seen_error`).
    pub errornode: Option<NodeId>,
}

impl<'a> IncrementalRecognizer<'a> {
    pub fn new(inner: Recognizer<'a>, table: &'a dyn SyntaxTable, ws: Whitespace) -> Self {
        Self { inner, table, ws, errornode: None }
    }

    /// Replays the parse from `outer_root`, skipping the subtree that
    /// contains `stop`, issuing Shift/Reduce/Goto on sibling subtrees
    /// using each subtree's root symbol as input. Leaves `self.inner.state`
    /// as the exact LR state stack the real parser has immediately before
    /// `stop` (section 4.5).
    ///
    /// Returns `false` if a sibling subtree's root symbol is not valid in
    /// the state the replay has reached — the table surface's "null"
    /// outcome, handled the same "not accepted" way section 4.8 specifies
    /// for `Recognizer::parse`.
    pub fn preparse(&mut self, tree: &Tree, outer_root: NodeId, stop: NodeId) -> bool {
        let mut path_to_stop = HashSet::new();
        let mut parent = tree.parent(stop);
        while let Some(p) = parent {
            path_to_stop.insert(p);
            parent = tree.parent(p);
        }

        let Some(NodeData::Nonterminal(root_nt)) = tree.node(outer_root).map(|n| &n.data) else {
            return false;
        };
        let Some(&first) = root_nt.children.get(1) else { return false };
        let mut node = first;

        loop {
            if node == stop {
                return true;
            }
            if path_to_stop.contains(&node) {
                if let Some(child) = first_child(tree, node) {
                    node = child;
                } else {
                    let Some(next) = right_sibling(tree, node) else { return false };
                    node = next;
                }
                continue;
            }

            let lookup = lookup_symbol_for(tree, node);
            match drive_reductions(self.table, &mut self.inner.state, lookup) {
                Some(Action::Goto(g)) => {
                    self.inner.abs_parse_distance += node_textlength(tree, node);
                    self.inner.state.push(g);
                }
                Some(Action::Shift(s)) => {
                    self.inner.abs_parse_distance += node_textlength(tree, node);
                    self.inner.state.push(s);
                }
                _ => return false,
            }
            let Some(next) = right_sibling(tree, node) else { return false };
            node = next;
        }
    }

    /// Advances by one terminal, performing all reductions needed first.
    /// Used to shift the `<lang>` marker itself onto the preparsed stack
    /// (section 4.5).
    pub fn parse_single(&mut self, symbol: LookupSymbol) -> bool {
        match drive_reductions(self.table, &mut self.inner.state, symbol) {
            Some(Action::Shift(next)) => {
                self.inner.state.push(next);
                true
            }
            Some(Action::Accept) => true,
            _ => false,
        }
    }

    /// Consumes whitespace freely from `start`, counting non-whitespace
    /// terminals shifted; succeeds when either the limits (`max_tokens`
    /// non-whitespace terminals or `max_dist` characters) are met,
    /// `Accept` fires, or at least one non-whitespace terminal shifted
    /// (section 4.5).
    pub fn parse_after(&mut self, tree: &Tree, start: NodeId, max_tokens: u32, max_dist: u32) -> bool {
        let mut parsed_tokens = 0u32;
        let mut parsed_distance = 0u32;
        let mut cur = Some(start);

        loop {
            let Some(node) = cur else { return parsed_tokens > 0 };
            let lookup = lookup_symbol_for(tree, node);
            let action = drive_reductions(self.table, &mut self.inner.state, lookup);

            if Some(node) == self.errornode && matches!(action, Some(Action::Shift(_)) | Some(Action::Accept)) {
                self.inner.seen_error = true;
            }

            match action {
                Some(Action::Shift(next)) => {
                    self.inner.state.push(next);
                    let len = node_textlength(tree, node);
                    self.inner.abs_parse_distance += len;
                    let is_ws = tree.node(node).and_then(|n| n.kind()).is_some_and(|k| self.ws.is_skip(k));
                    if is_ws {
                        cur = tree.next_term(node);
                        continue;
                    }
                    parsed_distance += len;
                    parsed_tokens += 1;
                    if parsed_tokens >= max_tokens && parsed_distance >= max_dist {
                        return true;
                    }
                    cur = tree.next_term(node);
                }
                Some(Action::Accept) => return true,
                _ => return parsed_tokens > 0,
            }
        }
    }

    /// Parses every terminal from `start.next_term` through `end`
    /// inclusive, shifting/reducing as each is consulted; used by
    /// `eco-lbox`'s removal check to confirm a box's contents still parse
    /// cleanly in the outer grammar.
    pub fn parse_until(&mut self, tree: &Tree, start: NodeId, end: NodeId) -> bool {
        let mut node = match tree.next_term(start) {
            Some(n) => n,
            None => return false,
        };
        loop {
            let lookup = lookup_symbol_for(tree, node);
            match drive_reductions(self.table, &mut self.inner.state, lookup) {
                Some(Action::Shift(s)) => self.inner.state.push(s),
                Some(Action::Accept) => {}
                _ => return false,
            }
            if node == end {
                return true;
            }
            node = match tree.next_term(node) {
                Some(n) => n,
                None => return false,
            };
        }
    }
}

fn lookup_symbol_for(tree: &Tree, node: NodeId) -> LookupSymbol {
    match tree.node(node).map(|n| &n.data) {
        Some(NodeData::Nonterminal(nt)) => LookupSymbol::Nonterminal(nt.symbol),
        Some(_) => match tree.node(node).and_then(|n| n.kind()) {
            Some(k) => LookupSymbol::Terminal(k),
            None => LookupSymbol::Finish,
        },
        None => LookupSymbol::Finish,
    }
}

fn node_textlength(tree: &Tree, node: NodeId) -> u32 {
    tree.rendered_text(node).chars().count() as u32
}

fn first_child(tree: &Tree, node: NodeId) -> Option<NodeId> {
    match tree.node(node).map(|n| &n.data) {
        Some(NodeData::Nonterminal(nt)) => nt.children.first().copied(),
        _ => None,
    }
}

fn right_sibling(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let parent = tree.parent(node)?;
    let NodeData::Nonterminal(nt) = &tree.node(parent)?.data else { return None };
    let idx = nt.children.iter().position(|&c| c == node)?;
    nt.children.get(idx + 1).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{Recognizer, Whitespace};
    use crate::table::{Action, LookupSymbol, Production, SyntaxTable};
    use eco_common::{Interner, Symbol};
    use eco_lexer::{parse_grammar, Lexer};
    use eco_tree::Terminal;

    /// `S -> ( S ) | a`, with the magic marker wired up as an alias of `a`
    /// so a single small table can stand in for a host grammar that shifts
    /// a language-box marker in the same positions it would shift `a`.
    struct ParenTable {
        lparen: Symbol,
        rparen: Symbol,
        a: Symbol,
        marker: Symbol,
        s: Symbol,
    }

    impl SyntaxTable for ParenTable {
        fn lookup(&self, state: u32, symbol: LookupSymbol) -> Option<Action> {
            use LookupSymbol::*;
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

    fn build() -> (Interner, ParenTable, Lexer) {
        let mut interner = Interner::new();
        let lparen = interner.intern("LPAREN");
        let rparen = interner.intern("RPAREN");
        let a = interner.intern("A");
        let marker = interner.intern("<lang>");
        let s = interner.intern("S");
        let grammar = parse_grammar("LPAREN = \\(\nRPAREN = \\)\nA = a\n<ws> = [ ]+\n", &mut interner).unwrap();
        let lexer = Lexer::compile(&grammar).unwrap();
        (interner, ParenTable { lparen, rparen, a, marker, s }, lexer)
    }

    fn ws(interner: &mut Interner) -> Whitespace {
        Whitespace {
            ws: interner.intern("<ws>"),
            line_break: interner.intern("<return>"),
            line_comment: None,
            block_comment: None,
        }
    }

    /// Builds `bos -> ( -> a -> ) -> eos` with an `outer_root` nonterminal
    /// whose children are `[bos, lparen, a, rparen]`, matching the shape
    /// `preparse` expects (`children[1..]` is the real content; `children[0]`
    /// is skipped, mirroring how a real parser's root production always
    /// carries a leading sentinel-adjacent child).
    fn build_tree(table: &ParenTable) -> (Tree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let bos = tree.bos();
        let lparen_id = tree.insert_after(bos, NodeData::Terminal(Terminal::new(table.lparen, "(")));
        let a_id = tree.insert_after(lparen_id, NodeData::Terminal(Terminal::new(table.a, "a")));
        let rparen_id = tree.insert_after(a_id, NodeData::Terminal(Terminal::new(table.rparen, ")")));

        let outer_root = tree.new_nonterminal(table.s);
        tree.attach_child(outer_root, bos);
        tree.attach_child(outer_root, lparen_id);
        tree.attach_child(outer_root, a_id);
        tree.attach_child(outer_root, rparen_id);

        (tree, outer_root, lparen_id, a_id, rparen_id)
    }

    #[test]
    fn preparse_positions_state_immediately_before_stop() {
        let (mut interner, table, lexer) = build();
        let whitespace = ws(&mut interner);
        let (tree, outer_root, _lparen, a_id, _rparen) = build_tree(&table);

        let rec = Recognizer::new(&table, &lexer, whitespace);
        let mut ir = IncrementalRecognizer::new(rec, &table, whitespace);

        assert!(ir.preparse(&tree, outer_root, a_id));
        assert_eq!(ir.inner.state, vec![0, 1]);
    }

    #[test]
    fn parse_single_shifts_the_marker_like_its_alias() {
        let (mut interner, table, lexer) = build();
        let whitespace = ws(&mut interner);
        let (tree, outer_root, _lparen, a_id, _rparen) = build_tree(&table);

        let rec = Recognizer::new(&table, &lexer, whitespace);
        let mut ir = IncrementalRecognizer::new(rec, &table, whitespace);
        assert!(ir.preparse(&tree, outer_root, a_id));

        assert!(ir.parse_single(LookupSymbol::Terminal(table.marker)));
        assert_eq!(ir.inner.state, vec![0, 1, 2]);
    }

    #[test]
    fn parse_after_reduces_and_accepts_past_the_marker() {
        let (mut interner, table, lexer) = build();
        let whitespace = ws(&mut interner);
        let (tree, outer_root, _lparen, a_id, rparen_id) = build_tree(&table);

        let rec = Recognizer::new(&table, &lexer, whitespace);
        let mut ir = IncrementalRecognizer::new(rec, &table, whitespace);
        assert!(ir.preparse(&tree, outer_root, a_id));
        assert!(ir.parse_single(LookupSymbol::Terminal(table.marker)));

        // max_tokens=1, max_dist=0: the very first non-whitespace shift
        // (`)`) already satisfies both limits, so `parse_after` reports
        // success as soon as it has shifted, without reducing further.
        assert!(ir.parse_after(&tree, rparen_id, 1, 0));
        assert_eq!(ir.inner.state, vec![0, 1, 3, 5]);
    }

    #[test]
    fn parse_after_reaches_accept_when_given_room_to_reduce() {
        let (mut interner, table, lexer) = build();
        let whitespace = ws(&mut interner);
        let (tree, outer_root, _lparen, a_id, rparen_id) = build_tree(&table);

        let rec = Recognizer::new(&table, &lexer, whitespace);
        let mut ir = IncrementalRecognizer::new(rec, &table, whitespace);
        assert!(ir.preparse(&tree, outer_root, a_id));
        assert!(ir.parse_single(LookupSymbol::Terminal(table.marker)));

        // A limit no single token can satisfy forces `parse_after` to keep
        // consuming until the stream itself ends, reducing all the way to
        // `Accept`.
        assert!(ir.parse_after(&tree, rparen_id, 10, 10));
        assert_eq!(ir.inner.state, vec![0, 4]);
    }

    #[test]
    fn parse_until_walks_the_whole_span_inclusive() {
        let (mut interner, table, lexer) = build();
        let whitespace = ws(&mut interner);
        let (tree, _outer_root, _lparen, _a_id, rparen_id) = build_tree(&table);
        let bos = tree.bos();

        let rec = Recognizer::new(&table, &lexer, whitespace);
        let mut ir = IncrementalRecognizer::new(rec, &table, whitespace);

        assert!(ir.parse_until(&tree, bos, rparen_id));
        assert_eq!(ir.inner.state, vec![0, 1, 3, 5]);
    }
}
