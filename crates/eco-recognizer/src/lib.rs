//! LR simulation without tree construction (component C5), plus the
//! incremental replay variant (component C6) that pre-positions a
//! recognizer to the exact state the outer parser has at a chosen cut
//! point. `eco-lbox`'s detector drives both to validate language-box
//! candidates without ever building a parse tree for the host grammar.

mod incremental;
mod recognizer;
mod table;

pub use incremental::IncrementalRecognizer;
pub use recognizer::{AllowAll, IndentKinds, PossibleEnd, Recognizer, TokenGate, Whitespace};
pub use table::{Action, LookupSymbol, Production, SyntaxTable};

#[cfg(test)]
mod tests {
    use super::*;
    use eco_common::Interner;
    use eco_lexer::{parse_grammar, Lexer};
    use eco_tree::{NodeData, Terminal, Tree};

    /// A tiny hand-written table for `S -> ( S ) | a`, just enough to
    /// exercise Shift/Reduce/Goto/Accept without a table compiler (section
    /// 3: recognizer tests ship their own illustrative tables).
    struct ParenTable {
        lparen: Symbol,
        rparen: Symbol,
        a: Symbol,
        s: Symbol,
    }

    use eco_common::Symbol;

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
                (2, Nonterminal(_)) => None,
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
        let s = interner.intern("S");
        let grammar = parse_grammar("LPAREN = \\(\nRPAREN = \\)\nA = a\n<ws> = [ ]+\n", &mut interner).unwrap();
        let lexer = Lexer::compile(&grammar).unwrap();
        (interner, ParenTable { lparen, rparen, a, s }, lexer)
    }

    fn ws(interner: &mut Interner) -> Whitespace {
        Whitespace {
            ws: interner.intern("<ws>"),
            line_break: interner.intern("<return>"),
            line_comment: None,
            block_comment: None,
        }
    }

    #[test]
    fn parse_accepts_balanced_parens() {
        let (mut interner, table, lexer) = build();
        let whitespace = ws(&mut interner);
        let mut tree = Tree::new();
        let bos = tree.bos();
        let a_kind = table.a;
        tree.insert_after(bos, NodeData::Terminal(Terminal::new(table.lparen, "(")));
        let inner = tree.insert_after(tree.next_term(bos).unwrap(), NodeData::Terminal(Terminal::new(a_kind, "a")));
        tree.insert_after(inner, NodeData::Terminal(Terminal::new(table.rparen, ")")));

        let mut rec = Recognizer::new(&table, &lexer, whitespace);
        let start = tree.next_term(bos).unwrap();
        let result = rec.parse(&tree, start, &AllowAll);
        assert!(result.is_some());
        assert!(!rec.possible_ends.is_empty());
    }

    #[test]
    fn parse_rejects_unbalanced_parens() {
        let (mut interner, table, lexer) = build();
        let whitespace = ws(&mut interner);
        let mut tree = Tree::new();
        let bos = tree.bos();
        tree.insert_after(bos, NodeData::Terminal(Terminal::new(table.lparen, "(")));

        let mut rec = Recognizer::new(&table, &lexer, whitespace);
        let start = tree.next_term(bos).unwrap();
        assert!(rec.parse(&tree, start, &AllowAll).is_none());
    }

    #[test]
    fn valid_start_rejects_whitespace_token() {
        let (mut interner, table, lexer) = build();
        let whitespace = ws(&mut interner);
        let mut tree = Tree::new();
        let bos = tree.bos();
        let ws_kind = whitespace.ws;
        tree.insert_after(bos, NodeData::Terminal(Terminal::new(ws_kind, " ")));

        let mut rec = Recognizer::new(&table, &lexer, whitespace);
        let start = tree.next_term(bos).unwrap();
        assert!(rec.parse(&tree, start, &AllowAll).is_none());
    }
}
