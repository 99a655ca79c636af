use crate::dfa::{self, Dfa};
use crate::grammar::GrammarFile;
use crate::nfa;
use crate::regex;
use eco_common::{LexError, Symbol};
use eco_stream::{ConsumedSpan, StreamView};

/// One token produced by [`Lexer::next_token`]: the matched text, its rule
/// kind, how many characters the DFA read past the match before
/// committing to it (`lookahead`), which tree nodes the match consumed,
/// and where within the last node the match ended if not on a node
/// boundary (`split_index`).
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMatch {
    pub text: String,
    pub kind: Symbol,
    pub lookahead: u32,
    pub consumed: Vec<ConsumedSpan>,
    pub split_index: Option<u32>,
}

/// A compiled priority-ordered DFA lexer (component C2).
pub struct Lexer {
    dfa: Dfa,
    rule_kinds: Vec<Symbol>,
    pub indentation: bool,
}

impl Lexer {
    /// Compiles a grammar's rule list (already priority-ordered) into a
    /// single DFA via Thompson construction + subset construction.
    pub fn compile(grammar: &GrammarFile) -> Result<Self, regex::RegexError> {
        let mut asts = Vec::with_capacity(grammar.rules.len());
        let mut rule_kinds = Vec::with_capacity(grammar.rules.len());
        for rule in &grammar.rules {
            asts.push(regex::parse(&rule.pattern)?);
            rule_kinds.push(rule.kind);
        }
        let nfa = nfa::build(&asts);
        let dfa = dfa::build(&nfa);
        Ok(Self { dfa, rule_kinds, indentation: grammar.options.indentation })
    }

    /// Longest-match, priority-tie-broken lex of one token starting at
    /// stream-character offset `start`. On failure, raises a [`LexError`]
    /// carrying the farthest position the DFA reached so the caller can
    /// salvage partial progress (section 4.1, 4.8).
    pub fn next_token(&self, stream: &mut StreamView, start: u32) -> Result<TokenMatch, LexError> {
        let mut state = self.dfa.start;
        let mut pos = start;
        let mut last_accept: Option<(u32, usize)> = None;
        // Whether the loop ended because the DFA read one character past
        // the match and found no outgoing transition for it (as opposed to
        // running off the end of the stream, which reads nothing further).
        // That rejected character still counts as lookahead (section 4.1:
        // "characters the DFA read past the end of the matched token
        // before committing"), even though `pos` itself never advances
        // onto it.
        let mut rejected_peek = false;

        loop {
            if self.dfa.accept(state).is_some() {
                last_accept = Some((pos, self.dfa.accept(state).unwrap()));
            }
            let Ok(c) = stream.char_at(pos) else { break };
            match self.dfa.step(state, c) {
                Some(next) => {
                    state = next;
                    pos += 1;
                }
                None => {
                    rejected_peek = true;
                    break;
                }
            }
        }

        let Some((match_end, priority)) = last_accept else {
            let salvaged = Self::collect_text(stream, start, pos);
            return Err(LexError { at: start, salvaged });
        };

        let text = Self::collect_text(stream, start, match_end);
        let consumed = stream
            .make_token(start, match_end)
            .expect("already-read range must still resolve to consumed spans");
        let split_index = stream.split_index(&consumed);
        let lookahead = pos - match_end + if rejected_peek { 1 } else { 0 };

        Ok(TokenMatch {
            text,
            kind: self.rule_kinds[priority],
            lookahead,
            consumed,
            split_index,
        })
    }

    fn collect_text(stream: &mut StreamView, start: u32, end: u32) -> String {
        (start..end).map(|i| stream.char_at(i).expect("range within already-read bound")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar;
    use eco_common::Interner;
    use eco_tree::{NodeData, Terminal, Tree};

    fn build_stream(text: &str) -> (Tree, eco_tree::NodeId) {
        let mut interner = Interner::new();
        let raw_kind = interner.intern("RAW");
        let mut tree = Tree::new();
        let bos = tree.bos();
        tree.insert_after(bos, NodeData::Terminal(Terminal::new(raw_kind, text)));
        (tree, bos)
    }

    #[test]
    fn lexes_priority_ordered_rules() {
        let mut interner = Interner::new();
        let grammar = grammar::parse("INT = [0-9]+\nID = [a-z]+\n", &mut interner).unwrap();
        let lexer = Lexer::compile(&grammar).unwrap();
        let (tree, bos) = build_stream("ab12cd");
        let mut stream = StreamView::new(&tree, bos);

        let t1 = lexer.next_token(&mut stream, 0).unwrap();
        assert_eq!(t1.text, "ab");
        assert_eq!(interner.resolve(t1.kind), "ID");

        let t2 = lexer.next_token(&mut stream, 2).unwrap();
        assert_eq!(t2.text, "12");
        assert_eq!(interner.resolve(t2.kind), "INT");

        let t3 = lexer.next_token(&mut stream, 4).unwrap();
        assert_eq!(t3.text, "cd");
    }

    /// Scenario S2: lexing `"ab12cd"` against `{INT: [0-9]+, ID: [a-z]+}`
    /// yields lookaheads `(1, 1, 0)` — the DFA peeks one character past
    /// `"ab"` and past `"12"` to confirm neither match extends further,
    /// but hits the end of the stream right at `"cd"` with nothing left
    /// to peek at.
    #[test]
    fn lookaheads_match_scenario_s2() {
        let mut interner = Interner::new();
        let grammar = grammar::parse("INT = [0-9]+\nID = [a-z]+\n", &mut interner).unwrap();
        let lexer = Lexer::compile(&grammar).unwrap();
        let (tree, bos) = build_stream("ab12cd");
        let mut stream = StreamView::new(&tree, bos);

        let t1 = lexer.next_token(&mut stream, 0).unwrap();
        let t2 = lexer.next_token(&mut stream, 2).unwrap();
        let t3 = lexer.next_token(&mut stream, 4).unwrap();

        assert_eq!((t1.lookahead, t2.lookahead, t3.lookahead), (1, 1, 0));
    }

    #[test]
    fn lex_error_carries_salvaged_prefix() {
        let mut interner = Interner::new();
        let grammar = grammar::parse("INT = [0-9]+\n", &mut interner).unwrap();
        let lexer = Lexer::compile(&grammar).unwrap();
        let (tree, bos) = build_stream("abc");
        let mut stream = StreamView::new(&tree, bos);
        let err = lexer.next_token(&mut stream, 0).unwrap_err();
        assert_eq!(err.at, 0);
    }
}
