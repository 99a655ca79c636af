use crate::generate;
use crate::lookback;
use crate::merge;
use crate::origin::RelexOrigin;
use eco_common::{LexError, Symbol};
use eco_lexer::Lexer;
use eco_tree::{NodeId, Tree};

/// Which token kind salvaged leftover text becomes when the DFA gets stuck
/// (section 4.2/4.3's `<E>` error token).
pub struct RelexConfig {
    pub error_kind: Symbol,
}

/// What one relex pass did to the tree: the origin it actually started
/// from, the nodes merge-back reports as changed (inserted or retagged —
/// see [`merge::merge_back`]'s doc comment), and, if the run hit end of
/// stream without fully resyncing, the farthest-progress [`LexError`] for
/// callers that want to surface a diagnostic alongside the `<E>` tokens
/// already spliced into the tree.
///
/// A trailing error is not a failure: the edited document may simply be
/// transiently invalid (an open string, an unterminated comment), and the
/// tree already carries that as ordinary `is_error` terminals a later edit
/// can resync past.
pub struct RelexOutcome {
    pub origin: NodeId,
    pub changed: Vec<NodeId>,
    pub trailing_error: Option<LexError>,
}

/// Ties the four incremental-relex stages together: find where to restart
/// lexing ([`RelexOrigin::resolve`]), pull tokens from the DFA until
/// resync/exhaustion/salvage ([`generate::generate`]), splice them back
/// over the stale nodes they replace ([`merge::merge_back`]), and recompute
/// `lookback` forward from the same origin so later edits can find their
/// own restart point ([`lookback::propagate`]).
///
/// Per this core's resolved open question, this single routine replaces
/// what would otherwise be two near-duplicate entry points (one deriving
/// its origin from `lookback`, one taking an explicit node) — the caller
/// picks which by the [`RelexOrigin`] variant passed in.
pub fn relex(tree: &mut Tree, lexer: &Lexer, origin: RelexOrigin, config: &RelexConfig) -> RelexOutcome {
    let before = origin.resolve(tree);
    let startnode = origin.startnode();

    let result = generate::generate(tree, lexer, before, startnode, config.error_kind);
    let changed = merge::merge_back(tree, before, &result.generated, &result.read);
    lookback::propagate(tree, before, startnode, &changed);

    let version = tree.bump_version();
    for &id in &changed {
        if let Some(node) = tree.node_mut(id) {
            node.set_version(version);
        }
    }

    RelexOutcome { origin: before, changed, trailing_error: result.unrecovered_error }
}

/// Relexes a freshly attached subtree (a bulk import, or a language box's
/// contents right after the detector creates it) from its own root, with
/// no predecessor edit to resync against.
pub fn relex_import(tree: &mut Tree, lexer: &Lexer, subtree_root: NodeId, config: &RelexConfig) -> RelexOutcome {
    relex(tree, lexer, RelexOrigin::Direct(subtree_root), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_common::Interner;
    use eco_lexer::parse_grammar;
    use eco_tree::{NodeData, Terminal};

    #[test]
    fn relex_import_tokenizes_fresh_subtree() {
        let mut interner = Interner::new();
        let grammar = parse_grammar("INT = [0-9]+\nID = [a-z]+\n", &mut interner).unwrap();
        let lexer = Lexer::compile(&grammar).unwrap();
        let error_kind = interner.intern("<E>");

        let mut tree = Tree::new();
        let bos = tree.bos();
        let raw_kind = interner.intern("RAW");
        let root = tree.insert_after(bos, NodeData::Terminal(Terminal::new(raw_kind, "ab12")));

        let outcome = relex_import(&mut tree, &lexer, root, &RelexConfig { error_kind });
        assert!(outcome.trailing_error.is_none());
        assert!(!outcome.changed.is_empty());
        assert_eq!(tree.full_text(), "ab12");
    }

    #[test]
    fn relex_from_lookback_resyncs_after_edit() {
        let mut interner = Interner::new();
        let grammar = parse_grammar("ID = [a-z]+\n", &mut interner).unwrap();
        let lexer = Lexer::compile(&grammar).unwrap();
        let id_kind = interner.intern("ID");
        let error_kind = interner.intern("<E>");

        let mut tree = Tree::new();
        let bos = tree.bos();
        let a = tree.insert_after(bos, NodeData::Terminal(Terminal::new(id_kind, "foo")));
        let edited = tree.insert_after(a, NodeData::Terminal(Terminal::new(id_kind, "xybar")));
        tree.insert_after(edited, NodeData::Terminal(Terminal::new(id_kind, "baz")));

        let outcome = relex(&mut tree, &lexer, RelexOrigin::FromLookback(edited), &RelexConfig { error_kind });
        assert!(outcome.trailing_error.is_none());
        assert_eq!(tree.full_text(), "fooxybarbaz");
    }
}
