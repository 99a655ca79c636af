use crate::stack::StackEntry;
use eco_lang::LanguageDescriptor;
use eco_recognizer::{IncrementalRecognizer, Recognizer};
use eco_tree::{NodeData, NodeId, Tree};

/// Checks whether a language box's contents would still parse under the
/// *outer* grammar on their own, starting from the real parser's current
/// state stack at the box. If so the box has become redundant (the user
/// fixed whatever made it necessary) and the editor should fold it back
/// into plain outer-language text. Mirrors `check_remove_lbox`: unlike
/// detection, removal replays the exact live stack rather than a
/// preparsed replica, since the box's full contents (not just a prefix)
/// must parse cleanly.
///
/// Returns `true` (and expects the caller to set
/// [`eco_tree::LangBoxMarker::tbd_remove`]) when the box's contents parse
/// through to its closing terminal and the outer parse continues past it
/// without error.
pub fn check_remove_lbox(outer: &LanguageDescriptor, tree: &Tree, stack: &[StackEntry], lbox: NodeId) -> bool {
    let Some(NodeData::LangBox(marker)) = tree.node(lbox).map(|n| &n.data) else { return false };
    let Some(root) = marker.root else { return false };
    let Some(first) = first_terminal(tree, root) else { return false };
    let Some(last) = last_terminal(tree, root) else { return false };
    let Some(content_start) = tree.prev_term(first) else { return false };

    let rec = Recognizer::new(outer.table.as_ref(), &outer.lexer, outer.whitespace);
    let mut ir = IncrementalRecognizer::new(rec, outer.table.as_ref(), outer.whitespace);
    ir.inner.state = stack.iter().map(|e| e.state).collect();

    if !ir.parse_until(tree, content_start, last) {
        return false;
    }

    match tree.next_term(lbox) {
        Some(after) => ir.parse_after(tree, after, 1, 0),
        None => true,
    }
}

fn first_terminal(tree: &Tree, node: NodeId) -> Option<NodeId> {
    match tree.node(node).map(|n| &n.data) {
        Some(NodeData::Nonterminal(nt)) => {
            let &first_child = nt.children.first()?;
            first_terminal(tree, first_child)
        }
        Some(_) => Some(node),
        None => None,
    }
}

fn last_terminal(tree: &Tree, node: NodeId) -> Option<NodeId> {
    match tree.node(node).map(|n| &n.data) {
        Some(NodeData::Nonterminal(nt)) => {
            let &last_child = nt.children.last()?;
            last_terminal(tree, last_child)
        }
        Some(_) => Some(node),
        None => None,
    }
}
