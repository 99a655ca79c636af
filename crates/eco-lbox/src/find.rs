use eco_tree::{NodeData, NodeId, Sentinel, Snapshot, Tree};
use std::collections::HashSet;

pub(crate) fn is_bos(tree: &Tree, id: NodeId) -> bool {
    matches!(tree.node(id).map(|n| &n.data), Some(NodeData::Sentinel(Sentinel::Bos)))
}

fn is_terminal_leaf(tree: &Tree, id: NodeId) -> bool {
    !matches!(tree.node(id).map(|n| &n.data), Some(NodeData::Nonterminal(_)))
}

/// Starting from `startnode` (a terminal or a nonterminal subtree root),
/// walks to the terminal immediately following that subtree: descend to
/// the rightmost child repeatedly; once a terminal-like leaf is reached,
/// stop; if an *empty* nonterminal is reached instead, climb to the
/// nearest left sibling (or its parent, recursively) and resume
/// descending from there. Mirrors the source project's `find_terminal`.
///
/// A cycle in this walk (revisiting a node already seen) returns `None` —
/// this core's resolved open question on `find_terminal`'s cycle
/// detection: callers treat `None` as "this candidate source produced
/// nothing", never as an error.
///
/// Generic over how a node's `children`/`parent` are read so the same
/// walk serves both the live tree (`children_of`/`parent_of` reading
/// `tree` directly) and a historical [`Snapshot`] (the history
/// heuristic's "previous parse version" reads — see
/// [`find_terminal_snapshot`]).
fn find_terminal_generic(
    tree: &Tree,
    startnode: NodeId,
    children_of: impl Fn(NodeId) -> Vec<NodeId>,
    parent_of: impl Fn(NodeId) -> Option<NodeId>,
) -> Option<NodeId> {
    let mut cur = startnode;
    let mut visited = HashSet::new();
    loop {
        if is_bos(tree, cur) {
            break;
        }
        if !visited.insert(cur) {
            return None;
        }
        let kids = children_of(cur);
        if let Some(&last) = kids.last() {
            cur = last;
            continue;
        }
        if is_terminal_leaf(tree, cur) {
            break;
        }
        // An empty nonterminal: climb to the nearest left sibling.
        loop {
            let Some(parent) = parent_of(cur) else { return None };
            if parent == startnode {
                return None;
            }
            let siblings = children_of(parent);
            if let Some(idx) = siblings.iter().position(|&c| c == cur) {
                if idx > 0 {
                    cur = siblings[idx - 1];
                    break;
                }
            }
            cur = parent;
            if !visited.insert(cur) {
                return None;
            }
        }
    }
    tree.next_term(cur)
}

/// Live-tree variant, used by the stack and line heuristics.
pub(crate) fn find_terminal(tree: &Tree, startnode: NodeId) -> Option<NodeId> {
    find_terminal_generic(
        tree,
        startnode,
        |id| children_of(tree, id),
        |id| tree.parent(id),
    )
}

/// Snapshot variant, used by the history heuristic to walk the tree as it
/// stood at the previous parse version rather than the live structure.
pub(crate) fn find_terminal_snapshot(tree: &Tree, snapshot: &Snapshot, startnode: NodeId) -> Option<NodeId> {
    find_terminal_generic(
        tree,
        startnode,
        |id| snapshot.get(id).map(|e| e.children.clone()).unwrap_or_default(),
        |id| snapshot.get(id).and_then(|e| e.parent).or_else(|| tree.parent(id)),
    )
}

fn children_of(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    match tree.node(id).map(|n| &n.data) {
        Some(NodeData::Nonterminal(nt)) => nt.children.clone(),
        _ => Vec::new(),
    }
}
