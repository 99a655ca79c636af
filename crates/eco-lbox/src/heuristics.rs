use crate::candidate::Candidate;
use crate::find::{find_terminal, find_terminal_snapshot, is_bos};
use crate::stack::StackEntry;
use eco_common::Symbol;
use eco_lang::{LanguageDescriptor, LanguageRegistry};
use eco_recognizer::{Action, LookupSymbol, Recognizer};
use eco_tree::{NodeData, NodeId, Snapshot, Tree};
use rustc_hash::FxHashMap;

/// Runs the embedded recognizer for `sub` from `start`, gated by the
/// host's `auto_allows`, and turns each `possible_end` it finds into a
/// `Candidate` (section 4.6: the shared tail of all three heuristics).
fn run_sub<'a>(
    recognizers: &mut FxHashMap<Symbol, Recognizer<'a>>,
    registry: &LanguageRegistry,
    outer: &LanguageDescriptor,
    sub: Symbol,
    tree: &Tree,
    start: NodeId,
    marker: Symbol,
    errornode: NodeId,
    out: &mut Vec<Candidate>,
) {
    let Some(desc) = registry.get(sub) else { return };
    let Some(rec) = recognizers.get_mut(&sub) else { return };
    rec.mode_limit_tokens_new = outer.auto_limit_new;
    let gate = |kind: Symbol| (outer.auto_allows)(sub, kind);
    rec.parse(tree, start, &gate);
    for end in rec.possible_ends.clone() {
        let is_ws = tree.node(end.node).and_then(|n| n.kind()).is_some_and(|k| desc.whitespace.is_stop(k));
        if is_ws {
            continue;
        }
        out.push(Candidate {
            start,
            end: end.node,
            language: sub,
            parse_distance: end.distance,
            split: end.split,
            marker,
            errornode,
        });
    }
}

/// Whether the outer table would shift or reduce `marker` in `state` —
/// the check every heuristic uses to decide a cut point is worth trying
/// at all before running the (much more expensive) embedded recognizer.
fn accepts_marker(outer: &LanguageDescriptor, state: u32, marker: Symbol) -> bool {
    matches!(
        outer.table.lookup(state, LookupSymbol::Terminal(marker)),
        Some(Action::Shift(_)) | Some(Action::Reduce(_))
    )
}

/// Walks the real parser's state stack from the top down; at each frame
/// whose state can shift the candidate language's marker, finds the
/// terminal right after that frame's subtree and tries parsing the
/// embedded grammar from there. Mirrors `heuristic_stack` in the source
/// project's auto-box detector.
pub(crate) fn heuristic_stack<'a>(
    recognizers: &mut FxHashMap<Symbol, Recognizer<'a>>,
    registry: &LanguageRegistry,
    outer: &LanguageDescriptor,
    tree: &Tree,
    stack: &[StackEntry],
    errornode: NodeId,
) -> Vec<Candidate> {
    let mut valid = Vec::new();
    for sub in outer.included_langs.clone() {
        let Some(marker) = registry.get(sub).map(|d| d.magic_kind) else { continue };
        let mut cut = stack.len();
        while cut > 0 {
            cut -= 1;
            let entry = stack[cut];
            if !accepts_marker(outer, entry.state, marker) {
                continue;
            }
            let Some(term) = find_terminal(tree, entry.node) else { continue };
            if tree.node(term).map(|n| n.is_sentinel()).unwrap_or(true) {
                continue;
            }
            run_sub(recognizers, registry, outer, sub, tree, term, marker, errornode, &mut valid);
        }
    }
    valid
}

/// Reads the tree as it stood at the previous parse (`prev`), walking up
/// from `errornode`'s ancestors and, at each level, checking whether the
/// left sibling the snapshot remembers could have shifted the candidate
/// language's marker back then. Mirrors `heuristic_history`: language
/// boxes that used to sit right before a node often belong there again
/// after a small edit nearby.
pub(crate) fn heuristic_history<'a>(
    recognizers: &mut FxHashMap<Symbol, Recognizer<'a>>,
    registry: &LanguageRegistry,
    outer: &LanguageDescriptor,
    tree: &Tree,
    prev: &Snapshot,
    errornode: NodeId,
) -> Vec<Candidate> {
    let mut valid = Vec::new();
    for sub in outer.included_langs.clone() {
        let Some(marker) = registry.get(sub).map(|d| d.magic_kind) else { continue };
        let mut searched = std::collections::HashSet::new();
        let mut parent = tree.parent(errornode);
        while let Some(p) = parent {
            let mut left = left_sibling(tree, prev, p);
            while let Some(l) = left {
                if is_empty_nonterminal(tree, prev, l) {
                    left = left_sibling(tree, prev, l);
                } else {
                    break;
                }
            }
            let Some(l) = left else {
                parent = prev.get(p).and_then(|e| e.parent).or_else(|| tree.parent(p));
                continue;
            };
            let state = prev.get(l).and_then(|e| e.state).or_else(|| tree.node(l).and_then(|n| n.state())).unwrap_or(0);
            if accepts_marker(outer, state, marker) {
                if let Some(term) = find_terminal_snapshot(tree, prev, l) {
                    if searched.insert(term) && !is_bos(tree, term) {
                        run_sub(recognizers, registry, outer, sub, tree, term, marker, errornode, &mut valid);
                    }
                }
            }
            parent = prev.get(p).and_then(|e| e.parent).or_else(|| tree.parent(p));
        }
    }
    valid
}

fn left_sibling(tree: &Tree, prev: &Snapshot, node: NodeId) -> Option<NodeId> {
    let parent = prev.get(node).and_then(|e| e.parent).or_else(|| tree.parent(node))?;
    let children = prev.get(parent).map(|e| e.children.clone()).unwrap_or_default();
    let idx = children.iter().position(|&c| c == node)?;
    if idx == 0 {
        None
    } else {
        Some(children[idx - 1])
    }
}

fn is_empty_nonterminal(tree: &Tree, prev: &Snapshot, id: NodeId) -> bool {
    match tree.node(id).map(|n| &n.data) {
        Some(NodeData::Nonterminal(_)) => prev.get(id).map(|e| e.children.is_empty()).unwrap_or(true),
        _ => false,
    }
}

/// Walks backward along the current logical line from `errornode`,
/// trying every token as a cut point whose state can shift the candidate
/// language's marker. Stops at a line break, `BOS`, or a composite
/// (multi-line) node. Mirrors `heuristic_line`: language boxes are most
/// often typed on the same line as the error that triggers detection.
pub(crate) fn heuristic_line<'a>(
    recognizers: &mut FxHashMap<Symbol, Recognizer<'a>>,
    registry: &LanguageRegistry,
    outer: &LanguageDescriptor,
    tree: &Tree,
    errornode: NodeId,
) -> Vec<Candidate> {
    let mut valid = Vec::new();
    for sub in outer.included_langs.clone() {
        let Some(marker) = registry.get(sub).map(|d| d.magic_kind) else { continue };
        let mut node = tree.prev_term(errornode);
        loop {
            let Some(n) = node else { break };
            let state = tree.node(n).and_then(|nd| nd.state()).unwrap_or(0);
            if accepts_marker(outer, state, marker) {
                if let Some(start) = tree.next_term(n) {
                    run_sub(recognizers, registry, outer, sub, tree, start, marker, errornode, &mut valid);
                }
            }
            let kind = tree.node(n).and_then(|nd| nd.kind());
            let is_return = kind.is_some_and(|k| k == outer.whitespace.line_break);
            let is_composite = matches!(tree.node(n).map(|nd| &nd.data), Some(NodeData::Composite(_)));
            if is_return || is_bos(tree, n) || is_composite {
                break;
            }
            node = tree.prev_term(n);
        }
    }
    valid
}
