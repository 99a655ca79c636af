use crate::merge::node_stream_len;
use eco_tree::{NodeId, Tree};
use std::collections::VecDeque;

struct LaEntry {
    remaining: i64,
    terminals_since: u32,
}

/// Recomputes `lookback` forward from `before` (the node just before the
/// first node merge-back touched) through the chain, maintaining a sliding
/// window of `(remaining_lookahead, terminals_since)` triples exactly as
/// the source project's `la_list` (section 4.3's "Lookback propagation").
///
/// At each node the new `lookback` is the largest `terminals_since` among
/// window entries whose `remaining` is still positive (0 if none). A node
/// freshly pushed as the window's own new source of lookahead starts
/// `terminals_since` one step later (once it becomes visible to its
/// immediate successor, not to itself) — its own `remaining` only starts
/// shrinking once nodes other than itself lie between it and the node
/// being evaluated.
///
/// Walking stops once a node's recomputed `lookback` equals its previously
/// stored value, the node was not itself relexed, and the walk has passed
/// `startnode` — matching the early-stop condition verbatim.
pub fn propagate(tree: &mut Tree, before: NodeId, startnode: NodeId, relexed: &[NodeId]) {
    let mut window: VecDeque<LaEntry> = VecDeque::new();
    let mut pending: Option<LaEntry> = None;
    let mut cur = Some(before);
    let mut past_start = false;
    let mut prev_len: u32 = 0;

    while let Some(id) = cur {
        for entry in window.iter_mut() {
            entry.remaining -= prev_len as i64;
            entry.terminals_since += 1;
        }
        window.retain(|e| e.remaining > 0);

        if let Some(mut entry) = pending.take() {
            entry.terminals_since = 1;
            window.push_back(entry);
        }

        let computed = window.iter().filter(|e| e.remaining > 0).map(|e| e.terminals_since).max().unwrap_or(0);

        let Some(node) = tree.node(id) else { break };
        let stored = node.lookback();
        let was_relexed = relexed.contains(&id);

        if computed as i32 == stored && !was_relexed && past_start {
            break;
        }

        if let Some(node) = tree.node_mut(id) {
            node.set_lookback(computed as i32);
        }

        if id == startnode {
            past_start = true;
        }

        let node = tree.node(id).expect("just looked up above");
        let la = node.lookahead();
        if la > 0 {
            pending = Some(LaEntry { remaining: la as i64, terminals_since: 0 });
        }

        prev_len = node_stream_len(tree, id);
        cur = tree.next_term(id);
    }
}
