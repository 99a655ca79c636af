use crate::generate::GeneratedToken;
use eco_common::Symbol;
use eco_tree::{NodeData, NodeId, PseudoKind, Terminal, Tree};

/// Splices `generated` back over `read`, walking both in lockstep by
/// cumulative length (section 4.3's "Merge-back"):
///
/// - `generated` position ahead of `read` position → insert a fresh node.
/// - `read` position ahead of `generated` position → remove the next read
///   node.
/// - Equal → overwrite the read node's `(text, kind, lookahead)` in place;
///   mark it `changed` (and return it in the changed-node list) only if
///   its `kind` changed, per the spec's literal wording.
///
/// Each `read` node's original length is read just before it is
/// overwritten or removed, so `r_pos` always advances by the *old* text's
/// length while `g_pos` advances by the *new* text's length — the two
/// sequences are different texts synchronized at checkpoints, not
/// literally equal characters.
///
/// Language-box markers are never rewritten as text; a read position
/// landing on one is reused untouched, never removed. A composite read
/// node is reused the same way, with only its `kind`/`lookahead` updated
/// in place when they changed — its children, and any marker among them,
/// are left alone. When one generated token's match spans several read
/// nodes at once (`GeneratedToken::consumed` longer than one span), that
/// is this crate's encoding of the spec's `new mt`/`finish mt`
/// composite-boundary entries: the spanned nodes are folded into a
/// composite (splitting a plain terminal's text at the span boundary when
/// the match starts or ends mid-node) instead of being flattened into one
/// plain terminal.
pub fn merge_back(tree: &mut Tree, origin: NodeId, generated: &[GeneratedToken], read: &[NodeId]) -> Vec<NodeId> {
    let mut changed = Vec::new();
    let mut insert_after = origin;
    let mut gi = 0usize;
    let mut ri = 0usize;
    let mut g_pos: u32 = 0;
    let mut r_pos: u32 = 0;

    while gi < generated.len() || ri < read.len() {
        let g_done = gi >= generated.len();
        let r_done = ri >= read.len();

        if !g_done && (r_done || g_pos > r_pos) {
            let tok = &generated[gi];
            let new_id = tree.insert_after(insert_after, NodeData::Terminal(to_terminal(tok)));
            changed.push(new_id);
            insert_after = new_id;
            g_pos += tok.text.chars().count() as u32;
            gi += 1;
            continue;
        }

        if !r_done && (g_done || r_pos > g_pos) {
            let id = read[ri];
            let len = node_stream_len(tree, id);
            tree.mark_deleted(id);
            tree.remove(id);
            r_pos += len;
            ri += 1;
            continue;
        }

        let tok = &generated[gi];
        let span = tok.consumed.len().max(1).min(read.len() - ri);

        if span > 1 {
            let nodes = read[ri..ri + span].to_vec();
            let orig_len: u32 = nodes.iter().map(|&n| node_stream_len(tree, n)).sum();
            let comp = splice_composite(tree, insert_after, tok, &nodes);
            changed.push(comp);
            insert_after = comp;
            g_pos += tok.text.chars().count() as u32;
            r_pos += orig_len;
            ri += span;
            gi += 1;
            continue;
        }

        let id = read[ri];
        let orig_len = node_stream_len(tree, id);
        let kind_before = tree.node(id).and_then(|n| n.kind());
        match tree.node(id).map(|n| &n.data) {
            Some(NodeData::Terminal(_)) => {
                overwrite_terminal(tree, id, tok);
                if kind_before != Some(tok.kind) {
                    changed.push(id);
                }
            }
            Some(NodeData::LangBox(_)) => {
                // Never rewritten as text; reused exactly as it was.
            }
            Some(NodeData::Composite(_)) => {
                overwrite_composite_kind(tree, id, tok);
                if kind_before != Some(tok.kind) {
                    changed.push(id);
                }
            }
            _ => {
                overwrite_terminal(tree, id, tok);
            }
        }
        insert_after = id;
        g_pos += tok.text.chars().count() as u32;
        r_pos += orig_len;
        gi += 1;
        ri += 1;
    }

    changed
}

fn to_terminal(tok: &GeneratedToken) -> Terminal {
    let mut t = Terminal::new(tok.kind, tok.text.clone());
    t.lookahead = tok.lookahead;
    t.is_error = tok.is_error;
    t.changed = true;
    t
}

fn overwrite_terminal(tree: &mut Tree, id: NodeId, tok: &GeneratedToken) {
    if let Some(node) = tree.node_mut(id) {
        if let NodeData::Terminal(t) = &mut node.data {
            t.kind = tok.kind;
            t.text = tok.text.clone();
            t.lookahead = tok.lookahead;
            t.is_error = tok.is_error;
        }
    }
}

/// A composite's children already reproduce the token's text (that is
/// what landed it at this checkpoint in the first place); only its own
/// `kind`/`lookahead` bookkeeping needs to catch up, never its children.
fn overwrite_composite_kind(tree: &mut Tree, id: NodeId, tok: &GeneratedToken) {
    if let Some(node) = tree.node_mut(id) {
        if let NodeData::Composite(c) = &mut node.data {
            c.kind = tok.kind;
            c.lookahead = tok.lookahead;
        }
    }
}

/// Folds the read nodes one generated token's match spanned (section
/// 4.3's `new mt`/`finish mt` composite boundary) into a single composite.
/// A language-box marker among `nodes` is adopted unchanged, keeping its
/// `NodeId` so its embedded subtree survives intact. A plain terminal
/// consumed in full is adopted unchanged too; one consumed only partly at
/// the leading or trailing edge (the match started or ended mid-node) is
/// split in place: the unconsumed remainder stays on the terminal chain
/// as its own node, and only the consumed slice joins the composite.
fn splice_composite(tree: &mut Tree, insert_after: NodeId, tok: &GeneratedToken, nodes: &[NodeId]) -> NodeId {
    let comp = tree.new_composite(tok.kind);
    let last_idx = nodes.len() - 1;
    let mut leading_kept: Option<NodeId> = None;
    let mut trailing_kept: Option<NodeId> = None;

    for (i, &n) in nodes.iter().enumerate() {
        let span = tok.consumed.get(i);
        let is_first = i == 0;
        let is_last = i == last_idx;
        let data = tree.node(n).map(|node| node.data.clone());

        let plain_terminal = match &data {
            Some(NodeData::Terminal(t)) if !t.is_pseudo() => Some(t.clone()),
            _ => None,
        };

        match plain_terminal {
            Some(t) => {
                let chars: Vec<char> = t.text.chars().collect();
                let full_len = chars.len() as u32;
                let (start, end) = span.map(|s| (s.start_in_node, s.end_in_node)).unwrap_or((0, full_len));

                if start == 0 && end == full_len {
                    tree.unlink_term(n);
                    tree.composite_push_child(comp, n);
                } else if is_first && !is_last && start > 0 {
                    let prefix: String = chars[..start as usize].iter().collect();
                    let slice: String = chars[start as usize..end as usize].iter().collect();
                    set_terminal_text(tree, n, prefix);
                    let piece_id = tree.new_terminal(new_piece(tok.kind, slice));
                    tree.composite_push_child(comp, piece_id);
                    leading_kept = Some(n);
                } else if is_last && !is_first && end < full_len {
                    let suffix: String = chars[end as usize..].iter().collect();
                    let slice: String = chars[start as usize..end as usize].iter().collect();
                    set_terminal_text(tree, n, suffix);
                    let piece_id = tree.new_terminal(new_piece(tok.kind, slice));
                    tree.composite_push_child(comp, piece_id);
                    trailing_kept = Some(n);
                } else {
                    tree.unlink_term(n);
                    tree.composite_push_child(comp, n);
                }
            }
            None => {
                // Language-box marker, existing composite, or pseudo-terminal:
                // always consumed whole, never split.
                tree.unlink_term(n);
                tree.composite_push_child(comp, n);
            }
        }
    }

    let anchor = leading_kept.unwrap_or(insert_after);
    tree.link_after(anchor, comp);
    if let Some(suffix) = trailing_kept {
        tree.link_after(comp, suffix);
    }
    comp
}

fn set_terminal_text(tree: &mut Tree, id: NodeId, text: String) {
    if let Some(node) = tree.node_mut(id) {
        if let NodeData::Terminal(t) = &mut node.data {
            t.text = text;
        }
    }
}

fn new_piece(kind: Symbol, text: String) -> Terminal {
    let mut t = Terminal::new(kind, text);
    t.changed = true;
    t
}

/// Mirrors `eco_stream`'s stream-text flattening (own text for a plain
/// terminal, 0 for a pseudo-terminal, the sum of children for a composite,
/// 1 for a language-box marker) so merge-back's length bookkeeping stays
/// in the same units `eco-stream`/`eco-lexer` used to produce `read`.
pub(crate) fn node_stream_len(tree: &Tree, id: NodeId) -> u32 {
    let Some(node) = tree.node(id) else { return 0 };
    match &node.data {
        NodeData::Terminal(t) if t.pseudo.is_some() => 0,
        NodeData::Terminal(t) => t.text.chars().count() as u32,
        NodeData::Composite(c) => c.children.iter().map(|&child| node_stream_len(tree, child)).sum(),
        NodeData::LangBox(_) => 1,
        NodeData::Sentinel(_) | NodeData::Nonterminal(_) => 0,
    }
}

/// Kept only so indentation-aware callers can tag a freshly inserted
/// synthetic token; not used by `merge_back` itself.
#[allow(dead_code)]
pub(crate) fn pseudo_terminal(kind: Symbol, pseudo: PseudoKind) -> Terminal {
    Terminal::pseudo(kind, pseudo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_common::Interner;
    use eco_stream::ConsumedSpan;
    use eco_tree::{Composite, LangBoxMarker, Tree};

    fn push(tree: &mut Tree, cur: NodeId, t: Terminal) -> NodeId {
        tree.insert_after(cur, NodeData::Terminal(t))
    }

    #[test]
    fn overwrite_in_place_when_lengths_match() {
        let mut interner = Interner::new();
        let id_kind = interner.intern("ID");
        let mut tree = Tree::new();
        let bos = tree.bos();
        let a = push(&mut tree, bos, Terminal::new(id_kind, "ab"));

        let generated = vec![GeneratedToken { kind: id_kind, text: "ax".into(), lookahead: 0, is_error: false, consumed: Vec::new() }];
        let changed = merge_back(&mut tree, bos, &generated, &[a]);
        assert!(changed.is_empty(), "kind unchanged, so no node should be reported changed");
        assert_eq!(tree.node(a).unwrap().own_text(), "ax");
    }

    #[test]
    fn kind_change_marks_node_changed() {
        let mut interner = Interner::new();
        let id_kind = interner.intern("ID");
        let int_kind = interner.intern("INT");
        let mut tree = Tree::new();
        let bos = tree.bos();
        let a = push(&mut tree, bos, Terminal::new(id_kind, "12"));

        let generated = vec![GeneratedToken { kind: int_kind, text: "12".into(), lookahead: 0, is_error: false, consumed: Vec::new() }];
        let changed = merge_back(&mut tree, bos, &generated, &[a]);
        assert_eq!(changed, vec![a]);
        assert_eq!(tree.node(a).unwrap().kind(), Some(int_kind));
    }

    #[test]
    fn extra_generated_tokens_are_inserted() {
        let mut interner = Interner::new();
        let id_kind = interner.intern("ID");
        let mut tree = Tree::new();
        let bos = tree.bos();
        let a = push(&mut tree, bos, Terminal::new(id_kind, "ab"));

        let generated = vec![
            GeneratedToken { kind: id_kind, text: "a".into(), lookahead: 0, is_error: false, consumed: Vec::new() },
            GeneratedToken { kind: id_kind, text: "b".into(), lookahead: 0, is_error: false, consumed: Vec::new() },
        ];
        let changed = merge_back(&mut tree, bos, &generated, &[a]);
        assert_eq!(changed.len(), 1, "only the freshly inserted node is reported; the overwritten one kept its kind");
    }

    #[test]
    fn extra_read_nodes_are_removed() {
        let mut interner = Interner::new();
        let id_kind = interner.intern("ID");
        let mut tree = Tree::new();
        let bos = tree.bos();
        let a = push(&mut tree, bos, Terminal::new(id_kind, "a"));
        let b = push(&mut tree, a, Terminal::new(id_kind, "b"));

        let generated = vec![GeneratedToken { kind: id_kind, text: "ab".into(), lookahead: 0, is_error: false, consumed: Vec::new() }];
        merge_back(&mut tree, bos, &generated, &[a, b]);
        assert!(tree.node(b).is_none(), "merging two nodes into one token removes the extra node");
    }

    /// Section 4.3's "language-box markers are never rewritten as text;
    /// they survive intact" — a read position landing on one at an equal
    /// checkpoint must leave it exactly as it was, never remove it.
    #[test]
    fn lang_box_marker_survives_an_equal_checkpoint() {
        let mut interner = Interner::new();
        let lang = interner.intern("<lua>");
        let any_kind = interner.intern("TOK");
        let mut tree = Tree::new();
        let bos = tree.bos();
        let marker = tree.insert_after(bos, NodeData::LangBox(LangBoxMarker::new(lang)));

        let generated = vec![GeneratedToken { kind: any_kind, text: "\u{fffc}".into(), lookahead: 0, is_error: false, consumed: Vec::new() }];
        let changed = merge_back(&mut tree, bos, &generated, &[marker]);

        assert!(changed.is_empty());
        assert!(tree.contains(marker));
        assert!(matches!(tree.node(marker).unwrap().data, NodeData::LangBox(_)));
    }

    /// A composite read node at an equal checkpoint is reused, not
    /// destroyed: only its own `kind` catches up, its children (and any
    /// embedded language box among them) are left untouched.
    #[test]
    fn composite_read_node_is_reused_when_its_kind_changes() {
        let mut interner = Interner::new();
        let str_kind = interner.intern("STRING");
        let new_kind = interner.intern("STRING2");
        let mut tree = Tree::new();
        let bos = tree.bos();
        let child = tree.new_terminal(Terminal::new(str_kind, "hi"));
        let mut data = Composite::new(str_kind);
        data.children.push(child);
        let comp = tree.insert_after(bos, NodeData::Composite(data));

        let generated = vec![GeneratedToken { kind: new_kind, text: "hi".into(), lookahead: 0, is_error: false, consumed: Vec::new() }];
        let changed = merge_back(&mut tree, bos, &generated, &[comp]);

        assert_eq!(changed, vec![comp]);
        assert!(tree.contains(child), "children survive a composite's own kind update");
        match &tree.node(comp).unwrap().data {
            NodeData::Composite(c) => {
                assert_eq!(c.kind, new_kind);
                assert_eq!(c.children, vec![child]);
            }
            other => panic!("expected a composite, got {other:?}"),
        }
    }

    /// Scenario S4: a generated token whose match spans a plain terminal
    /// and an already-embedded language-box marker in one pass folds them
    /// into a fresh composite rather than flattening the marker away.
    #[test]
    fn a_token_spanning_a_marker_creates_a_composite() {
        let mut interner = Interner::new();
        let str_kind = interner.intern("STRING");
        let lang = interner.intern("<lua>");
        let mut tree = Tree::new();
        let bos = tree.bos();
        let prefix = tree.insert_after(bos, NodeData::Terminal(Terminal::new(str_kind, "\"hello")));
        let marker = tree.insert_after(prefix, NodeData::LangBox(LangBoxMarker::new(lang)));
        let suffix = tree.insert_after(marker, NodeData::Terminal(Terminal::new(str_kind, "\"")));

        let consumed = vec![
            ConsumedSpan { node: prefix, start_in_node: 0, end_in_node: 6 },
            ConsumedSpan { node: marker, start_in_node: 0, end_in_node: 1 },
            ConsumedSpan { node: suffix, start_in_node: 0, end_in_node: 1 },
        ];
        let generated = vec![GeneratedToken {
            kind: str_kind,
            text: "\"hello\u{fffc}\"".into(),
            lookahead: 0,
            is_error: false,
            consumed,
        }];

        let changed = merge_back(&mut tree, bos, &generated, &[prefix, marker, suffix]);

        assert_eq!(changed.len(), 1);
        let comp = changed[0];
        match &tree.node(comp).unwrap().data {
            NodeData::Composite(c) => {
                assert_eq!(c.kind, str_kind);
                assert_eq!(c.children, vec![prefix, marker, suffix]);
            }
            other => panic!("expected a composite, got {other:?}"),
        }
        assert!(tree.contains(marker), "the marker survives as the composite's child");
        assert_eq!(tree.next_term(bos), Some(comp));
    }
}
