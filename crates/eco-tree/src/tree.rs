use crate::arena::{Arena, NodeId};
use crate::node::{Composite, LangBoxMarker, Node, NodeData, Nonterminal, Sentinel, Terminal};
use rustc_hash::FxHashMap;

/// Owns one complete token tree: the doubly linked terminal chain plus the
/// parent nonterminal structure and composite groupings layered over it.
///
/// `bos`/`eos` never move and are never removed; every other terminal-like
/// node sits strictly between them on `next_term`/`prev_term`.
pub struct Tree {
    arena: Arena,
    bos: NodeId,
    eos: NodeId,
    version: u32,
}

impl Tree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let bos = arena.insert(Node::new(NodeData::Sentinel(Sentinel::Bos)));
        let eos = arena.insert(Node::new(NodeData::Sentinel(Sentinel::Eos)));
        {
            let b = arena.get_mut(bos).unwrap();
            b.next_term = Some(eos);
        }
        {
            let e = arena.get_mut(eos).unwrap();
            e.prev_term = Some(bos);
        }
        Self { arena, bos, eos, version: 0 }
    }

    pub fn bos(&self) -> NodeId {
        self.bos
    }

    pub fn eos(&self) -> NodeId {
        self.eos
    }

    /// The current tree-edit generation, bumped once per relex pass (see
    /// `eco-incremental::relex`). Nodes inserted or retagged during a pass
    /// are stamped with the generation that pass bumped to.
    pub fn current_version(&self) -> u32 {
        self.version
    }

    pub fn bump_version(&mut self) -> u32 {
        self.version += 1;
        self.version
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.arena.get_mut(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    fn must(&self, id: NodeId) -> &Node {
        self.arena.get(id).expect("NodeId must be valid within this tree")
    }

    pub fn prev_term(&self, id: NodeId) -> Option<NodeId> {
        self.must(id).prev_term
    }

    pub fn next_term(&self, id: NodeId) -> Option<NodeId> {
        self.must(id).next_term
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.must(id).parent
    }

    /// Inserts a freshly built node on the terminal chain right after
    /// `prev`. Used by merge-back when `generated` runs ahead of `read`.
    pub fn insert_after(&mut self, prev: NodeId, data: NodeData) -> NodeId {
        let next = self.must(prev).next_term;
        let mut node = Node::new(data);
        node.prev_term = Some(prev);
        node.next_term = next;
        let id = self.arena.insert(node);
        if let Some(n) = self.arena.get_mut(prev) {
            n.next_term = Some(id);
        }
        if let Some(next) = next {
            if let Some(n) = self.arena.get_mut(next) {
                n.prev_term = Some(id);
            }
        }
        id
    }

    /// Unlinks `id` from the terminal chain and drops it from the arena.
    /// Callers that need the brief tombstone window from section 3's
    /// lifecycle notes should call [`Tree::mark_deleted`] first and defer
    /// this until any in-flight iteration over `id` has finished.
    pub fn remove(&mut self, id: NodeId) {
        let (prev, next) = {
            let n = self.must(id);
            (n.prev_term, n.next_term)
        };
        if let Some(prev) = prev {
            if let Some(n) = self.arena.get_mut(prev) {
                n.next_term = next;
            }
        }
        if let Some(next) = next {
            if let Some(n) = self.arena.get_mut(next) {
                n.prev_term = prev;
            }
        }
        self.arena.remove(id);
    }

    /// Unlinks `id` from the terminal chain without removing it from the
    /// arena, so a caller can reparent it under a composite while keeping
    /// its `NodeId` (and anything it owns, such as a language-box marker's
    /// embedded subtree) intact. Used by merge-back when folding an
    /// existing chain node into a freshly built composite.
    pub fn unlink_term(&mut self, id: NodeId) {
        let (prev, next) = {
            let n = self.must(id);
            (n.prev_term, n.next_term)
        };
        if let Some(prev) = prev {
            if let Some(n) = self.arena.get_mut(prev) {
                n.next_term = next;
            }
        }
        if let Some(next) = next {
            if let Some(n) = self.arena.get_mut(next) {
                n.prev_term = prev;
            }
        }
        if let Some(n) = self.arena.get_mut(id) {
            n.prev_term = None;
            n.next_term = None;
        }
    }

    /// Links an already arena-resident node (typically one just built with
    /// [`Tree::new_composite`]/[`Tree::new_terminal`]/[`Tree::new_lang_box`])
    /// onto the terminal chain right after `prev`, mirroring
    /// [`Tree::insert_after`] for callers that already hold a `NodeId`
    /// rather than raw `NodeData`.
    pub fn link_after(&mut self, prev: NodeId, id: NodeId) {
        let next = self.must(prev).next_term;
        if let Some(n) = self.arena.get_mut(id) {
            n.prev_term = Some(prev);
            n.next_term = next;
        }
        if let Some(n) = self.arena.get_mut(prev) {
            n.next_term = Some(id);
        }
        if let Some(next) = next {
            if let Some(n) = self.arena.get_mut(next) {
                n.prev_term = Some(id);
            }
        }
    }

    pub fn mark_deleted(&mut self, id: NodeId) {
        if let Some(n) = self.arena.get_mut(id) {
            n.set_deleted(true);
        }
    }

    pub fn set_parent(&mut self, id: NodeId, parent: NodeId) {
        if let Some(n) = self.arena.get_mut(id) {
            n.parent = Some(parent);
        }
    }

    pub fn new_nonterminal(&mut self, symbol: eco_common::Symbol) -> NodeId {
        self.arena.insert(Node::new(NodeData::Nonterminal(Nonterminal::new(symbol))))
    }

    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(Node { data: NodeData::Nonterminal(nt), .. }) = self.arena.get_mut(parent) {
            nt.children.push(child);
        }
        self.set_parent(child, parent);
    }

    pub fn new_composite(&mut self, symbol: eco_common::Symbol) -> NodeId {
        self.arena.insert(Node::new(NodeData::Composite(Composite::new(symbol))))
    }

    pub fn composite_push_child(&mut self, composite: NodeId, child: NodeId) {
        if let Some(Node { data: NodeData::Composite(c), .. }) = self.arena.get_mut(composite) {
            c.children.push(child);
        }
        self.set_parent(child, composite);
    }

    pub fn new_lang_box(&mut self, language: eco_common::Symbol) -> NodeId {
        self.arena.insert(Node::new(NodeData::LangBox(LangBoxMarker::new(language))))
    }

    pub fn new_terminal(&mut self, terminal: Terminal) -> NodeId {
        self.arena.insert(Node::terminal(terminal))
    }

    /// Walks forward from (and including) `start`, yielding every live
    /// terminal-like node. Tombstones (`deleted`) are skipped, matching
    /// section 3's "kept briefly for iteration; they must be skipped".
    pub fn iter_from(&self, start: NodeId) -> TermIter<'_> {
        TermIter { tree: self, cur: Some(start) }
    }

    /// The rendered source of one node: a terminal's own text, a
    /// composite's children concatenated, or a language-box marker's
    /// embedded subtree rendered back to source. Sentinels and
    /// nonterminals render as empty.
    pub fn rendered_text(&self, id: NodeId) -> String {
        let Some(node) = self.arena.get(id) else { return String::new() };
        match &node.data {
            NodeData::Terminal(t) if !t.is_pseudo() => t.text.clone(),
            NodeData::Terminal(_) => String::new(),
            NodeData::Composite(c) => c.children.iter().map(|&child| self.rendered_text(child)).collect(),
            NodeData::LangBox(m) => match m.root {
                Some(root) => self.subtree_text(root),
                None => String::new(),
            },
            NodeData::Sentinel(_) | NodeData::Nonterminal(_) => String::new(),
        }
    }

    /// Renders an embedded subtree (rooted at a nonterminal or a lone
    /// terminal) by walking its own terminal chain from its leftmost leaf.
    fn subtree_text(&self, root: NodeId) -> String {
        let Some(leftmost) = self.leftmost_terminal(root) else { return String::new() };
        let mut out = String::new();
        let mut cur = Some(leftmost);
        while let Some(id) = cur {
            let Some(node) = self.arena.get(id) else { break };
            if node.deleted() {
                cur = node.next_term;
                continue;
            }
            out.push_str(&self.rendered_text(id));
            if !self.is_descendant(id, root) {
                break;
            }
            cur = node.next_term;
        }
        out
    }

    fn leftmost_terminal(&self, id: NodeId) -> Option<NodeId> {
        match &self.arena.get(id)?.data {
            NodeData::Nonterminal(nt) => nt.children.first().and_then(|&c| self.leftmost_terminal(c)),
            _ => Some(id),
        }
    }

    fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.arena.get(n).and_then(|node| node.parent);
        }
        false
    }

    /// Full document reconstruction: concatenate rendered text across the
    /// whole terminal chain from `bos` to `eos`, the round-trip invariant
    /// from section 8 property 1.
    pub fn full_text(&self) -> String {
        let mut out = String::new();
        for id in self.iter_from(self.bos) {
            if id == self.eos {
                break;
            }
            out.push_str(&self.rendered_text(id));
        }
        out
    }

    /// A cheap structural snapshot of the fields the history heuristic
    /// (C7) reads "as of the previous parse version": `parent`, `prev_term`,
    /// `children` (for nonterminals, so the history heuristic can walk the
    /// old sibling chain) and the terminal-like `kind`/`state`. Per the
    /// design notes, this is a two-snapshot design rather than a per-node
    /// version log.
    ///
    /// Walks every live node reachable from `bos` via the terminal chain
    /// *and* every nonterminal ancestor along the way, since a nonterminal
    /// with no terminal descendants (an empty production) would otherwise
    /// never be visited by a terminal-chain-only walk.
    pub fn snapshot(&self) -> Snapshot {
        let mut entries = FxHashMap::default();
        let mut cur = Some(self.bos);
        while let Some(id) = cur {
            let node = self.must(id);
            self.snapshot_ancestors(id, &mut entries);
            entries.insert(
                id,
                SnapshotEntry {
                    parent: node.parent,
                    prev_term: node.prev_term,
                    children: Vec::new(),
                    kind: node.kind(),
                    state: node.state(),
                },
            );
            cur = node.next_term;
        }
        Snapshot { entries }
    }

    fn snapshot_ancestors(&self, id: NodeId, entries: &mut FxHashMap<NodeId, SnapshotEntry>) {
        let mut cur = self.must(id).parent;
        while let Some(pid) = cur {
            if entries.contains_key(&pid) {
                return;
            }
            let Some(Node { data: NodeData::Nonterminal(nt), parent, .. }) = self.arena.get(pid) else { return };
            entries.insert(
                pid,
                SnapshotEntry { parent: *parent, prev_term: None, children: nt.children.clone(), kind: None, state: None },
            );
            cur = *parent;
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TermIter<'a> {
    tree: &'a Tree,
    cur: Option<NodeId>,
}

impl<'a> Iterator for TermIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let id = self.cur?;
            let node = self.tree.arena.get(id)?;
            self.cur = node.next_term;
            if !node.deleted() {
                return Some(id);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub parent: Option<NodeId>,
    pub prev_term: Option<NodeId>,
    /// Populated only for nonterminal entries, so the history heuristic
    /// can walk the sibling chain as it stood at snapshot time.
    pub children: Vec<NodeId>,
    pub kind: Option<eco_common::Symbol>,
    pub state: Option<u32>,
}

/// See [`Tree::snapshot`].
pub struct Snapshot {
    entries: FxHashMap<NodeId, SnapshotEntry>,
}

impl Snapshot {
    pub fn get(&self, id: NodeId) -> Option<&SnapshotEntry> {
        self.entries.get(&id)
    }
}

impl Default for Snapshot {
    /// An empty snapshot: every lookup falls through to "no prior version",
    /// for callers validating against the very first parse attempt.
    fn default() -> Self {
        Self { entries: FxHashMap::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_common::Interner;

    #[test]
    fn bos_eos_linked_initially() {
        let tree = Tree::new();
        assert_eq!(tree.next_term(tree.bos()), Some(tree.eos()));
        assert_eq!(tree.prev_term(tree.eos()), Some(tree.bos()));
    }

    #[test]
    fn insert_and_remove_splice() {
        let mut interner = Interner::new();
        let int_kind = interner.intern("INT");
        let mut tree = Tree::new();
        let bos = tree.bos();
        let a = tree.insert_after(bos, NodeData::Terminal(Terminal::new(int_kind, "1")));
        let b = tree.insert_after(a, NodeData::Terminal(Terminal::new(int_kind, "2")));
        assert_eq!(tree.next_term(bos), Some(a));
        assert_eq!(tree.next_term(a), Some(b));
        assert_eq!(tree.next_term(b), Some(tree.eos()));

        tree.remove(a);
        assert_eq!(tree.next_term(bos), Some(b));
        assert_eq!(tree.prev_term(b), Some(bos));
        assert!(tree.node(a).is_none());
    }

    #[test]
    fn full_text_round_trips() {
        let mut interner = Interner::new();
        let id_kind = interner.intern("ID");
        let mut tree = Tree::new();
        let bos = tree.bos();
        let a = tree.insert_after(bos, NodeData::Terminal(Terminal::new(id_kind, "foo")));
        tree.insert_after(a, NodeData::Terminal(Terminal::new(id_kind, "bar")));
        assert_eq!(tree.full_text(), "foobar");
    }

    #[test]
    fn deleted_nodes_are_skipped_by_iteration() {
        let mut interner = Interner::new();
        let id_kind = interner.intern("ID");
        let mut tree = Tree::new();
        let bos = tree.bos();
        let a = tree.insert_after(bos, NodeData::Terminal(Terminal::new(id_kind, "foo")));
        tree.mark_deleted(a);
        let ids: Vec<_> = tree.iter_from(bos).collect();
        assert!(!ids.contains(&a));
    }
}
