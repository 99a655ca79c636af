use eco_tree::{NodeData, NodeId, Tree};
use std::fmt;

/// Stand-in character the stream yields for a language-box marker: the
/// host lexer never reads inside the box, so the marker contributes
/// exactly one character's width to the stream regardless of how large its
/// embedded subtree renders to. `U+FFFC OBJECT REPLACEMENT CHARACTER` is
/// the conventional placeholder for "an embedded object goes here".
pub const MARKER_PLACEHOLDER: char = '\u{fffc}';

#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    OutOfRange { requested: u32 },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::OutOfRange { requested } => {
                write!(f, "stream index {} is past EOS", requested)
            }
        }
    }
}

impl std::error::Error for StreamError {}

/// One node's contribution to the flattened stream: its "stream text" (own
/// characters for a terminal, the placeholder for a language-box marker,
/// the recursive flattening of a composite's children), which may be
/// empty for indentation pseudo-terminals and sentinels.
struct Segment {
    node: NodeId,
    text: String,
}

/// A terminal node's characters consumed while matching one token, with the
/// offsets local to that node. When a token's match ends mid-node
/// (`end_in_node < self.text.len()` for the last span), the caller reads
/// that as the DFA's `split_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedSpan {
    pub node: NodeId,
    pub start_in_node: u32,
    pub end_in_node: u32,
}

/// Wraps a node as a character stream, extending its materialized window
/// forward on demand as the DFA asks for further characters.
pub struct StreamView<'a> {
    tree: &'a Tree,
    segments: Vec<Segment>,
    cum_len: Vec<u32>,
    next_node: Option<NodeId>,
    exhausted: bool,
}

impl<'a> StreamView<'a> {
    pub fn new(tree: &'a Tree, start: NodeId) -> Self {
        Self { tree, segments: Vec::new(), cum_len: vec![0], next_node: Some(start), exhausted: false }
    }

    fn total_len(&self) -> u32 {
        *self.cum_len.last().unwrap()
    }

    fn extend_one(&mut self) -> bool {
        let Some(id) = self.next_node else { return false };
        let Some(node) = self.tree.node(id) else {
            self.next_node = None;
            return false;
        };
        if id == self.tree.eos() {
            self.next_node = None;
            self.exhausted = true;
            return false;
        }
        self.next_node = node.next_term;
        if node.deleted() {
            return true;
        }
        let text = stream_text(self.tree, id);
        let len = self.total_len() + text.chars().count() as u32;
        self.segments.push(Segment { node: id, text });
        self.cum_len.push(len);
        true
    }

    fn ensure(&mut self, index: u32) -> Result<(), StreamError> {
        while self.total_len() <= index {
            if !self.extend_one() {
                return Err(StreamError::OutOfRange { requested: index });
            }
        }
        Ok(())
    }

    /// Random-access character at `index`, skipping pseudo-terminals and
    /// flattening composites along the way. Errors once `index` is past
    /// EOS.
    pub fn char_at(&mut self, index: u32) -> Result<char, StreamError> {
        self.ensure(index)?;
        let seg_idx = self.cum_len.partition_point(|&c| c <= index) - 1;
        let local = index - self.cum_len[seg_idx];
        self.segments[seg_idx]
            .text
            .chars()
            .nth(local as usize)
            .ok_or(StreamError::OutOfRange { requested: index })
    }

    pub fn is_out_of_range(&mut self, index: u32) -> bool {
        self.ensure(index).is_err()
    }

    /// The nodes materialized so far, each paired with how many stream
    /// characters it contributed. Indentation pseudo-terminals and other
    /// nodes that stream as empty text are included with length 0; callers
    /// that need "excluding pseudo-terminals" (section 4.3's `readlength`)
    /// filter those out themselves.
    pub fn materialized(&self) -> impl Iterator<Item = (NodeId, u32)> + '_ {
        self.segments.iter().map(|s| (s.node, s.text.chars().count() as u32))
    }

    /// Builds the `(consumed_nodes, split_index)` pair for a matched token
    /// spanning `[start, end)` in stream-character coordinates. Returns one
    /// [`ConsumedSpan`] per node actually touched, mirroring the source
    /// project's `StringWrapper.make_token` returning a list rather than a
    /// single token when a language box falls inside the matched range.
    pub fn make_token(&mut self, start: u32, end: u32) -> Result<Vec<ConsumedSpan>, StreamError> {
        if end > start {
            self.ensure(end - 1)?;
        }
        let mut spans = Vec::new();
        for (seg_idx, seg) in self.segments.iter().enumerate() {
            let seg_start = self.cum_len[seg_idx];
            let seg_end = self.cum_len[seg_idx + 1];
            if seg_end <= start || seg_start >= end {
                continue;
            }
            let span_start = start.max(seg_start) - seg_start;
            let span_end = end.min(seg_end) - seg_start;
            spans.push(ConsumedSpan { node: seg.node, start_in_node: span_start, end_in_node: span_end });
        }
        Ok(spans)
    }

    /// `split_index`: the offset within the last consumed node where a
    /// token's match ended, or `None` when the match ended exactly on a
    /// node boundary.
    pub fn split_index(&self, spans: &[ConsumedSpan]) -> Option<u32> {
        let last = spans.last()?;
        let node = self.tree.node(last.node)?;
        let node_len = match &node.data {
            NodeData::Terminal(t) if !t.is_pseudo() => t.text.chars().count() as u32,
            _ => return None,
        };
        if last.end_in_node < node_len {
            Some(last.end_in_node)
        } else {
            None
        }
    }
}

/// A node's own contribution to the flattened stream. Indentation
/// pseudo-terminals and sentinels contribute nothing; a composite
/// flattens its children; a language-box marker contributes exactly
/// [`MARKER_PLACEHOLDER`].
fn stream_text(tree: &Tree, id: NodeId) -> String {
    let Some(node) = tree.node(id) else { return String::new() };
    match &node.data {
        NodeData::Terminal(t) if t.is_pseudo() => String::new(),
        NodeData::Terminal(t) => t.text.clone(),
        NodeData::Composite(c) => c.children.iter().map(|&child| stream_text(tree, child)).collect(),
        NodeData::LangBox(_) => MARKER_PLACEHOLDER.to_string(),
        NodeData::Sentinel(_) | NodeData::Nonterminal(_) => String::new(),
    }
}
