//! The token-tree model (component C1): a doubly linked terminal chain
//! interleaved with parent nonterminal nodes, plus composite nodes that
//! group terminals lexed together and language-box markers that own an
//! embedded subtree.
//!
//! Nodes are arena-allocated and addressed by a generational [`NodeId`]
//! rather than linked via `Rc`/`RefCell`, per this core's design notes on
//! avoiding reference-counted cycles for a graph with `parent`, `prev_term`
//! and `next_term` edges.

mod arena;
mod node;
mod tree;

pub use arena::NodeId;
pub use node::{Composite, LangBoxMarker, Node, NodeData, Nonterminal, PseudoKind, Sentinel, Terminal};
pub use tree::{Snapshot, SnapshotEntry, TermIter, Tree};
