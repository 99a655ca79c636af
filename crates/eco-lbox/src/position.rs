use eco_tree::{NodeId, Tree};

/// The character offset `node`'s own text starts at, counted from `BOS`.
/// This crate does not cache offsets on `NodeId`s the way a text buffer
/// would; candidates are rare enough (one run per lex error) that a
/// linear walk per ranking pass is the simpler, honest choice.
pub(crate) fn node_position(tree: &Tree, node: NodeId) -> u32 {
    let mut pos = 0u32;
    let mut cur = tree.next_term(tree.bos());
    while let Some(id) = cur {
        if id == node {
            break;
        }
        pos += tree.rendered_text(id).chars().count() as u32;
        cur = tree.next_term(id);
    }
    pos
}
