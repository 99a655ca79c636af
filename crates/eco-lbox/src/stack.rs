use eco_tree::NodeId;

/// One frame of the outer parser's LR state stack as the detector sees
/// it: the state the real parser was in, paired with the tree node
/// whose subtree that state was reached after shifting/reducing. The
/// stack heuristic walks this from the top down looking for a frame
/// that can shift a language-box marker (section 4.6's `heuristic_stack`
/// over `self.op.stack`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEntry {
    pub state: u32,
    pub node: NodeId,
}
