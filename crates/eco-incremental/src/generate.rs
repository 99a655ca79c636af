use eco_common::Symbol;
use eco_lexer::Lexer;
use eco_stream::{ConsumedSpan, StreamView};
use eco_tree::{NodeId, Tree};

/// One token the relex loop produced, ready to be matched back against
/// (or spliced in as a replacement for) a `read` node during merge-back.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedToken {
    pub kind: Symbol,
    pub text: String,
    pub lookahead: u32,
    /// Synthetic `<E>` token salvaged from a lex error (section 4.3's
    /// salvage step), rather than a real DFA match.
    pub is_error: bool,
    /// The `read` nodes this token's match actually touched, carried over
    /// from `TokenMatch::consumed`. Empty for salvaged `<E>` tokens, which
    /// do not correspond to a single DFA match. A length greater than one
    /// is this crate's encoding of section 4.3's `new mt`/`finish mt`
    /// composite-boundary pseudo-entries: instead of separate stream
    /// entries, the boundary is implicit in the span list itself — the
    /// first span opens the composite, the last closes it, and
    /// `merge_back` reuses or creates one spanning exactly those nodes.
    pub consumed: Vec<ConsumedSpan>,
}

/// The result of pulling tokens from the DFA starting at the relex origin:
/// the accumulated `generated` tokens, the `read` nodes they were measured
/// against, and (if the stream hit a dead end) the lex error, which the
/// caller re-raises only if it could not be folded into a salvaged `<E>`
/// token and retried.
pub struct GenerateResult {
    pub generated: Vec<GeneratedToken>,
    pub read: Vec<NodeId>,
    pub unrecovered_error: Option<eco_common::LexError>,
}

/// Runs the DFA/stream generate loop from `origin`, stopping at whichever
/// of section 4.3's three termination conditions fires first:
///
/// 1. `tokenslength == readlength`, the run has passed `startnode`, and the
///    freshly generated last token exactly matches the read node it would
///    replace — the tree has resynced, so that pair is popped and the loop
///    stops without touching anything past it.
/// 2. The stream is exhausted (origin's window reaches EOS).
/// 3. A `LexingError` — the leftover characters are salvaged into
///    `<E>` tokens (split on `\r` so line structure survives) and the loop
///    either keeps going (if `startnode` has not been reached yet) or
///    returns the unrecovered error for the caller to re-raise after
///    merge-back.
pub fn generate(
    tree: &Tree,
    lexer: &Lexer,
    origin: NodeId,
    startnode: NodeId,
    error_kind: Symbol,
) -> GenerateResult {
    let mut stream = StreamView::new(tree, origin);
    let mut generated: Vec<GeneratedToken> = Vec::new();
    let mut pos: u32 = 0;
    let mut tokenslength: u32 = 0;

    loop {
        if stream.is_out_of_range(pos) {
            return GenerateResult { generated, read: materialized_read(&stream), unrecovered_error: None };
        }

        match lexer.next_token(&mut stream, pos) {
            Ok(tok) => {
                let len = tok.text.chars().count() as u32;
                pos += len;
                tokenslength += len;
                generated.push(GeneratedToken {
                    kind: tok.kind,
                    text: tok.text,
                    lookahead: tok.lookahead,
                    is_error: false,
                    consumed: tok.consumed,
                });

                let read = materialized_read(&stream);
                let readlength: u32 = read.iter().map(|&(_, len)| len).sum();
                if readlength == tokenslength && past_startnode(tree, &read, startnode) {
                    if let (Some(last_gen), Some(&(last_read, _))) = (generated.last(), read.last()) {
                        if node_matches(tree, last_read, last_gen) {
                            generated.pop();
                            let read_ids: Vec<NodeId> = read[..read.len() - 1].iter().map(|&(id, _)| id).collect();
                            return GenerateResult { generated, read: read_ids, unrecovered_error: None };
                        }
                    }
                }
            }
            Err(err) => {
                let read = materialized_read(&stream);
                let readlength: u32 = read.iter().map(|&(_, len)| len).sum();
                let leftover = readlength.saturating_sub(tokenslength);
                if leftover > 0 {
                    let text = collect_leftover(tree, &read, tokenslength, leftover);
                    for piece in split_on_cr(&text) {
                        let piece_len = piece.chars().count() as u32;
                        tokenslength += piece_len;
                        generated.push(GeneratedToken { kind: error_kind, text: piece, lookahead: 0, is_error: true, consumed: Vec::new() });
                    }
                }
                let reached_start = past_startnode(tree, &read, startnode);
                let read_ids: Vec<NodeId> = read.iter().map(|&(id, _)| id).collect();
                if !reached_start {
                    // Retry is the caller's responsibility: it re-enters `generate`
                    // with `origin` advanced past the salvaged text. Returning here
                    // with the error keeps this function a single straight-line pass.
                    return GenerateResult { generated, read: read_ids, unrecovered_error: Some(err) };
                }
                return GenerateResult { generated, read: read_ids, unrecovered_error: Some(err) };
            }
        }
    }
}

fn materialized_read(stream: &StreamView) -> Vec<(NodeId, u32)> {
    stream.materialized().filter(|&(_, len)| len > 0).collect()
}

fn node_matches(tree: &Tree, node: NodeId, token: &GeneratedToken) -> bool {
    let Some(n) = tree.node(node) else { return false };
    n.kind() == Some(token.kind) && tree_rendered_eq(tree, node, &token.text)
}

fn tree_rendered_eq(tree: &Tree, node: NodeId, text: &str) -> bool {
    tree.rendered_text(node) == text
}

/// Whether `read`'s last entry is at or past `startnode`'s position in the
/// chain. `read` is built in strictly increasing chain order, so this is a
/// membership/suffix check rather than a position comparison — see this
/// core's resolved open question on `NodeId` identity vs. lookup identity.
fn past_startnode(tree: &Tree, read: &[(NodeId, u32)], startnode: NodeId) -> bool {
    if read.iter().any(|&(id, _)| id == startnode) {
        return true;
    }
    // `startnode` itself may stream as zero-length (a pseudo-terminal) and
    // so never appear in `read`; fall back to a forward walk from the last
    // read node to see whether `startnode` was already skipped over.
    let Some(&(last, _)) = read.last() else { return false };
    let mut cur = Some(last);
    while let Some(id) = cur {
        if id == startnode {
            return false;
        }
        cur = tree.next_term(id);
        if cur == Some(startnode) {
            return false;
        }
    }
    true
}

fn collect_leftover(tree: &Tree, read: &[(NodeId, u32)], already_consumed: u32, leftover: u32) -> String {
    let full: String = read.iter().map(|&(id, _)| tree.rendered_text(id)).collect();
    let chars: Vec<char> = full.chars().collect();
    let start = already_consumed.min(chars.len() as u32) as usize;
    let end = (already_consumed + leftover).min(chars.len() as u32) as usize;
    chars[start..end].iter().collect()
}

/// Splits salvaged leftover text on `\r` so each residual fragment keeps
/// its own line boundary rather than merging two source lines into one
/// `<E>` token (section 4.2's "splitting a `\r` out of a leftover
/// fragment").
fn split_on_cr(text: &str) -> Vec<String> {
    if !text.contains('\r') {
        return vec![text.to_string()];
    }
    let mut out = Vec::new();
    let mut cur = String::new();
    for c in text.chars() {
        cur.push(c);
        if c == '\r' {
            out.push(std::mem::take(&mut cur));
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}
