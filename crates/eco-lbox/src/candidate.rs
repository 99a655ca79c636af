use eco_common::Symbol;
use eco_tree::NodeId;

/// One proposed `(start, end, language)` language box (section 4.6): the
/// detector has established that shifting the magic terminal `marker`
/// right before `start` and parsing `language`'s grammar through `end`
/// keeps the surrounding parse alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub start: NodeId,
    pub end: NodeId,
    pub language: Symbol,
    /// Characters the embedded recognizer parsed before reaching `end`
    /// (one of its `possible_ends`' `distance` field).
    pub parse_distance: u32,
    pub split: Option<u32>,
    pub marker: Symbol,
    pub errornode: NodeId,
}

impl Candidate {
    /// `reach(candidate) = start.position + parse_distance`, the ranking
    /// key section 4.6 sorts candidates by (decreasing). Positions are
    /// approximated here by `parse_distance` alone plus a caller-supplied
    /// `start_position`, since this crate does not track absolute
    /// document offsets on `NodeId`s directly.
    pub fn reach(&self, start_position: u32) -> u32 {
        start_position + self.parse_distance
    }
}

/// What [`crate::Detector::detect_lbox`] reports for one error node.
/// Matches section 4.6's three outcomes: a user-reverted node short-
/// circuits to `Rejected` (`UserRevert` from section 7); otherwise the
/// (possibly empty) filtered candidate list is returned, an empty list
/// being the ordinary `DetectorEmpty` outcome rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectOutcome {
    Rejected,
    Candidates(Vec<Candidate>),
}

impl DetectOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, DetectOutcome::Rejected)
    }

    pub fn candidates(&self) -> &[Candidate] {
        match self {
            DetectOutcome::Candidates(v) => v,
            DetectOutcome::Rejected => &[],
        }
    }
}
