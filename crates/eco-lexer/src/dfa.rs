use crate::nfa::{Nfa, Trans};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct DfaState {
    /// Sorted, non-overlapping outgoing ranges; scanned linearly since rule
    /// sets stay small (grammar files, not general text).
    pub out: Vec<(char, char, usize)>,
    /// The lowest rule-priority index accepted in this state, if any.
    pub accept: Option<usize>,
}

/// A DFA built by subset-constructing over an [`Nfa`] that already
/// alternates every rule; each DFA state's `accept` is the
/// highest-priority (lowest index) rule reachable there, giving the
/// priority tie-break section 4.1 specifies for same-length matches.
#[derive(Debug, Clone)]
pub struct Dfa {
    pub states: Vec<DfaState>,
    pub start: usize,
}

type NfaSet = BTreeSet<usize>;

fn epsilon_closure(nfa: &Nfa, seeds: &[usize]) -> NfaSet {
    let mut set: NfaSet = seeds.iter().copied().collect();
    let mut stack: Vec<usize> = seeds.to_vec();
    while let Some(s) = stack.pop() {
        for t in &nfa.states[s].out {
            if let Trans::Epsilon(target) = t {
                if set.insert(*target) {
                    stack.push(*target);
                }
            }
        }
    }
    set
}

fn accept_priority(nfa: &Nfa, set: &NfaSet) -> Option<usize> {
    set.iter().filter_map(|&s| nfa.states[s].accept).min()
}

/// Boundary points where any range in the NFA starts or ends just past;
/// splitting transitions on these gives disjoint move-alphabet slices.
fn boundaries(nfa: &Nfa) -> Vec<char> {
    let mut points = std::collections::BTreeSet::new();
    for state in &nfa.states {
        for t in &state.out {
            if let Trans::Range(lo, hi, _) = t {
                points.insert(*lo);
                if let Some(next) = char::from_u32(*hi as u32 + 1) {
                    points.insert(next);
                }
            }
        }
    }
    points.into_iter().collect()
}

fn r#move(nfa: &Nfa, set: &NfaSet, c: char) -> Vec<usize> {
    let mut out = Vec::new();
    for &s in set {
        for t in &nfa.states[s].out {
            if let Trans::Range(lo, hi, target) = t {
                if *lo <= c && c <= *hi {
                    out.push(*target);
                }
            }
        }
    }
    out
}

/// Subset-constructs a DFA from `nfa`, slicing the character alphabet at
/// every rule's range boundary so each DFA transition can be represented
/// as one contiguous `(lo, hi)` range.
pub fn build(nfa: &Nfa) -> Dfa {
    let bounds = boundaries(nfa);
    let start_set = epsilon_closure(nfa, &[nfa.start]);

    let mut states: Vec<DfaState> = Vec::new();
    let mut index: FxHashMap<NfaSet, usize> = FxHashMap::default();
    let mut queue = vec![start_set.clone()];
    index.insert(start_set, 0);
    states.push(DfaState::default());

    while let Some(set) = queue.pop() {
        let from = index[&set];
        let mut i = 0;
        while i < bounds.len() {
            let lo = bounds[i];
            let hi = bounds
                .get(i + 1)
                .and_then(|&next| char::from_u32(next as u32 - 1))
                .unwrap_or(crate::nfa::ANY_CHAR);
            i += 1;
            let probe = lo;
            let targets = r#move(nfa, &set, probe);
            if targets.is_empty() {
                continue;
            }
            let closure = epsilon_closure(nfa, &targets);
            let to = *index.entry(closure.clone()).or_insert_with(|| {
                states.push(DfaState::default());
                queue.push(closure.clone());
                states.len() - 1
            });
            states[from].out.push((lo, hi, to));
        }
        states[from].accept = accept_priority(nfa, &set);
    }

    for state in &mut states {
        state.out.sort_by_key(|&(lo, _, _)| lo);
    }

    Dfa { states, start: 0 }
}

impl Dfa {
    pub fn step(&self, state: usize, c: char) -> Option<usize> {
        self.states[state]
            .out
            .iter()
            .find(|&&(lo, hi, _)| lo <= c && c <= hi)
            .map(|&(_, _, to)| to)
    }

    pub fn accept(&self, state: usize) -> Option<usize> {
        self.states[state].accept
    }
}
