use eco_common::Symbol;

/// What a recognizer looks a table action up by: a shifted terminal, a
/// just-reduced nonterminal consulted for its `Goto`, or the synthetic
/// end-of-input marker `is_finished` probes to see whether the automaton
/// could reach `Accept` if the stream ended right here.
///
/// Grammar compilation to concrete LR tables is out of scope (section 1);
/// this is the abstract surface section 6 names, with `FinishSymbol`
/// folded in as its own variant rather than a magic `Symbol` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupSymbol {
    Terminal(Symbol),
    Nonterminal(Symbol),
    Finish,
}

/// A production's right-hand-side length (`amount()`) and left-hand-side
/// symbol (`action.left`), the two facts a `Reduce` needs to pop the stack
/// and look up the resulting `Goto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Production {
    pub amount: u32,
    pub left: Symbol,
}

impl Production {
    pub fn new(amount: u32, left: Symbol) -> Self {
        Self { amount, left }
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(u32),
    Reduce(Production),
    Goto(u32),
    Accept,
}

/// The abstract `syntaxtable.lookup(state, symbol) -> {Shift, Reduce,
/// Goto, Accept, null}` surface from section 6. `None` is the table's
/// "null" — an invalid action, not an error the recognizer needs to
/// propagate (section 4.8: "a `null` return from `parse` is a normal 'not
/// accepted', not an exception").
pub trait SyntaxTable {
    fn lookup(&self, state: u32, symbol: LookupSymbol) -> Option<Action>;
}

/// Runs `Reduce`s against `states` until a `Shift`/`Accept`/null action
/// shows up for `symbol`, mirroring every recognizer variant's inner
/// reduce-loop (section 4.4/4.5). Returns that terminal action, leaving
/// `states` with any `Goto`s already pushed.
pub(crate) fn drive_reductions(table: &dyn SyntaxTable, states: &mut Vec<u32>, symbol: LookupSymbol) -> Option<Action> {
    loop {
        let top = *states.last().expect("state stack is never empty");
        match table.lookup(top, symbol) {
            Some(Action::Reduce(prod)) => {
                for _ in 0..prod.amount() {
                    states.pop();
                }
                let goto_state = *states.last().expect("state stack is never empty");
                match table.lookup(goto_state, LookupSymbol::Nonterminal(prod.left)) {
                    Some(Action::Goto(g)) => states.push(g),
                    // A malformed table with no goto for a just-reduced LHS
                    // is a caller bug, not ours to recover from; surface it
                    // as "not accepted" per section 4.8 rather than panic.
                    _ => return None,
                }
            }
            other => return other,
        }
    }
}
