use rustc_hash::FxHashMap;
use std::fmt;

/// An interned grammar symbol name (a token kind or a nonterminal name).
///
/// Grammars are data, not a fixed enum baked into the binary (unlike a
/// single hard-coded language's `TokenKind`), so symbol names are interned
/// strings rather than a closed set of variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interns symbol names for a single grammar's lifetime.
///
/// Built once when a grammar is loaded and shared (by reference) across the
/// lexer, tree, recognizer and detector that operate on that grammar's
/// symbols.
#[derive(Debug, Default)]
pub struct Interner {
    names: Vec<Box<str>>,
    lookup: FxHashMap<Box<str>, Symbol>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&sym) = self.lookup.get(name) {
            return sym;
        }
        let sym = Symbol(self.names.len() as u32);
        let boxed: Box<str> = name.into();
        self.names.push(boxed.clone());
        self.lookup.insert(boxed, sym);
        sym
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.names[sym.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_dedupes() {
        let mut interner = Interner::new();
        let a = interner.intern("INT");
        let b = interner.intern("INT");
        let c = interner.intern("ID");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "INT");
        assert_eq!(interner.resolve(c), "ID");
    }
}
