use crate::descriptor::LanguageDescriptor;
use eco_common::Symbol;
use rustc_hash::FxHashMap;

/// The global `lang_name -> LanguageDescriptor` mapping from section 6,
/// built once at startup and threaded through the session thereafter —
/// per the design notes, an explicit configuration value rather than a
/// `static`/`lazy_static` global.
pub struct LanguageRegistry {
    langs: FxHashMap<Symbol, LanguageDescriptor>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self { langs: FxHashMap::default() }
    }

    pub fn register(&mut self, descriptor: LanguageDescriptor) {
        self.langs.insert(descriptor.name, descriptor);
    }

    pub fn get(&self, name: Symbol) -> Option<&LanguageDescriptor> {
        self.langs.get(&name)
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.langs.contains_key(&name)
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::LanguageDescriptor;
    use eco_common::Interner;
    use eco_lexer::{parse_grammar, Lexer};
    use eco_recognizer::{Action, LookupSymbol, SyntaxTable, Whitespace};

    struct AcceptNothing;
    impl SyntaxTable for AcceptNothing {
        fn lookup(&self, _state: u32, _symbol: LookupSymbol) -> Option<Action> {
            None
        }
    }

    #[test]
    fn register_and_get_round_trips() {
        let mut interner = Interner::new();
        let name = interner.intern("host");
        let magic = interner.intern("<host>");
        let ws_kind = interner.intern("<ws>");
        let ret_kind = interner.intern("<return>");
        let grammar = parse_grammar("A = a\n", &mut interner).unwrap();
        let lexer = Lexer::compile(&grammar).unwrap();
        let whitespace = Whitespace { ws: ws_kind, line_break: ret_kind, line_comment: None, block_comment: None };

        let mut registry = LanguageRegistry::new();
        registry.register(LanguageDescriptor::allows_everything(name, Box::new(AcceptNothing), lexer, whitespace, magic));

        assert!(registry.contains(name));
        assert!(registry.get(name).is_some());
        let other = interner.intern("other");
        assert!(registry.get(other).is_none());
    }
}
