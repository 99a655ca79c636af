use crate::regex::{self, RegexError};
use eco_common::{Interner, Symbol};
use std::fmt;

/// Parsed `%key=value,...` options from a grammar file's optional first
/// line. Section 6 names exactly one recognized key, `indentation`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarOptions {
    pub indentation: bool,
}

/// One priority-ordered lexer rule: `KIND = pattern`. The rule's position
/// in [`GrammarFile::rules`] *is* its priority (index 0 = highest).
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: Symbol,
    pub pattern: String,
}

#[derive(Debug, Clone)]
pub struct GrammarFile {
    pub options: GrammarOptions,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GrammarError {
    BadOptionLine { line: usize, detail: String },
    BadRuleLine { line: usize, detail: String },
    Regex { line: usize, source: RegexError },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::BadOptionLine { line, detail } => write!(f, "line {}: bad option header: {}", line, detail),
            GrammarError::BadRuleLine { line, detail } => write!(f, "line {}: bad rule: {}", line, detail),
            GrammarError::Regex { line, source } => write!(f, "line {}: {}", line, source),
        }
    }
}

impl std::error::Error for GrammarError {}

/// Parses a grammar file: an optional `%key=value,key2=value2` header line
/// followed by priority-ordered `KIND = pattern` rule lines. Blank lines
/// and lines starting with `#` are ignored.
pub fn parse(text: &str, interner: &mut Interner) -> Result<GrammarFile, GrammarError> {
    let mut options = GrammarOptions::default();
    let mut rules = Vec::new();

    let mut lines = text.lines().enumerate().peekable();
    if let Some(&(no, first)) = lines.peek() {
        if let Some(rest) = first.strip_prefix('%') {
            lines.next();
            options = parse_options(rest, no + 1)?;
        }
    }

    for (no, raw) in lines {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (kind_name, pattern) = line.split_once('=').ok_or_else(|| GrammarError::BadRuleLine {
            line: no + 1,
            detail: "expected `KIND = pattern`".into(),
        })?;
        let kind_name = kind_name.trim();
        let pattern = pattern.trim();
        if kind_name.is_empty() || pattern.is_empty() {
            return Err(GrammarError::BadRuleLine { line: no + 1, detail: "empty kind or pattern".into() });
        }
        regex::parse(pattern).map_err(|source| GrammarError::Regex { line: no + 1, source })?;
        rules.push(Rule { kind: interner.intern(kind_name), pattern: pattern.to_string() });
    }

    Ok(GrammarFile { options, rules })
}

fn parse_options(rest: &str, line: usize) -> Result<GrammarOptions, GrammarError> {
    let rest = rest.trim();
    let rest = rest.strip_prefix('<').unwrap_or(rest);
    let rest = rest.strip_suffix('>').unwrap_or(rest);
    let mut options = GrammarOptions::default();
    for pair in rest.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| GrammarError::BadOptionLine { line, detail: format!("expected key=value in `{}`", pair) })?;
        match key.trim() {
            "indentation" => options.indentation = value.trim() == "true",
            other => return Err(GrammarError::BadOptionLine { line, detail: format!("unknown option `{}`", other) }),
        }
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_rules() {
        let mut interner = Interner::new();
        let text = "%<indentation=true>\nINT = [0-9]+\nID = [a-z]+\n";
        let grammar = parse(text, &mut interner).unwrap();
        assert!(grammar.options.indentation);
        assert_eq!(grammar.rules.len(), 2);
        assert_eq!(interner.resolve(grammar.rules[0].kind), "INT");
    }

    #[test]
    fn header_is_optional() {
        let mut interner = Interner::new();
        let text = "INT = [0-9]+\n";
        let grammar = parse(text, &mut interner).unwrap();
        assert!(!grammar.options.indentation);
        assert_eq!(grammar.rules.len(), 1);
    }

    #[test]
    fn comments_and_blank_lines_skipped() {
        let mut interner = Interner::new();
        let text = "# a comment\n\nINT = [0-9]+\n";
        let grammar = parse(text, &mut interner).unwrap();
        assert_eq!(grammar.rules.len(), 1);
    }

    #[test]
    fn rejects_unknown_option() {
        let mut interner = Interner::new();
        let text = "%<bogus=true>\nINT = [0-9]+\n";
        assert!(parse(text, &mut interner).is_err());
    }
}
