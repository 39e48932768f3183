//! Tokens handed over from a lexer.

use crate::grammar::{Grammar, TerminalID, END_MARKER};
use slrkit_runtime::Location;

/// A token produced by an external lexer.
///
/// `kind` is matched against the terminal names of the grammar. A token
/// whose kind is the end marker `$` terminates the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: String,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(
        kind: impl Into<String>,
        lexeme: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            kind: kind.into(),
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }
}

/// A token resolved to a terminal symbol of a particular grammar.
#[derive(Debug, Clone)]
pub struct Lexeme {
    pub terminal: TerminalID,
    pub token: Token,
}

impl slrkit_runtime::Token<TerminalID> for Lexeme {
    fn as_symbol(&self) -> TerminalID {
        self.terminal
    }

    fn location(&self) -> Location {
        self.token.location()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown token kind `{}' at {}", kind, location)]
pub struct UnknownToken {
    pub kind: String,
    pub location: Location,
}

/// Resolve the kinds of the tokens against the terminals of `grammar`.
///
/// The stream ends at the first `$` token, if any, which is resolved to
/// `TerminalID::EOI`.
pub fn classify<I>(grammar: &Grammar, tokens: I) -> Lexemes<'_, I::IntoIter>
where
    I: IntoIterator<Item = Token>,
{
    Lexemes {
        grammar,
        tokens: tokens.into_iter(),
        done: false,
    }
}

#[derive(Debug)]
pub struct Lexemes<'g, I> {
    grammar: &'g Grammar,
    tokens: I,
    done: bool,
}

impl<I> Iterator for Lexemes<'_, I>
where
    I: Iterator<Item = Token>,
{
    type Item = Result<Lexeme, UnknownToken>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(token) = self.tokens.next() else {
            self.done = true;
            return None;
        };
        if token.kind == END_MARKER {
            // Stands for the end of input, at the position of this token.
            self.done = true;
            return Some(Ok(Lexeme {
                terminal: TerminalID::EOI,
                token,
            }));
        }
        match self.grammar.terminal(&token.kind) {
            Some(terminal) => Some(Ok(Lexeme { terminal, token })),
            None => Some(Err(UnknownToken {
                location: token.location(),
                kind: token.kind,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_tokens() {
        let g = Grammar::from_rules(["E -> E + id | id"]).unwrap();
        let tokens = vec![
            Token::new("id", "a", 1, 1),
            Token::new("+", "+", 1, 3),
            Token::new("E", "E", 1, 5),
        ];
        let mut lexemes = classify(&g, tokens);

        let a = lexemes.next().unwrap().unwrap();
        assert_eq!(a.terminal, g.terminal("id").unwrap());
        assert_eq!(a.token.lexeme, "a");
        assert!(lexemes.next().unwrap().is_ok());

        // Nonterminal names are not token kinds.
        let err = lexemes.next().unwrap().unwrap_err();
        assert_eq!(err.kind, "E");
        assert_eq!(err.location, Location::new(1, 5));
        assert!(lexemes.next().is_none());
    }

    #[test]
    fn end_marker_terminates_stream() {
        let g = Grammar::from_rules(["S -> x"]).unwrap();
        let tokens = vec![
            Token::new("x", "x", 1, 1),
            Token::new("$", "", 1, 2),
            Token::new("x", "x", 1, 3),
        ];
        let lexemes: Vec<_> = classify(&g, tokens).map(Result::unwrap).collect();
        assert_eq!(lexemes.len(), 2);
        assert_eq!(lexemes[1].terminal, TerminalID::EOI);
        assert_eq!(lexemes[1].token.column, 2);
    }
}
