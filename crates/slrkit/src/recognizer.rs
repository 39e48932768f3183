//! The entry point tying the construction stages and the driver together.

use crate::{
    error::Error,
    first_follow::{FirstSets, FollowSets},
    grammar::{Grammar, TerminalID},
    lr0::{self, LR0Automaton},
    table::{self, Conflict, ParseTable, ParseTableDef},
    token::{self, Lexeme, Token, UnknownToken},
    util::join,
};
use slrkit_runtime::{parser::DEFAULT_REDUCE_LIMIT, Location, ParseError, Parser};

/// The default upper bound on the number of LR(0) states.
pub const DEFAULT_MAX_STATES: usize = 10_000;

/// Bounds applied while building the tables and while parsing.
#[derive(Debug, Clone)]
pub struct Config {
    max_states: usize,
    reduce_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_states: DEFAULT_MAX_STATES,
            reduce_limit: DEFAULT_REDUCE_LIMIT,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upper bound on the number of LR(0) states.
    pub fn max_states(mut self, max_states: usize) -> Self {
        self.max_states = max_states;
        self
    }

    /// Set the upper bound on the number of reductions between two shifts
    /// that do not unwind the stack any further.
    pub fn reduce_limit(mut self, reduce_limit: usize) -> Self {
        self.reduce_limit = reduce_limit;
        self
    }
}

/// An SLR(1) recognizer built from a grammar.
///
/// The construction never fails because of conflicts: they are collected
/// in the table and reported by `check` or by the first `recognize` call.
/// The built tables are read-only, so one recognizer can serve any number
/// of parses.
#[derive(Debug)]
pub struct Recognizer {
    grammar: Grammar,
    automaton: LR0Automaton,
    first_sets: FirstSets,
    follow_sets: FollowSets,
    table: ParseTable,
    config: Config,
}

impl Recognizer {
    pub fn new(grammar: Grammar) -> Result<Self, Error> {
        Self::with_config(grammar, Config::default())
    }

    /// Build a recognizer from rule texts such as `"E -> E + T | T"`.
    pub fn from_rules<I>(rules: I) -> Result<Self, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self::new(Grammar::from_rules(rules)?)
    }

    pub fn with_config(grammar: Grammar, config: Config) -> Result<Self, Error> {
        let span = tracing::trace_span!("recognizer");
        let _entered = span.enter();

        let automaton = lr0::lr0(&grammar, config.max_states)?;
        let first_sets = FirstSets::new(&grammar);
        let follow_sets = FollowSets::new(&grammar, &first_sets);
        let table = table::generate(&grammar, &automaton, &follow_sets);
        for conflict in &table.conflicts {
            tracing::warn!("{}", conflict.display(&grammar));
        }

        Ok(Self {
            grammar,
            automaton,
            first_sets,
            follow_sets,
            table,
            config,
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn automaton(&self) -> &LR0Automaton {
        &self.automaton
    }

    pub fn first_sets(&self) -> &FirstSets {
        &self.first_sets
    }

    pub fn follow_sets(&self) -> &FollowSets {
        &self.follow_sets
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.table.conflicts
    }

    /// Fail with `ErrorKind::TableConflict` if the table has a conflicting cell.
    pub fn check(&self) -> Result<(), Error> {
        if self.table.is_conflict_free() {
            Ok(())
        } else {
            Err(Error::TableConflict {
                conflicts: self.table.conflicts.clone(),
            })
        }
    }

    /// Create a fresh driver over the table.
    ///
    /// Use this instead of `recognize` to observe the reductions through
    /// `Parser::next_event`.
    pub fn parser(&self) -> Parser<ParseTableDef<'_>, Lexeme> {
        Parser::new(ParseTableDef::new(&self.grammar, &self.table))
            .reduce_limit(self.config.reduce_limit)
    }

    /// Resolve the token kinds against this grammar.
    pub fn lexemes<I>(&self, tokens: I) -> token::Lexemes<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Token>,
    {
        token::classify(&self.grammar, tokens)
    }

    /// Decide whether the token sequence is a sentence of the grammar.
    ///
    /// The end of input is implied after the last token.
    pub fn recognize<I>(&self, tokens: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Token>,
    {
        self.check()?;

        let span = tracing::trace_span!("recognize");
        let _entered = span.enter();

        let mut parser = self.parser();
        parser
            .recognize(self.lexemes(tokens))
            .map_err(|err| self.convert_error(err))
    }

    /// Translate a driver error into one that speaks in terms of the grammar.
    pub fn convert_error(&self, err: ParseError<TerminalID, UnknownToken>) -> Error {
        let name = |t: Option<TerminalID>| match t {
            Some(t) if t != TerminalID::EOI => format!("`{}'", self.grammar.terminals[&t]),
            _ => "end of input".to_owned(),
        };
        match err {
            ParseError::Lexer(err) => Error::Syntax {
                message: format!("unknown token kind `{}'", err.kind),
                location: err.location,
            },
            ParseError::Syntax {
                location,
                found,
                expected,
            } => {
                let expected: Vec<String> = expected.into_iter().map(name).collect();
                let message = if expected.is_empty() {
                    format!("unexpected {}", name(found))
                } else {
                    format!(
                        "unexpected {}, expected one of {}",
                        name(found),
                        join(expected, ", ")
                    )
                };
                Error::Syntax { message, location }
            }
            ParseError::UnexpectedEOI { location } => Error::Syntax {
                message: "unexpected end of input".to_owned(),
                location,
            },
            ParseError::Conflict { location, found } => Error::InconsistentTable {
                message: format!("conflicting actions on {}", name(found)),
                location,
            },
            ParseError::MissingGoto { location } => Error::InconsistentTable {
                message: "missing goto entry after reduction".to_owned(),
                location,
            },
            ParseError::ReduceLimitExceeded { limit, location } => Error::ReduceLimit {
                message: format!(
                    "exceeded the limit of {} consecutive reductions at {}",
                    limit, location
                ),
                location,
            },
            err => Error::InconsistentTable {
                message: err.to_string(),
                location: Location::default(),
            },
        }
    }
}
