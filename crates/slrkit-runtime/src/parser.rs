//! Shift-reduce driver.

use crate::definition::{Location, ParseAction, ParseTable};
use std::fmt;

/// The default number of reductions allowed without shifting a token or
/// unwinding the stack below its previous low point.
pub const DEFAULT_REDUCE_LIMIT: usize = 100_000;

/// A trait for abstracting token symbols.
pub trait Token<TSym> {
    /// Return the terminal symbol corresponding to this token.
    fn as_symbol(&self) -> TSym;

    /// Return the position of this token in the source text.
    fn location(&self) -> Location;
}

/// The parser driven based on the constructed parse table.
///
/// A parser owns its stacks, so the same table can be shared by any number
/// of parsers running one after the other or concurrently.
pub struct Parser<TDef, TTok>
where
    TDef: ParseTable,
    TTok: Token<TDef::Terminal>,
{
    definition: TDef,
    state_stack: Vec<TDef::State>,
    item_stack: Vec<ParseItem<TTok, TDef::Nonterminal>>,
    status: Status,
    // `Some(None)` means the end of input has been reached.
    lookahead: Option<Option<TTok>>,
    last_location: Location,
    reduce_limit: usize,
    pending_reduces: usize,
    // The lowest stack depth seen since the last shift.
    low_water: usize,
}

impl<TDef, TTok> fmt::Debug for Parser<TDef, TTok>
where
    TDef: ParseTable + fmt::Debug,
    TDef::State: fmt::Debug,
    TDef::Nonterminal: fmt::Debug,
    TTok: Token<TDef::Terminal> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("definition", &self.definition)
            .field("state_stack", &self.state_stack)
            .field("item_stack", &self.item_stack)
            .field("status", &self.status)
            .field("lookahead", &self.lookahead)
            .finish_non_exhaustive()
    }
}

/// The phase of a parser run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Running,
    Accepted,
    /// An empty table cell was hit.
    RejectedSyntaxError,
    /// A conflicted cell was hit, or the table is internally inconsistent.
    RejectedTableError,
}

impl<TDef, TTok> Parser<TDef, TTok>
where
    TDef: ParseTable,
    TTok: Token<TDef::Terminal>,
{
    /// Create an instance of `Parser` using the specified parse table.
    pub fn new(definition: TDef) -> Self {
        let initial_state = definition.initial_state();
        Self {
            definition,
            state_stack: vec![initial_state],
            item_stack: vec![],
            status: Status::Running,
            lookahead: None,
            last_location: Location::default(),
            reduce_limit: DEFAULT_REDUCE_LIMIT,
            pending_reduces: 0,
            low_water: 1,
        }
    }

    /// Set the maximum number of consecutive reductions without a shift.
    ///
    /// A reduction that pops the stack below its lowest depth since the
    /// last shift restarts the count, so unwinding a long right-recursive
    /// list never exceeds the limit.
    pub fn reduce_limit(mut self, limit: usize) -> Self {
        self.reduce_limit = limit;
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Consume some tokens and drive the state machine
    /// until it matches a certain production rule.
    ///
    /// On `ParseEvent::Reduce`, `args` holds the popped stack items of the
    /// matched production in left-to-right order. On `ParseEvent::Accept`,
    /// `args` holds the single item derived from the start symbol.
    pub fn next_event<I, E>(
        &mut self,
        tokens: &mut I,
        args: &mut Vec<ParseItem<TTok, TDef::Nonterminal>>,
    ) -> Result<ParseEvent<TDef::Reduce>, ParseError<TDef::Terminal, E>>
    where
        I: Iterator<Item = Result<TTok, E>>,
        E: fmt::Display,
        TDef::Terminal: fmt::Debug,
    {
        match self.status {
            Status::Running => (),
            Status::Accepted => return Err(ParseError::AlreadyAccepted),
            Status::RejectedSyntaxError | Status::RejectedTableError => {
                return Err(ParseError::AlreadyRejected)
            }
        }

        loop {
            let current = match self.state_stack.last() {
                Some(current) => *current,
                None => return Err(self.reject_table(ParseError::EmptyStack)),
            };

            if self.lookahead.is_none() {
                let token = match tokens.next().transpose() {
                    Ok(token) => token,
                    Err(err) => {
                        self.status = Status::RejectedSyntaxError;
                        return Err(ParseError::Lexer(err));
                    }
                };
                if let Some(token) = &token {
                    self.last_location = token.location();
                }
                self.lookahead = Some(token);
            }

            let (lookahead, location) = match &self.lookahead {
                Some(Some(token)) => (Some(token.as_symbol()), token.location()),
                _ => (None, self.last_location),
            };

            match self.definition.action(current, lookahead) {
                ParseAction::Shift(next) => {
                    let token = match self.lookahead.take().flatten() {
                        Some(token) => token,
                        None => {
                            return Err(self.reject_table(ParseError::UnexpectedEOI { location }))
                        }
                    };
                    tracing::trace!(depth = self.state_stack.len(), %location, "shift");
                    self.item_stack.push(ParseItem::T(token));
                    self.state_stack.push(next);
                    self.pending_reduces = 0;
                    self.low_water = self.state_stack.len();
                }

                ParseAction::Reduce(reduce, lhs, n) => {
                    if n > self.item_stack.len() {
                        return Err(self.reject_table(ParseError::EmptyStack));
                    }
                    let depth = self.state_stack.len() - n;
                    if depth < self.low_water {
                        self.low_water = depth;
                        self.pending_reduces = 0;
                    } else {
                        self.pending_reduces += 1;
                        if self.pending_reduces > self.reduce_limit {
                            let limit = self.reduce_limit;
                            return Err(self
                                .reject_table(ParseError::ReduceLimitExceeded { limit, location }));
                        }
                    }

                    args.clear();
                    args.extend(self.item_stack.drain(self.item_stack.len() - n..));
                    self.state_stack.truncate(self.state_stack.len() - n);

                    let top = match self.state_stack.last() {
                        Some(top) => *top,
                        None => return Err(self.reject_table(ParseError::EmptyStack)),
                    };
                    let next = match self.definition.goto(top, lhs) {
                        Some(next) => next,
                        None => return Err(self.reject_table(ParseError::MissingGoto { location })),
                    };
                    tracing::trace!(depth = self.state_stack.len(), n, "reduce");
                    self.item_stack.push(ParseItem::N(lhs));
                    self.state_stack.push(next);

                    return Ok(ParseEvent::Reduce(reduce));
                }

                ParseAction::Accept => {
                    tracing::trace!("accept");
                    args.clear();
                    args.extend(self.item_stack.pop());
                    self.status = Status::Accepted;
                    return Ok(ParseEvent::Accept);
                }

                ParseAction::Fail => {
                    self.status = Status::RejectedSyntaxError;
                    return Err(ParseError::Syntax {
                        location,
                        found: lookahead,
                        expected: self.definition.expected_terminals(current),
                    });
                }

                ParseAction::Conflict => {
                    return Err(self.reject_table(ParseError::Conflict {
                        location,
                        found: lookahead,
                    }));
                }
            }
        }
    }

    /// Drive the parser until the input is accepted or rejected, discarding
    /// all reduction events.
    pub fn recognize<I, E>(&mut self, tokens: I) -> Result<(), ParseError<TDef::Terminal, E>>
    where
        I: IntoIterator<Item = Result<TTok, E>>,
        E: fmt::Display,
        TDef::Terminal: fmt::Debug,
    {
        let mut tokens = tokens.into_iter();
        let mut args = vec![];
        loop {
            match self.next_event(&mut tokens, &mut args)? {
                ParseEvent::Reduce(..) => continue,
                ParseEvent::Accept => return Ok(()),
            }
        }
    }

    fn reject_table<TTerm: fmt::Debug, E: fmt::Display>(
        &mut self,
        err: ParseError<TTerm, E>,
    ) -> ParseError<TTerm, E> {
        self.status = Status::RejectedTableError;
        err
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum ParseItem<TTok, TSym> {
    T(TTok),
    N(TSym),
}

#[derive(Debug)]
pub enum ParseEvent<TReduce> {
    Reduce(TReduce),
    Accept,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError<TTerm: fmt::Debug, L: fmt::Display> {
    #[error("from lexer: {}", _0)]
    Lexer(L),

    #[error("syntax error at {}: unexpected {:?}", location, found)]
    Syntax {
        location: Location,
        found: Option<TTerm>,
        expected: Vec<Option<TTerm>>,
    },

    #[error("conflicting actions on {:?} at {}", found, location)]
    Conflict {
        location: Location,
        found: Option<TTerm>,
    },

    #[error("missing goto entry after reduction at {}", location)]
    MissingGoto { location: Location },

    #[error("exceeded the limit of {} consecutive reductions at {}", limit, location)]
    ReduceLimitExceeded { limit: usize, location: Location },

    #[error("unexpected EOI at {}", location)]
    UnexpectedEOI { location: Location },

    #[error("empty stack")]
    EmptyStack,

    #[error("already accepted")]
    AlreadyAccepted,

    #[error("already rejected")]
    AlreadyRejected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    // S -> a S | b
    #[derive(Debug)]
    struct TestTable {
        conflict_on_b: bool,
    }

    impl ParseTable for TestTable {
        type State = u8;
        type Terminal = char;
        type Nonterminal = char;
        type Reduce = u8;

        fn initial_state(&self) -> u8 {
            0
        }

        fn action(&self, current: u8, lookahead: Option<char>) -> ParseAction<u8, char, u8> {
            match (current, lookahead) {
                (0 | 2, Some('b')) if self.conflict_on_b => ParseAction::Conflict,
                (0 | 2, Some('a')) => ParseAction::Shift(2),
                (0 | 2, Some('b')) => ParseAction::Shift(3),
                (1, None) => ParseAction::Accept,
                (3, None) => ParseAction::Reduce(2, 'S', 1),
                (4, None) => ParseAction::Reduce(1, 'S', 2),
                _ => ParseAction::Fail,
            }
        }

        fn goto(&self, current: u8, symbol: char) -> Option<u8> {
            match (current, symbol) {
                (0, 'S') => Some(1),
                (2, 'S') => Some(4),
                _ => None,
            }
        }

        fn expected_terminals(&self, current: u8) -> Vec<Option<char>> {
            match current {
                0 | 2 => vec![Some('a'), Some('b')],
                _ => vec![None],
            }
        }
    }

    #[derive(Debug, Clone, Copy)]
    struct Tok(char, usize);

    impl Token<char> for Tok {
        fn as_symbol(&self) -> char {
            self.0
        }
        fn location(&self) -> Location {
            Location::new(1, self.1)
        }
    }

    fn tokens(s: &str) -> Vec<Result<Tok, Infallible>> {
        s.chars()
            .enumerate()
            .map(|(i, c)| Ok(Tok(c, i + 1)))
            .collect()
    }

    #[test]
    fn accepts_and_reports_reductions() {
        let table = TestTable {
            conflict_on_b: false,
        };
        let mut parser = Parser::new(&table);
        let mut tokens = tokens("aab").into_iter();
        let mut args = vec![];
        let mut reduces = vec![];
        loop {
            match parser.next_event(&mut tokens, &mut args).unwrap() {
                ParseEvent::Reduce(r) => {
                    reduces.push((r, args.len()));
                }
                ParseEvent::Accept => break,
            }
        }
        assert_eq!(reduces, [(2, 1), (1, 2), (1, 2)]);
        assert_eq!(parser.status(), Status::Accepted);
        assert!(matches!(args[..], [ParseItem::N('S')]));
    }

    #[test]
    fn rejects_at_end_of_input() {
        let table = TestTable {
            conflict_on_b: false,
        };
        let mut parser = Parser::new(&table);
        let err = parser.recognize(tokens("aa")).unwrap_err();
        match err {
            ParseError::Syntax {
                location,
                found,
                expected,
            } => {
                assert_eq!(location, Location::new(1, 2));
                assert_eq!(found, None);
                assert_eq!(expected, [Some('a'), Some('b')]);
            }
            err => panic!("unexpected error: {}", err),
        }
        assert_eq!(parser.status(), Status::RejectedSyntaxError);
        assert!(matches!(
            parser.recognize(tokens("b")),
            Err(ParseError::AlreadyRejected)
        ));
    }

    #[test]
    fn rejects_unexpected_token() {
        let table = TestTable {
            conflict_on_b: false,
        };
        let mut parser = Parser::new(&table);
        let err = parser.recognize(tokens("aba")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Syntax {
                location: Location { line: 1, column: 3 },
                found: Some('a'),
                ..
            }
        ));
    }

    #[test]
    fn rejects_conflicted_cell() {
        let table = TestTable {
            conflict_on_b: true,
        };
        let mut parser = Parser::new(&table);
        let err = parser.recognize(tokens("ab")).unwrap_err();
        assert!(matches!(err, ParseError::Conflict { found: Some('b'), .. }));
        assert_eq!(parser.status(), Status::RejectedTableError);
    }

    #[test]
    fn empty_input_is_located_at_origin() {
        let table = TestTable {
            conflict_on_b: false,
        };
        let mut parser = Parser::new(&table);
        let err = parser.recognize(tokens("")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Syntax {
                location: Location { line: 1, column: 1 },
                found: None,
                ..
            }
        ));
    }

    #[test]
    fn reruns_are_independent() {
        let table = TestTable {
            conflict_on_b: false,
        };
        for _ in 0..2 {
            let mut parser = Parser::new(&table);
            parser.recognize(tokens("ab")).unwrap();
            assert_eq!(parser.status(), Status::Accepted);
        }
    }

    #[test]
    fn unwinding_is_not_limited() {
        let table = TestTable {
            conflict_on_b: false,
        };
        let input = format!("{}b", "a".repeat(10));
        let mut parser = Parser::new(&table).reduce_limit(2);
        parser.recognize(tokens(&input)).unwrap();
        assert_eq!(parser.status(), Status::Accepted);
    }

    #[test]
    fn lexer_errors_are_propagated() {
        let table = TestTable {
            conflict_on_b: false,
        };
        let mut parser: Parser<_, Tok> = Parser::new(&table);
        let err = parser
            .recognize(vec![Ok(Tok('a', 1)), Err("bad token")])
            .unwrap_err();
        assert!(matches!(err, ParseError::Lexer("bad token")));
    }
}
