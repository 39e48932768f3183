//! Parse table definition.

use std::fmt;

/// The trait for abstracting a constructed SLR(1) parse table.
pub trait ParseTable {
    /// The number to identify the state of LR automaton.
    type State: Copy;

    /// The number to identify the terminal symbols.
    type Terminal: Copy;

    /// The number to identify the nonterminal symbols.
    type Nonterminal: Copy;

    /// The context value corresponding to the matched production rule.
    type Reduce: Copy;

    /// Return the initial state number.
    fn initial_state(&self) -> Self::State;

    /// Return the action corresponding to the specified state number and
    /// lookahead symbol.
    ///
    /// If there is no lookahead symbol, a `None` is passsed as the end of input.
    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Terminal>,
    ) -> ParseAction<Self::State, Self::Nonterminal, Self::Reduce>;

    /// Return the goto entry for the specified state and nonterminal symbol.
    fn goto(&self, current: Self::State, symbol: Self::Nonterminal) -> Option<Self::State>;

    /// Return the terminal symbols that have a non-empty action in the specified state.
    ///
    /// The end of input is represented as `None`.
    fn expected_terminals(&self, current: Self::State) -> Vec<Option<Self::Terminal>>;
}

impl<T: ?Sized> ParseTable for &T
where
    T: ParseTable,
{
    type State = T::State;
    type Terminal = T::Terminal;
    type Nonterminal = T::Nonterminal;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Terminal>,
    ) -> ParseAction<Self::State, Self::Nonterminal, Self::Reduce> {
        (**self).action(current, lookahead)
    }

    fn goto(&self, current: Self::State, symbol: Self::Nonterminal) -> Option<Self::State> {
        (**self).goto(current, symbol)
    }

    fn expected_terminals(&self, current: Self::State) -> Vec<Option<Self::Terminal>> {
        (**self).expected_terminals(current)
    }
}

impl<T: ?Sized> ParseTable for std::sync::Arc<T>
where
    T: ParseTable,
{
    type State = T::State;
    type Terminal = T::Terminal;
    type Nonterminal = T::Nonterminal;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Terminal>,
    ) -> ParseAction<Self::State, Self::Nonterminal, Self::Reduce> {
        (**self).action(current, lookahead)
    }

    fn goto(&self, current: Self::State, symbol: Self::Nonterminal) -> Option<Self::State> {
        (**self).goto(current, symbol)
    }

    fn expected_terminals(&self, current: Self::State) -> Vec<Option<Self::Terminal>> {
        (**self).expected_terminals(current)
    }
}

/// The content of a single ACTION cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseAction<TState, TNonterminal, TReduce> {
    /// Push the lookahead symbol and transition to the specified state.
    Shift(TState),

    /// Pop `n` items and push the left-hand side of the matched rule.
    Reduce(TReduce, TNonterminal, usize),

    Accept,

    /// The cell is empty.
    Fail,

    /// The cell holds more than one action.
    Conflict,
}

/// Position of a token in the source text, 1-based.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
