//! Calculation of SLR(1) parse table.

use crate::{
    first_follow::FollowSets,
    grammar::{Grammar, NonterminalID, RuleID, SymbolID, TerminalID},
    lr0::{LR0Automaton, StateID},
    types::Map,
    util::display_fn,
};
use slrkit_runtime::definition::ParseAction;
use std::fmt;

#[derive(Debug)]
pub struct ParseTable {
    pub states: Map<StateID, ParseTableRow>,
    /// Every cell that received more than one action, in state order.
    pub conflicts: Vec<Conflict>,
}

impl ParseTable {
    pub fn action(&self, state: StateID, lookahead: TerminalID) -> Option<&Action> {
        self.states.get(&state)?.actions.get(&lookahead)
    }

    pub fn goto(&self, state: StateID, symbol: NonterminalID) -> Option<StateID> {
        self.states.get(&state)?.gotos.get(&symbol).copied()
    }

    /// Return the terminals that have an action in the specified state, in ID order.
    pub fn expected(&self, state: StateID) -> Vec<TerminalID> {
        let mut expected: Vec<TerminalID> = self
            .states
            .get(&state)
            .map(|row| row.actions.keys().copied().collect())
            .unwrap_or_default();
        expected.sort_unstable();
        expected
    }

    pub fn is_conflict_free(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, row)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }

                writeln!(f, "#### State {}", id)?;
                writeln!(f, "## actions")?;
                for (token, action) in &row.actions {
                    let token = &g.terminals[token];
                    match action {
                        Action::Shift(n) => {
                            writeln!(f, "- {} => shift({})", token, n)?;
                        }
                        Action::Reduce(reduce) => {
                            writeln!(f, "- {} => reduce({})", token, g.rule(*reduce).display(g))?;
                        }
                        Action::Accept => {
                            writeln!(f, "- {} => accept", token)?;
                        }
                        Action::Inconsistent {
                            shift,
                            reduces,
                            accept,
                        } => {
                            writeln!(f, "- {} => inconsistent", token)?;
                            if let Some(n) = shift {
                                writeln!(f, "  - shift({})", n)?;
                            }
                            for reduce in reduces {
                                writeln!(f, "  - reduce({})", g.rule(*reduce).display(g))?;
                            }
                            if *accept {
                                writeln!(f, "  - accept")?;
                            }
                        }
                    }
                }

                if !row.gotos.is_empty() {
                    writeln!(f, "## gotos")?;
                    for (symbol, goto) in &row.gotos {
                        writeln!(f, "- {} => goto({})", g.nonterminals[symbol], goto)?;
                    }
                }
            }
            Ok(())
        })
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub struct ParseTableRow {
    pub actions: Map<TerminalID, Action>,
    pub gotos: Map<NonterminalID, StateID>,
}

/// The action that the LR automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Action {
    /// Read a lookahead symbol and transition to the specified state.
    Shift(StateID),

    /// Reduce to the specified production rule.
    Reduce(RuleID),

    Accept,

    /// There are multiple conflicting actions for the lookahead symbol.
    /// They are kept as they are and never resolved.
    Inconsistent {
        shift: Option<StateID>,
        reduces: Vec<RuleID>,
        accept: bool,
    },
}

impl Action {
    pub fn is_consistent(&self) -> bool {
        !matches!(self, Self::Inconsistent { .. })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
    /// The accept action competes with a reduction.
    Accept,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ShiftReduce => "shift/reduce",
            Self::ReduceReduce => "reduce/reduce",
            Self::Accept => "reduce/accept",
        })
    }
}

/// A table cell with more than one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateID,
    pub lookahead: TerminalID,
    pub shift: Option<StateID>,
    pub reduces: Vec<RuleID>,
    pub accept: bool,
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        if self.accept {
            ConflictKind::Accept
        } else if self.shift.is_some() {
            ConflictKind::ShiftReduce
        } else {
            ConflictKind::ReduceReduce
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(
                f,
                "{} conflict in state {} on `{}':",
                self.kind(),
                self.state,
                g.terminals[&self.lookahead]
            )?;
            let mut sep = " ";
            if let Some(n) = self.shift {
                write!(f, "{}shift({})", sep, n)?;
                sep = " / ";
            }
            for reduce in &self.reduces {
                write!(f, "{}reduce({})", sep, g.rule(*reduce).display(g))?;
                sep = " / ";
            }
            if self.accept {
                write!(f, "{}accept", sep)?;
            }
            Ok(())
        })
    }
}

/// Fill in the ACTION and GOTO tables from the LR(0) automaton, using the
/// FOLLOW sets as the reduce lookaheads.
///
/// Conflicting cells are recorded as `Action::Inconsistent` and reported
/// in `ParseTable::conflicts` instead of aborting the construction.
pub fn generate(g: &Grammar, lr0: &LR0Automaton, follow_sets: &FollowSets) -> ParseTable {
    let span = tracing::trace_span!("table");
    let _entered = span.enter();

    let mut states = Map::default();
    let mut conflicts = vec![];
    for (&id, lr0_state) in &lr0.states {
        #[derive(Default)]
        struct PendingAction {
            shift: Option<StateID>,
            reduces: Vec<RuleID>,
            accept: bool,
        }
        let mut pending_actions = Map::<TerminalID, PendingAction>::default();
        let mut gotos = Map::default();

        for (&symbol, &next) in &lr0_state.edges {
            match symbol {
                SymbolID::T(t) => {
                    pending_actions.entry(t).or_default().shift.replace(next);
                }
                SymbolID::N(n) => {
                    gotos.insert(n, next);
                }
            }
        }

        for reduce in lr0_state.reduces(g) {
            let left = g.rule(reduce).left;
            for t in follow_sets.follow(left).iter() {
                let action = pending_actions.entry(t).or_default();
                if reduce == RuleID::ACCEPT {
                    action.accept = true;
                } else if !action.reduces.contains(&reduce) {
                    action.reduces.push(reduce);
                }
            }
        }

        let mut actions: Map<TerminalID, Action> = Map::default();
        for (t, action) in pending_actions {
            let resolved = match (action.shift, &action.reduces[..], action.accept) {
                (Some(next), [], false) => Action::Shift(next),
                (None, [reduce], false) => Action::Reduce(*reduce),
                (None, [], true) => Action::Accept,
                _ => {
                    let conflict = Conflict {
                        state: id,
                        lookahead: t,
                        shift: action.shift,
                        reduces: action.reduces.clone(),
                        accept: action.accept,
                    };
                    tracing::debug!("{}", conflict.display(g));
                    conflicts.push(conflict);
                    Action::Inconsistent {
                        shift: action.shift,
                        reduces: action.reduces.clone(),
                        accept: action.accept,
                    }
                }
            };
            actions.insert(t, resolved);
        }

        states.insert(id, ParseTableRow { actions, gotos });
    }

    tracing::debug!(
        states = states.len(),
        conflicts = conflicts.len(),
        "SLR(1) table constructed"
    );

    ParseTable { states, conflicts }
}

/// A view of `ParseTable` that the runtime parser can drive.
#[derive(Debug, Copy, Clone)]
pub struct ParseTableDef<'g> {
    grammar: &'g Grammar,
    table: &'g ParseTable,
}

impl<'g> ParseTableDef<'g> {
    pub fn new(grammar: &'g Grammar, table: &'g ParseTable) -> Self {
        Self { grammar, table }
    }
}

impl slrkit_runtime::ParseTable for ParseTableDef<'_> {
    type State = StateID;
    type Terminal = TerminalID;
    type Nonterminal = NonterminalID;
    type Reduce = RuleID;

    fn initial_state(&self) -> StateID {
        StateID::INITIAL
    }

    fn action(
        &self,
        current: StateID,
        lookahead: Option<TerminalID>,
    ) -> ParseAction<StateID, NonterminalID, RuleID> {
        let lookahead = lookahead.unwrap_or(TerminalID::EOI);
        match self.table.action(current, lookahead) {
            None => ParseAction::Fail,
            Some(Action::Shift(next)) => ParseAction::Shift(*next),
            Some(Action::Reduce(reduce)) => {
                let rule = self.grammar.rule(*reduce);
                ParseAction::Reduce(*reduce, rule.left, rule.right.len())
            }
            Some(Action::Accept) => ParseAction::Accept,
            Some(Action::Inconsistent { .. }) => ParseAction::Conflict,
        }
    }

    fn goto(&self, current: StateID, symbol: NonterminalID) -> Option<StateID> {
        self.table.goto(current, symbol)
    }

    fn expected_terminals(&self, current: StateID) -> Vec<Option<TerminalID>> {
        self.table
            .expected(current)
            .into_iter()
            .map(|t| (t != TerminalID::EOI).then_some(t))
            .collect()
    }
}
