//! Canonical collection of LR(0) item sets.

use crate::{
    grammar::{Grammar, RuleID, SymbolID},
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u32);

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StateID {
    /// The state containing the closure of `S' -> . S`.
    pub const INITIAL: Self = Self::from_raw(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u32 {
        self.0
    }
}

/// The LR(0) item, a production with a dot marking how much of it has been matched.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LR0Item {
    pub rule: RuleID,
    pub dot: u16,
}

impl LR0Item {
    pub const fn new(rule: RuleID, dot: u16) -> Self {
        Self { rule, dot }
    }

    /// Return the symbol right after the dot, or `None` for a reduce item.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.rule(self.rule).right.get(usize::from(self.dot)).copied()
    }

    pub fn is_reduce(&self, g: &Grammar) -> bool {
        usize::from(self.dot) >= g.rule(self.rule).right.len()
    }

    /// Move the dot over the next symbol.
    pub fn advance(self) -> Self {
        Self {
            dot: self.dot + 1,
            ..self
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let rule = g.rule(self.rule);
            write!(f, "{} ->", g.nonterminals[&rule.left])?;
            for (i, symbol) in rule.right.iter().enumerate() {
                if i == usize::from(self.dot) {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            if self.is_reduce(g) {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

/// A set of LR(0) items.
///
/// The iteration order is the order of insertion, while the equality is
/// that of sets.
pub type ItemSet = Set<LR0Item>;

/// Expand the item set with every production reachable by stepping into
/// a nonterminal right after a dot, until nothing more can be added.
pub fn closure(g: &Grammar, items: &ItemSet) -> ItemSet {
    let mut closure = items.clone();
    // Items appended during the scan are visited by the same scan.
    let mut i = 0;
    while let Some(item) = closure.get_index(i).copied() {
        if let Some(SymbolID::N(n)) = item.next_symbol(g) {
            for (rule, _) in g.rules_of(n) {
                closure.insert(LR0Item::new(rule, 0));
            }
        }
        i += 1;
    }
    closure
}

/// Compute the item set reached from `items` by moving over `symbol`.
pub fn goto(g: &Grammar, items: &ItemSet, symbol: SymbolID) -> ItemSet {
    let kernel: ItemSet = items
        .iter()
        .filter(|item| item.next_symbol(g) == Some(symbol))
        .map(|item| item.advance())
        .collect();
    closure(g, &kernel)
}

#[derive(Debug, Clone)]
pub struct LR0State {
    pub items: ItemSet,
    /// Outgoing transitions, in the order they were discovered.
    pub edges: Map<SymbolID, StateID>,
}

impl LR0State {
    /// Return the rules of the reduce items in this state.
    pub fn reduces<'g>(&'g self, g: &'g Grammar) -> impl Iterator<Item = RuleID> + 'g {
        self.items
            .iter()
            .filter(move |item| item.is_reduce(g))
            .map(|item| item.rule)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            writeln!(f, "## items:")?;
            for item in &self.items {
                writeln!(f, "- {}", item.display(g))?;
            }
            if !self.edges.is_empty() {
                writeln!(f, "## edges:")?;
                for (symbol, to) in &self.edges {
                    writeln!(f, "- {} => {}", g.symbol_name(*symbol), to)?;
                }
            }
            Ok(())
        })
    }
}

#[derive(Debug)]
pub struct LR0Automaton {
    pub states: Map<StateID, LR0State>,
}

impl LR0Automaton {
    /// Iterate over all transitions as `(from, symbol, to)`.
    pub fn edges(&self) -> impl Iterator<Item = (StateID, SymbolID, StateID)> + '_ {
        self.states.iter().flat_map(|(&from, state)| {
            state
                .edges
                .iter()
                .map(move |(&symbol, &to)| (from, symbol, to))
        })
    }

    /// Find the state whose item set equals `items`.
    pub fn find(&self, items: &ItemSet) -> Option<StateID> {
        self.states
            .iter()
            .find(|(_, state)| state.items == *items)
            .map(|(id, _)| *id)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, state)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {}", id)?;
                write!(f, "{}", state.display(g))?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AutomatonError {
    #[error("the LR(0) automaton exceeds the limit of {} states", limit)]
    TooManyStates { limit: usize },
}

/// Calculate the LR(0) automaton based on the specified grammar.
///
/// States are numbered in order of discovery. The states are visited in
/// that order and, within a state, the candidate symbols are taken in
/// order of their first appearance after a dot, so the numbering only
/// depends on the grammar.
pub fn lr0(g: &Grammar, max_states: usize) -> Result<LR0Automaton, AutomatonError> {
    let span = tracing::trace_span!("lr0");
    let _entered = span.enter();

    let mut states = Map::<StateID, LR0State>::default();

    // Two item sets are equal iff their sorted item lists are equal, so
    // the sorted list can be hashed in place of the set itself.
    let mut index = Map::<Vec<LR0Item>, StateID>::default();
    let canonical = |items: &ItemSet| {
        let mut items: Vec<LR0Item> = items.iter().copied().collect();
        items.sort_unstable();
        items
    };

    let initial = closure(
        g,
        &Some(LR0Item::new(RuleID::ACCEPT, 0))
            .into_iter()
            .collect(),
    );
    index.insert(canonical(&initial), StateID::INITIAL);
    states.insert(
        StateID::INITIAL,
        LR0State {
            items: initial,
            edges: Map::default(),
        },
    );

    // States discovered while scanning are appended and scanned in turn.
    let mut current = 0;
    while let Some((&from, state)) = states.get_index(current) {
        let symbols: Set<SymbolID> = state
            .items
            .iter()
            .filter_map(|item| item.next_symbol(g))
            .collect();

        for symbol in symbols {
            let items = goto(g, &states[&from].items, symbol);
            let key = canonical(&items);
            let to = match index.get(&key) {
                Some(&to) => to,
                None => {
                    if states.len() >= max_states {
                        return Err(AutomatonError::TooManyStates { limit: max_states });
                    }
                    let to = StateID(states.len() as u32);
                    index.insert(key, to);
                    states.insert(
                        to,
                        LR0State {
                            items,
                            edges: Map::default(),
                        },
                    );
                    to
                }
            };
            // Recorded even if the target already existed.
            states[&from].edges.insert(symbol, to);
        }

        current += 1;
    }

    tracing::debug!(states = states.len(), "LR(0) automaton constructed");

    Ok(LR0Automaton { states })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::NonterminalID;

    fn arithmetic() -> Grammar {
        Grammar::from_rules([
            "E -> E + T | T",
            "T -> T * F | F",
            "F -> ( E ) | id",
        ])
        .unwrap()
    }

    fn items(g: &Grammar, items: &ItemSet) -> Vec<String> {
        items.iter().map(|i| i.display(g).to_string()).collect()
    }

    #[test]
    fn initial_state_is_closure_of_start_item() {
        let g = arithmetic();
        let lr0 = lr0(&g, usize::MAX).unwrap();
        let initial = &lr0.states[&StateID::INITIAL];
        assert_eq!(
            items(&g, &initial.items),
            [
                "E' -> . E",
                "E -> . E + T",
                "E -> . T",
                "T -> . T * F",
                "T -> . F",
                "F -> . ( E )",
                "F -> . id",
            ]
        );
    }

    #[test]
    fn closure_is_idempotent() {
        let g = arithmetic();
        let lr0 = lr0(&g, usize::MAX).unwrap();
        for state in lr0.states.values() {
            let once = closure(&g, &state.items);
            assert_eq!(closure(&g, &once), once);
            assert_eq!(once, state.items);
        }

        let kernel: ItemSet = Some(LR0Item::new(RuleID::from_raw(1), 2))
            .into_iter()
            .collect();
        let once = closure(&g, &kernel);
        assert_eq!(once.len(), 5);
        assert_eq!(closure(&g, &once), once);
    }

    #[test]
    fn item_set_equality_ignores_order() {
        let a: ItemSet = [LR0Item::new(RuleID::from_raw(1), 0), LR0Item::new(RuleID::from_raw(2), 0)]
            .into_iter()
            .collect();
        let b: ItemSet = [LR0Item::new(RuleID::from_raw(2), 0), LR0Item::new(RuleID::from_raw(1), 0)]
            .into_iter()
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn canonical_collection_of_arithmetic_grammar() {
        let g = arithmetic();
        let lr0 = lr0(&g, usize::MAX).unwrap();
        assert_eq!(lr0.states.len(), 12);

        let sym = |name: &str| g.symbol(name).unwrap();
        let edge = |from: u32, name: &str| {
            lr0.states[&StateID::from_raw(from)].edges.get(&sym(name)).map(|to| to.into_raw())
        };
        assert_eq!(edge(0, "E"), Some(1));
        assert_eq!(edge(0, "T"), Some(2));
        assert_eq!(edge(0, "F"), Some(3));
        assert_eq!(edge(0, "("), Some(4));
        assert_eq!(edge(0, "id"), Some(5));
        assert_eq!(edge(1, "+"), Some(6));
        assert_eq!(edge(2, "*"), Some(7));
        assert_eq!(edge(4, "E"), Some(8));
        // Transitions into states discovered earlier are still recorded.
        assert_eq!(edge(4, "T"), Some(2));
        assert_eq!(edge(4, "("), Some(4));
        assert_eq!(edge(6, "T"), Some(9));
        assert_eq!(edge(7, "F"), Some(10));
        assert_eq!(edge(8, ")"), Some(11));
        assert_eq!(edge(9, "*"), Some(7));
        assert_eq!(edge(5, "+"), None);
    }

    #[test]
    fn goto_matches_recorded_edges() {
        let g = arithmetic();
        let lr0 = lr0(&g, usize::MAX).unwrap();
        for (from, symbol, to) in lr0.edges() {
            let items = goto(&g, &lr0.states[&from].items, symbol);
            assert_eq!(lr0.find(&items), Some(to));
        }
    }

    #[test]
    fn numbering_is_deterministic() {
        let g = arithmetic();
        let a = lr0(&g, usize::MAX).unwrap();
        let b = lr0(&g, usize::MAX).unwrap();
        assert_eq!(a.states.len(), b.states.len());
        for ((id_a, state_a), (id_b, state_b)) in a.states.iter().zip(&b.states) {
            assert_eq!(id_a, id_b);
            assert_eq!(
                state_a.items.iter().collect::<Vec<_>>(),
                state_b.items.iter().collect::<Vec<_>>()
            );
            assert_eq!(
                state_a.edges.iter().collect::<Vec<_>>(),
                state_b.edges.iter().collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn reduce_items() {
        let g = arithmetic();
        let lr0 = lr0(&g, usize::MAX).unwrap();
        let accept: Vec<RuleID> = lr0.states[&StateID::from_raw(1)].reduces(&g).collect();
        assert_eq!(accept, [RuleID::ACCEPT]);
        assert_eq!(g.rule(RuleID::ACCEPT).left, NonterminalID::START);
        assert_eq!(lr0.states[&StateID::INITIAL].reduces(&g).count(), 0);
    }

    #[test]
    fn bounded_state_count() {
        let g = arithmetic();
        let err = lr0(&g, 5).unwrap_err();
        assert!(matches!(err, AutomatonError::TooManyStates { limit: 5 }));
    }
}
