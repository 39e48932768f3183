//! Calculation of FIRST and FOLLOW sets.

use crate::{
    grammar::{Grammar, NonterminalID, RuleID, SymbolID, TerminalID},
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.into_raw().into())
    }
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.into_raw().into())
    }
    /// Add the elements of `other`, returning whether anything was added.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner
            .iter()
            .filter_map(|raw| u16::try_from(raw).ok().map(TerminalID::from_raw))
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            f.write_str("{")?;
            for (i, t) in self.iter().enumerate() {
                f.write_str(if i > 0 { ", " } else { " " })?;
                f.write_str(g.terminals[&t].name())?;
            }
            f.write_str(if self.is_empty() { "}" } else { " }" })
        })
    }
}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.into_raw().into()).collect(),
        }
    }
}

/// FIRST of a symbol or a sequence of symbols.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FirstSet {
    pub terminals: TerminalSet,
    /// Whether ε belongs to the set.
    pub nullable: bool,
}

#[derive(Debug)]
pub struct FirstSets {
    nulls: Set<NonterminalID>,
    first_sets: Map<NonterminalID, TerminalSet>,
}

impl FirstSets {
    pub fn new(g: &Grammar) -> Self {
        let span = tracing::trace_span!("first_sets");
        let _entered = span.enter();

        let nulls = nulls_set(g);
        let first_sets = first_sets(g, &nulls);
        tracing::debug!(nullables = nulls.len(), "FIRST sets computed");
        Self { nulls, first_sets }
    }

    pub fn is_nullable(&self, n: NonterminalID) -> bool {
        self.nulls.contains(&n)
    }

    /// `First(X)` for a single symbol.
    pub fn of_symbol(&self, symbol: SymbolID) -> FirstSet {
        self.first(&[symbol])
    }

    /// `First(X1 X2 ... Xn)`. The empty sequence derives only ε.
    pub fn first(&self, symbols: &[SymbolID]) -> FirstSet {
        let mut res = FirstSet::default();
        for symbol in symbols {
            match *symbol {
                SymbolID::T(t) => {
                    res.terminals.insert(t);
                    return res;
                }
                SymbolID::N(n) => {
                    if let Some(first) = self.first_sets.get(&n) {
                        res.terminals.union_with(first);
                    }
                    if !self.is_nullable(n) {
                        return res;
                    }
                }
            }
        }
        res.nullable = true;
        res
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (n, first) in &self.first_sets {
                write!(f, "FIRST({}) = {}", g.nonterminals[n], first.display(g))?;
                if self.is_nullable(*n) {
                    f.write_str(" + ε")?;
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }
}

/// Calculate the set of nullable nonterminals in this grammar.
fn nulls_set(g: &Grammar) -> Set<NonterminalID> {
    let mut nulls: Set<NonterminalID> = g
        .rules
        .values()
        .filter_map(|rule| rule.right.is_empty().then_some(rule.left))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for rule in g.rules.values() {
            if nulls.contains(&rule.left) {
                continue;
            }
            let is_rhs_nullable = rule.right.iter().all(|symbol| match symbol {
                SymbolID::N(n) => nulls.contains(n),
                SymbolID::T(..) => false,
            });
            if is_rhs_nullable {
                changed = true;
                nulls.insert(rule.left);
            }
        }
    }

    nulls
}

fn first_sets(g: &Grammar, nulls: &Set<NonterminalID>) -> Map<NonterminalID, TerminalSet> {
    let mut map: Map<NonterminalID, TerminalSet> = g
        .nonterminals
        .keys()
        .map(|n| (*n, TerminalSet::default()))
        .collect();

    // For X -> Y1 Y2 ... Yn, let Yk be the first non-nullable symbol.
    // Then First(X) contains First(Yi) for each i <= k.
    #[derive(Debug)]
    struct Constraint {
        sup: NonterminalID,
        sub: NonterminalID,
    }
    let mut constraints = vec![];
    for (_, rule) in g.rules.iter().filter(|(id, _)| **id != RuleID::ACCEPT) {
        for symbol in &rule.right {
            match *symbol {
                SymbolID::T(t) => {
                    if let Some(first) = map.get_mut(&rule.left) {
                        first.insert(t);
                    }
                    break;
                }
                SymbolID::N(n) => {
                    if n != rule.left {
                        constraints.push(Constraint {
                            sup: rule.left,
                            sub: n,
                        });
                    }
                    if !nulls.contains(&n) {
                        break;
                    }
                }
            }
        }
    }

    solve(&mut map, constraints.iter().map(|c| (c.sup, c.sub)));

    // First(S') is First(S).
    if let Some(first) = map.get(&g.start_symbol).cloned() {
        map.insert(NonterminalID::START, first);
    }

    map
}

/// Propagate elements along `sup ⊇ sub` constraints until nothing changes.
fn solve<I>(map: &mut Map<NonterminalID, TerminalSet>, constraints: I)
where
    I: Iterator<Item = (NonterminalID, NonterminalID)> + Clone,
{
    let mut changed = true;
    while changed {
        changed = false;
        for (sup, sub) in constraints.clone() {
            let Some(subset) = map.get(&sub).cloned() else {
                continue;
            };
            if let Some(superset) = map.get_mut(&sup) {
                changed |= superset.union_with(&subset);
            }
        }
    }
}

#[derive(Debug)]
pub struct FollowSets {
    follow_sets: Map<NonterminalID, TerminalSet>,
}

impl FollowSets {
    pub fn new(g: &Grammar, first_sets: &FirstSets) -> Self {
        let span = tracing::trace_span!("follow_sets");
        let _entered = span.enter();

        let mut map: Map<NonterminalID, TerminalSet> = g
            .nonterminals
            .keys()
            .map(|n| (*n, TerminalSet::default()))
            .collect();
        if let Some(follow) = map.get_mut(&NonterminalID::START) {
            follow.insert(TerminalID::EOI);
        }

        // For B -> α A β, Follow(A) contains First(β) \ {ε}, and
        // Follow(B) as well if β is nullable.
        #[derive(Debug)]
        struct Constraint {
            sup: NonterminalID,
            sub: NonterminalID,
        }
        let mut constraints = vec![];
        for rule in g.rules.values() {
            for (i, symbol) in rule.right.iter().enumerate() {
                let SymbolID::N(n) = *symbol else {
                    continue;
                };
                let rest = first_sets.first(&rule.right[i + 1..]);
                if let Some(follow) = map.get_mut(&n) {
                    follow.union_with(&rest.terminals);
                }
                if rest.nullable && n != rule.left {
                    constraints.push(Constraint {
                        sup: n,
                        sub: rule.left,
                    });
                }
            }
        }

        solve(&mut map, constraints.iter().map(|c| (c.sup, c.sub)));

        for (n, follow) in &map {
            if follow.is_empty() {
                tracing::debug!("FOLLOW({}) is empty", g.nonterminals[n]);
            }
        }

        Self { follow_sets: map }
    }

    /// `Follow(A)`. The end marker stands for the end of input.
    pub fn follow(&self, n: NonterminalID) -> &TerminalSet {
        &self.follow_sets[&n]
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (n, follow) in &self.follow_sets {
                writeln!(f, "FOLLOW({}) = {}", g.nonterminals[n], follow.display(g))?;
            }
            Ok(())
        })
    }
}
