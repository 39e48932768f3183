//! Grammar types.

use crate::{
    types::{Map, Set},
    util::display_fn,
};
use std::{fmt, fs, io, path::Path, str::FromStr};

/// The name of the end marker.
pub const END_MARKER: &str = "$";

/// The reserved token denoting an empty alternative.
pub const EPSILON: &str = "ε";

const ARROW: &str = "->";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}

impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug, Clone)]
pub struct Terminal {
    name: String,
}

impl Terminal {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}

impl NonterminalID {
    /// The augmented start symbol `S'`.
    pub const START: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug, Clone)]
pub struct Nonterminal {
    name: String,
}

impl Nonterminal {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleID {
    raw: u16,
}

impl RuleID {
    /// The augmentation rule `S' -> S`.
    pub const ACCEPT: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

impl fmt::Display for RuleID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Rule {
    pub left: NonterminalID,
    pub right: Vec<SymbolID>,
}

impl Rule {
    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} {}", g.nonterminals[&self.left], ARROW)?;
            if self.right.is_empty() {
                return write!(f, " {}", EPSILON);
            }
            for symbol in &self.right {
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            Ok(())
        })
    }
}

/// The grammar definition used to derive the parser tables.
///
/// The grammar is always augmented: `NonterminalID::START` is a fresh
/// nonterminal and `RuleID::ACCEPT` is the rule `START -> start_symbol`.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Grammar {
    pub terminals: Map<TerminalID, Terminal>,
    pub nonterminals: Map<NonterminalID, Nonterminal>,
    pub rules: Map<RuleID, Rule>,
    pub start_symbol: NonterminalID,
    names: Map<String, SymbolID>,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for terminal in self.terminals.values() {
            writeln!(f, "{}", terminal)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for (&id, nonterminal) in &self.nonterminals {
            write!(f, "{}", nonterminal)?;
            if id == NonterminalID::START {
                write!(f, " (augmented)")?;
            } else if id == self.start_symbol {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## rules:")?;
        for (id, rule) in &self.rules {
            writeln!(f, "[{:02}] {}", id, rule.display(self))?;
        }

        Ok(())
    }
}

impl FromStr for Grammar {
    type Err = GrammarDefError;

    /// Parse a grammar from a text containing one rule per line.
    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::from_rules(
            source
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }
}

impl Grammar {
    /// Load a grammar from a file containing one rule per line.
    ///
    /// Blank lines and lines starting with `#` are ignored.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grammar, GrammarDefError> {
        let source = fs::read_to_string(path).map_err(GrammarDefError::IO)?;
        source.parse()
    }

    /// Parse an ordered list of rules of the form `LHS -> RHS_1 | RHS_2 | ...`.
    ///
    /// The nonterminals are the left-hand sides, and every other symbol is
    /// a terminal. The left-hand side of the first rule is the start symbol.
    pub fn from_rules<I>(rules: I) -> Result<Grammar, GrammarDefError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let rules: Vec<I::Item> = rules.into_iter().collect();
        let parsed = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| parse_rule(i + 1, rule.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Grammar::define(|g| define_grammar_from_rules(g, &parsed))
    }

    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let span = tracing::trace_span!("define_grammar");
        let _entered = span.enter();

        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            rules: Map::default(),
            names: Map::default(),
            start: None,
            next_terminal_id: TerminalID::OFFSET,
            next_nonterminal_id: NonterminalID::OFFSET,
            next_rule_id: RuleID::OFFSET,
        };

        def.terminals.insert(
            TerminalID::EOI,
            Terminal {
                name: END_MARKER.to_owned(),
            },
        );
        def.names
            .insert(END_MARKER.to_owned(), SymbolID::T(TerminalID::EOI));

        // The name is fixed up once the start symbol is known.
        def.nonterminals.insert(
            NonterminalID::START,
            Nonterminal {
                name: String::new(),
            },
        );

        f(&mut def)?;

        def.end()
    }

    pub fn rule(&self, id: RuleID) -> &Rule {
        &self.rules[&id]
    }

    /// Return the production rules whose left-hand side is `n`, in declaration order.
    pub fn rules_of(&self, n: NonterminalID) -> impl Iterator<Item = (RuleID, &Rule)> + '_ {
        self.rules
            .iter()
            .filter(move |(_, rule)| rule.left == n)
            .map(|(id, rule)| (*id, rule))
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => self.terminals[&t].name(),
            SymbolID::N(n) => self.nonterminals[&n].name(),
        }
    }

    pub fn symbol(&self, name: &str) -> Option<SymbolID> {
        self.names.get(name).copied()
    }

    pub fn terminal(&self, name: &str) -> Option<TerminalID> {
        match self.symbol(name)? {
            SymbolID::T(t) => Some(t),
            SymbolID::N(..) => None,
        }
    }

    pub fn nonterminal(&self, name: &str) -> Option<NonterminalID> {
        match self.symbol(name)? {
            SymbolID::N(n) => Some(n),
            SymbolID::T(..) => None,
        }
    }
}

struct ParsedRule<'s> {
    left: &'s str,
    productions: Vec<Vec<&'s str>>,
}

fn parse_rule(index: usize, text: &str) -> Result<ParsedRule<'_>, GrammarDefError> {
    let format_error = |reason| GrammarDefError::Format {
        index,
        rule: text.to_owned(),
        reason,
    };

    let (left, right) = text
        .split_once(ARROW)
        .ok_or_else(|| format_error("missing `->'"))?;

    let left = left.trim();
    if left.is_empty() {
        return Err(format_error("empty left-hand side"));
    }
    if left.split_whitespace().count() > 1 {
        return Err(format_error("the left-hand side must be a single symbol"));
    }

    let mut productions = vec![];
    for alternative in right.split('|') {
        if alternative.trim().is_empty() {
            return Err(format_error("empty alternative (use `ε' for an empty production)"));
        }
        let mut symbols = vec![];
        for symbol in alternative.split_whitespace() {
            match symbol {
                EPSILON => continue,
                ARROW => return Err(format_error("unexpected `->' in the right-hand side")),
                symbol => symbols.push(symbol),
            }
        }
        productions.push(symbols);
    }

    Ok(ParsedRule { left, productions })
}

fn define_grammar_from_rules(
    g: &mut GrammarDef,
    parsed: &[ParsedRule<'_>],
) -> Result<(), GrammarDefError> {
    // The left-hand sides must be known before the right-hand sides are
    // classified into terminals and nonterminals.
    for rule in parsed {
        if g.lookup(rule.left).is_none() {
            g.nonterminal(rule.left)?;
        }
    }

    for rule in parsed {
        let left = match g.lookup(rule.left) {
            Some(SymbolID::N(n)) => n,
            _ => return Err(format!("unknown nonterminal: `{}'", rule.left).into()),
        };
        for production in &rule.productions {
            let mut right = Vec::with_capacity(production.len());
            for &name in production {
                let symbol = match g.lookup(name) {
                    Some(symbol) => symbol,
                    None => SymbolID::T(g.terminal(name)?),
                };
                right.push(symbol);
            }
            g.rule(left, right)?;
        }
    }

    Ok(())
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    rules: Map<RuleID, Rule>,
    names: Map<String, SymbolID>,
    start: Option<NonterminalID>,
    next_terminal_id: u16,
    next_nonterminal_id: u16,
    next_rule_id: u16,
}

impl GrammarDef {
    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(&mut self, name: &str) -> Result<TerminalID, GrammarDefError> {
        self.verify_new_name(name)?;

        let id = TerminalID::from_raw(self.next_terminal_id);
        self.next_terminal_id = self
            .next_terminal_id
            .checked_add(1)
            .ok_or("too many terminal symbols")?;

        self.terminals.insert(
            id,
            Terminal {
                name: name.to_owned(),
            },
        );
        self.names.insert(name.to_owned(), SymbolID::T(id));

        Ok(id)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> Result<NonterminalID, GrammarDefError> {
        self.verify_new_name(name)?;

        let id = NonterminalID::from_raw(self.next_nonterminal_id);
        self.next_nonterminal_id = self
            .next_nonterminal_id
            .checked_add(1)
            .ok_or("too many nonterminal symbols")?;

        self.nonterminals.insert(
            id,
            Nonterminal {
                name: name.to_owned(),
            },
        );
        self.names.insert(name.to_owned(), SymbolID::N(id));

        Ok(id)
    }

    /// Return the symbol declared with the specified name.
    pub fn lookup(&self, name: &str) -> Option<SymbolID> {
        self.names.get(name).copied()
    }

    /// Specify a production rule into this grammer.
    pub fn rule<I>(&mut self, left: NonterminalID, right: I) -> Result<RuleID, GrammarDefError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        if left == NonterminalID::START || !self.nonterminals.contains_key(&left) {
            return Err("undeclared nonterminal on the left-hand side".into());
        }
        let right: Vec<SymbolID> = right.into_iter().collect();
        for symbol in &right {
            let declared = match symbol {
                SymbolID::T(t) => *t != TerminalID::EOI && self.terminals.contains_key(t),
                SymbolID::N(n) => *n != NonterminalID::START && self.nonterminals.contains_key(n),
            };
            if !declared {
                return Err("undeclared symbol on the right-hand side".into());
            }
        }

        if self
            .rules
            .values()
            .any(|rule| rule.left == left && rule.right == right)
        {
            tracing::warn!(
                "duplicate production rule for `{}'",
                self.nonterminals[&left].name
            );
        }

        let id = RuleID::from_raw(self.next_rule_id);
        self.next_rule_id = self
            .next_rule_id
            .checked_add(1)
            .ok_or("too many production rules")?;
        self.rules.insert(id, Rule { left, right });

        Ok(id)
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, symbol: NonterminalID) -> Result<(), GrammarDefError> {
        if symbol == NonterminalID::START || !self.nonterminals.contains_key(&symbol) {
            return Err("undeclared start symbol".into());
        }
        self.start.replace(symbol);
        Ok(())
    }

    fn verify_new_name(&self, name: &str) -> Result<(), GrammarDefError> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(format!("incorrect symbol name: `{}'", name).into());
        }
        if name == EPSILON || name == END_MARKER || name == ARROW || name == "|" {
            return Err(format!("reserved symbol name: `{}'", name).into());
        }
        if self.names.contains_key(name) {
            return Err(format!("The symbol `{}' has already been declared", name).into());
        }
        Ok(())
    }

    fn end(mut self) -> Result<Grammar, GrammarDefError> {
        // Fall back to the first declared nonterminal.
        let start = match self.start.take() {
            Some(start) => start,
            None => self
                .nonterminals
                .keys()
                .find(|id| **id != NonterminalID::START)
                .copied()
                .ok_or("empty nonterminal symbols")?,
        };

        // S' -> S, with as many trailing marks as needed for a fresh name.
        let mut augmented = format!("{}'", self.nonterminals[&start].name);
        while self.names.contains_key(&augmented) {
            augmented.push('\'');
        }
        if let Some(nonterminal) = self.nonterminals.get_mut(&NonterminalID::START) {
            nonterminal.name = augmented.clone();
        }
        self.names.insert(augmented, SymbolID::N(NonterminalID::START));

        let mut rules = Map::default();
        rules.insert(
            RuleID::ACCEPT,
            Rule {
                left: NonterminalID::START,
                right: vec![SymbolID::N(start)],
            },
        );
        rules.extend(self.rules);

        let grammar = Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            rules,
            start_symbol: start,
            names: self.names,
        };
        warn_useless_nonterminals(&grammar);
        tracing::debug!(
            terminals = grammar.terminals.len(),
            nonterminals = grammar.nonterminals.len(),
            rules = grammar.rules.len(),
            "grammar defined"
        );

        Ok(grammar)
    }
}

fn warn_useless_nonterminals(g: &Grammar) {
    for (&id, nonterminal) in &g.nonterminals {
        if g.rules_of(id).next().is_none() {
            tracing::warn!(
                "The nonterminal `{}' has no associated production rule",
                nonterminal
            );
        }
    }

    let mut reachable = Set::default();
    reachable.insert(NonterminalID::START);
    let mut i = 0;
    while let Some(&n) = reachable.get_index(i) {
        for (_, rule) in g.rules_of(n) {
            for symbol in &rule.right {
                if let SymbolID::N(n) = symbol {
                    reachable.insert(*n);
                }
            }
        }
        i += 1;
    }
    for (id, nonterminal) in &g.nonterminals {
        if !reachable.contains(id) {
            tracing::warn!(
                "The nonterminal `{}' is unreachable from the start symbol",
                nonterminal
            );
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("malformed rule #{} `{}': {}", index, rule, reason)]
    Format {
        index: usize,
        rule: String,
        reason: &'static str,
    },

    #[error("Other error: {}", msg)]
    Other { msg: String },
}

impl From<&str> for GrammarDefError {
    fn from(msg: &str) -> Self {
        Self::Other { msg: msg.into() }
    }
}

impl From<String> for GrammarDefError {
    fn from(msg: String) -> Self {
        Self::Other { msg }
    }
}
