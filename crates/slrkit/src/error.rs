//! Errors reported by `Recognizer`.

use crate::{grammar::GrammarDefError, lr0::AutomatonError, table::Conflict};
use slrkit_runtime::Location;

/// The category of a failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The grammar text or definition is malformed.
    GrammarFormat,
    /// The grammar is not SLR(1), or the table is otherwise unusable.
    TableConflict,
    /// The input is not a sentence of the grammar.
    Syntax,
    /// A configured bound on the construction or the parse was exceeded.
    ResourceLimit,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarDefError),

    #[error(transparent)]
    Automaton(#[from] AutomatonError),

    #[error("the grammar is not SLR(1): {} conflicting table cell(s)", conflicts.len())]
    TableConflict { conflicts: Vec<Conflict> },

    #[error("inconsistent parse table at {}: {}", location, message)]
    InconsistentTable { message: String, location: Location },

    #[error("syntax error at {}: {}", location, message)]
    Syntax { message: String, location: Location },

    #[error("{}", message)]
    ReduceLimit { message: String, location: Location },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Grammar(..) => ErrorKind::GrammarFormat,
            Self::Automaton(..) | Self::ReduceLimit { .. } => ErrorKind::ResourceLimit,
            Self::TableConflict { .. } | Self::InconsistentTable { .. } => {
                ErrorKind::TableConflict
            }
            Self::Syntax { .. } => ErrorKind::Syntax,
        }
    }

    /// The position in the input where the parse stopped, if any.
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::InconsistentTable { location, .. }
            | Self::Syntax { location, .. }
            | Self::ReduceLimit { location, .. } => Some(*location),
            _ => None,
        }
    }
}
