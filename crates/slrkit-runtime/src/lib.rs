//! Runtime implementation for `slrkit` parse tables.

pub mod definition;
pub mod parser;

pub use crate::{
    definition::{Location, ParseAction, ParseTable},
    parser::{ParseError, ParseEvent, ParseItem, Parser, Status, Token},
};
