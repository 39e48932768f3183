//! SLR(1) parser generator and table-driven recognizer.

pub mod error;
pub mod first_follow;
pub mod grammar;
pub mod language;
pub mod lr0;
pub mod recognizer;
pub mod table;
pub mod token;
pub mod types;
pub mod util;

pub use crate::{
    error::{Error, ErrorKind},
    grammar::Grammar,
    recognizer::{Config, Recognizer},
    token::Token,
};
pub use slrkit_runtime as runtime;
