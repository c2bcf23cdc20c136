//! Record schemas
//!
//! This module holds the static tables the parsers dispatch on: the trailing
//! field schema of each event-type code and the vocabulary of generated
//! statistics.

mod registry;
mod vocabulary;

pub use registry::*;
pub use vocabulary::*;
