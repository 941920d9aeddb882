//! Command implementations for the subwatch CLI

mod check;

pub use check::*;
