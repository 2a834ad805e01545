//! Member to slot assignment.

pub mod assign;
