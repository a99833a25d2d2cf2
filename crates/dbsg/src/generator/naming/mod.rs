pub mod casing;
pub mod identifiers;

pub use casing::{AbbreviationTable, CasingEngine};

#[cfg(test)]
mod tests;
