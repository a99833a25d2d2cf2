mod casing;
mod identifiers;
