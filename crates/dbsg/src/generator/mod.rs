pub mod appendix;
pub mod builder;
pub mod errors;
pub mod filters;
pub mod ir;
pub mod metrics;
pub mod naming;
pub mod orchestrator;
pub mod plugins;
pub mod types;

#[cfg(test)]
mod tests;
