mod orchestrator;
mod support;
