//! Integration tests for the Synapse generation core

mod cli_binary;
mod cli_routes;
mod orchestrator_flow;
