//! Synapse: AI-generated notes for markdown vaults
//!
//! Explanations, summaries, flashcards and inline chat written directly into
//! markdown documents. The core reads and rewrites structured regions of a
//! note (frontmatter, the embedded chat transcript, selections) around a
//! single asynchronous generation call.

pub mod artifact;
pub mod chat;
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod frontmatter;
pub mod logging;
pub mod orchestrator;
pub mod provider;
pub mod template;
pub mod vault;

pub use error::{ErrorKind, SynapseError};
