//! Shared pilot core primitives: agent session, tool catalog, and model client.
//!
//! This crate holds everything the runner binary needs that is not tied to a
//! concrete OS input device: the conversation window, the typed tool catalog,
//! the batch dispatch harness, and the remote-model adapter.

pub mod llm;
pub mod agent;
