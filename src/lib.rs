//! Keep a local server inventory in sync with cloud provider APIs.
//!
//! `core` holds the provider-agnostic reconciliation engine, `adapters`
//! the provider clients and the JSON-file store.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
