//! Clausehound - streaming search/chat client for the contract precedent API
//!
//! This library exposes modules for use in integration tests.

pub mod client;
pub mod config;
pub mod models;
pub mod orchestrator;
pub mod session;
pub mod sse;
