//! CCREATY Gateway Library
//!
//! Asynchronous job gateway in front of generative AI providers.
//! The binary is in `src/main.rs`; modules are exposed for integration tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod providers;
/// Projects, jobs and their registries
pub mod state;
