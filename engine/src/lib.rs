//! waitroom - virtual waiting-room admission engine.
//!
//! This library exposes the queue engine and HTTP API for the server binary,
//! benchmarks and tests.

pub mod config;
pub mod error;
pub mod http;
pub mod queue;
pub mod runtime;
pub mod startup;
pub mod telemetry;
