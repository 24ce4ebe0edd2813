//! Application layer: Use cases and services.
//!
//! This module wires the domain computations to the ports: an immutable
//! `EngineContext` built at startup, and the `AssessmentService` that runs
//! one assessment per call.

mod assessment;
mod context;

pub use assessment::AssessmentService;
pub use context::EngineContext;
