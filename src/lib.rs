//! # quiz-core
//!
//! Adaptive difficulty and quiz evaluation core for the quiz platform.
//!
//! The crate is the platform's hard center, packaged as a single cohesive
//! library with named interfaces that external collaborators fulfill.
//!
//! ## Modules
//!
//! | Module | Purpose | Key Types |
//! |--------|---------|-----------|
//! | [`llm`] | Two-provider AI gateway with failover | [`llm::AiGateway`], [`llm::ProviderClient`] |
//! | [`sanitize`] | Strip solutions before client exposure | [`sanitize::SanitizeOptions`] |
//! | [`scoring`] | Deterministic type-aware grading | [`scoring::grade_answers`] |
//! | [`adaptive`] | Offline distributions, online adjustment | [`adaptive::recommend`], [`adaptive::adjust_difficulty`] |
//! | [`projection`] | Rolling per-subject performance history | [`projection::PerformanceProjector`] |
//! | [`service`] | Submission and synthesis orchestrators | [`service::SubmissionService`], [`service::SynthesisService`] |
//! | [`repository`] | Store contracts the host implements | [`repository::QuizRepository`] |
//!
//! HTTP transport, request auth, rate limiting, and the persistent stores are
//! deliberately outside this crate; the host process injects a [`CoreConfig`]
//! and the store implementations at startup.

pub mod adaptive;
pub mod api;
pub mod config;
pub mod domain;
pub mod llm;
pub mod projection;
pub mod repository;
pub mod sanitize;
pub mod scoring;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience - the types most hosts touch directly.
pub use config::CoreConfig;
pub use domain::{CoreError, CoreResult};
