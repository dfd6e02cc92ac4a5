//! # Service Layer
//!
//! Orchestrators wiring the pure engines (scoring, adaptive, sanitizer) to
//! the store contracts and the AI gateway.

pub mod quiz_service;
pub mod submission_service;
pub mod synthesis_service;

pub use quiz_service::{CreateQuizInput, NewQuestion, QuizService};
pub use submission_service::{SubmissionService, SubmitQuizCommand};
pub use synthesis_service::{QuizSynthesisRequest, SynthesisService};
