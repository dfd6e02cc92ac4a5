//! # API Layer
//!
//! Wire DTOs consumed by the host transport. The core ships no HTTP server;
//! these are the shapes a transport serializes.

pub mod dto;

pub use dto::*;
