//! HTTP client for the generation service.
//!
//! Provides the typed wire messages, the [`GenerationApi`] REST wrapper,
//! and the [`StatusSource`] / [`GenerationService`] traits the tracker is
//! written against.

pub mod api;
pub mod messages;
pub mod service;

pub use api::{ApiError, GenerationApi};
pub use messages::{GenerateRequest, StatusResponse, SubmitResponse};
pub use service::{GenerationService, StatusSource};
