//! Whiteboard-teaching API client
//!
//! This module wraps the backend REST surface: sessions, explanations and
//! animations, plus the derived media URLs for rendered video. The client
//! is thin: one method per backend operation, no retries, no caching.
//! Failure recovery belongs to callers (the session aggregator absorbs
//! transient refresh failures; mutations surface their errors).

mod client;

pub use client::ApiClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Animation, CreateAnimation, CreateExplanation, CreateSession, Explanation, Session,
};

/// The backend operations the aggregator and front-ends consume.
///
/// [`ApiClient`] is the real implementation; tests drive the aggregator
/// with scripted in-memory implementations instead of a live server.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Create a new session
    async fn create_session(&self, req: &CreateSession) -> Result<Session>;

    /// List all sessions
    async fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Fetch one session by its opaque external id
    async fn get_session(&self, session_id: &str) -> Result<Session>;

    /// Delete a session by its opaque external id
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Submit a question to a session
    async fn create_explanation(&self, req: &CreateExplanation) -> Result<Explanation>;

    /// List explanations, optionally restricted to one session
    /// (addressed by its opaque external id)
    async fn list_explanations(&self, session_id: Option<&str>) -> Result<Vec<Explanation>>;

    /// Fetch one explanation
    async fn get_explanation(&self, explanation_id: i64) -> Result<Explanation>;

    /// Request a new animation for an explanation
    async fn create_animation(&self, req: &CreateAnimation) -> Result<Animation>;

    /// List animations, optionally restricted to one explanation
    async fn list_animations(&self, explanation_id: Option<i64>) -> Result<Vec<Animation>>;

    /// Fetch one animation
    async fn get_animation(&self, animation_id: i64) -> Result<Animation>;
}
