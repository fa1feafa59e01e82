//! Core domain types for chalkboard
//!
//! These types mirror the wire format of the whiteboard-teaching backend:
//! a `Session` holds a conversation, each question asked in it becomes an
//! `Explanation`, and each explanation may grow zero or more rendered
//! `Animation`s. Explanations and animations are produced asynchronously
//! on the server, so both carry their own generation status; the client
//! only ever observes status values, it never drives them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Session** | A top-level conversation/topic container, addressed externally by an opaque `session_id` string |
//! | **Explanation** | One question-answer unit within a Session, generated asynchronously |
//! | **Animation** | One rendered video artifact tied to an Explanation, generated asynchronously |
//! | **Snapshot** | The aggregator's atomically-published view of one session's full entity graph |
//!
//! ### Two identifiers per session
//!
//! A `Session` carries both an internal numeric `id` and an opaque external
//! `session_id`. URLs and explanation-creation requests use the opaque
//! string; the numeric id only appears as the foreign key on explanations
//! returned by the server. The two must not be mixed up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum accepted question length, in characters
pub const MAX_QUESTION_LEN: usize = 1000;

/// Validate question text before it is allowed near the network.
///
/// Returns the trimmed text. Blank (after trimming) or over-length input
/// is an [`Error::Validation`].
pub fn validate_question(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("question must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_QUESTION_LEN {
        return Err(Error::Validation(format!(
            "question exceeds {} characters",
            MAX_QUESTION_LEN
        )));
    }
    Ok(trimmed.to_string())
}

// ============================================
// Sessions
// ============================================

/// A session: one conversation/topic container.
///
/// Immutable from the client's perspective once created; the client never
/// edits a session, and deletion is an explicit separate operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Internal numeric identifier (foreign-key target for explanations)
    pub id: i64,
    /// Opaque external identifier, used in URLs
    pub session_id: String,
    /// Human-friendly title
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Extensible metadata
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// When the session was last updated (if ever)
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request payload for creating a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

// ============================================
// Explanations
// ============================================

/// Server-side generation status of an explanation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationStatus {
    /// Accepted, waiting for a worker
    Pending,
    /// A worker is generating the explanation text
    Processing,
    /// Explanation text is ready
    Completed,
    /// Generation failed
    Failed,
}

impl ExplanationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplanationStatus::Pending => "pending",
            ExplanationStatus::Processing => "processing",
            ExplanationStatus::Completed => "completed",
            ExplanationStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ExplanationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExplanationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExplanationStatus::Pending),
            "processing" => Ok(ExplanationStatus::Processing),
            "completed" => Ok(ExplanationStatus::Completed),
            "failed" => Ok(ExplanationStatus::Failed),
            _ => Err(format!("unknown explanation status: {}", s)),
        }
    }
}

/// One question-answer unit within a session.
///
/// `explanation_text` is populated asynchronously; until `status` is
/// `Completed` it is normally absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// Unique identifier
    pub id: i64,
    /// Numeric FK to [`Session::id`] (NOT the opaque `session_id` string)
    pub session_id: i64,
    /// The question as originally asked
    pub question: String,
    /// Generated explanation text, once available
    pub explanation_text: Option<String>,
    /// Current generation status
    pub status: ExplanationStatus,
    /// Which LLM provider produced the text (if known)
    pub llm_provider: Option<String>,
    /// Extensible metadata
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// When the question was submitted
    pub created_at: DateTime<Utc>,
    /// When the explanation last changed (if ever)
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request payload for submitting a question.
///
/// Addresses the session by its opaque external id, unlike the numeric FK
/// that comes back on [`Explanation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExplanation {
    pub session_id: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

// ============================================
// Animations
// ============================================

/// Server-side generation status of an animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationStatus {
    /// Queued for rendering
    Pending,
    /// Rendering in progress
    Generating,
    /// Video is ready to play
    Completed,
    /// Rendering failed
    Failed,
}

impl AnimationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationStatus::Pending => "pending",
            AnimationStatus::Generating => "generating",
            AnimationStatus::Completed => "completed",
            AnimationStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AnimationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AnimationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AnimationStatus::Pending),
            "generating" => Ok(AnimationStatus::Generating),
            "completed" => Ok(AnimationStatus::Completed),
            "failed" => Ok(AnimationStatus::Failed),
            _ => Err(format!("unknown animation status: {}", s)),
        }
    }
}

/// Classification of an animation.
///
/// Advisory only: the client renders all types identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationType {
    Mathematical,
    Conceptual,
    Procedural,
    Interactive,
}

impl AnimationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationType::Mathematical => "mathematical",
            AnimationType::Conceptual => "conceptual",
            AnimationType::Procedural => "procedural",
            AnimationType::Interactive => "interactive",
        }
    }
}

impl std::fmt::Display for AnimationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AnimationType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mathematical" => Ok(AnimationType::Mathematical),
            "conceptual" => Ok(AnimationType::Conceptual),
            "procedural" => Ok(AnimationType::Procedural),
            "interactive" => Ok(AnimationType::Interactive),
            _ => Err(format!("unknown animation type: {}", s)),
        }
    }
}

/// One rendered video artifact tied to an explanation.
///
/// An explanation can be `Completed` while its animations are still
/// `Generating`; the two status machines are independent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animation {
    /// Unique identifier
    pub id: i64,
    /// FK to [`Explanation::id`]
    pub explanation_id: i64,
    /// Human-friendly title
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Advisory classification
    pub animation_type: AnimationType,
    /// Current rendering status
    pub status: AnimationStatus,
    /// Server-side path of the rendered video (informational)
    pub file_path: Option<String>,
    /// Video duration in seconds, once rendered
    pub duration: Option<f64>,
    /// Server-side path of the thumbnail (informational)
    pub thumbnail_path: Option<String>,
    /// Generation source the renderer executed
    pub manim_code: Option<String>,
    /// Extensible metadata
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// When the animation was requested
    pub created_at: DateTime<Utc>,
    /// When the animation last changed (if ever)
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request payload for requesting a new animation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnimation {
    pub explanation_id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub animation_type: AnimationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trip() {
        for s in ["pending", "processing", "completed", "failed"] {
            assert_eq!(ExplanationStatus::from_str(s).unwrap().as_str(), s);
        }
        for s in ["pending", "generating", "completed", "failed"] {
            assert_eq!(AnimationStatus::from_str(s).unwrap().as_str(), s);
        }
        for s in ["mathematical", "conceptual", "procedural", "interactive"] {
            assert_eq!(AnimationType::from_str(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn test_unknown_status_is_an_error() {
        assert!(ExplanationStatus::from_str("done").is_err());
        assert!(AnimationStatus::from_str("rendering").is_err());
        assert!(AnimationType::from_str("abstract").is_err());
        // Closed variants on the wire too: unknown strings must not deserialize
        assert!(serde_json::from_str::<ExplanationStatus>("\"done\"").is_err());
        assert!(serde_json::from_str::<AnimationStatus>("\"rendering\"").is_err());
    }

    #[test]
    fn test_parse_explanation_from_wire() {
        let json = r#"{
            "id": 7,
            "session_id": 3,
            "question": "What is entropy?",
            "explanation_text": null,
            "status": "processing",
            "llm_provider": null,
            "metadata": {},
            "created_at": "2024-06-01T10:00:00Z",
            "updated_at": null
        }"#;
        let explanation: Explanation = serde_json::from_str(json).unwrap();
        assert_eq!(explanation.id, 7);
        assert_eq!(explanation.session_id, 3);
        assert_eq!(explanation.status, ExplanationStatus::Processing);
        assert!(explanation.explanation_text.is_none());
    }

    #[test]
    fn test_parse_animation_from_wire() {
        let json = r#"{
            "id": 12,
            "explanation_id": 7,
            "title": "Entropy spreading",
            "description": "Particles in a box",
            "animation_type": "conceptual",
            "status": "completed",
            "file_path": "/media/videos/12.mp4",
            "duration": 42.5,
            "thumbnail_path": "/media/thumbs/12.png",
            "manim_code": "class Entropy(Scene): ...",
            "metadata": null,
            "created_at": "2024-06-01T10:05:00Z",
            "updated_at": "2024-06-01T10:09:30Z"
        }"#;
        let animation: Animation = serde_json::from_str(json).unwrap();
        assert_eq!(animation.explanation_id, 7);
        assert_eq!(animation.animation_type, AnimationType::Conceptual);
        assert_eq!(animation.status, AnimationStatus::Completed);
        assert_eq!(animation.duration, Some(42.5));
    }

    #[test]
    fn test_create_explanation_uses_opaque_session_id() {
        let req = CreateExplanation {
            session_id: "abc123".to_string(),
            question: "What is entropy?".to_string(),
            metadata: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["session_id"], "abc123");
        assert_eq!(json["question"], "What is entropy?");
        // metadata is omitted entirely when absent
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_validate_question() {
        assert_eq!(validate_question("  What is entropy?  ").unwrap(), "What is entropy?");
        assert!(validate_question("").is_err());
        assert!(validate_question("   \n\t ").is_err());

        let long = "x".repeat(MAX_QUESTION_LEN);
        assert!(validate_question(&long).is_ok());
        let too_long = "x".repeat(MAX_QUESTION_LEN + 1);
        assert!(validate_question(&too_long).is_err());
    }
}
