//! Integration tests for the session aggregation flow
//!
//! These drive the public API end to end against a scripted in-memory
//! backend: subscribe to a session, watch the view converge as the
//! server-side generation pipeline progresses, submit a follow-up
//! question, and watch the view go terminal when the session disappears.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chalkboard_core::{
    Animation, AnimationStatus, AnimationType, Backend, CreateAnimation, CreateExplanation,
    CreateSession, Error, Explanation, ExplanationStatus, Result, Session, SessionAggregator,
    SessionState, Subscription,
};
use chrono::{TimeZone, Utc};
use tokio::time::timeout;

/// In-memory stand-in for the backend, mutated by tests between polls
/// the way real server-side workers would mutate the database.
struct FakeServer {
    inner: Mutex<ServerState>,
}

struct ServerState {
    session: Option<Session>,
    explanations: Vec<Explanation>,
    animations: HashMap<i64, Vec<Animation>>,
    next_explanation_id: i64,
}

impl FakeServer {
    fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(ServerState {
                session: Some(session),
                explanations: Vec::new(),
                animations: HashMap::new(),
                next_explanation_id: 1,
            }),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut ServerState) -> R) -> R {
        f(&mut self.inner.lock().unwrap())
    }
}

#[async_trait]
impl Backend for FakeServer {
    async fn create_session(&self, _req: &CreateSession) -> Result<Session> {
        unimplemented!("not exercised by these tests")
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        unimplemented!("not exercised by these tests")
    }

    async fn get_session(&self, session_id: &str) -> Result<Session> {
        self.with(|state| {
            state
                .session
                .clone()
                .filter(|s| s.session_id == session_id)
                .ok_or_else(|| Error::NotFound(format!("session {}", session_id)))
        })
    }

    async fn delete_session(&self, _session_id: &str) -> Result<()> {
        unimplemented!("not exercised by these tests")
    }

    async fn create_explanation(&self, req: &CreateExplanation) -> Result<Explanation> {
        self.with(|state| {
            let session = state
                .session
                .clone()
                .filter(|s| s.session_id == req.session_id)
                .ok_or_else(|| Error::NotFound(format!("session {}", req.session_id)))?;

            let explanation = Explanation {
                id: state.next_explanation_id,
                session_id: session.id,
                question: req.question.clone(),
                explanation_text: None,
                status: ExplanationStatus::Pending,
                llm_provider: None,
                metadata: req.metadata.clone(),
                created_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
                updated_at: None,
            };
            state.next_explanation_id += 1;
            state.explanations.push(explanation.clone());
            Ok(explanation)
        })
    }

    async fn list_explanations(&self, _session_id: Option<&str>) -> Result<Vec<Explanation>> {
        self.with(|state| Ok(state.explanations.clone()))
    }

    async fn get_explanation(&self, _explanation_id: i64) -> Result<Explanation> {
        unimplemented!("not exercised by these tests")
    }

    async fn create_animation(&self, _req: &CreateAnimation) -> Result<Animation> {
        unimplemented!("not exercised by these tests")
    }

    async fn list_animations(&self, explanation_id: Option<i64>) -> Result<Vec<Animation>> {
        self.with(|state| {
            Ok(explanation_id
                .and_then(|id| state.animations.get(&id).cloned())
                .unwrap_or_default())
        })
    }

    async fn get_animation(&self, _animation_id: i64) -> Result<Animation> {
        unimplemented!("not exercised by these tests")
    }
}

fn session_row() -> Session {
    Session {
        id: 1,
        session_id: "s-live".to_string(),
        title: "Entropy".to_string(),
        description: None,
        metadata: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        updated_at: None,
    }
}

fn animation_row(id: i64, explanation_id: i64, status: AnimationStatus) -> Animation {
    Animation {
        id,
        explanation_id,
        title: "Particles in a box".to_string(),
        description: None,
        animation_type: AnimationType::Conceptual,
        status,
        file_path: None,
        duration: Some(30.0),
        thumbnail_path: None,
        manim_code: None,
        metadata: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 5, 0).unwrap(),
        updated_at: None,
    }
}

/// Wait (bounded) until the subscription publishes a state matching the
/// predicate.
async fn wait_for_state(
    subscription: &mut Subscription,
    what: &str,
    predicate: impl Fn(&SessionState) -> bool,
) {
    let outcome = timeout(Duration::from_secs(2), async {
        loop {
            if predicate(&subscription.state()) {
                return;
            }
            if !subscription.changed().await {
                return;
            }
        }
    })
    .await;
    assert!(outcome.is_ok(), "timed out waiting for {}", what);
    assert!(predicate(&subscription.state()), "never observed {}", what);
}

#[tokio::test]
async fn view_converges_with_the_generation_pipeline() {
    let server = Arc::new(FakeServer::new(session_row()));
    let aggregator = SessionAggregator::new(server.clone(), Duration::from_millis(25));
    let mut subscription = aggregator.subscribe("s-live");
    let handle = subscription.handle();

    // A first question lands on the server
    handle.submit_question("What is entropy?").await.unwrap();
    wait_for_state(&mut subscription, "first explanation", |state| {
        state
            .snapshot()
            .map(|s| s.explanations.len() == 1)
            .unwrap_or(false)
    })
    .await;

    // A worker finishes the explanation and starts rendering an animation
    server.with(|state| {
        let explanation = &mut state.explanations[0];
        explanation.status = ExplanationStatus::Completed;
        explanation.explanation_text = Some("Entropy measures disorder.".to_string());
        state
            .animations
            .insert(explanation.id, vec![animation_row(10, explanation.id, AnimationStatus::Generating)]);
    });
    wait_for_state(&mut subscription, "generating animation", |state| {
        state
            .snapshot()
            .map(|s| {
                s.explanations[0].status == ExplanationStatus::Completed
                    && s.animations.len() == 1
                    && s.animations[0].status == AnimationStatus::Generating
            })
            .unwrap_or(false)
    })
    .await;

    // Rendering completes
    server.with(|state| {
        for animations in state.animations.values_mut() {
            for animation in animations {
                animation.status = AnimationStatus::Completed;
            }
        }
    });
    wait_for_state(&mut subscription, "completed animation", |state| {
        state
            .snapshot()
            .map(|s| s.animations[0].status == AnimationStatus::Completed)
            .unwrap_or(false)
    })
    .await;

    // A follow-up question shows up in the next snapshot
    handle.submit_question("And why does it grow?").await.unwrap();
    wait_for_state(&mut subscription, "follow-up explanation", |state| {
        state
            .snapshot()
            .map(|s| s.explanations.len() == 2)
            .unwrap_or(false)
    })
    .await;

    let state = subscription.state();
    let snapshot = state.snapshot().unwrap();
    assert_eq!(snapshot.explanations[1].question, "And why does it grow?");
    assert_eq!(snapshot.explanations[1].status, ExplanationStatus::Pending);

    subscription.stop();
}

#[tokio::test]
async fn deleted_session_goes_terminal() {
    let server = Arc::new(FakeServer::new(session_row()));
    let aggregator = SessionAggregator::new(server.clone(), Duration::from_millis(25));
    let mut subscription = aggregator.subscribe("s-live");

    wait_for_state(&mut subscription, "initial snapshot", |state| {
        state.snapshot().is_some()
    })
    .await;

    // The session disappears between polls
    server.with(|state| state.session = None);

    wait_for_state(&mut subscription, "terminal state", SessionState::is_gone).await;
}
