//! Session aggregation and polling
//!
//! The backend processes questions in stages (question → explanation text →
//! rendered animations), each stage progressing independently on the
//! server. This module keeps a client-side view of one session converged
//! with that pipeline by re-fetching the session's full entity graph on a
//! fixed interval and publishing it as an atomic [`SessionSnapshot`].
//!
//! ## Protocol
//!
//! One refresh cycle:
//! 1. Fetch the session and its explanation list concurrently.
//! 2. Fan out one animation listing per explanation; join all of them
//!    before the result counts as valid. Latency is bounded by the slowest
//!    single fetch, not the sum.
//! 3. Replace the published snapshot wholesale. A failed cycle publishes
//!    nothing: consumers keep the previous consistent view rather than
//!    seeing a partial one.
//!
//! A `NotFound` during refresh means the session was deleted out from
//! under us. That is terminal: the poller publishes [`SessionState::Gone`]
//! and stops. Any other failure is logged and the next cycle proceeds on
//! schedule.
//!
//! Only one refresh is ever in flight per subscription. Ticks that would
//! overlap a running refresh are skipped, not queued. Stopping the
//! subscription never interrupts a running refresh, but its result is
//! discarded instead of published.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::Backend;
use crate::error::Result;
use crate::types::{validate_question, Animation, CreateExplanation, Explanation, Session};

/// One session's full entity graph at a point in time.
///
/// Always internally consistent: every explanation belongs to `session`,
/// every animation belongs to one of `explanations`. Rows that violate
/// this (stale reads during concurrent deletes) are dropped at assembly.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session: Session,
    pub explanations: Vec<Explanation>,
    pub animations: Vec<Animation>,
}

impl SessionSnapshot {
    /// Animations belonging to one explanation, in fetch order
    pub fn animations_for(&self, explanation_id: i64) -> Vec<&Animation> {
        self.animations
            .iter()
            .filter(|a| a.explanation_id == explanation_id)
            .collect()
    }
}

/// What a subscription currently knows about its session
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No refresh cycle has succeeded yet
    #[default]
    Loading,
    /// Latest complete snapshot
    Ready(SessionSnapshot),
    /// The session no longer exists on the backend; polling has stopped
    Gone,
}

impl SessionState {
    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        match self {
            SessionState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_gone(&self) -> bool {
        matches!(self, SessionState::Gone)
    }
}

/// Fetch one consistent snapshot of a session's entity graph.
///
/// Session and explanation list are fetched concurrently; animation lists
/// fan out per explanation and are joined before returning.
pub async fn fetch_snapshot(backend: &dyn Backend, session_id: &str) -> Result<SessionSnapshot> {
    let (session, explanations) = tokio::try_join!(
        backend.get_session(session_id),
        backend.list_explanations(Some(session_id)),
    )?;

    // An explanation whose FK does not resolve to this session is a stale
    // read; discard it rather than publish an inconsistent graph
    let explanations: Vec<Explanation> = explanations
        .into_iter()
        .filter(|e| e.session_id == session.id)
        .collect();

    let animation_lists = future::try_join_all(
        explanations
            .iter()
            .map(|e| backend.list_animations(Some(e.id))),
    )
    .await?;

    let known: HashSet<i64> = explanations.iter().map(|e| e.id).collect();
    let animations: Vec<Animation> = animation_lists
        .into_iter()
        .flatten()
        .filter(|a| known.contains(&a.explanation_id))
        .collect();

    Ok(SessionSnapshot {
        session,
        explanations,
        animations,
    })
}

/// Factory for session subscriptions
pub struct SessionAggregator {
    backend: Arc<dyn Backend>,
    interval: Duration,
}

impl SessionAggregator {
    pub fn new(backend: Arc<dyn Backend>, interval: Duration) -> Self {
        Self { backend, interval }
    }

    /// Start observing a session.
    ///
    /// The first refresh runs immediately, then every poll interval until
    /// the subscription is stopped or the session disappears. The poll
    /// task is spawned on the ambient tokio runtime, so this must be
    /// called from within one.
    pub fn subscribe(&self, session_id: &str) -> Subscription {
        let (state_tx, state_rx) = watch::channel(SessionState::Loading);
        // Capacity 1: queued nudges coalesce instead of piling up
        let (refresh_tx, mut refresh_rx) = mpsc::channel::<()>(1);
        let stopped = Arc::new(AtomicBool::new(false));
        let stop_notify = Arc::new(Notify::new());

        let backend = Arc::clone(&self.backend);
        let session_id = session_id.to_string();
        let handle = SessionHandle {
            backend: Arc::clone(&backend),
            session_id: session_id.clone(),
            refresh_tx,
        };

        let task = {
            let session_id = session_id.clone();
            let stopped = Arc::clone(&stopped);
            let stop_notify = Arc::clone(&stop_notify);
            let interval = self.interval;

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                // A tick landing while a refresh is in flight is dropped,
                // not queued; the next one fires on the normal cadence
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        _ = stop_notify.notified() => break,
                        _ = ticker.tick() => {}
                        Some(()) = refresh_rx.recv() => {}
                    }

                    if stopped.load(Ordering::SeqCst) {
                        break;
                    }

                    match fetch_snapshot(backend.as_ref(), &session_id).await {
                        Ok(snapshot) => {
                            // A refresh that outlived the subscription is
                            // discarded, never published
                            if stopped.load(Ordering::SeqCst) {
                                break;
                            }
                            let _ = state_tx.send(SessionState::Ready(snapshot));
                        }
                        Err(e) if e.is_not_found() => {
                            tracing::warn!(
                                session_id = %session_id,
                                "session vanished, stopping poller"
                            );
                            if !stopped.load(Ordering::SeqCst) {
                                let _ = state_tx.send(SessionState::Gone);
                            }
                            break;
                        }
                        Err(e) => {
                            // Transient: keep the previous snapshot intact
                            // and stay on schedule
                            tracing::warn!(
                                session_id = %session_id,
                                error = %e,
                                "refresh failed, keeping previous snapshot"
                            );
                        }
                    }
                }

                tracing::debug!(session_id = %session_id, "session poller exited");
            })
        };

        Subscription {
            session_id,
            handle,
            state_rx,
            stopped,
            stop_notify,
            task,
        }
    }
}

/// A live subscription to one session's snapshots
pub struct Subscription {
    session_id: String,
    handle: SessionHandle,
    state_rx: watch::Receiver<SessionState>,
    stopped: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current state (cheap clone of the watch value)
    pub fn state(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// A receiver suitable for driving a render loop
    pub fn state_receiver(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Wait until the published state changes.
    ///
    /// Returns `false` once no further change can arrive.
    pub async fn changed(&mut self) -> bool {
        self.state_rx.changed().await.is_ok()
    }

    /// Handle for submissions and out-of-schedule refreshes, usable after
    /// the subscription itself has been handed elsewhere
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Stop polling.
    ///
    /// Deterministic: no snapshot will be published after this returns. A
    /// refresh already in flight runs to completion but its result is
    /// dropped.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.stop_notify.notify_one();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Cheaply clonable handle for acting on an observed session
#[derive(Clone)]
pub struct SessionHandle {
    backend: Arc<dyn Backend>,
    session_id: String,
    refresh_tx: mpsc::Sender<()>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Submit a question to this session.
    ///
    /// Validates locally first (nothing blank or over-length reaches the
    /// network), creates the explanation, then nudges the poller for one
    /// immediate refresh so the new row shows up without waiting for the
    /// next tick. The submission result is reported regardless of how that
    /// refresh goes.
    pub async fn submit_question(&self, text: &str) -> Result<Explanation> {
        let question = validate_question(text)?;

        let created = self
            .backend
            .create_explanation(&CreateExplanation {
                session_id: self.session_id.clone(),
                question,
                metadata: None,
            })
            .await?;

        self.request_refresh();
        Ok(created)
    }

    /// Ask the poller to refresh now instead of at the next tick.
    ///
    /// Fire-and-forget; coalesces when a nudge is already pending.
    pub fn request_refresh(&self) {
        let _ = self.refresh_tx.try_send(());
    }
}
