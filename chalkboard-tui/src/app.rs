//! Application state for the TUI.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chalkboard_core::{
    validate_question, Animation, AnimationStatus, ApiClient, Backend, CreateExplanation,
    CreateSession, Explanation, Session, SessionAggregator, SessionState, Subscription,
    MAX_QUESTION_LEN,
};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::TableState;
use tokio::runtime::Handle;

use crate::player::PlayerState;

/// How long a status-line notice stays visible
const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Current view mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Landing view: question input + recent sessions
    #[default]
    Home,
    /// One observed session: history, animations, follow-up input
    Session,
}

/// Which panel takes j/k navigation in the session view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPane {
    #[default]
    Explanations,
    Animations,
}

/// Severity of a status-line notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient status-line message (the toast equivalent)
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    shown_at: Instant,
}

/// Results of async work spawned on the runtime, delivered back to the
/// render thread
enum UiEvent {
    SessionsLoaded(chalkboard_core::Result<Vec<Session>>),
    SessionStarted(chalkboard_core::Result<Session>),
    QuestionSubmitted(chalkboard_core::Result<Explanation>),
}

/// Main application state.
pub struct App {
    runtime: Handle,
    client: Arc<ApiClient>,
    aggregator: SessionAggregator,

    /// Current view mode
    pub view_mode: ViewMode,

    /// Recent sessions for the home view (most recent five)
    pub recent_sessions: Vec<Session>,
    /// Table selection state for the session list
    pub sessions_table: TableState,

    /// Question input buffer (shared between both views)
    pub input: String,
    /// Whether keystrokes go to the input buffer
    pub editing: bool,
    /// A submission is in flight; input is disabled until it reports back
    pub submitting: bool,

    /// Live subscription while in the session view
    subscription: Option<Subscription>,
    /// Latest observed aggregator state
    pub session_state: SessionState,
    /// Title known before the first snapshot arrives
    pub session_title: Option<String>,

    /// Focused panel in the session view
    pub pane: SessionPane,
    pub selected_explanation: usize,
    pub selected_animation: usize,

    /// Ephemeral playback state for the selected animation
    pub player: PlayerState,
    player_animation_id: Option<i64>,

    /// Transient status-line message
    pub notice: Option<Notice>,

    events_tx: Sender<UiEvent>,
    events_rx: Receiver<UiEvent>,
    last_frame: Instant,

    /// Whether the app should exit
    pub should_quit: bool,
}

impl App {
    /// Create a new App driving async work on the given runtime.
    pub fn new(runtime: Handle, client: Arc<ApiClient>, poll_interval: Duration) -> Self {
        let backend: Arc<dyn Backend> = client.clone();
        let aggregator = SessionAggregator::new(backend, poll_interval);
        let (events_tx, events_rx) = channel();

        Self {
            runtime,
            client,
            aggregator,
            view_mode: ViewMode::default(),
            recent_sessions: Vec::new(),
            sessions_table: TableState::default(),
            input: String::new(),
            editing: false,
            submitting: false,
            subscription: None,
            session_state: SessionState::Loading,
            session_title: None,
            pane: SessionPane::default(),
            selected_explanation: 0,
            selected_animation: 0,
            player: PlayerState::idle(),
            player_animation_id: None,
            notice: None,
            events_tx,
            events_rx,
            last_frame: Instant::now(),
            should_quit: false,
        }
    }

    /// Borrow the API client (the UI derives media URLs from it)
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Per-frame bookkeeping: async results, subscription state, player
    /// advancement, notice expiry.
    pub fn tick(&mut self) {
        let elapsed = self.last_frame.elapsed();
        self.last_frame = Instant::now();

        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_ui_event(event);
        }

        self.observe_subscription();
        self.player.tick(elapsed);

        if let Some(notice) = &self.notice {
            if notice.shown_at.elapsed() > NOTICE_TTL {
                self.notice = None;
            }
        }
    }

    fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::SessionsLoaded(Ok(mut sessions)) => {
                sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                sessions.truncate(5);
                self.recent_sessions = sessions;
                if !self.recent_sessions.is_empty() && self.sessions_table.selected().is_none() {
                    self.sessions_table.select(Some(0));
                }
            }
            UiEvent::SessionsLoaded(Err(e)) => {
                tracing::warn!(error = %e, "failed to load recent sessions");
            }
            UiEvent::SessionStarted(Ok(session)) => {
                self.submitting = false;
                self.input.clear();
                self.notice_info("Question submitted! Generating explanation...");
                let title = session.title.clone();
                self.open_session(&session.session_id, Some(title));
            }
            UiEvent::SessionStarted(Err(e)) => {
                self.submitting = false;
                self.notice_error(format!("Failed to submit question: {}", e));
            }
            UiEvent::QuestionSubmitted(Ok(_)) => {
                self.submitting = false;
                self.input.clear();
                self.notice_info("Question submitted!");
            }
            UiEvent::QuestionSubmitted(Err(e)) => {
                self.submitting = false;
                self.notice_error(format!("Failed to submit question: {}", e));
            }
        }
    }

    /// Pull the latest aggregator state and keep selections and the
    /// player consistent with it.
    fn observe_subscription(&mut self) {
        let Some(subscription) = &self.subscription else {
            return;
        };

        let state = subscription.state();
        if state.is_gone() {
            self.close_session();
            self.notice_error("Session not found");
            return;
        }
        self.session_state = state;

        if let Some(snapshot) = self.session_state.snapshot() {
            if self.session_title.is_none() {
                self.session_title = Some(snapshot.session.title.clone());
            }
            self.selected_explanation = self
                .selected_explanation
                .min(snapshot.explanations.len().saturating_sub(1));
            self.selected_animation = self
                .selected_animation
                .min(snapshot.animations.len().saturating_sub(1));
        }

        self.sync_player();
    }

    /// Reset or update playback state to match the selected animation.
    fn sync_player(&mut self) {
        let current: Option<Animation> = self
            .session_state
            .snapshot()
            .and_then(|s| s.animations.get(self.selected_animation))
            .cloned();

        match current {
            Some(animation) => {
                if self.player_animation_id != Some(animation.id) {
                    self.player = PlayerState::for_animation(&animation);
                    self.player_animation_id = Some(animation.id);
                } else if self.player.duration == 0.0
                    && animation.status == AnimationStatus::Completed
                {
                    // The animation finished rendering while selected
                    self.player.duration = animation.duration.unwrap_or(0.0);
                }
            }
            None => {
                self.player = PlayerState::idle();
                self.player_animation_id = None;
            }
        }
    }

    /// The animation the player panel is showing, if any
    pub fn current_animation(&self) -> Option<&Animation> {
        self.session_state
            .snapshot()
            .and_then(|s| s.animations.get(self.selected_animation))
    }

    /// Reload the recent session list in the background
    pub fn load_recent_sessions(&self) {
        let client = Arc::clone(&self.client);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = client.list_sessions().await;
            let _ = tx.send(UiEvent::SessionsLoaded(result));
        });
    }

    /// Switch to the session view and start polling
    pub fn open_session(&mut self, session_id: &str, title: Option<String>) {
        if let Some(old) = self.subscription.take() {
            old.stop();
        }
        // subscribe() spawns the poll task, so it needs the runtime context;
        // this thread is the (non-async) render loop
        let subscription = {
            let _guard = self.runtime.enter();
            self.aggregator.subscribe(session_id)
        };
        self.subscription = Some(subscription);
        self.session_state = SessionState::Loading;
        self.session_title = title;
        self.view_mode = ViewMode::Session;
        self.pane = SessionPane::Explanations;
        self.selected_explanation = 0;
        self.selected_animation = 0;
        self.player = PlayerState::idle();
        self.player_animation_id = None;
        self.editing = false;
        self.input.clear();
    }

    /// Stop polling and return to the home view
    fn close_session(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.stop();
        }
        self.session_state = SessionState::Loading;
        self.session_title = None;
        self.view_mode = ViewMode::Home;
        self.editing = false;
        self.input.clear();
        self.load_recent_sessions();
    }

    fn notice_info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            level: NoticeLevel::Info,
            shown_at: Instant::now(),
        });
    }

    fn notice_error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            level: NoticeLevel::Error,
            shown_at: Instant::now(),
        });
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.editing {
            self.handle_input_key(key);
            return;
        }
        match self.view_mode {
            ViewMode::Home => self.handle_home_key(key),
            ViewMode::Session => self.handle_session_key(key),
        }
    }

    /// Keystrokes while the question input has focus.
    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.editing = false;
            }
            KeyCode::Enter => {
                self.submit_current_input();
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => {
                if self.input.chars().count() < MAX_QUESTION_LEN {
                    self.input.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('i') => {
                self.editing = true;
            }
            KeyCode::Char('r') => {
                self.load_recent_sessions();
            }
            KeyCode::Enter => {
                if let Some(idx) = self.sessions_table.selected() {
                    if let Some(session) = self.recent_sessions.get(idx) {
                        let session_id = session.session_id.clone();
                        let title = session.title.clone();
                        self.open_session(&session_id, Some(title));
                    }
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next_session();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_previous_session();
            }
            KeyCode::Home | KeyCode::Char('g') => {
                if !self.recent_sessions.is_empty() {
                    self.sessions_table.select(Some(0));
                }
            }
            KeyCode::End | KeyCode::Char('G') => {
                if !self.recent_sessions.is_empty() {
                    self.sessions_table
                        .select(Some(self.recent_sessions.len() - 1));
                }
            }
            _ => {}
        }
    }

    fn handle_session_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.close_session();
            }
            KeyCode::Char('i') => {
                self.editing = true;
            }
            KeyCode::Tab => {
                self.pane = match self.pane {
                    SessionPane::Explanations => SessionPane::Animations,
                    SessionPane::Animations => SessionPane::Explanations,
                };
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1);
            }
            KeyCode::Char(' ') => {
                if self.playable() {
                    self.player.toggle_play();
                }
            }
            KeyCode::Char('m') => {
                if self.playable() {
                    self.player.toggle_mute();
                }
            }
            KeyCode::Char('h') | KeyCode::Left => {
                if self.playable() {
                    self.player.seek_by(-5.0);
                }
            }
            KeyCode::Char('l') | KeyCode::Right => {
                if self.playable() {
                    self.player.seek_by(5.0);
                }
            }
            KeyCode::Char('r') => {
                if self.playable() {
                    self.player.restart();
                }
            }
            _ => {}
        }
    }

    fn playable(&self) -> bool {
        self.current_animation()
            .map(|a| a.status == AnimationStatus::Completed)
            .unwrap_or(false)
    }

    fn move_selection(&mut self, delta: isize) {
        let Some(snapshot) = self.session_state.snapshot() else {
            return;
        };
        let (selected, len) = match self.pane {
            SessionPane::Explanations => (&mut self.selected_explanation, snapshot.explanations.len()),
            SessionPane::Animations => (&mut self.selected_animation, snapshot.animations.len()),
        };
        if len == 0 {
            return;
        }
        let next = (*selected as isize + delta).rem_euclid(len as isize) as usize;
        *selected = next;
        if self.pane == SessionPane::Animations {
            self.sync_player();
        }
    }

    fn select_next_session(&mut self) {
        if self.recent_sessions.is_empty() {
            return;
        }
        let i = match self.sessions_table.selected() {
            Some(i) => {
                if i >= self.recent_sessions.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.sessions_table.select(Some(i));
    }

    fn select_previous_session(&mut self) {
        if self.recent_sessions.is_empty() {
            return;
        }
        let i = match self.sessions_table.selected() {
            Some(i) => {
                if i == 0 {
                    self.recent_sessions.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.sessions_table.select(Some(i));
    }

    /// Submit the input buffer according to the current view.
    fn submit_current_input(&mut self) {
        if self.submitting {
            return;
        }
        let question = match validate_question(&self.input) {
            Ok(q) => q,
            Err(e) => {
                self.notice_error(e.to_string());
                return;
            }
        };

        match self.view_mode {
            ViewMode::Home => self.start_new_session(question),
            ViewMode::Session => self.submit_followup(question),
        }
    }

    /// Home flow: a new question creates a session and its first
    /// explanation, then opens the session view.
    fn start_new_session(&mut self, question: String) {
        self.submitting = true;
        let client = Arc::clone(&self.client);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = start_session(client.as_ref(), &question).await;
            let _ = tx.send(UiEvent::SessionStarted(result));
        });
    }

    /// Session flow: submit into the observed session; the aggregator
    /// handle nudges an immediate refresh on success.
    fn submit_followup(&mut self, question: String) {
        let Some(subscription) = &self.subscription else {
            return;
        };
        self.submitting = true;
        let handle = subscription.handle();
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = handle.submit_question(&question).await;
            let _ = tx.send(UiEvent::QuestionSubmitted(result));
        });
    }
}

/// Create a session for a fresh question and submit the question into it.
///
/// The session title is the question itself, clipped for display.
async fn start_session(client: &ApiClient, question: &str) -> chalkboard_core::Result<Session> {
    let title = if question.chars().count() > 50 {
        let head: String = question.chars().take(50).collect();
        format!("{}...", head)
    } else {
        question.to_string()
    };

    let session = client
        .create_session(&CreateSession {
            title,
            description: Some(question.to_string()),
            metadata: Some(serde_json::json!({ "created_from": "tui_home" })),
        })
        .await?;

    client
        .create_explanation(&CreateExplanation {
            session_id: session.session_id.clone(),
            question: question.to_string(),
            metadata: None,
        })
        .await?;

    Ok(session)
}
