//! Session/build state synchronizer.
//!
//! Owns the client-side view of the service: the session list, the active
//! conversation and its transcript, the latest build, and the in-flight/error
//! flags. State is only mutated through the operations below, and every
//! mutation is applied and published in one critical section, so observers
//! never see a half-applied update.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::client::RemoteService;
use crate::models::{Build, Message, Role, Session};

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub sessions: Vec<Session>,
    pub active_session_id: Option<String>,
    pub transcript: Vec<Message>,
    pub active_build: Option<Build>,
    pub in_flight: bool,
    pub last_error: Option<String>,
}

/// How a `send_message` call resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The turn was appended and the reply's build (if any) adopted.
    Sent,
    /// The service accepted the turn, but the conversation it belongs to was
    /// no longer displayed by then; the transcript was left alone.
    Superseded,
    /// The request failed; only `last_error` changed.
    Failed,
    /// Empty content or another send still in flight. Nothing was issued.
    Ignored,
}

struct Inner {
    state: AppState,
    /// Bumped whenever the displayed conversation is swapped out. Only consulted
    /// for sends issued from a new chat, which have no session id to compare.
    view_epoch: u64,
    /// Bumped for every `select_session` call and by `start_new_session`.
    select_ticket: u64,
}

pub struct Synchronizer {
    service: Arc<dyn RemoteService>,
    inner: Mutex<Inner>,
    tx: watch::Sender<AppState>,
}

impl Synchronizer {
    pub fn new(service: Arc<dyn RemoteService>) -> Self {
        let (tx, _rx) = watch::channel(AppState::default());
        Self {
            service,
            inner: Mutex::new(Inner {
                state: AppState::default(),
                view_epoch: 0,
                select_ticket: 0,
            }),
            tx,
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> AppState {
        self.lock().state.clone()
    }

    /// Receiver that yields every committed state.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `f` and publish the result while still holding the lock.
    fn commit<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.lock();
        let out = f(&mut inner);
        let next = inner.state.clone();
        self.tx.send_if_modified(|published| {
            if *published == next {
                false
            } else {
                *published = next;
                true
            }
        });
        out
    }

    // --------------------------------------------------------------------
    // Operations
    // --------------------------------------------------------------------

    /// Replace the session list. On failure the old list stays and the error
    /// is recorded.
    pub async fn load_session_list(&self) {
        match self.service.list_sessions().await {
            Ok(sessions) => {
                tracing::debug!(count = sessions.len(), "Session list refreshed");
                self.commit(|inner| inner.state.sessions = sessions);
            }
            Err(e) => {
                tracing::warn!(kind = e.kind(), "Failed to load sessions: {}", e);
                self.commit(|inner| inner.state.last_error = Some(e.to_string()));
            }
        }
    }

    /// Switch to session `id`. Transcript, build and active id change together
    /// on success; on failure nothing but `last_error` changes. If another
    /// select (or a new session) was started meanwhile, the response is dropped.
    pub async fn select_session(&self, id: &str) {
        let ticket = self.commit(|inner| {
            inner.select_ticket += 1;
            inner.state.last_error = None;
            inner.select_ticket
        });

        let result = self.service.get_session_detail(id).await;

        self.commit(|inner| {
            if inner.select_ticket != ticket {
                tracing::info!(session_id = %id, "Discarding superseded session load");
                return;
            }
            match result {
                Ok(detail) => {
                    tracing::info!(
                        session_id = %id,
                        messages = detail.messages.len(),
                        has_build = detail.build.is_some(),
                        "Session selected"
                    );
                    inner.state.transcript = detail.messages;
                    inner.state.active_build = detail.build;
                    inner.state.active_session_id = Some(id.to_string());
                    inner.view_epoch += 1;
                }
                Err(e) => {
                    tracing::warn!(session_id = %id, kind = e.kind(), "Failed to load session: {}", e);
                    inner.state.last_error = Some(e.to_string());
                }
            }
        });
    }

    /// Clear the active conversation. No request is made; the service creates
    /// the session on the first send.
    pub fn start_new_session(&self) {
        self.commit(|inner| {
            inner.view_epoch += 1;
            inner.select_ticket += 1;
            inner.state.active_session_id = None;
            inner.state.transcript.clear();
            inner.state.active_build = None;
            inner.state.last_error = None;
        });
        tracing::debug!("Started new session");
    }

    /// Send one user turn.
    ///
    /// At most one send is outstanding at a time; calls made while one is in
    /// flight, or with blank content, return `Ignored` without touching state.
    /// Both sides of the turn are appended only once the service replies.
    pub async fn send_message(self: &Arc<Self>, content: &str) -> SendOutcome {
        let content = content.trim();
        if content.is_empty() {
            return SendOutcome::Ignored;
        }

        let issued = self.commit(|inner| {
            if inner.state.in_flight {
                return None;
            }
            inner.state.in_flight = true;
            inner.state.last_error = None;
            Some((inner.state.active_session_id.clone(), inner.view_epoch))
        });
        let Some((session_id, epoch)) = issued else {
            tracing::debug!("Send ignored: another send is in flight");
            return SendOutcome::Ignored;
        };

        tracing::info!(session_id = ?session_id, "Sending chat turn");
        let result = self
            .service
            .send_chat_turn(session_id.as_deref(), content)
            .await;

        let outcome = self.commit(|inner| {
            inner.state.in_flight = false;
            let still_active = match &session_id {
                Some(target) => inner.state.active_session_id.as_deref() == Some(target.as_str()),
                None => inner.view_epoch == epoch,
            };
            match result {
                Ok(reply) if still_active => {
                    tracing::info!(
                        session_id = %reply.session_id,
                        has_build = reply.build.is_some(),
                        "Chat turn completed"
                    );
                    inner.state.active_session_id = Some(reply.session_id);
                    inner.state.transcript.push(Message::now(Role::User, content));
                    inner.state.transcript.push(Message::now(Role::Assistant, reply.reply));
                    if let Some(build) = reply.build {
                        inner.state.active_build = Some(build);
                    }
                    SendOutcome::Sent
                }
                Ok(reply) => {
                    tracing::info!(
                        session_id = %reply.session_id,
                        "Reply arrived after the conversation was switched; not merged"
                    );
                    SendOutcome::Superseded
                }
                Err(e) => {
                    tracing::warn!(kind = e.kind(), "Chat turn failed: {}", e);
                    inner.state.last_error = Some(e.to_string());
                    SendOutcome::Failed
                }
            }
        });

        if matches!(outcome, SendOutcome::Sent | SendOutcome::Superseded) {
            let this = Arc::clone(self);
            tokio::spawn(async move {
                this.load_session_list().await;
            });
        }

        outcome
    }
}
