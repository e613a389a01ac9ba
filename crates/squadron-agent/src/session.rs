// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session continuity tracking.
//!
//! Each session owns an append-only list of routing decision summaries and
//! the handoffs between responders. Records live behind a per-session async
//! mutex inside a sharded map, so writers on one session queue up in arrival
//! order (tokio's mutex is fair) while different sessions never contend.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use squadron_core::{DecisionSummary, Handoff, RoutingDecision, SessionContext};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::{debug, info};

struct SessionRecord {
    decisions: Vec<DecisionSummary>,
    handoffs: Vec<Handoff>,
    last_active: Instant,
}

impl SessionRecord {
    fn new() -> Self {
        Self {
            decisions: Vec::new(),
            handoffs: Vec::new(),
            last_active: Instant::now(),
        }
    }

    fn context(&self, session_id: &str, window: usize) -> SessionContext {
        let start = self.decisions.len().saturating_sub(window);
        SessionContext {
            session_id: session_id.to_string(),
            recent: self.decisions[start..].to_vec(),
            handoff_count: self.handoffs.len(),
        }
    }

    fn append(&mut self, session_id: &str, decision: &RoutingDecision) -> Option<Handoff> {
        let summary = decision.summary(Utc::now());
        let handoff = match self.decisions.last() {
            Some(previous) if previous.responder_id != summary.responder_id => Some(Handoff {
                from: previous.responder_id.clone(),
                to: summary.responder_id.clone(),
                at: summary.timestamp,
            }),
            _ => None,
        };

        if let Some(h) = &handoff {
            info!(
                session_id,
                from = %h.from,
                to = %h.to,
                "session handed off to a different responder"
            );
            self.handoffs.push(h.clone());
        }

        debug!(
            session_id,
            responder = %summary.responder_id,
            tier = %summary.tier_name,
            "routing decision recorded"
        );
        self.decisions.push(summary);
        self.last_active = Instant::now();
        handoff
    }
}

/// Exclusive access to one session for the duration of a request.
///
/// Dropping the guard releases the session to the next waiter.
pub struct SessionGuard {
    session_id: String,
    context_window: usize,
    record: OwnedMutexGuard<SessionRecord>,
}

impl SessionGuard {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Bounded context for classification and invocation.
    pub fn context(&self) -> SessionContext {
        self.record.context(&self.session_id, self.context_window)
    }

    /// Append a decision. Returns the handoff it caused, if any.
    pub fn record_decision(&mut self, decision: &RoutingDecision) -> Option<Handoff> {
        self.record.append(&self.session_id, decision)
    }
}

/// Tracks routing history per session.
///
/// Records are created on first write and removed only by [`evict`](Self::evict)
/// or [`evict_idle`](Self::evict_idle); retention policy belongs to the caller.
pub struct SessionTracker {
    sessions: DashMap<String, Arc<Mutex<SessionRecord>>>,
    context_window: usize,
}

impl SessionTracker {
    /// `context_window` is the number of most recent decisions exposed by
    /// [`get_context`](Self::get_context). Values below 1 are raised to 1.
    pub fn new(context_window: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            context_window: context_window.max(1),
        }
    }

    pub fn context_window(&self) -> usize {
        self.context_window
    }

    fn record(&self, session_id: &str) -> Arc<Mutex<SessionRecord>> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SessionRecord::new())))
            .clone()
    }

    fn existing(&self, session_id: &str) -> Option<Arc<Mutex<SessionRecord>>> {
        self.sessions.get(session_id).map(|r| r.value().clone())
    }

    /// Wait for exclusive access to a session, creating it if needed.
    pub async fn lock_session(&self, session_id: &str) -> SessionGuard {
        let record = self.record(session_id).lock_owned().await;
        SessionGuard {
            session_id: session_id.to_string(),
            context_window: self.context_window,
            record,
        }
    }

    /// Append a decision to a session's history.
    pub async fn record_decision(
        &self,
        session_id: &str,
        decision: &RoutingDecision,
    ) -> Option<Handoff> {
        self.lock_session(session_id).await.record_decision(decision)
    }

    /// Bounded summary of a session. Unknown sessions yield an empty context.
    pub async fn get_context(&self, session_id: &str) -> SessionContext {
        match self.existing(session_id) {
            Some(record) => record.lock().await.context(session_id, self.context_window),
            None => SessionContext::empty(session_id),
        }
    }

    /// Full decision history, oldest first.
    pub async fn history(&self, session_id: &str) -> Vec<DecisionSummary> {
        match self.existing(session_id) {
            Some(record) => record.lock().await.decisions.clone(),
            None => Vec::new(),
        }
    }

    pub async fn handoffs(&self, session_id: &str) -> Vec<Handoff> {
        match self.existing(session_id) {
            Some(record) => record.lock().await.handoffs.clone(),
            None => Vec::new(),
        }
    }

    /// Drop a session. Returns whether it was removed.
    ///
    /// A session that is locked, or that a request is waiting on, stays in
    /// place and this returns `false`. Evicting it would let a later request
    /// open a fresh record and run alongside the one in flight.
    pub fn evict(&self, session_id: &str) -> bool {
        let removed = self
            .sessions
            .remove_if(session_id, |_, record| is_unused(record))
            .is_some();
        if removed {
            debug!(session_id, "session evicted");
        } else if self.sessions.contains_key(session_id) {
            debug!(session_id, "session busy, not evicted");
        }
        removed
    }

    /// Drop sessions idle for at least `max_idle`. Sessions with a request in
    /// flight are kept. Returns the number evicted.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, record| {
            if !is_unused(record) {
                return true;
            }
            match record.try_lock() {
                Ok(r) => r.last_active.elapsed() < max_idle,
                Err(_) => true,
            }
        });
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            info!(evicted, "idle sessions evicted");
        }
        evicted
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// No guard, waiter or reader holds the record besides the map itself.
/// Only meaningful while the map shard is locked, so no new clone can appear.
fn is_unused(record: &Arc<Mutex<SessionRecord>>) -> bool {
    Arc::strong_count(record) == 1
}
