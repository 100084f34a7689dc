//! Session and lock coordination
//!
//! [`LockCoordinator`] layers session bookkeeping over the KV `acquire` and
//! `release` operations. Per session it tracks TTL, lock delay, behavior,
//! the last renewal and the keys it holds.
//!
//! Session lifecycle:
//!
//! ```text
//! Active --(TTL not renewed / check failed / destroyed)--> Invalidated
//! Invalidated --(lock delay elapsed)--> Releasable
//! ```
//!
//! When a session is invalidated every key it held is fenced until
//! `invalidated_at + lock_delay`. A different session asking for a fenced
//! key is refused locally, even if Consul already shows the key unlocked.
//!
//! Sessions with the `delete` behavior have their keys removed only while
//! Consul still shows the key locked by that session; a key that has since
//! been released or taken by another session is left alone. Sessions past
//! their lock delay are forgotten on the next TTL sweep.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use consul_api::{DEFAULT_LOCK_DELAY, Session, SessionBehavior, SessionOptions};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::KeyValueOptions;
use crate::blocking::BlockingQueryOptions;
use crate::client::ConsulClient;
use crate::error::{ConsulError, Result};

/// Lifecycle state of a tracked session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    /// Invalidated, lock delay still running
    Invalidated,
    /// Invalidated and past its lock delay
    Releasable,
}

#[derive(Debug)]
struct TrackedSession {
    ttl: Option<Duration>,
    lock_delay: Duration,
    behavior: SessionBehavior,
    last_renewed: Instant,
    held: HashSet<String>,
    invalidated_at: Option<Instant>,
}

impl TrackedSession {
    fn new(
        ttl: Option<Duration>,
        lock_delay: Duration,
        behavior: SessionBehavior,
        now: Instant,
    ) -> Self {
        Self {
            ttl,
            lock_delay,
            behavior,
            last_renewed: now,
            held: HashSet::new(),
            invalidated_at: None,
        }
    }

    fn from_session(session: &Session, now: Instant) -> Self {
        Self::new(session.ttl, session.lock_delay, session.behavior, now)
    }

    /// Instant the TTL ran out, if it has
    fn expired_at(&self, now: Instant) -> Option<Instant> {
        let deadline = self.last_renewed + self.ttl?;
        (deadline <= now).then_some(deadline)
    }

    fn state(&self, now: Instant) -> SessionState {
        match self.invalidated_at.or_else(|| self.expired_at(now)) {
            None => SessionState::Active,
            Some(at) if now >= at + self.lock_delay => SessionState::Releasable,
            Some(_) => SessionState::Invalidated,
        }
    }
}

/// Key held by an invalidated session with the `delete` behavior
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrphanedKey {
    key: String,
    session: String,
}

#[derive(Debug)]
struct Fence {
    session: String,
    until: Instant,
}

#[derive(Debug, Default)]
struct CoordinatorState {
    sessions: HashMap<String, TrackedSession>,
    fences: HashMap<String, Fence>,
}

impl CoordinatorState {
    /// Record invalidation of `id` at `at`; returns keys to delete when
    /// the session's behavior is `delete`
    fn mark_invalidated(&mut self, id: &str, at: Instant) -> Vec<OrphanedKey> {
        let Some(session) = self.sessions.get_mut(id) else {
            return Vec::new();
        };
        if session.invalidated_at.is_some() {
            return Vec::new();
        }
        session.invalidated_at = Some(at);

        let until = at + session.lock_delay;
        let held: Vec<String> = session.held.drain().collect();
        for key in &held {
            self.fences.insert(
                key.clone(),
                Fence {
                    session: id.to_string(),
                    until,
                },
            );
        }
        info!(
            "session {} invalidated, fencing {} key(s) for {:?}",
            id,
            held.len(),
            session.lock_delay
        );

        match session.behavior {
            SessionBehavior::Release => Vec::new(),
            SessionBehavior::Delete => held
                .into_iter()
                .map(|key| OrphanedKey {
                    key,
                    session: id.to_string(),
                })
                .collect(),
        }
    }

    /// Invalidate every session whose TTL ran out, then drop sessions and
    /// fences whose lock delay is over
    fn expire(&mut self, now: Instant) -> Vec<OrphanedKey> {
        let expired: Vec<(String, Instant)> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.invalidated_at.is_none())
            .filter_map(|(id, s)| s.expired_at(now).map(|at| (id.clone(), at)))
            .collect();

        let mut to_delete = Vec::new();
        for (id, at) in expired {
            debug!("session {} missed its TTL", id);
            to_delete.extend(self.mark_invalidated(&id, at));
        }
        self.prune(now);
        to_delete
    }

    fn prune(&mut self, now: Instant) {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| !(s.held.is_empty() && s.state(now) == SessionState::Releasable));
        self.fences.retain(|_, f| f.until > now);
        let dropped = before - self.sessions.len();
        if dropped > 0 {
            debug!("forgot {} releasable session(s)", dropped);
        }
    }

    /// Remaining fence on `key` against `session`
    fn fence_against(&mut self, key: &str, session: &str, now: Instant) -> Option<Duration> {
        let fence = self.fences.get(key)?;
        if now >= fence.until {
            self.fences.remove(key);
            return None;
        }
        if fence.session == session {
            return None;
        }
        Some(fence.until - now)
    }
}

/// Lock coordination over Consul sessions
#[derive(Clone)]
pub struct LockCoordinator {
    client: ConsulClient,
    state: Arc<Mutex<CoordinatorState>>,
}

impl LockCoordinator {
    pub fn new(client: ConsulClient) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(CoordinatorState::default())),
        }
    }

    pub fn client(&self) -> &ConsulClient {
        &self.client
    }

    /// Create a session and start tracking it
    pub async fn create_session(&self, options: &SessionOptions) -> Result<String> {
        let id = self.client.session().create_session(options).await?;
        let tracked = TrackedSession::new(
            options.ttl,
            options.lock_delay.unwrap_or(DEFAULT_LOCK_DELAY),
            options.behavior.unwrap_or_default(),
            Instant::now(),
        );
        self.state.lock().sessions.insert(id.clone(), tracked);
        debug!("created session {}", id);
        Ok(id)
    }

    /// Renew a TTL session. A session Consul no longer knows is invalidated.
    pub async fn renew_session(&self, id: &str) -> Result<SessionState> {
        match self.client.session().renew_session(id).await? {
            Some(session) => {
                let now = Instant::now();
                let mut state = self.state.lock();
                let tracked = state
                    .sessions
                    .entry(id.to_string())
                    .or_insert_with(|| TrackedSession::from_session(&session, now));
                if tracked.state(now) == SessionState::Active {
                    tracked.ttl = session.ttl;
                    tracked.last_renewed = now;
                } else {
                    warn!("session {} renewed after it was invalidated locally", id);
                }
                Ok(tracked.state(now))
            }
            None => {
                self.invalidate(id).await?;
                Ok(self.state_or_invalidated(id))
            }
        }
    }

    /// Re-read a session from Consul; an absent session is invalidated.
    /// Catches invalidations caused by failing health checks.
    pub async fn refresh_session(&self, id: &str) -> Result<SessionState> {
        let info = self
            .client
            .session()
            .info_session(id, &BlockingQueryOptions::new())
            .await?;
        match info.value {
            Some(session) => {
                let now = Instant::now();
                let mut state = self.state.lock();
                let tracked = state
                    .sessions
                    .entry(id.to_string())
                    .or_insert_with(|| TrackedSession::from_session(&session, now));
                tracked.lock_delay = session.lock_delay;
                tracked.behavior = session.behavior;
                Ok(tracked.state(now))
            }
            None => {
                self.invalidate(id).await?;
                Ok(self.state_or_invalidated(id))
            }
        }
    }

    /// Destroy a session. Consul applies its behavior to held keys; the
    /// keys stay fenced locally for the lock delay.
    pub async fn destroy_session(&self, id: &str) -> Result<()> {
        self.client.session().destroy_session(id).await?;
        self.state.lock().mark_invalidated(id, Instant::now());
        Ok(())
    }

    /// Mark a session invalidated, fence its keys and apply its behavior
    pub async fn invalidate(&self, id: &str) -> Result<()> {
        let to_delete = self.state.lock().mark_invalidated(id, Instant::now());
        self.delete_keys(&to_delete).await
    }

    /// Current state of a tracked session; `None` if unknown or already
    /// forgotten after its lock delay
    pub fn session_state(&self, id: &str) -> Option<SessionState> {
        let state = self.state.lock();
        state.sessions.get(id).map(|s| s.state(Instant::now()))
    }

    /// Keys the session holds through this coordinator
    pub fn held_keys(&self, id: &str) -> Vec<String> {
        let state = self.state.lock();
        let mut keys: Vec<String> = state
            .sessions
            .get(id)
            .map(|s| s.held.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Try to lock `key` for `session`.
    ///
    /// Returns `Ok(false)` when another session holds the key or the key is
    /// still inside the lock delay of a previous holder. Fails with
    /// [`ConsulError::SessionInvalidated`] if `session` itself is no longer
    /// active.
    pub async fn acquire(
        &self,
        key: &str,
        session: &str,
        value: impl Into<Vec<u8>>,
    ) -> Result<bool> {
        self.ensure_tracked(session).await?;
        let to_delete = self.state.lock().expire(Instant::now());
        self.delete_keys(&to_delete).await?;

        {
            let now = Instant::now();
            let mut state = self.state.lock();
            let active = state
                .sessions
                .get(session)
                .map(|s| s.state(now) == SessionState::Active)
                .unwrap_or(false);
            if !active {
                return Err(ConsulError::SessionInvalidated(session.to_string()));
            }
            if let Some(remaining) = state.fence_against(key, session, now) {
                warn!(
                    "acquire of {} by {} refused: lock delay has {:?} left",
                    key, session, remaining
                );
                return Ok(false);
            }
        }

        let options = KeyValueOptions::new().with_acquire(session);
        let acquired = self
            .client
            .kv()
            .put_value(key, value, Some(&options))
            .await?;

        if acquired {
            let mut state = self.state.lock();
            state.fences.remove(key);
            if let Some(tracked) = state.sessions.get_mut(session) {
                tracked.held.insert(key.to_string());
            }
            debug!("{} acquired {}", session, key);
        } else {
            debug!("{} lost the race for {}", session, key);
        }
        Ok(acquired)
    }

    /// Release `key` held by `session`. Releasing a key the session does
    /// not hold succeeds.
    pub async fn release(&self, key: &str, session: &str) -> Result<()> {
        let options = KeyValueOptions::new().with_release(session);
        self.client
            .kv()
            .put_value(key, Vec::new(), Some(&options))
            .await?;

        if let Some(tracked) = self.state.lock().sessions.get_mut(session) {
            tracked.held.remove(key);
        }
        debug!("{} released {}", session, key);
        Ok(())
    }

    /// Learn about a session created elsewhere
    async fn ensure_tracked(&self, id: &str) -> Result<()> {
        if self.state.lock().sessions.contains_key(id) {
            return Ok(());
        }
        let info = self
            .client
            .session()
            .info_session(id, &BlockingQueryOptions::new())
            .await?;
        let session = info
            .value
            .ok_or_else(|| ConsulError::SessionInvalidated(id.to_string()))?;
        self.state
            .lock()
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| TrackedSession::from_session(&session, Instant::now()));
        Ok(())
    }

    fn state_or_invalidated(&self, id: &str) -> SessionState {
        self.session_state(id).unwrap_or(SessionState::Invalidated)
    }

    /// Delete orphaned keys that Consul still shows locked by their
    /// invalidated session, guarded by the key's modify index
    async fn delete_keys(&self, keys: &[OrphanedKey]) -> Result<()> {
        let kv = self.client.kv();
        for orphan in keys {
            let entry = kv
                .get_value(&orphan.key, &BlockingQueryOptions::new())
                .await?
                .into_value();
            match entry {
                Some(entry) if entry.session.as_deref() == Some(orphan.session.as_str()) => {
                    if kv.cas_delete(&orphan.key, entry.modify_index).await? {
                        debug!("deleted {} held by {}", orphan.key, orphan.session);
                    } else {
                        debug!("{} changed before it could be deleted", orphan.key);
                    }
                }
                _ => debug!(
                    "{} no longer held by {}, leaving it",
                    orphan.key, orphan.session
                ),
            }
        }
        Ok(())
    }
}
