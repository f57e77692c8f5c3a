//! Locally held, de-duplicated view over the backend's pending notifications.
//!
//! The held sequence behaves as a set keyed by notification id, not a queue:
//! a poll only ever appends ids it has not seen, and only `remove` takes
//! entries away. Re-delivery of an id after a local removal is expected and
//! re-adds it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use kilo_core::classify::classify;
use kilo_core::notification::{Notification, NotificationId};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::client::ReminderClient;
use crate::error::NotifyError;

/// Callback invoked with the full ordered sequence after every change.
pub type Listener = Arc<dyn Fn(&[Notification]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What a single `poll()` did. Never an error from the caller's point of view.
#[derive(Debug)]
pub enum PollOutcome {
    /// Response merged. `added` new entries, `dropped` malformed items.
    Merged { added: usize, dropped: usize },
    /// Another poll was still in flight; no request was issued.
    Skipped,
    /// Request or body failed; held state is unchanged.
    Failed(NotifyError),
    /// Reconciler was shut down before the response arrived.
    Discarded,
}

struct Inner {
    client: ReminderClient,
    held: Mutex<Vec<Notification>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
    polling: AtomicBool,
    shutdown: CancellationToken,
}

/// Shared handle; clones observe and mutate the same held sequence.
#[derive(Clone)]
pub struct Reconciler {
    inner: Arc<Inner>,
}

impl Reconciler {
    pub fn new(client: ReminderClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                held: Mutex::new(Vec::new()),
                listeners: Mutex::new(Vec::new()),
                next_subscription: AtomicU64::new(1),
                polling: AtomicBool::new(false),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn client(&self) -> &ReminderClient {
        &self.inner.client
    }

    /// Fetches pending notifications and merges unseen ids.
    ///
    /// Overlapping calls are serialized: while one poll is in flight, any
    /// other returns `Skipped` without touching the network.
    pub async fn poll(&self) -> PollOutcome {
        if self.is_shut_down() {
            return PollOutcome::Discarded;
        }
        let Some(_guard) = PollGuard::acquire(&self.inner.polling) else {
            tracing::debug!("poll skipped: previous poll still in flight");
            return PollOutcome::Skipped;
        };

        let started = Instant::now();
        let result = self.inner.client.fetch_pending().await;

        if self.is_shut_down() {
            tracing::debug!("discarding poll response received after shutdown");
            return PollOutcome::Discarded;
        }

        match result {
            Ok(items) => {
                let outcome = self.merge_items(items, Utc::now());
                tracing::debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    ?outcome,
                    "pending poll merged"
                );
                outcome
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    code = e.code(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "pending poll failed; keeping current notifications"
                );
                PollOutcome::Failed(e)
            }
        }
    }

    /// Classifies raw items and appends the ones whose ids are not held yet.
    pub fn merge_items(&self, items: Vec<Value>, now: DateTime<Utc>) -> PollOutcome {
        if self.is_shut_down() {
            return PollOutcome::Discarded;
        }

        let mut dropped = 0;
        let classified: Vec<Notification> = items
            .iter()
            .filter_map(|raw| match classify(raw, now) {
                Ok(n) => Some(n),
                Err(e) => {
                    dropped += 1;
                    tracing::warn!(
                        error = %e,
                        code = e.code(),
                        item = %raw,
                        "dropping malformed notification"
                    );
                    None
                }
            })
            .collect();

        let (added, snapshot) = {
            let mut held = self.lock_held();
            let added = merge_new(&mut held, classified);
            (added, held.clone())
        };

        if added > 0 {
            tracing::info!(added, held = snapshot.len(), "new notifications");
        }
        self.notify(&snapshot);
        PollOutcome::Merged { added, dropped }
    }

    /// Drops the entry with `id`. Returns `false` (and notifies nobody) when absent.
    pub fn remove(&self, id: NotificationId) -> bool {
        if self.is_shut_down() {
            tracing::debug!(notification_id = id, "ignoring remove after shutdown");
            return false;
        }

        let snapshot = {
            let mut held = self.lock_held();
            let Some(pos) = held.iter().position(|n| n.id == id) else {
                return false;
            };
            held.remove(pos);
            held.clone()
        };

        tracing::debug!(notification_id = id, held = snapshot.len(), "notification removed");
        self.notify(&snapshot);
        true
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&[Notification]) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.inner.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(sub, _)| *sub != id);
        listeners.len() != before
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock_held().clone()
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.lock_held().iter().find(|n| n.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock_held().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tears the reconciler down. In-flight responses are discarded afterwards.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    fn lock_held(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.inner.held.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Listeners run after the held lock is released so they may call back
    // into `remove` or `snapshot`.
    fn notify(&self, snapshot: &[Notification]) {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

/// Appends notifications whose ids are not yet held, preserving arrival order.
/// Duplicates inside `incoming` keep their first occurrence.
pub fn merge_new(held: &mut Vec<Notification>, incoming: Vec<Notification>) -> usize {
    let mut seen: HashSet<NotificationId> = held.iter().map(|n| n.id).collect();
    let before = held.len();
    held.extend(incoming.into_iter().filter(|n| seen.insert(n.id)));
    held.len() - before
}

/// Clears the in-flight flag even when the poll future is dropped mid-request.
struct PollGuard<'a>(&'a AtomicBool);

impl<'a> PollGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PollGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
