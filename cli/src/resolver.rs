//! Per-notification resolution state machine.
//!
//! ```text
//! Idle ──resolve/dismiss──▶ Processing ──2xx──▶ Resolved (terminal, entry removed)
//!  ▲                              │
//!  └────── retry ◀── Failed ◀─────┘ transport error / non-2xx
//! ```
//!
//! Controls are disabled while `Processing`; a second call is refused
//! before any request is sent.

use std::sync::{Arc, Mutex};

use kilo_core::notification::{Notification, NotificationId};
use kilo_core::resolution::{ConfirmRequest, Resolution, ResolutionKind, SnoozeDuration};

use crate::error::{NotifyError, ResolveError};
use crate::reconciler::Reconciler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Processing,
    Resolved,
    Failed,
}

impl Phase {
    pub fn controls_enabled(self) -> bool {
        matches!(self, Self::Idle | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Menu {
    #[default]
    Choosing,
    ChoosingSnoozeDuration,
}

/// Transient input for one displayed notification. Never persisted and never
/// shared with the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub notes: String,
    pub menu: Menu,
}

impl Draft {
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn open_snooze_menu(&mut self) {
        self.menu = Menu::ChoosingSnoozeDuration;
    }

    pub fn back(&mut self) {
        self.menu = Menu::Choosing;
    }
}

/// Resolves one notification against the backend.
///
/// Clones share phase and draft, so a second handle sees `Processing` while
/// the first one's request is in flight.
#[derive(Clone)]
pub struct ActionResolver {
    notification: Notification,
    reconciler: Reconciler,
    phase: Arc<Mutex<Phase>>,
    draft: Arc<Mutex<Draft>>,
}

impl ActionResolver {
    pub fn new(notification: Notification, reconciler: Reconciler) -> Self {
        Self {
            notification,
            reconciler,
            phase: Arc::new(Mutex::new(Phase::Idle)),
            draft: Arc::new(Mutex::new(Draft::default())),
        }
    }

    pub fn notification(&self) -> &Notification {
        &self.notification
    }

    pub fn id(&self) -> NotificationId {
        self.notification.id
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn controls_enabled(&self) -> bool {
        self.phase().controls_enabled()
    }

    pub fn draft(&self) -> Draft {
        self.draft.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn update_draft(&self, f: impl FnOnce(&mut Draft)) {
        f(&mut self.draft.lock().unwrap_or_else(|e| e.into_inner()));
    }

    /// Submits a resolution with explicit notes.
    ///
    /// Invalid combinations (snooze without a duration, unsupported duration)
    /// are refused before any request. Network failures are not errors here:
    /// they yield `Ok(Phase::Failed)` so the user can retry.
    pub async fn resolve(
        &self,
        kind: ResolutionKind,
        snooze_minutes: Option<u32>,
        notes: Option<&str>,
    ) -> Result<Phase, ResolveError> {
        let resolution = Resolution::from_parts(kind, snooze_minutes)?;
        let request = ConfirmRequest::new(resolution, notes);
        let in_flight = self.begin()?;

        tracing::debug!(notification_id = self.id(), action = %kind, "submitting resolution");
        let result = self.reconciler.client().confirm(self.id(), &request).await;
        Ok(self.settle(in_flight, "confirm", result))
    }

    /// Submits a resolution using the notes typed into the draft.
    pub async fn submit(&self, resolution: Resolution) -> Result<Phase, ResolveError> {
        let notes = self.draft().notes;
        self.resolve(resolution.kind(), resolution.snooze_minutes(), Some(notes.as_str()))
            .await
    }

    /// Completes a choice from the snooze-duration menu.
    ///
    /// The menu stays open when the choice is refused.
    pub async fn choose_snooze(&self, minutes: u32) -> Result<Phase, ResolveError> {
        let duration = SnoozeDuration::try_from(minutes)?;
        let phase = self.submit(Resolution::Snoozed(duration)).await?;
        self.update_draft(Draft::back);
        Ok(phase)
    }

    /// Marks the notification read without recording an outcome.
    pub async fn dismiss(&self) -> Result<Phase, ResolveError> {
        let in_flight = self.begin()?;
        tracing::debug!(notification_id = self.id(), "dismissing notification");
        let result = self.reconciler.client().mark_read(self.id()).await;
        Ok(self.settle(in_flight, "mark_read", result))
    }

    fn begin(&self) -> Result<InFlight, ResolveError> {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        match *phase {
            Phase::Idle | Phase::Failed => {
                *phase = Phase::Processing;
                Ok(InFlight {
                    phase: Arc::clone(&self.phase),
                    settled: false,
                })
            }
            Phase::Processing => Err(ResolveError::Busy(self.id())),
            Phase::Resolved => Err(ResolveError::AlreadyResolved(self.id())),
        }
    }

    fn settle(
        &self,
        mut in_flight: InFlight,
        operation: &'static str,
        result: Result<(), NotifyError>,
    ) -> Phase {
        let next = match result {
            Ok(()) => Phase::Resolved,
            Err(e) => {
                tracing::warn!(
                    notification_id = self.id(),
                    operation,
                    error = %e,
                    code = e.code(),
                    "notification action failed; controls re-enabled"
                );
                Phase::Failed
            }
        };
        in_flight.finish(next);

        if next == Phase::Resolved {
            tracing::info!(notification_id = self.id(), operation, "notification resolved");
            self.reconciler.remove(self.id());
        }
        next
    }
}

/// Marks the resolver `Failed` if the request future is dropped before it
/// settles, so the controls never stay disabled.
struct InFlight {
    phase: Arc<Mutex<Phase>>,
    settled: bool,
}

impl InFlight {
    fn finish(&mut self, next: Phase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = next;
        self.settled = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.settled {
            *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = Phase::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ReminderClient;
    use crate::config::ClientConfig;
    use kilo_core::error::ResolutionError;
    use kilo_core::notification::Category;

    fn resolver() -> ActionResolver {
        let client = ReminderClient::new(&ClientConfig::new("http://127.0.0.1:9")).unwrap();
        let notification = Notification {
            id: 1,
            category: Category::Reminder,
            text: "Call mom".to_string(),
            occurred_at: "T1".to_string(),
            title: None,
            priority: None,
        };
        ActionResolver::new(notification, Reconciler::new(client))
    }

    #[test]
    fn fresh_resolver_starts_idle_with_default_draft() {
        let r = resolver();
        assert_eq!(r.phase(), Phase::Idle);
        assert!(r.controls_enabled());
        assert_eq!(r.draft(), Draft::default());
    }

    #[test]
    fn snooze_menu_toggles_and_back_returns_to_choosing() {
        let r = resolver();
        r.update_draft(Draft::open_snooze_menu);
        assert_eq!(r.draft().menu, Menu::ChoosingSnoozeDuration);
        r.update_draft(Draft::back);
        assert_eq!(r.draft().menu, Menu::Choosing);
    }

    #[test]
    fn clones_share_draft() {
        let r = resolver();
        let other = r.clone();
        r.update_draft(|d| d.set_notes("felt fine"));
        assert_eq!(other.draft().notes, "felt fine");
    }

    #[tokio::test]
    async fn snooze_without_duration_is_rejected_before_request() {
        let r = resolver();
        let err = r.resolve(ResolutionKind::Snoozed, None, None).await.unwrap_err();
        assert_eq!(
            err,
            ResolveError::InvalidResolution(ResolutionError::MissingSnoozeDuration)
        );
        assert_eq!(r.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn unsupported_snooze_choice_keeps_menu_open() {
        let r = resolver();
        r.update_draft(Draft::open_snooze_menu);
        assert!(r.choose_snooze(7).await.is_err());
        assert_eq!(r.draft().menu, Menu::ChoosingSnoozeDuration);
        assert_eq!(r.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn refused_snooze_choice_keeps_menu_open() {
        let r = resolver();
        r.update_draft(Draft::open_snooze_menu);
        let mut in_flight = r.begin().unwrap();

        assert_eq!(r.choose_snooze(15).await, Err(ResolveError::Busy(1)));
        assert_eq!(r.draft().menu, Menu::ChoosingSnoozeDuration);
        assert_eq!(r.phase(), Phase::Processing);

        in_flight.finish(Phase::Resolved);
        assert_eq!(r.choose_snooze(15).await, Err(ResolveError::AlreadyResolved(1)));
        assert_eq!(r.draft().menu, Menu::ChoosingSnoozeDuration);
    }

    #[test]
    fn begin_is_exclusive() {
        let r = resolver();
        let in_flight = r.begin().expect("idle resolver accepts");
        assert_eq!(r.phase(), Phase::Processing);
        assert!(!r.controls_enabled());
        assert_eq!(r.begin().err(), Some(ResolveError::Busy(1)));
        drop(in_flight);
        assert_eq!(r.phase(), Phase::Failed);
        assert!(r.begin().is_ok());
    }

    #[test]
    fn resolved_is_terminal() {
        let r = resolver();
        let mut in_flight = r.begin().unwrap();
        in_flight.finish(Phase::Resolved);
        drop(in_flight);
        assert_eq!(r.begin().err(), Some(ResolveError::AlreadyResolved(1)));
    }
}
