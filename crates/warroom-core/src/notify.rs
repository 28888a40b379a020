//! Bounded, self-expiring notification queue.
//!
//! Entries are transient: they live for a fixed time after creation and the
//! queue never holds more than its capacity. Nothing here is persisted.

use crate::config::NotificationConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// NotifyKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotifyKind {
    Success,
    Error,
    Info,
    Warning,
}

impl NotifyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotifyKind::Success => "SUCCESS",
            NotifyKind::Error => "ERROR",
            NotifyKind::Info => "INFO",
            NotifyKind::Warning => "WARNING",
        }
    }
}

impl fmt::Display for NotifyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub kind: NotifyKind,
    pub title: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

fn delta(d: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(d.as_millis() as i64)
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Scheduled {
    due: DateTime<Utc>,
    kind: NotifyKind,
    title: String,
    detail: String,
}

pub struct Notifier {
    clock: Arc<dyn Clock>,
    capacity: usize,
    ttl: Duration,
    next_id: u64,
    visible: VecDeque<Notification>,
    scheduled: Vec<Scheduled>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("visible", &self.visible)
            .field("scheduled", &self.scheduled.len())
            .finish()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(&NotificationConfig::default(), Arc::new(SystemClock))
    }
}

impl Notifier {
    pub fn new(config: &NotificationConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            capacity: config.capacity.max(1),
            ttl: config.ttl(),
            next_id: 1,
            visible: VecDeque::new(),
            scheduled: Vec::new(),
        }
    }

    /// Append a notification now and return its id.
    pub fn notify(&mut self, kind: NotifyKind, title: &str, detail: &str) -> u64 {
        let now = self.clock.now();
        self.push(kind, title.to_string(), detail.to_string(), now)
    }

    pub fn success(&mut self, title: &str, detail: &str) -> u64 {
        self.notify(NotifyKind::Success, title, detail)
    }

    pub fn error(&mut self, title: &str, detail: &str) -> u64 {
        self.notify(NotifyKind::Error, title, detail)
    }

    pub fn info(&mut self, title: &str, detail: &str) -> u64 {
        self.notify(NotifyKind::Info, title, detail)
    }

    pub fn warning(&mut self, title: &str, detail: &str) -> u64 {
        self.notify(NotifyKind::Warning, title, detail)
    }

    /// Schedule a notification that becomes visible `delay` from now, on the
    /// first [`Notifier::tick`] at or after that time.
    pub fn notify_after(&mut self, delay: Duration, kind: NotifyKind, title: &str, detail: &str) {
        let due = self.clock.now() + delta(delay);
        self.scheduled.push(Scheduled {
            due,
            kind,
            title: title.to_string(),
            detail: detail.to_string(),
        });
    }

    /// Promote scheduled entries that are due, then drop expired ones.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        let mut due: Vec<Scheduled> = Vec::new();
        self.scheduled.retain(|s| {
            if s.due <= now {
                due.push(s.clone());
                false
            } else {
                true
            }
        });
        self.promote(due);
        self.expire(now);
    }

    /// Promote every scheduled entry regardless of its due time. Used when the
    /// host is about to stop ticking, such as a CLI command exiting.
    pub fn flush(&mut self) {
        let all = std::mem::take(&mut self.scheduled);
        self.promote(all);
    }

    /// Visible, unexpired entries, oldest first.
    pub fn active(&self) -> Vec<&Notification> {
        let now = self.clock.now();
        self.visible
            .iter()
            .filter(|n| !self.is_expired(n, now))
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.scheduled.len()
    }

    /// Remove one entry early. Returns false when it is already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.visible.len();
        self.visible.retain(|n| n.id != id);
        self.visible.len() != before
    }

    fn promote(&mut self, mut entries: Vec<Scheduled>) {
        entries.sort_by_key(|s| s.due);
        for s in entries {
            self.push(s.kind, s.title, s.detail, s.due);
        }
    }

    fn expire(&mut self, now: DateTime<Utc>) {
        let ttl = delta(self.ttl);
        self.visible.retain(|n| now - n.created_at < ttl);
    }

    fn is_expired(&self, n: &Notification, now: DateTime<Utc>) -> bool {
        now - n.created_at >= delta(self.ttl)
    }

    fn push(
        &mut self,
        kind: NotifyKind,
        title: String,
        detail: String,
        created_at: DateTime<Utc>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        match kind {
            NotifyKind::Success | NotifyKind::Info => {
                tracing::info!(id, kind = %kind, %title, %detail, "notification")
            }
            NotifyKind::Warning => tracing::warn!(id, kind = %kind, %title, %detail, "notification"),
            NotifyKind::Error => tracing::error!(id, kind = %kind, %title, %detail, "notification"),
        }

        self.visible.push_back(Notification {
            id,
            kind,
            title,
            detail,
            created_at,
        });
        while self.visible.len() > self.capacity {
            self.visible.pop_front();
        }
        id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
