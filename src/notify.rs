//! Notification lifetime management
//!
//! Each notification key owns at most one expiry timer. Showing a key again
//! resets its countdown; when a countdown runs out the presenter is asked to
//! clear that key. Timers live in a [`DelayQueue`], so a reset or cancelled
//! entry never yields.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::time::DelayQueue;
use tokio_util::time::delay_queue::Key;

use crate::error::Result;
use crate::host::NotificationPresenter;
use crate::types::identifiers::NotificationKey;
use crate::types::notification::Notification;

/// Per-key notification expiry table
pub struct NotificationDebouncer {
    presenter: Arc<dyn NotificationPresenter>,
    ttl: Duration,
    queue: DelayQueue<NotificationKey>,
    timers: HashMap<NotificationKey, Key>,
}

impl NotificationDebouncer {
    /// Create a debouncer that clears notifications after `ttl`
    pub fn new(presenter: Arc<dyn NotificationPresenter>, ttl: Duration) -> Self {
        Self {
            presenter,
            ttl,
            queue: DelayQueue::new(),
            timers: HashMap::new(),
        }
    }

    /// Show `notification` under `key` and restart its expiry
    ///
    /// The timer is (re)armed even if presenting fails, so a partially shown
    /// notification is still cleared.
    ///
    /// # Errors
    /// Returns the presenter's error
    pub fn show(&mut self, key: NotificationKey, notification: &Notification) -> Result<()> {
        let shown = self.presenter.notify(&key, notification);

        match self.timers.get(&key) {
            Some(timer) => {
                log::debug!("Restarting notification timer for {key}");
                self.queue.reset(timer, self.ttl);
            }
            None => {
                let timer = self.queue.insert(key.clone(), self.ttl);
                self.timers.insert(key, timer);
            }
        }

        shown
    }

    /// Cancel the expiry for `key` without clearing it
    ///
    /// Returns true if a timer was pending.
    pub fn cancel(&mut self, key: &NotificationKey) -> bool {
        match self.timers.remove(key) {
            Some(timer) => {
                self.queue.remove(&timer);
                true
            }
            None => false,
        }
    }

    /// Whether `key` has a pending expiry
    #[must_use]
    pub fn is_pending(&self, key: &NotificationKey) -> bool {
        self.timers.contains_key(key)
    }

    /// Number of pending expiries
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// True if nothing is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Wait for the next expiry, clear that notification and return its key
    ///
    /// Pends forever while nothing is scheduled, which keeps it usable as a
    /// `select!` arm.
    pub async fn expire_next(&mut self) -> NotificationKey {
        loop {
            if self.queue.is_empty() {
                std::future::pending::<()>().await;
            }

            let Some(expired) = self.queue.next().await else {
                continue;
            };

            let key = expired.into_inner();
            self.timers.remove(&key);
            if let Err(e) = self.presenter.clear(&key) {
                log::warn!("Failed to clear notification {key}: {e}");
            }
            return key;
        }
    }
}
