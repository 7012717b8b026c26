//! Asynchronous notification delivery queue.
//!
//! Callers enqueue a notification and get back an id immediately
//! (fire-and-forget). A single drain task consumes the queue head, paces
//! dispatches against the configured rate limit, hands each item to the
//! transport and applies the retry policy on failure. Terminal records stay
//! addressable through the status registry until the process ends.
//!
//! # Design
//!
//! - `DashMap` registry keyed by item id; records are never purged
//! - `VecDeque` of pending ids, strict FIFO with requeue-to-tail on retry
//! - An `AtomicBool` drain flag guarantees at most one dispatch in flight
//! - Rate-limit waits and retry delays suspend only the drain task
//!
//! # Example
//!
//! ```rust,ignore
//! let queue = DeliveryQueue::new(QueueSettings::default(), transport);
//!
//! let id = queue.enqueue("user@example.com", template, DeliveryOptions::default());
//!
//! // Poll later
//! let item = queue.get_status(id);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::QueueSettings;
use crate::ratelimit::DispatchPacer;
use crate::template::EmailTemplate;
use crate::transport::{MailTransport, TransportError};

/// Delivery hints forwarded to the transport.
///
/// `priority` is opaque metadata only; the queue dispatches strictly FIFO.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryOptions {
    #[serde(default)]
    pub attachments: Vec<EmailAttachment>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

/// An attachment forwarded to the transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Priority tag carried on an item; never used for ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

/// Lifecycle state of a queue item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Waiting in the queue (or mid-attempt)
    Pending,
    /// Delivered to the transport (terminal)
    Sent,
    /// Retries exhausted (terminal)
    Failed,
}

impl DeliveryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Sent | DeliveryStatus::Failed)
    }
}

/// The unit of work tracked by the queue
#[derive(Debug, Clone, Serialize)]
pub struct QueueItem {
    /// Unique identifier, assigned at enqueue time
    pub id: Uuid,
    /// Destination address, opaque to the queue
    pub recipient: String,
    /// Content to deliver
    pub template: EmailTemplate,
    /// Delivery hints forwarded to the transport
    pub options: DeliveryOptions,
    /// Failed attempts so far
    pub retries: u32,
    /// Current lifecycle state
    pub status: DeliveryStatus,
    /// Last failure message, present once a failure has occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the item was enqueued
    pub queued_at: DateTime<Utc>,
    /// Stamped exactly once, on transition to `Sent`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl QueueItem {
    fn new(recipient: String, template: EmailTemplate, options: DeliveryOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient,
            template,
            options,
            retries: 0,
            status: DeliveryStatus::Pending,
            error: None,
            queued_at: Utc::now(),
            sent_at: None,
        }
    }
}

/// Asynchronous delivery queue with single-flight dispatch.
///
/// Cheap to clone; clones share the same queue state.
#[derive(Clone)]
pub struct DeliveryQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    /// Every item ever enqueued, keyed by id; never pruned
    registry: DashMap<Uuid, QueueItem>,
    /// Ids of pending items in dispatch order
    pending: Mutex<VecDeque<Uuid>>,
    /// Single-flight drain flag
    draining: AtomicBool,
    /// Dispatch pacing against the configured rate limit
    pacer: DispatchPacer,
    transport: Arc<dyn MailTransport>,
    config: QueueSettings,
}

impl QueueInner {
    /// Lock the pending deque, recovering from a poisoned mutex.
    fn pending_lock(&self) -> MutexGuard<'_, VecDeque<Uuid>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DeliveryQueue {
    /// Create a new queue dispatching through the given transport.
    pub fn new(config: QueueSettings, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                registry: DashMap::new(),
                pending: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                pacer: DispatchPacer::new(config.rate_limit_per_minute),
                transport,
                config,
            }),
        }
    }

    /// Append a notification to the queue tail and return its id.
    ///
    /// Returns synchronously; delivery happens on the drain task, which is
    /// spawned onto the ambient tokio runtime if it is not already running.
    pub fn enqueue(
        &self,
        recipient: impl Into<String>,
        template: EmailTemplate,
        options: DeliveryOptions,
    ) -> Uuid {
        let item = QueueItem::new(recipient.into(), template, options);
        let id = item.id;

        self.inner.registry.insert(id, item);
        self.inner.pending_lock().push_back(id);

        tracing::debug!(id = %id, "Notification enqueued");

        self.trigger_drain();

        id
    }

    /// Last known record for a previously issued id.
    pub fn get_status(&self, id: Uuid) -> Option<QueueItem> {
        self.inner.registry.get(&id).map(|item| item.clone())
    }

    /// Pending items in dispatch order.
    pub fn queue_snapshot(&self) -> Vec<QueueItem> {
        let ids: Vec<Uuid> = self.inner.pending_lock().iter().copied().collect();
        ids.iter()
            .filter_map(|id| self.inner.registry.get(id).map(|item| item.clone()))
            // The deque and registry are updated in two steps; keep records
            // mid-transition out of the pending view.
            .filter(|item| item.status == DeliveryStatus::Pending)
            .collect()
    }

    /// Number of items waiting for dispatch.
    pub fn pending_count(&self) -> usize {
        self.inner.pending_lock().len()
    }

    /// Spawn the drain task if it is not already running.
    fn trigger_drain(&self) {
        if self
            .inner
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(inner.drain());
        }
    }
}

impl QueueInner {
    /// Consume the queue head until empty, one dispatch at a time.
    async fn drain(self: Arc<Self>) {
        loop {
            // Peek the head without removing it; the item only leaves the
            // queue on reaching a terminal state.
            let head = self.pending_lock().front().copied();

            let Some(id) = head else {
                self.draining.store(false, Ordering::SeqCst);
                // An enqueue may have raced in between the empty peek and
                // clearing the flag; reclaim it if so.
                if !self.pending_lock().is_empty()
                    && self
                        .draining
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                {
                    continue;
                }
                return;
            };

            let wait = self.pacer.wait_time();
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }

            // Snapshot the dispatch fields; the registry record stays in
            // place so status queries resolve mid-attempt.
            let Some((recipient, template, options)) = self.registry.get(&id).map(|item| {
                (
                    item.recipient.clone(),
                    item.template.clone(),
                    item.options.clone(),
                )
            }) else {
                self.pending_lock().pop_front();
                continue;
            };

            // Stamp the dispatch time before invoking the transport so a
            // slow or failing send cannot let the next dispatch start early.
            self.pacer.mark_dispatch();

            match self.transport.send(&recipient, &template, &options).await {
                Ok(()) => {
                    // Leave the queue before the terminal transition so the
                    // pending order never holds a non-pending item.
                    self.pending_lock().pop_front();
                    if let Some(mut item) = self.registry.get_mut(&id) {
                        item.status = DeliveryStatus::Sent;
                        item.sent_at = Some(Utc::now());
                    }

                    tracing::info!(id = %id, recipient = %recipient, "Notification sent");
                }
                Err(err) => self.handle_failure(id, err).await,
            }
        }
    }

    /// Retry policy: requeue to the tail until the ceiling is reached.
    async fn handle_failure(&self, id: Uuid, err: TransportError) {
        let message = err.to_string();

        let (retries, exhausted) = {
            let Some(mut item) = self.registry.get_mut(&id) else {
                self.pending_lock().pop_front();
                return;
            };
            item.retries += 1;
            item.error = Some(message.clone());

            (item.retries, item.retries >= self.config.max_retries)
        };

        if exhausted {
            // Same ordering as the success path: dequeue first, then mark
            // terminal.
            self.pending_lock().pop_front();
            if let Some(mut item) = self.registry.get_mut(&id) {
                item.status = DeliveryStatus::Failed;
            }

            tracing::warn!(
                id = %id,
                retries = retries,
                error = %message,
                "Notification failed permanently"
            );
        } else {
            // Demote behind every currently pending item so the rest of the
            // queue is serviced before the retry.
            {
                let mut pending = self.pending_lock();
                pending.pop_front();
                pending.push_back(id);
            }

            tracing::debug!(
                id = %id,
                retries = retries,
                error = %message,
                "Dispatch failed, requeued to tail"
            );

            tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
        }
    }
}
