// Bounded per-connection notification queue.

use super::types::Notice;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Queue between producers (rooms, the session reader) and one socket writer.
///
/// `push` never waits. When the queue is full the oldest notice is dropped, so
/// a slow reader falls behind on stale ticks instead of stalling its room.
#[derive(Debug, Clone)]
pub struct Outbox {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    queue: Mutex<VecDeque<Notice>>,
    capacity: usize,
    notify: Notify,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl Outbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
                capacity: capacity.max(1),
                notify: Notify::new(),
                closed: AtomicBool::new(false),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Returns false once the outbox is closed.
    pub fn push(&self, notice: Notice) -> bool {
        if self.is_closed() {
            return false;
        }
        {
            let mut queue = match self.inner.queue.lock() {
                Ok(queue) => queue,
                Err(poisoned) => poisoned.into_inner(),
            };
            if queue.len() >= self.inner.capacity {
                queue.pop_front();
                self.inner.dropped.fetch_add(1, Ordering::Relaxed);
            }
            queue.push_back(notice);
        }
        self.inner.notify.notify_one();
        true
    }

    pub fn try_recv(&self) -> Option<Notice> {
        let mut queue = match self.inner.queue.lock() {
            Ok(queue) => queue,
            Err(poisoned) => poisoned.into_inner(),
        };
        queue.pop_front()
    }

    /// Waits for the next notice. Returns `None` once closed and drained.
    pub async fn recv(&self) -> Option<Notice> {
        loop {
            if let Some(notice) = self.try_recv() {
                return Some(notice);
            }
            if self.is_closed() {
                return None;
            }
            self.inner.notify.notified().await;
        }
    }

    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Notices discarded because the reader fell behind.
    pub fn dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }
}
