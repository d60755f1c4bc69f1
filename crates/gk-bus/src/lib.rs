//! In-process pub/sub bus connecting agents.
//!
//! Two delivery policies, picked per [`Subject::is_lossless`]:
//!
//! - **Lossy** (`market_data`, `heartbeat`): a [`tokio::sync::broadcast`]
//!   channel. A subscriber that falls behind silently drops the oldest
//!   messages; `Bus::dropped_count` exposes how many per subject.
//! - **Lossless** (`control`, `risk_check`, `risk_approved`,
//!   `risk_rejected`, `fills`): one bounded [`tokio::sync::mpsc`] channel
//!   per subscriber. `publish` awaits every subscriber's `send`, which
//!   blocks the publisher when a subscriber's buffer is full rather than
//!   drop the message.
//!
//! This mirrors the teacher's `mqk-daemon::state::AppState` broadcast
//! pattern, generalized from one SSE channel to per-subject delivery with
//! differentiated backpressure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use gk_schemas::envelope::{Message, Subject};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};

const LOSSY_CAPACITY: usize = 1024;
const LOSSLESS_SUBSCRIBER_CAPACITY: usize = 256;

const ALL_SUBJECTS: [Subject; 10] = [
    Subject::MarketData,
    Subject::Signals,
    Subject::RiskCheck,
    Subject::RiskApproved,
    Subject::RiskRejected,
    Subject::Execution,
    Subject::Fills,
    Subject::Heartbeat,
    Subject::Control,
    Subject::Alerts,
];

struct LosslessState {
    next_id: u64,
    subscribers: HashMap<u64, mpsc::Sender<Message>>,
}

struct Inner {
    lossy: HashMap<Subject, broadcast::Sender<Message>>,
    lossless: HashMap<Subject, Mutex<LosslessState>>,
    dropped: HashMap<Subject, AtomicU64>,
}

/// A handle to the bus. Cheap to clone; every clone shares the same
/// underlying channels.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        let mut lossy = HashMap::new();
        let mut lossless = HashMap::new();
        let mut dropped = HashMap::new();

        for subject in ALL_SUBJECTS {
            dropped.insert(subject, AtomicU64::new(0));
            if subject.is_lossless() {
                lossless.insert(
                    subject,
                    Mutex::new(LosslessState {
                        next_id: 0,
                        subscribers: HashMap::new(),
                    }),
                );
            } else {
                let (tx, _rx) = broadcast::channel(LOSSY_CAPACITY);
                lossy.insert(subject, tx);
            }
        }

        Self {
            inner: Arc::new(Inner {
                lossy,
                lossless,
                dropped,
            }),
        }
    }

    /// Publish a message. Blocks the caller for lossless subjects whose
    /// subscribers are backed up; never blocks for lossy subjects.
    pub async fn publish(&self, subject: Subject, message: Message) {
        if subject.is_lossless() {
            let senders: Vec<mpsc::Sender<Message>> = {
                let state = self.inner.lossless[&subject].lock().unwrap();
                state.subscribers.values().cloned().collect()
            };
            for sender in senders {
                // A closed subscriber is simply gone; publishing never fails
                // for that reason alone.
                let _ = sender.send(message.clone()).await;
            }
        } else {
            // `send` only errors when there are zero receivers, which is a
            // normal and expected condition (e.g. nobody subscribed yet).
            let _ = self.inner.lossy[&subject].send(message);
        }
    }

    /// Subscribe to a subject. Drop the returned [`Subscription`] to
    /// unsubscribe; this is idempotent.
    pub fn subscribe(&self, subject: Subject) -> Subscription {
        if subject.is_lossless() {
            let (tx, rx) = mpsc::channel(LOSSLESS_SUBSCRIBER_CAPACITY);
            let id = {
                let mut state = self.inner.lossless[&subject].lock().unwrap();
                let id = state.next_id;
                state.next_id += 1;
                state.subscribers.insert(id, tx);
                id
            };
            Subscription::Lossless {
                subject,
                id,
                inner: self.inner.clone(),
                rx,
            }
        } else {
            let rx = self.inner.lossy[&subject].subscribe();
            Subscription::Lossy {
                subject,
                inner: self.inner.clone(),
                stream: BroadcastStream::new(rx),
            }
        }
    }

    /// Number of messages dropped due to subscriber lag on a lossy subject.
    pub fn dropped_count(&self, subject: Subject) -> u64 {
        self.inner.dropped[&subject].load(Ordering::Relaxed)
    }
}

/// A live subscription to one subject. Implements [`Stream`] uniformly
/// regardless of the underlying delivery policy.
pub enum Subscription {
    Lossy {
        subject: Subject,
        inner: Arc<Inner>,
        stream: BroadcastStream<Message>,
    },
    Lossless {
        subject: Subject,
        id: u64,
        inner: Arc<Inner>,
        rx: mpsc::Receiver<Message>,
    },
}

impl Stream for Subscription {
    type Item = Message;

    fn poll_next(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this {
            Subscription::Lossy {
                subject,
                inner,
                stream,
            } => loop {
                match std::pin::Pin::new(&mut *stream).poll_next(cx) {
                    std::task::Poll::Ready(Some(Ok(msg))) => {
                        return std::task::Poll::Ready(Some(msg))
                    }
                    std::task::Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(n)))) => {
                        inner.dropped[subject].fetch_add(n, Ordering::Relaxed);
                        continue;
                    }
                    std::task::Poll::Ready(None) => return std::task::Poll::Ready(None),
                    std::task::Poll::Pending => return std::task::Poll::Pending,
                }
            },
            Subscription::Lossless { rx, .. } => {
                std::pin::Pin::new(rx).poll_recv(cx)
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Subscription::Lossless { subject, id, inner, .. } = self {
            if let Some(state) = inner.lossless.get(subject) {
                state.lock().unwrap().subscribers.remove(id);
            }
        }
    }
}
