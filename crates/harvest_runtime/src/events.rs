//! Events to the host and the UI readiness ping
//!
//! Events are fire-and-continue: the worker never waits for the host to
//! act on them. The one synchronous query, "is the UI ready", is a
//! request/response pair with a hard timeout that answers "not ready" when
//! the host does not respond in time.

use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use harvest_collections::CollectibleHandling;
use harvest_core::{FormId, Notifier};

/// Something the host should do or show
#[derive(Debug, Clone, PartialEq)]
pub enum HarvestEvent {
    /// Pick up an item reference
    Loot { reference: FormId, form: FormId },
    /// Pick up a collectible, or record it without taking it
    Collect {
        reference: FormId,
        form: FormId,
        handling: CollectibleHandling,
    },
    /// Highlight a reference for a while
    Glow { reference: FormId, duration: Duration },
    /// Show a message to the player
    Notification(String),
}

/// Outbound event channel
pub trait EventSink: Send + Sync {
    /// Queue an event; never blocks
    fn send(&self, event: HarvestEvent);
}

/// [`EventSink`] backed by an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: Sender<HarvestEvent>,
}

impl ChannelEventSink {
    /// Create the sink and the host's receiving end
    pub fn new() -> (Self, Receiver<HarvestEvent>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn send(&self, event: HarvestEvent) {
        if self.sender.send(event).is_err() {
            log::debug!("Event dropped, host receiver is gone");
        }
    }
}

impl Notifier for ChannelEventSink {
    fn notify(&self, message: &str) {
        self.send(HarvestEvent::Notification(message.to_string()));
    }
}

/// A pending readiness question
#[derive(Debug)]
pub struct PingRequest {
    reply: Sender<bool>,
}

impl PingRequest {
    /// Answer the question; a late answer is discarded
    pub fn answer(self, ready: bool) {
        let _ = self.reply.send(ready);
    }
}

/// Asking side of the readiness ping
#[derive(Debug, Clone)]
pub struct UiPing {
    requests: Sender<PingRequest>,
    timeout: Duration,
}

/// Answering side, owned by the host's UI thread
#[derive(Debug, Clone)]
pub struct UiPingResponder {
    requests: Receiver<PingRequest>,
}

/// Create a connected ping pair
pub fn ui_ping(timeout: Duration) -> (UiPing, UiPingResponder) {
    let (requests, receiver) = unbounded();
    (UiPing { requests, timeout }, UiPingResponder { requests: receiver })
}

impl UiPing {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the host whether its UI is ready. Blocks for at most the
    /// timeout; no answer means not ready.
    pub fn is_ui_ready(&self) -> bool {
        let (reply, answer) = bounded(1);
        if self.requests.send(PingRequest { reply }).is_err() {
            log::debug!("UI ping has no responder");
            return false;
        }
        match answer.recv_timeout(self.timeout) {
            Ok(ready) => ready,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("UI ping timed out after {:?}", self.timeout);
                false
            }
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl UiPingResponder {
    /// Next pending question, if any
    pub fn try_next(&self) -> Option<PingRequest> {
        self.requests.try_recv().ok()
    }

    /// Wait up to `timeout` for a question
    pub fn next_timeout(&self, timeout: Duration) -> Option<PingRequest> {
        self.requests.recv_timeout(timeout).ok()
    }

    /// Answer every pending question. Returns how many were answered.
    pub fn answer_all(&self, ready: bool) -> usize {
        let mut answered = 0;
        while let Some(request) = self.try_next() {
            request.answer(ready);
            answered += 1;
        }
        answered
    }
}
