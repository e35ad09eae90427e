//! Request dispatcher: allocates request ids, serializes outbound
//! `CastMessage`s, and correlates inbound `requestId`s with a waiting
//! caller, enforcing a 30s timeout.
//!
//! Built on `tokio::sync::oneshot` plus a `tokio::time::sleep` per pending
//! entry, with the response-handler map, channel map and id counter all
//! serialized behind a single `Mutex`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, oneshot};

use crate::error::RequestError;
use crate::message::{CastRequest, Payload};
use crate::proto::CastMessage;

type PendingMap = HashMap<u32, oneshot::Sender<Result<serde_json::Value, RequestError>>>;

/// Shared dispatcher state. Cloned handles are distributed to every channel
/// so they can issue requests without holding a reference back to the
/// `Client` facade.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    next_id: Mutex<u32>,
    pending: Mutex<PendingMap>,
    outbound: mpsc::UnboundedSender<CastMessage>,
    source_id: String,
    request_timeout: Duration,
}

impl Dispatcher {
    /// `initial_request_id` seeds the monotonic counter; when `None` a
    /// random value in `[0, 800)` is drawn as a soft defense against
    /// cross-session request id collisions.
    pub fn new(
        source_id: String,
        outbound: mpsc::UnboundedSender<CastMessage>,
        request_timeout: Duration,
        initial_request_id: Option<u32>,
    ) -> Self {
        let start = initial_request_id.unwrap_or_else(|| rand::thread_rng().gen_range(0..800));
        Self {
            inner: Arc::new(Inner {
                next_id: Mutex::new(start),
                pending: Mutex::new(HashMap::new()),
                outbound,
                source_id,
                request_timeout,
            }),
        }
    }

    pub fn next_id(&self) -> u32 {
        let mut guard = self.inner.next_id.lock().expect("dispatcher mutex poisoned");
        let id = *guard;
        *guard = guard.wrapping_add(1);
        id
    }

    pub fn build_json_request(
        &self,
        namespace: impl Into<String>,
        destination_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> CastRequest {
        CastRequest::json(self.next_id(), namespace, destination_id, payload)
    }

    pub fn build_binary_request(
        &self,
        namespace: impl Into<String>,
        destination_id: impl Into<String>,
        bytes: Vec<u8>,
    ) -> CastRequest {
        CastRequest::binary(self.next_id(), namespace, destination_id, bytes)
    }

    /// Enqueue `request` for write. A pending entry is registered *before*
    /// the message is handed to the I/O task, so a response racing ahead of
    /// `send` returning is still matched.
    pub fn send(
        &self,
        request: CastRequest,
    ) -> Result<oneshot::Receiver<Result<serde_json::Value, RequestError>>, RequestError> {
        let id = request.id;
        let is_json = matches!(request.payload, Payload::Json(_));
        let (tx, rx) = oneshot::channel();

        if is_json {
            let mut pending = self.inner.pending.lock().expect("dispatcher mutex poisoned");
            pending.insert(id, tx);
        }

        let message = request
            .into_wire_message(&self.inner.source_id)
            .map_err(|err| RequestError::Parse(err.to_string()))?;
        if self.inner.outbound.send(message).is_err() {
            self.cancel(id);
            return Err(RequestError::Cancelled);
        }

        if is_json {
            self.spawn_timeout(id);
        }
        Ok(rx)
    }

    /// Send a fire-and-forget message (`CONNECT`, `CLOSE`, `PING`, `PONG`)
    /// with no response correlation.
    pub fn send_fire_and_forget(&self, request: CastRequest) -> Result<(), RequestError> {
        let message = request
            .into_wire_message(&self.inner.source_id)
            .map_err(|err| RequestError::Parse(err.to_string()))?;
        self.inner
            .outbound
            .send(message)
            .map_err(|_| RequestError::Cancelled)
    }

    fn spawn_timeout(&self, id: u32) {
        let inner = self.inner.clone_arc();
        let timeout = self.inner.request_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut pending = inner.pending.lock().expect("dispatcher mutex poisoned");
            if let Some(tx) = pending.remove(&id) {
                let _ = tx.send(Err(RequestError::Timeout));
            }
        });
    }

    fn cancel(&self, id: u32) {
        let mut pending = self.inner.pending.lock().expect("dispatcher mutex poisoned");
        pending.remove(&id);
    }

    /// Called by the message router when a JSON response carrying a
    /// `requestId` arrives. Removes the pending entry and completes its
    /// handler exactly once; a handler already removed by timeout or
    /// disconnect silently observes nothing.
    pub fn complete(&self, request_id: u32, result: Result<serde_json::Value, RequestError>) {
        let mut pending = self.inner.pending.lock().expect("dispatcher mutex poisoned");
        if let Some(tx) = pending.remove(&request_id) {
            let _ = tx.send(result);
        }
    }

    /// Drain all pending entries without invoking their handlers — the
    /// facade's disconnect event is the user-visible signal instead.
    pub fn drain_on_disconnect(&self) {
        let mut pending = self.inner.pending.lock().expect("dispatcher mutex poisoned");
        pending.clear();
    }

    pub fn source_id(&self) -> &str {
        &self.inner.source_id
    }
}

impl Inner {
    fn clone_arc(self: &Arc<Self>) -> Arc<Self> {
        Arc::clone(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dispatcher(timeout: Duration) -> (Dispatcher, mpsc::UnboundedReceiver<CastMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Dispatcher::new("sender-test".to_owned(), tx, timeout, Some(0)),
            rx,
        )
    }

    #[test]
    fn ids_are_unique_and_monotonic() {
        let (dispatcher, _rx) = dispatcher(Duration::from_secs(30));
        let a = dispatcher.next_id();
        let b = dispatcher.next_id();
        let c = dispatcher.next_id();
        assert_eq!([a, b, c], [0, 1, 2]);
    }

    #[tokio::test]
    async fn response_before_timeout_completes_handler_once() {
        let (dispatcher, _rx) = dispatcher(Duration::from_secs(30));
        let request = dispatcher.build_json_request("ns", "receiver-0", json!({"type": "GET_STATUS"}));
        let id = request.id;
        let rx = dispatcher.send(request).unwrap();

        dispatcher.complete(id, Ok(json!({"ok": true})));
        let result = rx.await.unwrap();
        assert_eq!(result, Ok(json!({"ok": true})));

        // A second completion for the same id is a no-op: the entry was
        // already removed.
        dispatcher.complete(id, Ok(json!({"ok": false})));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires_when_no_response_arrives() {
        let (dispatcher, _rx) = dispatcher(Duration::from_millis(50));
        let request = dispatcher.build_json_request("ns", "receiver-0", json!({"type": "GET_STATUS"}));
        let rx = dispatcher.send(request).unwrap();

        tokio::time::advance(Duration::from_millis(60)).await;
        let result = rx.await.unwrap();
        assert_eq!(result, Err(RequestError::Timeout));
    }

    #[test]
    fn disconnect_drains_pending_without_invoking_handlers() {
        let (dispatcher, _rx) = dispatcher(Duration::from_secs(30));
        let request = dispatcher.build_json_request("ns", "receiver-0", json!({"type": "GET_STATUS"}));
        let rx = dispatcher.send(request).unwrap();
        dispatcher.drain_on_disconnect();
        drop(dispatcher);
        assert!(rx.try_recv().is_err());
    }
}
