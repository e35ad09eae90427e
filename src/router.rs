//! Message router: dispatches inbound frames by namespace to the owning
//! channel, and notifies the dispatcher of request/response correlation
//! when a JSON payload carries an integer `requestId`.
//!
//! An unknown namespace is dropped and the router continues with the next
//! frame rather than aborting the whole batch.

use std::collections::HashMap;
use std::sync::Arc;

use crate::channel::Channel;
use crate::dispatcher::Dispatcher;
use crate::proto::{CastMessage, CastMessage_PayloadType};

pub struct Router {
    channels: HashMap<String, Arc<dyn Channel>>,
    dispatcher: Dispatcher,
}

impl Router {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            channels: HashMap::new(),
            dispatcher,
        }
    }

    pub fn register(&mut self, channel: Arc<dyn Channel>) {
        self.channels.insert(channel.namespace().to_owned(), channel);
    }

    /// Route one decoded frame. Never fails the caller: a missing channel,
    /// an unparseable JSON payload, or a channel-level handling error is
    /// logged and dropped.
    pub fn route(&self, message: &CastMessage) {
        let namespace = message.get_namespace();
        let Some(channel) = self.channels.get(namespace) else {
            debug!("dropping message on unknown namespace {}", namespace);
            return;
        };

        match message.get_payload_type() {
            CastMessage_PayloadType::STRING => {
                let raw = message.get_payload_utf8();
                let value: serde_json::Value = match serde_json::from_str(raw) {
                    Ok(value) => value,
                    Err(err) => {
                        warn!("dropping unparseable JSON on {}: {}", namespace, err);
                        return;
                    }
                };
                if let Some(request_id) = value.get("requestId").and_then(|v| v.as_u64()) {
                    self.dispatcher
                        .complete(request_id as u32, Ok(value.clone()));
                }
                if let Err(err) = channel.handle_json(value, message.get_source_id()) {
                    warn!("channel {} failed to handle message: {}", namespace, err);
                }
            }
            CastMessage_PayloadType::BINARY => {
                if let Err(err) =
                    channel.handle_binary(message.get_payload_binary(), message.get_source_id())
                {
                    warn!("channel {} failed to handle binary message: {}", namespace, err);
                }
            }
        }
    }
}
