//! Per-namespace protocol logic. Every channel owns a namespace string and
//! implements [`Channel::handle_json`] and/or [`Channel::handle_binary`].
//! Each channel holds a cloned [`ChannelContext`] handle back to the
//! dispatcher rather than a non-owning reference to the facade.

pub mod auth;
pub mod connection;
pub mod discovery;
pub mod heartbeat;
pub mod media;
pub mod multizone;
pub mod receiver;
pub mod setup;

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::dispatcher::Dispatcher;
use crate::session::SessionState;
use crate::Event;

pub const DEFAULT_MEDIA_RECEIVER_APP_ID: &str = crate::message::DEFAULT_MEDIA_RECEIVER_APP_ID;

#[derive(Debug)]
pub enum ChannelError {
    Parse(String),
    EventSend,
    CommandSend,
    Dispatch(crate::error::RequestError),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Parse(msg) => write!(f, "failed to parse payload: {msg}"),
            ChannelError::EventSend => write!(f, "failed to publish event: receiver dropped"),
            ChannelError::CommandSend => write!(f, "failed to send internal command: receiver dropped"),
            ChannelError::Dispatch(err) => write!(f, "failed to dispatch request: {err}"),
        }
    }
}

impl std::error::Error for ChannelError {}

impl From<crate::error::RequestError> for ChannelError {
    fn from(err: crate::error::RequestError) -> Self {
        ChannelError::Dispatch(err)
    }
}

/// Internal cross-channel signals delivered to the client facade's
/// supervisor task: the heartbeat channel observed its first PONG or went
/// quiet, or the I/O task's read loop hit an error or saw EOF.
#[derive(Debug, Clone)]
pub enum Command {
    HeartbeatConnected,
    HeartbeatTimeout,
    TransportError(String),
    TransportClosed,
}

/// Shared context every channel is constructed with. Cloning is cheap
/// (`Dispatcher` and the two senders are already `Clone`; `state` is an
/// `Arc`).
#[derive(Clone)]
pub struct ChannelContext {
    pub dispatcher: Dispatcher,
    pub state: Arc<Mutex<SessionState>>,
    pub events: mpsc::UnboundedSender<Event>,
    pub commands: mpsc::UnboundedSender<Command>,
}

impl ChannelContext {
    pub fn publish(&self, event: Event) -> Result<(), ChannelError> {
        self.events.send(event).map_err(|_| ChannelError::EventSend)
    }

    pub fn command(&self, command: Command) -> Result<(), ChannelError> {
        self.commands
            .send(command)
            .map_err(|_| ChannelError::CommandSend)
    }
}

pub trait Channel: Send + Sync {
    fn namespace(&self) -> &str;

    fn handle_json(&self, _payload: serde_json::Value, _source_id: &str) -> Result<(), ChannelError> {
        Ok(())
    }

    fn handle_binary(&self, _payload: &[u8], _source_id: &str) -> Result<(), ChannelError> {
        Ok(())
    }
}
