//! Heartbeat channel: periodic `PING`, `PONG` replies, and the liveness
//! watchdog. Owns its own ping timer and watchdog tasks rather than relying
//! on an external poller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::channel::{Channel, ChannelContext, ChannelError, Command};
use crate::message::RECEIVER_ID;
use crate::payload::heartbeat::{Request, Response};

pub const NAMESPACE: &str = "urn:x-cast:com.google.cast.tp.heartbeat";

pub struct HeartbeatChannel {
    ctx: ChannelContext,
    last_activity: Mutex<Instant>,
    connected: AtomicBool,
}

impl HeartbeatChannel {
    pub fn new(ctx: ChannelContext) -> Self {
        Self {
            ctx,
            last_activity: Mutex::new(Instant::now()),
            connected: AtomicBool::new(false),
        }
    }

    /// Called by the I/O read loop on every inbound frame, regardless of
    /// namespace: the last-activity timestamp is updated on any traffic,
    /// not just heartbeat frames.
    pub fn touch(&self) {
        *self.last_activity.lock().expect("heartbeat mutex poisoned") = Instant::now();
    }

    fn ping(&self) -> Result<(), ChannelError> {
        self.send(Request::Ping)
    }

    fn pong(&self) -> Result<(), ChannelError> {
        self.send(Request::Pong)
    }

    fn send(&self, payload: Request) -> Result<(), ChannelError> {
        let value = serde_json::to_value(payload).expect("heartbeat request always serializes");
        let request = self
            .ctx
            .dispatcher
            .build_json_request(NAMESPACE, RECEIVER_ID, value);
        self.ctx
            .dispatcher
            .send_fire_and_forget(request)
            .map_err(ChannelError::from)
    }

    /// Spawn the ping timer and the liveness watchdog. Both tasks stop as
    /// soon as `shutdown` observes a change.
    pub fn spawn(self: Arc<Self>, interval: Duration, timeout: Duration, shutdown: watch::Receiver<bool>) {
        let pinger = self.clone();
        let mut ping_shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // the first tick fires immediately; skip it
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = pinger.ping() {
                            warn!("failed to send heartbeat ping: {}", err);
                        }
                    }
                    _ = ping_shutdown.changed() => break,
                }
            }
        });

        let watchdog = self;
        let mut watchdog_shutdown = shutdown;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let elapsed = watchdog
                            .last_activity
                            .lock()
                            .expect("heartbeat mutex poisoned")
                            .elapsed();
                        if elapsed > timeout {
                            warn!("no inbound activity for {:?}, signalling heartbeat timeout", elapsed);
                            let _ = watchdog.ctx.command(Command::HeartbeatTimeout);
                            break;
                        }
                    }
                    _ = watchdog_shutdown.changed() => break,
                }
            }
        });
    }
}

impl Channel for HeartbeatChannel {
    fn namespace(&self) -> &str {
        NAMESPACE
    }

    fn handle_json(&self, payload: serde_json::Value, _source_id: &str) -> Result<(), ChannelError> {
        let response: Response =
            serde_json::from_value(payload).map_err(|err| ChannelError::Parse(err.to_string()))?;
        match response {
            Response::Ping => self.pong(),
            Response::Pong => {
                if !self.connected.swap(true, Ordering::SeqCst) {
                    self.ctx.command(Command::HeartbeatConnected)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use std::time::Duration as StdDuration;
    use tokio::sync::mpsc;

    fn context() -> (ChannelContext, mpsc::UnboundedReceiver<crate::proto::CastMessage>, mpsc::UnboundedReceiver<Command>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, _event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new("sender-test".to_owned(), outbound_tx, StdDuration::from_secs(30), Some(0));
        let state = Arc::new(Mutex::new(crate::session::SessionState::default()));
        let ctx = ChannelContext { dispatcher, state, events: event_tx, commands: command_tx };
        (ctx, outbound_rx, command_rx)
    }

    #[test]
    fn first_pong_signals_heartbeat_connected_exactly_once() {
        let (ctx, _outbound_rx, mut command_rx) = context();
        let heartbeat = HeartbeatChannel::new(ctx);
        heartbeat
            .handle_json(serde_json::json!({"type": "PONG"}), "receiver-0")
            .unwrap();
        heartbeat
            .handle_json(serde_json::json!({"type": "PONG"}), "receiver-0")
            .unwrap();
        assert!(matches!(command_rx.try_recv(), Ok(Command::HeartbeatConnected)));
        assert!(command_rx.try_recv().is_err());
    }

    #[test]
    fn ping_triggers_a_pong_reply() {
        let (ctx, mut outbound_rx, _command_rx) = context();
        let heartbeat = HeartbeatChannel::new(ctx);
        heartbeat
            .handle_json(serde_json::json!({"type": "PING"}), "receiver-0")
            .unwrap();
        let message = outbound_rx.try_recv().unwrap();
        assert_eq!(message.get_payload_utf8(), r#"{"type":"PONG","requestId":0}"#);
    }
}
