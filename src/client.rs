//! Client facade: orchestrates the transport, dispatcher, channels and
//! session state behind the connection lifecycle state machine, and exposes
//! the public operation surface callers use to drive a cast session.
//!
//! Ownership is a tree rooted here: the facade owns the transport, the
//! dispatcher, every channel and the session state; channels hold a
//! cloneable [`ChannelContext`](crate::channel::ChannelContext) back to the
//! dispatcher rather than a non-owning reference, since cloning a
//! `Dispatcher` handle is cheap and there is no cycle to break.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};

use crate::channel::auth::AuthChannel;
use crate::channel::connection::ConnectionChannel;
use crate::channel::discovery::DiscoveryChannel;
use crate::channel::heartbeat::HeartbeatChannel;
use crate::channel::media::MediaChannel;
use crate::channel::multizone::MultizoneChannel;
use crate::channel::receiver::ReceiverChannel;
use crate::channel::setup::SetupChannel;
use crate::channel::{Channel, ChannelContext, Command};
use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::message::{new_sender_id, DEFAULT_MEDIA_RECEIVER_APP_ID, RECEIVER_ID};
use crate::payload::media::MediaInformation;
use crate::payload::receiver::Availability;
use crate::router::Router;
use crate::session::{CastApp, CastMediaStatus, CastMultizoneStatus, CastStatus, SessionState};
use crate::transport;
use crate::{Event, Observer};

/// Connection lifecycle state machine. The cached status, media status,
/// multizone status and connected app are cleared on every transition to
/// `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Authenticating,
    Connected,
    Disconnecting,
}

fn state_from_u8(value: u8) -> ConnectionState {
    match value {
        0 => ConnectionState::Disconnected,
        1 => ConnectionState::Connecting,
        2 => ConnectionState::Authenticating,
        3 => ConnectionState::Connected,
        _ => ConnectionState::Disconnecting,
    }
}

fn u8_from_state(state: ConnectionState) -> u8 {
    match state {
        ConnectionState::Disconnected => 0,
        ConnectionState::Connecting => 1,
        ConnectionState::Authenticating => 2,
        ConnectionState::Connected => 3,
        ConnectionState::Disconnecting => 4,
    }
}

struct Channels {
    connection: Arc<ConnectionChannel>,
    heartbeat: Arc<HeartbeatChannel>,
    receiver: Arc<ReceiverChannel>,
    media: Arc<MediaChannel>,
    multizone: Arc<MultizoneChannel>,
    #[allow(dead_code)]
    auth: Arc<AuthChannel>,
    #[allow(dead_code)]
    discovery: Arc<DiscoveryChannel>,
    #[allow(dead_code)]
    setup: Arc<SetupChannel>,
}

/// The Cast protocol engine's client facade.
pub struct Client {
    state: Arc<AtomicU8>,
    session: Arc<Mutex<SessionState>>,
    dispatcher: Dispatcher,
    channels: Channels,
    shutdown: watch::Sender<bool>,
}

impl Client {
    /// Open a connection to `addr` and drive the lifecycle state machine
    /// through `Connecting` and `Authenticating`. Returns once the
    /// transport is open and the first frames have been sent; the
    /// transition to `Connected` happens asynchronously on the first
    /// heartbeat `PONG` and is reported on the returned event stream.
    pub async fn connect(addr: SocketAddr, config: ClientConfig) -> Result<(Self, mpsc::UnboundedReceiver<Event>), Error> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let _ = event_tx.send(Event::WillConnect);

        let (sink, mut stream) = transport::open(addr, config.max_frame_len).await?;

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(new_sender_id(), outbound_tx, config.request_timeout, config.initial_request_id);

        let session = Arc::new(Mutex::new(SessionState::default()));
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let ctx = ChannelContext {
            dispatcher: dispatcher.clone(),
            state: session.clone(),
            events: event_tx.clone(),
            commands: command_tx.clone(),
        };

        let connection = Arc::new(ConnectionChannel::new(ctx.clone()));
        let heartbeat = Arc::new(HeartbeatChannel::new(ctx.clone()));
        let receiver = Arc::new(ReceiverChannel::new(ctx.clone()));
        let media = Arc::new(MediaChannel::new(ctx.clone()));
        let multizone = Arc::new(MultizoneChannel::new(ctx.clone()));
        let auth = Arc::new(AuthChannel::new(ctx.clone()));
        let discovery = Arc::new(DiscoveryChannel::new(ctx.clone()));
        let setup = Arc::new(SetupChannel::new(ctx.clone()));

        let mut router = Router::new(dispatcher.clone());
        router.register(connection.clone() as Arc<dyn Channel>);
        router.register(heartbeat.clone() as Arc<dyn Channel>);
        router.register(receiver.clone() as Arc<dyn Channel>);
        router.register(media.clone() as Arc<dyn Channel>);
        router.register(multizone.clone() as Arc<dyn Channel>);
        router.register(auth.clone() as Arc<dyn Channel>);
        router.register(discovery.clone() as Arc<dyn Channel>);
        router.register(setup.clone() as Arc<dyn Channel>);
        let router = Arc::new(router);

        let state = Arc::new(AtomicU8::new(u8_from_state(ConnectionState::Connecting)));

        // Writer task: the only writer of the TLS stream. Exits either when
        // the outbound queue is closed or when `disconnect()` fires the
        // shutdown signal, dropping `sink` and releasing its half of the
        // socket.
        {
            let mut writer_shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                let mut sink = sink;
                loop {
                    tokio::select! {
                        message = outbound_rx.recv() => {
                            match message {
                                Some(message) => {
                                    if let Err(err) = sink.send(message).await {
                                        warn!("cast transport write failed: {}", err);
                                        break;
                                    }
                                }
                                None => break,
                            }
                        }
                        _ = writer_shutdown.changed() => {
                            let _ = sink.close().await;
                            break;
                        }
                    }
                }
            });
        }

        // Reader task: the only reader of the TLS stream. Touches the
        // heartbeat on every frame regardless of namespace, then routes.
        // Also exits on the shutdown signal so a self-initiated disconnect
        // actually drops `stream` and releases the socket, rather than
        // waiting on the peer to close its end.
        {
            let router = router.clone();
            let heartbeat = heartbeat.clone();
            let command_tx = command_tx.clone();
            let mut reader_shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        frame = stream.next() => {
                            match frame {
                                Some(Ok(message)) => {
                                    heartbeat.touch();
                                    router.route(&message);
                                }
                                Some(Err(err)) => {
                                    warn!("cast transport read failed: {}", err);
                                    let _ = command_tx.send(Command::TransportError(err.to_string()));
                                    break;
                                }
                                None => {
                                    let _ = command_tx.send(Command::TransportClosed);
                                    break;
                                }
                            }
                        }
                        _ = reader_shutdown.changed() => {
                            let _ = command_tx.send(Command::TransportClosed);
                            break;
                        }
                    }
                }
            });
        }

        // Supervisor task: owns the lifecycle state machine.
        {
            let state = state.clone();
            let event_tx = event_tx.clone();
            let session = session.clone();
            let dispatcher = dispatcher.clone();
            let shutdown_tx = shutdown_tx.clone();
            tokio::spawn(async move {
                while let Some(command) = command_rx.recv().await {
                    for event in apply_command(command, &state, &dispatcher, &session, &shutdown_tx) {
                        let _ = event_tx.send(event);
                    }
                }
            });
        }

        // Authenticating: install channels, open the platform connection,
        // send the auth challenge, kick off an initial status poll, and
        // start the heartbeat.
        connection.connect(RECEIVER_ID)?;
        if let Err(err) = auth.send_challenge() {
            warn!("failed to send device auth challenge: {}", err);
        }
        {
            let receiver = receiver.clone();
            tokio::spawn(async move {
                if let Err(err) = receiver.get_status().await {
                    warn!("initial GET_STATUS failed: {}", err);
                }
            });
        }
        heartbeat.clone().spawn(config.heartbeat_interval, config.heartbeat_timeout, shutdown_rx);
        state.store(u8_from_state(ConnectionState::Authenticating), Ordering::SeqCst);

        let client = Client {
            state,
            session,
            dispatcher,
            channels: Channels {
                connection,
                heartbeat,
                receiver,
                media,
                multizone,
                auth,
                discovery,
                setup,
            },
            shutdown: shutdown_tx,
        };
        Ok((client, event_rx))
    }

    pub fn state(&self) -> ConnectionState {
        state_from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn status(&self) -> Option<CastStatus> {
        self.session.lock().expect("session state mutex poisoned").status().cloned()
    }

    pub fn media_status(&self) -> Option<CastMediaStatus> {
        self.session.lock().expect("session state mutex poisoned").media_status().cloned()
    }

    pub fn multizone_status(&self) -> Option<CastMultizoneStatus> {
        self.session
            .lock()
            .expect("session state mutex poisoned")
            .multizone_status()
            .cloned()
    }

    pub fn connected_app(&self) -> Option<CastApp> {
        self.session
            .lock()
            .expect("session state mutex poisoned")
            .connected_app()
            .cloned()
    }

    /// Cancels all pending requests and signals the reader/writer tasks to
    /// drop their halves of the socket, closing the underlying TCP/TLS
    /// connection. The reader task's exit drives the final
    /// `Disconnecting -> Disconnected` transition and `Event::DidDisconnect`
    /// once it observes the shutdown signal. A second call is a no-op.
    pub fn disconnect(&self) {
        let previous = state_from_u8(self.state.swap(u8_from_state(ConnectionState::Disconnecting), Ordering::SeqCst));
        if previous == ConnectionState::Disconnected || previous == ConnectionState::Disconnecting {
            self.state.store(u8_from_state(previous), Ordering::SeqCst);
            return;
        }
        self.dispatcher.drain_on_disconnect();
        let _ = self.shutdown.send(true);
    }

    pub async fn launch(&self, app_id: &str) -> Result<CastApp, Error> {
        let app = self.channels.receiver.launch(app_id).await?;
        self.channels.connection.connect(app.transport_id.clone())?;
        self.session
            .lock()
            .expect("session state mutex poisoned")
            .set_connected_app(Some(app.clone()));
        Ok(app)
    }

    pub async fn launch_default_media_receiver(&self) -> Result<CastApp, Error> {
        self.launch(DEFAULT_MEDIA_RECEIVER_APP_ID).await
    }

    /// Attach to an already-running app session instead of launching one.
    pub async fn join(&self, app_id: &str) -> Result<CastApp, Error> {
        let status = self.channels.receiver.get_status().await?;
        let app = status
            .apps
            .into_iter()
            .find(|app| app.id == app_id)
            .ok_or_else(|| Error::Session(format!("no running app with id {app_id}")))?;
        self.channels.connection.connect(app.transport_id.clone())?;
        self.session
            .lock()
            .expect("session state mutex poisoned")
            .set_connected_app(Some(app.clone()));
        Ok(app)
    }

    pub fn leave(&self, app: &CastApp) -> Result<(), Error> {
        self.channels.connection.close(app.transport_id.clone())?;
        let mut session = self.session.lock().expect("session state mutex poisoned");
        if session.connected_app().map(|connected| connected == app).unwrap_or(false) {
            session.set_connected_app(None);
        }
        Ok(())
    }

    pub async fn load(&self, app: &CastApp, media: MediaInformation, autoplay: bool) -> Result<CastMediaStatus, Error> {
        self.channels.media.load(app, media, autoplay).await
    }

    pub async fn request_media_status(&self, app: &CastApp) -> Result<Option<CastMediaStatus>, Error> {
        self.channels.media.get_status(app).await
    }

    /// If no `mediaSessionId` is cached, issue `GET_STATUS` first, then
    /// return whichever id is now known.
    async fn ensure_media_session_id(&self, app: &CastApp) -> Result<Option<i64>, Error> {
        let cached = self
            .session
            .lock()
            .expect("session state mutex poisoned")
            .media_status()
            .map(|status| status.media_session_id);
        if cached.is_some() {
            return Ok(cached);
        }
        Ok(self
            .channels
            .media
            .get_status(app)
            .await?
            .map(|status| status.media_session_id))
    }

    /// No-op with no side effect when no media session is known.
    pub async fn play(&self, app: &CastApp) -> Result<(), Error> {
        match self.ensure_media_session_id(app).await? {
            Some(id) => self.channels.media.play(app, id).await,
            None => Ok(()),
        }
    }

    pub async fn pause(&self, app: &CastApp) -> Result<(), Error> {
        match self.ensure_media_session_id(app).await? {
            Some(id) => self.channels.media.pause(app, id).await,
            None => Ok(()),
        }
    }

    pub async fn stop(&self, app: &CastApp) -> Result<(), Error> {
        match self.ensure_media_session_id(app).await? {
            Some(id) => self.channels.media.stop(app, id).await,
            None => Ok(()),
        }
    }

    pub async fn seek(&self, app: &CastApp, current_time: f64) -> Result<(), Error> {
        match self.ensure_media_session_id(app).await? {
            Some(id) => self.channels.media.seek(app, id, current_time).await,
            None => Ok(()),
        }
    }

    pub async fn set_volume(&self, level: f64) -> Result<(), Error> {
        self.channels.receiver.set_volume_level(level).await
    }

    pub async fn set_muted(&self, muted: bool) -> Result<(), Error> {
        self.channels.receiver.set_muted(muted).await
    }

    pub fn set_volume_multizone(&self, device_id: &str, level: f64) -> Result<(), Error> {
        self.channels.multizone.set_volume(device_id, level)
    }

    pub async fn multizone_group_status(&self) -> Result<CastMultizoneStatus, Error> {
        self.channels.multizone.get_status().await
    }

    pub async fn get_app_availability(&self, app_ids: Vec<String>) -> Result<HashMap<String, Availability>, Error> {
        self.channels.receiver.get_app_availability(app_ids).await
    }

    /// No-op with no side effect when no app is connected.
    pub async fn stop_current_app(&self) -> Result<(), Error> {
        let app = self
            .session
            .lock()
            .expect("session state mutex poisoned")
            .connected_app()
            .cloned();
        match app {
            Some(app) => {
                self.channels.receiver.stop(&app.session_id).await?;
                self.session
                    .lock()
                    .expect("session state mutex poisoned")
                    .set_connected_app(None);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Drain `events` on a dedicated task, dispatching each to the matching
/// `Observer` method. An alternative to polling the event channel directly.
pub fn drive_observer(mut events: mpsc::UnboundedReceiver<Event>, observer: Arc<dyn Observer>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                Event::WillConnect => observer.will_connect(),
                Event::DidConnect => observer.did_connect(),
                Event::DidDisconnect => observer.did_disconnect(),
                Event::ConnectionDidFail(reason) => observer.connection_did_fail(&reason),
                Event::DeviceStatusDidChange(status) => observer.device_status_did_change(&status),
                Event::MediaStatusDidChange(status) => observer.media_status_did_change(&status),
                Event::MultizoneStatusDidChange(status) => observer.multizone_status_did_change(&status),
            }
        }
    })
}

/// Applies one supervisor command to the lifecycle state machine, returning
/// the events to publish in order. Kept free of the socket/channel plumbing
/// so the transitions can be exercised directly in tests.
fn apply_command(
    command: Command,
    state: &AtomicU8,
    dispatcher: &Dispatcher,
    session: &Mutex<SessionState>,
    shutdown_tx: &watch::Sender<bool>,
) -> Vec<Event> {
    match command {
        Command::HeartbeatConnected => {
            if state_from_u8(state.load(Ordering::SeqCst)) == ConnectionState::Authenticating {
                state.store(u8_from_state(ConnectionState::Connected), Ordering::SeqCst);
                vec![Event::DidConnect]
            } else {
                Vec::new()
            }
        }
        Command::HeartbeatTimeout => {
            begin_disconnecting(state, dispatcher, shutdown_tx);
            Vec::new()
        }
        Command::TransportError(message) => {
            begin_disconnecting(state, dispatcher, shutdown_tx);
            vec![Event::ConnectionDidFail(message)]
        }
        Command::TransportClosed => {
            let previous = state_from_u8(state.load(Ordering::SeqCst));
            let was_live = previous != ConnectionState::Disconnected;
            let mut events = Vec::new();
            if was_live && previous != ConnectionState::Disconnecting {
                events.push(Event::ConnectionDidFail("transport closed unexpectedly".to_owned()));
            }
            begin_disconnecting(state, dispatcher, shutdown_tx);
            state.store(u8_from_state(ConnectionState::Disconnected), Ordering::SeqCst);
            session.lock().expect("session state mutex poisoned").clear();
            if was_live {
                events.push(Event::DidDisconnect);
            }
            events
        }
    }
}

fn begin_disconnecting(state: &AtomicU8, dispatcher: &Dispatcher, shutdown_tx: &watch::Sender<bool>) {
    let previous = state_from_u8(state.swap(u8_from_state(ConnectionState::Disconnecting), Ordering::SeqCst));
    if previous == ConnectionState::Disconnecting || previous == ConnectionState::Disconnected {
        return;
    }
    dispatcher.drain_on_disconnect();
    let _ = shutdown_tx.send(true);
}

/// Exercises the dispatcher/router/channel pipeline and the lifecycle state
/// machine (`apply_command`) directly, bypassing `transport::open`'s real
/// TCP+TLS handshake, the same way the individual channel modules test
/// their own wire shapes.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{CastMessage, CastMessage_PayloadType, CastMessage_ProtocolVersion};
    use std::future::Future;

    fn inbound(namespace: &str, destination: &str, payload: serde_json::Value) -> CastMessage {
        let mut message = CastMessage::new();
        message.set_protocol_version(CastMessage_ProtocolVersion::CASTV2_1_0);
        message.set_source_id(RECEIVER_ID.to_owned());
        message.set_destination_id(destination.to_owned());
        message.set_namespace(namespace.to_owned());
        message.set_payload_type(CastMessage_PayloadType::STRING);
        message.set_payload_utf8(payload.to_string());
        message
    }

    struct Harness {
        router: Router,
        heartbeat: Arc<HeartbeatChannel>,
        receiver: Arc<ReceiverChannel>,
        media: Arc<MediaChannel>,
        commands: mpsc::UnboundedReceiver<Command>,
        events: mpsc::UnboundedReceiver<Event>,
    }

    fn harness() -> Harness {
        let (outbound_tx, _outbound_rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new("sender-test".to_owned(), outbound_tx, std::time::Duration::from_secs(30), Some(0));
        let session = Arc::new(Mutex::new(SessionState::default()));
        let (event_tx, events) = mpsc::unbounded_channel();
        let (command_tx, commands) = mpsc::unbounded_channel();
        let ctx = ChannelContext {
            dispatcher: dispatcher.clone(),
            state: session,
            events: event_tx,
            commands: command_tx,
        };

        let heartbeat = Arc::new(HeartbeatChannel::new(ctx.clone()));
        let receiver = Arc::new(ReceiverChannel::new(ctx.clone()));
        let media = Arc::new(MediaChannel::new(ctx.clone()));

        let mut router = Router::new(dispatcher);
        router.register(heartbeat.clone() as Arc<dyn Channel>);
        router.register(receiver.clone() as Arc<dyn Channel>);
        router.register(media.clone() as Arc<dyn Channel>);

        Harness {
            router,
            heartbeat,
            receiver,
            media,
            commands,
            events,
        }
    }

    // The first inbound PONG flips the heartbeat to connected exactly once,
    // surfaced to the supervisor as a single `HeartbeatConnected`.
    #[test]
    fn first_pong_through_the_router_signals_heartbeat_connected_once() {
        let mut harness = harness();
        let pong = inbound(crate::channel::heartbeat::NAMESPACE, "sender-test", serde_json::json!({"type": "PONG"}));
        harness.router.route(&pong);
        harness.router.route(&pong);
        assert!(matches!(harness.commands.try_recv(), Ok(Command::HeartbeatConnected)));
        assert!(harness.commands.try_recv().is_err());
        let _ = harness.heartbeat;
    }

    // An unsolicited RECEIVER_STATUS broadcast (no caller awaiting a
    // response) still updates session state and publishes a change event.
    #[tokio::test]
    async fn unsolicited_receiver_status_updates_session_and_publishes() {
        let mut harness = harness();
        let status = inbound(
            crate::channel::receiver::NAMESPACE,
            "sender-test",
            serde_json::json!({
                "type": "RECEIVER_STATUS",
                "status": {"volume": {"level": 0.3, "muted": false}, "applications": []}
            }),
        );
        harness.router.route(&status);
        match harness.events.try_recv() {
            Ok(Event::DeviceStatusDidChange(status)) => assert_eq!(status.volume, 0.3),
            other => panic!("expected DeviceStatusDidChange, got {other:?}"),
        }
        let _ = harness.receiver;
        let _ = harness.media;
    }

    // GET_STATUS issued on a request id is matched to the caller that sent
    // it via the dispatcher, not delivered as a broadcast.
    #[tokio::test]
    async fn get_status_response_is_correlated_to_the_caller() {
        let harness = harness();
        let call = harness.receiver.get_status();
        tokio::pin!(call);

        // Poll once so the request is registered with the dispatcher before
        // the response races in.
        futures::future::poll_fn(|cx| {
            let _ = call.as_mut().poll(cx);
            std::task::Poll::Ready(())
        })
        .await;

        let response = inbound(
            crate::channel::receiver::NAMESPACE,
            "sender-test",
            serde_json::json!({
                "type": "RECEIVER_STATUS",
                "requestId": 0,
                "status": {"volume": {"level": 0.7, "muted": true}, "applications": []}
            }),
        );
        harness.router.route(&response);

        let status = call.await.expect("get_status should resolve");
        assert_eq!(status.volume, 0.7);
        assert!(status.muted);
    }

    fn state_machine() -> (Arc<AtomicU8>, Dispatcher, Arc<Mutex<SessionState>>, watch::Sender<bool>, watch::Receiver<bool>) {
        let (outbound_tx, _outbound_rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new("sender-test".to_owned(), outbound_tx, std::time::Duration::from_secs(30), Some(0));
        let session = Arc::new(Mutex::new(SessionState::default()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = Arc::new(AtomicU8::new(u8_from_state(ConnectionState::Authenticating)));
        (state, dispatcher, session, shutdown_tx, shutdown_rx)
    }

    // HeartbeatConnected only fires DidConnect out of Authenticating, the
    // transition a fresh connection is in when its first PONG arrives.
    #[test]
    fn heartbeat_connected_in_authenticating_transitions_to_connected() {
        let (state, dispatcher, session, shutdown_tx, _shutdown_rx) = state_machine();
        let events = apply_command(Command::HeartbeatConnected, &state, &dispatcher, &session, &shutdown_tx);
        assert!(matches!(events.as_slice(), [Event::DidConnect]));
        assert_eq!(state_from_u8(state.load(Ordering::SeqCst)), ConnectionState::Connected);
    }

    // A stray second PONG once already Connected is a no-op: no duplicate
    // DidConnect.
    #[test]
    fn heartbeat_connected_once_already_connected_is_a_no_op() {
        let (state, dispatcher, session, shutdown_tx, _shutdown_rx) = state_machine();
        state.store(u8_from_state(ConnectionState::Connected), Ordering::SeqCst);
        let events = apply_command(Command::HeartbeatConnected, &state, &dispatcher, &session, &shutdown_tx);
        assert!(events.is_empty());
    }

    // An unexpected transport loss (peer EOF, heartbeat watchdog fired, or a
    // read error) surfaces `ConnectionDidFail` before the terminal
    // `DidDisconnect`, transitions to Disconnected, and clears session state.
    #[test]
    fn transport_closed_after_unexpected_loss_reports_failure_then_disconnects() {
        let (state, dispatcher, session, shutdown_tx, _shutdown_rx) = state_machine();
        state.store(u8_from_state(ConnectionState::Connected), Ordering::SeqCst);
        session.lock().unwrap().set_connected_app(Some(CastApp {
            id: "CC1AD845".to_owned(),
            session_id: "S".to_owned(),
            transport_id: "T".to_owned(),
            display_name: String::new(),
            status_text: String::new(),
            namespaces: Vec::new(),
        }));

        let events = apply_command(Command::TransportClosed, &state, &dispatcher, &session, &shutdown_tx);

        assert!(matches!(events.as_slice(), [Event::ConnectionDidFail(_), Event::DidDisconnect]));
        assert_eq!(state_from_u8(state.load(Ordering::SeqCst)), ConnectionState::Disconnected);
        assert!(session.lock().unwrap().is_empty());
        assert!(*shutdown_tx.borrow(), "transport closure must signal shutdown so heartbeat tasks stop");
    }

    // A self-initiated disconnect already parked the state machine in
    // Disconnecting before the reader task observes the shutdown signal and
    // reports TransportClosed; that expected closure must not be reported as
    // a connection failure.
    #[test]
    fn transport_closed_after_self_initiated_disconnect_does_not_report_failure() {
        let (state, dispatcher, session, shutdown_tx, _shutdown_rx) = state_machine();
        state.store(u8_from_state(ConnectionState::Disconnecting), Ordering::SeqCst);

        let events = apply_command(Command::TransportClosed, &state, &dispatcher, &session, &shutdown_tx);

        assert!(matches!(events.as_slice(), [Event::DidDisconnect]));
        assert_eq!(state_from_u8(state.load(Ordering::SeqCst)), ConnectionState::Disconnected);
    }

    // A second TransportClosed (e.g. both the reader and writer observing
    // shutdown) is idempotent: already Disconnected, so no further events.
    #[test]
    fn second_transport_closed_is_idempotent() {
        let (state, dispatcher, session, shutdown_tx, _shutdown_rx) = state_machine();
        state.store(u8_from_state(ConnectionState::Disconnected), Ordering::SeqCst);

        let events = apply_command(Command::TransportClosed, &state, &dispatcher, &session, &shutdown_tx);

        assert!(events.is_empty());
        assert_eq!(state_from_u8(state.load(Ordering::SeqCst)), ConnectionState::Disconnected);
    }
}
