//! A Google Cast V2 protocol engine: frame codec, TLS transport, request
//! dispatch, per-namespace channels and deduplicated session state for a
//! Cast sender. Device discovery, a local media player, TLS certificate
//! bootstrapping and any UI are external collaborators this crate does not
//! provide (see `DESIGN.md`).

#[macro_use]
extern crate log;

mod channel;
mod client;
mod codec;
mod config;
mod device;
mod dispatcher;
mod error;
mod message;
#[allow(clippy::all, clippy::pedantic)]
mod proto;
mod router;
mod session;
mod transport;

pub mod payload;

pub use client::{drive_observer, Client, ConnectionState};
pub use config::ClientConfig;
pub use device::{CastDevice, DeviceCapabilities};
pub use error::{Error, RequestError};
pub use payload::media::MediaInformation;
pub use payload::receiver::Availability;
pub use session::{
    CastApp, CastMediaStatus, CastMultizoneDevice, CastMultizoneStatus, CastStatus, IdleReason,
    MediaMetadata, PlayerState,
};

/// Notifications pushed to callers as session state changes. Delivered on
/// the unbounded channel returned by [`Client::connect`]. Callers who would
/// rather implement a delegate than poll a channel can instead hand that
/// receiver to [`drive_observer`] along with an [`Observer`] impl.
#[derive(Debug, Clone)]
pub enum Event {
    WillConnect,
    DidConnect,
    DidDisconnect,
    ConnectionDidFail(String),
    DeviceStatusDidChange(CastStatus),
    MediaStatusDidChange(CastMediaStatus),
    MultizoneStatusDidChange(CastMultizoneStatus),
}

/// Delegate counterpart to [`Event`]. Every method defaults to a no-op, so
/// an implementor only overrides the notifications it cares about.
pub trait Observer: Send + Sync {
    fn will_connect(&self) {}
    fn did_connect(&self) {}
    fn did_disconnect(&self) {}
    fn connection_did_fail(&self, _reason: &str) {}
    fn device_status_did_change(&self, _status: &CastStatus) {}
    fn media_status_did_change(&self, _status: &CastMediaStatus) {}
    fn multizone_status_did_change(&self, _status: &CastMultizoneStatus) {}
}
