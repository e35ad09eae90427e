//! Device auth channel: sends one protobuf `DeviceAuthMessage{challenge}`
//! right after TCP+TLS open. The response is parsed only to confirm the
//! channel is usable — an auth error does not fail the session.

use protobuf::Message;

use crate::channel::{Channel, ChannelContext, ChannelError};
use crate::error::Error;
use crate::message::RECEIVER_ID;
use crate::proto::{AuthChallenge, DeviceAuthMessage};

pub const NAMESPACE: &str = "urn:x-cast:com.google.cast.tp.deviceauth";

pub struct AuthChannel {
    ctx: ChannelContext,
}

impl AuthChannel {
    pub fn new(ctx: ChannelContext) -> Self {
        Self { ctx }
    }

    /// Send the one auth challenge this channel ever sends, fire-and-forget.
    pub fn send_challenge(&self) -> Result<(), Error> {
        let mut message = DeviceAuthMessage::new();
        message.set_challenge(AuthChallenge::new());
        let bytes = message
            .write_to_bytes()
            .map_err(|err| Error::Connection(format!("failed to encode auth challenge: {err}")))?;
        let request = self.ctx.dispatcher.build_binary_request(NAMESPACE, RECEIVER_ID, bytes);
        self.ctx.dispatcher.send_fire_and_forget(request).map_err(Error::from)
    }
}

impl Channel for AuthChannel {
    fn namespace(&self) -> &str {
        NAMESPACE
    }

    fn handle_binary(&self, payload: &[u8], _source_id: &str) -> Result<(), ChannelError> {
        match DeviceAuthMessage::parse_from_bytes(payload) {
            Ok(message) if message.has_error() => {
                warn!("receiver reported an auth error: {:?}", message.get_error());
            }
            Ok(_) => debug!("received device auth response"),
            Err(err) => warn!("failed to parse device auth response: {err}"),
        }
        Ok(())
    }
}
