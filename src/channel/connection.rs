//! Connection channel: opens a virtual connection to the receiver platform
//! or to an app's transport with `CONNECT`, tears one down with `CLOSE`.
//! Neither carries a meaningful response.

use crate::channel::{Channel, ChannelContext, ChannelError};
use crate::error::Error;
use crate::payload::connection::{Request, Response};

pub const NAMESPACE: &str = "urn:x-cast:com.google.cast.tp.connection";
const USER_AGENT: &str = "cast-client";

pub struct ConnectionChannel {
    ctx: ChannelContext,
}

impl ConnectionChannel {
    pub fn new(ctx: ChannelContext) -> Self {
        Self { ctx }
    }

    /// Open a virtual connection to `destination` (`receiver-0`, or an
    /// app's `transportId`). Fire-and-forget: no response is expected.
    pub fn connect(&self, destination: impl Into<String>) -> Result<(), Error> {
        self.send(destination, Request::Connect {
            user_agent: USER_AGENT.to_owned(),
        })
    }

    /// Close the virtual connection to `destination`.
    pub fn close(&self, destination: impl Into<String>) -> Result<(), Error> {
        self.send(destination, Request::Close)
    }

    fn send(&self, destination: impl Into<String>, payload: Request) -> Result<(), Error> {
        let value = serde_json::to_value(payload).expect("connection request always serializes");
        let request = self
            .ctx
            .dispatcher
            .build_json_request(NAMESPACE, destination, value);
        self.ctx
            .dispatcher
            .send_fire_and_forget(request)
            .map_err(Error::from)
    }
}

impl Channel for ConnectionChannel {
    fn namespace(&self) -> &str {
        NAMESPACE
    }

    fn handle_json(&self, payload: serde_json::Value, source_id: &str) -> Result<(), ChannelError> {
        let response: Response =
            serde_json::from_value(payload).map_err(|err| ChannelError::Parse(err.to_string()))?;
        match response {
            Response::Close => debug!("peer {} closed its connection", source_id),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_request_matches_wire_shape() {
        let value = serde_json::to_value(Request::Connect {
            user_agent: USER_AGENT.to_owned(),
        })
        .unwrap();
        assert_eq!(value["type"], "CONNECT");
        assert_eq!(value["userAgent"], USER_AGENT);
    }
}
