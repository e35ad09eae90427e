//! One-shot device discovery/info query on
//! `urn:x-cast:com.google.cast.discovery`. Not to be confused with the
//! mDNS/Bonjour scanner, which this crate does not implement — this is an
//! in-band query the sender issues to a device it is already connected to.

use crate::channel::{Channel, ChannelContext};
use crate::error::Error;
use crate::payload::discovery::{Request, Response};

pub const NAMESPACE: &str = "urn:x-cast:com.google.cast.discovery";

pub struct DiscoveryChannel {
    ctx: ChannelContext,
}

impl DiscoveryChannel {
    pub fn new(ctx: ChannelContext) -> Self {
        Self { ctx }
    }

    pub async fn get_device_info(&self, destination: &str) -> Result<serde_json::Value, Error> {
        let value = serde_json::to_value(Request::GetDeviceInfo).expect("GET_DEVICE_INFO always serializes");
        let request = self.ctx.dispatcher.build_json_request(NAMESPACE, destination, value);
        let rx = self.ctx.dispatcher.send(request)?;
        let value = rx
            .await
            .map_err(|_| Error::Session("dispatcher dropped the response channel".to_owned()))??;
        match serde_json::from_value::<Response>(value.clone()) {
            Ok(Response::DeviceInfo { data }) => Ok(data),
            Err(_) => Ok(value),
        }
    }
}

impl Channel for DiscoveryChannel {
    fn namespace(&self) -> &str {
        NAMESPACE
    }
}
