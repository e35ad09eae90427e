//! Device setup queries on `urn:x-cast:com.google.cast.setup`.

use crate::channel::{Channel, ChannelContext};
use crate::error::Error;
use crate::payload::setup::{Request, Response};

pub const NAMESPACE: &str = "urn:x-cast:com.google.cast.setup";

pub struct SetupChannel {
    ctx: ChannelContext,
}

impl SetupChannel {
    pub fn new(ctx: ChannelContext) -> Self {
        Self { ctx }
    }

    async fn request(&self, destination: &str, payload: Request) -> Result<Response, Error> {
        let value = serde_json::to_value(payload).expect("setup request always serializes");
        let request = self.ctx.dispatcher.build_json_request(NAMESPACE, destination, value);
        let rx = self.ctx.dispatcher.send(request)?;
        let value = rx
            .await
            .map_err(|_| Error::Session("dispatcher dropped the response channel".to_owned()))??;
        serde_json::from_value(value)
            .map_err(|err| Error::Session(format!("failed to parse setup response: {err}")))
    }

    pub async fn get_device_config(&self, destination: &str) -> Result<serde_json::Value, Error> {
        match self.request(destination, Request::GetDeviceConfig).await? {
            Response::DeviceConfig { data } => Ok(data),
            other => Err(Error::Session(format!("unexpected setup response: {other:?}"))),
        }
    }

    pub async fn get_app_device_id(&self, destination: &str, app_id: &str) -> Result<String, Error> {
        match self
            .request(destination, Request::GetAppDeviceId { app_id: app_id.to_owned() })
            .await?
        {
            Response::AppDeviceId { device_id } => Ok(device_id),
            other => Err(Error::Session(format!("unexpected setup response: {other:?}"))),
        }
    }
}

impl Channel for SetupChannel {
    fn namespace(&self) -> &str {
        NAMESPACE
    }
}
