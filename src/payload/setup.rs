//! Device setup queries on `urn:x-cast:com.google.cast.setup`.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GetDeviceConfig,
    #[serde(rename_all = "camelCase")]
    GetAppDeviceId { app_id: String },
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    DeviceConfig { data: serde_json::Value },
    #[serde(rename_all = "camelCase")]
    AppDeviceId { device_id: String },
}
