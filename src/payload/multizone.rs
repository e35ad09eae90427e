//! Multizone groups front multiple audio devices and expose per-device
//! volume/mute, plus add/update/remove notifications as devices join or
//! leave the group.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GetStatus,
    #[serde(rename_all = "camelCase")]
    SetVolume {
        device_id: String,
        volume: super::receiver::Volume,
    },
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    MultizoneStatus { status: Status },
    #[serde(rename_all = "camelCase")]
    DeviceAdded { device: Device },
    #[serde(rename_all = "camelCase")]
    DeviceUpdated { device: Device },
    #[serde(rename_all = "camelCase")]
    DeviceRemoved { device_id: String },
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub capabilities: u8,
    pub volume: super::receiver::Volume,
}
