//! One-shot device discovery/info messages on
//! `urn:x-cast:com.google.cast.discovery`. Not to be confused with the
//! mDNS/Bonjour scanner, which this crate does not implement — this is an
//! in-band query the sender issues to a device it is already connected to.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GetDeviceInfo,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    DeviceInfo { data: serde_json::Value },
}
