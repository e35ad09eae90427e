//! The receiver channel manages global receiver state: the active cast
//! app(s), device volume, and app availability.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    Launch { app_id: String },
    #[serde(rename_all = "camelCase")]
    Stop { session_id: String },
    GetStatus,
    #[serde(rename_all = "camelCase")]
    GetAppAvailability { app_id: Vec<String> },
    SetVolume { volume: Volume },
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    ReceiverStatus { status: Status },
    #[serde(rename_all = "camelCase")]
    GetAppAvailability { availability: std::collections::HashMap<String, Availability> },
    #[serde(rename_all = "camelCase")]
    LaunchError { reason: Option<String> },
    InvalidRequest {
        reason: Option<String>,
    },
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[serde(alias = "APP_AVAILABLE")]
    Available,
    #[serde(alias = "APP_UNAVAILABLE")]
    Unavailable,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub is_active_input: bool,
    pub volume: Volume,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub app_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    pub session_id: String,
    #[serde(default)]
    pub status_text: String,
    pub transport_id: String,
}

#[derive(Deserialize, Debug)]
pub struct Namespace {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Volume {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
}
