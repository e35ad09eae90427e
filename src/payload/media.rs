//! The media channel manages media sessions and playback. See the
//! [cast reference docs](https://developers.google.com/cast/docs/reference/messages).

use serde::{Deserialize, Serialize};

const METADATA_TYPE_GENERIC: u32 = 0;
const METADATA_TYPE_MUSIC_TRACK: u32 = 3;

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    GetStatus {
        #[serde(skip_serializing_if = "Option::is_none")]
        media_session_id: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    Load {
        session_id: String,
        media: MediaInformation,
        #[serde(skip_serializing_if = "Option::is_none")]
        autoplay: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_time: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Play { media_session_id: i64 },
    #[serde(rename_all = "camelCase")]
    Pause { media_session_id: i64 },
    #[serde(rename_all = "camelCase")]
    Stop { media_session_id: i64 },
    #[serde(rename_all = "camelCase")]
    Seek {
        media_session_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        resume_state: Option<ResumeState>,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_time: Option<f64>,
    },
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    MediaStatus { status: Vec<MediaStatus> },
    LoadCancelled,
    LoadFailed,
    InvalidPlayerState,
    InvalidRequest { reason: Option<String> },
}

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResumeState {
    PlaybackStart,
    PlaybackPause,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MediaInformation {
    pub content_id: String,
    pub stream_type: StreamType,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamType {
    None,
    Buffered,
    Live,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub metadata_type: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl Metadata {
    pub fn music_default() -> Self {
        Self {
            metadata_type: METADATA_TYPE_MUSIC_TRACK,
            ..Self::default()
        }
    }

    pub fn generic_default() -> Self {
        Self {
            metadata_type: METADATA_TYPE_GENERIC,
            ..Self::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Image {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MediaStatus {
    pub media_session_id: i64,
    #[serde(default)]
    pub media: Option<MediaInformation>,
    #[serde(default)]
    pub playback_rate: f64,
    pub player_state: PlayerState,
    #[serde(default)]
    pub idle_reason: Option<IdleReason>,
    #[serde(default)]
    pub current_time: f64,
}

#[derive(Deserialize, Debug, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerState {
    Idle,
    Playing,
    Buffering,
    Paused,
}

#[derive(Deserialize, Debug, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdleReason {
    Cancelled,
    Interrupted,
    Finished,
    Error,
}
