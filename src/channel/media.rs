//! Media channel: load, playback control, and status for a media session
//! inside a launched app. `load` and the playback operations resolve
//! directly through dispatcher-correlated responses rather than waiting on
//! the next broadcast status.

use std::time::Instant;

use crate::channel::{Channel, ChannelContext, ChannelError};
use crate::error::Error;
use crate::payload::media::{self, MediaInformation, Request, Response};
use crate::session::{self, CastApp, CastMediaStatus};
use crate::Event;

pub const NAMESPACE: &str = "urn:x-cast:com.google.cast.media";

pub struct MediaChannel {
    ctx: ChannelContext,
}

impl MediaChannel {
    pub fn new(ctx: ChannelContext) -> Self {
        Self { ctx }
    }

    async fn request(&self, destination: &str, payload: Request) -> Result<Response, Error> {
        let value = serde_json::to_value(payload).expect("media request always serializes");
        let request = self
            .ctx
            .dispatcher
            .build_json_request(NAMESPACE, destination, value);
        let rx = self.ctx.dispatcher.send(request)?;
        let value = rx
            .await
            .map_err(|_| Error::Session("dispatcher dropped the response channel".to_owned()))??;
        serde_json::from_value(value)
            .map_err(|err| Error::Session(format!("failed to parse media response: {err}")))
    }

    pub async fn get_status(&self, app: &CastApp) -> Result<Option<CastMediaStatus>, Error> {
        match self
            .request(&app.transport_id, Request::GetStatus { media_session_id: None })
            .await?
        {
            Response::MediaStatus { status } => Ok(status.into_iter().next().map(|status| self.publish_status(status))),
            other => Err(unexpected(&other)),
        }
    }

    /// `LOAD` a new media item into `app`. Per S3, `media.contentId`,
    /// `streamType` and `autoplay` are sent verbatim; the `sessionId`
    /// addressed is the app's, not a media session id (none exists yet).
    pub async fn load(&self, app: &CastApp, media: MediaInformation, autoplay: bool) -> Result<CastMediaStatus, Error> {
        let payload = Request::Load {
            session_id: app.session_id.clone(),
            media,
            autoplay: Some(autoplay),
            current_time: None,
        };
        match self.request(&app.transport_id, payload).await? {
            Response::MediaStatus { status } => status
                .into_iter()
                .next()
                .map(|status| self.publish_status(status))
                .ok_or_else(|| Error::Load("receiver accepted LOAD but reported no media status".to_owned())),
            Response::LoadFailed => Err(Error::Load("receiver reported LOAD_FAILED".to_owned())),
            Response::LoadCancelled => Err(Error::Load("receiver reported LOAD_CANCELLED".to_owned())),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn play(&self, app: &CastApp, media_session_id: i64) -> Result<(), Error> {
        self.simple(app, Request::Play { media_session_id }).await
    }

    pub async fn pause(&self, app: &CastApp, media_session_id: i64) -> Result<(), Error> {
        self.simple(app, Request::Pause { media_session_id }).await
    }

    pub async fn stop(&self, app: &CastApp, media_session_id: i64) -> Result<(), Error> {
        self.simple(app, Request::Stop { media_session_id }).await
    }

    pub async fn seek(&self, app: &CastApp, media_session_id: i64, current_time: f64) -> Result<(), Error> {
        self.simple(
            app,
            Request::Seek {
                media_session_id,
                resume_state: None,
                current_time: Some(current_time),
            },
        )
        .await
    }

    async fn simple(&self, app: &CastApp, payload: Request) -> Result<(), Error> {
        match self.request(&app.transport_id, payload).await? {
            Response::MediaStatus { status } => {
                for status in status {
                    self.publish_status(status);
                }
                Ok(())
            }
            Response::InvalidPlayerState => Err(Error::Session("receiver reported INVALID_PLAYER_STATE".to_owned())),
            Response::InvalidRequest { reason } => {
                Err(Error::Session(reason.unwrap_or_else(|| "invalid media request".to_owned())))
            }
            other => Err(unexpected(&other)),
        }
    }

    fn publish_status(&self, status: media::MediaStatus) -> CastMediaStatus {
        let status = to_cast_media_status(status);
        let changed = {
            let mut state = self.ctx.state.lock().expect("session state mutex poisoned");
            state.set_media_status(status.clone())
        };
        if let Some(status) = changed {
            let _ = self.ctx.publish(Event::MediaStatusDidChange(status));
        }
        status
    }
}

impl Channel for MediaChannel {
    fn namespace(&self) -> &str {
        NAMESPACE
    }

    fn handle_json(&self, payload: serde_json::Value, _source_id: &str) -> Result<(), ChannelError> {
        let response: Response =
            serde_json::from_value(payload).map_err(|err| ChannelError::Parse(err.to_string()))?;
        if let Response::MediaStatus { status } = response {
            for status in status {
                self.publish_status(status);
            }
        }
        Ok(())
    }
}

fn to_cast_media_status(status: media::MediaStatus) -> CastMediaStatus {
    CastMediaStatus {
        media_session_id: status.media_session_id,
        player_state: match status.player_state {
            media::PlayerState::Idle => session::PlayerState::Idle,
            media::PlayerState::Playing => session::PlayerState::Playing,
            media::PlayerState::Paused => session::PlayerState::Paused,
            media::PlayerState::Buffering => session::PlayerState::Buffering,
        },
        current_time: status.current_time,
        idle_reason: status.idle_reason.map(|reason| match reason {
            media::IdleReason::Cancelled => session::IdleReason::Cancelled,
            media::IdleReason::Interrupted => session::IdleReason::Interrupted,
            media::IdleReason::Finished => session::IdleReason::Finished,
            media::IdleReason::Error => session::IdleReason::Error,
        }),
        metadata: status
            .media
            .and_then(|media| media.metadata)
            .map(|metadata| session::MediaMetadata {
                title: metadata.title,
                artist: metadata.artist,
                album: metadata.album_name,
            })
            .unwrap_or_default(),
        observed_at: Instant::now(),
    }
}

fn unexpected(response: &Response) -> Error {
    Error::Session(format!("unexpected media response: {response:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::media::StreamType;

    #[test]
    fn load_request_matches_wire_shape() {
        let media = MediaInformation {
            content_id: "http://x/y.mp3".to_owned(),
            stream_type: StreamType::Live,
            content_type: "audio/mpeg".to_owned(),
            metadata: None,
            duration: None,
        };
        let value = serde_json::to_value(Request::Load {
            session_id: "S".to_owned(),
            media,
            autoplay: Some(true),
            current_time: None,
        })
        .unwrap();
        assert_eq!(value["type"], "LOAD");
        assert_eq!(value["media"]["contentId"], "http://x/y.mp3");
        assert_eq!(value["media"]["streamType"], "LIVE");
        assert_eq!(value["autoplay"], true);
    }

    #[test]
    fn media_status_conversion_preserves_session_id_and_state() {
        let payload = serde_json::json!({
            "type": "MEDIA_STATUS",
            "requestId": 0,
            "status": [{
                "mediaSessionId": 7,
                "playerState": "PLAYING",
                "currentTime": 1.5,
            }]
        });
        let response: Response = serde_json::from_value(payload).unwrap();
        match response {
            Response::MediaStatus { status } => {
                let status = to_cast_media_status(status.into_iter().next().unwrap());
                assert_eq!(status.media_session_id, 7);
                assert_eq!(status.player_state, session::PlayerState::Playing);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
