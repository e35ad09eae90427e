//! Receiver channel: global receiver state — volume, mute, launched apps,
//! and app availability. Requests are correlated to their responses
//! through the dispatcher rather than relying on a broadcast status
//! channel.

use std::collections::HashMap;

use crate::channel::{Channel, ChannelContext, ChannelError};
use crate::error::Error;
use crate::message::RECEIVER_ID;
use crate::payload::receiver::{Application, Availability, Request, Response, Status, Volume};
use crate::session::{CastApp, CastStatus};
use crate::Event;

pub const NAMESPACE: &str = "urn:x-cast:com.google.cast.receiver";

pub struct ReceiverChannel {
    ctx: ChannelContext,
}

impl ReceiverChannel {
    pub fn new(ctx: ChannelContext) -> Self {
        Self { ctx }
    }

    async fn request(&self, payload: Request) -> Result<Response, Error> {
        let value = serde_json::to_value(payload).expect("receiver request always serializes");
        let request = self.ctx.dispatcher.build_json_request(NAMESPACE, RECEIVER_ID, value);
        let rx = self.ctx.dispatcher.send(request)?;
        let value = rx
            .await
            .map_err(|_| Error::Session("dispatcher dropped the response channel".to_owned()))??;
        serde_json::from_value(value)
            .map_err(|err| Error::Session(format!("failed to parse receiver response: {err}")))
    }

    pub async fn get_status(&self) -> Result<CastStatus, Error> {
        match self.request(Request::GetStatus).await? {
            Response::ReceiverStatus { status } => Ok(self.publish_status(status)),
            other => Err(unexpected(&other)),
        }
    }

    /// Launch `app_id`. On success, returns the parsed `CastApp` the
    /// receiver reported, not the raw response.
    pub async fn launch(&self, app_id: &str) -> Result<CastApp, Error> {
        match self
            .request(Request::Launch {
                app_id: app_id.to_owned(),
            })
            .await?
        {
            Response::ReceiverStatus { status } => {
                let app = status
                    .applications
                    .iter()
                    .find(|application| application.app_id == app_id)
                    .map(to_cast_app)
                    .ok_or_else(|| {
                        Error::Launch(format!("receiver did not report app {app_id} after launch"))
                    })?;
                self.publish_status(status);
                Ok(app)
            }
            Response::LaunchError { reason } => {
                Err(Error::Launch(reason.unwrap_or_else(|| "launch failed".to_owned())))
            }
            other => Err(unexpected(&other)),
        }
    }

    pub async fn stop(&self, session_id: &str) -> Result<(), Error> {
        match self
            .request(Request::Stop {
                session_id: session_id.to_owned(),
            })
            .await?
        {
            Response::ReceiverStatus { status } => {
                self.publish_status(status);
                Ok(())
            }
            other => Err(unexpected(&other)),
        }
    }

    pub async fn set_volume_level(&self, level: f64) -> Result<(), Error> {
        self.set_volume(Volume {
            level: Some(level),
            muted: None,
        })
        .await
    }

    pub async fn set_muted(&self, muted: bool) -> Result<(), Error> {
        self.set_volume(Volume {
            level: None,
            muted: Some(muted),
        })
        .await
    }

    async fn set_volume(&self, volume: Volume) -> Result<(), Error> {
        match self.request(Request::SetVolume { volume }).await? {
            Response::ReceiverStatus { status } => {
                self.publish_status(status);
                Ok(())
            }
            other => Err(unexpected(&other)),
        }
    }

    pub async fn get_app_availability(
        &self,
        app_ids: Vec<String>,
    ) -> Result<HashMap<String, Availability>, Error> {
        match self.request(Request::GetAppAvailability { app_id: app_ids }).await? {
            Response::GetAppAvailability { availability } => Ok(availability),
            other => Err(unexpected(&other)),
        }
    }

    fn publish_status(&self, status: Status) -> CastStatus {
        let status = to_cast_status(status);
        let changed = {
            let mut state = self.ctx.state.lock().expect("session state mutex poisoned");
            state.set_status(status.clone())
        };
        if let Some(status) = changed {
            let _ = self.ctx.publish(Event::DeviceStatusDidChange(status));
        }
        status
    }
}

impl Channel for ReceiverChannel {
    fn namespace(&self) -> &str {
        NAMESPACE
    }

    fn handle_json(&self, payload: serde_json::Value, _source_id: &str) -> Result<(), ChannelError> {
        let response: Response =
            serde_json::from_value(payload).map_err(|err| ChannelError::Parse(err.to_string()))?;
        if let Response::ReceiverStatus { status } = response {
            self.publish_status(status);
        }
        Ok(())
    }
}

fn to_cast_app(application: &Application) -> CastApp {
    CastApp {
        id: application.app_id.clone(),
        session_id: application.session_id.clone(),
        transport_id: application.transport_id.clone(),
        display_name: application.display_name.clone(),
        status_text: application.status_text.clone(),
        namespaces: application
            .namespaces
            .iter()
            .map(|namespace| namespace.name.clone())
            .collect(),
    }
}

fn to_cast_status(status: Status) -> CastStatus {
    CastStatus {
        volume: status.volume.level.unwrap_or(0.0),
        muted: status.volume.muted.unwrap_or(false),
        apps: status.applications.iter().map(to_cast_app).collect(),
    }
}

fn unexpected(response: &Response) -> Error {
    Error::Session(format!("unexpected receiver response: {response:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_request_matches_wire_shape() {
        let value = serde_json::to_value(Request::Launch {
            app_id: "CC1AD845".to_owned(),
        })
        .unwrap();
        assert_eq!(value["type"], "LAUNCH");
        assert_eq!(value["appId"], "CC1AD845");
    }

    #[test]
    fn receiver_status_parses_volume_and_apps() {
        let payload = serde_json::json!({
            "type": "RECEIVER_STATUS",
            "requestId": 0,
            "status": {
                "volume": {"level": 0.5, "muted": false},
                "applications": [],
            }
        });
        let response: Response = serde_json::from_value(payload).unwrap();
        match response {
            Response::ReceiverStatus { status } => {
                let status = to_cast_status(status);
                assert_eq!(status.volume, 0.5);
                assert!(!status.muted);
                assert!(status.apps.is_empty());
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
