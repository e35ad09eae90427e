//! Multizone channel: a receiver that fronts multiple audio devices
//! publishes per-device volume/mute, plus add/update/remove events as
//! devices join or leave the group. Uses the same tagged-enum
//! request/response shape as `channel/receiver.rs`, extended with a local
//! device cache so incremental add/update/remove events can be folded into
//! one `CastMultizoneStatus` snapshot.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::channel::{Channel, ChannelContext, ChannelError};
use crate::error::Error;
use crate::message::RECEIVER_ID;
use crate::payload::multizone::{Device, Request, Response};
use crate::payload::receiver::Volume;
use crate::session::{CastMultizoneDevice, CastMultizoneStatus};
use crate::Event;

pub const NAMESPACE: &str = "urn:x-cast:com.google.cast.multizone";

pub struct MultizoneChannel {
    ctx: ChannelContext,
    devices: Mutex<HashMap<String, Device>>,
}

impl MultizoneChannel {
    pub fn new(ctx: ChannelContext) -> Self {
        Self {
            ctx,
            devices: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_status(&self) -> Result<CastMultizoneStatus, Error> {
        let value = serde_json::to_value(Request::GetStatus).expect("GET_STATUS always serializes");
        let request = self.ctx.dispatcher.build_json_request(NAMESPACE, RECEIVER_ID, value);
        let rx = self.ctx.dispatcher.send(request)?;
        let value = rx
            .await
            .map_err(|_| Error::Session("dispatcher dropped the response channel".to_owned()))??;
        let response: Response = serde_json::from_value(value)
            .map_err(|err| Error::Session(format!("failed to parse multizone response: {err}")))?;
        match response {
            Response::MultizoneStatus { status } => Ok(self.replace_all(status.devices)),
            other => Err(Error::Session(format!("unexpected multizone response: {other:?}"))),
        }
    }

    /// Set the volume of one device within the group. Fire-and-forget: the
    /// receiver follows up with a `DEVICE_UPDATED` event on its own.
    pub fn set_volume(&self, device_id: &str, level: f64) -> Result<(), Error> {
        let request = Request::SetVolume {
            device_id: device_id.to_owned(),
            volume: Volume {
                level: Some(level),
                muted: None,
            },
        };
        let value = serde_json::to_value(request).expect("multizone SET_VOLUME always serializes");
        let request = self.ctx.dispatcher.build_json_request(NAMESPACE, RECEIVER_ID, value);
        self.ctx.dispatcher.send_fire_and_forget(request).map_err(Error::from)
    }

    fn replace_all(&self, devices: Vec<Device>) -> CastMultizoneStatus {
        let mut cache = self.devices.lock().expect("multizone device cache mutex poisoned");
        cache.clear();
        for device in devices {
            cache.insert(device.device_id.clone(), device);
        }
        let snapshot = cache.values().cloned().collect();
        drop(cache);
        self.publish(snapshot)
    }

    fn upsert(&self, device: Device) -> CastMultizoneStatus {
        let snapshot = {
            let mut cache = self.devices.lock().expect("multizone device cache mutex poisoned");
            cache.insert(device.device_id.clone(), device);
            cache.values().cloned().collect()
        };
        self.publish(snapshot)
    }

    fn remove(&self, device_id: &str) -> CastMultizoneStatus {
        let snapshot = {
            let mut cache = self.devices.lock().expect("multizone device cache mutex poisoned");
            cache.remove(device_id);
            cache.values().cloned().collect()
        };
        self.publish(snapshot)
    }

    fn publish(&self, devices: Vec<Device>) -> CastMultizoneStatus {
        let status = to_multizone_status(devices);
        let changed = {
            let mut state = self.ctx.state.lock().expect("session state mutex poisoned");
            state.set_multizone_status(status.clone())
        };
        if let Some(status) = changed {
            let _ = self.ctx.publish(Event::MultizoneStatusDidChange(status));
        }
        status
    }
}

impl Channel for MultizoneChannel {
    fn namespace(&self) -> &str {
        NAMESPACE
    }

    fn handle_json(&self, payload: serde_json::Value, _source_id: &str) -> Result<(), ChannelError> {
        let response: Response =
            serde_json::from_value(payload).map_err(|err| ChannelError::Parse(err.to_string()))?;
        match response {
            Response::MultizoneStatus { status } => {
                self.replace_all(status.devices);
            }
            Response::DeviceAdded { device } | Response::DeviceUpdated { device } => {
                self.upsert(device);
            }
            Response::DeviceRemoved { device_id } => {
                self.remove(&device_id);
            }
        }
        Ok(())
    }
}

fn to_multizone_status(devices: Vec<Device>) -> CastMultizoneStatus {
    CastMultizoneStatus {
        devices: devices
            .into_iter()
            .map(|device| CastMultizoneDevice {
                id: device.device_id,
                name: device.name,
                capabilities: device.capabilities,
                volume: device.volume.level.unwrap_or(0.0),
                muted: device.volume.muted.unwrap_or(false),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn channel() -> (MultizoneChannel, mpsc::UnboundedReceiver<Event>) {
        let (outbound_tx, _outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, _command_rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new("sender-test".to_owned(), outbound_tx, Duration::from_secs(30), Some(0));
        let state = Arc::new(StdMutex::new(crate::session::SessionState::default()));
        let ctx = ChannelContext {
            dispatcher,
            state,
            events: event_tx,
            commands: command_tx,
        };
        (MultizoneChannel::new(ctx), event_rx)
    }

    #[test]
    fn device_added_then_removed_updates_snapshot() {
        let (channel, mut events) = channel();
        channel
            .handle_json(
                serde_json::json!({"type": "DEVICE_ADDED", "device": {
                    "deviceId": "d1", "name": "Kitchen", "capabilities": 0,
                    "volume": {"level": 0.4, "muted": false}
                }}),
                "receiver-0",
            )
            .unwrap();
        assert!(matches!(events.try_recv(), Ok(Event::MultizoneStatusDidChange(status)) if status.devices.len() == 1));

        channel
            .handle_json(
                serde_json::json!({"type": "DEVICE_REMOVED", "deviceId": "d1"}),
                "receiver-0",
            )
            .unwrap();
        assert!(matches!(events.try_recv(), Ok(Event::MultizoneStatusDidChange(status)) if status.devices.is_empty()));
    }
}
