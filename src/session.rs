//! Session state: the device status, media status, multizone status and
//! currently connected app, each compared by value against the previous
//! observation so observers are only notified on a real change.

use std::time::Instant;

/// A launched application instance. Equality is by `session_id` alone: two
/// `CastApp` values describe the "same" launched app whenever the receiver
/// reports the same session id, even if transient fields like
/// `status_text` differ between observations.
#[derive(Debug, Clone)]
pub struct CastApp {
    pub id: String,
    pub session_id: String,
    pub transport_id: String,
    pub display_name: String,
    pub status_text: String,
    pub namespaces: Vec<String>,
}

impl PartialEq for CastApp {
    fn eq(&self, other: &Self) -> bool {
        self.session_id == other.session_id
    }
}
impl Eq for CastApp {}

/// Device-level status: volume, mute, and the set of running applications.
#[derive(Debug, Clone, PartialEq)]
pub struct CastStatus {
    pub volume: f64,
    pub muted: bool,
    pub apps: Vec<CastApp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing,
    Paused,
    Buffering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    Cancelled,
    Interrupted,
    Finished,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

/// Media playback status. `current_time` is the position reported by the
/// receiver as of `observed_at`; `adjusted_current_time` projects that
/// position forward to the caller's current wall-clock moment while the
/// player is actively playing.
#[derive(Debug, Clone, PartialEq)]
pub struct CastMediaStatus {
    pub media_session_id: i64,
    pub player_state: PlayerState,
    pub current_time: f64,
    pub idle_reason: Option<IdleReason>,
    pub metadata: MediaMetadata,
    pub observed_at: Instant,
}

impl CastMediaStatus {
    pub fn adjusted_current_time(&self, now: Instant) -> f64 {
        if self.player_state != PlayerState::Playing {
            return self.current_time;
        }
        let elapsed = now.saturating_duration_since(self.observed_at);
        self.current_time + elapsed.as_secs_f64()
    }
}

// `Instant` has no meaningful notion of equality across two otherwise
// identical status updates that simply arrived a few milliseconds apart;
// dedup is about the receiver-reported fields, not the local observation
// clock, so compare everything except `observed_at` explicitly.
impl Eq for PlayerState {}

#[derive(Debug, Clone, PartialEq)]
pub struct CastMultizoneDevice {
    pub id: String,
    pub name: String,
    pub capabilities: u8,
    pub volume: f64,
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastMultizoneStatus {
    pub devices: Vec<CastMultizoneDevice>,
}

fn media_status_eq(a: &CastMediaStatus, b: &CastMediaStatus) -> bool {
    a.media_session_id == b.media_session_id
        && a.player_state == b.player_state
        && a.current_time == b.current_time
        && a.idle_reason == b.idle_reason
        && a.metadata == b.metadata
}

/// Holds the three status kinds plus the connected app, publishing a
/// notification only when an assignment actually changes the value.
#[derive(Debug, Default)]
pub struct SessionState {
    status: Option<CastStatus>,
    media_status: Option<CastMediaStatus>,
    multizone_status: Option<CastMultizoneStatus>,
    connected_app: Option<CastApp>,
}

impl SessionState {
    pub fn status(&self) -> Option<&CastStatus> {
        self.status.as_ref()
    }

    pub fn media_status(&self) -> Option<&CastMediaStatus> {
        self.media_status.as_ref()
    }

    pub fn multizone_status(&self) -> Option<&CastMultizoneStatus> {
        self.multizone_status.as_ref()
    }

    pub fn connected_app(&self) -> Option<&CastApp> {
        self.connected_app.as_ref()
    }

    /// Returns `Some(new)` if `new` differs from the cached status.
    pub fn set_status(&mut self, new: CastStatus) -> Option<CastStatus> {
        if self.status.as_ref() == Some(&new) {
            return None;
        }
        self.status = Some(new.clone());
        Some(new)
    }

    pub fn set_media_status(&mut self, new: CastMediaStatus) -> Option<CastMediaStatus> {
        if let Some(ref current) = self.media_status {
            if media_status_eq(current, &new) {
                return None;
            }
        }
        self.media_status = Some(new.clone());
        Some(new)
    }

    pub fn clear_media_status(&mut self) {
        self.media_status = None;
    }

    pub fn set_multizone_status(&mut self, new: CastMultizoneStatus) -> Option<CastMultizoneStatus> {
        if self.multizone_status.as_ref() == Some(&new) {
            return None;
        }
        self.multizone_status = Some(new.clone());
        Some(new)
    }

    pub fn set_connected_app(&mut self, app: Option<CastApp>) {
        self.connected_app = app;
    }

    /// Cleared on any transition to `Disconnected`.
    pub fn clear(&mut self) {
        self.status = None;
        self.media_status = None;
        self.multizone_status = None;
        self.connected_app = None;
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.media_status.is_none()
            && self.multizone_status.is_none()
            && self.connected_app.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(session_id: &str) -> CastApp {
        CastApp {
            id: "CC1AD845".to_owned(),
            session_id: session_id.to_owned(),
            transport_id: "T".to_owned(),
            display_name: String::new(),
            status_text: String::new(),
            namespaces: Vec::new(),
        }
    }

    #[test]
    fn app_equality_is_by_session_id() {
        let mut a = app("S");
        a.status_text = "playing".to_owned();
        let b = app("S");
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_status_does_not_notify() {
        let mut state = SessionState::default();
        let status = CastStatus {
            volume: 0.5,
            muted: false,
            apps: vec![],
        };
        assert!(state.set_status(status.clone()).is_some());
        assert!(state.set_status(status).is_none());
    }

    #[test]
    fn changed_status_notifies() {
        let mut state = SessionState::default();
        let first = CastStatus {
            volume: 0.5,
            muted: false,
            apps: vec![],
        };
        let second = CastStatus {
            volume: 0.6,
            muted: false,
            apps: vec![],
        };
        assert!(state.set_status(first).is_some());
        assert!(state.set_status(second).is_some());
    }

    #[test]
    fn clear_resets_all_fields() {
        let mut state = SessionState::default();
        state.set_status(CastStatus {
            volume: 0.1,
            muted: false,
            apps: vec![],
        });
        state.set_connected_app(Some(app("S")));
        state.clear();
        assert!(state.is_empty());
    }
}
