use std::time::Duration;

/// Tunables for the protocol engine.
///
/// The defaults match the literal constants in the protocol spec (5s
/// heartbeat, 20s heartbeat timeout, 30s request timeout, 1 MiB frame bound,
/// initial request id seeded in `[0, 800)`). Tests construct a `ClientConfig`
/// with shortened durations and a fixed initial request id so timing and id
/// allocation are deterministic.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) heartbeat_interval: Duration,
    pub(crate) heartbeat_timeout: Duration,
    pub(crate) request_timeout: Duration,
    pub(crate) max_frame_len: usize,
    pub(crate) initial_request_id: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
            heartbeat_timeout: Duration::from_secs(20),
            request_timeout: Duration::from_secs(30),
            max_frame_len: 1 << 20,
            initial_request_id: None,
        }
    }
}

impl ClientConfig {
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// Seed the request id counter deterministically instead of drawing a
    /// random start in `[0, 800)`. Intended for test harnesses.
    pub fn with_initial_request_id(mut self, id: u32) -> Self {
        self.initial_request_id = Some(id);
        self
    }
}
