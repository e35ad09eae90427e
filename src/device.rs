use bitflags::bitflags;

bitflags! {
    /// Capability bits advertised by a device record produced by discovery.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeviceCapabilities: u8 {
        /// The device is a speaker group that fronts multiple audio
        /// devices (see `CastMultizoneStatus`).
        const MULTIZONE_GROUP = 0b0000_0001;
        const AUDIO_OUT        = 0b0000_0010;
        const VIDEO_OUT        = 0b0000_0100;
        const AUDIO_IN         = 0b0000_1000;
        const VIDEO_IN         = 0b0001_0000;
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        DeviceCapabilities::empty()
    }
}

/// A device record produced by mDNS/Bonjour discovery. Immutable once
/// constructed; the discovery scanner and UI layers that produce and
/// consume `CastDevice` values are external collaborators this crate does
/// not provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastDevice {
    pub id: String,
    pub name: String,
    pub model_name: String,
    pub host_name: String,
    pub port: u16,
    pub capabilities: DeviceCapabilities,
}

impl CastDevice {
    pub fn new(id: impl Into<String>, host_name: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            model_name: String::new(),
            host_name: host_name.into(),
            port,
            capabilities: DeviceCapabilities::empty(),
        }
    }

    pub fn is_multizone_group(&self) -> bool {
        self.capabilities.contains(DeviceCapabilities::MULTIZONE_GROUP)
    }
}
