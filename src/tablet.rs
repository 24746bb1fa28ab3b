//! # Tablets
//!
//! A tablet device is the physical hardware a context is opened against. The driver numbers devices
//! from zero, and reports little about them beyond a name - capabilities are queried per-valuator
//! from an opened [`Access`](crate::access::Access).

/// Driver-assigned device number, starting at zero.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DeviceId(pub u32);
impl From<u32> for DeviceId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    /// Human readable name, as reported by the driver. Often includes the vendor.
    pub name: String,
}
