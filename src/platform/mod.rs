// Conditionally include each backend...
#[cfg(wintab)]
pub(crate) mod wintab;
// ...except the virtual one, which works everywhere.
pub mod virtual_tablet;

use crate::{
    access::Packet,
    axis::{Range, Valuator},
    cursor::CursorId,
    tablet::DeviceId,
};

/// Errors reported by a driver backend.
#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    /// None of the candidate libraries could be loaded.
    #[cfg(wintab)]
    #[error("failed to load a Wintab library, tried {tried:?}")]
    LibraryLoad {
        tried: Vec<String>,
        #[source]
        source: Option<libloading::Error>,
    },
    /// The library loaded, but lacks an entry point we need.
    #[cfg(wintab)]
    #[error("Wintab library is missing `{symbol}`")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
    #[error("no such device {0}")]
    InvalidDevice(DeviceId),
    #[error("no such cursor {0:?}")]
    InvalidCursor(CursorId),
    #[error("driver refused to open a context on device {0}")]
    OpenFailed(DeviceId),
    /// The driver has no answer for a global query.
    #[error("driver information unavailable")]
    InfoUnavailable,
    /// The backend isn't available on this platform or was disabled at compile time.
    #[error("backend unsupported on this platform")]
    Unsupported,
}

/// Opaque driver context handle. Only meaningful to the driver that produced it.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub(crate) struct RawContext(pub(crate) usize);

/// Packet queue length of a context when none is requested. Matches the Wintab default.
pub(crate) const DEFAULT_QUEUE_SIZE: usize = 8;

/// A context freshly opened by a driver.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Opened {
    pub raw: RawContext,
    /// Packet queue length the driver actually granted.
    pub queue_size: usize,
}

/// Ask for a queue of `requested` packets, halving on refusal down to a single packet.
/// Returns the size granted, `None` if every size was refused.
///
/// A refused resize leaves a Wintab context with no queue at all.
pub(crate) fn negotiate_queue_size(
    requested: i32,
    mut try_size: impl FnMut(i32) -> bool,
) -> Option<usize> {
    let granted = std::iter::successors(Some(requested.max(1)), |&size| {
        (size > 1).then_some(size / 2)
    })
    .find(|&size| try_size(size))?;
    if granted != requested {
        tracing::warn!(requested, granted, "driver shrank the packet queue");
    }
    usize::try_from(granted).ok()
}

/// Behavior requested from the driver when opening a context.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ContextOptions {
    /// Open the context in the enabled state.
    pub enable: bool,
    /// Bring the context to the top of the overlap order after opening.
    pub overlap: bool,
    /// Requested packet queue length. `None` keeps the driver default.
    pub queue_size: Option<i32>,
}

/// Trait that all drivers implement, giving [`Access`](crate::access::Access) and the
/// [`Manager`](crate::Manager) access to the black box.
///
/// Calls never block. Benign conditions (no packet queued, query unsupported) are `None`/`false`,
/// never errors.
#[enum_dispatch::enum_dispatch]
pub(crate) trait PlatformImpl {
    #[allow(clippy::missing_errors_doc)]
    fn device_count(&self) -> Result<u32, DriverError>;
    #[allow(clippy::missing_errors_doc)]
    fn device_name(&self, device: DeviceId) -> Result<String, DriverError>;
    #[allow(clippy::missing_errors_doc)]
    fn open(&self, device: DeviceId, options: ContextOptions) -> Result<Opened, DriverError>;
    /// Release a context. Called exactly once per successful [`PlatformImpl::open`].
    fn close(&self, context: RawContext);
    /// Enable or disable packet collection for a context. `false` if the driver refused.
    fn enable(&self, context: RawContext, enable: bool) -> bool;
    /// Dequeue the oldest packet, if any.
    fn next_packet(&self, context: RawContext) -> Option<Packet>;
    #[must_use]
    fn valuator_range(&self, device: DeviceId, valuator: Valuator) -> Option<Range>;
    #[must_use]
    fn first_cursor(&self, device: DeviceId) -> Option<CursorId>;
    #[must_use]
    fn cursors_count(&self, device: DeviceId) -> Option<u32>;
    #[must_use]
    fn cursor_active(&self, cursor: CursorId) -> bool;
    #[must_use]
    fn cursor_name(&self, cursor: CursorId) -> Option<String>;
    /// Raw `CSR_TYPE` bits, for classification by [`crate::cursor::CursorType::classify`].
    #[must_use]
    fn cursor_type_bits(&self, cursor: CursorId) -> Option<u32>;
    #[must_use]
    fn cursor_physical_id(&self, cursor: CursorId) -> Option<u32>;
}

/// Static dispatch between compiled backends.
#[enum_dispatch::enum_dispatch(PlatformImpl)]
pub(crate) enum PlatformDriver {
    #[cfg(wintab)]
    Wintab(wintab::Driver),
    Virtual(virtual_tablet::VirtualTablet),
}

/// Owns one open driver context, closing it when dropped.
///
/// Holds a strong reference to the driver, so the driver can never be unloaded while
/// one of its contexts is still open.
pub(crate) struct Context {
    raw: RawContext,
    queue_size: usize,
    driver: std::sync::Arc<PlatformDriver>,
}
impl Context {
    pub(crate) fn open(
        driver: &std::sync::Arc<PlatformDriver>,
        device: DeviceId,
        options: ContextOptions,
    ) -> Result<Self, DriverError> {
        let Opened { raw, queue_size } = driver.open(device, options)?;
        tracing::info!(%device, ?raw, queue_size, "opened context");
        Ok(Self {
            raw,
            queue_size,
            driver: driver.clone(),
        })
    }
    /// Packet queue length granted by the driver.
    pub(crate) fn queue_size(&self) -> usize {
        self.queue_size
    }
    pub(crate) fn driver(&self) -> &PlatformDriver {
        &self.driver
    }
    pub(crate) fn next_packet(&self) -> Option<Packet> {
        self.driver.next_packet(self.raw)
    }
    pub(crate) fn enable(&self, enable: bool) -> bool {
        self.driver.enable(self.raw, enable)
    }
}
impl Drop for Context {
    fn drop(&mut self) {
        self.driver.close(self.raw);
        tracing::info!(raw = ?self.raw, "closed context");
    }
}
impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Context").field(&self.raw.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_size_halves_until_granted() {
        let mut tried = Vec::new();
        let granted = negotiate_queue_size(128, |size| {
            tried.push(size);
            size <= 20
        });
        assert_eq!(granted, Some(16));
        assert_eq!(tried, [128, 64, 32, 16]);
    }

    #[test]
    fn queue_size_gives_up_below_one() {
        let mut tried = Vec::new();
        assert_eq!(
            negotiate_queue_size(12, |size| {
                tried.push(size);
                false
            }),
            None
        );
        assert_eq!(tried, [12, 6, 3, 1]);
    }

    #[test]
    fn queue_size_granted_first_time() {
        assert_eq!(negotiate_queue_size(128, |_| true), Some(128));
    }
}
