//! Builder-style configuration for connecting to the tablet driver.
//!
//! For a default configuration, `Builder::new().build_{shared, raw}` is all you need!
//!
//! The `WINTAB_LIBRARY` environment variable, if set, names a library to try before the defaults.
//! This is useful for vendor drivers that install their Wintab implementation under another name.

use smallvec::SmallVec;

use crate::{platform, Backing, Manager};

/// Environment variable naming a preferred Wintab library.
pub const LIBRARY_ENV: &str = "WINTAB_LIBRARY";
/// Library name of every conforming Wintab installation.
pub const DEFAULT_LIBRARY: &str = "Wintab32.dll";

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    /// The given window handle doesn't use a supported window type.
    /// This includes cases where the platform is otherwise supported but the feature was disabled at compile-time.
    #[error("handle doesn't contain a supported window type")]
    Unsupported,
    /// Failed to acquire a window handle
    #[error("{:?}", .0)]
    HandleError(raw_window_handle::HandleError),
    #[error(transparent)]
    Driver(#[from] platform::DriverError),
}
// #[from] thiserror attribute breaks horribly D:
impl From<raw_window_handle::HandleError> for BuildError {
    fn from(value: raw_window_handle::HandleError) -> Self {
        Self::HandleError(value)
    }
}

/// Pre-construction configuration for a [`Manager`].
#[derive(Clone, Debug)]
pub struct Builder {
    pub(crate) library_candidates: SmallVec<[String; 2]>,
    pub(crate) queue_size: Option<i32>,
    pub(crate) max_devices: usize,
    pub(crate) enable_on_open: bool,
    pub(crate) overlap_on_open: bool,
}
impl Default for Builder {
    fn default() -> Self {
        let mut library_candidates = SmallVec::new();
        if let Some(preferred) = std::env::var_os(LIBRARY_ENV) {
            library_candidates.push(preferred.to_string_lossy().into_owned());
        }
        library_candidates.push(DEFAULT_LIBRARY.to_owned());
        Self {
            library_candidates,
            queue_size: Some(128),
            max_devices: 16,
            enable_on_open: true,
            overlap_on_open: true,
        }
    }
}

/// # Configuration
impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Try `name` before any other library.
    #[must_use]
    pub fn library(mut self, name: impl Into<String>) -> Self {
        self.library_candidates.insert(0, name.into());
        self
    }
    /// Libraries to try, in order.
    #[must_use]
    pub fn library_candidates(&self) -> &[String] {
        &self.library_candidates
    }
    /// Packet queue length to request for each context. `None` keeps the driver default, which is
    /// often as little as 8 packets. A driver refusing the size is asked for half as much, down to a single
    /// packet, and the device fails to open if it refuses even that. The size granted bounds how many packets
    /// one [`Access::drain`](crate::access::Access::drain) consumes.
    #[must_use]
    pub fn queue_size(mut self, size: Option<i32>) -> Self {
        self.queue_size = size.filter(|&size| size > 0);
        self
    }
    /// Number of cells in the device table, the most devices that can be open at once.
    #[must_use]
    pub fn max_devices(mut self, max: usize) -> Self {
        self.max_devices = max;
        self
    }
    /// Whether newly opened devices start enabled. Default `true`.
    #[must_use]
    pub fn enable_on_open(mut self, enable: bool) -> Self {
        self.enable_on_open = enable;
        self
    }
    /// Whether newly opened contexts are raised to the top of the overlap order, taking packets from
    /// other applications' overlapping contexts. Default `true`.
    #[must_use]
    pub fn overlap_on_open(mut self, overlap: bool) -> Self {
        self.overlap_on_open = overlap;
        self
    }
    pub(crate) fn context_options(&self) -> platform::ContextOptions {
        platform::ContextOptions {
            enable: self.enable_on_open,
            overlap: self.overlap_on_open,
            queue_size: self.queue_size,
        }
    }
}
/// # Finishing
impl Builder {
    /// Build from a shared window handle carrier. Contexts are bound to this window. Internally, this `Arc` is kept
    /// alive for as long as the returned `Manager` is around ensuring safe operation.
    // Silly clippy, it's a self-describing err type!
    #[allow(clippy::missing_errors_doc)]
    pub fn build_shared(
        self,
        rwh: std::sync::Arc<impl raw_window_handle::HasWindowHandle + 'static>,
    ) -> Result<Manager, BuildError> {
        match rwh.window_handle()?.as_raw() {
            #[cfg(wintab)]
            raw_window_handle::RawWindowHandle::Win32(handle) => {
                // Erase the type, we don't care - we just need to be able to `Drop` it and to keep it around as
                // long as we need!
                let backing = Backing::Arc(rwh as _);
                // Safety - The returned `window_handle` is valid for as long as `rwh` is due to
                // safety bound on `WindowHandle::borrow_raw`. Since we keep the `rwh` alive inside the manager,
                // the window is thus valid for the lifetime of the manager.
                let driver = unsafe {
                    platform::wintab::Driver::load(
                        &self.library_candidates,
                        windows::Win32::Foundation::HWND(handle.hwnd.get()),
                    )?
                };
                Ok(Manager::new(&self, driver.into(), backing))
            }
            _ => Err(BuildError::Unsupported),
        }
    }
    /// Build from a window handle, such as one taken from a `winit` window, with unbound lifetime.
    /// # Safety
    /// The given window handle must be valid as long as the returned `Manager` is alive.
    // Silly clippy, it's a self-describing err type!
    #[allow(clippy::missing_errors_doc)]
    pub unsafe fn build_raw(
        self,
        rwh: raw_window_handle::RawWindowHandle,
    ) -> Result<Manager, BuildError> {
        match rwh {
            #[cfg(wintab)]
            raw_window_handle::RawWindowHandle::Win32(handle) => {
                let driver = unsafe {
                    // Safety - deferred to this fn's contract
                    platform::wintab::Driver::load(
                        &self.library_candidates,
                        windows::Win32::Foundation::HWND(handle.hwnd.get()),
                    )?
                };
                Ok(Manager::new(&self, driver.into(), Backing::Raw))
            }
            _ => Err(BuildError::Unsupported),
        }
    }
    /// Build against whichever window is in the foreground right now. Handy for tools without a window of
    /// their own, such as a console program.
    ///
    /// # Safety
    /// The foreground window must stay valid as long as the returned `Manager` is alive.
    #[cfg(wintab)]
    #[allow(clippy::missing_errors_doc)]
    pub unsafe fn build_foreground(self) -> Result<Manager, BuildError> {
        // Safety: no preconditions.
        let hwnd = unsafe { windows::Win32::UI::WindowsAndMessaging::GetForegroundWindow() };
        if hwnd.0 == 0 {
            return Err(BuildError::Unsupported);
        }
        let driver = unsafe {
            // Safety - deferred to this fn's contract
            platform::wintab::Driver::load(&self.library_candidates, hwnd)?
        };
        Ok(Manager::new(&self, driver.into(), Backing::Raw))
    }
    /// Build against an in-memory [`VirtualTablet`](crate::virtual_tablet::VirtualTablet). Keep a clone of the
    /// tablet around to feed it packets.
    #[must_use]
    pub fn build_virtual(self, tablet: crate::virtual_tablet::VirtualTablet) -> Manager {
        Manager::new(&self, tablet.into(), Backing::Raw)
    }
}
