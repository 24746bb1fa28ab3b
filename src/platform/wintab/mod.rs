//! Implementation details for the Wintab driver interface.
//!
//! Within this module, it is sound to assume `cfg(wintab) == true`
//! (compiling for a windows target + has deps, or is building docs).
//!
//! The vendor library is loaded at runtime, so a machine without a tablet driver installed
//! fails at [`Driver::load`] rather than at process start.

use std::ffi::c_void;

use windows::Win32::Foundation::{BOOL, HWND};
use wintab_lite::{AXIS, CXO, DVC, HCTX, LOGCONTEXT, WTI, WTPKT};

use super::{ContextOptions, DriverError, Opened, PlatformImpl, RawContext, DEFAULT_QUEUE_SIZE};
use crate::{
    access::Packet,
    axis::{Range, Valuator},
    cursor::{Buttons, CursorId},
    tablet::DeviceId,
};

mod sys;

/// Resolved entry points. Only valid while the library they came from is loaded.
struct Functions {
    info: sys::WTInfoA,
    open: sys::WTOpenA,
    close: sys::WTClose,
    packets_get: sys::WTPacketsGet,
    enable: sys::WTEnable,
    overlap: sys::WTOverlap,
    queue_size_set: sys::WTQueueSizeSet,
}

pub struct Driver {
    /// Window every context is bound to.
    hwnd: HWND,
    functions: Functions,
    // `_library` MUST BE LAST IN DECLARATION ORDER!
    // `functions` point into it, and it's guaranteed that drop order == declaration order.
    _library: libloading::Library,
}

impl Driver {
    /// Load the first loadable library of `candidates`, binding future contexts to `hwnd`.
    ///
    /// # Safety
    /// `hwnd` must be a valid window for as long as this driver lives, and every candidate
    /// must be a genuine Wintab implementation (its initialization routines will run).
    pub(crate) unsafe fn load(candidates: &[String], hwnd: HWND) -> Result<Self, DriverError> {
        let mut last_error = None;
        for candidate in candidates {
            // Safety - deferred to this fn's contract
            match unsafe { libloading::Library::new(candidate) } {
                Ok(library) => {
                    tracing::info!(library = %candidate, "loaded Wintab");
                    // Safety - signatures come straight from the SDK headers.
                    let functions = unsafe { Self::resolve(&library)? };
                    return Ok(Self {
                        hwnd,
                        functions,
                        _library: library,
                    });
                }
                Err(error) => {
                    tracing::debug!(library = %candidate, %error, "failed to load Wintab candidate");
                    last_error = Some(error);
                }
            }
        }
        Err(DriverError::LibraryLoad {
            tried: candidates.to_vec(),
            source: last_error,
        })
    }
    /// # Safety
    /// The symbols must have the signatures declared in [`sys`].
    unsafe fn resolve(library: &libloading::Library) -> Result<Functions, DriverError> {
        // Copy the bare fn pointer out of the `Symbol`, which otherwise borrows the library.
        macro_rules! symbol {
            ($ty:ty, $name:literal) => {
                unsafe {
                    *library
                        .get::<$ty>(concat!($name, "\0").as_bytes())
                        .map_err(|source| DriverError::MissingSymbol {
                            symbol: $name,
                            source,
                        })?
                }
            };
        }
        Ok(Functions {
            info: symbol!(sys::WTInfoA, "WTInfoA"),
            open: symbol!(sys::WTOpenA, "WTOpenA"),
            close: symbol!(sys::WTClose, "WTClose"),
            packets_get: symbol!(sys::WTPacketsGet, "WTPacketsGet"),
            enable: symbol!(sys::WTEnable, "WTEnable"),
            overlap: symbol!(sys::WTOverlap, "WTOverlap"),
            queue_size_set: symbol!(sys::WTQueueSizeSet, "WTQueueSizeSet"),
        })
    }
    /// Fetch a fixed-size info item. `None` if the driver doesn't report it, or reports
    /// something larger than `T`.
    fn info<T: Default>(&self, category: u32, index: u32) -> Option<T> {
        // Safety: a null output pointer asks only for the item size.
        let needed = unsafe { (self.functions.info)(category, index, std::ptr::null_mut()) };
        let needed = usize::try_from(needed).ok()?;
        if needed == 0 {
            return None;
        }
        if needed > std::mem::size_of::<T>() {
            tracing::warn!(
                category,
                index,
                needed,
                "driver reports an info item larger than expected"
            );
            return None;
        }
        let mut out = T::default();
        // Safety: checked above that the driver writes at most `size_of::<T>()` bytes.
        let written = unsafe {
            (self.functions.info)(category, index, std::ptr::addr_of_mut!(out).cast::<c_void>())
        };
        (written > 0).then_some(out)
    }
    /// Fetch a nul-terminated ANSI string info item.
    fn info_string(&self, category: u32, index: u32) -> Option<String> {
        // Safety: a null output pointer asks only for the item size.
        let needed = unsafe { (self.functions.info)(category, index, std::ptr::null_mut()) };
        let needed = usize::try_from(needed).ok().filter(|&n| n > 0)?;
        let mut buffer = vec![0u8; needed];
        // Safety: the buffer is exactly as large as the driver asked for.
        let written = unsafe {
            (self.functions.info)(category, index, buffer.as_mut_ptr().cast::<c_void>())
        };
        if written == 0 {
            return None;
        }
        let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
        Some(String::from_utf8_lossy(&buffer[..end]).into_owned())
    }
    fn device_category(device: DeviceId) -> Option<u32> {
        (WTI::DEVICES as u32).checked_add(device.0)
    }
    fn cursor_category(cursor: CursorId) -> Option<u32> {
        (WTI::CURSORS as u32).checked_add(cursor.0)
    }
    /// The device's default digitizing context, or the global default retargeted to the device
    /// for drivers without per-device defaults.
    fn default_context(&self, device: DeviceId) -> Option<LOGCONTEXT> {
        let per_device = (WTI::DDCTXS as u32)
            .checked_add(device.0)
            .and_then(|category| self.info::<LOGCONTEXT>(category, 0));
        per_device.or_else(|| {
            tracing::debug!(%device, "no per-device default context, using global default");
            let mut context = self.info::<LOGCONTEXT>(WTI::DEFCONTEXT as u32, 0)?;
            context.lcDevice = device.0;
            Some(context)
        })
    }
    fn handle(context: RawContext) -> *mut HCTX {
        context.0 as *mut HCTX
    }
}

impl PlatformImpl for Driver {
    fn device_count(&self) -> Result<u32, DriverError> {
        self.info::<u32>(WTI::INTERFACE as u32, sys::IFC_NDEVICES)
            .ok_or(DriverError::InfoUnavailable)
    }
    fn device_name(&self, device: DeviceId) -> Result<String, DriverError> {
        Self::device_category(device)
            .and_then(|category| self.info_string(category, DVC::NAME as u32))
            .ok_or(DriverError::InvalidDevice(device))
    }
    fn open(&self, device: DeviceId, options: ContextOptions) -> Result<Opened, DriverError> {
        let mut context = self
            .default_context(device)
            .ok_or(DriverError::OpenFailed(device))?;

        // We poll, there's no need for window messages.
        context.lcOptions |= CXO::SYSTEM;
        context.lcOptions.remove(CXO::MESSAGES);
        context.lcPktData = sys::packet_data();
        // All fields absolute.
        context.lcPktMode = WTPKT::empty();
        context.lcMoveMask = sys::packet_data();
        // Report raw tablet units, untouched by the driver's output mapping.
        context.lcOutOrgXYZ.x = context.lcInOrgXYZ.x;
        context.lcOutOrgXYZ.y = context.lcInOrgXYZ.y;
        context.lcOutOrgXYZ.z = context.lcInOrgXYZ.z;
        context.lcOutExtXYZ.x = context.lcInExtXYZ.x;
        context.lcOutExtXYZ.y = context.lcInExtXYZ.y;
        context.lcOutExtXYZ.z = context.lcInExtXYZ.z;

        // Safety: `context` is a fully initialized LOGCONTEXT, `hwnd` is valid by `load`'s contract.
        let handle = unsafe {
            (self.functions.open)(self.hwnd, &mut context, BOOL::from(options.enable))
        };
        if handle.is_null() {
            return Err(DriverError::OpenFailed(device));
        }

        let queue_size = match options.queue_size {
            Some(requested) => {
                let granted = super::negotiate_queue_size(requested, |size| {
                    // Safety: `handle` was just opened.
                    unsafe { (self.functions.queue_size_set)(handle, size) }.as_bool()
                });
                let Some(granted) = granted else {
                    tracing::warn!(%device, requested, "driver refused every queue size");
                    // Safety: `handle` was just opened, and is forgotten after this.
                    unsafe { (self.functions.close)(handle) };
                    return Err(DriverError::OpenFailed(device));
                };
                granted
            }
            None => DEFAULT_QUEUE_SIZE,
        };
        if options.overlap {
            // Safety: `handle` was just opened.
            unsafe { (self.functions.overlap)(handle, BOOL::from(true)) };
        }
        Ok(Opened {
            raw: RawContext(handle as usize),
            queue_size,
        })
    }
    fn close(&self, context: RawContext) {
        // Safety: contexts are closed exactly once, by their owning guard.
        if !unsafe { (self.functions.close)(Self::handle(context)) }.as_bool() {
            tracing::warn!(?context, "driver failed to close context");
        }
    }
    fn enable(&self, context: RawContext, enable: bool) -> bool {
        // Safety: the context is open for as long as its guard lives.
        unsafe { (self.functions.enable)(Self::handle(context), BOOL::from(enable)) }.as_bool()
    }
    fn next_packet(&self, context: RawContext) -> Option<Packet> {
        let mut packet = sys::PACKET::default();
        // Safety: room for exactly one packet, in the format the context was opened with.
        let count = unsafe {
            (self.functions.packets_get)(
                Self::handle(context),
                1,
                std::ptr::addr_of_mut!(packet).cast::<c_void>(),
            )
        };
        if count <= 0 {
            return None;
        }
        tracing::trace!(?packet, "packet");
        Some(Packet {
            cursor: CursorId(packet.pk_cursor),
            buttons: Buttons::from_bits_retain(packet.pk_buttons),
            x: packet.pk_x,
            y: packet.pk_y,
            // Saturating, no real device gets near.
            pressure: i32::try_from(packet.pk_normal_pressure).unwrap_or(i32::MAX),
            size: None,
        })
    }
    fn valuator_range(&self, device: DeviceId, valuator: Valuator) -> Option<Range> {
        let index = match valuator {
            Valuator::X => DVC::X,
            Valuator::Y => DVC::Y,
            Valuator::Pressure => DVC::NPRESSURE,
            // Not part of the packet format.
            Valuator::Size => return None,
        };
        let axis = self.info::<AXIS>(Self::device_category(device)?, index as u32)?;
        Some(Range {
            min: axis.axMin,
            max: axis.axMax,
        })
    }
    fn first_cursor(&self, device: DeviceId) -> Option<CursorId> {
        self.info::<u32>(Self::device_category(device)?, DVC::FIRSTCSR as u32)
            .map(CursorId)
    }
    fn cursors_count(&self, device: DeviceId) -> Option<u32> {
        self.info::<u32>(Self::device_category(device)?, DVC::NCSRTYPES as u32)
    }
    fn cursor_active(&self, cursor: CursorId) -> bool {
        Self::cursor_category(cursor)
            .and_then(|category| self.info::<i32>(category, sys::CSR_ACTIVE))
            .is_some_and(|active| active != 0)
    }
    fn cursor_name(&self, cursor: CursorId) -> Option<String> {
        self.info_string(Self::cursor_category(cursor)?, sys::CSR_NAME)
    }
    fn cursor_type_bits(&self, cursor: CursorId) -> Option<u32> {
        self.info::<u32>(Self::cursor_category(cursor)?, sys::CSR_TYPE)
    }
    fn cursor_physical_id(&self, cursor: CursorId) -> Option<u32> {
        self.info::<u32>(Self::cursor_category(cursor)?, sys::CSR_PHYSID)
    }
}
