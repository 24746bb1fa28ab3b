//! # Wintab [device access](access) 🖊️
//!
//! Opens contexts on tablet devices through the vendor-supplied Wintab driver, polls their packet queues, and
//! answers questions about [valuator](axis) ranges and [cursors](cursor). The driver is loaded at runtime, so there is
//! no build-time dependency on any vendor SDK.
//!
//! Everything is caller-driven and non-blocking. There are no background threads and no buffering beyond
//! the driver's own queue: [`Access::next_packet`](access::Access::next_packet) either consumes a packet or
//! tells you there isn't one yet.
//!
//! To get started, create a [`Builder`]. Without a tablet (or off Windows), a [`virtual_tablet`] stands in for the driver.
//!
//! **Note:** Wintab drivers differ. Values are reported in raw device units exactly as the driver gives them,
//! with [`Access::valuator_range`](access::Access::valuator_range) describing how to interpret them.
//! **Guarantees are made only when explicitly stated so!**

#![warn(clippy::pedantic)]
#![forbid(unsafe_op_in_unsafe_fn)]

pub mod access;
pub mod axis;
pub mod builder;
pub mod cursor;
mod platform;
pub mod table;
pub mod tablet;

pub use access::{Access, AccessError, Packet};
pub use builder::{BuildError, Builder};
pub use platform::virtual_tablet;
pub use platform::DriverError;

use cursor::{CursorId, CursorInfo, CursorType};
use platform::{PlatformDriver, PlatformImpl};
use tablet::{DeviceId, DeviceInfo};

/// A trait that every object is.
/// Used to cast things to `dyn Erased` which leaves us with a wholly erased type.
trait Erased {}
impl<T> Erased for T {}

#[allow(dead_code)]
enum Backing {
    // The RWH owner is arc'd and thus is valid for as long as we need.
    // We don't need to remember what type the pointer came from, but `dyn WhateverTrait` remembers
    // enough to be able to destruct it cleanly.
    Arc(std::sync::Arc<dyn Erased>),
    // The RWH is some kind of raw pointer without lifetimes, and the user has guaranteed
    // that it is valid as long as this object lives. Also used when there's no window at all.
    Raw,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// The vendor `Wintab32.dll` driver.
    #[cfg(wintab)]
    Wintab,
    /// An in-memory [`virtual_tablet::VirtualTablet`].
    Virtual,
}

/// Manages a connection to the tablet driver. This is the main entry point for enumerating hardware,
/// opening devices, and asking about cursors.
pub struct Manager {
    table: table::AccessTable,
    options: platform::ContextOptions,
    // Open contexts hold their own reference, the driver is unloaded once the last of them closes.
    driver: std::sync::Arc<PlatformDriver>,
    // `_backing` MUST BE LAST IN DECLARATION ORDER!
    // the other fields may rely on the lifetime guarantees granted by the contents
    // of this `Backing`, and it's guaranteed that drop order == declaration order.
    _backing: Backing,
}
impl Manager {
    pub(crate) fn new(builder: &Builder, driver: PlatformDriver, backing: Backing) -> Self {
        Self {
            table: table::AccessTable::with_capacity(builder.max_devices),
            options: builder.context_options(),
            driver: std::sync::Arc::new(driver),
            _backing: backing,
        }
    }
    /// Query the driver currently in use.
    #[must_use]
    pub fn backed(&self) -> Backend {
        match *self.driver {
            #[cfg(wintab)]
            PlatformDriver::Wintab(_) => Backend::Wintab,
            PlatformDriver::Virtual(_) => Backend::Virtual,
        }
    }
    /// Enumerate the devices the driver knows about, in driver order.
    ///
    /// A device whose name can't be read is still listed, with an empty name.
    #[allow(clippy::missing_errors_doc)]
    pub fn devices(&self) -> Result<Vec<DeviceInfo>, DriverError> {
        let count = self.driver.device_count()?;
        Ok((0..count)
            .map(DeviceId)
            .map(|id| DeviceInfo {
                id,
                name: self.driver.device_name(id).unwrap_or_else(|error| {
                    tracing::warn!(%id, %error, "unnamed device");
                    String::new()
                }),
            })
            .collect())
    }
    /// Open a context on `device`, storing the new [`Access`] in the lowest free cell of the device table.
    /// Returns the cell index.
    ///
    /// # Errors
    /// [`AccessError::TableFull`] when every cell is taken, or a [`DriverError`] if the device doesn't exist
    /// or the driver refuses to open it.
    pub fn open(&mut self, device: DeviceId) -> Result<usize, AccessError> {
        if device.0 >= self.driver.device_count()? {
            return Err(DriverError::InvalidDevice(device).into());
        }
        let Self {
            table,
            options,
            driver,
            ..
        } = self;
        let cell = table.insert_with(|cell| {
            let context = platform::Context::open(driver, device, *options)?;
            Ok(Access::new(cell, device, options.enable, context))
        })?;
        tracing::debug!(%device, cell, "opened device");
        Ok(cell)
    }
    /// Close the device in `cell`, releasing its context.
    ///
    /// # Errors
    /// [`AccessError::InvalidCell`] if nothing is open there.
    pub fn close(&mut self, cell: usize) -> Result<(), AccessError> {
        drop(self.table.remove(cell)?);
        Ok(())
    }
    /// # Errors
    /// [`AccessError::InvalidCell`] if nothing is open in `cell`.
    pub fn access(&self, cell: usize) -> Result<&Access, AccessError> {
        self.table.get(cell)
    }
    /// # Errors
    /// [`AccessError::InvalidCell`] if nothing is open in `cell`.
    pub fn access_mut(&mut self, cell: usize) -> Result<&mut Access, AccessError> {
        self.table.get_mut(cell)
    }
    /// Every open device, in cell order.
    pub fn accesses(&self) -> impl Iterator<Item = &Access> {
        self.table.iter()
    }
    pub fn accesses_mut(&mut self) -> impl Iterator<Item = &mut Access> {
        self.table.iter_mut()
    }
    /// Poll every open device once. Returns how many of them consumed a packet.
    pub fn poll_all(&mut self) -> usize {
        self.table
            .iter_mut()
            .map(Access::next_packet)
            .filter(|&consumed| consumed)
            .count()
    }
    /// Whether `cursor` is currently present. Unknown cursors are never active.
    #[must_use]
    pub fn cursor_active(&self, cursor: CursorId) -> bool {
        self.driver.cursor_active(cursor)
    }
    /// Everything the driver will say about `cursor`.
    ///
    /// # Errors
    /// [`DriverError::InvalidCursor`] if the driver doesn't know the cursor.
    pub fn cursor_info(&self, cursor: CursorId) -> Result<CursorInfo, DriverError> {
        let name = self
            .driver
            .cursor_name(cursor)
            .ok_or(DriverError::InvalidCursor(cursor))?;
        Ok(CursorInfo {
            id: cursor,
            name,
            active: self.driver.cursor_active(cursor),
            physical_id: self.driver.cursor_physical_id(cursor),
            cursor_type: self
                .driver
                .cursor_type_bits(cursor)
                .map_or(CursorType::Undefined, CursorType::classify),
        })
    }
}
