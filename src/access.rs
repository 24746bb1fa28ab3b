//! # Device access
//!
//! An [`Access`] is one opened context on one tablet device, along with the state decoded from the
//! last packet consumed from it. Records are created by [`Manager::open`](crate::Manager::open) and
//! live in the manager's [device table](crate::table::AccessTable), addressed by cell index.
//!
//! Polling is entirely caller-driven: call [`Access::next_packet`] until it reports no more data, reading
//! the accessors after each success. Nothing is buffered or predicted between polls - the accessors always
//! describe exactly the last consumed packet.

use crate::{
    axis::{Range, Valuator, ValuatorValues},
    cursor::{Buttons, CursorId, Cursors},
    platform::{Context, PlatformImpl},
    tablet::DeviceId,
};

/// One decoded sample, as read from the driver.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct Packet {
    /// The cursor that produced this sample.
    pub cursor: CursorId,
    pub buttons: Buttons,
    pub x: i32,
    pub y: i32,
    pub pressure: i32,
    /// `None` when the packet format has no size field.
    pub size: Option<i32>,
}

#[derive(thiserror::Error, Debug)]
pub enum AccessError {
    /// The cell is empty or out of range - the device was never opened or has been closed.
    #[error("no device open in cell {0}")]
    InvalidCell(usize),
    #[error("device table is full")]
    TableFull,
    #[error("{} valuator unsupported by device {device}", .valuator.as_ref())]
    UnsupportedValuator { device: DeviceId, valuator: Valuator },
    #[error(transparent)]
    Driver(#[from] crate::platform::DriverError),
}

/// See [module level docs](`crate::access`) for details.
#[derive(Debug)]
pub struct Access {
    cell_index: usize,
    device: DeviceId,
    enabled: bool,
    valuator_values: ValuatorValues,
    cursor: CursorId,
    buttons: Buttons,
    /// Upper bound on packets consumed by one [`Access::drain`], the queue length the driver granted.
    drain_limit: usize,
    context: Context,
}

impl Access {
    pub(crate) fn new(cell_index: usize, device: DeviceId, enabled: bool, context: Context) -> Self {
        Self {
            cell_index,
            device,
            enabled,
            valuator_values: ValuatorValues::default(),
            cursor: CursorId::default(),
            buttons: Buttons::empty(),
            drain_limit: context.queue_size(),
            context,
        }
    }
    /// Consume one packet from the context queue, updating the valuator values, cursor, and buttons.
    ///
    /// Returns `false` without touching any state when no packet is queued, or when this record is
    /// [disabled](Access::set_enabled) - a disabled record never reads the queue. Neither is an error,
    /// just try again later.
    pub fn next_packet(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(packet) = self.context.next_packet() else {
            return false;
        };
        self.apply(&packet);
        true
    }
    /// Consume queued packets until none remain, calling `on_packet` after each one.
    /// Stops early after a full queue's worth, so a driver flooding packets can't stall the caller.
    ///
    /// Returns the number of packets consumed.
    pub fn drain(&mut self, mut on_packet: impl FnMut(&Self)) -> usize {
        let mut consumed = 0;
        while consumed < self.drain_limit && self.next_packet() {
            on_packet(self);
            consumed += 1;
        }
        consumed
    }
    fn apply(&mut self, packet: &Packet) {
        let Packet {
            cursor,
            buttons,
            x,
            y,
            pressure,
            size,
        } = *packet;
        self.valuator_values = ValuatorValues([x, y, pressure, size.unwrap_or(0)]);
        self.cursor = cursor;
        self.buttons = buttons;
        tracing::trace!(cell = self.cell_index, ?packet, "consumed packet");
    }
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }
    /// Gate polling. The context stays open while disabled, and the driver is asked to stop collecting
    /// packets for it. Packets already queued remain, to be read once re-enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        if !self.context.enable(enabled) {
            // The gate holds regardless, the driver just keeps collecting.
            tracing::warn!(
                cell = self.cell_index,
                device = %self.device,
                enabled,
                "driver refused to change context state"
            );
        }
        self.enabled = enabled;
    }
    /// Physical bounds of a valuator, in the same raw units as [`Access::value`].
    ///
    /// # Errors
    /// [`AccessError::UnsupportedValuator`] if the hardware lacks the valuator, or the driver reports an empty range.
    pub fn valuator_range(&self, valuator: Valuator) -> Result<Range, AccessError> {
        self.context
            .driver()
            .valuator_range(self.device, valuator)
            .filter(|range| !range.is_empty())
            .ok_or(AccessError::UnsupportedValuator {
                device: self.device,
                valuator,
            })
    }
    /// First of the cursor ids belonging to this device. `None` if the driver doesn't say.
    #[must_use]
    pub fn first_cursor(&self) -> Option<CursorId> {
        self.context.driver().first_cursor(self.device)
    }
    /// Number of cursor ids belonging to this device, zero if the driver doesn't say.
    #[must_use]
    pub fn cursors_count(&self) -> u32 {
        self.context
            .driver()
            .cursors_count(self.device)
            .unwrap_or(0)
    }
    /// The contiguous run of cursor ids belonging to this device. Empty if the first cursor is unknown.
    #[must_use]
    pub fn cursors(&self) -> Cursors {
        match self.first_cursor() {
            Some(first) => Cursors {
                first,
                count: self.cursors_count(),
            },
            None => Cursors::default(),
        }
    }
    /// Last decoded value of one valuator.
    #[must_use]
    pub fn value(&self, valuator: Valuator) -> i32 {
        self.valuator_values[valuator]
    }
    #[must_use]
    pub fn valuator_values(&self) -> &ValuatorValues {
        &self.valuator_values
    }
    /// Cursor reported by the last packet.
    #[must_use]
    pub fn cursor(&self) -> CursorId {
        self.cursor
    }
    /// Buttons held according to the last packet.
    #[must_use]
    pub fn buttons(&self) -> Buttons {
        self.buttons
    }
    #[must_use]
    pub fn device(&self) -> DeviceId {
        self.device
    }
    #[must_use]
    pub fn cell_index(&self) -> usize {
        self.cell_index
    }
}
