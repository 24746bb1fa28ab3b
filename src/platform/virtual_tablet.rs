//! An in-memory tablet driver.
//!
//! Useful for exercising code built on this crate without hardware, or on platforms where Wintab doesn't exist.
//! Devices and cursors are declared up-front, then packets are fed to devices with [`VirtualTablet::push`]
//! while a [`Manager`](crate::Manager) built with [`Builder::build_virtual`](crate::Builder::build_virtual) polls them.
//!
//! Like the real driver, each open context has its own bounded queue, and packets pushed while a queue is full
//! are lost. Cursors are numbered globally in declaration order, so every device owns a contiguous run of ids.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{ContextOptions, DriverError, Opened, PlatformImpl, RawContext, DEFAULT_QUEUE_SIZE};
use crate::{
    access::Packet,
    axis::{Range, Valuator},
    cursor::CursorId,
    tablet::DeviceId,
};

/// Declaration of one virtual cursor.
#[derive(Clone, Debug)]
pub struct VirtualCursor {
    pub name: String,
    /// Reported as `CSR_TYPE`. See [`crate::cursor::CursorType::classify`].
    pub type_bits: u32,
    pub physical_id: Option<u32>,
    pub active: bool,
}
impl VirtualCursor {
    #[must_use]
    pub fn new(name: impl Into<String>, type_bits: u32) -> Self {
        Self {
            name: name.into(),
            type_bits,
            physical_id: None,
            active: false,
        }
    }
    #[must_use]
    pub fn physical_id(mut self, physical_id: u32) -> Self {
        self.physical_id = Some(physical_id);
        self
    }
    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// Declaration of one virtual device.
#[derive(Clone, Debug)]
pub struct VirtualDevice {
    pub name: String,
    /// Range of each valuator, `None` for unsupported.
    pub ranges: [Option<Range>; Valuator::COUNT],
    pub cursors: Vec<VirtualCursor>,
}
impl VirtualDevice {
    /// A device with no valuators and no cursors.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ranges: [None; Valuator::COUNT],
            cursors: Vec::new(),
        }
    }
    #[must_use]
    pub fn valuator(mut self, valuator: Valuator, range: impl Into<Range>) -> Self {
        self.ranges[valuator.index()] = Some(range.into());
        self
    }
    #[must_use]
    pub fn cursor(mut self, cursor: VirtualCursor) -> Self {
        self.cursors.push(cursor);
        self
    }
}

#[derive(Debug)]
struct OpenContext {
    device: DeviceId,
    enabled: bool,
    capacity: usize,
    queue: VecDeque<Packet>,
}

#[derive(Debug, Default)]
struct State {
    devices: Vec<VirtualDevice>,
    /// First global cursor id of each device, parallel to `devices`.
    first_cursors: Vec<u32>,
    /// Slot index is the raw context handle. Slots are never reused, so stale handles stay stale.
    contexts: Vec<Option<OpenContext>>,
    closes: usize,
    dropped_packets: usize,
    /// Largest queue the driver grants, `None` for any size.
    max_queue_size: Option<usize>,
    /// Refuse every enable or disable request.
    refuse_enable: bool,
}
impl State {
    fn device(&self, device: DeviceId) -> Option<&VirtualDevice> {
        self.devices.get(usize::try_from(device.0).ok()?)
    }
    fn cursor(&self, cursor: CursorId) -> Option<&VirtualCursor> {
        self.cursor_position(cursor)
            .map(|(device, idx)| &self.devices[device].cursors[idx])
    }
    /// Find the (device, local) position of a global cursor id.
    fn cursor_position(&self, cursor: CursorId) -> Option<(usize, usize)> {
        self.devices
            .iter()
            .zip(&self.first_cursors)
            .enumerate()
            .find_map(|(device_idx, (device, &first))| {
                let local = usize::try_from(cursor.0.checked_sub(first)?).ok()?;
                (local < device.cursors.len()).then_some((device_idx, local))
            })
    }
    fn context_mut(&mut self, context: RawContext) -> Option<&mut OpenContext> {
        self.contexts.get_mut(context.0)?.as_mut()
    }
}

/// Handle to a shared in-memory tablet driver. Clones refer to the same driver.
#[derive(Clone, Debug, Default)]
pub struct VirtualTablet {
    state: Arc<Mutex<State>>,
}
impl VirtualTablet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Add a device, returning its id. Devices are numbered in the order they're added.
    pub fn add_device(&self, device: VirtualDevice) -> DeviceId {
        let mut state = self.state.lock();
        let first = state
            .devices
            .last()
            .zip(state.first_cursors.last())
            .map_or(0, |(last, &first)| {
                first + u32::try_from(last.cursors.len()).unwrap_or(u32::MAX)
            });
        state.first_cursors.push(first);
        state.devices.push(device);
        DeviceId(u32::try_from(state.devices.len() - 1).unwrap_or(u32::MAX))
    }
    /// Queue a packet on every enabled context open against `device`.
    /// Returns how many contexts accepted it. Full queues drop the packet.
    pub fn push(&self, device: DeviceId, packet: Packet) -> usize {
        let mut state = self.state.lock();
        let mut accepted = 0;
        let mut dropped = 0;
        for context in state.contexts.iter_mut().flatten() {
            if context.device != device || !context.enabled {
                continue;
            }
            if context.queue.len() < context.capacity {
                context.queue.push_back(packet);
                accepted += 1;
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::debug!(%device, dropped, "virtual queue overflow");
        }
        state.dropped_packets += dropped;
        accepted
    }
    /// Move a cursor in or out of range. `false` if there is no such cursor.
    pub fn set_cursor_active(&self, cursor: CursorId, active: bool) -> bool {
        let mut state = self.state.lock();
        let Some((device, local)) = state.cursor_position(cursor) else {
            return false;
        };
        state.devices[device].cursors[local].active = active;
        true
    }
    /// Limit the queue length granted to newly opened contexts. Larger requests are refused, as a real
    /// driver short on memory would. `Some(0)` refuses every size, making opens fail.
    pub fn set_max_queue_size(&self, max: Option<usize>) {
        self.state.lock().max_queue_size = max;
    }
    /// Make the driver refuse to enable or disable contexts, leaving them as they are.
    pub fn refuse_enable(&self, refuse: bool) {
        self.state.lock().refuse_enable = refuse;
    }
    /// Number of currently open contexts.
    #[must_use]
    pub fn open_contexts(&self) -> usize {
        self.state.lock().contexts.iter().flatten().count()
    }
    /// Number of times any context has been closed.
    #[must_use]
    pub fn closed_contexts(&self) -> usize {
        self.state.lock().closes
    }
    /// Whether an open context on `device` is currently enabled at the driver level.
    #[must_use]
    pub fn device_enabled(&self, device: DeviceId) -> bool {
        self.state
            .lock()
            .contexts
            .iter()
            .flatten()
            .any(|context| context.device == device && context.enabled)
    }
    /// Total packets lost to full queues.
    #[must_use]
    pub fn dropped_packets(&self) -> usize {
        self.state.lock().dropped_packets
    }
}

impl PlatformImpl for VirtualTablet {
    fn device_count(&self) -> Result<u32, DriverError> {
        u32::try_from(self.state.lock().devices.len()).map_err(|_| DriverError::InfoUnavailable)
    }
    fn device_name(&self, device: DeviceId) -> Result<String, DriverError> {
        self.state
            .lock()
            .device(device)
            .map(|device| device.name.clone())
            .ok_or(DriverError::InvalidDevice(device))
    }
    fn open(&self, device: DeviceId, options: ContextOptions) -> Result<Opened, DriverError> {
        let mut state = self.state.lock();
        if state.device(device).is_none() {
            return Err(DriverError::InvalidDevice(device));
        }
        let capacity = match options.queue_size {
            Some(requested) => {
                let max = state.max_queue_size;
                super::negotiate_queue_size(requested, |size| {
                    max.map_or(true, |max| usize::try_from(size).is_ok_and(|size| size <= max))
                })
                .ok_or(DriverError::OpenFailed(device))?
            }
            None => DEFAULT_QUEUE_SIZE,
        };
        state.contexts.push(Some(OpenContext {
            device,
            enabled: options.enable,
            capacity,
            queue: VecDeque::with_capacity(capacity),
        }));
        Ok(Opened {
            raw: RawContext(state.contexts.len() - 1),
            queue_size: capacity,
        })
    }
    fn close(&self, context: RawContext) {
        let mut state = self.state.lock();
        if let Some(slot @ Some(_)) = state.contexts.get_mut(context.0) {
            *slot = None;
            state.closes += 1;
        } else {
            tracing::warn!(?context, "closing a context that isn't open");
        }
    }
    fn enable(&self, context: RawContext, enable: bool) -> bool {
        let mut state = self.state.lock();
        if state.refuse_enable {
            return false;
        }
        match state.context_mut(context) {
            Some(context) => {
                context.enabled = enable;
                true
            }
            None => false,
        }
    }
    fn next_packet(&self, context: RawContext) -> Option<Packet> {
        self.state.lock().context_mut(context)?.queue.pop_front()
    }
    fn valuator_range(&self, device: DeviceId, valuator: Valuator) -> Option<Range> {
        self.state.lock().device(device)?.ranges[valuator.index()]
    }
    fn first_cursor(&self, device: DeviceId) -> Option<CursorId> {
        let state = self.state.lock();
        let idx = usize::try_from(device.0).ok()?;
        state.first_cursors.get(idx).copied().map(CursorId)
    }
    fn cursors_count(&self, device: DeviceId) -> Option<u32> {
        let state = self.state.lock();
        u32::try_from(state.device(device)?.cursors.len()).ok()
    }
    fn cursor_active(&self, cursor: CursorId) -> bool {
        self.state
            .lock()
            .cursor(cursor)
            .is_some_and(|cursor| cursor.active)
    }
    fn cursor_name(&self, cursor: CursorId) -> Option<String> {
        self.state.lock().cursor(cursor).map(|cursor| cursor.name.clone())
    }
    fn cursor_type_bits(&self, cursor: CursorId) -> Option<u32> {
        self.state.lock().cursor(cursor).map(|cursor| cursor.type_bits)
    }
    fn cursor_physical_id(&self, cursor: CursorId) -> Option<u32> {
        self.state.lock().cursor(cursor)?.physical_id
    }
}
