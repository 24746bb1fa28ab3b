//! The parts of the Wintab ABI that `wintab_lite` doesn't cover for us: entry point signatures,
//! cursor and interface item indices, and a packet matching [`packet_data`].
#![allow(non_camel_case_types)]

use std::ffi::c_void;

use windows::Win32::Foundation::{BOOL, HWND};
use wintab_lite::{HCTX, LOGCONTEXT, WTPKT};

// Entry points. Wintab is WINAPI, which is stdcall on 32-bit x86.
// Categories are plain integers since per-device and per-cursor categories are offset by the item number.
pub type WTInfoA = unsafe extern "system" fn(category: u32, index: u32, output: *mut c_void) -> u32;
pub type WTOpenA = unsafe extern "system" fn(hwnd: HWND, context: *mut LOGCONTEXT, enable: BOOL) -> *mut HCTX;
pub type WTClose = unsafe extern "system" fn(context: *mut HCTX) -> BOOL;
pub type WTPacketsGet = unsafe extern "system" fn(context: *mut HCTX, max_packets: i32, packets: *mut c_void) -> i32;
pub type WTEnable = unsafe extern "system" fn(context: *mut HCTX, enable: BOOL) -> BOOL;
pub type WTOverlap = unsafe extern "system" fn(context: *mut HCTX, to_top: BOOL) -> BOOL;
pub type WTQueueSizeSet = unsafe extern "system" fn(context: *mut HCTX, size: i32) -> BOOL;

// WTI_INTERFACE indices
pub const IFC_NDEVICES: u32 = 4;

// WTI_CURSORS indices
pub const CSR_NAME: u32 = 1;
pub const CSR_ACTIVE: u32 = 2;
pub const CSR_PHYSID: u32 = 15;
// New in Wintab 1.2 and missing from older SDK headers.
pub const CSR_TYPE: u32 = 20;

/// Fields requested of every context. Must agree with [`PACKET`]: packets lay out requested
/// fields in ascending bit order.
pub fn packet_data() -> WTPKT {
    WTPKT::CURSOR | WTPKT::BUTTONS | WTPKT::X | WTPKT::Y | WTPKT::NORMAL_PRESSURE
}

/// One packet in the [`packet_data`] format.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct PACKET {
    pub pk_cursor: u32,
    pub pk_buttons: u32,
    pub pk_x: i32,
    pub pk_y: i32,
    pub pk_normal_pressure: u32,
}
