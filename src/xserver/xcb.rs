// src/xserver/xcb.rs
#![allow(non_camel_case_types)]

//! The few XCB calls used for pipelined color allocation.
//!
//! Xlib shares its connection with XCB (`XGetXCBConnection`), so requests
//! issued here are sequenced together with the Xlib ones. Replies are
//! `malloc`ed by XCB and must be released with `libc::free`.

use libc::{c_char, c_int, c_uint};
use x11::xlib;

/// X protocol error codes.
pub const BAD_ALLOC: u8 = 11;
pub const BAD_NAME: u8 = 15;

#[repr(C)]
pub struct xcb_connection_t {
    _private: [u8; 0],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct xcb_alloc_color_cookie_t {
    pub sequence: c_uint,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct xcb_alloc_named_color_cookie_t {
    pub sequence: c_uint,
}

#[repr(C)]
pub struct xcb_generic_error_t {
    pub response_type: u8,
    pub error_code: u8,
    pub sequence: u16,
    pub resource_id: u32,
    pub minor_code: u16,
    pub major_code: u8,
    pub pad0: u8,
    pub pad: [u32; 5],
    pub full_sequence: u32,
}

#[repr(C)]
pub struct xcb_alloc_color_reply_t {
    pub response_type: u8,
    pub pad0: u8,
    pub sequence: u16,
    pub length: u32,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub pad1: [u8; 2],
    pub pixel: u32,
}

#[repr(C)]
pub struct xcb_alloc_named_color_reply_t {
    pub response_type: u8,
    pub pad0: u8,
    pub sequence: u16,
    pub length: u32,
    pub pixel: u32,
    pub exact_red: u16,
    pub exact_green: u16,
    pub exact_blue: u16,
    pub visual_red: u16,
    pub visual_green: u16,
    pub visual_blue: u16,
}

#[link(name = "X11-xcb")]
extern "C" {
    pub fn XGetXCBConnection(dpy: *mut xlib::Display) -> *mut xcb_connection_t;
}

#[link(name = "xcb")]
extern "C" {
    pub fn xcb_alloc_color(
        c: *mut xcb_connection_t,
        cmap: u32,
        red: u16,
        green: u16,
        blue: u16,
    ) -> xcb_alloc_color_cookie_t;

    pub fn xcb_alloc_color_reply(
        c: *mut xcb_connection_t,
        cookie: xcb_alloc_color_cookie_t,
        e: *mut *mut xcb_generic_error_t,
    ) -> *mut xcb_alloc_color_reply_t;

    pub fn xcb_alloc_named_color(
        c: *mut xcb_connection_t,
        cmap: u32,
        name_len: u16,
        name: *const c_char,
    ) -> xcb_alloc_named_color_cookie_t;

    pub fn xcb_alloc_named_color_reply(
        c: *mut xcb_connection_t,
        cookie: xcb_alloc_named_color_cookie_t,
        e: *mut *mut xcb_generic_error_t,
    ) -> *mut xcb_alloc_named_color_reply_t;

    pub fn xcb_discard_reply(c: *mut xcb_connection_t, sequence: c_uint);

    pub fn xcb_flush(c: *mut xcb_connection_t) -> c_int;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;
    use test_log::test;

    #[test]
    fn reply_layouts_match_the_wire_format() {
        assert_eq!(size_of::<xcb_alloc_color_reply_t>(), 20);
        assert_eq!(size_of::<xcb_alloc_named_color_reply_t>(), 24);
        assert_eq!(size_of::<xcb_generic_error_t>(), 36);
        assert_eq!(size_of::<xcb_alloc_color_cookie_t>(), size_of::<c_uint>());
    }
}
