// src/xserver/live.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

//! [`XServer`] implementation on top of Xlib.
//!
//! Xlib's `XAllocColor` and `XAllocNamedColor` wait for their reply, so
//! color allocation goes through the XCB side of the same connection:
//! requests are sent when issued and only the reply claim blocks. N colors
//! issued back to back cost one round trip.

use std::collections::HashMap;
use std::ffi::CString;
use std::ptr;

use anyhow::{anyhow, Context, Result};
use libc::{c_char, c_int, c_long, c_uchar, c_uint, c_ulong, c_void};
use log::{debug, info, trace, warn};
use x11::xlib;

use super::xcb;
use super::{
    Atom, ColorReply, Cookie, Drawable, ScreenInfo, VisualClass, VisualInfo, XServer,
};
use crate::error::ProtocolError;
use crate::geometry::Area;
use crate::window::{ButtonBinding, Strut};

const NET_WM_WINDOW_OPACITY: &str = "_NET_WM_WINDOW_OPACITY";
const NET_WM_WINDOW_TYPE: &str = "_NET_WM_WINDOW_TYPE";
const NET_WM_STRUT: &str = "_NET_WM_STRUT";
const NET_WM_STRUT_PARTIAL: &str = "_NET_WM_STRUT_PARTIAL";
/// Opacity 1.0 as written to `_NET_WM_WINDOW_OPACITY`.
const OPACITY_OPAQUE: f64 = 0xffff_ffffu32 as f64;

/// Owns the Xlib display pointer and closes it on drop.
#[derive(Debug)]
struct ManagedDisplay {
    ptr: *mut xlib::Display,
}

impl ManagedDisplay {
    fn open() -> Result<Self> {
        // SAFETY: a null name makes Xlib use $DISPLAY.
        let display_ptr = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display_ptr.is_null() {
            return Err(anyhow!(
                "Failed to open X display. Check DISPLAY environment variable or X server status."
            ));
        }
        debug!("X display opened: {:p}", display_ptr);
        Ok(Self { ptr: display_ptr })
    }

    #[inline]
    fn raw(&self) -> *mut xlib::Display {
        self.ptr
    }
}

impl Drop for ManagedDisplay {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            info!("Closing X11 display connection: {:p}", self.ptr);
            // SAFETY: the pointer came from XOpenDisplay and is closed once.
            unsafe { xlib::XCloseDisplay(self.ptr) };
        }
    }
}

/// A color request sent to the server whose reply is not claimed yet.
#[derive(Debug)]
enum InFlight {
    Rgb(xcb::xcb_alloc_color_cookie_t),
    Named {
        cookie: xcb::xcb_alloc_named_color_cookie_t,
        name: String,
    },
    /// Never sent: the name does not fit in a request.
    Invalid(String),
}

impl InFlight {
    fn sequence(&self) -> Option<c_uint> {
        match self {
            InFlight::Rgb(cookie) => Some(cookie.sequence),
            InFlight::Named { cookie, .. } => Some(cookie.sequence),
            InFlight::Invalid(_) => None,
        }
    }
}

/// Turns a reply error into a [`ProtocolError`] and frees it.
///
/// # Safety
/// `error` must be null or an error returned by an XCB reply function.
unsafe fn take_reply_error(
    error: *mut xcb::xcb_generic_error_t,
    name: Option<String>,
) -> ProtocolError {
    if error.is_null() {
        return ProtocolError::Connection("color reply lost".to_string());
    }
    let code = (*error).error_code;
    libc::free(error as *mut c_void);
    match (code, name) {
        (xcb::BAD_NAME, Some(name)) => ProtocolError::BadName(name),
        (xcb::BAD_ALLOC, _) => ProtocolError::BadAlloc,
        (code, _) => {
            ProtocolError::Connection(format!("color request failed with X error {}", code))
        }
    }
}

/// Live connection to an X server.
#[derive(Debug)]
pub struct LiveXServer {
    display: ManagedDisplay,
    default_screen: c_int,
    colormap: xlib::Colormap,
    /// XCB view of the Xlib connection, owned by `display`.
    xcb: *mut xcb::xcb_connection_t,
    in_flight: HashMap<Cookie, InFlight>,
    next_cookie: u64,
    atoms: HashMap<String, Atom>,
}

impl LiveXServer {
    /// Connects to the server named by `$DISPLAY`.
    pub fn connect() -> Result<Self> {
        info!("Establishing X11 server connection.");
        let display = ManagedDisplay::open()?;
        // SAFETY: display is valid for the lifetime of `ManagedDisplay`.
        let default_screen = unsafe { xlib::XDefaultScreen(display.raw()) };
        let colormap = unsafe { xlib::XDefaultColormap(display.raw(), default_screen) };
        // SAFETY: as above; the XCB connection lives as long as the display.
        let xcb = unsafe { xcb::XGetXCBConnection(display.raw()) };
        if xcb.is_null() {
            return Err(anyhow!("Display has no XCB connection"));
        }
        debug!(
            "Default screen {}, default colormap {:#x}",
            default_screen, colormap
        );
        Ok(Self {
            display,
            default_screen,
            colormap,
            xcb,
            in_flight: HashMap::new(),
            next_cookie: 1,
            atoms: HashMap::new(),
        })
    }

    pub fn default_screen(&self) -> i32 {
        self.default_screen
    }

    #[inline]
    fn dpy(&self) -> *mut xlib::Display {
        self.display.raw()
    }

    fn track(&mut self, request: InFlight) -> Cookie {
        let cookie = Cookie(self.next_cookie);
        self.next_cookie += 1;
        trace!("Issued color request {:?}: {:?}", cookie, request);
        self.in_flight.insert(cookie, request);
        cookie
    }

    fn visual_info(visual: *mut xlib::Visual) -> Result<VisualInfo> {
        if visual.is_null() {
            return Err(anyhow!("screen has no default visual"));
        }
        // SAFETY: non-null visual owned by the display.
        let v = unsafe { &*visual };
        let class = match v.class {
            xlib::StaticGray => VisualClass::StaticGray,
            xlib::GrayScale => VisualClass::GrayScale,
            xlib::StaticColor => VisualClass::StaticColor,
            xlib::PseudoColor => VisualClass::PseudoColor,
            xlib::TrueColor => VisualClass::TrueColor,
            xlib::DirectColor => VisualClass::DirectColor,
            other => return Err(anyhow!("unknown visual class {}", other)),
        };
        Ok(VisualInfo {
            id: v.visualid as u32,
            class,
            red_mask: v.red_mask as u32,
            green_mask: v.green_mask as u32,
            blue_mask: v.blue_mask as u32,
            bits_per_rgb: v.bits_per_rgb as u8,
        })
    }

    fn screen_info(&self, phys_screen: i32) -> Result<ScreenInfo> {
        let dpy = self.dpy();
        // SAFETY: display is open; screen index is checked before use.
        let count = unsafe { xlib::XScreenCount(dpy) };
        if phys_screen < 0 || phys_screen >= count {
            return Err(anyhow!("screen {} out of range (0..{})", phys_screen, count));
        }
        unsafe {
            let visual = Self::visual_info(xlib::XDefaultVisual(dpy, phys_screen))?;
            Ok(ScreenInfo {
                root: xlib::XRootWindow(dpy, phys_screen) as Drawable,
                width: xlib::XDisplayWidth(dpy, phys_screen) as u16,
                height: xlib::XDisplayHeight(dpy, phys_screen) as u16,
                root_depth: xlib::XDefaultDepth(dpy, phys_screen) as u8,
                visual,
            })
        }
    }

    fn change_cardinals(
        &mut self,
        window: Drawable,
        property: &str,
        property_type: c_ulong,
        values: &[c_long],
    ) -> Result<(), ProtocolError> {
        let atom = self.intern_atom(property)?;
        // SAFETY: format-32 properties are passed as an array of C longs.
        unsafe {
            xlib::XChangeProperty(
                self.dpy(),
                window as xlib::Window,
                atom as xlib::Atom,
                property_type,
                32,
                xlib::PropModeReplace,
                values.as_ptr() as *const c_uchar,
                values.len() as c_int,
            );
        }
        Ok(())
    }
}

fn connection_error(err: anyhow::Error) -> ProtocolError {
    ProtocolError::Connection(format!("{:#}", err))
}

impl XServer for LiveXServer {
    fn screen(&self, phys_screen: i32) -> Result<ScreenInfo, ProtocolError> {
        self.screen_info(phys_screen).map_err(|err| {
            warn!("screen({}) failed: {:#}", phys_screen, err);
            ProtocolError::NoScreen(phys_screen)
        })
    }

    fn alloc_color(&mut self, red: u16, green: u16, blue: u16) -> Cookie {
        // SAFETY: the XCB connection is valid while `self` is alive.
        let cookie =
            unsafe { xcb::xcb_alloc_color(self.xcb, self.colormap as u32, red, green, blue) };
        self.track(InFlight::Rgb(cookie))
    }

    fn alloc_named_color(&mut self, name: &str) -> Cookie {
        let request = match u16::try_from(name.len()) {
            // SAFETY: XCB copies `name_len` bytes of the name into its
            // output buffer before returning.
            Ok(len) => InFlight::Named {
                cookie: unsafe {
                    xcb::xcb_alloc_named_color(
                        self.xcb,
                        self.colormap as u32,
                        len,
                        name.as_ptr() as *const c_char,
                    )
                },
                name: name.to_string(),
            },
            Err(_) => InFlight::Invalid(name.to_string()),
        };
        self.track(request)
    }

    fn alloc_color_reply(&mut self, cookie: Cookie) -> Result<ColorReply, ProtocolError> {
        let request = self
            .in_flight
            .remove(&cookie)
            .ok_or(ProtocolError::UnknownCookie(cookie.0))?;
        let mut error: *mut xcb::xcb_generic_error_t = ptr::null_mut();
        // SAFETY: each cookie is claimed once; replies and errors are
        // malloc'ed by XCB and freed here.
        unsafe {
            match request {
                InFlight::Rgb(xcb_cookie) => {
                    let reply = xcb::xcb_alloc_color_reply(self.xcb, xcb_cookie, &mut error);
                    if reply.is_null() {
                        return Err(take_reply_error(error, None));
                    }
                    let out = ColorReply {
                        pixel: (*reply).pixel,
                        red: (*reply).red,
                        green: (*reply).green,
                        blue: (*reply).blue,
                    };
                    libc::free(reply as *mut c_void);
                    Ok(out)
                }
                InFlight::Named {
                    cookie: xcb_cookie,
                    name,
                } => {
                    let reply =
                        xcb::xcb_alloc_named_color_reply(self.xcb, xcb_cookie, &mut error);
                    if reply.is_null() {
                        return Err(take_reply_error(error, Some(name)));
                    }
                    let out = ColorReply {
                        pixel: (*reply).pixel,
                        red: (*reply).visual_red,
                        green: (*reply).visual_green,
                        blue: (*reply).visual_blue,
                    };
                    libc::free(reply as *mut c_void);
                    Ok(out)
                }
                InFlight::Invalid(name) => Err(ProtocolError::BadName(name)),
            }
        }
    }

    fn put_image(
        &mut self,
        drawable: Drawable,
        depth: u8,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
        pixels: &[u32],
    ) -> Result<(), ProtocolError> {
        if pixels.len() < width as usize * height as usize {
            return Err(connection_error(anyhow!(
                "put_image: {} pixels for a {}x{} image",
                pixels.len(),
                width,
                height
            )));
        }
        let dpy = self.dpy();
        unsafe {
            let visual = xlib::XDefaultVisual(dpy, self.default_screen);
            let image = xlib::XCreateImage(
                dpy,
                visual,
                depth as c_uint,
                xlib::ZPixmap,
                0,
                pixels.as_ptr() as *mut c_char,
                width as c_uint,
                height as c_uint,
                32,
                width as c_int * 4,
            );
            if image.is_null() {
                return Err(ProtocolError::BadDrawable(drawable));
            }
            let gc = xlib::XCreateGC(dpy, drawable as xlib::Drawable, 0, ptr::null_mut());
            xlib::XPutImage(
                dpy,
                drawable as xlib::Drawable,
                gc,
                image,
                0,
                0,
                x as c_int,
                y as c_int,
                width as c_uint,
                height as c_uint,
            );
            xlib::XFreeGC(dpy, gc);
            // The pixel buffer belongs to the caller; keep XDestroyImage off it.
            (*image).data = ptr::null_mut();
            xlib::XDestroyImage(image);
        }
        trace!(
            "put_image {:#x}: {}x{} at ({}, {})",
            drawable,
            width,
            height,
            x,
            y
        );
        Ok(())
    }

    fn get_image(
        &mut self,
        drawable: Drawable,
        width: u16,
        height: u16,
    ) -> Result<Vec<u32>, ProtocolError> {
        let dpy = self.dpy();
        let mut out = Vec::with_capacity(width as usize * height as usize);
        unsafe {
            let image = xlib::XGetImage(
                dpy,
                drawable as xlib::Drawable,
                0,
                0,
                width as c_uint,
                height as c_uint,
                xlib::XAllPlanes(),
                xlib::ZPixmap,
            );
            if image.is_null() {
                return Err(ProtocolError::BadDrawable(drawable));
            }
            for row in 0..height as c_int {
                for col in 0..width as c_int {
                    out.push(xlib::XGetPixel(image, col, row) as u32 | 0xff00_0000);
                }
            }
            xlib::XDestroyImage(image);
        }
        Ok(out)
    }

    fn create_window(
        &mut self,
        phys_screen: i32,
        area: Area,
        background_pixel: u32,
    ) -> Result<Drawable, ProtocolError> {
        let screen = self.screen(phys_screen)?;
        let window = unsafe {
            xlib::XCreateSimpleWindow(
                self.dpy(),
                screen.root as xlib::Window,
                area.x as c_int,
                area.y as c_int,
                area.width.max(1) as c_uint,
                area.height.max(1) as c_uint,
                0,
                0,
                background_pixel as c_ulong,
            )
        };
        if window == 0 {
            return Err(connection_error(anyhow!("XCreateSimpleWindow failed")));
        }
        debug!("Created window {:#x} at {:?}", window, area);
        Ok(window as Drawable)
    }

    fn map_window(&mut self, window: Drawable) -> Result<(), ProtocolError> {
        unsafe { xlib::XMapWindow(self.dpy(), window as xlib::Window) };
        Ok(())
    }

    fn destroy_window(&mut self, window: Drawable) -> Result<(), ProtocolError> {
        unsafe { xlib::XDestroyWindow(self.dpy(), window as xlib::Window) };
        Ok(())
    }

    fn intern_atom(&mut self, name: &str) -> Result<Atom, ProtocolError> {
        if let Some(atom) = self.atoms.get(name) {
            return Ok(*atom);
        }
        let c_name = CString::new(name)
            .context("atom name contains a NUL byte")
            .map_err(connection_error)?;
        let atom = unsafe { xlib::XInternAtom(self.dpy(), c_name.as_ptr(), xlib::False) };
        if atom == 0 {
            return Err(connection_error(anyhow!("XInternAtom({}) failed", name)));
        }
        self.atoms.insert(name.to_string(), atom as Atom);
        Ok(atom as Atom)
    }

    fn set_border_width(&mut self, window: Drawable, width: u32) -> Result<(), ProtocolError> {
        unsafe {
            xlib::XSetWindowBorderWidth(self.dpy(), window as xlib::Window, width as c_uint)
        };
        Ok(())
    }

    fn set_border_color(&mut self, window: Drawable, pixel: u32) -> Result<(), ProtocolError> {
        unsafe { xlib::XSetWindowBorder(self.dpy(), window as xlib::Window, pixel as c_ulong) };
        Ok(())
    }

    fn set_opacity(&mut self, window: Drawable, opacity: Option<f64>) -> Result<(), ProtocolError> {
        match opacity {
            Some(value) => {
                let raw = (value.clamp(0.0, 1.0) * OPACITY_OPAQUE) as c_ulong;
                self.change_cardinals(
                    window,
                    NET_WM_WINDOW_OPACITY,
                    xlib::XA_CARDINAL,
                    &[raw as c_long],
                )
            }
            None => {
                let atom = self.intern_atom(NET_WM_WINDOW_OPACITY)?;
                unsafe {
                    xlib::XDeleteProperty(self.dpy(), window as xlib::Window, atom as xlib::Atom)
                };
                Ok(())
            }
        }
    }

    fn set_window_type(&mut self, window: Drawable, type_atom: Atom) -> Result<(), ProtocolError> {
        self.change_cardinals(
            window,
            NET_WM_WINDOW_TYPE,
            xlib::XA_ATOM,
            &[type_atom as c_long],
        )
    }

    fn set_strut(&mut self, window: Drawable, strut: &Strut) -> Result<(), ProtocolError> {
        let partial: Vec<c_long> = strut.as_partial().iter().map(|v| *v as c_long).collect();
        self.change_cardinals(window, NET_WM_STRUT_PARTIAL, xlib::XA_CARDINAL, &partial)?;
        self.change_cardinals(window, NET_WM_STRUT, xlib::XA_CARDINAL, &partial[..4])
    }

    fn grab_buttons(
        &mut self,
        window: Drawable,
        buttons: &[ButtonBinding],
    ) -> Result<(), ProtocolError> {
        let dpy = self.dpy();
        let window = window as xlib::Window;
        let event_mask = (xlib::ButtonPressMask | xlib::ButtonReleaseMask) as c_uint;
        unsafe {
            xlib::XUngrabButton(dpy, xlib::AnyButton as c_uint, xlib::AnyModifier as c_uint, window);
            for binding in buttons {
                xlib::XGrabButton(
                    dpy,
                    binding.button as c_uint,
                    binding.modifiers.bits() as c_uint,
                    window,
                    xlib::False,
                    event_mask,
                    xlib::GrabModeSync,
                    xlib::GrabModeAsync,
                    0,
                    0,
                );
            }
        }
        debug!("Grabbed {} button bindings on {:#x}", buttons.len(), window);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        unsafe {
            xlib::XFlush(self.dpy());
            xcb::xcb_flush(self.xcb);
        }
        Ok(())
    }
}

impl Drop for LiveXServer {
    fn drop(&mut self) {
        let connection = self.xcb;
        for (cookie, request) in self.in_flight.drain() {
            if let Some(sequence) = request.sequence() {
                trace!("Discarding unclaimed color reply {:?}", cookie);
                // SAFETY: `display` is dropped after this body, so the
                // connection is still open.
                unsafe { xcb::xcb_discard_reply(connection, sequence) };
            }
        }
    }
}
