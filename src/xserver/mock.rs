// src/xserver/mock.rs

//! In-memory [`XServer`] used by the test suite.
//!
//! The mock records every call, answers color requests from a small copy of
//! the X color database, keeps a pixel buffer per drawable and can be told to
//! refuse allocations.

use std::collections::HashMap;

use log::{debug, trace};

use super::{
    rgb888_pixel, scale_8_to_16, Atom, ColorReply, Cookie, Drawable, ScreenInfo, VisualInfo,
    XServer,
};
use crate::error::ProtocolError;
use crate::geometry::Area;
use crate::window::{ButtonBinding, Strut};

/// Subset of the server's color database, keyed by normalized name.
const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 255, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("cyan", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("gray", (190, 190, 190)),
    ("grey", (190, 190, 190)),
    ("gray50", (127, 127, 127)),
    ("darkgray", (169, 169, 169)),
    ("lightgray", (211, 211, 211)),
    ("orange", (255, 165, 0)),
    ("navy", (0, 0, 128)),
    ("steelblue", (70, 130, 180)),
    ("lightgoldenrod", (238, 221, 130)),
];

const MOCK_SCREEN_WIDTH: u16 = 1024;
const MOCK_SCREEN_HEIGHT: u16 = 768;
const MOCK_ROOT: Drawable = 0x100;
const MOCK_VISUAL_ID: u32 = 0x21;

/// A call made through the mock, kept for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    AllocColor { cookie: Cookie, red: u16, green: u16, blue: u16 },
    AllocNamedColor { cookie: Cookie, name: String },
    AllocColorReply { cookie: Cookie },
    PutImage { drawable: Drawable, x: i16, y: i16, width: u16, height: u16 },
    GetImage { drawable: Drawable, width: u16, height: u16 },
    CreateWindow { window: Drawable, area: Area },
    MapWindow { window: Drawable },
    DestroyWindow { window: Drawable },
    InternAtom { name: String },
    SetBorderWidth { window: Drawable, width: u32 },
    SetBorderColor { window: Drawable, pixel: u32 },
    SetOpacity { window: Drawable, opacity: Option<f64> },
    SetWindowType { window: Drawable, atom: Atom },
    SetStrut { window: Drawable, strut: Strut },
    GrabButtons { window: Drawable, count: usize },
    Flush,
}

#[derive(Debug, Clone)]
enum MockRequest {
    Rgb(u16, u16, u16),
    Named(String),
}

/// Pixel storage for a drawable known to the mock.
#[derive(Debug, Clone)]
pub struct MockDrawable {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u32>,
}

impl MockDrawable {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

#[derive(Debug)]
pub struct MockXServer {
    calls: Vec<RecordedCall>,
    screens: Vec<ScreenInfo>,
    pending: HashMap<Cookie, MockRequest>,
    next_cookie: u64,
    next_xid: Drawable,
    drawables: HashMap<Drawable, MockDrawable>,
    atoms: HashMap<String, Atom>,
    next_atom: Atom,
    fail_allocations: bool,
    fail_property_writes: bool,
}

impl MockXServer {
    /// A mock with one 24-bit TrueColor screen.
    pub fn new() -> Self {
        Self::with_screens(vec![ScreenInfo {
            root: MOCK_ROOT,
            width: MOCK_SCREEN_WIDTH,
            height: MOCK_SCREEN_HEIGHT,
            root_depth: 24,
            visual: VisualInfo::true_color_24(MOCK_VISUAL_ID),
        }])
    }

    pub fn with_screens(screens: Vec<ScreenInfo>) -> Self {
        let mut drawables = HashMap::new();
        for screen in &screens {
            drawables.insert(screen.root, MockDrawable::new(screen.width, screen.height));
        }
        Self {
            calls: Vec::new(),
            screens,
            pending: HashMap::new(),
            next_cookie: 1,
            next_xid: 0x0040_0000,
            drawables,
            atoms: HashMap::new(),
            // Leave room below for the predefined atoms.
            next_atom: 100,
            fail_allocations: false,
            fail_property_writes: false,
        }
    }

    /// Makes every subsequent allocation reply fail with `BadAlloc`.
    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    /// Makes window attribute writes fail with `BadDrawable`. The call is
    /// still recorded.
    pub fn set_fail_property_writes(&mut self, fail: bool) {
        self.fail_property_writes = fail;
    }

    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of color requests issued whose reply has not been claimed yet.
    pub fn outstanding_requests(&self) -> usize {
        self.pending.len()
    }

    /// Creates an off-screen drawable and returns its id.
    pub fn create_pixmap(&mut self, width: u16, height: u16) -> Drawable {
        let id = self.new_xid();
        self.drawables.insert(id, MockDrawable::new(width, height));
        debug!("MockXServer: created pixmap {:#x} ({}x{})", id, width, height);
        id
    }

    pub fn drawable(&self, id: Drawable) -> Option<&MockDrawable> {
        self.drawables.get(&id)
    }

    pub fn atom_name(&self, atom: Atom) -> Option<&str> {
        self.atoms
            .iter()
            .find(|(_, value)| **value == atom)
            .map(|(name, _)| name.as_str())
    }

    fn new_xid(&mut self) -> Drawable {
        self.next_xid += 1;
        self.next_xid
    }

    fn issue(&mut self, request: MockRequest) -> Cookie {
        let cookie = Cookie(self.next_cookie);
        self.next_cookie += 1;
        self.pending.insert(cookie, request);
        cookie
    }

    fn record(&mut self, call: RecordedCall) {
        trace!("MockXServer: {:?}", call);
        self.calls.push(call);
    }

    fn lookup_named(name: &str) -> Option<(u8, u8, u8)> {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        NAMED_COLORS
            .iter()
            .find(|(known, _)| *known == normalized)
            .map(|(_, rgb)| *rgb)
    }

    fn property_write(&self, window: Drawable) -> Result<(), ProtocolError> {
        if self.fail_property_writes {
            return Err(ProtocolError::BadDrawable(window));
        }
        Ok(())
    }

    fn drawable_mut(&mut self, id: Drawable) -> Result<&mut MockDrawable, ProtocolError> {
        self.drawables
            .get_mut(&id)
            .ok_or(ProtocolError::BadDrawable(id))
    }
}

impl Default for MockXServer {
    fn default() -> Self {
        Self::new()
    }
}

impl XServer for MockXServer {
    fn screen(&self, phys_screen: i32) -> Result<ScreenInfo, ProtocolError> {
        usize::try_from(phys_screen)
            .ok()
            .and_then(|idx| self.screens.get(idx))
            .copied()
            .ok_or(ProtocolError::NoScreen(phys_screen))
    }

    fn alloc_color(&mut self, red: u16, green: u16, blue: u16) -> Cookie {
        let cookie = self.issue(MockRequest::Rgb(red, green, blue));
        self.record(RecordedCall::AllocColor {
            cookie,
            red,
            green,
            blue,
        });
        cookie
    }

    fn alloc_named_color(&mut self, name: &str) -> Cookie {
        let cookie = self.issue(MockRequest::Named(name.to_string()));
        self.record(RecordedCall::AllocNamedColor {
            cookie,
            name: name.to_string(),
        });
        cookie
    }

    fn alloc_color_reply(&mut self, cookie: Cookie) -> Result<ColorReply, ProtocolError> {
        self.record(RecordedCall::AllocColorReply { cookie });
        let request = self
            .pending
            .remove(&cookie)
            .ok_or(ProtocolError::UnknownCookie(cookie.0))?;
        if self.fail_allocations {
            return Err(ProtocolError::BadAlloc);
        }
        let (red, green, blue) = match request {
            MockRequest::Rgb(r, g, b) => (r, g, b),
            MockRequest::Named(name) => {
                let (r, g, b) = Self::lookup_named(&name).ok_or(ProtocolError::BadName(name))?;
                (scale_8_to_16(r), scale_8_to_16(g), scale_8_to_16(b))
            }
        };
        Ok(ColorReply {
            pixel: rgb888_pixel(red, green, blue),
            red,
            green,
            blue,
        })
    }

    fn put_image(
        &mut self,
        drawable: Drawable,
        _depth: u8,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
        pixels: &[u32],
    ) -> Result<(), ProtocolError> {
        self.record(RecordedCall::PutImage {
            drawable,
            x,
            y,
            width,
            height,
        });
        let target = self.drawable_mut(drawable)?;
        for row in 0..height as i32 {
            let ty = y as i32 + row;
            if ty < 0 || ty >= target.height as i32 {
                continue;
            }
            for col in 0..width as i32 {
                let tx = x as i32 + col;
                if tx < 0 || tx >= target.width as i32 {
                    continue;
                }
                let src = (row * width as i32 + col) as usize;
                let dst = (ty * target.width as i32 + tx) as usize;
                if let Some(value) = pixels.get(src) {
                    target.pixels[dst] = *value;
                }
            }
        }
        Ok(())
    }

    fn get_image(
        &mut self,
        drawable: Drawable,
        width: u16,
        height: u16,
    ) -> Result<Vec<u32>, ProtocolError> {
        self.record(RecordedCall::GetImage {
            drawable,
            width,
            height,
        });
        let source = self
            .drawables
            .get(&drawable)
            .ok_or(ProtocolError::BadDrawable(drawable))?;
        let mut out = vec![0u32; width as usize * height as usize];
        for y in 0..height.min(source.height) {
            for x in 0..width.min(source.width) {
                out[y as usize * width as usize + x as usize] =
                    source.pixels[y as usize * source.width as usize + x as usize];
            }
        }
        Ok(out)
    }

    fn create_window(
        &mut self,
        phys_screen: i32,
        area: Area,
        background_pixel: u32,
    ) -> Result<Drawable, ProtocolError> {
        self.screen(phys_screen)?;
        let window = self.new_xid();
        let mut drawable = MockDrawable::new(area.width, area.height);
        drawable.pixels.fill(background_pixel);
        self.drawables.insert(window, drawable);
        self.record(RecordedCall::CreateWindow { window, area });
        Ok(window)
    }

    fn map_window(&mut self, window: Drawable) -> Result<(), ProtocolError> {
        self.drawable_mut(window)?;
        self.record(RecordedCall::MapWindow { window });
        Ok(())
    }

    fn destroy_window(&mut self, window: Drawable) -> Result<(), ProtocolError> {
        self.drawables
            .remove(&window)
            .ok_or(ProtocolError::BadDrawable(window))?;
        self.record(RecordedCall::DestroyWindow { window });
        Ok(())
    }

    fn intern_atom(&mut self, name: &str) -> Result<Atom, ProtocolError> {
        self.record(RecordedCall::InternAtom {
            name: name.to_string(),
        });
        if let Some(atom) = self.atoms.get(name) {
            return Ok(*atom);
        }
        let atom = self.next_atom;
        self.next_atom += 1;
        self.atoms.insert(name.to_string(), atom);
        Ok(atom)
    }

    fn set_border_width(&mut self, window: Drawable, width: u32) -> Result<(), ProtocolError> {
        self.record(RecordedCall::SetBorderWidth { window, width });
        self.property_write(window)
    }

    fn set_border_color(&mut self, window: Drawable, pixel: u32) -> Result<(), ProtocolError> {
        self.record(RecordedCall::SetBorderColor { window, pixel });
        self.property_write(window)
    }

    fn set_opacity(&mut self, window: Drawable, opacity: Option<f64>) -> Result<(), ProtocolError> {
        self.record(RecordedCall::SetOpacity { window, opacity });
        self.property_write(window)
    }

    fn set_window_type(&mut self, window: Drawable, atom: Atom) -> Result<(), ProtocolError> {
        self.record(RecordedCall::SetWindowType { window, atom });
        self.property_write(window)
    }

    fn set_strut(&mut self, window: Drawable, strut: &Strut) -> Result<(), ProtocolError> {
        self.record(RecordedCall::SetStrut {
            window,
            strut: *strut,
        });
        self.property_write(window)
    }

    fn grab_buttons(
        &mut self,
        window: Drawable,
        buttons: &[ButtonBinding],
    ) -> Result<(), ProtocolError> {
        self.record(RecordedCall::GrabButtons {
            window,
            count: buttons.len(),
        });
        self.property_write(window)
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        self.record(RecordedCall::Flush);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn named_lookup_ignores_case_and_spaces() {
        let mut server = MockXServer::new();
        let cookie = server.alloc_named_color("Light Goldenrod");
        let reply = server.alloc_color_reply(cookie).unwrap();
        assert_eq!(reply.red, 0xeeee);
        assert_eq!(reply.green, 0xdddd);
        assert_eq!(reply.blue, 0x8282);
    }

    #[test]
    fn replies_can_be_claimed_out_of_order() {
        let mut server = MockXServer::new();
        let first = server.alloc_color(0xffff, 0, 0);
        let second = server.alloc_named_color("blue");
        assert_eq!(server.outstanding_requests(), 2);
        assert_eq!(server.alloc_color_reply(second).unwrap().pixel, 0x0000ff);
        assert_eq!(server.alloc_color_reply(first).unwrap().pixel, 0xff0000);
        assert_eq!(server.outstanding_requests(), 0);
        assert_eq!(
            server.alloc_color_reply(first),
            Err(ProtocolError::UnknownCookie(first.0))
        );
    }

    #[test]
    fn put_image_is_clipped_to_the_drawable() {
        let mut server = MockXServer::new();
        let pixmap = server.create_pixmap(4, 4);
        server
            .put_image(pixmap, 24, 2, 2, 4, 4, &[0x00ff_ffff; 16])
            .unwrap();
        let drawable = server.drawable(pixmap).unwrap();
        assert_eq!(drawable.pixel(1, 1), Some(0));
        assert_eq!(drawable.pixel(3, 3), Some(0x00ff_ffff));
        assert_eq!(drawable.pixel(4, 4), None);
    }

    #[test]
    fn atoms_are_stable() {
        let mut server = MockXServer::new();
        let a = server.intern_atom("_NET_WM_WINDOW_TYPE_DOCK").unwrap();
        let b = server.intern_atom("_NET_WM_WINDOW_TYPE_DOCK").unwrap();
        assert_eq!(a, b);
        assert_eq!(server.atom_name(a), Some("_NET_WM_WINDOW_TYPE_DOCK"));
    }
}
