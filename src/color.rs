// src/color.rs

//! Color resolution against the windowing server.
//!
//! Resolving a color is a two-phase exchange. [`begin_resolve`] validates a
//! [`ColorSpec`] and issues the allocation request without waiting for it;
//! the returned [`PendingColor`] is later completed into a [`ColorResource`].
//! Callers that need several colors issue all requests first and complete
//! them afterwards, paying a single round trip.
//!
//! ```ignore
//! let fg = begin_resolve(server, "#dcdccc")?;
//! let bg = begin_resolve(server, "gray50")?;
//! let fg = fg.complete(server)?;
//! let bg = bg.complete(server)?;
//! ```

use std::fmt;

use log::{debug, trace, warn};

use crate::error::{Error, ProtocolError, ValidationError};
use crate::xserver::{rgb888_pixel, scale_8_to_16, Cookie, XServer};

/// Fully opaque 16-bit alpha.
pub const ALPHA_OPAQUE: u16 = 0xffff;

/// A textual color specification with an optional alpha override.
///
/// The text is either `#rrggbb`, `#rrggbbaa`, or a color name known to the
/// server (`"steel blue"`, `"gray50"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSpec {
    text: String,
    alpha: Option<u8>,
}

impl ColorSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alpha: None,
        }
    }

    /// Overrides the alpha channel, including the `aa` field of a hex spec.
    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn alpha(&self) -> Option<u8> {
        self.alpha
    }
}

impl From<&str> for ColorSpec {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for ColorSpec {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for ColorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A resolved, server-allocated color.
///
/// `initialized == false` marks a color that must not be drawn with. The
/// default value is uninitialized and all-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorResource {
    pub initialized: bool,
    pub pixel: u32,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub alpha: u16,
}

impl ColorResource {
    /// Builds an initialized color from 8-bit channels without talking to a
    /// server. The pixel assumes a 24-bit TrueColor visual.
    pub const fn from_rgba8(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        let red = scale_8_to_16(red);
        let green = scale_8_to_16(green);
        let blue = scale_8_to_16(blue);
        Self {
            initialized: true,
            pixel: rgb888_pixel(red, green, blue),
            red,
            green,
            blue,
            alpha: scale_8_to_16(alpha),
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha == ALPHA_OPAQUE
    }

    /// Fails with [`Error::UnresolvedColor`] when the color is not usable.
    pub fn ensure_initialized(&self, role: &'static str) -> Result<&Self, Error> {
        if self.initialized {
            Ok(self)
        } else {
            Err(Error::UnresolvedColor(role))
        }
    }

    /// Packs the color as non-premultiplied `0xAARRGGBB`.
    pub fn to_argb(&self) -> u32 {
        ((self.alpha as u32 >> 8) << 24)
            | ((self.red as u32 >> 8) << 16)
            | ((self.green as u32 >> 8) << 8)
            | (self.blue as u32 >> 8)
    }

    pub fn to_skia(&self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(
            (self.red >> 8) as u8,
            (self.green >> 8) as u8,
            (self.blue >> 8) as u8,
            (self.alpha >> 8) as u8,
        )
    }

    /// `#rrggbbaa` form of the color.
    pub fn to_hex_string(&self) -> String {
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            self.red >> 8,
            self.green >> 8,
            self.blue >> 8,
            self.alpha >> 8
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Rgb,
    Named,
}

/// An issued, not yet completed color allocation.
///
/// Dropping a pending color abandons its reply on the server side.
#[derive(Debug)]
#[must_use = "a pending color must be completed"]
pub struct PendingColor {
    cookie: Cookie,
    kind: RequestKind,
    alpha: u16,
    spec: String,
}

impl PendingColor {
    /// Waits for the reply and builds the resolved color.
    pub fn complete(self, server: &mut dyn XServer) -> Result<ColorResource, Error> {
        let reply = server.alloc_color_reply(self.cookie).map_err(|err| {
            debug!("Color '{}' was refused by the server: {}", self.spec, err);
            err
        })?;
        trace!(
            "Color '{}' ({:?}) resolved to pixel {:#08x}",
            self.spec,
            self.kind,
            reply.pixel
        );
        Ok(ColorResource {
            initialized: true,
            pixel: reply.pixel,
            red: reply.red,
            green: reply.green,
            blue: reply.blue,
            alpha: self.alpha,
        })
    }

    /// Completes into `target`. On failure `target` is reset to the
    /// uninitialized default and `false` is returned.
    pub fn complete_into(self, server: &mut dyn XServer, target: &mut ColorResource) -> bool {
        match self.complete(server) {
            Ok(color) => {
                *target = color;
                true
            }
            Err(err) => {
                warn!("Color resolution failed: {}", err);
                *target = ColorResource::default();
                false
            }
        }
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }
}

enum ParsedSpec {
    Hex { red: u8, green: u8, blue: u8, alpha: Option<u8> },
    Name,
}

fn parse_hex_pair(digits: &str, at: usize) -> Option<u8> {
    u8::from_str_radix(digits.get(at..at + 2)?, 16).ok()
}

fn parse_spec(text: &str) -> Result<ParsedSpec, ValidationError> {
    let invalid = || ValidationError::ColorSpec(text.to_string());
    if let Some(digits) = text.strip_prefix('#') {
        if !(digits.len() == 6 || digits.len() == 8)
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(invalid());
        }
        let alpha = if digits.len() == 8 {
            Some(parse_hex_pair(digits, 6).ok_or_else(invalid)?)
        } else {
            None
        };
        return Ok(ParsedSpec::Hex {
            red: parse_hex_pair(digits, 0).ok_or_else(invalid)?,
            green: parse_hex_pair(digits, 2).ok_or_else(invalid)?,
            blue: parse_hex_pair(digits, 4).ok_or_else(invalid)?,
            alpha,
        });
    }
    let name_ok = !text.trim().is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b' ');
    if name_ok {
        Ok(ParsedSpec::Name)
    } else {
        Err(invalid())
    }
}

/// Validates `spec` and issues its allocation request.
///
/// Structurally invalid specs are rejected here and no request is sent.
/// Never waits for the server.
pub fn begin_resolve(
    server: &mut dyn XServer,
    spec: impl Into<ColorSpec>,
) -> Result<PendingColor, ValidationError> {
    let spec = spec.into();
    let parsed = parse_spec(spec.text())?;
    let (cookie, kind, alpha) = match parsed {
        ParsedSpec::Hex {
            red,
            green,
            blue,
            alpha,
        } => {
            let cookie = server.alloc_color(
                scale_8_to_16(red),
                scale_8_to_16(green),
                scale_8_to_16(blue),
            );
            let alpha = spec.alpha().or(alpha);
            (cookie, RequestKind::Rgb, alpha)
        }
        ParsedSpec::Name => {
            let cookie = server.alloc_named_color(spec.text());
            (cookie, RequestKind::Named, spec.alpha())
        }
    };
    Ok(PendingColor {
        cookie,
        kind,
        alpha: alpha.map_or(ALPHA_OPAQUE, scale_8_to_16),
        spec: spec.text,
    })
}

/// Resolves a single color: [`begin_resolve`] followed by
/// [`PendingColor::complete`].
pub fn resolve(
    server: &mut dyn XServer,
    spec: impl Into<ColorSpec>,
) -> Result<ColorResource, Error> {
    let pending = begin_resolve(server, spec)?;
    pending.complete(server)
}

/// Completes every pending color, even after a failure, and returns the
/// first error. Leaves no reply outstanding.
pub fn complete_all(
    server: &mut dyn XServer,
    pending: Vec<PendingColor>,
) -> Result<Vec<ColorResource>, Error> {
    let mut resolved = Vec::with_capacity(pending.len());
    let mut first_error: Option<ProtocolError> = None;
    for request in pending {
        match server.alloc_color_reply(request.cookie) {
            Ok(reply) => resolved.push(ColorResource {
                initialized: true,
                pixel: reply.pixel,
                red: reply.red,
                green: reply.green,
                blue: reply.blue,
                alpha: request.alpha,
            }),
            Err(err) => {
                debug!("Color '{}' was refused by the server: {}", request.spec, err);
                resolved.push(ColorResource::default());
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err.into()),
        None => Ok(resolved),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xserver::{MockXServer, RecordedCall};
    use test_log::test;

    #[test]
    fn hex_spec_scales_channels_to_16_bits() {
        let mut server = MockXServer::new();
        let color = resolve(&mut server, "#ff8001").unwrap();
        assert!(color.initialized);
        assert_eq!((color.red, color.green, color.blue), (0xffff, 0x8080, 0x0101));
        assert_eq!(color.alpha, ALPHA_OPAQUE);
        assert_eq!(color.pixel, 0x00ff_8001);
    }

    #[test]
    fn hex_alpha_field_and_override() {
        let mut server = MockXServer::new();
        let color = resolve(&mut server, "#10203040").unwrap();
        assert_eq!(color.alpha, 0x4040);

        let spec = ColorSpec::new("#10203040").with_alpha(0x80);
        let color = resolve(&mut server, spec).unwrap();
        assert_eq!(color.alpha, 0x8080);

        let spec = ColorSpec::new("red").with_alpha(0);
        let color = resolve(&mut server, spec).unwrap();
        assert_eq!(color.alpha, 0);
        assert_eq!(color.red, 0xffff);
    }

    #[test]
    fn structurally_invalid_specs_issue_no_request() {
        let mut server = MockXServer::new();
        for bad in ["#fff", "#fffffff", "#gggggg", "notacolor!", "", "   ", "#"] {
            let err = begin_resolve(&mut server, bad).unwrap_err();
            assert_eq!(err, ValidationError::ColorSpec(bad.to_string()));
        }
        assert!(server.calls().is_empty());
    }

    #[test]
    fn unknown_name_fails_at_completion() {
        let mut server = MockXServer::new();
        let pending = begin_resolve(&mut server, "notacolor").unwrap();
        let mut target = ColorResource::from_rgba8(1, 2, 3, 4);
        assert!(!pending.complete_into(&mut server, &mut target));
        assert_eq!(target, ColorResource::default());
        assert!(!target.initialized);
    }

    #[test]
    fn requests_are_issued_before_any_reply_is_read() {
        let mut server = MockXServer::new();
        let fg = begin_resolve(&mut server, "#000000").unwrap();
        let bg = begin_resolve(&mut server, "steel blue").unwrap();
        assert_eq!(server.outstanding_requests(), 2);
        assert!(!server
            .calls()
            .iter()
            .any(|call| matches!(call, RecordedCall::AllocColorReply { .. })));

        let bg = bg.complete(&mut server).unwrap();
        let fg = fg.complete(&mut server).unwrap();
        assert_eq!(server.outstanding_requests(), 0);
        assert_eq!(fg.pixel, 0);
        assert_eq!((bg.red >> 8, bg.green >> 8, bg.blue >> 8), (70, 130, 180));
    }

    #[test]
    fn allocation_failure_is_a_protocol_error() {
        let mut server = MockXServer::new();
        server.set_fail_allocations(true);
        let err = resolve(&mut server, "#123456").unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::BadAlloc)));
    }

    #[test]
    fn complete_all_drains_every_reply() {
        let mut server = MockXServer::new();
        let pending = vec![
            begin_resolve(&mut server, "red").unwrap(),
            begin_resolve(&mut server, "nosuchcolor").unwrap(),
            begin_resolve(&mut server, "#00ff00").unwrap(),
        ];
        let err = complete_all(&mut server, pending).unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::BadName(_))));
        assert_eq!(server.outstanding_requests(), 0);
    }

    #[test]
    fn argb_and_hex_string() {
        let color = ColorResource::from_rgba8(0x12, 0x34, 0x56, 0x78);
        assert_eq!(color.to_argb(), 0x7812_3456);
        assert_eq!(color.to_hex_string(), "#12345678");
        assert!(ColorResource::default().ensure_initialized("fg").is_err());
    }
}
