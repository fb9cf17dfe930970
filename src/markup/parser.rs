// src/markup/parser.rs

//! Builds a [`ParsedStyle`] from markup tokens.
//!
//! Colors named in attributes are requested from the server as they are
//! scanned and all replies are collected at the end, so a string with N
//! colors costs one round trip. On failure every issued request is still
//! completed before the error is returned.

use std::str::FromStr;

use log::{debug, trace};

use super::lexer::{Attribute, Lexer, Token};
use super::style::{AttrRun, Alignment, ParsedStyle, StyleFlags, TextAttrs};
use super::{MarkupError, MarkupErrorKind};
use crate::color::{begin_resolve, ColorResource, PendingColor};
use crate::draw::image::ImageCache;
use crate::font::{FontDescription, FontWeight};
use crate::xserver::XServer;

/// Index into the parser's list of issued color requests.
type ColorSlot = usize;

/// Run attributes before colors are resolved.
#[derive(Debug, Clone, PartialEq, Default)]
struct DraftAttrs {
    flags: StyleFlags,
    font: Option<FontDescription>,
    fg: Option<ColorSlot>,
    bg: Option<ColorSlot>,
    size_steps: i8,
}

#[derive(Debug)]
struct DraftRun {
    start: usize,
    end: usize,
    attrs: DraftAttrs,
}

#[derive(Debug)]
struct OpenTag {
    offset: usize,
    name: String,
    attrs: DraftAttrs,
}

#[derive(Debug)]
struct IssuedColor {
    offset: usize,
    spec: String,
    request: PendingColor,
}

#[derive(Debug, Default)]
struct Draft {
    style: ParsedStyle,
    runs: Vec<DraftRun>,
    bg_color: Option<ColorSlot>,
    shadow_color: Option<ColorSlot>,
    border_color: Option<ColorSlot>,
}

struct Parser<'s, 'i> {
    server: &'s mut dyn XServer,
    images: &'i dyn ImageCache,
    colors: Vec<IssuedColor>,
    stack: Vec<OpenTag>,
    draft: Draft,
}

enum TagKind {
    Run,
    Style,
}

fn tag_kind(name: &str) -> Option<TagKind> {
    match name {
        "b" | "i" | "u" | "s" | "tt" | "big" | "small" | "span" | "font" => Some(TagKind::Run),
        "bg" | "text" | "margin" | "border" | "shadow" => Some(TagKind::Style),
        _ => None,
    }
}

fn unknown_attribute(tag: &str, attr: &Attribute<'_>) -> MarkupError {
    MarkupError::new(
        attr.offset,
        MarkupErrorKind::UnknownAttribute {
            tag: tag.to_string(),
            attribute: attr.name.to_string(),
        },
    )
}

fn invalid_value(attr: &Attribute<'_>) -> MarkupError {
    MarkupError::new(
        attr.offset,
        MarkupErrorKind::InvalidValue {
            attribute: attr.name.to_string(),
            value: attr.value.clone(),
        },
    )
}

fn parse_int(attr: &Attribute<'_>) -> Result<i32, MarkupError> {
    attr.value.trim().parse::<i32>().map_err(|_| {
        MarkupError::new(
            attr.offset,
            MarkupErrorKind::InvalidNumber {
                attribute: attr.name.to_string(),
                value: attr.value.clone(),
            },
        )
    })
}

fn parse_bool(attr: &Attribute<'_>) -> Result<bool, MarkupError> {
    match attr.value.as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid_value(attr)),
    }
}

fn parse_alignment(attr: &Attribute<'_>) -> Result<Alignment, MarkupError> {
    Alignment::from_str(&attr.value).map_err(|_| {
        MarkupError::new(
            attr.offset,
            MarkupErrorKind::InvalidAlignment(attr.value.clone()),
        )
    })
}

impl<'s, 'i> Parser<'s, 'i> {
    fn current_attrs(&self) -> DraftAttrs {
        self.stack
            .last()
            .map(|open| open.attrs.clone())
            .unwrap_or_default()
    }

    /// Issues the allocation request for a color attribute.
    fn color(&mut self, attr: &Attribute<'_>) -> Result<ColorSlot, MarkupError> {
        let request = begin_resolve(self.server, attr.value.as_str()).map_err(|_| {
            MarkupError::new(attr.offset, MarkupErrorKind::InvalidColor(attr.value.clone()))
        })?;
        self.colors.push(IssuedColor {
            offset: attr.offset,
            spec: attr.value.clone(),
            request,
        });
        Ok(self.colors.len() - 1)
    }

    fn run_tag(
        &mut self,
        name: &str,
        attrs: &[Attribute<'_>],
        mut draft: DraftAttrs,
    ) -> Result<DraftAttrs, MarkupError> {
        match name {
            "b" => draft.flags.insert(StyleFlags::BOLD),
            "i" => draft.flags.insert(StyleFlags::ITALIC),
            "u" => draft.flags.insert(StyleFlags::UNDERLINE),
            "s" => draft.flags.insert(StyleFlags::STRIKETHROUGH),
            "tt" => draft.flags.insert(StyleFlags::MONOSPACE),
            "big" => draft.size_steps = draft.size_steps.saturating_add(1),
            "small" => draft.size_steps = draft.size_steps.saturating_sub(1),
            _ => {}
        }
        let takes_attributes = matches!(name, "span" | "font");
        for attr in attrs {
            if !takes_attributes {
                return Err(unknown_attribute(name, attr));
            }
            match attr.name {
                "font" | "font_desc" => {
                    let font = attr.value.parse::<FontDescription>().map_err(|_| {
                        MarkupError::new(attr.offset, MarkupErrorKind::InvalidFont(attr.value.clone()))
                    })?;
                    draft.font = Some(font);
                }
                "fg" | "foreground" | "color" => draft.fg = Some(self.color(attr)?),
                "bg" | "background" => draft.bg = Some(self.color(attr)?),
                "underline" => {
                    draft
                        .flags
                        .remove(StyleFlags::UNDERLINE | StyleFlags::UNDERLINE_DOUBLE);
                    match attr.value.as_str() {
                        "none" => {}
                        "single" | "low" => draft.flags.insert(StyleFlags::UNDERLINE),
                        "double" => draft
                            .flags
                            .insert(StyleFlags::UNDERLINE | StyleFlags::UNDERLINE_DOUBLE),
                        _ => return Err(invalid_value(attr)),
                    }
                }
                "strikethrough" => {
                    draft
                        .flags
                        .set(StyleFlags::STRIKETHROUGH, parse_bool(attr)?);
                }
                "weight" => {
                    let weight = match attr.value.parse::<u16>() {
                        Ok(numeric) => FontWeight::from_numeric(numeric),
                        Err(_) => match attr.value.as_str() {
                            "normal" | "light" | "ultralight" => FontWeight::Normal,
                            "bold" | "semibold" | "ultrabold" | "heavy" => FontWeight::Bold,
                            _ => return Err(invalid_value(attr)),
                        },
                    };
                    draft.flags.set(StyleFlags::BOLD, weight >= FontWeight::Semibold);
                }
                "style" => match attr.value.as_str() {
                    "normal" => draft.flags.remove(StyleFlags::ITALIC),
                    "italic" | "oblique" => draft.flags.insert(StyleFlags::ITALIC),
                    _ => return Err(invalid_value(attr)),
                },
                _ => return Err(unknown_attribute(name, attr)),
            }
        }
        Ok(draft)
    }

    fn style_tag(&mut self, name: &str, attrs: &[Attribute<'_>]) -> Result<(), MarkupError> {
        for attr in attrs {
            match (name, attr.name) {
                ("bg", "color") => self.draft.bg_color = Some(self.color(attr)?),
                ("bg", "image") => {
                    let image = self.images.lookup(&attr.value).ok_or_else(|| {
                        MarkupError::new(attr.offset, MarkupErrorKind::UnknownImage(attr.value.clone()))
                    })?;
                    self.draft.style.bg_image = Some(image);
                }
                ("bg", "align") => self.draft.style.bg_align = parse_alignment(attr)?,
                ("bg", "resize") => self.draft.style.bg_resize = parse_bool(attr)?,
                ("bg", "top") => self.draft.style.bg_margin.top = parse_int(attr)?,
                ("bg", "left") => self.draft.style.bg_margin.left = parse_int(attr)?,
                ("text", "align") => self.draft.style.align = parse_alignment(attr)?,
                ("text", "shadow") | ("shadow", "color") => {
                    self.draft.shadow_color = Some(self.color(attr)?)
                }
                ("text", "shadow_offset") | ("shadow", "offset") => {
                    self.draft.style.shadow.offset = parse_int(attr)?
                }
                ("margin", "left") => self.draft.style.margin.left = parse_int(attr)?,
                ("margin", "right") => self.draft.style.margin.right = parse_int(attr)?,
                ("margin", "top") => self.draft.style.margin.top = parse_int(attr)?,
                ("border", "width") => {
                    let width = parse_int(attr)?;
                    if width < 0 {
                        return Err(invalid_value(attr));
                    }
                    self.draft.style.border.width = width;
                }
                ("border", "color") => self.draft.border_color = Some(self.color(attr)?),
                _ => return Err(unknown_attribute(name, attr)),
            }
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        let start = self.draft.style.text.len();
        self.draft.style.text.push_str(text);
        let attrs = self.current_attrs();
        if attrs == DraftAttrs::default() || text.is_empty() {
            return;
        }
        self.draft.runs.push(DraftRun {
            start,
            end: self.draft.style.text.len(),
            attrs,
        });
    }

    fn token(&mut self, token: Token<'_>) -> Result<(), MarkupError> {
        match token {
            Token::Text { text, .. } => self.push_text(&text),
            Token::StartTag {
                offset,
                name,
                attrs,
                self_closing,
            } => {
                let kind = tag_kind(name).ok_or_else(|| {
                    MarkupError::new(offset, MarkupErrorKind::UnknownTag(name.to_string()))
                })?;
                let inherited = self.current_attrs();
                let attrs = match kind {
                    TagKind::Run => self.run_tag(name, &attrs, inherited)?,
                    TagKind::Style => {
                        self.style_tag(name, &attrs)?;
                        inherited
                    }
                };
                if !self_closing {
                    self.stack.push(OpenTag {
                        offset,
                        name: name.to_string(),
                        attrs,
                    });
                }
            }
            Token::EndTag { offset, name } => match self.stack.pop() {
                Some(open) if open.name == name => {}
                open => {
                    return Err(MarkupError::new(
                        offset,
                        MarkupErrorKind::MismatchedEndTag {
                            expected: open.map(|o| o.name),
                            found: name.to_string(),
                        },
                    ))
                }
            },
        }
        Ok(())
    }

    fn scan(&mut self, raw: &str) -> Result<(), MarkupError> {
        for token in Lexer::new(raw) {
            self.token(token?)?;
        }
        if let Some(open) = self.stack.pop() {
            return Err(MarkupError::new(
                open.offset,
                MarkupErrorKind::UnclosedTag(open.name),
            ));
        }
        Ok(())
    }

    /// Completes every issued request, in issue order.
    fn collect_colors(&mut self) -> Result<Vec<ColorResource>, MarkupError> {
        let mut resolved = Vec::with_capacity(self.colors.len());
        let mut first_error = None;
        for issued in self.colors.drain(..) {
            match issued.request.complete(self.server) {
                Ok(color) => resolved.push(color),
                Err(err) => {
                    debug!("Markup color '{}' failed: {}", issued.spec, err);
                    resolved.push(ColorResource::default());
                    first_error.get_or_insert(MarkupError::new(
                        issued.offset,
                        MarkupErrorKind::ColorRefused(issued.spec),
                    ));
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(resolved),
        }
    }

    fn finish(mut self) -> Result<ParsedStyle, MarkupError> {
        let colors = self.collect_colors()?;
        let pick = |slot: Option<ColorSlot>| slot.and_then(|slot| colors.get(slot).copied());
        let mut style = std::mem::take(&mut self.draft.style);
        style.bg_color = pick(self.draft.bg_color);
        style.shadow.color = pick(self.draft.shadow_color);
        style.border.color = pick(self.draft.border_color);

        for run in self.draft.runs.drain(..) {
            let attrs = TextAttrs {
                flags: run.attrs.flags,
                font: run.attrs.font,
                fg: pick(run.attrs.fg),
                bg: pick(run.attrs.bg),
                size_steps: run.attrs.size_steps,
            };
            match style.runs.last_mut() {
                Some(last) if last.end == run.start && last.attrs == attrs => last.end = run.end,
                _ => style.runs.push(AttrRun {
                    start: run.start,
                    end: run.end,
                    attrs,
                }),
            }
        }
        Ok(style)
    }
}

/// Parses `raw` into a [`ParsedStyle`].
///
/// Color attributes are resolved against `server` and background images
/// are looked up in `images`. Any failure yields a single error and no
/// partial result.
pub fn parse(
    server: &mut dyn XServer,
    images: &dyn ImageCache,
    raw: &str,
) -> Result<ParsedStyle, MarkupError> {
    let mut parser = Parser {
        server,
        images,
        colors: Vec::new(),
        stack: Vec::new(),
        draft: Draft::default(),
    };
    if let Err(err) = parser.scan(raw) {
        // Claim the replies of everything issued before the failure.
        let _ = parser.collect_colors();
        debug!("Markup rejected: {}", err);
        return Err(err);
    }
    let style = parser.finish()?;
    trace!(
        "Parsed markup into {} bytes of text and {} runs",
        style.text.len(),
        style.runs.len()
    );
    Ok(style)
}

/// Parses raw bytes, which must be UTF-8.
pub fn parse_bytes(
    server: &mut dyn XServer,
    images: &dyn ImageCache,
    raw: &[u8],
) -> Result<ParsedStyle, MarkupError> {
    let text = std::str::from_utf8(raw)
        .map_err(|err| MarkupError::new(err.valid_up_to(), MarkupErrorKind::InvalidUtf8))?;
    parse(server, images, text)
}
