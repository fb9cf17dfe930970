// src/draw/tests.rs

//! Rendering tests against the mock server and the headless font driver.

use std::collections::HashMap;
use std::rc::Rc;

use test_log::test;

use super::*;
use crate::color::{resolve, ColorResource};
use crate::error::Error;
use crate::font::{FontHandle, HeadlessFontDriver};
use crate::geometry::{Area, Vector};
use crate::markup::{self, ParsedStyle};
use crate::xserver::{MockXServer, RecordedCall, ScreenInfo, VisualInfo, XServer};

const BLACK: ColorResource = ColorResource::from_rgba8(0, 0, 0, 0xff);
const WHITE: ColorResource = ColorResource::from_rgba8(0xff, 0xff, 0xff, 0xff);
const RED: ColorResource = ColorResource::from_rgba8(0xff, 0, 0, 0xff);
const BLUE: ColorResource = ColorResource::from_rgba8(0, 0, 0xff, 0xff);

const OPAQUE_BLACK: u32 = 0xff00_0000;
const OPAQUE_WHITE: u32 = 0xffff_ffff;
const OPAQUE_RED: u32 = 0xffff_0000;
const OPAQUE_BLUE: u32 = 0xff00_00ff;

struct Fixture {
    server: MockXServer,
    pixmap: u32,
    fonts: Rc<HeadlessFontDriver>,
}

impl Fixture {
    fn new(width: u16, height: u16) -> Self {
        let mut server = MockXServer::new();
        let pixmap = server.create_pixmap(width, height);
        Self {
            server,
            pixmap,
            fonts: Rc::new(HeadlessFontDriver::new()),
        }
    }

    fn context(&mut self, width: u16, height: u16) -> DrawContext {
        DrawContext::init(
            &mut self.server,
            self.fonts.clone(),
            0,
            width,
            height,
            self.pixmap,
            &WHITE,
            &BLACK,
        )
        .unwrap()
    }

    /// 10px headless font: advance 6, ascent 8, descent 2, line height 10.
    fn font(&self) -> FontHandle {
        FontHandle::load(self.fonts.as_ref(), 0, "sans 10px").unwrap()
    }
}

fn pixel(snapshot: &[u32], width: u16, x: u16, y: u16) -> u32 {
    snapshot[y as usize * width as usize + x as usize]
}

fn count(snapshot: &[u32], value: u32) -> usize {
    snapshot.iter().filter(|px| **px == value).count()
}

#[test]
fn init_rejects_unusable_targets() {
    let mut fx = Fixture::new(8, 8);
    let fonts: Rc<HeadlessFontDriver> = fx.fonts.clone();

    let err = DrawContext::init(&mut fx.server, fonts.clone(), 3, 8, 8, fx.pixmap, &WHITE, &BLACK)
        .unwrap_err();
    assert!(matches!(err, Error::ResourceBind(_)));

    let err = DrawContext::init(&mut fx.server, fonts.clone(), 0, 0, 8, fx.pixmap, &WHITE, &BLACK)
        .unwrap_err();
    assert!(matches!(err, Error::ResourceBind(_)));

    let err = DrawContext::init(
        &mut fx.server,
        fonts.clone(),
        0,
        8,
        8,
        fx.pixmap,
        &ColorResource::default(),
        &BLACK,
    )
    .unwrap_err();
    assert!(matches!(err, Error::UnresolvedColor(_)));

    let mut deep = MockXServer::with_screens(vec![ScreenInfo {
        root: 0x100,
        width: 64,
        height: 64,
        root_depth: 16,
        visual: VisualInfo::true_color_24(0x21),
    }]);
    let err = DrawContext::init(&mut deep, fonts, 0, 8, 8, 0x100, &WHITE, &BLACK).unwrap_err();
    assert!(matches!(err, Error::ResourceBind(_)));
}

#[test]
fn depth_24_surface_starts_with_the_background() {
    let mut fx = Fixture::new(4, 4);
    let ctx = fx.context(4, 4);
    assert!(ctx.snapshot().iter().all(|px| *px == OPAQUE_BLACK));
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn wipe_flushes_to_the_drawable() {
    let mut fx = Fixture::new(6, 4);
    let mut ctx = fx.context(6, 4);
    ctx.rectangle(Area::new(0, 0, 6, 4), 1.0, true, Some(&RED)).unwrap();
    ctx.wipe(&mut fx.server).unwrap();
    let drawable = fx.server.drawable(fx.pixmap).unwrap();
    assert_eq!(drawable.pixel(5, 3), Some(OPAQUE_RED));
    assert!(fx.server.calls().iter().any(|call| matches!(
        call,
        RecordedCall::PutImage { width: 6, height: 4, .. }
    )));
}

#[test]
fn filled_and_outlined_rectangles() {
    let mut fx = Fixture::new(10, 10);
    let mut ctx = fx.context(10, 10);
    ctx.rectangle(Area::new(2, 2, 3, 3), 1.0, true, None).unwrap();
    ctx.rectangle(Area::new(6, 0, 4, 4), 1.0, false, Some(&BLUE)).unwrap();
    let snap = ctx.snapshot();
    assert_eq!(count(&snap, OPAQUE_WHITE), 9);
    assert_eq!(pixel(&snap, 10, 2, 2), OPAQUE_WHITE);
    assert_eq!(pixel(&snap, 10, 5, 5), OPAQUE_BLACK);
    // 4x4 outline, 1px wide: 12 edge pixels, hollow middle.
    assert_eq!(pixel(&snap, 10, 6, 0), OPAQUE_BLUE);
    assert_eq!(pixel(&snap, 10, 9, 3), OPAQUE_BLUE);
    assert_eq!(pixel(&snap, 10, 7, 1), OPAQUE_BLACK);
    assert_eq!(count(&snap, OPAQUE_BLUE), 12);
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn unresolved_colors_are_refused() {
    let mut fx = Fixture::new(4, 4);
    let mut ctx = fx.context(4, 4);
    let unresolved = ColorResource::default();
    let area = Area::new(0, 0, 4, 4);
    assert!(matches!(
        ctx.rectangle(area, 1.0, true, Some(&unresolved)),
        Err(Error::UnresolvedColor(_))
    ));
    assert!(ctx
        .rectangle_gradient(area, 1.0, true, Vector::new(0, 0, 4, 0), &RED, Some(&unresolved), &BLUE)
        .is_err());
    assert!(ctx.snapshot().iter().all(|px| *px == OPAQUE_BLACK));
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn uniform_gradient_matches_solid_fill() {
    let area = Area::new(1, 1, 12, 7);
    let directions = [
        Vector::new(0, 0, 16, 0),
        Vector::new(3, 2, -5, 9),
        Vector::new(0, 0, 0, 0),
    ];
    let mut fx = Fixture::new(16, 10);
    let mut solid = fx.context(16, 10);
    solid.rectangle(area, 1.0, true, Some(&RED)).unwrap();
    let expected = solid.snapshot();
    solid.wipe(&mut fx.server).unwrap();

    for direction in directions {
        let mut ctx = fx.context(16, 10);
        ctx.rectangle_gradient(area, 1.0, true, direction, &RED, Some(&RED), &RED)
            .unwrap();
        assert_eq!(ctx.snapshot(), expected, "direction {:?}", direction);
        ctx.wipe(&mut fx.server).unwrap();
    }
}

#[test]
fn gradient_runs_between_its_stops() {
    let mut fx = Fixture::new(32, 2);
    let mut ctx = fx.context(32, 2);
    ctx.rectangle_gradient(
        Area::new(0, 0, 32, 2),
        1.0,
        true,
        Vector::new(0, 0, 32, 0),
        &RED,
        None,
        &BLUE,
    )
    .unwrap();
    let snap = ctx.snapshot();
    let first = pixel(&snap, 32, 0, 0);
    let last = pixel(&snap, 32, 31, 0);
    assert!((first >> 16) & 0xff > 0xe0 && first & 0xff < 0x20);
    assert!(last & 0xff > 0xe0 && (last >> 16) & 0xff < 0x20);
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn graph_is_a_pure_function_of_its_inputs() {
    let values = [0, 3, 6, 9, 12, 5];
    let maxima = [12; 6];
    let area = Area::new(2, 1, 6, 8);
    let render = |fx: &mut Fixture| {
        let mut ctx = fx.context(10, 10);
        ctx.graph_setup();
        ctx.graph(area, &values, &maxima, values.len(), Position::Bottom, Vector::new(0, 0, 0, 8), &RED, None, &BLUE)
            .unwrap();
        let snap = ctx.snapshot();
        ctx.wipe(&mut fx.server).unwrap();
        snap
    };
    let mut fx = Fixture::new(10, 10);
    let first = render(&mut fx);
    let second = render(&mut fx);
    assert_eq!(first, second);
    // Sample 4 reaches the full height, sample 0 draws nothing.
    assert_ne!(pixel(&first, 10, 6, 1), OPAQUE_BLACK);
    assert_eq!(pixel(&first, 10, 2, 8), OPAQUE_BLACK);
}

#[test]
fn graph_baseline_follows_position() {
    let mut fx = Fixture::new(10, 10);
    let mut ctx = fx.context(10, 10);
    let area = Area::new(0, 0, 10, 10);
    ctx.graph(area, &[5], &[10], 1, Position::Top, Vector::default(), &RED, None, &RED)
        .unwrap();
    ctx.graph(area, &[0, 3], &[10, 10], 2, Position::Right, Vector::default(), &BLUE, None, &BLUE)
        .unwrap();
    let snap = ctx.snapshot();
    assert_eq!(pixel(&snap, 10, 0, 0), OPAQUE_RED);
    assert_eq!(pixel(&snap, 10, 0, 4), OPAQUE_RED);
    assert_eq!(pixel(&snap, 10, 0, 5), OPAQUE_BLACK);
    assert_eq!(pixel(&snap, 10, 9, 1), OPAQUE_BLUE);
    assert_eq!(pixel(&snap, 10, 7, 1), OPAQUE_BLUE);
    assert_eq!(pixel(&snap, 10, 6, 1), OPAQUE_BLACK);
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn graph_line_strokes_through_the_samples() {
    let mut fx = Fixture::new(10, 10);
    let mut ctx = fx.context(10, 10);
    ctx.graph_setup();
    ctx.graph_line(
        Area::new(0, 0, 10, 10),
        &[5, 5, 5, 5],
        &[10, 10, 10, 10],
        4,
        Position::Bottom,
        Vector::default(),
        &WHITE,
        None,
        &WHITE,
    )
    .unwrap();
    let snap = ctx.snapshot();
    assert!(count(&snap, OPAQUE_BLACK) < snap.len());
    // Nothing below the line.
    assert!((6..10).all(|y| pixel(&snap, 10, 1, y) == OPAQUE_BLACK));
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn text_stays_inside_its_area() {
    let mut fx = Fixture::new(40, 20);
    let font = fx.font();
    let mut ctx = fx.context(40, 20);
    let area = Area::new(5, 5, 12, 10);
    ctx.text(&font, area, &ParsedStyle::plain("overflowing text"))
        .unwrap();
    let snap = ctx.snapshot();
    for y in 0..20u16 {
        for x in 0..40u16 {
            if !area.contains(x as i32, y as i32) {
                assert_eq!(pixel(&snap, 40, x, y), OPAQUE_BLACK, "pixel {},{}", x, y);
            }
        }
    }
    assert!(count(&snap, OPAQUE_WHITE) > 0);
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn text_paints_border_then_background_then_glyphs() {
    let mut fx = Fixture::new(30, 14);
    let font = fx.font();
    let mut style = ParsedStyle::plain("ab");
    style.border.width = 1;
    style.border.color = Some(BLUE);
    style.bg_color = Some(RED);
    let mut ctx = fx.context(30, 14);
    ctx.text(&font, Area::new(0, 0, 30, 14), &style).unwrap();
    let snap = ctx.snapshot();
    assert_eq!(pixel(&snap, 30, 0, 0), OPAQUE_BLUE);
    assert_eq!(pixel(&snap, 30, 29, 13), OPAQUE_BLUE);
    assert_eq!(pixel(&snap, 30, 1, 1), OPAQUE_RED);
    assert_eq!(pixel(&snap, 30, 28, 12), OPAQUE_RED);
    // First glyph box: pen at x=0, box columns 1..5, rows 2..10.
    assert_eq!(pixel(&snap, 30, 2, 5), OPAQUE_WHITE);
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn shadow_is_painted_under_the_text() {
    let mut fx = Fixture::new(20, 12);
    let font = fx.font();
    let mut style = ParsedStyle::plain("a");
    style.shadow.offset = 1;
    style.shadow.color = Some(RED);
    let mut ctx = fx.context(20, 12);
    ctx.text(&font, Area::new(0, 0, 20, 12), &style).unwrap();
    let snap = ctx.snapshot();
    // Glyph box spans x 1..5, y 1..9 (block centered: top 1).
    assert_eq!(pixel(&snap, 20, 2, 4), OPAQUE_WHITE);
    assert_eq!(pixel(&snap, 20, 5, 4), OPAQUE_RED);
    assert_eq!(pixel(&snap, 20, 3, 9), OPAQUE_RED);
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn shadow_lands_on_top_of_the_background() {
    let mut fx = Fixture::new(20, 12);
    let font = fx.font();
    let mut style = ParsedStyle::plain("a");
    style.bg_color = Some(BLUE);
    style.shadow.offset = 1;
    style.shadow.color = Some(RED);
    let mut ctx = fx.context(20, 12);
    ctx.text(&font, Area::new(0, 0, 20, 12), &style).unwrap();
    let snap = ctx.snapshot();
    assert_eq!(pixel(&snap, 20, 2, 4), OPAQUE_WHITE);
    assert_eq!(pixel(&snap, 20, 5, 4), OPAQUE_RED);
    assert_eq!(pixel(&snap, 20, 15, 4), OPAQUE_BLUE);
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn missing_run_face_fails_before_any_glyph() {
    let mut fx = Fixture::new(20, 12);
    fx.fonts = Rc::new(HeadlessFontDriver::new().without_family("monospace"));
    let font = fx.font();
    let images: HashMap<String, Rc<Image>> = HashMap::new();
    let mut ctx = fx.context(20, 12);
    let err = ctx
        .markup(&mut fx.server, &images, &font, Area::new(0, 0, 20, 12), "a<tt>b</tt>")
        .unwrap_err();
    assert!(matches!(err, Error::Font(_)), "{:?}", err);
    assert_eq!(count(&ctx.snapshot(), OPAQUE_WHITE), 0);

    let style = markup::parse(&mut fx.server, &images, "<tt>b</tt>").unwrap();
    let err = text_extents(fx.fonts.as_ref(), &font, &style).unwrap_err();
    assert!(matches!(err, Error::Font(_)));
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn markup_runs_use_their_colors() {
    let mut fx = Fixture::new(30, 10);
    let font = fx.font();
    let images: HashMap<String, Rc<Image>> = HashMap::new();
    let mut ctx = fx.context(30, 10);
    ctx.markup(
        &mut fx.server,
        &images,
        &font,
        Area::new(0, 0, 30, 10),
        "a<span fg='red' bg='blue'>b</span>",
    )
    .unwrap();
    let snap = ctx.snapshot();
    assert_eq!(pixel(&snap, 30, 2, 4), OPAQUE_WHITE);
    assert_eq!(pixel(&snap, 30, 8, 4), OPAQUE_RED);
    // Run background fills the cell outside the glyph box.
    assert_eq!(pixel(&snap, 30, 6, 0), OPAQUE_BLUE);
    assert_eq!(fx.server.outstanding_requests(), 0);

    let err = ctx
        .markup(&mut fx.server, &images, &font, Area::new(0, 0, 30, 10), "<b>")
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn text_extents_measure_without_a_context() {
    let fonts = HeadlessFontDriver::new();
    let font = FontHandle::load(&fonts, 0, "sans 10px").unwrap();
    let mut style = ParsedStyle::plain("hello");
    let extents = text_extents(&fonts, &font, &style).unwrap();
    assert_eq!((extents.width, extents.height), (30, 10));
    assert!(extents.height as i32 <= font.height());

    style.margin.left = 2;
    style.margin.right = 3;
    assert_eq!(text_extents(&fonts, &font, &style).unwrap().width, 35);

    style.text = "hello\nworld!".into();
    assert_eq!(text_extents(&fonts, &font, &style).unwrap().height, 20);
    assert_eq!(
        text_extents(&fonts, &font, &ParsedStyle::plain("")).unwrap(),
        Area::default()
    );
}

#[test]
fn image_blits_are_clipped_and_scaled() {
    let mut fx = Fixture::new(8, 8);
    let mut ctx = fx.context(8, 8);
    let image = Image::solid(4, 2, 0xff00_ff00);
    ctx.image(6, 6, 0, &image).unwrap();
    let snap = ctx.snapshot();
    assert_eq!(pixel(&snap, 8, 7, 7), 0xff00_ff00);
    assert_eq!(count(&snap, 0xff00_ff00), 4);
    ctx.wipe(&mut fx.server).unwrap();

    assert_eq!(image.scaled_width(4), 8);
    let mut ctx = fx.context(8, 8);
    ctx.image(0, 0, 4, &image).unwrap();
    let snap = ctx.snapshot();
    assert_eq!(pixel(&snap, 8, 3, 1), 0xff00_ff00);
    assert_eq!(pixel(&snap, 8, 3, 6), OPAQUE_BLACK);
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn rotate_copies_between_drawables() {
    let mut fx = Fixture::new(4, 4);
    let src = fx.server.create_pixmap(4, 2);
    let dst = fx.server.create_pixmap(2, 4);
    let mut pattern = vec![OPAQUE_BLACK; 8];
    pattern[0] = OPAQUE_RED;
    fx.server.put_image(src, 24, 0, 0, 4, 2, &pattern).unwrap();

    let ctx = fx.context(4, 4);
    ctx.rotate(&mut fx.server, src, dst, 4, 2, 2, 4, std::f64::consts::FRAC_PI_2, 2, 0)
        .unwrap();
    // (0, 0) maps to (1, 0) after a quarter turn and a 2px shift.
    assert_eq!(fx.server.drawable(dst).unwrap().pixel(1, 0), Some(OPAQUE_RED));
    assert_eq!(fx.server.drawable(dst).unwrap().pixel(0, 3), Some(OPAQUE_BLACK));
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn bg_image_from_markup_is_drawn_behind_text() {
    let mut fx = Fixture::new(20, 10);
    let font = fx.font();
    let mut images = HashMap::new();
    images.insert("dot".to_string(), Rc::new(Image::solid(2, 2, OPAQUE_BLUE)));
    let style = markup::parse(&mut fx.server, &images, "<bg image='dot' align='right' top='1'/>").unwrap();
    let mut ctx = fx.context(20, 10);
    ctx.text(&font, Area::new(0, 0, 20, 10), &style).unwrap();
    let snap = ctx.snapshot();
    assert_eq!(pixel(&snap, 20, 19, 1), OPAQUE_BLUE);
    assert_eq!(pixel(&snap, 20, 18, 2), OPAQUE_BLUE);
    assert_eq!(pixel(&snap, 20, 19, 0), OPAQUE_BLACK);
    ctx.wipe(&mut fx.server).unwrap();
}

#[test]
fn resolved_colors_feed_drawing() {
    let mut fx = Fixture::new(4, 4);
    let steel = resolve(&mut fx.server, "steel blue").unwrap();
    let mut ctx = fx.context(4, 4);
    ctx.rectangle(Area::new(0, 0, 4, 4), 1.0, true, Some(&steel)).unwrap();
    assert_eq!(pixel(&ctx.snapshot(), 4, 0, 0), 0xff46_82b4);
    ctx.wipe(&mut fx.server).unwrap();
}
