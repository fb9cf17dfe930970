// src/main.rs

//! `wm-draw`: renders a markup string into a window for a few seconds.
//!
//! Usage: `wm-draw [MARKUP...]`. The arguments are joined with spaces; without
//! any, a sample string is shown.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use log::{error, info};

use wm_draw::color::{begin_resolve, complete_all};
use wm_draw::config::CONFIG;
use wm_draw::draw::{DrawContext, Image};
use wm_draw::font::{FontHandle, FontconfigDriver};
use wm_draw::geometry::Area;
use wm_draw::window::Window;
use wm_draw::xserver::{LiveXServer, XServer};

const SAMPLE_MARKUP: &str =
    "<margin left='6' right='6'/><b>wm-draw</b> <span fg='steelblue'>preview</span> <i>markup</i>";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let markup = if args.is_empty() {
        SAMPLE_MARKUP.to_string()
    } else {
        args.join(" ")
    };
    info!("Starting wm-draw preview");

    let mut server = LiveXServer::connect().context("Failed to connect to the X server")?;
    let phys_screen = server.default_screen();
    let screen = server
        .screen(phys_screen)
        .context("Failed to query the default screen")?;
    info!(
        "Screen {}: {}x{}, depth {}",
        phys_screen, screen.width, screen.height, screen.root_depth
    );

    // Issue all three allocations before waiting on any of them.
    let config = &*CONFIG;
    let pending = vec![
        begin_resolve(&mut server, config.colors.foreground.as_str())
            .context("Invalid foreground color")?,
        begin_resolve(&mut server, config.colors.background.as_str())
            .context("Invalid background color")?,
        begin_resolve(&mut server, config.colors.border.as_str())
            .context("Invalid border color")?,
    ];
    let colors = complete_all(&mut server, pending).context("Failed to resolve colors")?;
    let (fg, bg, border) = (colors[0], colors[1], colors[2]);

    let area = Area::new(0, 0, config.preview.width, config.preview.height);
    let native = server
        .create_window(phys_screen, area, bg.pixel)
        .context("Failed to create the preview window")?;
    let mut window = Window::new(Some(native));
    window.subscribe(|event| info!("Window property changed: {}", event.signal()));
    window.set_type(&mut server, "dialog")?;
    window.set_border_width(&mut server, 1)?;
    window.set_border_color_resource(&mut server, border)?;
    server.map_window(native).context("Failed to map the preview window")?;
    server.flush()?;

    let fonts = Rc::new(FontconfigDriver::new(config.font.dpi));
    let mut font = Some(
        FontHandle::load(fonts.as_ref(), 0, &config.font.description)
            .with_context(|| format!("Failed to load font '{}'", config.font.description))?,
    );

    let mut ctx = DrawContext::init(
        &mut server,
        fonts,
        phys_screen,
        area.width,
        area.height,
        native,
        &fg,
        &bg,
    )
    .context("Failed to bind a draw context to the preview window")?;

    let images: HashMap<String, Rc<Image>> = HashMap::new();
    let bounds = ctx.bounds();
    let rendered = match font.as_ref() {
        Some(font) => ctx.markup(&mut server, &images, font, bounds, &markup),
        None => Ok(()),
    };
    if let Err(err) = &rendered {
        error!("Failed to render markup: {}", err);
    }
    ctx.flush(&mut server)?;
    server.flush()?;

    std::thread::sleep(Duration::from_millis(config.preview.hold_ms));

    ctx.wipe(&mut server)?;
    FontHandle::release(&mut font);
    server
        .destroy_window(native)
        .context("Failed to destroy the preview window")?;
    server.flush()?;
    info!("wm-draw exited");

    rendered.context("Markup could not be rendered")
}
