// src/window.rs

//! Per-window attributes exposed to user configuration.
//!
//! A [`Window`] stores the attributes a scripted configuration may read and
//! write (border color and width, opacity, struts, button bindings, window
//! type) and pushes every effective change to the server and to subscribers.
//! Attribute access by name goes through a static [`Property`] table.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::color::{self, ColorResource, ColorSpec};
use crate::error::{Error, ValidationError};
use crate::xserver::{Drawable, XServer};

bitflags! {
    /// Modifier masks for button bindings, with the core protocol values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ButtonModifiers: u16 {
        const SHIFT   = 1 << 0;
        const LOCK    = 1 << 1;
        const CONTROL = 1 << 2;
        const MOD1    = 1 << 3;
        const MOD2    = 1 << 4;
        const MOD3    = 1 << 5;
        const MOD4    = 1 << 6;
        const MOD5    = 1 << 7;
        const ANY     = 1 << 15;
    }
}

/// A mouse button grabbed on a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ButtonBinding {
    /// Button number, `0` for any button.
    pub button: u8,
    pub modifiers: ButtonModifiers,
}

/// Screen-edge space reserved by a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Strut {
    pub left: u16,
    pub right: u16,
    pub top: u16,
    pub bottom: u16,
    pub left_start_y: u16,
    pub left_end_y: u16,
    pub right_start_y: u16,
    pub right_end_y: u16,
    pub top_start_x: u16,
    pub top_end_x: u16,
    pub bottom_start_x: u16,
    pub bottom_end_x: u16,
}

impl Strut {
    /// Values in `_NET_WM_STRUT_PARTIAL` order. The first four form
    /// `_NET_WM_STRUT`.
    pub fn as_partial(&self) -> [u32; 12] {
        [
            self.left,
            self.right,
            self.top,
            self.bottom,
            self.left_start_y,
            self.left_end_y,
            self.right_start_y,
            self.right_end_y,
            self.top_start_x,
            self.top_end_x,
            self.bottom_start_x,
            self.bottom_end_x,
        ]
        .map(u32::from)
    }
}

/// EWMH window types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    Desktop,
    Dock,
    Splash,
    Dialog,
    Menu,
    Toolbar,
    Utility,
    DropdownMenu,
    PopupMenu,
    Tooltip,
    Notification,
    Combo,
    Dnd,
    Normal,
}

impl WindowType {
    pub fn as_str(self) -> &'static str {
        match self {
            WindowType::Desktop => "desktop",
            WindowType::Dock => "dock",
            WindowType::Splash => "splash",
            WindowType::Dialog => "dialog",
            WindowType::Menu => "menu",
            WindowType::Toolbar => "toolbar",
            WindowType::Utility => "utility",
            WindowType::DropdownMenu => "dropdown_menu",
            WindowType::PopupMenu => "popup_menu",
            WindowType::Tooltip => "tooltip",
            WindowType::Notification => "notification",
            WindowType::Combo => "combo",
            WindowType::Dnd => "dnd",
            WindowType::Normal => "normal",
        }
    }

    /// Name of the `_NET_WM_WINDOW_TYPE_*` atom for this type.
    pub fn atom_name(self) -> &'static str {
        match self {
            WindowType::Desktop => "_NET_WM_WINDOW_TYPE_DESKTOP",
            WindowType::Dock => "_NET_WM_WINDOW_TYPE_DOCK",
            WindowType::Splash => "_NET_WM_WINDOW_TYPE_SPLASH",
            WindowType::Dialog => "_NET_WM_WINDOW_TYPE_DIALOG",
            WindowType::Menu => "_NET_WM_WINDOW_TYPE_MENU",
            WindowType::Toolbar => "_NET_WM_WINDOW_TYPE_TOOLBAR",
            WindowType::Utility => "_NET_WM_WINDOW_TYPE_UTILITY",
            WindowType::DropdownMenu => "_NET_WM_WINDOW_TYPE_DROPDOWN_MENU",
            WindowType::PopupMenu => "_NET_WM_WINDOW_TYPE_POPUP_MENU",
            WindowType::Tooltip => "_NET_WM_WINDOW_TYPE_TOOLTIP",
            WindowType::Notification => "_NET_WM_WINDOW_TYPE_NOTIFICATION",
            WindowType::Combo => "_NET_WM_WINDOW_TYPE_COMBO",
            WindowType::Dnd => "_NET_WM_WINDOW_TYPE_DND",
            WindowType::Normal => "_NET_WM_WINDOW_TYPE_NORMAL",
        }
    }
}

impl FromStr for WindowType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "desktop" => WindowType::Desktop,
            "dock" => WindowType::Dock,
            "splash" => WindowType::Splash,
            "dialog" => WindowType::Dialog,
            "menu" => WindowType::Menu,
            "toolbar" => WindowType::Toolbar,
            "utility" => WindowType::Utility,
            "dropdown_menu" => WindowType::DropdownMenu,
            "popup_menu" => WindowType::PopupMenu,
            "tooltip" => WindowType::Tooltip,
            "notification" => WindowType::Notification,
            "combo" => WindowType::Combo,
            "dnd" => WindowType::Dnd,
            "normal" => WindowType::Normal,
            _ => return Err(ValidationError::WindowType(s.to_string())),
        })
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window attributes addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    BorderColor,
    BorderWidth,
    Opacity,
    Buttons,
    Struts,
    Type,
    Window,
}

impl Property {
    pub fn name(self) -> &'static str {
        match self {
            Property::BorderColor => "border_color",
            Property::BorderWidth => "border_width",
            Property::Opacity => "opacity",
            Property::Buttons => "buttons",
            Property::Struts => "struts",
            Property::Type => "type",
            Property::Window => "window",
        }
    }

    /// Signal emitted when the property changes, `None` for read-only ones.
    pub fn signal(self) -> Option<&'static str> {
        match self {
            Property::BorderColor => Some("property::border_color"),
            Property::BorderWidth => Some("property::border_width"),
            Property::Opacity => Some("property::opacity"),
            Property::Buttons => Some("property::buttons"),
            Property::Struts => Some("property::struts"),
            Property::Type => Some("property::type"),
            Property::Window => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        PROPERTIES
            .iter()
            .map(|entry| entry.property)
            .find(|property| property.name() == name)
    }
}

/// A dynamically typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Nil,
    Number(f64),
    Integer(i32),
    String(String),
    Color(ColorResource),
    Strut(Strut),
    Buttons(Vec<ButtonBinding>),
    Native(Drawable),
}

impl PropertyValue {
    fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Nil => "nil",
            PropertyValue::Number(_) => "number",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::String(_) => "string",
            PropertyValue::Color(_) => "color",
            PropertyValue::Strut(_) => "strut",
            PropertyValue::Buttons(_) => "buttons",
            PropertyValue::Native(_) => "native",
        }
    }
}

/// Notification sent to subscribers after an effective change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyChanged {
    pub property: Property,
}

impl PropertyChanged {
    pub fn signal(&self) -> &'static str {
        self.property.signal().unwrap_or("property::unknown")
    }
}

type Getter = fn(&Window) -> PropertyValue;
type Setter = fn(&mut Window, &mut dyn XServer, PropertyValue) -> Result<(), Error>;

struct PropertyEntry {
    property: Property,
    get: Getter,
    set: Option<Setter>,
}

static PROPERTIES: &[PropertyEntry] = &[
    PropertyEntry {
        property: Property::BorderColor,
        get: |w| {
            if w.border_color.initialized {
                PropertyValue::Color(w.border_color)
            } else {
                PropertyValue::Nil
            }
        },
        set: Some(|w, server, value| match value {
            PropertyValue::String(spec) => w.set_border_color(server, spec.as_str()),
            other => Err(type_mismatch(Property::BorderColor, &other)),
        }),
    },
    PropertyEntry {
        property: Property::BorderWidth,
        get: |w| PropertyValue::Integer(w.border_width as i32),
        set: Some(|w, server, value| match value {
            PropertyValue::Integer(width) => w.set_border_width(server, width),
            PropertyValue::Number(width) => w.set_border_width(server, width as i32),
            other => Err(type_mismatch(Property::BorderWidth, &other)),
        }),
    },
    PropertyEntry {
        property: Property::Opacity,
        get: |w| PropertyValue::Number(w.opacity()),
        set: Some(|w, server, value| match value {
            PropertyValue::Nil => w.set_opacity(server, None),
            PropertyValue::Number(opacity) => w.set_opacity(server, Some(opacity)),
            other => Err(type_mismatch(Property::Opacity, &other)),
        }),
    },
    PropertyEntry {
        property: Property::Buttons,
        get: |w| PropertyValue::Buttons(w.buttons.clone()),
        set: Some(|w, server, value| match value {
            PropertyValue::Buttons(buttons) => w.set_buttons(server, buttons),
            other => Err(type_mismatch(Property::Buttons, &other)),
        }),
    },
    PropertyEntry {
        property: Property::Struts,
        get: |w| PropertyValue::Strut(w.strut),
        set: Some(|w, server, value| match value {
            PropertyValue::Strut(strut) => w.set_strut(server, strut),
            other => Err(type_mismatch(Property::Struts, &other)),
        }),
    },
    PropertyEntry {
        property: Property::Type,
        get: |w| match w.window_type {
            Some(window_type) => PropertyValue::String(window_type.as_str().to_string()),
            None => PropertyValue::Nil,
        },
        set: Some(|w, server, value| match value {
            PropertyValue::String(name) => w.set_type(server, &name),
            other => Err(type_mismatch(Property::Type, &other)),
        }),
    },
    PropertyEntry {
        property: Property::Window,
        get: |w| w.window.map_or(PropertyValue::Nil, PropertyValue::Native),
        set: None,
    },
];

fn type_mismatch(property: Property, value: &PropertyValue) -> Error {
    ValidationError::PropertyType {
        property: property.name(),
        got: value.type_name(),
    }
    .into()
}

/// Table entries are in `Property` declaration order.
fn entry(property: Property) -> &'static PropertyEntry {
    &PROPERTIES[property as usize]
}

/// Subscriber callback for property changes.
pub type Subscriber = Box<dyn FnMut(&PropertyChanged)>;

/// Scripted window object.
pub struct Window {
    /// Native window, `None` until the window exists on the server.
    pub window: Option<Drawable>,
    /// Frame the window manager reparented the window into.
    pub frame_window: Option<Drawable>,
    border_color: ColorResource,
    border_width: u16,
    opacity: Option<f64>,
    strut: Strut,
    buttons: Vec<ButtonBinding>,
    window_type: Option<WindowType>,
    subscribers: Vec<Subscriber>,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("window", &self.window)
            .field("frame_window", &self.frame_window)
            .field("border_color", &self.border_color)
            .field("border_width", &self.border_width)
            .field("opacity", &self.opacity)
            .field("strut", &self.strut)
            .field("buttons", &self.buttons)
            .field("window_type", &self.window_type)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Window {
    pub fn new(window: Option<Drawable>) -> Self {
        Self {
            window,
            frame_window: None,
            border_color: ColorResource::default(),
            border_width: 0,
            opacity: None,
            strut: Strut::default(),
            buttons: Vec::new(),
            window_type: None,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&PropertyChanged) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn emit(&mut self, property: Property) {
        let event = PropertyChanged { property };
        debug!("Window {:?}: {}", self.window, event.signal());
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&event);
        }
    }

    /// Reads a property through the property table.
    pub fn get(&self, property: Property) -> PropertyValue {
        (entry(property).get)(self)
    }

    /// Writes a property through the property table.
    pub fn set(
        &mut self,
        server: &mut dyn XServer,
        property: Property,
        value: PropertyValue,
    ) -> Result<(), Error> {
        match entry(property).set {
            Some(setter) => setter(self, server, value),
            None => Err(ValidationError::ReadOnly(property.name()).into()),
        }
    }

    pub fn border_color(&self) -> &ColorResource {
        &self.border_color
    }

    pub fn border_width(&self) -> u16 {
        self.border_width
    }

    /// Current opacity, `1.0` when unset.
    pub fn opacity(&self) -> f64 {
        self.opacity.unwrap_or(1.0)
    }

    pub fn strut(&self) -> &Strut {
        &self.strut
    }

    pub fn buttons(&self) -> &[ButtonBinding] {
        &self.buttons
    }

    pub fn window_type(&self) -> Option<WindowType> {
        self.window_type
    }

    /// Resolves `spec` and makes it the border color. A color that fails to
    /// resolve leaves the current border untouched.
    pub fn set_border_color(
        &mut self,
        server: &mut dyn XServer,
        spec: impl Into<ColorSpec>,
    ) -> Result<(), Error> {
        let color = color::resolve(server, spec)?;
        self.set_border_color_resource(server, color)
    }

    /// Makes an already resolved color the border color, for callers that
    /// batch their allocations with [`color::complete_all`].
    pub fn set_border_color_resource(
        &mut self,
        server: &mut dyn XServer,
        color: ColorResource,
    ) -> Result<(), Error> {
        color.ensure_initialized("border")?;
        if color == self.border_color {
            return Ok(());
        }
        if let Some(window) = self.window {
            server.set_border_color(window, color.pixel)?;
        }
        self.border_color = color;
        self.emit(Property::BorderColor);
        Ok(())
    }

    pub fn set_border_width(&mut self, server: &mut dyn XServer, width: i32) -> Result<(), Error> {
        let width = u16::try_from(width).map_err(|_| ValidationError::BorderWidth(width))?;
        if width == self.border_width {
            return Ok(());
        }
        if let Some(window) = self.window {
            server.set_border_width(window, u32::from(width))?;
        }
        self.border_width = width;
        self.emit(Property::BorderWidth);
        Ok(())
    }

    /// Sets the opacity; `None` returns the window to the default.
    pub fn set_opacity(
        &mut self,
        server: &mut dyn XServer,
        opacity: Option<f64>,
    ) -> Result<(), Error> {
        if let Some(value) = opacity {
            if !(0.0..=1.0).contains(&value) {
                warn!("Ignoring opacity {} outside [0, 1]", value);
                return Err(ValidationError::Opacity(value).into());
            }
        }
        if opacity == self.opacity {
            return Ok(());
        }
        if let Some(window) = self.window {
            server.set_opacity(window, opacity)?;
        }
        self.opacity = opacity;
        self.emit(Property::Opacity);
        Ok(())
    }

    pub fn set_strut(&mut self, server: &mut dyn XServer, strut: Strut) -> Result<(), Error> {
        if strut == self.strut {
            return Ok(());
        }
        if let Some(window) = self.window {
            server.set_strut(window, &strut)?;
        }
        self.strut = strut;
        self.emit(Property::Struts);
        Ok(())
    }

    pub fn set_buttons(
        &mut self,
        server: &mut dyn XServer,
        buttons: Vec<ButtonBinding>,
    ) -> Result<(), Error> {
        if buttons == self.buttons {
            return Ok(());
        }
        if let Some(window) = self.window {
            server.grab_buttons(window, &buttons)?;
        }
        self.buttons = buttons;
        self.emit(Property::Buttons);
        Ok(())
    }

    /// Sets the window type by name. Unknown names are rejected and leave
    /// the type unchanged.
    pub fn set_type(&mut self, server: &mut dyn XServer, name: &str) -> Result<(), Error> {
        let window_type = match name.parse::<WindowType>() {
            Ok(window_type) => window_type,
            Err(err) => {
                warn!("Unknown window type '{}'", name);
                return Err(err.into());
            }
        };
        if self.window_type == Some(window_type) {
            return Ok(());
        }
        if let Some(window) = self.window {
            let atom = server.intern_atom(window_type.atom_name())?;
            server.set_window_type(window, atom)?;
        }
        self.window_type = Some(window_type);
        self.emit(Property::Type);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xserver::{MockXServer, RecordedCall};
    use std::cell::RefCell;
    use std::rc::Rc;
    use test_log::test;

    const WID: Drawable = 0x0060_0001;

    fn recorded_window() -> (Window, Rc<RefCell<Vec<&'static str>>>) {
        let mut window = Window::new(Some(WID));
        let signals = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&signals);
        window.subscribe(move |event| sink.borrow_mut().push(event.signal()));
        (window, signals)
    }

    #[test]
    fn opacity_set_twice_emits_once() {
        let mut server = MockXServer::new();
        let (mut window, signals) = recorded_window();
        window.set_opacity(&mut server, Some(0.5)).unwrap();
        window.set_opacity(&mut server, Some(0.5)).unwrap();
        assert_eq!(*signals.borrow(), vec!["property::opacity"]);
        assert_eq!(window.opacity(), 0.5);

        window.set_opacity(&mut server, None).unwrap();
        assert_eq!(window.opacity(), 1.0);
        assert_eq!(signals.borrow().len(), 2);
        assert!(server.calls().contains(&RecordedCall::SetOpacity {
            window: WID,
            opacity: None
        }));
    }

    #[test]
    fn opacity_out_of_range_is_rejected() {
        let mut server = MockXServer::new();
        let (mut window, signals) = recorded_window();
        let err = window.set_opacity(&mut server, Some(1.5)).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::Opacity(v)) if v == 1.5
        ));
        assert!(signals.borrow().is_empty());
        assert!(server.calls().is_empty());
    }

    #[test]
    fn unknown_type_leaves_state_unchanged() {
        let mut server = MockXServer::new();
        let (mut window, signals) = recorded_window();
        window.set_type(&mut server, "dock").unwrap();
        assert!(window.set_type(&mut server, "sidebar").is_err());
        assert_eq!(window.window_type(), Some(WindowType::Dock));
        assert_eq!(*signals.borrow(), vec!["property::type"]);
        let atom = server
            .calls()
            .iter()
            .find_map(|call| match call {
                RecordedCall::SetWindowType { atom, .. } => Some(*atom),
                _ => None,
            })
            .unwrap();
        assert_eq!(server.atom_name(atom), Some("_NET_WM_WINDOW_TYPE_DOCK"));
    }

    #[test]
    fn window_type_tables_agree() {
        let all = [
            "desktop",
            "dock",
            "splash",
            "dialog",
            "menu",
            "toolbar",
            "utility",
            "dropdown_menu",
            "popup_menu",
            "tooltip",
            "notification",
            "combo",
            "dnd",
            "normal",
        ];
        for name in all {
            let window_type: WindowType = name.parse().unwrap();
            assert_eq!(window_type.as_str(), name);
            assert_eq!(
                window_type.atom_name(),
                format!("_NET_WM_WINDOW_TYPE_{}", name.to_uppercase())
            );
        }
    }

    #[test]
    fn border_width_and_color() {
        let mut server = MockXServer::new();
        let (mut window, signals) = recorded_window();
        assert!(window.set_border_width(&mut server, -1).is_err());
        window.set_border_width(&mut server, 2).unwrap();
        window.set_border_width(&mut server, 2).unwrap();
        window.set_border_color(&mut server, "#ff0000").unwrap();
        window.set_border_color(&mut server, "red").unwrap();
        assert!(window.set_border_color(&mut server, "#ff00").is_err());
        assert_eq!(
            *signals.borrow(),
            vec!["property::border_width", "property::border_color"]
        );
        assert_eq!(window.border_color().pixel, 0x00ff_0000);
        assert!(server.calls().contains(&RecordedCall::SetBorderColor {
            window: WID,
            pixel: 0x00ff_0000
        }));
    }

    #[test]
    fn batched_border_color_is_applied_once() {
        let mut server = MockXServer::new();
        let (mut window, signals) = recorded_window();
        let pending = vec![
            color::begin_resolve(&mut server, "#00ff00").unwrap(),
            color::begin_resolve(&mut server, "navy").unwrap(),
        ];
        assert_eq!(server.outstanding_requests(), 2);
        let colors = color::complete_all(&mut server, pending).unwrap();
        window.set_border_color_resource(&mut server, colors[0]).unwrap();
        window.set_border_color_resource(&mut server, colors[0]).unwrap();
        assert!(matches!(
            window.set_border_color_resource(&mut server, ColorResource::default()),
            Err(Error::UnresolvedColor("border"))
        ));
        assert_eq!(*signals.borrow(), vec!["property::border_color"]);
        assert_eq!(window.border_color().pixel, 0x0000_ff00);
        assert!(server.calls().contains(&RecordedCall::SetBorderColor {
            window: WID,
            pixel: 0x0000_ff00
        }));
    }

    #[test]
    fn failed_server_writes_leave_state_for_a_retry() {
        let mut server = MockXServer::new();
        let (mut window, signals) = recorded_window();
        let strut = Strut {
            left: 10,
            ..Strut::default()
        };
        let buttons = vec![ButtonBinding {
            button: 1,
            modifiers: ButtonModifiers::ANY,
        }];

        server.set_fail_property_writes(true);
        assert!(window.set_opacity(&mut server, Some(0.5)).is_err());
        assert!(window.set_strut(&mut server, strut).is_err());
        assert!(window.set_buttons(&mut server, buttons.clone()).is_err());
        assert!(window.set_border_color(&mut server, "blue").is_err());
        assert!(window.set_type(&mut server, "dock").is_err());
        assert_eq!(window.opacity(), 1.0);
        assert_eq!(*window.strut(), Strut::default());
        assert!(window.buttons().is_empty());
        assert!(!window.border_color().initialized);
        assert_eq!(window.window_type(), None);
        assert!(signals.borrow().is_empty());

        server.set_fail_property_writes(false);
        server.clear_calls();
        window.set_opacity(&mut server, Some(0.5)).unwrap();
        window.set_strut(&mut server, strut).unwrap();
        window.set_buttons(&mut server, buttons).unwrap();
        window.set_border_color(&mut server, "blue").unwrap();
        window.set_type(&mut server, "dock").unwrap();
        assert!(server.calls().contains(&RecordedCall::SetOpacity {
            window: WID,
            opacity: Some(0.5)
        }));
        assert!(server
            .calls()
            .contains(&RecordedCall::SetStrut { window: WID, strut }));
        assert!(server.calls().contains(&RecordedCall::GrabButtons {
            window: WID,
            count: 1
        }));
        assert_eq!(window.window_type(), Some(WindowType::Dock));
        assert_eq!(
            *signals.borrow(),
            vec![
                "property::opacity",
                "property::struts",
                "property::buttons",
                "property::border_color",
                "property::type"
            ]
        );
    }

    #[test]
    fn property_table_dispatch() {
        let mut server = MockXServer::new();
        let (mut window, signals) = recorded_window();
        assert_eq!(window.get(Property::BorderColor), PropertyValue::Nil);
        assert_eq!(window.get(Property::Opacity), PropertyValue::Number(1.0));
        assert_eq!(window.get(Property::Window), PropertyValue::Native(WID));

        window
            .set(&mut server, Property::BorderWidth, PropertyValue::Integer(3))
            .unwrap();
        assert_eq!(window.get(Property::BorderWidth), PropertyValue::Integer(3));

        let strut = Strut {
            top: 20,
            top_end_x: 1023,
            ..Strut::default()
        };
        window
            .set(&mut server, Property::Struts, PropertyValue::Strut(strut))
            .unwrap();
        assert!(server
            .calls()
            .contains(&RecordedCall::SetStrut { window: WID, strut }));

        let read_only = window.set(&mut server, Property::Window, PropertyValue::Native(1));
        assert!(matches!(
            read_only,
            Err(Error::Validation(ValidationError::ReadOnly("window")))
        ));
        let mismatch = window.set(&mut server, Property::Opacity, PropertyValue::Integer(1));
        assert!(mismatch.is_err());
        assert_eq!(
            *signals.borrow(),
            vec!["property::border_width", "property::struts"]
        );
        assert_eq!(Property::from_name("type"), Some(Property::Type));
    }

    #[test]
    fn property_table_is_in_declaration_order() {
        for (index, entry) in PROPERTIES.iter().enumerate() {
            assert_eq!(entry.property as usize, index);
        }
    }

    #[test]
    fn buttons_are_grabbed_on_change() {
        let mut server = MockXServer::new();
        let (mut window, signals) = recorded_window();
        let buttons = vec![ButtonBinding {
            button: 1,
            modifiers: ButtonModifiers::MOD4,
        }];
        window.set_buttons(&mut server, buttons.clone()).unwrap();
        window.set_buttons(&mut server, buttons).unwrap();
        assert_eq!(*signals.borrow(), vec!["property::buttons"]);
        assert!(server
            .calls()
            .contains(&RecordedCall::GrabButtons { window: WID, count: 1 }));
    }

    #[test]
    fn detached_window_stores_without_server_calls() {
        let mut server = MockXServer::new();
        let mut window = Window::new(None);
        window.set_border_width(&mut server, 4).unwrap();
        window.set_type(&mut server, "normal").unwrap();
        assert_eq!(window.border_width(), 4);
        assert!(server.calls().is_empty());
    }
}
