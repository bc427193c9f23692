//! Collaborators for the command-line host: an in-memory map that logs what
//! it draws, a form and a list held as plain values, alerts on stderr, and a
//! geolocation lookup answered from configuration.

use std::cell::RefCell;
use std::rc::Rc;

use crate::controller::{FormInput, FormSurface, Geolocation, ListSurface, Notifier};
use crate::error::GeolocationUnavailable;
use crate::render::{MapMarker, MapWidget, PanOptions, PopupOptions};
use crate::types::{Coords, WorkoutId, WorkoutKind};

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub center: Coords,
    pub zoom: u8,
    pub pan: Option<PanOptions>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pin {
    pub at: Option<Coords>,
    pub popup: Option<PopupOptions>,
    pub content: String,
    pub open: bool,
}

/// Handle to a pin owned by a [`TerminalMap`].
#[derive(Debug)]
pub struct TerminalMarker {
    key: usize,
    pin: Rc<RefCell<Pin>>,
}

impl MapMarker for TerminalMarker {
    fn bind_popup(&mut self, options: PopupOptions) {
        self.pin.borrow_mut().popup = Some(options);
    }

    fn set_popup_content(&mut self, content: &str) {
        self.pin.borrow_mut().content = content.to_string();
    }

    fn open_popup(&mut self) {
        let mut pin = self.pin.borrow_mut();
        pin.open = true;
        tracing::debug!(marker = self.key, content = %pin.content, "popup opened");
    }
}

#[derive(Debug, Default)]
pub struct TerminalMap {
    view: Option<View>,
    tile_layer: Option<String>,
    pins: Vec<(usize, Rc<RefCell<Pin>>)>,
    next_key: usize,
}

impl TerminalMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub fn tile_layer(&self) -> Option<&str> {
        self.tile_layer.as_deref()
    }

    /// Snapshot of the pins currently on the map, in placement order.
    pub fn pins(&self) -> Vec<Pin> {
        self.pins.iter().map(|(_, p)| p.borrow().clone()).collect()
    }
}

impl MapWidget for TerminalMap {
    type Marker = TerminalMarker;

    fn set_view(&mut self, center: Coords, zoom: u8, pan: Option<PanOptions>) {
        tracing::debug!(%center, zoom, animated = pan.is_some(), "map view set");
        self.view = Some(View { center, zoom, pan });
    }

    fn add_tile_layer(&mut self, url_template: &str, _attribution: &str) {
        self.tile_layer = Some(url_template.to_string());
    }

    fn add_marker(&mut self, at: Coords) -> TerminalMarker {
        let key = self.next_key;
        self.next_key += 1;

        let pin = Rc::new(RefCell::new(Pin {
            at: Some(at),
            ..Pin::default()
        }));
        self.pins.push((key, Rc::clone(&pin)));
        tracing::debug!(marker = key, %at, "marker added");
        TerminalMarker { key, pin }
    }

    fn remove_marker(&mut self, marker: TerminalMarker) {
        self.pins.retain(|(key, _)| *key != marker.key);
        tracing::debug!(marker = marker.key, "marker removed");
    }
}

#[derive(Debug, Default)]
pub struct TerminalForm {
    input: FormInput,
    visible: bool,
    variant: Option<WorkoutKind>,
}

impl TerminalForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Which kind-specific row is showing.
    pub fn variant_field(&self) -> WorkoutKind {
        self.variant.unwrap_or(self.input.kind)
    }
}

impl FormSurface for TerminalForm {
    fn read(&self) -> FormInput {
        self.input.clone()
    }

    fn fill(&mut self, input: &FormInput) {
        self.input = input.clone();
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.input = FormInput {
            kind: self.input.kind,
            ..FormInput::default()
        };
        self.visible = false;
    }

    fn show_variant_field(&mut self, kind: WorkoutKind) {
        self.variant = Some(kind);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: WorkoutId,
    pub markup: String,
    pub hidden: bool,
    pub options_open: bool,
}

/// Entries newest first, the way they stack under the form.
#[derive(Debug, Default)]
pub struct TerminalList {
    entries: Vec<ListEntry>,
}

impl TerminalList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &WorkoutId) -> Option<&ListEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Visible entries wrapped in the list container.
    pub fn html(&self) -> String {
        let mut out = String::from("<ul class=\"workouts\">\n");
        for e in self.entries.iter().filter(|e| !e.hidden) {
            out.push_str(&e.markup);
        }
        out.push_str("</ul>\n");
        out
    }

    fn entry_mut(&mut self, id: &WorkoutId) -> Option<&mut ListEntry> {
        self.entries.iter_mut().find(|e| &e.id == id)
    }
}

impl ListSurface for TerminalList {
    fn insert(&mut self, id: &WorkoutId, markup: &str) {
        self.entries.insert(
            0,
            ListEntry {
                id: id.clone(),
                markup: markup.to_string(),
                hidden: false,
                options_open: false,
            },
        );
    }

    fn remove(&mut self, id: &WorkoutId) {
        self.entries.retain(|e| &e.id != id);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn set_hidden(&mut self, id: &WorkoutId, hidden: bool) {
        if let Some(e) = self.entry_mut(id) {
            e.hidden = hidden;
        }
    }

    fn toggle_options(&mut self, id: &WorkoutId) {
        if let Some(e) = self.entry_mut(id) {
            e.options_open = !e.options_open;
        }
    }
}

/// Prints alerts to stderr and keeps them.
#[derive(Debug, Default)]
pub struct StderrNotifier {
    messages: Vec<String>,
}

impl StderrNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl Notifier for StderrNotifier {
    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
        self.messages.push(message.to_string());
    }
}

/// Answers the position lookup with a configured position, or fails when
/// there is none.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Option<Coords>);

impl Geolocation for FixedPosition {
    fn request_position(&mut self) -> Result<Coords, GeolocationUnavailable> {
        self.0
            .ok_or_else(|| GeolocationUnavailable::new("no home position configured"))
    }
}
