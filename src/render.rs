//! Turns workouts into list markup and map markers.

use std::fmt::Write;

use crate::types::{Coords, Workout, WorkoutDetail};
use crate::utils::format_metric;

pub const POPUP_MAX_WIDTH: u32 = 250;
pub const POPUP_MIN_WIDTH: u32 = 100;
pub const PAN_DURATION_SECS: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PopupOptions {
    pub max_width: u32,
    pub min_width: u32,
    /// Close when another popup opens.
    pub auto_close: bool,
    /// Close when the map itself is clicked.
    pub close_on_click: bool,
    pub class_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanOptions {
    pub animate: bool,
    pub duration_secs: f64,
}

impl Default for PanOptions {
    fn default() -> Self {
        Self {
            animate: true,
            duration_secs: PAN_DURATION_SECS,
        }
    }
}

pub trait MapMarker {
    fn bind_popup(&mut self, options: PopupOptions);
    fn set_popup_content(&mut self, content: &str);
    fn open_popup(&mut self);
}

/// The interactive map. Clicks reach the application as
/// [`crate::controller::UiEvent::MapClicked`].
pub trait MapWidget {
    type Marker: MapMarker;

    fn set_view(&mut self, center: Coords, zoom: u8, pan: Option<PanOptions>);
    fn add_tile_layer(&mut self, url_template: &str, attribution: &str);
    fn add_marker(&mut self, at: Coords) -> Self::Marker;
    fn remove_marker(&mut self, marker: Self::Marker);
}

/// Places a marker for `workout` with an open, sticky popup.
pub fn render_map_marker<M: MapWidget>(workout: &Workout, map: &mut M) -> M::Marker {
    let mut marker = map.add_marker(workout.coords());
    marker.bind_popup(PopupOptions {
        max_width: POPUP_MAX_WIDTH,
        min_width: POPUP_MIN_WIDTH,
        auto_close: false,
        close_on_click: false,
        class_name: format!("{}-popup", workout.kind()),
    });
    marker.set_popup_content(&popup_content(workout));
    marker.open_popup();
    marker
}

pub fn popup_content(workout: &Workout) -> String {
    format!("{} {}", workout.kind().emoji(), workout.description())
}

/// Markup for one list entry. The entry and its edit/delete buttons all
/// carry `data-id`, so actions resolve against this entry only.
pub fn render_list_entry(workout: &Workout) -> String {
    let kind = workout.kind();
    let id = escape(workout.id().as_str());

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<li class="workout workout--{kind}" data-id="{id}">
  <button class="three-dots-btn" data-id="{id}">
    <span class="material-symbols-outlined">more_horiz</span>
  </button>
  <div class="more-options-container hidden">
    <button class="more-option__button option-edit" data-id="{id}">Edit</button>
    <button class="more-option__button option-delete" data-id="{id}">Delete</button>
  </div>
  <h2 class="workout__title">{title}</h2>
"#,
        title = escape(workout.description()),
    );

    push_detail(&mut html, kind.emoji(), &workout.distance_km().to_string(), "km");
    push_detail(&mut html, "⏱", &workout.duration_min().to_string(), "min");

    match *workout.detail() {
        WorkoutDetail::Running {
            cadence,
            pace_min_per_km,
        } => {
            push_detail(&mut html, "🦶🏼", &cadence.to_string(), "spm");
            push_detail(&mut html, "⚡️", &format_metric(pace_min_per_km), "min/km");
        }
        WorkoutDetail::Cycling {
            elevation_gain_m,
            speed_km_per_h,
        } => {
            push_detail(&mut html, "⛰", &elevation_gain_m.to_string(), "m");
            push_detail(&mut html, "⚡️", &format_metric(speed_km_per_h), "km/h");
        }
    }

    html.push_str("</li>\n");
    html
}

fn push_detail(html: &mut String, icon: &str, value: &str, unit: &str) {
    let _ = write!(
        html,
        r#"  <div class="workout__details">
    <span class="workout__icon">{icon}</span>
    <span class="workout__value">{value}</span>
    <span class="workout__unit">{unit}</span>
  </div>
"#
    );
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
