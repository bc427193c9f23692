//! The create/edit/delete/select lifecycle.
//!
//! [`App`] is the application context: it owns the store, the map, the
//! form and list surfaces, and the form state. Hosts feed it [`UiEvent`]s.
//! Every mutating path validates first, then mutates the store, then
//! persists, and only renders once the snapshot is written. A failed save
//! rolls the in-memory mutation back.

use std::collections::HashMap;

use chrono::{Local, Utc};

use crate::dlog;
use crate::error::{GeolocationUnavailable, StoreError, ValidationError};
use crate::render::{MapWidget, PanOptions, render_list_entry, render_map_marker};
use crate::store::{KeyValueMedium, WorkoutStore};
use crate::types::{Coords, Workout, WorkoutId, WorkoutInput, WorkoutKind};
use crate::utils::parse_number;

pub const DEFAULT_ZOOM: u8 = 13;
pub const TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str = r#"&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors"#;

pub const INVALID_INPUT_MESSAGE: &str = "Inputs have to be positive numbers!";
pub const NO_POSITION_MESSAGE: &str = "Could not get your position";
pub const SAVE_FAILED_MESSAGE: &str = "Could not save your workouts";

/// Form field values as text, the way the form holds them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub kind: WorkoutKind,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

impl Default for FormInput {
    fn default() -> Self {
        Self {
            kind: WorkoutKind::Running,
            distance: String::new(),
            duration: String::new(),
            cadence: String::new(),
            elevation: String::new(),
        }
    }
}

impl FormInput {
    /// Pre-fill values for editing `workout`.
    pub fn from_workout(workout: &Workout) -> Self {
        let mut form = Self {
            kind: workout.kind(),
            distance: workout.distance_km().to_string(),
            duration: workout.duration_min().to_string(),
            ..Self::default()
        };
        match workout.input() {
            WorkoutInput::Running { cadence, .. } => form.cadence = cadence.to_string(),
            WorkoutInput::Cycling {
                elevation_gain_m, ..
            } => form.elevation = elevation_gain_m.to_string(),
        }
        form
    }

    /// Only the field for the selected kind is read.
    pub fn to_workout_input(&self) -> WorkoutInput {
        let distance_km = parse_number(&self.distance);
        let duration_min = parse_number(&self.duration);
        match self.kind {
            WorkoutKind::Running => WorkoutInput::Running {
                distance_km,
                duration_min,
                cadence: parse_number(&self.cadence),
            },
            WorkoutKind::Cycling => WorkoutInput::Cycling {
                distance_km,
                duration_min,
                elevation_gain_m: parse_number(&self.elevation),
            },
        }
    }
}

pub trait FormSurface {
    fn read(&self) -> FormInput;
    fn fill(&mut self, input: &FormInput);
    fn show(&mut self);
    /// Hides the form and clears every field.
    fn hide(&mut self);
    /// Shows the cadence row for running, the elevation row for cycling.
    fn show_variant_field(&mut self, kind: WorkoutKind);
}

/// The rendered workout list. Entries are addressed by workout id.
pub trait ListSurface {
    fn insert(&mut self, id: &WorkoutId, markup: &str);
    fn remove(&mut self, id: &WorkoutId);
    fn clear(&mut self);
    fn set_hidden(&mut self, id: &WorkoutId, hidden: bool);
    fn toggle_options(&mut self, id: &WorkoutId);
}

/// Blocking user-facing messages.
pub trait Notifier {
    fn alert(&mut self, message: &str);
}

/// One-shot device position lookup.
pub trait Geolocation {
    fn request_position(&mut self) -> Result<Coords, GeolocationUnavailable>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    /// Form hidden.
    Idle,
    /// Form shown for a new workout at `at`.
    Positioning { at: Coords },
    /// Form shown pre-filled with workout `id`.
    Editing { id: WorkoutId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAction {
    /// Click on the entry body: pan the map to it.
    Select,
    /// The "more options" button.
    ToggleOptions,
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    MapClicked(Coords),
    FormSubmitted,
    FormCancelled,
    TypeChanged,
    List { id: WorkoutId, action: ListAction },
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done,
    /// The event does not apply in the current state.
    Ignored,
    Invalid(ValidationError),
    NotFound(WorkoutId),
    /// Persisting failed; the mutation was rolled back.
    SaveFailed,
}

impl Outcome {
    pub const fn is_refused(&self) -> bool {
        !matches!(self, Self::Done)
    }
}

pub struct App<K, M: MapWidget, F, L, N> {
    store: WorkoutStore<K>,
    map: M,
    map_ready: bool,
    markers: HashMap<WorkoutId, M::Marker>,
    form: F,
    list: L,
    notifier: N,
    state: FormState,
    zoom: u8,
}

impl<K, M, F, L, N> App<K, M, F, L, N>
where
    K: KeyValueMedium,
    M: MapWidget,
    F: FormSurface,
    L: ListSurface,
    N: Notifier,
{
    pub fn new(store: WorkoutStore<K>, map: M, form: F, list: L, notifier: N) -> Self {
        Self {
            store,
            map,
            map_ready: false,
            markers: HashMap::new(),
            form,
            list,
            notifier,
            state: FormState::Idle,
            zoom: DEFAULT_ZOOM,
        }
    }

    #[must_use]
    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    /// Loads stored workouts into the list, then asks for the position and
    /// brings the map up if it is known.
    pub fn boot<G: Geolocation>(&mut self, geolocation: &mut G) {
        self.load();
        match geolocation.request_position() {
            Ok(center) => self.load_map(center),
            Err(e) => {
                tracing::warn!(err = %e, "map unavailable");
                self.notifier.alert(NO_POSITION_MESSAGE);
            }
        }
    }

    /// Replaces in-memory workouts with the stored ones and lists them.
    pub fn load(&mut self) {
        self.list.clear();
        self.store.load();
        for w in self.store.workouts() {
            self.list.insert(w.id(), &render_list_entry(w));
        }
        if self.map_ready {
            self.refresh_markers();
        }
    }

    /// Centers the map on `center`, starts accepting clicks and places a
    /// marker for every loaded workout.
    pub fn load_map(&mut self, center: Coords) {
        self.map.set_view(center, self.zoom, None);
        self.map.add_tile_layer(TILE_URL, TILE_ATTRIBUTION);
        self.map_ready = true;
        tracing::info!(%center, zoom = self.zoom, "map loaded");
        self.refresh_markers();
    }

    pub fn handle(&mut self, event: UiEvent) -> Outcome {
        dlog!("event={event:?} state={:?}", self.state);
        match event {
            UiEvent::MapClicked(at) => self.map_clicked(at),
            UiEvent::FormSubmitted => self.submit(),
            UiEvent::FormCancelled => self.cancel(),
            UiEvent::TypeChanged => {
                let kind = self.form.read().kind;
                self.form.show_variant_field(kind);
                Outcome::Done
            }
            UiEvent::List { id, action } => match action {
                ListAction::Select => self.select(&id),
                ListAction::ToggleOptions => self.toggle_options(&id),
                ListAction::Edit => self.start_edit(&id),
                ListAction::Delete => self.delete(&id),
            },
            UiEvent::Reset => self.reset(),
        }
    }

    pub const fn state(&self) -> &FormState {
        &self.state
    }

    pub const fn store(&self) -> &WorkoutStore<K> {
        &self.store
    }

    pub const fn map(&self) -> &M {
        &self.map
    }

    pub const fn form(&self) -> &F {
        &self.form
    }

    /// Hosts write user input through this.
    pub const fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub const fn list(&self) -> &L {
        &self.list
    }

    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    pub const fn is_map_ready(&self) -> bool {
        self.map_ready
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn has_marker(&self, id: &WorkoutId) -> bool {
        self.markers.contains_key(id)
    }

    fn map_clicked(&mut self, at: Coords) -> Outcome {
        if !self.map_ready {
            return Outcome::Ignored;
        }
        match self.state {
            FormState::Idle | FormState::Positioning { .. } => {
                self.state = FormState::Positioning { at };
                self.form.show();
                dlog!("positioning at={at}");
                Outcome::Done
            }
            FormState::Editing { .. } => Outcome::Ignored,
        }
    }

    fn submit(&mut self) -> Outcome {
        match self.state.clone() {
            FormState::Idle => Outcome::Ignored,
            FormState::Positioning { at } => self.create(at),
            FormState::Editing { id } => self.update(&id),
        }
    }

    fn create(&mut self, at: Coords) -> Outcome {
        let input = self.form.read().to_workout_input();
        let now = Local::now();
        let id = self.store.mint_id(now.with_timezone(&Utc));

        let workout = match Workout::build(id, now, at, input) {
            Ok(w) => w,
            Err(e) => return self.reject(e),
        };
        let id = workout.id().clone();

        if let Err(e) = self.store.append(workout) {
            return self.save_failed(&e);
        }
        if let Err(e) = self.store.save() {
            self.store.remove(&id);
            return self.save_failed(&e);
        }

        if let Some(w) = self.store.find_by_id(&id) {
            tracing::info!(%id, kind = %w.kind(), "workout created");
            self.list.insert(&id, &render_list_entry(w));
        }
        self.place_marker(&id);
        self.finish_form();
        Outcome::Done
    }

    fn update(&mut self, id: &WorkoutId) -> Outcome {
        let Some(original) = self.store.find_by_id(id) else {
            return self.edited_workout_gone(id);
        };

        let input = self.form.read().to_workout_input();
        let built = Workout::build(
            id.clone(),
            original.created_at().with_timezone(&Local),
            original.coords(),
            input,
        );
        let workout = match built {
            Ok(w) => w,
            Err(e) => return self.reject(e),
        };
        let kind = workout.kind();

        let Ok(old) = self.store.replace(id, workout) else {
            return self.edited_workout_gone(id);
        };
        if let Err(e) = self.store.save() {
            if let Err(undo) = self.store.replace(id, old) {
                tracing::error!(%id, err = %undo, "rolling back the update failed");
            }
            return self.save_failed(&e);
        }
        tracing::info!(%id, %kind, "workout updated");

        self.list.clear();
        for w in self.store.workouts() {
            self.list.insert(w.id(), &render_list_entry(w));
        }
        self.retract_marker(id);
        self.place_marker(id);
        self.finish_form();
        Outcome::Done
    }

    fn cancel(&mut self) -> Outcome {
        match std::mem::replace(&mut self.state, FormState::Idle) {
            FormState::Idle => return Outcome::Ignored,
            FormState::Positioning { .. } => {}
            FormState::Editing { id } => self.list.set_hidden(&id, false),
        }
        self.form.hide();
        Outcome::Done
    }

    fn select(&mut self, id: &WorkoutId) -> Outcome {
        if self.state != FormState::Idle || !self.map_ready {
            return Outcome::Ignored;
        }
        let Some(w) = self.store.find_by_id(id) else {
            return Outcome::NotFound(id.clone());
        };
        self.map
            .set_view(w.coords(), self.zoom, Some(PanOptions::default()));
        Outcome::Done
    }

    fn toggle_options(&mut self, id: &WorkoutId) -> Outcome {
        if self.store.find_by_id(id).is_none() {
            return Outcome::NotFound(id.clone());
        }
        self.list.toggle_options(id);
        Outcome::Done
    }

    fn start_edit(&mut self, id: &WorkoutId) -> Outcome {
        if self.state != FormState::Idle {
            return Outcome::Ignored;
        }
        let Some(w) = self.store.find_by_id(id) else {
            return Outcome::NotFound(id.clone());
        };

        let prefill = FormInput::from_workout(w);
        self.form.fill(&prefill);
        self.form.show_variant_field(prefill.kind);
        self.form.show();
        self.list.set_hidden(id, true);
        self.state = FormState::Editing { id: id.clone() };
        dlog!("editing id={id}");
        Outcome::Done
    }

    fn delete(&mut self, id: &WorkoutId) -> Outcome {
        let Some((idx, removed)) = self.store.remove(id) else {
            return Outcome::NotFound(id.clone());
        };
        if let Err(e) = self.store.save() {
            self.store.restore(idx, removed);
            return self.save_failed(&e);
        }
        tracing::info!(%id, kind = %removed.kind(), "workout deleted");

        self.list.remove(id);
        self.retract_marker(id);
        if self.state == (FormState::Editing { id: id.clone() }) {
            self.finish_form();
        }
        Outcome::Done
    }

    fn reset(&mut self) -> Outcome {
        if let Err(e) = self.store.reset() {
            return self.save_failed(&e);
        }
        self.list.clear();
        for (_, marker) in self.markers.drain() {
            self.map.remove_marker(marker);
        }
        self.finish_form();
        Outcome::Done
    }

    fn reject(&mut self, e: ValidationError) -> Outcome {
        tracing::info!(field = %e.field, value = e.value, "rejected workout input");
        self.notifier.alert(INVALID_INPUT_MESSAGE);
        Outcome::Invalid(e)
    }

    fn save_failed(&mut self, e: &StoreError) -> Outcome {
        tracing::error!(err = %e, "persisting workouts failed");
        self.notifier.alert(SAVE_FAILED_MESSAGE);
        Outcome::SaveFailed
    }

    fn edited_workout_gone(&mut self, id: &WorkoutId) -> Outcome {
        tracing::warn!(%id, "workout being edited is no longer stored");
        self.finish_form();
        Outcome::NotFound(id.clone())
    }

    fn finish_form(&mut self) {
        self.form.hide();
        self.state = FormState::Idle;
    }

    fn refresh_markers(&mut self) {
        for (_, marker) in self.markers.drain() {
            self.map.remove_marker(marker);
        }
        for w in self.store.workouts() {
            let marker = render_map_marker(w, &mut self.map);
            self.markers.insert(w.id().clone(), marker);
        }
    }

    fn place_marker(&mut self, id: &WorkoutId) {
        if !self.map_ready {
            return;
        }
        if let Some(w) = self.store.find_by_id(id) {
            let marker = render_map_marker(w, &mut self.map);
            self.markers.insert(id.clone(), marker);
        }
    }

    fn retract_marker(&mut self, id: &WorkoutId) {
        if let Some(marker) = self.markers.remove(id) {
            self.map.remove_marker(marker);
        }
    }
}
