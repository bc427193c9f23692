//! Ordered workout collection persisted as one entry of a flat key-value
//! medium.
//!
//! The persisted form is a JSON array of plain [`StoredWorkout`] records.
//! Loading reattaches the variant from the stored `type` discriminator and
//! keeps the stored derived fields (`pace`, `speed`, `description`) verbatim;
//! nothing is recomputed on the way back in.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::dlog;
use crate::error::{Field, PersistenceReadError, StoreError, StoreResult};
use crate::types::{Coords, Workout, WorkoutDetail, WorkoutId, WorkoutKind, positive};

pub const DEFAULT_KEY: &str = "workouts";

/// Flat string key-value storage.
pub trait KeyValueMedium {
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Replaces the whole value. Implementations must not leave a partial
    /// value behind on failure.
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> io::Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryMedium {
    entries: HashMap<String, String>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.into());
        Self { entries }
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueMedium for MemoryMedium {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory. Writes go through a
/// temp file in the same directory and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        // Keys become file names; only allow simple identifiers.
        if key.is_empty()
            || !key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsafe storage key: {key:?}"),
            ));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueMedium for FileMedium {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Plain persisted shape of a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWorkout {
    pub date: DateTime<Utc>,
    pub id: WorkoutId,
    pub coords: Coords,
    pub distance: f64,
    pub duration: f64,
    #[serde(rename = "type")]
    pub kind: WorkoutKind,
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl From<&Workout> for StoredWorkout {
    fn from(w: &Workout) -> Self {
        let (cadence, pace, elevation_gain, speed) = match *w.detail() {
            WorkoutDetail::Running {
                cadence,
                pace_min_per_km,
            } => (Some(cadence), Some(pace_min_per_km), None, None),
            WorkoutDetail::Cycling {
                elevation_gain_m,
                speed_km_per_h,
            } => (None, None, Some(elevation_gain_m), Some(speed_km_per_h)),
        };

        Self {
            date: w.created_at(),
            id: w.id().clone(),
            coords: w.coords(),
            distance: w.distance_km(),
            duration: w.duration_min(),
            kind: w.kind(),
            description: w.description().to_string(),
            cadence,
            pace,
            elevation_gain,
            speed,
        }
    }
}

impl StoredWorkout {
    /// Reattaches the variant named by `kind`. `None` when the record lacks
    /// that variant's fields or one of its inputs is not a positive number.
    /// Stored `pace`/`speed` are taken as they are.
    pub fn rehydrate(self) -> Option<Workout> {
        positive(Field::Distance, self.distance).ok()?;
        positive(Field::Duration, self.duration).ok()?;

        let detail = match self.kind {
            WorkoutKind::Running => WorkoutDetail::Running {
                cadence: self.cadence.filter(|&c| c > 0)?,
                pace_min_per_km: self.pace?,
            },
            WorkoutKind::Cycling => WorkoutDetail::Cycling {
                elevation_gain_m: positive(Field::ElevationGain, self.elevation_gain?).ok()?,
                speed_km_per_h: self.speed?,
            },
        };

        Some(Workout::from_parts(
            self.id,
            self.date,
            self.coords,
            self.distance,
            self.duration,
            self.description,
            detail,
        ))
    }
}

/// Encodes the full list as the persisted snapshot.
pub fn encode(workouts: &[Workout]) -> serde_json::Result<String> {
    let records: Vec<StoredWorkout> = workouts.iter().map(StoredWorkout::from).collect();
    serde_json::to_string(&records)
}

/// Decodes a snapshot. Only a payload that is not a JSON array fails; a
/// record that does not parse or rehydrate is dropped on its own.
pub fn decode(key: &str, raw: &str) -> Result<Vec<Workout>, PersistenceReadError> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|source| PersistenceReadError::Malformed {
            key: key.to_string(),
            source,
        })?;

    let mut out = Vec::with_capacity(values.len());
    for (idx, value) in values.into_iter().enumerate() {
        let record = match serde_json::from_value::<StoredWorkout>(value) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(%key, idx, err = %e, "dropping unparsable stored workout");
                continue;
            }
        };
        let id = record.id.clone();
        let kind = record.kind;
        match record.rehydrate() {
            Some(w) => out.push(w),
            None => tracing::warn!(%key, %id, %kind, "dropping invalid stored workout"),
        }
    }
    Ok(out)
}

/// In-memory ordered workouts plus their persistence. Mutations do not
/// persist by themselves; call [`WorkoutStore::save`] once per user action.
#[derive(Debug)]
pub struct WorkoutStore<K> {
    medium: K,
    key: String,
    workouts: Vec<Workout>,
}

impl<K: KeyValueMedium> WorkoutStore<K> {
    pub fn new(medium: K) -> Self {
        Self::with_key(medium, DEFAULT_KEY)
    }

    pub fn with_key(medium: K, key: impl Into<String>) -> Self {
        Self {
            medium,
            key: key.into(),
            workouts: Vec::new(),
        }
    }

    /// Reads the persisted snapshot without touching the in-memory list.
    pub fn read(&self) -> Result<Option<Vec<Workout>>, PersistenceReadError> {
        let raw = self
            .medium
            .get(&self.key)
            .map_err(|source| PersistenceReadError::Io {
                key: self.key.clone(),
                source,
            })?;

        raw.map(|raw| decode(&self.key, &raw)).transpose()
    }

    /// Replaces the in-memory list with the persisted one. Absent or
    /// unreadable data loads as empty.
    pub fn load(&mut self) -> &[Workout] {
        self.workouts = match self.read() {
            Ok(Some(workouts)) => {
                tracing::info!(key = %self.key, count = workouts.len(), "loaded workouts");
                workouts
            }
            Ok(None) => {
                dlog!("no stored workouts under key={}", self.key);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(err = %e, "ignoring unreadable stored workouts");
                Vec::new()
            }
        };
        &self.workouts
    }

    /// Overwrites the persisted snapshot with the current list.
    pub fn save(&mut self) -> StoreResult<()> {
        let raw = encode(&self.workouts)?;
        self.medium
            .set(&self.key, &raw)
            .map_err(|source| StoreError::Io {
                key: self.key.clone(),
                source,
            })?;
        dlog!("saved key={} count={}", self.key, self.workouts.len());
        Ok(())
    }

    /// Deletes the persisted entry and empties the in-memory list.
    pub fn reset(&mut self) -> StoreResult<()> {
        self.medium
            .remove(&self.key)
            .map_err(|source| StoreError::Io {
                key: self.key.clone(),
                source,
            })?;
        self.workouts.clear();
        tracing::info!(key = %self.key, "workouts reset");
        Ok(())
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn medium(&self) -> &K {
        &self.medium
    }

    pub fn position(&self, id: &WorkoutId) -> Option<usize> {
        self.workouts.iter().position(|w| w.id() == id)
    }

    pub fn find_by_id(&self, id: &WorkoutId) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    pub fn append(&mut self, workout: Workout) -> StoreResult<()> {
        if self.position(workout.id()).is_some() {
            return Err(StoreError::AlreadyExists(workout.id().to_string()));
        }
        self.workouts.push(workout);
        Ok(())
    }

    /// Swaps the entry with `id` for `workout` in place, returning the old one.
    pub fn replace(&mut self, id: &WorkoutId, workout: Workout) -> StoreResult<Workout> {
        let idx = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if workout.id() != id && self.position(workout.id()).is_some() {
            return Err(StoreError::AlreadyExists(workout.id().to_string()));
        }
        Ok(std::mem::replace(&mut self.workouts[idx], workout))
    }

    /// Removes the entry with `id`, returning where it was.
    pub fn remove(&mut self, id: &WorkoutId) -> Option<(usize, Workout)> {
        let idx = self.position(id)?;
        Some((idx, self.workouts.remove(idx)))
    }

    /// Puts a removed entry back at its old index.
    pub fn restore(&mut self, idx: usize, workout: Workout) {
        let idx = idx.min(self.workouts.len());
        self.workouts.insert(idx, workout);
    }

    /// An id for a workout created at `at` that no current entry uses.
    pub fn mint_id(&self, at: DateTime<Utc>) -> WorkoutId {
        let mut id = WorkoutId::from_timestamp(at);
        for _ in 0..=self.workouts.len() {
            if self.position(&id).is_none() {
                break;
            }
            match id.successor() {
                Some(next) => id = next,
                None => break,
            }
        }
        id
    }
}
