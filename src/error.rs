use std::fmt;

use thiserror::Error;

/// Numeric inputs checked when a workout is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Distance,
    Duration,
    Cadence,
    ElevationGain,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Distance => "distance",
            Self::Duration => "duration",
            Self::Cadence => "cadence",
            Self::ElevationGain => "elevation gain",
        };
        f.write_str(name)
    }
}

/// A workout input was non-finite, not positive, or (cadence) fractional.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("{field} must be a positive number (got {value})")]
pub struct ValidationError {
    pub field: Field,
    pub value: f64,
}

impl ValidationError {
    pub const fn new(field: Field, value: f64) -> Self {
        Self { field, value }
    }
}

/// The one-shot position lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not get your position: {reason}")]
pub struct GeolocationUnavailable {
    pub reason: String,
}

impl GeolocationUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Reading the persisted workouts failed. Never surfaced to the user:
/// the store treats it as "no prior data".
#[derive(Debug, Error)]
pub enum PersistenceReadError {
    #[error("reading storage entry {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("decoding storage entry {key:?}: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from writing to the persistence medium or addressing a workout.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("workout not found: {0}")]
    NotFound(String),

    #[error("workout already exists: {0}")]
    AlreadyExists(String),

    #[error("encoding workouts: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("writing storage entry {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
