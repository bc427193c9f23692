use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Field, ValidationError};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Number of trailing decimal digits of the creation millis kept in an id.
const ID_DIGITS: u32 = 10;
const ID_MODULUS: u64 = 10_u64.pow(ID_DIGITS);

/// A `[lat, lng]` pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl FromStr for Coords {
    type Err = String;

    /// Parses `LAT,LNG`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("expected LAT,LNG, got {s:?}"))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| format!("bad latitude {lat:?}"))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| format!("bad longitude {lng:?}"))?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(format!("coordinates out of range: {lat},{lng}"));
        }
        Ok(Self { lat, lng })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    /// Capitalized name used in descriptions.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Running => "🏃",
            Self::Cycling => "🚴",
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            other => Err(format!("unknown workout type {other:?}")),
        }
    }
}

/// Timestamp-derived workout token: the last ten digits of the creation
/// time in Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        let millis = at.timestamp_millis().unsigned_abs();
        Self::from_token(millis % ID_MODULUS)
    }

    fn from_token(token: u64) -> Self {
        Self(format!("{token:010}"))
    }

    /// The next token after this one, wrapping within ten digits.
    /// `None` for ids that did not come from [`WorkoutId::from_timestamp`].
    pub fn successor(&self) -> Option<Self> {
        let token: u64 = self.0.parse().ok()?;
        Some(Self::from_token((token + 1) % ID_MODULUS))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkoutId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorkoutId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw user input for one workout, before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutInput {
    Running {
        distance_km: f64,
        duration_min: f64,
        cadence: f64,
    },
    Cycling {
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    },
}

impl WorkoutInput {
    pub const fn kind(&self) -> WorkoutKind {
        match self {
            Self::Running { .. } => WorkoutKind::Running,
            Self::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

/// Kind-specific inputs and the metric derived from them at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutDetail {
    Running { cadence: u32, pace_min_per_km: f64 },
    Cycling { elevation_gain_m: f64, speed_km_per_h: f64 },
}

/// A logged workout. Every field is fixed at construction; editing builds a
/// replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: WorkoutId,
    created_at: DateTime<Utc>,
    coords: Coords,
    distance_km: f64,
    duration_min: f64,
    description: String,
    detail: WorkoutDetail,
}

impl Workout {
    /// Validates `input` and computes pace/speed and the description.
    ///
    /// The description uses the local calendar date of `created_at`.
    pub fn build(
        id: WorkoutId,
        created_at: DateTime<Local>,
        coords: Coords,
        input: WorkoutInput,
    ) -> Result<Self, ValidationError> {
        let (distance_km, duration_min, detail) = match input {
            WorkoutInput::Running {
                distance_km,
                duration_min,
                cadence,
            } => {
                let distance_km = positive(Field::Distance, distance_km)?;
                let duration_min = positive(Field::Duration, duration_min)?;
                let cadence = whole(Field::Cadence, positive(Field::Cadence, cadence)?)?;
                let pace = duration_min / distance_km;
                let detail = WorkoutDetail::Running {
                    cadence,
                    pace_min_per_km: derived(Field::Distance, distance_km, pace)?,
                };
                (distance_km, duration_min, detail)
            }
            WorkoutInput::Cycling {
                distance_km,
                duration_min,
                elevation_gain_m,
            } => {
                let distance_km = positive(Field::Distance, distance_km)?;
                let duration_min = positive(Field::Duration, duration_min)?;
                let elevation_gain_m = positive(Field::ElevationGain, elevation_gain_m)?;
                let hours = derived(Field::Duration, duration_min, duration_min / 60.0)?;
                let detail = WorkoutDetail::Cycling {
                    elevation_gain_m,
                    speed_km_per_h: derived(Field::Distance, distance_km, distance_km / hours)?,
                };
                (distance_km, duration_min, detail)
            }
        };

        Ok(Self {
            id,
            created_at: created_at.with_timezone(&Utc),
            coords,
            distance_km,
            duration_min,
            description: describe(input.kind(), &created_at),
            detail,
        })
    }

    /// Reassembles a workout from previously persisted values, keeping the
    /// stored derived fields as they are.
    pub(crate) const fn from_parts(
        id: WorkoutId,
        created_at: DateTime<Utc>,
        coords: Coords,
        distance_km: f64,
        duration_min: f64,
        description: String,
        detail: WorkoutDetail,
    ) -> Self {
        Self {
            id,
            created_at,
            coords,
            distance_km,
            duration_min,
            description,
            detail,
        }
    }

    pub const fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn coords(&self) -> Coords {
        self.coords
    }

    pub const fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub const fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn detail(&self) -> &WorkoutDetail {
        &self.detail
    }

    pub const fn kind(&self) -> WorkoutKind {
        match self.detail {
            WorkoutDetail::Running { .. } => WorkoutKind::Running,
            WorkoutDetail::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    /// min/km, running only.
    pub const fn pace(&self) -> Option<f64> {
        match self.detail {
            WorkoutDetail::Running {
                pace_min_per_km, ..
            } => Some(pace_min_per_km),
            WorkoutDetail::Cycling { .. } => None,
        }
    }

    /// km/h, cycling only.
    pub const fn speed(&self) -> Option<f64> {
        match self.detail {
            WorkoutDetail::Cycling { speed_km_per_h, .. } => Some(speed_km_per_h),
            WorkoutDetail::Running { .. } => None,
        }
    }

    /// The inputs this workout was built from.
    pub fn input(&self) -> WorkoutInput {
        match self.detail {
            WorkoutDetail::Running { cadence, .. } => WorkoutInput::Running {
                distance_km: self.distance_km,
                duration_min: self.duration_min,
                cadence: f64::from(cadence),
            },
            WorkoutDetail::Cycling {
                elevation_gain_m, ..
            } => WorkoutInput::Cycling {
                distance_km: self.distance_km,
                duration_min: self.duration_min,
                elevation_gain_m,
            },
        }
    }
}

/// Builds a running workout stamped with the current time.
pub fn create_running(
    coords: Coords,
    distance_km: f64,
    duration_min: f64,
    cadence: f64,
) -> Result<Workout, ValidationError> {
    let now = Local::now();
    Workout::build(
        WorkoutId::from_timestamp(now.with_timezone(&Utc)),
        now,
        coords,
        WorkoutInput::Running {
            distance_km,
            duration_min,
            cadence,
        },
    )
}

/// Builds a cycling workout stamped with the current time.
pub fn create_cycling(
    coords: Coords,
    distance_km: f64,
    duration_min: f64,
    elevation_gain_m: f64,
) -> Result<Workout, ValidationError> {
    let now = Local::now();
    Workout::build(
        WorkoutId::from_timestamp(now.with_timezone(&Utc)),
        now,
        coords,
        WorkoutInput::Cycling {
            distance_km,
            duration_min,
            elevation_gain_m,
        },
    )
}

/// "Running on April 14"
pub fn describe(kind: WorkoutKind, at: &DateTime<Local>) -> String {
    format!("{} on {} {}", kind.label(), MONTHS[at.month0() as usize], at.day())
}

pub(crate) fn positive(field: Field, value: f64) -> Result<f64, ValidationError> {
    derived(field, value, value)
}

/// A quantity computed from `input` must stay finite and positive too;
/// the error blames `field` with the value the user typed.
fn derived(field: Field, input: f64, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::new(field, input))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole(field: Field, value: f64) -> Result<u32, ValidationError> {
    if value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Ok(value as u32)
    } else {
        Err(ValidationError::new(field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(month: u32, day: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, month, day, 10, 30, 0)
            .single()
            .expect("unambiguous local time")
    }

    fn run(distance_km: f64, duration_min: f64, cadence: f64) -> Result<Workout, ValidationError> {
        Workout::build(
            WorkoutId::from("0000000001"),
            at(4, 14),
            Coords::new(39.0, -12.0),
            WorkoutInput::Running {
                distance_km,
                duration_min,
                cadence,
            },
        )
    }

    fn ride(
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    ) -> Result<Workout, ValidationError> {
        Workout::build(
            WorkoutId::from("0000000002"),
            at(7, 3),
            Coords::new(39.0, -12.0),
            WorkoutInput::Cycling {
                distance_km,
                duration_min,
                elevation_gain_m,
            },
        )
    }

    #[test]
    fn running_pace_is_duration_over_distance() {
        let w = run(5.3, 24.0, 178.0).unwrap();
        assert_eq!(w.kind(), WorkoutKind::Running);
        assert!((w.pace().unwrap() - 24.0 / 5.3).abs() < 1e-12);
        assert!((w.pace().unwrap() - 4.528).abs() < 1e-3);
        assert_eq!(w.speed(), None);
        assert_eq!(w.description(), "Running on April 14");
        assert!(matches!(
            w.detail(),
            WorkoutDetail::Running { cadence: 178, .. }
        ));
    }

    #[test]
    fn cycling_speed_is_km_per_hour() {
        let w = ride(25.0, 95.0, 163.0).unwrap();
        assert_eq!(w.kind(), WorkoutKind::Cycling);
        assert!((w.speed().unwrap() - 25.0 / (95.0 / 60.0)).abs() < 1e-12);
        assert!((w.speed().unwrap() - 15.789).abs() < 1e-3);
        assert_eq!(w.pace(), None);
        assert_eq!(w.description(), "Cycling on July 3");
    }

    #[test]
    fn rejects_non_positive_and_non_finite_inputs() {
        let err = run(-1.0, 24.0, 178.0).unwrap_err();
        assert_eq!(err.field, Field::Distance);

        assert_eq!(run(5.0, 0.0, 178.0).unwrap_err().field, Field::Duration);
        assert_eq!(run(5.0, 20.0, f64::NAN).unwrap_err().field, Field::Cadence);
        assert_eq!(
            run(f64::INFINITY, 20.0, 170.0).unwrap_err().field,
            Field::Distance
        );
        assert_eq!(
            ride(10.0, 30.0, -5.0).unwrap_err().field,
            Field::ElevationGain
        );
        assert_eq!(
            ride(10.0, f64::NEG_INFINITY, 5.0).unwrap_err().field,
            Field::Duration
        );
    }

    #[test]
    fn rejects_inputs_whose_metric_overflows() {
        let err = run(1e-320, 30.0, 170.0).unwrap_err();
        assert_eq!(err.field, Field::Distance);
        assert_eq!(err.value, 1e-320);

        assert_eq!(ride(10.0, 5e-324, 5.0).unwrap_err().field, Field::Duration);
        assert_eq!(ride(1e308, 1e-3, 5.0).unwrap_err().field, Field::Distance);
        assert_eq!(run(1e308, 1e-320, 170.0).unwrap_err().field, Field::Distance);
    }

    #[test]
    fn cadence_must_be_whole() {
        assert_eq!(run(5.0, 20.0, 170.5).unwrap_err().field, Field::Cadence);
    }

    #[test]
    fn input_round_trips_through_workout() {
        let w = ride(25.0, 95.0, 163.0).unwrap();
        assert_eq!(
            w.input(),
            WorkoutInput::Cycling {
                distance_km: 25.0,
                duration_min: 95.0,
                elevation_gain_m: 163.0
            }
        );
    }

    #[test]
    fn id_keeps_last_ten_digits_of_millis() {
        let ts = Utc.timestamp_millis_opt(1_713_090_600_123).unwrap();
        assert_eq!(WorkoutId::from_timestamp(ts).as_str(), "3090600123");

        let small = Utc.timestamp_millis_opt(42).unwrap();
        assert_eq!(WorkoutId::from_timestamp(small).as_str(), "0000000042");
    }

    #[test]
    fn id_successor_wraps() {
        assert_eq!(
            WorkoutId::from("0000000041").successor(),
            Some(WorkoutId::from("0000000042"))
        );
        assert_eq!(
            WorkoutId::from("9999999999").successor(),
            Some(WorkoutId::from("0000000000"))
        );
        assert_eq!(WorkoutId::from("abc").successor(), None);
    }

    #[test]
    fn coords_parse_lat_lng() {
        assert_eq!("39.5, -12".parse::<Coords>(), Ok(Coords::new(39.5, -12.0)));
        assert!("39.5".parse::<Coords>().is_err());
        assert!("91,0".parse::<Coords>().is_err());
    }

    #[test]
    fn create_helpers_stamp_now() {
        let w = create_running(Coords::new(1.0, 2.0), 5.0, 25.0, 160.0).unwrap();
        assert_eq!(w.id().as_str().len(), 10);
        assert!(w.description().starts_with("Running on "));
        assert!(create_cycling(Coords::new(1.0, 2.0), 0.0, 25.0, 10.0).is_err());
    }
}
