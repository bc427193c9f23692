use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::controller::DEFAULT_ZOOM;
use crate::types::{Coords, WorkoutKind};

pub const DEFAULT_DATA_DIR: &str = ".mapty";

#[derive(Parser, Debug)]
#[command(
    name = "mapty",
    about = "Log running and cycling workouts against map coordinates"
)]
pub struct Cli {
    /// Directory holding the stored workouts.
    #[arg(long, env = "MAPTY_DATA_DIR", default_value = DEFAULT_DATA_DIR, global = true)]
    pub data_dir: PathBuf,

    /// Position reported by the geolocation lookup. Without it the map stays
    /// unavailable: workouts can be listed, edited and deleted, not added.
    #[arg(
        long,
        env = "MAPTY_HOME",
        value_name = "LAT,LNG",
        allow_hyphen_values = true,
        global = true
    )]
    pub home: Option<Coords>,

    /// Map zoom level.
    #[arg(long, default_value_t = DEFAULT_ZOOM, global = true)]
    pub zoom: u8,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Click the map at a position and submit a new workout there.
    Add {
        #[command(subcommand)]
        workout: AddCmd,
    },

    /// Print the stored workouts, oldest first.
    List {
        /// Print the rendered list markup instead of one line per workout.
        #[arg(long)]
        html: bool,
    },

    /// Edit a workout. Fields not given keep their current values.
    Edit {
        id: String,

        #[arg(long = "type", value_enum)]
        kind: Option<KindArg>,

        #[arg(long, allow_hyphen_values = true)]
        distance: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        duration: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        cadence: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        elevation: Option<String>,
    },

    /// Delete a workout.
    Delete { id: String },

    /// Center the map on a workout.
    Show { id: String },

    /// Delete every stored workout.
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum AddCmd {
    Running {
        /// Clicked map position.
        #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
        at: Coords,

        /// Distance in km.
        #[arg(long, allow_hyphen_values = true)]
        distance: String,

        /// Duration in minutes.
        #[arg(long, allow_hyphen_values = true)]
        duration: String,

        /// Steps per minute.
        #[arg(long, allow_hyphen_values = true)]
        cadence: String,
    },
    Cycling {
        /// Clicked map position.
        #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
        at: Coords,

        /// Distance in km.
        #[arg(long, allow_hyphen_values = true)]
        distance: String,

        /// Duration in minutes.
        #[arg(long, allow_hyphen_values = true)]
        duration: String,

        /// Elevation gain in meters.
        #[arg(long, allow_hyphen_values = true)]
        elevation: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Running,
    Cycling,
}

impl From<KindArg> for WorkoutKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Running => Self::Running,
            KindArg::Cycling => Self::Cycling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_negative_longitude() {
        let cli = Cli::try_parse_from([
            "mapty", "add", "running", "--at", "39,-12", "--distance", "5.3", "--duration",
            "24", "--cadence", "178",
        ])
        .unwrap();

        let Cmd::Add {
            workout: AddCmd::Running { at, distance, .. },
        } = cli.cmd
        else {
            panic!("expected add running");
        };
        assert_eq!(at, Coords::new(39.0, -12.0));
        assert_eq!(distance, "5.3");
        assert_eq!(cli.zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn parses_edit_overrides() {
        let cli = Cli::try_parse_from([
            "mapty", "edit", "0000000001", "--type", "cycling", "--elevation", "120", "--home",
            "1.5,2.5",
        ])
        .unwrap();

        assert_eq!(cli.home, Some(Coords::new(1.5, 2.5)));
        let Cmd::Edit {
            id,
            kind,
            elevation,
            distance,
            ..
        } = cli.cmd
        else {
            panic!("expected edit");
        };
        assert_eq!(id, "0000000001");
        assert_eq!(kind, Some(KindArg::Cycling));
        assert_eq!(elevation.as_deref(), Some("120"));
        assert_eq!(distance, None);
    }

    #[test]
    fn rejects_bad_coordinates() {
        assert!(
            Cli::try_parse_from([
                "mapty", "add", "cycling", "--at", "nowhere", "--distance", "1", "--duration",
                "1", "--elevation", "1",
            ])
            .is_err()
        );
    }
}
