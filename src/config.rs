use anyhow::{Result, bail};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::store::{DEFAULT_KEY, FileMedium, WorkoutStore};
use crate::types::Coords;

/// Highest zoom the tile server serves.
pub const MAX_ZOOM: u8 = 19;

/// Settings for one session, resolved from flags and environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub home: Option<Coords>,
    pub zoom: u8,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        if cli.zoom > MAX_ZOOM {
            bail!("zoom must be between 0 and {MAX_ZOOM}, got {}", cli.zoom);
        }

        Ok(Self {
            data_dir: cli.data_dir.clone(),
            storage_key: DEFAULT_KEY.to_string(),
            home: cli.home,
            zoom: cli.zoom,
        })
    }

    pub fn open_store(&self) -> WorkoutStore<FileMedium> {
        WorkoutStore::with_key(FileMedium::new(&self.data_dir), &self.storage_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["mapty"];
        argv.extend_from_slice(args);
        argv.push("list");
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_resolve_into_config() {
        let cfg = Config::from_cli(&parse(&["--data-dir", "/tmp/x", "--zoom", "10"])).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/x"));
        assert_eq!(cfg.storage_key, "workouts");
        assert_eq!(cfg.zoom, 10);
    }

    #[test]
    fn zoom_out_of_range_is_rejected() {
        assert!(Config::from_cli(&parse(&["--zoom", "25"])).is_err());
    }

    #[test]
    fn store_lives_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            data_dir: dir.path().to_path_buf(),
            storage_key: "workouts".into(),
            home: None,
            zoom: 13,
        };
        let mut store = cfg.open_store();
        store.save().unwrap();
        assert!(dir.path().join("workouts.json").is_file());
    }
}
