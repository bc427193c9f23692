//! Log running and cycling workouts against map coordinates.
//!
//! The map, the form, the list and the position lookup are collaborators
//! behind traits in [`controller`] and [`render`]; [`terminal`] provides the
//! implementations the command-line host uses.

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod render;
pub mod store;
pub mod terminal;
pub mod types;
pub mod utils;
