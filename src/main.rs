#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

use anyhow::{Result, bail};
use clap::Parser;
use mapty::cli::{self, AddCmd, Cmd};
use mapty::config::Config;
use mapty::controller::{App, FormInput, FormSurface, ListAction, Outcome, UiEvent};
use mapty::store::FileMedium;
use mapty::terminal::{FixedPosition, StderrNotifier, TerminalForm, TerminalList, TerminalMap};
use mapty::types::{Coords, WorkoutDetail, WorkoutId, WorkoutKind};
use mapty::utils;

#[macro_use]
extern crate mapty;

type TerminalApp = App<FileMedium, TerminalMap, TerminalForm, TerminalList, StderrNotifier>;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let config = Config::from_cli(&cli)?;
    dlog!(
        "data_dir={} home={:?} zoom={}",
        config.data_dir.display(),
        config.home,
        config.zoom
    );

    let mut app = App::new(
        config.open_store(),
        TerminalMap::new(),
        TerminalForm::new(),
        TerminalList::new(),
        StderrNotifier::new(),
    )
    .with_zoom(config.zoom);
    app.boot(&mut FixedPosition(config.home));

    match cli.cmd {
        Cmd::Add { workout } => add(&mut app, workout),
        Cmd::List { html } => {
            list(&app, html);
            Ok(())
        }
        Cmd::Edit {
            id,
            kind,
            distance,
            duration,
            cadence,
            elevation,
        } => {
            let id = WorkoutId::from(id);
            check(
                &id,
                app.handle(UiEvent::List {
                    id: id.clone(),
                    action: ListAction::Edit,
                }),
            )?;

            let mut input = app.form().read();
            if let Some(kind) = kind {
                input.kind = kind.into();
            }
            for (field, value) in [
                (&mut input.distance, distance),
                (&mut input.duration, duration),
                (&mut input.cadence, cadence),
                (&mut input.elevation, elevation),
            ] {
                if let Some(value) = value {
                    *field = value;
                }
            }
            submit(&mut app, &input)?;
            println!("{id}");
            Ok(())
        }
        Cmd::Delete { id } => {
            let id = WorkoutId::from(id);
            check(
                &id,
                app.handle(UiEvent::List {
                    id: id.clone(),
                    action: ListAction::Delete,
                }),
            )
        }
        Cmd::Show { id } => {
            let id = WorkoutId::from(id);
            if !app.is_map_ready() {
                bail!("Map is unavailable; set --home or MAPTY_HOME");
            }
            check(
                &id,
                app.handle(UiEvent::List {
                    id: id.clone(),
                    action: ListAction::Select,
                }),
            )?;
            if let Some(view) = app.map().view() {
                println!("{}\t{}\tzoom={}", id, view.center, view.zoom);
            }
            Ok(())
        }
        Cmd::Reset => match app.handle(UiEvent::Reset) {
            Outcome::Done => Ok(()),
            other => bail!("Reset failed: {other:?}"),
        },
    }
}

fn add(app: &mut TerminalApp, workout: AddCmd) -> Result<()> {
    let (at, input) = match workout {
        AddCmd::Running {
            at,
            distance,
            duration,
            cadence,
        } => (
            at,
            FormInput {
                kind: WorkoutKind::Running,
                distance,
                duration,
                cadence,
                ..FormInput::default()
            },
        ),
        AddCmd::Cycling {
            at,
            distance,
            duration,
            elevation,
        } => (
            at,
            FormInput {
                kind: WorkoutKind::Cycling,
                distance,
                duration,
                elevation,
                ..FormInput::default()
            },
        ),
    };

    click(app, at)?;
    submit(app, &input)?;
    if let Some(w) = app.store().workouts().last() {
        println!("{}\t{}", w.id(), w.description());
    }
    Ok(())
}

fn click(app: &mut TerminalApp, at: Coords) -> Result<()> {
    if app.handle(UiEvent::MapClicked(at)) == Outcome::Done {
        Ok(())
    } else {
        bail!("Map is unavailable; set --home or MAPTY_HOME to add workouts")
    }
}

fn submit(app: &mut TerminalApp, input: &FormInput) -> Result<()> {
    app.form_mut().fill(input);
    app.handle(UiEvent::TypeChanged);
    match app.handle(UiEvent::FormSubmitted) {
        Outcome::Done => Ok(()),
        Outcome::Invalid(e) => bail!("Workout not saved: {e}"),
        other => bail!("Workout not saved: {other:?}"),
    }
}

fn check(id: &WorkoutId, outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Done => Ok(()),
        Outcome::NotFound(_) => bail!("No workout with id {id}"),
        other => bail!("Could not apply action to {id}: {other:?}"),
    }
}

fn list(app: &TerminalApp, html: bool) {
    if html {
        print!("{}", app.list().html());
        return;
    }

    for w in app.store().workouts() {
        let metrics = match *w.detail() {
            WorkoutDetail::Running {
                cadence,
                pace_min_per_km,
            } => format!(
                "{cadence} spm\t{} min/km",
                utils::format_metric(pace_min_per_km)
            ),
            WorkoutDetail::Cycling {
                elevation_gain_m,
                speed_km_per_h,
            } => format!(
                "{elevation_gain_m} m\t{} km/h",
                utils::format_metric(speed_km_per_h)
            ),
        };
        println!(
            "{}\t{}\t{} km\t{} min\t{metrics}",
            w.id(),
            w.description(),
            w.distance_km(),
            w.duration_min()
        );
    }
}
