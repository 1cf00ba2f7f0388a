use std::{io::Write, time::Duration};

use anyhow::{bail, ensure, Context, Result};
use shape_grid_core::{Command, Event, InstanceId, PlacementReason, Position, ValidationResult};
use shape_grid_occupancy::OccupancyGrid;
use shape_grid_session::{apply, PlacementSession};
use shape_grid_system_spawner::{SpawnOutcome, Spawner};
use tracing::debug;

use crate::{board, config::EditorConfig, layout_transfer::LayoutSnapshot};

/// One line of an editor script.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ScriptCommand {
    /// Spawns a catalog shape at the first free origin.
    Add(String),
    /// Drags the n-th listed shape to a cell.
    Drag { index: usize, target: Position },
    /// Drags the n-th listed shape to a pixel coordinate.
    DropPx { index: usize, x: f32, y: f32 },
    /// Removes the n-th listed shape.
    Remove(usize),
    /// Clears the grid and the shape list.
    Reset,
    /// Prints the session as a layout string.
    Export,
    /// Replaces the session with an exported layout string.
    Import(String),
    /// Prints the board and the shape list.
    Show,
}

impl ScriptCommand {
    /// Parses a script line. Blank lines and `#` comments yield `None`.
    pub(crate) fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let arguments: Vec<&str> = words.collect();
        let expect_arguments = |count: usize| -> Result<()> {
            ensure!(
                arguments.len() == count,
                "`{verb}` takes {count} argument(s), got {}",
                arguments.len()
            );
            Ok(())
        };

        let command = match verb {
            "add" => {
                expect_arguments(1)?;
                Self::Add(arguments[0].to_owned())
            }
            "drag" => {
                expect_arguments(3)?;
                Self::Drag {
                    index: parse_index(arguments[0])?,
                    target: Position::new(
                        parse_number(arguments[1], "row")?,
                        parse_number(arguments[2], "column")?,
                    ),
                }
            }
            "drop-px" => {
                expect_arguments(3)?;
                Self::DropPx {
                    index: parse_index(arguments[0])?,
                    x: parse_number(arguments[1], "x")?,
                    y: parse_number(arguments[2], "y")?,
                }
            }
            "remove" => {
                expect_arguments(1)?;
                Self::Remove(parse_index(arguments[0])?)
            }
            "reset" => {
                expect_arguments(0)?;
                Self::Reset
            }
            "export" => {
                expect_arguments(0)?;
                Self::Export
            }
            "import" => {
                expect_arguments(1)?;
                Self::Import(arguments[0].to_owned())
            }
            "show" => {
                expect_arguments(0)?;
                Self::Show
            }
            other => bail!("unknown command `{other}`"),
        };
        Ok(Some(command))
    }
}

fn parse_index(value: &str) -> Result<usize> {
    let index: usize = parse_number(value, "shape number")?;
    ensure!(index > 0, "shape numbers start at 1");
    Ok(index)
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .parse()
        .ok()
        .with_context(|| format!("`{value}` is not a valid {what}"))
}

/// Drives a placement session from script commands and reports every step.
pub(crate) struct ScriptRunner<'a, C> {
    config: &'a EditorConfig,
    session: PlacementSession,
    spawner: Spawner,
    clock: C,
}

impl<'a, C> ScriptRunner<'a, C>
where
    C: FnMut() -> Duration,
{
    /// Creates a runner over an empty session sized by `config`.
    ///
    /// `clock` supplies creation times for new instance ids.
    pub(crate) fn new(config: &'a EditorConfig, clock: C) -> Self {
        Self {
            config,
            session: PlacementSession::new(config.rows, config.cols),
            spawner: Spawner::new(),
            clock,
        }
    }

    /// Runs every line of `script`, stopping at the first invalid line.
    pub(crate) fn run(&mut self, script: &str, out: &mut impl Write) -> Result<()> {
        for (number, line) in script.lines().enumerate() {
            let Some(command) =
                ScriptCommand::parse(line).with_context(|| format!("line {}", number + 1))?
            else {
                continue;
            };
            debug!(line = number + 1, ?command, "running script command");
            writeln!(out, "> {}", line.trim())?;
            self.execute(command, out)
                .with_context(|| format!("line {}", number + 1))?;
        }
        Ok(())
    }

    /// Executes a single command against the session.
    pub(crate) fn execute(&mut self, command: ScriptCommand, out: &mut impl Write) -> Result<()> {
        let mut events = Vec::new();
        match command {
            ScriptCommand::Add(shape) => {
                let definition = self
                    .config
                    .catalog
                    .get(&shape)
                    .with_context(|| format!("unknown shape `{shape}`"))?;
                let mut commands = Vec::new();
                let grid = self.session.grid();
                let outcome = self.spawner.handle(
                    definition,
                    grid.dimensions(),
                    (self.clock)(),
                    |matrix, origin| grid.validate_placement(matrix, origin, None),
                    &mut commands,
                );
                if outcome == SpawnOutcome::GridFull {
                    writeln!(out, "no room left for shape {shape}")?;
                }
                for command in commands {
                    apply(&mut self.session, command, &mut events);
                }
            }
            ScriptCommand::Drag { index, target } => {
                let instance = self.instance_at(index)?;
                self.drag(instance, target, &mut events, out)?;
            }
            ScriptCommand::DropPx { index, x, y } => {
                let instance = self.instance_at(index)?;
                let target = OccupancyGrid::snap_to_grid(x, y, self.config.geometry.pitch());
                writeln!(out, "pixel ({x}, {y}) snaps to {target}")?;
                self.drag(instance, target, &mut events, out)?;
            }
            ScriptCommand::Remove(index) => {
                let instance = self.instance_at(index)?;
                apply(
                    &mut self.session,
                    Command::RemoveShape { instance },
                    &mut events,
                );
            }
            ScriptCommand::Reset => apply(&mut self.session, Command::Reset, &mut events),
            ScriptCommand::Export => {
                let (rows, columns) = self.session.grid().dimensions();
                let snapshot = LayoutSnapshot {
                    columns,
                    rows,
                    state: self.session.export_state()?,
                };
                writeln!(out, "{}", snapshot.encode()?)?;
            }
            ScriptCommand::Import(layout) => {
                let snapshot = LayoutSnapshot::decode(&layout)?;
                let (rows, columns) = self.session.grid().dimensions();
                ensure!(
                    (snapshot.rows, snapshot.columns) == (rows, columns),
                    "layout is {}x{} but the grid is {columns}x{rows}",
                    snapshot.columns,
                    snapshot.rows
                );
                apply(
                    &mut self.session,
                    Command::ImportState {
                        grid: snapshot.state.grid,
                        shapes: snapshot.state.shapes,
                    },
                    &mut events,
                );
            }
            ScriptCommand::Show => {
                write!(out, "{}", board::render(&self.session, self.config.geometry))?;
            }
        }

        report(&mut events, out)
    }

    /// Session driven by the runner.
    pub(crate) fn session(&self) -> &PlacementSession {
        &self.session
    }

    fn instance_at(&self, index: usize) -> Result<InstanceId> {
        let shapes = self.session.shapes();
        shapes
            .get(index - 1)
            .map(|shape| shape.instance_id.clone())
            .with_context(|| format!("no shape number {index}; {} placed", shapes.len()))
    }

    fn drag(
        &mut self,
        instance: InstanceId,
        target: Position,
        events: &mut Vec<Event>,
        out: &mut impl Write,
    ) -> Result<()> {
        apply(
            &mut self.session,
            Command::StartDrag {
                instance: instance.clone(),
            },
            events,
        );
        report(events, out)?;
        let preview = self.session.drag_move(&instance, target);
        writeln!(out, "preview at {target}: {}", describe_validation(&preview))?;
        apply(
            &mut self.session,
            Command::EndDrag {
                instance,
                position: target,
            },
            events,
        );
        Ok(())
    }
}

fn report(events: &mut Vec<Event>, out: &mut impl Write) -> Result<()> {
    for event in events.drain(..) {
        writeln!(out, "{}", describe(&event))?;
    }
    Ok(())
}

fn describe_validation(result: &ValidationResult) -> String {
    let reason = match result.reason {
        PlacementReason::Valid => return "valid".to_owned(),
        PlacementReason::OutOfBounds => "out of bounds",
        PlacementReason::Collision => "collision",
    };
    let cells = result
        .conflicting_cells
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    format!("{reason} at {cells}")
}

fn describe(event: &Event) -> String {
    match event {
        Event::ShapeAdded { instance, position } => format!("added {instance} at {position}"),
        Event::ShapePlacementRejected {
            instance,
            position,
            reason,
        } => format!("rejected {instance} at {position}: {reason}"),
        Event::ShapeRemoved { instance } => format!("removed {instance}"),
        Event::DragStarted { instance, origin } => format!("lifted {instance} from {origin}"),
        Event::ShapeMoved {
            instance,
            position,
            overlapping,
        } => {
            if *overlapping {
                format!("moved {instance} to {position}, overlapping another shape")
            } else {
                format!("moved {instance} to {position}")
            }
        }
        Event::ShapeRepositioned {
            instance,
            requested,
            position,
        } => format!("{instance} dropped off the grid at {requested}, moved to {position}"),
        Event::ShapeDiscarded { instance, .. } => {
            format!("{instance} dropped off the grid and removed: grid full")
        }
        Event::DragReverted { instance, position } => {
            format!("{instance} returned to {position}")
        }
        Event::SessionReset => "grid cleared".to_owned(),
        Event::StateImported { shapes } => format!("imported {shapes} shape(s)"),
        Event::ImportRejected { reason } => format!("import rejected: {reason}"),
    }
}
