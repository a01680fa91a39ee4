//! Motion programs
//!
//! A [`MotionProgram`] is the ordered list of pen-plotter commands produced by
//! the planner. It renders to G-code text with two decimal places for every
//! coordinate.

use penplot_core::{MeasurementSystem, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One plotter command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionCommand {
    /// `G21` / `G20`
    Units(MeasurementSystem),
    /// `G90`
    AbsolutePositioning,
    /// Lift the pen to `z`
    PenUp { z: f64 },
    /// Lower the pen to `z`
    PenDown { z: f64 },
    /// Rapid move with the pen lifted
    Travel { to: Point, feed: f64 },
    /// Linear move with the pen lowered
    Draw { to: Point, feed: f64 },
    /// `G28`
    Home,
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Units(units) => {
                write!(f, "{} ; Set units to {}", units.directive(), units.label())
            }
            Self::AbsolutePositioning => write!(f, "G90 ; Absolute positioning"),
            Self::PenUp { z } => write!(f, "G0 Z{:.2} ; Pen up", z),
            Self::PenDown { z } => write!(f, "G1 Z{:.2} ; Pen down", z),
            Self::Travel { to, feed } => {
                write!(f, "G0 X{:.2} Y{:.2} F{:.0}", coord(to.x), coord(to.y), feed)
            }
            Self::Draw { to, feed } => {
                write!(f, "G1 X{:.2} Y{:.2} F{:.0}", coord(to.x), coord(to.y), feed)
            }
            Self::Home => write!(f, "G28 ; Home"),
        }
    }
}

/// Round to two decimals, folding `-0.00` into `0.00`
fn coord(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Summary figures for a motion program
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgramStatistics {
    /// Number of pen-down strokes
    pub path_count: usize,
    /// Pen-down distance in program units
    pub draw_distance: f64,
    /// Pen-up distance in program units, measured from the machine origin
    pub travel_distance: f64,
    /// Time at the programmed feed rates
    pub estimated_seconds: f64,
}

/// Ordered plotter commands plus the feed rates they were planned with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionProgram {
    units: MeasurementSystem,
    draw_feed: f64,
    travel_feed: f64,
    commands: Vec<MotionCommand>,
}

impl MotionProgram {
    pub(crate) fn new(units: MeasurementSystem, draw_feed: f64, travel_feed: f64) -> Self {
        Self {
            units,
            draw_feed,
            travel_feed,
            commands: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, command: MotionCommand) {
        self.commands.push(command);
    }

    pub fn units(&self) -> MeasurementSystem {
        self.units
    }

    pub fn draw_feed(&self) -> f64 {
        self.draw_feed
    }

    pub fn travel_feed(&self) -> f64 {
        self.travel_feed
    }

    pub fn commands(&self) -> &[MotionCommand] {
        &self.commands
    }

    /// Number of pen-down linear moves
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, MotionCommand::Draw { .. }))
            .count()
    }

    /// Number of pen-up positioning moves
    pub fn travel_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, MotionCommand::Travel { .. }))
            .count()
    }

    /// G-code text, one command per line
    pub fn render(&self) -> String {
        let mut gcode = String::new();
        for command in &self.commands {
            gcode.push_str(&command.to_string());
            gcode.push('\n');
        }
        gcode
    }

    /// G-code text preceded by a comment header
    pub fn render_annotated(&self) -> String {
        let stats = self.statistics();
        let unit = self.units.label();
        let mut gcode = String::new();

        gcode.push_str("; penplot motion program\n");
        gcode.push_str(&format!(
            "; Generated: {}\n",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));
        gcode.push_str(&format!("; Units: {}\n", unit));
        gcode.push_str(&format!("; Draw feed: {:.0} {}/min\n", self.draw_feed, unit));
        gcode.push_str(&format!("; Travel feed: {:.0} {}/min\n", self.travel_feed, unit));
        gcode.push_str(&format!("; Number of paths: {}\n", stats.path_count));
        gcode.push_str(&format!("; Draw distance: {:.2} {}\n", stats.draw_distance, unit));
        gcode.push_str(&format!("; Travel distance: {:.2} {}\n", stats.travel_distance, unit));
        gcode.push_str(&format!(
            "; Estimated time: {:.1} seconds\n",
            stats.estimated_seconds
        ));
        gcode.push_str(";\n");
        gcode.push_str(&self.render());
        gcode
    }

    /// Distances and time estimate
    pub fn statistics(&self) -> ProgramStatistics {
        let mut stats = ProgramStatistics::default();
        let mut pos = Point::ORIGIN;

        for command in &self.commands {
            match *command {
                MotionCommand::Travel { to, .. } => {
                    stats.travel_distance += pos.distance(to);
                    pos = to;
                }
                MotionCommand::Draw { to, .. } => {
                    stats.draw_distance += pos.distance(to);
                    pos = to;
                }
                MotionCommand::PenDown { .. } => stats.path_count += 1,
                _ => {}
            }
        }

        if self.draw_feed > 0.0 {
            stats.estimated_seconds += stats.draw_distance / self.draw_feed * 60.0;
        }
        if self.travel_feed > 0.0 {
            stats.estimated_seconds += stats.travel_distance / self.travel_feed * 60.0;
        }
        stats
    }
}

impl fmt::Display for MotionProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
