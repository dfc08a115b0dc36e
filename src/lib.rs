mod astar;
mod error;
mod grid;
mod instance;
mod parser;
mod planner;
mod reservations;
mod schedule;

use std::{fmt::Display, path::Path, time::Duration};

use miette::{Result, miette};
use termion::{
    color::{Fg, Rgb},
    cursor,
    style::Reset,
};

pub use crate::{
    error::PlanError,
    grid::{Move, SpacePoint, SpaceTimePoint, manhattan},
    instance::{Delivery, Instance},
    schedule::{Schedule, decode, encode},
};

pub type Time = i32;

/// Top level entry point: a parsed warehouse instance ready for planning
#[derive(Debug)]
pub struct Porter {
    instance: Instance,
}

impl Porter {
    pub fn parse<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref().display().to_string();
        let content = std::fs::read_to_string(&file).map_err(|e| miette!("{file}: {e}"))?;
        let instance = parser::parse(&file, &content)?;
        Ok(Self { instance })
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Plan every delivery in input order, then level all trajectories out
    /// to a common horizon
    pub fn solve(&self, seed: u64, detour_factor: i32) -> std::result::Result<Schedule, PlanError> {
        planner::Planner::new(&self.instance, detour_factor).solve(seed)
    }

    /// Animate a solved schedule in the terminal
    pub fn replay(&self, schedule: &Schedule, fps: f32) {
        let dt = Duration::from_secs_f32(1. / fps);
        let mut frame = Frame::new(&self.instance, schedule);
        print!("{}", cursor::Hide);
        for _ in 0..=schedule.duration() {
            print!(
                "{frame}{}{}",
                cursor::Left(self.instance.width as u16 + 2),
                cursor::Up(self.instance.height as u16 + 2)
            );
            frame.advance();
            std::thread::sleep(dt);
        }
        print!("{frame}{}", cursor::Show);
    }
}

/// Parse, plan, write. Planning failures are part of the protocol: they are
/// printed to stdout and the run still counts as successful.
pub fn run(input: &Path, output: &Path, seed: u64, detour_factor: i32, fps: f32) -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().context_lines(10).build())
    }))?;

    let porter = Porter::parse(input)?;
    let schedule = match porter.solve(seed, detour_factor) {
        Ok(schedule) => schedule,
        Err(failure) => {
            println!("{failure}");
            return Ok(());
        }
    };
    schedule
        .write(output)
        .map_err(|e| miette!("{}: {e}", output.display()))?;

    if fps > 0. {
        porter.replay(&schedule, fps);
    }
    Ok(())
}

/// One rendered tick of a solved schedule
struct Frame<'a> {
    instance: &'a Instance,
    tracks: Vec<(u8, Vec<SpacePoint>)>,
    tick: usize,
}

impl<'a> Frame<'a> {
    fn new(instance: &'a Instance, schedule: &Schedule) -> Self {
        let tracks = instance
            .robots
            .iter()
            .map(|&(id, home)| (id, decode(home, schedule.moves_of(id).unwrap_or_default())))
            .collect();
        Self {
            instance,
            tracks,
            tick: 0,
        }
    }

    fn advance(&mut self) {
        self.tick += 1;
    }

    fn robot_at(&self, v: SpacePoint) -> Option<u8> {
        self.tracks
            .iter()
            .find(|(_, track)| track.get(self.tick.min(track.len() - 1)) == Some(&v))
            .map(|(id, _)| *id)
    }
}

impl Display for Frame<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "╭")?;
        for _ in 0..self.instance.width {
            write!(f, "─")?;
        }
        writeln!(f, "╮")?;
        for y in 0..self.instance.height {
            write!(f, "│")?;
            for x in 0..self.instance.width {
                let v = SpacePoint::new(x, y);
                if let Some(id) = self.robot_at(v) {
                    write!(f, "{}{id}{Reset}", Fg(color(id)))?;
                } else if let Some((letter, _)) =
                    self.instance.shelves.iter().find(|(_, p)| **p == v)
                {
                    write!(f, "{letter}")?;
                } else if self.instance.chargers.contains(&v) {
                    write!(f, "_")?;
                } else {
                    write!(f, " ")?;
                }
            }
            writeln!(f, "│")?;
        }
        write!(f, "╰")?;
        for _ in 0..self.instance.width {
            write!(f, "─")?;
        }
        writeln!(f, "╯")?;
        Ok(())
    }
}

fn color(id: u8) -> Rgb {
    match id % 5 {
        0 => Rgb(0, 128, 255),
        1 => Rgb(255, 0, 0),
        2 => Rgb(0, 255, 0),
        3 => Rgb(255, 255, 0),
        _ => Rgb(255, 0, 255),
    }
}
