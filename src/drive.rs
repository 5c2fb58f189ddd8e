//! The drive/sensor capability the execution controller talks to, and a simulated
//! implementation of it.
use crate::cell::Cell;
use crate::error::{NavError, Result};
use crate::grid::OccupancyGrid;
use crate::heading::{Heading, Turn};
use log::{debug, trace, warn};

/// Pivot used for rotations in place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RotationAxis {
    #[default]
    Center,
    Left,
    Right,
}

/// A command sent to a [Drive], as recorded by [SimulatedDrive].
#[derive(Clone, Debug, PartialEq)]
pub enum DriveCommand {
    Connect,
    SetSpeed(u8),
    SetRotation(u32),
    SetRotationAxis(RotationAxis),
    RotateLeft,
    RotateRight,
    GoForward(f64),
    Stop,
    Disconnect,
}

/// Narrow interface onto the physical or simulated agent.
///
/// Motion commands ([rotate_left](Drive::rotate_left), [rotate_right](Drive::rotate_right),
/// [go_forward](Drive::go_forward)) start a motion and return; completion is observed by
/// polling [motion_finished](Drive::motion_finished). Only one motion may be in progress at
/// a time. Sensor readings are likewise fetched through
/// [poll_obstacle_sensors](Drive::poll_obstacle_sensors), so a caller can bound how long it
/// waits for either.
pub trait Drive {
    fn connect(&mut self) -> Result<()>;
    fn set_speed(&mut self, speed: u8) -> Result<()>;
    /// Magnitude in degrees of the next rotation.
    fn set_rotation(&mut self, degrees: u32) -> Result<()>;
    fn set_rotation_axis(&mut self, axis: RotationAxis) -> Result<()>;
    fn rotate_left(&mut self) -> Result<()>;
    fn rotate_right(&mut self) -> Result<()>;
    fn go_forward(&mut self, distance_mm: f64) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn motion_finished(&mut self) -> Result<bool>;
    /// Raw (left, right) obstacle sensor readings.
    fn read_obstacle_sensors(&mut self) -> Result<(u32, u32)>;
    /// A (left, right) reading, or `None` while the sensors have not answered yet.
    ///
    /// Defaults to a blocking [read_obstacle_sensors](Drive::read_obstacle_sensors).
    fn poll_obstacle_sensors(&mut self) -> Result<Option<(u32, u32)>> {
        self.read_obstacle_sensors().map(Some)
    }
    fn disconnect(&mut self) -> Result<()>;
}

/// Deterministic simulation of a differential-drive agent on a grid world.
///
/// The world grid holds the true obstacles, which the planner may not know about. The
/// obstacle sensors report `sensor_value` on both channels whenever the cell ahead is blocked
/// or off the map. Every command is appended to a log for inspection.
#[derive(Clone, Debug)]
pub struct SimulatedDrive {
    world: OccupancyGrid,
    position: Cell,
    heading: Heading,
    rotation_deg: u32,
    connected: bool,
    busy_polls: u32,
    sensor_wait: Option<u32>,
    /// Number of [motion_finished](Drive::motion_finished) polls a motion takes.
    pub motion_polls: u32,
    /// Number of [poll_obstacle_sensors](Drive::poll_obstacle_sensors) calls that come back
    /// empty before a reading is available.
    pub sensor_polls: u32,
    /// Reading reported per channel when an obstacle is ahead.
    pub sensor_value: u32,
    /// Number of forward moves that ran into an obstacle.
    pub collisions: usize,
    log: Vec<DriveCommand>,
}

impl SimulatedDrive {
    pub fn new(world: OccupancyGrid, position: Cell, heading: Heading) -> SimulatedDrive {
        SimulatedDrive {
            world,
            position,
            heading,
            rotation_deg: 90,
            connected: false,
            busy_polls: 0,
            sensor_wait: None,
            motion_polls: 0,
            sensor_polls: 0,
            sensor_value: 100,
            collisions: 0,
            log: Vec::new(),
        }
    }

    pub fn position(&self) -> Cell {
        self.position
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn world(&self) -> &OccupancyGrid {
        &self.world
    }

    pub fn commands(&self) -> &[DriveCommand] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn record(&mut self, command: DriveCommand) -> Result<()> {
        trace!("Simulated drive: {:?}", command);
        if !self.connected && command != DriveCommand::Connect {
            return Err(NavError::Connection(format!(
                "{:?} sent to a disconnected drive",
                command
            )));
        }
        self.log.push(command);
        Ok(())
    }

    fn rotate(&mut self, right: bool) {
        let turn = match (self.rotation_deg % 360, right) {
            (90, true) => Turn::Right,
            (90, false) => Turn::Left,
            (180, _) => Turn::Around,
            (270, true) => Turn::Left,
            (270, false) => Turn::Right,
            _ => Turn::None,
        };
        self.heading = self.heading.apply(turn);
        self.busy_polls = self.motion_polls;
    }

    fn ahead(&self) -> Cell {
        self.position + self.heading.delta()
    }
}

impl Drive for SimulatedDrive {
    fn connect(&mut self) -> Result<()> {
        self.record(DriveCommand::Connect)?;
        self.connected = true;
        Ok(())
    }
    fn set_speed(&mut self, speed: u8) -> Result<()> {
        self.record(DriveCommand::SetSpeed(speed))
    }
    fn set_rotation(&mut self, degrees: u32) -> Result<()> {
        self.record(DriveCommand::SetRotation(degrees))?;
        self.rotation_deg = degrees;
        Ok(())
    }
    fn set_rotation_axis(&mut self, axis: RotationAxis) -> Result<()> {
        self.record(DriveCommand::SetRotationAxis(axis))
    }
    fn rotate_left(&mut self) -> Result<()> {
        self.record(DriveCommand::RotateLeft)?;
        self.rotate(false);
        Ok(())
    }
    fn rotate_right(&mut self) -> Result<()> {
        self.record(DriveCommand::RotateRight)?;
        self.rotate(true);
        Ok(())
    }
    fn go_forward(&mut self, distance_mm: f64) -> Result<()> {
        self.record(DriveCommand::GoForward(distance_mm))?;
        let next = self.ahead();
        if self.world.can_move_to(&next) {
            self.position = next;
            debug!("Simulated drive moved to {}", next);
        } else {
            self.collisions += 1;
            warn!("Simulated drive bumped into {}", next);
        }
        self.busy_polls = self.motion_polls;
        Ok(())
    }
    fn stop(&mut self) -> Result<()> {
        self.record(DriveCommand::Stop)?;
        self.busy_polls = 0;
        Ok(())
    }
    fn motion_finished(&mut self) -> Result<bool> {
        if !self.connected {
            return Err(NavError::Connection("drive is disconnected".into()));
        }
        if self.busy_polls == 0 {
            Ok(true)
        } else {
            self.busy_polls -= 1;
            Ok(false)
        }
    }
    fn read_obstacle_sensors(&mut self) -> Result<(u32, u32)> {
        if !self.connected {
            return Err(NavError::Sensor("drive is disconnected".into()));
        }
        if self.world.can_move_to(&self.ahead()) {
            Ok((0, 0))
        } else {
            Ok((self.sensor_value, self.sensor_value))
        }
    }
    fn poll_obstacle_sensors(&mut self) -> Result<Option<(u32, u32)>> {
        if !self.connected {
            return Err(NavError::Sensor("drive is disconnected".into()));
        }
        let remaining = self.sensor_wait.get_or_insert(self.sensor_polls);
        if *remaining > 0 {
            *remaining -= 1;
            return Ok(None);
        }
        self.sensor_wait = None;
        self.read_obstacle_sensors().map(Some)
    }
    fn disconnect(&mut self) -> Result<()> {
        self.record(DriveCommand::Disconnect)?;
        self.connected = false;
        Ok(())
    }
}
