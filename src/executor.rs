//! Walks an agent along a planned [Path] one cell at a time.
//!
//! Each step turns to face the next cell, reads the obstacle sensors and only then advances.
//! When an obstacle is reported the next cell is marked blocked in the controller's copy of
//! the grid, the updated grid record is written, a single [ReplanRequest] is published and
//! the run ends; the rest of the path is not consumed. Every run that got past [Drive::connect] ends with a stop command and
//! a disconnect, whether it completed, asked for a replan, was cancelled or failed.
use crate::cell::Cell;
use crate::drive::{Drive, RotationAxis};
use crate::error::{NavError, Result};
use crate::grid::OccupancyGrid;
use crate::heading::{Heading, Turn};
use crate::interchange::{GridRecord, PathState, ReplanRequest, Transport};
use crate::pathfinder::Path;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone, Debug, PartialEq)]
pub struct ExecutorConfig {
    /// Facing of the agent before its first run. Not knowable by the planner, so it has to
    /// come from calibration or localization.
    pub initial_heading: Heading,
    /// An obstacle is present when left + right exceeds this value.
    pub obstacle_threshold: u32,
    pub speed: u8,
    /// Upper bound on waiting for a single motion to finish or a sensor reading to arrive.
    pub motion_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            initial_heading: Heading::North,
            obstacle_threshold: 0,
            speed: 100,
            motion_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(10),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutorState {
    Idle,
    Turning,
    ObstacleCheck,
    Advancing,
    ReplanPending,
    Completed,
    Stopped,
}

/// How a run ended, when it did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    /// The goal was reached.
    Completed { at: Cell },
    /// An obstacle blocked the next cell. `grid` is the updated grid snapshot.
    ReplanPending {
        request: ReplanRequest,
        grid: OccupancyGrid,
    },
    /// A [StopSignal] ended the run at a step boundary.
    Cancelled { at: Cell },
}

/// Shared flag asking a running controller to stop at the next step boundary.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> StopSignal {
        StopSignal::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct PathExecutor<D: Drive> {
    drive: D,
    config: ExecutorConfig,
    state: ExecutorState,
    heading: Heading,
    current_index: usize,
    current_cell: Option<Cell>,
    grid: Option<OccupancyGrid>,
}

impl<D: Drive> PathExecutor<D> {
    pub fn new(drive: D, config: ExecutorConfig) -> PathExecutor<D> {
        let heading = config.initial_heading;
        PathExecutor {
            drive,
            config,
            state: ExecutorState::Idle,
            heading,
            current_index: 0,
            current_cell: None,
            grid: None,
        }
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Facing after the last run. Carried over into the next run.
    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Overrides the facing, e.g. after re-localization.
    pub fn set_heading(&mut self, heading: Heading) {
        self.heading = heading;
    }

    /// Index into the path of the cell the agent stands on.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_cell(&self) -> Option<Cell> {
        self.current_cell
    }

    /// The controller's grid as of the last run, including discovered obstacles.
    pub fn grid(&self) -> Option<&OccupancyGrid> {
        self.grid.as_ref()
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    pub fn drive_mut(&mut self) -> &mut D {
        &mut self.drive
    }

    pub fn into_drive(self) -> D {
        self.drive
    }

    /// Executes the path in `path_state`. Replan requests are published on `transport`.
    ///
    /// Fails before connecting if the state carries no path or a previous replan request is
    /// still unconsumed.
    ///
    /// A failed stop or disconnect after a replan request went out is logged and the
    /// [RunOutcome::ReplanPending] is still returned.
    pub fn run(
        &mut self,
        path_state: &PathState,
        transport: &mut dyn Transport,
        stop: &StopSignal,
    ) -> Result<RunOutcome> {
        let path = path_state.path.as_ref().ok_or(NavError::NoPathFound {
            start: path_state.start,
            goal: path_state.goal,
        })?;
        if let Some(pending) = transport.replan_pending()? {
            return Err(NavError::ReplanPending {
                current: pending.current,
                blocked: pending.blocked,
            });
        }
        self.state = ExecutorState::Idle;
        self.current_index = 0;
        self.current_cell = Some(path.start());
        self.grid = None;
        let mut grid = path_state.grid.clone();

        self.drive.connect()?;
        info!(
            "Starting execution at {} facing {}, {} moves to {}",
            path.start(),
            self.heading,
            path.edges(),
            path.goal()
        );
        let result = self
            .prepare()
            .and_then(|_| self.walk(path_state, path, &mut grid, transport, stop));
        self.grid = Some(grid);
        match result {
            Ok(outcome @ RunOutcome::ReplanPending { .. }) => {
                // The request is already published
                if let Err(e) = self.drive.stop() {
                    warn!("Stop after replan request did not go through: {}", e);
                }
                if let Err(e) = self.drive.disconnect() {
                    warn!("Disconnect after replan request did not go through: {}", e);
                }
                self.state = ExecutorState::Stopped;
                Ok(outcome)
            }
            Ok(outcome) => {
                let stopped = self.drive.stop();
                let disconnected = self.drive.disconnect();
                self.state = ExecutorState::Stopped;
                stopped?;
                disconnected?;
                Ok(outcome)
            }
            Err(e) => {
                warn!("Execution failed: {}", e);
                if let Err(stop_err) = self.drive.stop() {
                    warn!("Stop after failure did not go through: {}", stop_err);
                }
                if let Err(disc_err) = self.drive.disconnect() {
                    warn!("Disconnect after failure did not go through: {}", disc_err);
                }
                self.state = ExecutorState::Stopped;
                Err(e)
            }
        }
    }

    fn prepare(&mut self) -> Result<()> {
        self.drive.set_speed(self.config.speed)?;
        self.drive.set_rotation_axis(RotationAxis::Center)
    }

    fn walk(
        &mut self,
        path_state: &PathState,
        path: &Path,
        grid: &mut OccupancyGrid,
        transport: &mut dyn Transport,
        stop: &StopSignal,
    ) -> Result<RunOutcome> {
        for (i, (from, to, target)) in path.steps().enumerate() {
            if stop.is_stop_requested() {
                info!("Stop requested, halting at {}", from);
                return Ok(RunOutcome::Cancelled { at: from });
            }
            self.state = ExecutorState::Turning;
            self.turn_towards(target)?;

            self.state = ExecutorState::ObstacleCheck;
            if self.obstacle_ahead()? {
                warn!("Obstacle detected before advancing from {} to {}", from, to);
                grid.set_blocked(&to)?;
                transport.write_grid(&GridRecord {
                    grid: grid.to_rows(),
                    start: path_state.start,
                    goal: path_state.goal,
                    cell_mm: path_state.cell_mm,
                })?;
                let request = ReplanRequest {
                    current: from,
                    blocked: to,
                };
                transport.publish_replan(&request)?;
                self.state = ExecutorState::ReplanPending;
                return Ok(RunOutcome::ReplanPending {
                    request,
                    grid: grid.clone(),
                });
            }

            self.state = ExecutorState::Advancing;
            self.drive.set_speed(self.config.speed)?;
            self.drive.go_forward(path_state.cell_mm)?;
            self.wait_for_motion("go_forward")?;
            self.current_index = i + 1;
            self.current_cell = Some(to);
            debug!("Reached {}", to);
        }
        let at = path.goal();
        info!("Path completed at {}", at);
        self.state = ExecutorState::Completed;
        Ok(RunOutcome::Completed { at })
    }

    fn turn_towards(&mut self, target: Heading) -> Result<()> {
        let turn = self.heading.turn_to(target);
        if turn == Turn::None {
            return Ok(());
        }
        debug!("Turning {:?} from {} to {}", turn, self.heading, target);
        self.drive.set_rotation(turn.degrees())?;
        self.drive.set_rotation_axis(RotationAxis::Center)?;
        let command = match turn {
            Turn::Left => {
                self.drive.rotate_left()?;
                "rotate_left"
            }
            _ => {
                self.drive.rotate_right()?;
                "rotate_right"
            }
        };
        self.wait_for_motion(command)?;
        self.heading = target;
        Ok(())
    }

    fn obstacle_ahead(&mut self) -> Result<bool> {
        let (left, right) =
            self.poll_drive("read_obstacle_sensors", |drive| drive.poll_obstacle_sensors())?;
        debug!("Obstacle sensors (left, right): {}, {}", left, right);
        Ok(left.saturating_add(right) > self.config.obstacle_threshold)
    }

    fn wait_for_motion(&mut self, command: &str) -> Result<()> {
        self.poll_drive(command, |drive| {
            Ok(drive.motion_finished()?.then_some(()))
        })
    }

    /// Polls the drive until `poll` yields a value or the timeout elapses. An answer that
    /// only arrives after the deadline counts as a timeout.
    fn poll_drive<T>(
        &mut self,
        command: &str,
        mut poll: impl FnMut(&mut D) -> Result<Option<T>>,
    ) -> Result<T> {
        let deadline = Instant::now() + self.config.motion_timeout;
        loop {
            let answer = poll(&mut self.drive)?;
            if Instant::now() > deadline {
                return Err(NavError::DriveTimeout {
                    command: command.to_owned(),
                    timeout: self.config.motion_timeout,
                });
            }
            if let Some(value) = answer {
                return Ok(value);
            }
            thread::sleep(self.config.poll_interval);
        }
    }
}
