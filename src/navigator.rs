//! Plan, execute and replan until the goal is reached or no longer reachable.
//!
//! The [PathExecutor] never retries on its own. [Navigator] is the caller layer that picks up
//! a replan request, plans again from where the agent stopped on the updated grid and hands
//! the new path back to the executor, up to a fixed number of replans. When planner and
//! executor run as separate processes, [replan_from_request] is the planner's half of the
//! same handshake.
use crate::cell::Cell;
use crate::drive::Drive;
use crate::error::Result;
use crate::executor::{PathExecutor, RunOutcome, StopSignal};
use crate::grid::OccupancyGrid;
use crate::interchange::{PathState, Transport};
use crate::pathfinder::find_path;
use log::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationOutcome {
    Reached { at: Cell },
    /// The goal became unreachable from `at` with the obstacles known so far.
    NoPath { at: Cell },
    Cancelled { at: Cell },
    /// Another obstacle was found after `max_replans` replans.
    ReplanLimit { at: Cell },
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavigationReport {
    pub outcome: NavigationOutcome,
    pub replans: usize,
    /// The grid including every obstacle discovered on the way.
    pub grid: OccupancyGrid,
    /// Cells the agent stood on, in order.
    pub visited: Vec<Cell>,
}

/// The planner's side of a replan handshake between separate processes.
///
/// Reads the pending request and the grid record the executor left behind, plans from the
/// cell the agent stopped on and writes the new state. The request is consumed only after
/// the new state is written. Returns `None` when no request is pending.
pub fn replan_from_request(transport: &mut dyn Transport) -> Result<Option<PathState>> {
    let request = match transport.replan_pending()? {
        Some(request) => request,
        None => return Ok(None),
    };
    let record = transport.read_grid()?;
    let mut grid = OccupancyGrid::from_rows(&record.grid)?;
    grid.set_blocked(&request.blocked)?;
    grid.update();
    let path = find_path(&grid, request.current, record.goal)?;
    let state = PathState::new(grid, request.current, record.goal, path, record.cell_mm)?;
    transport.write_state(&state)?;
    transport.take_replan()?;
    info!("Replanned from {} around {}", request.current, request.blocked);
    Ok(Some(state))
}

pub struct Navigator<D: Drive, T: Transport> {
    executor: PathExecutor<D>,
    transport: T,
    pub max_replans: usize,
}

impl<D: Drive, T: Transport> Navigator<D, T> {
    pub fn new(executor: PathExecutor<D>, transport: T, max_replans: usize) -> Navigator<D, T> {
        Navigator {
            executor,
            transport,
            max_replans,
        }
    }

    pub fn executor(&self) -> &PathExecutor<D> {
        &self.executor
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Navigates from start to goal. Every plan is written to and read back from the
    /// transport before execution, so the executor only ever sees validated records.
    pub fn navigate(
        &mut self,
        mut grid: OccupancyGrid,
        start: Cell,
        goal: Cell,
        cell_mm: f64,
        stop: &StopSignal,
    ) -> Result<NavigationReport> {
        let mut current = start;
        let mut replans = 0;
        let mut visited = vec![start];
        loop {
            grid.update();
            let path = find_path(&grid, current, goal)?;
            if path.is_none() {
                warn!("{} is unreachable from {}", goal, current);
                return Ok(NavigationReport {
                    outcome: NavigationOutcome::NoPath { at: current },
                    replans,
                    grid,
                    visited,
                });
            }
            let state = PathState::new(grid.clone(), current, goal, path, cell_mm)?;
            self.transport.write_state(&state)?;
            let state = self.transport.read_state()?;

            let outcome = self.executor.run(&state, &mut self.transport, stop)?;
            let walked = state.path.as_ref().map(|p| p.cells()).unwrap_or_default();
            let steps = self.executor.current_index();
            visited.extend(walked.iter().skip(1).take(steps));
            match outcome {
                RunOutcome::Completed { at } => {
                    info!("Reached {} after {} replans", at, replans);
                    return Ok(NavigationReport {
                        outcome: NavigationOutcome::Reached { at },
                        replans,
                        grid,
                        visited,
                    });
                }
                RunOutcome::Cancelled { at } => {
                    return Ok(NavigationReport {
                        outcome: NavigationOutcome::Cancelled { at },
                        replans,
                        grid,
                        visited,
                    });
                }
                RunOutcome::ReplanPending {
                    request,
                    grid: updated,
                } => {
                    self.transport.take_replan()?;
                    grid = updated;
                    current = request.current;
                    if replans == self.max_replans {
                        warn!("Giving up at {} after {} replans", current, replans);
                        return Ok(NavigationReport {
                            outcome: NavigationOutcome::ReplanLimit { at: current },
                            replans,
                            grid,
                            visited,
                        });
                    }
                    replans += 1;
                    info!(
                        "Replanning from {} around {} (replan {}/{})",
                        current, request.blocked, replans, self.max_replans
                    );
                }
            }
        }
    }
}
