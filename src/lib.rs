//! # grid_navigator
//!
//! Shortest-path planning on small occupancy grids and step-by-step execution of the planned
//! path on a physical or simulated agent. Paths are computed with
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) on the 4-connected grid using the
//! Manhattan distance as heuristic. Connected components are maintained so that unreachable
//! goals are rejected without flood-filling.
//!
//! The [PathExecutor] walks a [PathState] one cell at a time through the narrow [Drive]
//! capability: turn, read the obstacle sensors, advance. An obstacle ends the run with a
//! [ReplanRequest] instead of driving on blindly; [Navigator] closes the loop by planning
//! again on the updated grid.
//!
//! ```
//! use grid_navigator::{find_path, Cell, OccupancyGrid};
//!
//! // |S . .|
//! // |# # .|
//! // |. . G|
//! let grid = OccupancyGrid::parse(3, "0,0,0, 1,1,0, 0,0,0").unwrap();
//! let path = find_path(&grid, Cell::new(0, 0), Cell::new(2, 2)).unwrap().unwrap();
//! assert_eq!(path.edges(), 4);
//! ```
mod astar;
pub mod cell;
pub mod config;
pub mod drive;
pub mod error;
pub mod executor;
pub mod grid;
pub mod heading;
pub mod interchange;
pub mod navigator;
pub mod pathfinder;

pub use crate::cell::Cell;
pub use crate::config::NavConfig;
pub use crate::drive::{Drive, DriveCommand, RotationAxis, SimulatedDrive};
pub use crate::error::{NavError, Result};
pub use crate::executor::{ExecutorConfig, ExecutorState, PathExecutor, RunOutcome, StopSignal};
pub use crate::grid::OccupancyGrid;
pub use crate::heading::{Heading, Turn};
pub use crate::interchange::{
    FileTransport, GridRecord, MemoryTransport, PathRecord, PathState, ReplanRequest, Transport,
};
pub use crate::navigator::{
    replan_from_request, NavigationOutcome, NavigationReport, Navigator,
};
pub use crate::pathfinder::{find_path, find_round_trip, require_path, Path};
