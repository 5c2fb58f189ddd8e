use crate::astar::astar;
use crate::cell::Cell;
use crate::error::{NavError, Result};
use crate::grid::OccupancyGrid;
use crate::heading::Heading;
use itertools::Itertools;
use log::{debug, info};

/// An ordered sequence of cells from start to goal inclusive. Every consecutive pair is one
/// axis-aligned unit step and no cell repeats. A path of one cell means start == goal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    cells: Vec<Cell>,
}

impl Path {
    /// Validates a cell sequence that comes from outside the pathfinder.
    pub fn new(cells: Vec<Cell>) -> Result<Path> {
        if cells.is_empty() {
            return Err(NavError::Interchange("a path needs at least one cell".into()));
        }
        if let Some((a, b)) = cells.iter().tuple_windows().find(|(a, b)| !a.is_adjacent(b)) {
            return Err(NavError::Interchange(format!(
                "{} -> {} is not a unit step",
                a, b
            )));
        }
        if !cells.iter().all_unique() {
            return Err(NavError::Interchange("path visits a cell twice".into()));
        }
        Ok(Path { cells })
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    pub fn start(&self) -> Cell {
        self.cells[0]
    }

    pub fn goal(&self) -> Cell {
        self.cells[self.cells.len() - 1]
    }

    /// Number of cells, including start and goal.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false, a path holds at least its start cell. Present to pair with [Path::len].
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of unit moves, which is also the path cost.
    pub fn edges(&self) -> usize {
        self.cells.len() - 1
    }

    /// Consecutive (from, to) pairs together with the heading of the move.
    pub fn steps(&self) -> impl Iterator<Item = (Cell, Cell, Heading)> + '_ {
        self.cells.iter().tuple_windows().filter_map(|(a, b)| {
            Heading::from_delta(a.delta(b)).map(|heading| (*a, *b, heading))
        })
    }
}

fn validate_endpoint(grid: &OccupancyGrid, endpoint: &'static str, cell: &Cell) -> Result<()> {
    if !grid.in_bounds(cell) {
        return Err(NavError::InvalidQuery {
            endpoint,
            cell: *cell,
            reason: "is out of bounds",
        });
    }
    if !grid.is_passable(cell)? {
        return Err(NavError::InvalidQuery {
            endpoint,
            cell: *cell,
            reason: "is blocked",
        });
    }
    Ok(())
}

/// Computes a shortest 4-connected path from start to goal using A* with the
/// [Manhattan distance](https://en.wikipedia.org/wiki/Taxicab_geometry) as heuristic. Every
/// move costs 1. Successors are generated North, South, West, East and ties in f are broken
/// by insertion order, so the result is deterministic.
///
/// Returns `Ok(None)` if the query is valid but the goal cannot be reached, and
/// [NavError::InvalidQuery] if start or goal is out of bounds or blocked.
pub fn find_path(grid: &OccupancyGrid, start: Cell, goal: Cell) -> Result<Option<Path>> {
    validate_endpoint(grid, "start", &start)?;
    validate_endpoint(grid, "goal", &goal)?;
    if start == goal {
        return Ok(Some(Path { cells: vec![start] }));
    }
    if !grid.reachable(&start, &goal) {
        info!("{} is not reachable from {}", goal, start);
        return Ok(None);
    }
    debug!("Computing path from {} to {}", start, goal);
    let result = astar(
        &start,
        |cell| grid.passable_neighbours(cell).map(|n| (n, 1)).collect::<Vec<_>>(),
        |cell| cell.manhattan_distance(&goal),
        |cell| *cell == goal,
    );
    match result {
        Some((cells, cost)) => {
            info!("Found path from {} to {} with {} moves", start, goal, cost);
            Ok(Some(Path { cells }))
        }
        None => {
            info!("No path from {} to {}", start, goal);
            Ok(None)
        }
    }
}

/// Like [find_path] but maps the no-path outcome to [NavError::NoPathFound].
pub fn require_path(grid: &OccupancyGrid, start: Cell, goal: Cell) -> Result<Path> {
    find_path(grid, start, goal)?.ok_or(NavError::NoPathFound { start, goal })
}

/// Plans the outbound path and the return path from goal back to start.
pub fn find_round_trip(
    grid: &OccupancyGrid,
    start: Cell,
    goal: Cell,
) -> Result<(Option<Path>, Option<Path>)> {
    Ok((find_path(grid, start, goal)?, find_path(grid, goal, start)?))
}
