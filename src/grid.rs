use crate::cell::Cell;
use crate::error::{NavError, Result};
use core::fmt;
use log::debug;
use petgraph::unionfind::UnionFind;

/// [OccupancyGrid] is a square N×N matrix of cells that are either passable or blocked.
/// The dimensions are fixed at construction. In addition to the raw cell states it maintains
/// connected components in a [UnionFind] structure so that unreachable goals can be rejected
/// without flood-filling the grid.
///
/// After construction the only mutation is [set_blocked](Self::set_blocked), used when an
/// obstacle is discovered during execution.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    size: usize,
    blocked: Vec<bool>,
    components: UnionFind<usize>,
    components_dirty: bool,
}

impl OccupancyGrid {
    /// An all-passable N×N grid.
    pub fn new(size: usize) -> Result<OccupancyGrid> {
        if size == 0 {
            return Err(NavError::InvalidGrid("grid size must be positive".into()));
        }
        let mut grid = OccupancyGrid {
            size,
            blocked: vec![false; size * size],
            components: UnionFind::new(size * size),
            components_dirty: false,
        };
        grid.generate_components();
        Ok(grid)
    }

    /// Builds a grid from N² row-major values where 0 is passable and 1 is blocked.
    pub fn from_values(size: usize, values: &[u8]) -> Result<OccupancyGrid> {
        if size == 0 {
            return Err(NavError::InvalidGrid("grid size must be positive".into()));
        }
        if values.len() != size * size {
            return Err(NavError::InvalidGrid(format!(
                "expected {} values for a {}x{} grid, got {}",
                size * size,
                size,
                size,
                values.len()
            )));
        }
        if let Some((ix, v)) = values.iter().enumerate().find(|(_, &v)| v > 1) {
            return Err(NavError::InvalidGrid(format!(
                "value {} at index {} is not 0 or 1",
                v, ix
            )));
        }
        let mut grid = OccupancyGrid::new(size)?;
        grid.blocked = values.iter().map(|&v| v == 1).collect();
        grid.generate_components();
        Ok(grid)
    }

    /// Parses a flattened grid such as `"0,0,0, 1,1,0, 0,0,0"`. Commas and semicolons both
    /// separate values and surrounding whitespace is ignored.
    pub fn parse(size: usize, spec: &str) -> Result<OccupancyGrid> {
        let values = spec
            .split([',', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u8>()
                    .map_err(|_| NavError::InvalidGrid(format!("'{}' is not 0 or 1", s)))
            })
            .collect::<Result<Vec<u8>>>()?;
        OccupancyGrid::from_values(size, &values)
    }

    /// Builds a grid from the row matrix used by the interchange records.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<OccupancyGrid> {
        let size = rows.len();
        if let Some((r, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != size) {
            return Err(NavError::InvalidGrid(format!(
                "row {} has {} values, expected {}",
                r,
                row.len(),
                size
            )));
        }
        let values = rows.iter().flatten().copied().collect::<Vec<u8>>();
        OccupancyGrid::from_values(size, &values)
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.blocked
            .chunks(self.size)
            .map(|row| row.iter().map(|&b| b as u8).collect())
            .collect()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, cell: &Cell) -> bool {
        let n = self.size as i32;
        cell.row >= 0 && cell.row < n && cell.col >= 0 && cell.col < n
    }

    fn ix(&self, cell: &Cell) -> usize {
        cell.row as usize * self.size + cell.col as usize
    }

    /// Whether the cell is passable. Fails with [NavError::InvalidQuery] if it is out of bounds.
    pub fn is_passable(&self, cell: &Cell) -> Result<bool> {
        if !self.in_bounds(cell) {
            return Err(NavError::InvalidQuery {
                endpoint: "cell",
                cell: *cell,
                reason: "is out of bounds",
            });
        }
        Ok(!self.blocked[self.ix(cell)])
    }

    /// Bounds check and passability in one, for successor generation.
    pub fn can_move_to(&self, cell: &Cell) -> bool {
        self.in_bounds(cell) && !self.blocked[self.ix(cell)]
    }

    /// Marks the cell as blocked. Blocking an already blocked cell is a no-op. Flags the
    /// components as dirty since blocking can split a component in two.
    pub fn set_blocked(&mut self, cell: &Cell) -> Result<()> {
        if !self.in_bounds(cell) {
            return Err(NavError::InvalidQuery {
                endpoint: "cell",
                cell: *cell,
                reason: "is out of bounds",
            });
        }
        let ix = self.ix(cell);
        if !self.blocked[ix] {
            debug!("Blocking {}", cell);
            self.blocked[ix] = true;
            self.components_dirty = true;
        }
        Ok(())
    }

    /// Passable neighbours of a cell in the fixed North, South, West, East order.
    pub fn passable_neighbours(&self, cell: &Cell) -> impl Iterator<Item = Cell> + '_ {
        cell.neumann_neighborhood()
            .into_iter()
            .filter(move |n| self.can_move_to(n))
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|&&b| b).count()
    }

    pub fn components_dirty(&self) -> bool {
        self.components_dirty
    }

    /// Checks if start and goal are on the same component. Out-of-bounds cells are never
    /// reachable. If the components are dirty the answer is conservatively [true].
    pub fn reachable(&self, start: &Cell, goal: &Cell) -> bool {
        if !self.in_bounds(start) || !self.in_bounds(goal) {
            return false;
        }
        if self.components_dirty {
            return true;
        }
        self.components.equiv(self.ix(start), self.ix(goal))
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up passable neighbours to the same
    /// components. Only the south and east neighbours are visited since links are symmetric.
    pub fn generate_components(&mut self) {
        let n = self.size as i32;
        self.components = UnionFind::new(self.size * self.size);
        self.components_dirty = false;
        for row in 0..n {
            for col in 0..n {
                let cell = Cell::new(row, col);
                if !self.can_move_to(&cell) {
                    continue;
                }
                let parent_ix = self.ix(&cell);
                for next in [cell + (1, 0), cell + (0, 1)] {
                    if self.can_move_to(&next) {
                        let ix = self.ix(&next);
                        self.components.union(parent_ix, ix);
                    }
                }
            }
        }
    }
}

impl PartialEq for OccupancyGrid {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.blocked == other.blocked
    }
}

impl Eq for OccupancyGrid {}

impl fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.blocked.chunks(self.size) {
            let line = row
                .iter()
                .map(|&b| if b { '#' } else { '.' })
                .collect::<String>();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
