use core::fmt;
use core::ops::Add;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A grid coordinate addressed by (row, column). Rows grow southwards and columns grow
/// eastwards. Coordinates are signed so that neighbours of border cells can be represented
/// and rejected by bounds checks; there is no wraparound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    #[serde(rename = "r")]
    pub row: i32,
    #[serde(rename = "c")]
    pub col: i32,
}

/// The four axis-aligned unit moves in the order in which successors are generated:
/// North, South, West, East. Changing this order changes which of several equally short
/// paths is returned.
pub const NEUMANN_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

impl Cell {
    pub const fn new(row: i32, col: i32) -> Cell {
        Cell { row, col }
    }

    pub fn manhattan_distance(&self, other: &Cell) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }

    /// The (row, col) offset from self to other.
    pub fn delta(&self, other: &Cell) -> (i32, i32) {
        (other.row - self.row, other.col - self.col)
    }

    /// True if other is exactly one axis-aligned unit step away.
    pub fn is_adjacent(&self, other: &Cell) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// The 4-neighbourhood in [NEUMANN_OFFSETS] order, without bounds checks.
    pub fn neumann_neighborhood(&self) -> SmallVec<[Cell; 4]> {
        NEUMANN_OFFSETS.iter().map(|&d| *self + d).collect()
    }
}

impl Add<(i32, i32)> for Cell {
    type Output = Cell;
    fn add(self, (dr, dc): (i32, i32)) -> Cell {
        Cell::new(self.row + dr, self.col + dc)
    }
}

impl From<(i32, i32)> for Cell {
    fn from((row, col): (i32, i32)) -> Cell {
        Cell::new(row, col)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbourhood_order_is_fixed() {
        let c = Cell::new(1, 1);
        let n = c.neumann_neighborhood();
        assert_eq!(
            n.as_slice(),
            &[
                Cell::new(0, 1),
                Cell::new(2, 1),
                Cell::new(1, 0),
                Cell::new(1, 2)
            ]
        );
    }

    #[test]
    fn serializes_as_r_c() {
        let json = serde_json::to_string(&Cell::new(2, 1)).unwrap();
        assert_eq!(json, r#"{"r":2,"c":1}"#);
    }

    #[test]
    fn adjacency() {
        let c = Cell::new(0, 0);
        assert!(c.is_adjacent(&Cell::new(0, 1)));
        assert!(!c.is_adjacent(&Cell::new(1, 1)));
        assert!(!c.is_adjacent(&c));
    }
}
