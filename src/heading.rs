//! Compass headings and the turn needed to face a move vector.
use core::fmt;
use serde::{Deserialize, Serialize};

/// Facing of the agent. The discriminants are the clockwise indices used to compute turns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    #[default]
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

/// A rotation in place. [Turn::Around] is always executed as a 180° right turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Turn {
    None,
    Right,
    Around,
    Left,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    pub fn index(self) -> i32 {
        self as i32
    }

    fn from_index(index: i32) -> Heading {
        Heading::ALL[index.rem_euclid(4) as usize]
    }

    /// Maps a unit move vector (drow, dcol) onto the heading it points at.
    /// Returns [None] for anything that is not an axis-aligned unit step.
    pub fn from_delta(delta: (i32, i32)) -> Option<Heading> {
        match delta {
            (-1, 0) => Some(Heading::North),
            (1, 0) => Some(Heading::South),
            (0, -1) => Some(Heading::West),
            (0, 1) => Some(Heading::East),
            _ => None,
        }
    }

    /// Inverse of [from_delta](Self::from_delta).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::North => (-1, 0),
            Heading::East => (0, 1),
            Heading::South => (1, 0),
            Heading::West => (0, -1),
        }
    }

    /// The minimal turn that brings self onto target.
    pub fn turn_to(self, target: Heading) -> Turn {
        match (target.index() - self.index()).rem_euclid(4) {
            0 => Turn::None,
            1 => Turn::Right,
            2 => Turn::Around,
            _ => Turn::Left,
        }
    }

    /// The heading after executing the given turn.
    pub fn apply(self, turn: Turn) -> Heading {
        let offset = match turn {
            Turn::None => 0,
            Turn::Right => 1,
            Turn::Around => 2,
            Turn::Left => 3,
        };
        Heading::from_index(self.index() + offset)
    }
}

impl Turn {
    /// Magnitude of the rotation in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Turn::None => 0,
            Turn::Right | Turn::Left => 90,
            Turn::Around => 180,
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Heading::North => "N",
            Heading::East => "E",
            Heading::South => "S",
            Heading::West => "W",
        };
        write!(f, "{}", s)
    }
}

impl core::str::FromStr for Heading {
    type Err = String;
    fn from_str(s: &str) -> Result<Heading, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "north" => Ok(Heading::North),
            "e" | "east" => Ok(Heading::East),
            "s" | "south" => Ok(Heading::South),
            "w" | "west" => Ok(Heading::West),
            other => Err(format!("unknown heading '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_table_from_north() {
        let north = Heading::North;
        assert_eq!(north.turn_to(Heading::from_delta((0, 1)).unwrap()), Turn::Right);
        assert_eq!(north.turn_to(Heading::from_delta((1, 0)).unwrap()), Turn::Around);
        assert_eq!(north.turn_to(Heading::from_delta((0, -1)).unwrap()), Turn::Left);
        assert_eq!(north.turn_to(Heading::from_delta((-1, 0)).unwrap()), Turn::None);
    }

    #[test]
    fn applying_the_turn_reaches_the_target() {
        for from in Heading::ALL {
            for to in Heading::ALL {
                assert_eq!(from.apply(from.turn_to(to)), to);
            }
        }
    }

    #[test]
    fn delta_round_trip() {
        for h in Heading::ALL {
            assert_eq!(Heading::from_delta(h.delta()), Some(h));
        }
        assert_eq!(Heading::from_delta((1, 1)), None);
        assert_eq!(Heading::from_delta((0, 2)), None);
    }

    #[test]
    fn parses_names() {
        assert_eq!("west".parse::<Heading>(), Ok(Heading::West));
        assert_eq!("N".parse::<Heading>(), Ok(Heading::North));
        assert!("up".parse::<Heading>().is_err());
    }
}
