//! Locations and directions on the game grid.

use serde::Serialize;

/// A compass direction, plus the two pseudo-directions `None` and `Omni`.
///
/// The eight compass points are declared in clockwise order starting north;
/// that order is load-bearing: zombie spawn placement and other
/// deterministic scans walk [`Direction::CARDINAL_ORDER`] front to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    /// No direction; adding it to a location is the identity.
    None,
    /// All directions at once. Never a movement direction.
    Omni,
}

impl Direction {
    /// The eight real compass directions in scan order.
    pub const CARDINAL_ORDER: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// X offset of this direction. East is positive.
    #[must_use]
    pub const fn dx(self) -> i32 {
        match self {
            Direction::NorthEast | Direction::East | Direction::SouthEast => 1,
            Direction::SouthWest | Direction::West | Direction::NorthWest => -1,
            _ => 0,
        }
    }

    /// Y offset of this direction. South is positive.
    #[must_use]
    pub const fn dy(self) -> i32 {
        match self {
            Direction::SouthEast | Direction::South | Direction::SouthWest => 1,
            Direction::North | Direction::NorthEast | Direction::NorthWest => -1,
            _ => 0,
        }
    }

    /// Whether this is one of the eight real compass directions.
    #[must_use]
    pub const fn is_real(self) -> bool {
        !matches!(self, Direction::None | Direction::Omni)
    }

    /// Whether this direction moves along a diagonal.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::NorthEast
                | Direction::SouthEast
                | Direction::SouthWest
                | Direction::NorthWest
        )
    }

    /// The direction pointing the opposite way.
    ///
    /// `None` and `Omni` are their own opposites.
    #[must_use]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
            other => other,
        }
    }

    /// Rotate 45 degrees clockwise.
    #[must_use]
    pub const fn rotate_right(self) -> Direction {
        match self {
            Direction::North => Direction::NorthEast,
            Direction::NorthEast => Direction::East,
            Direction::East => Direction::SouthEast,
            Direction::SouthEast => Direction::South,
            Direction::South => Direction::SouthWest,
            Direction::SouthWest => Direction::West,
            Direction::West => Direction::NorthWest,
            Direction::NorthWest => Direction::North,
            other => other,
        }
    }

    /// Rotate 45 degrees counterclockwise.
    #[must_use]
    pub const fn rotate_left(self) -> Direction {
        match self {
            Direction::North => Direction::NorthWest,
            Direction::NorthWest => Direction::West,
            Direction::West => Direction::SouthWest,
            Direction::SouthWest => Direction::South,
            Direction::South => Direction::SouthEast,
            Direction::SouthEast => Direction::East,
            Direction::East => Direction::NorthEast,
            Direction::NorthEast => Direction::North,
            other => other,
        }
    }
}

/// An absolute location on the map, in whole-tile coordinates.
///
/// Locations are not bounds-checked; the map decides what is on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MapLocation {
    /// X coordinate (column).
    pub x: i32,
    /// Y coordinate (row); grows southward.
    pub y: i32,
}

impl MapLocation {
    /// Create a new location.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another location.
    #[must_use]
    pub const fn distance_squared_to(self, other: MapLocation) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Whether `other` is within one king's move (Chebyshev distance 1),
    /// excluding this location itself.
    #[must_use]
    pub const fn is_adjacent_to(self, other: MapLocation) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx <= 1 && dy <= 1 && (dx != 0 || dy != 0)
    }

    /// The neighboring location in the given direction.
    ///
    /// Adding `None` or `Omni` returns this location unchanged.
    #[must_use]
    pub const fn add(self, dir: Direction) -> MapLocation {
        MapLocation::new(self.x + dir.dx(), self.y + dir.dy())
    }

    /// The direction that points most directly toward `other`.
    ///
    /// Returns `Direction::Omni` for the location itself.
    #[must_use]
    pub fn direction_to(self, other: MapLocation) -> Direction {
        if self == other {
            return Direction::Omni;
        }
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        match (dx.signum(), dy.signum()) {
            (0, -1) => Direction::North,
            (1, -1) => Direction::NorthEast,
            (1, 0) => Direction::East,
            (1, 1) => Direction::SouthEast,
            (0, 1) => Direction::South,
            (-1, 1) => Direction::SouthWest,
            (-1, 0) => Direction::West,
            _ => Direction::NorthWest,
        }
    }
}
