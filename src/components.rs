use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Occupant tag of a single grid cell.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    #[default]
    Empty,
    Agent,
    Food,
    Wall,
}

impl Tag {
    pub const ENTITIES: [Tag; 3] = [Tag::Agent, Tag::Food, Tag::Wall];

    pub fn is_entity(self) -> bool {
        !matches!(self, Tag::Empty)
    }

    /// Integer code used by callers that want a numeric grid.
    pub fn code(self) -> u8 {
        match self {
            Tag::Empty => 0,
            Tag::Agent => 1,
            Tag::Food => 2,
            Tag::Wall => 3,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Tag::Empty => '.',
            Tag::Agent => 'A',
            Tag::Food => 'F',
            Tag::Wall => '#',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Neighbouring position one step in `direction`, if it stays non-negative.
    pub fn offset(self, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.delta();
        Some(Position {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

impl From<(u32, u32)> for Position {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

/// Agent movement action. `Up` decreases `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

impl TryFrom<(i32, i32)> for Direction {
    type Error = WorldError;

    fn try_from((dx, dy): (i32, i32)) -> Result<Self, Self::Error> {
        match (dx, dy) {
            (-1, 0) => Ok(Direction::Left),
            (1, 0) => Ok(Direction::Right),
            (0, -1) => Ok(Direction::Up),
            (0, 1) => Ok(Direction::Down),
            _ => Err(WorldError::InvalidAction { dx, dy }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_deltas_round_trip_through_try_from() {
        for direction in Direction::ALL {
            assert_eq!(Direction::try_from(direction.delta()), Ok(direction));
        }
    }

    #[test]
    fn diagonal_and_zero_actions_are_rejected() {
        assert_eq!(
            Direction::try_from((1, 1)),
            Err(WorldError::InvalidAction { dx: 1, dy: 1 })
        );
        assert!(Direction::try_from((0, 0)).is_err());
        assert!(Direction::try_from((2, 0)).is_err());
    }

    #[test]
    fn offset_stops_at_the_origin() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.offset(Direction::Left), None);
        assert_eq!(origin.offset(Direction::Up), None);
        assert_eq!(origin.offset(Direction::Down), Some(Position::new(0, 1)));
    }

    #[test]
    fn tag_codes_match_the_integer_grid() {
        let codes: Vec<u8> = [Tag::Empty, Tag::Agent, Tag::Food, Tag::Wall]
            .iter()
            .map(|tag| tag.code())
            .collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
        assert!(!Tag::Empty.is_entity());
    }
}
