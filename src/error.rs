use thiserror::Error;

use crate::components::Position;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("position ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    #[error("no agent found in the world")]
    NoAgent,
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("an agent already exists at ({}, {})", .existing.x, .existing.y)]
    AgentAlreadyPlaced { existing: Position },
    #[error("({dx}, {dy}) is not a unit direction")]
    InvalidAction { dx: i32, dy: i32 },
    #[error("observation window size {0} must be odd and at least 1")]
    InvalidWindowSize(usize),
    #[error("world dimensions {width}x{height} must both be non-zero")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("the empty tag cannot be placed or moved")]
    EmptyTag,
}

impl WorldError {
    pub(crate) fn out_of_bounds(x: i64, y: i64, width: u32, height: u32) -> Self {
        WorldError::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }
}
