use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::components::{Direction, Position, Tag};
use crate::error::WorldError;
use crate::observation::{
    self, window_cells, window_size_for, Observation, DEFAULT_OBSERVATION_RADIUS,
};
use crate::spatial::GridStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// Agent moved onto an empty cell.
    Moved,
    /// Agent ate the food on the target cell and moved onto it.
    Ate,
    /// Target cell holds a wall; the agent stays put.
    Blocked,
    /// Target is past the world edge; nothing changes.
    Bumped,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub observation: Observation,
    /// Cumulative score, not a per-step delta.
    pub reward: u64,
    /// Never set by the world itself.
    pub done: bool,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldStats {
    pub width: u32,
    pub height: u32,
    pub agents: usize,
    pub food: usize,
    pub walls: usize,
    pub score: u64,
    pub food_eaten: u64,
    pub walls_hit: u64,
}

#[derive(Debug, Clone)]
pub struct World {
    grid: GridStore,
    score: u64,
    food_eaten: u64,
    walls_hit: u64,
}

impl World {
    pub fn new(width: u32, height: u32) -> Result<Self, WorldError> {
        Ok(Self {
            grid: GridStore::new(width, height)?,
            score: 0,
            food_eaten: 0,
            walls_hit: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.grid.contains(pos)
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn food_eaten(&self) -> u64 {
        self.food_eaten
    }

    pub fn walls_hit(&self) -> u64 {
        self.walls_hit
    }

    pub fn occupant_at(&self, pos: Position) -> Result<Tag, WorldError> {
        self.grid.get(pos)
    }

    pub fn positions_of(&self, tag: Tag) -> &[Position] {
        self.grid.positions_of(tag)
    }

    pub fn agent_position(&self) -> Option<Position> {
        self.grid.positions_of(Tag::Agent).first().copied()
    }

    /// Put an entity on the grid, evicting whatever occupied the cell.
    ///
    /// Allowed at any point, including mid-episode. A second agent is
    /// rejected; re-placing the agent on its own cell is a no-op.
    pub fn place(&mut self, tag: Tag, pos: Position) -> Result<(), WorldError> {
        if !tag.is_entity() {
            return Err(WorldError::EmptyTag);
        }
        let previous = self.grid.get(pos)?;
        if tag == Tag::Agent {
            if let Some(existing) = self.agent_position() {
                if existing != pos {
                    return Err(WorldError::AgentAlreadyPlaced { existing });
                }
            }
        }

        if previous.is_entity() {
            if previous != tag {
                warn!(?previous, ?tag, x = pos.x, y = pos.y, "placement evicts occupant");
            }
            self.grid.vacate(previous, pos)?;
        }
        self.grid.insert(tag, pos)?;
        debug!(?tag, x = pos.x, y = pos.y, "placed entity");
        Ok(())
    }

    pub fn relocate(&mut self, tag: Tag, from: Position, to: Position) -> Result<(), WorldError> {
        self.grid.relocate(tag, from, to)
    }

    pub fn vacate(&mut self, tag: Tag, pos: Position) -> Result<(), WorldError> {
        self.grid.vacate(tag, pos)?;
        debug!(?tag, x = pos.x, y = pos.y, "vacated cell");
        Ok(())
    }

    pub fn observe(&self, center: Position, window_size: usize) -> Result<Observation, WorldError> {
        observation::observe(&self.grid, center, window_size)
    }

    pub fn step(&mut self, direction: Direction) -> Result<StepResult, WorldError> {
        self.step_with_radius(direction, DEFAULT_OBSERVATION_RADIUS)
    }

    pub fn step_with_radius(
        &mut self,
        direction: Direction,
        radius: usize,
    ) -> Result<StepResult, WorldError> {
        // Reject the window before the move so a bad radius leaves the world untouched.
        let window_size =
            window_size_for(radius).ok_or(WorldError::InvalidWindowSize(usize::MAX))?;
        window_cells(window_size)?;
        let agent = self.agent_position().ok_or(WorldError::NoAgent)?;
        let outcome = self.resolve_move(agent, direction)?;
        trace!(?direction, ?outcome, score = self.score, "step resolved");

        let center = self.agent_position().ok_or(WorldError::NoAgent)?;
        let observation = self.observe(center, window_size)?;
        Ok(StepResult {
            observation,
            reward: self.score,
            done: false,
            outcome,
        })
    }

    fn resolve_move(
        &mut self,
        agent: Position,
        direction: Direction,
    ) -> Result<StepOutcome, WorldError> {
        let target = match agent.offset(direction) {
            Some(target) if self.grid.contains(target) => target,
            _ => return Ok(StepOutcome::Bumped),
        };

        match self.grid.tag_at(target) {
            Tag::Food => {
                self.grid.vacate(Tag::Food, target)?;
                self.grid.relocate(Tag::Agent, agent, target)?;
                self.score += 1;
                self.food_eaten += 1;
                Ok(StepOutcome::Ate)
            }
            Tag::Wall => {
                self.walls_hit += 1;
                Ok(StepOutcome::Blocked)
            }
            Tag::Empty => {
                self.grid.relocate(Tag::Agent, agent, target)?;
                Ok(StepOutcome::Moved)
            }
            Tag::Agent => Err(WorldError::InvariantViolation(format!(
                "second agent found at ({}, {})",
                target.x, target.y
            ))),
        }
    }

    /// Audit grid/index consistency and the single-agent rule.
    pub fn check_invariants(&self) -> Result<(), WorldError> {
        self.grid.check()?;
        let agents = self.positions_of(Tag::Agent).len();
        if agents > 1 {
            return Err(WorldError::InvariantViolation(format!(
                "{agents} agents present"
            )));
        }
        Ok(())
    }

    pub fn snapshot(&self) -> WorldStats {
        WorldStats {
            width: self.width(),
            height: self.height(),
            agents: self.positions_of(Tag::Agent).len(),
            food: self.positions_of(Tag::Food).len(),
            walls: self.positions_of(Tag::Wall).len(),
            score: self.score,
            food_eaten: self.food_eaten,
            walls_hit: self.walls_hit,
        }
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height() {
            let row: String = (0..self.width())
                .map(|x| self.grid.tag_at(Position { x, y }).glyph())
                .collect();
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(entities: &[(Tag, u32, u32)]) -> World {
        let mut world = World::new(5, 5).unwrap();
        for (tag, x, y) in entities {
            world.place(*tag, Position::new(*x, *y)).unwrap();
        }
        world
    }

    #[test]
    fn test_initialization() {
        let world = World::new(5, 5).unwrap();
        assert_eq!((world.width(), world.height()), (5, 5));
        assert_eq!(world.score(), 0);
        assert_eq!(world.food_eaten(), 0);
        assert_eq!(world.walls_hit(), 0);
        assert!(world.agent_position().is_none());
    }

    #[test]
    fn test_place_entity() {
        let world = world_with(&[(Tag::Agent, 0, 0)]);
        assert_eq!(world.occupant_at(Position::new(0, 0)).unwrap(), Tag::Agent);
        assert_eq!(world.positions_of(Tag::Agent), &[Position::new(0, 0)]);
    }

    #[test]
    fn test_place_out_of_bounds() {
        let mut world = World::new(5, 5).unwrap();
        let err = world.place(Tag::Food, Position::new(5, 0)).unwrap_err();
        assert!(matches!(err, WorldError::OutOfBounds { x: 5, y: 0, .. }));
        assert!(world.positions_of(Tag::Food).is_empty());
    }

    #[test]
    fn test_place_over_wall_evicts_it() {
        let world = world_with(&[(Tag::Wall, 1, 1), (Tag::Food, 1, 1)]);
        assert!(world.positions_of(Tag::Wall).is_empty());
        assert_eq!(world.positions_of(Tag::Food), &[Position::new(1, 1)]);
        world.check_invariants().unwrap();
    }

    #[test]
    fn test_second_agent_is_rejected() {
        let mut world = world_with(&[(Tag::Agent, 0, 0)]);
        let err = world.place(Tag::Agent, Position::new(1, 0)).unwrap_err();
        assert_eq!(
            err,
            WorldError::AgentAlreadyPlaced {
                existing: Position::new(0, 0)
            }
        );
        world.place(Tag::Agent, Position::new(0, 0)).unwrap();
        assert_eq!(world.positions_of(Tag::Agent).len(), 1);
    }

    #[test]
    fn test_empty_tag_is_not_placeable() {
        let mut world = World::new(2, 2).unwrap();
        assert_eq!(
            world.place(Tag::Empty, Position::new(0, 0)),
            Err(WorldError::EmptyTag)
        );
    }

    #[test]
    fn test_move_agent() {
        let mut world = world_with(&[(Tag::Agent, 2, 2)]);
        let result = world.step(Direction::Right).unwrap();
        assert_eq!(result.outcome, StepOutcome::Moved);
        assert_eq!(world.occupant_at(Position::new(3, 2)).unwrap(), Tag::Agent);
        assert_eq!(world.occupant_at(Position::new(2, 2)).unwrap(), Tag::Empty);
    }

    #[test]
    fn test_eat_food() {
        let mut world = world_with(&[(Tag::Agent, 2, 2), (Tag::Food, 3, 2)]);
        let result = world.step(Direction::Right).unwrap();
        assert_eq!(result.outcome, StepOutcome::Ate);
        assert_eq!(result.reward, 1);
        assert_eq!(world.score(), 1);
        assert_eq!(world.food_eaten(), 1);
        assert_eq!(world.occupant_at(Position::new(3, 2)).unwrap(), Tag::Agent);
        assert!(world.positions_of(Tag::Food).is_empty());
    }

    #[test]
    fn test_hit_wall() {
        let mut world = world_with(&[(Tag::Agent, 2, 2), (Tag::Wall, 3, 2)]);
        let result = world.step(Direction::Right).unwrap();
        assert_eq!(result.outcome, StepOutcome::Blocked);
        assert_eq!(world.walls_hit(), 1);
        assert_eq!(world.score(), 0);
        assert_eq!(world.occupant_at(Position::new(2, 2)).unwrap(), Tag::Agent);
    }

    #[test]
    fn test_step_without_agent() {
        let mut world = world_with(&[(Tag::Food, 1, 1)]);
        assert!(matches!(
            world.step(Direction::Left),
            Err(WorldError::NoAgent)
        ));
    }

    #[test]
    fn test_step_observation_follows_agent() {
        let mut world = world_with(&[(Tag::Agent, 2, 2)]);
        let result = world.step_with_radius(Direction::Down, 2).unwrap();
        assert_eq!(result.observation.size(), 5);
        assert_eq!(result.observation.get(2, 2), Some(Tag::Agent));
        assert!(!result.done);
    }

    #[test]
    fn test_oversized_radius_fails_before_moving() {
        let mut world = world_with(&[(Tag::Agent, 2, 2), (Tag::Food, 3, 2)]);
        for radius in [usize::MAX / 2 + 1, 1 << 32] {
            assert!(matches!(
                world.step_with_radius(Direction::Right, radius),
                Err(WorldError::InvalidWindowSize(_))
            ));
        }
        assert_eq!(world.agent_position(), Some(Position::new(2, 2)));
        assert_eq!(world.score(), 0);
        assert_eq!(world.positions_of(Tag::Food), &[Position::new(3, 2)]);
    }

    #[test]
    fn test_display_renders_grid() {
        let world = world_with(&[(Tag::Agent, 0, 0), (Tag::Food, 2, 1), (Tag::Wall, 4, 4)]);
        let rendered = world.to_string();
        let rows: Vec<&str> = rendered.lines().collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], "A....");
        assert_eq!(rows[1], "..F..");
        assert_eq!(rows[4], "....#");
    }

    #[test]
    fn test_snapshot_counts_entities() {
        let world = world_with(&[(Tag::Agent, 0, 0), (Tag::Food, 2, 1), (Tag::Food, 3, 1)]);
        let stats = world.snapshot();
        assert_eq!(stats.agents, 1);
        assert_eq!(stats.food, 2);
        assert_eq!(stats.walls, 0);
    }
}
