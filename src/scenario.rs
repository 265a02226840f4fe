use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    components::{Direction, Position, Tag},
    config::{LoggingConfig, RunConfig},
    rng::{RngManager, LAYOUT_STREAM},
    world::World,
};

/// Cell counts scattered over empty cells after the explicit layout.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RandomPlacement {
    #[serde(default)]
    pub food: usize,
    #[serde(default)]
    pub walls: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub agent: [u32; 2],
    #[serde(default)]
    pub food: Vec<[u32; 2]>,
    #[serde(default)]
    pub walls: Vec<[u32; 2]>,
    #[serde(default)]
    pub random: RandomPlacement,
    /// Fixed action sequence; when empty the runner picks actions at random.
    #[serde(default)]
    pub script: Vec<Direction>,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        Scenario::from_yaml_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

fn to_position([x, y]: [u32; 2]) -> Position {
    Position::new(x, y)
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Square world with the agent in the corner, one random food item and
    /// `walls` random walls: one cell of the `bench` size/wall sweep.
    pub fn sweep(size: u32, walls: usize, seed: u64) -> Self {
        Self {
            name: format!("sweep_{size}x{size}_{walls}w"),
            description: None,
            seed,
            width: size,
            height: size,
            agent: [0, 0],
            food: Vec::new(),
            walls: Vec::new(),
            random: RandomPlacement { food: 1, walls },
            script: Vec::new(),
            run: RunConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Every size x wall-count combination that fits on its grid; the rest
    /// are skipped with a warning.
    pub fn sweep_grid(sizes: &[u32], walls: &[usize], seed: u64) -> Vec<Self> {
        let mut scenarios = Vec::new();
        for &size in sizes {
            for &wall_count in walls {
                let scenario = Self::sweep(size, wall_count, seed);
                match scenario.validate() {
                    Ok(()) => scenarios.push(scenario),
                    Err(err) => warn!(size, wall_count, %err, "skipping sweep cell"),
                }
            }
        }
        scenarios
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!(
                "scenario '{}' has a zero-sized {}x{} grid",
                self.name,
                self.width,
                self.height
            );
        }

        let mut seen = HashSet::new();
        let explicit = std::iter::once(("agent", self.agent))
            .chain(self.food.iter().map(|p| ("food", *p)))
            .chain(self.walls.iter().map(|p| ("wall", *p)));
        for (kind, [x, y]) in explicit {
            if x >= self.width || y >= self.height {
                bail!(
                    "{kind} at ({x}, {y}) lies outside the {}x{} grid",
                    self.width,
                    self.height
                );
            }
            if !seen.insert((x, y)) {
                bail!("cell ({x}, {y}) is listed more than once");
            }
        }

        let cells = self.width as usize * self.height as usize;
        let requested = seen
            .len()
            .checked_add(self.random.food)
            .and_then(|n| n.checked_add(self.random.walls));
        let Some(requested) = requested.filter(|n| *n <= cells) else {
            bail!(
                "scenario '{}' asks for more entities than its {cells} cells can hold",
                self.name
            );
        };
        debug!(scenario = %self.name, requested, cells, "scenario validated");
        Ok(())
    }

    pub fn build_world(&self, rng: &mut RngManager) -> Result<World> {
        self.validate()?;
        let mut world = World::new(self.width, self.height)?;
        world.place(Tag::Agent, to_position(self.agent))?;
        for food in &self.food {
            world.place(Tag::Food, to_position(*food))?;
        }
        for wall in &self.walls {
            world.place(Tag::Wall, to_position(*wall))?;
        }

        let mut free: Vec<Position> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| Position::new(x, y)))
            .filter(|pos| matches!(world.occupant_at(*pos), Ok(Tag::Empty)))
            .collect();
        let wanted = self.random.food.saturating_add(self.random.walls);
        if wanted > free.len() {
            bail!(
                "only {} empty cells left for {wanted} random entities",
                free.len()
            );
        }
        let mut layout = rng.stream(LAYOUT_STREAM);
        let (picked, _) = free.partial_shuffle(&mut layout, wanted);
        let (food_cells, wall_cells) = picked.split_at(self.random.food);
        for pos in food_cells {
            world.place(Tag::Food, *pos)?;
        }
        for pos in wall_cells {
            world.place(Tag::Wall, *pos)?;
        }

        debug!(
            scenario = %self.name,
            food = world.positions_of(Tag::Food).len(),
            walls = world.positions_of(Tag::Wall).len(),
            "built world"
        );
        Ok(world)
    }
}
