use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::{
    components::Direction,
    error::WorldError,
    observation::{window_size_for, Observation},
    policies::RandomPolicy,
    rng::{RngManager, StreamRng, POLICY_STREAM},
    scenario::Scenario,
    world::{StepOutcome, World, WorldStats},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub steps: u64,
    pub time_limit: Option<Duration>,
    pub observation_radius: usize,
}

impl EngineSettings {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self {
            scenario_name: scenario.name.clone(),
            seed: scenario.seed,
            steps: scenario.run.steps,
            time_limit: scenario.run.time_limit(),
            observation_radius: scenario.run.observation_radius,
        }
    }
}

pub struct EngineBuilder {
    settings: EngineSettings,
    policy: Option<Box<dyn Policy>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            policy: None,
        }
    }

    pub fn with_policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    pub fn with_boxed_policy(mut self, policy: Box<dyn Policy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn build(self) -> Engine {
        let policy: Box<dyn Policy> = match self.policy {
            Some(policy) => policy,
            None => Box::new(RandomPolicy::new()),
        };
        Engine {
            rng: RngManager::new(self.settings.seed),
            policy,
            settings: self.settings,
        }
    }
}

/// Drives one world with one policy until the step or time budget runs out.
pub struct Engine {
    rng: RngManager,
    policy: Box<dyn Policy>,
    settings: EngineSettings,
}

impl Engine {
    pub fn run(&mut self, world: &mut World) -> Result<RunSummary> {
        self.run_with_hook(world, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, world: &mut World, mut hook: F) -> Result<RunSummary>
    where
        F: FnMut(&StepFrame),
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let window = window_size_for(self.settings.observation_radius)
            .ok_or(WorldError::InvalidWindowSize(usize::MAX))?;
        let center = world.agent_position().ok_or(WorldError::NoAgent)?;
        let mut observation = world.observe(center, window)?;
        let mut last_reward = world.score();

        info!(
            scenario = %self.settings.scenario_name,
            policy = self.policy.name(),
            steps = self.settings.steps,
            "starting run"
        );

        let mut steps = 0;
        while steps < self.settings.steps {
            if let Some(limit) = self.settings.time_limit {
                if start.elapsed() >= limit {
                    info!(steps, "time limit reached");
                    break;
                }
            }

            let ctx = StepContext {
                step: steps,
                score: last_reward,
                scenario_name: &self.settings.scenario_name,
            };
            let action = {
                let mut rng = self.rng.stream(POLICY_STREAM);
                self.policy.act(&ctx, &observation, &mut rng)?
            };
            let result = world.step_with_radius(action, self.settings.observation_radius)?;
            steps += 1;

            let frame = StepFrame {
                step: steps,
                action,
                outcome: result.outcome,
                reward: result.reward,
                reward_delta: result.reward.saturating_sub(last_reward),
                observation: result.observation,
            };
            hook(&frame);
            last_reward = frame.reward;
            observation = frame.observation;
            if result.done {
                break;
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        let summary = RunSummary {
            scenario: self.settings.scenario_name.clone(),
            policy: self.policy.name().to_string(),
            seed: self.settings.seed,
            started_at,
            elapsed_secs: elapsed,
            steps,
            steps_per_second: if elapsed > 0.0 {
                steps as f64 / elapsed
            } else {
                0.0
            },
            score: world.score(),
            food_eaten: world.food_eaten(),
            walls_hit: world.walls_hit(),
            world: world.snapshot(),
        };
        info!(
            steps = summary.steps,
            score = summary.score,
            steps_per_second = summary.steps_per_second,
            "run finished"
        );
        Ok(summary)
    }
}

pub struct StepContext<'a> {
    /// Number of steps already taken this run.
    pub step: u64,
    pub score: u64,
    pub scenario_name: &'a str,
}

pub trait Policy {
    fn name(&self) -> &str;
    fn act(
        &mut self,
        ctx: &StepContext,
        observation: &Observation,
        rng: &mut StreamRng<'_>,
    ) -> Result<Direction>;
}

#[derive(Debug, Clone)]
pub struct StepFrame {
    /// 1-based index of the step that produced this frame.
    pub step: u64,
    pub action: Direction,
    pub outcome: StepOutcome,
    pub reward: u64,
    pub reward_delta: u64,
    pub observation: Observation,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scenario: String,
    pub policy: String,
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub steps: u64,
    pub steps_per_second: f64,
    pub score: u64,
    pub food_eaten: u64,
    pub walls_hit: u64,
    pub world: WorldStats,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Benchmark results ({}):", self.scenario)?;
        writeln!(f, "Time elapsed: {:.2} seconds", self.elapsed_secs)?;
        writeln!(f, "Steps taken: {}", self.steps)?;
        writeln!(f, "Steps per second: {:.2}", self.steps_per_second)?;
        writeln!(f, "Score: {}", self.score)?;
        writeln!(f, "Food eaten: {}", self.food_eaten)?;
        write!(f, "Walls hit: {}", self.walls_hit)
    }
}
