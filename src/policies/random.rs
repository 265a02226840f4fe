use anyhow::Result;
use rand::Rng;

use crate::{
    components::Direction,
    engine::{Policy, StepContext},
    observation::Observation,
    rng::StreamRng,
};

/// Uniform choice over the four moves, ignoring the observation.
pub struct RandomPolicy;

impl RandomPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn act(
        &mut self,
        _ctx: &StepContext,
        _observation: &Observation,
        rng: &mut StreamRng<'_>,
    ) -> Result<Direction> {
        let index = rng.gen_range(0..Direction::ALL.len());
        Ok(Direction::ALL[index])
    }
}
