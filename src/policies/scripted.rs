use anyhow::{bail, Result};

use crate::{
    components::Direction,
    engine::{Policy, StepContext},
    observation::Observation,
    rng::StreamRng,
};

/// Replays a fixed action list, wrapping around at the end.
pub struct ScriptedPolicy {
    actions: Vec<Direction>,
    cursor: usize,
}

impl ScriptedPolicy {
    pub fn new(actions: Vec<Direction>) -> Result<Self> {
        if actions.is_empty() {
            bail!("scripted policy needs at least one action");
        }
        Ok(Self { actions, cursor: 0 })
    }
}

impl Policy for ScriptedPolicy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn act(
        &mut self,
        _ctx: &StepContext,
        _observation: &Observation,
        _rng: &mut StreamRng<'_>,
    ) -> Result<Direction> {
        let action = self.actions[self.cursor];
        self.cursor = (self.cursor + 1) % self.actions.len();
        Ok(action)
    }
}
