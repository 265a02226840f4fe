mod random;
mod scripted;

pub use random::RandomPolicy;
pub use scripted::ScriptedPolicy;
