pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod observation;
pub mod policies;
pub mod rng;
pub mod scenario;
pub mod spatial;
pub mod world;

pub use components::{Direction, Position, Tag};
pub use engine::{Engine, EngineBuilder, EngineSettings, RunSummary};
pub use error::WorldError;
pub use observation::Observation;
pub use scenario::Scenario;
pub use world::{StepOutcome, StepResult, World};
