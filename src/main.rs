use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use mouseworld::{
    engine::{EngineBuilder, EngineSettings, Policy, RunSummary},
    policies::{RandomPolicy, ScriptedPolicy},
    rng::RngManager,
    scenario::{Scenario, ScenarioLoader},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "MouseWorld grid simulation runner")]
struct Cli {
    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a single scenario
    Run {
        /// Path to the scenario YAML file
        #[arg(long, default_value = "scenarios/open_field.yaml")]
        scenario: PathBuf,

        /// Override the step budget
        #[arg(long)]
        steps: Option<u64>,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the wall-clock budget in seconds (0 disables it)
        #[arg(long)]
        time_limit_secs: Option<f64>,

        /// Print the grid and every observation window
        #[arg(long)]
        render: bool,

        /// Emit the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sweep world sizes and wall counts with a random policy
    Bench {
        #[arg(long, value_delimiter = ',', default_values_t = [5, 10, 20, 100])]
        sizes: Vec<u32>,

        #[arg(long, value_delimiter = ',', default_values_t = [2, 5, 10, 20, 50, 100])]
        walls: Vec<usize>,

        #[arg(long, default_value_t = 1_000_000)]
        steps: u64,

        #[arg(long, default_value_t = 15.0)]
        time_limit_secs: f64,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Emit all summaries as a JSON array
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scenario,
            steps,
            seed,
            time_limit_secs,
            render,
            json,
        } => {
            let loader = ScenarioLoader::new(".");
            let mut scenario = loader.load(&scenario)?;
            init_tracing(cli.log_level.as_deref().unwrap_or(&scenario.logging.level));
            if let Some(steps) = steps {
                scenario.run.steps = steps;
            }
            if let Some(seed) = seed {
                scenario.seed = seed;
            }
            if let Some(limit) = time_limit_secs {
                scenario.run.time_limit_secs = limit;
            }
            let summary = run_scenario(&scenario, render)?;
            print_summaries(&[summary], json)
        }
        Commands::Bench {
            sizes,
            walls,
            steps,
            time_limit_secs,
            seed,
            json,
        } => {
            init_tracing(cli.log_level.as_deref().unwrap_or("info"));
            let mut summaries = Vec::new();
            for mut scenario in Scenario::sweep_grid(&sizes, &walls, seed) {
                scenario.run.steps = steps;
                scenario.run.time_limit_secs = time_limit_secs;
                info!(scenario = %scenario.name, "benchmarking");
                summaries.push(run_scenario(&scenario, false)?);
            }
            print_summaries(&summaries, json)
        }
    }
}

fn run_scenario(scenario: &Scenario, render: bool) -> Result<RunSummary> {
    let mut rng = RngManager::new(scenario.seed);
    let mut world = scenario.build_world(&mut rng)?;
    let policy: Box<dyn Policy> = if scenario.script.is_empty() {
        Box::new(RandomPolicy::new())
    } else {
        Box::new(ScriptedPolicy::new(scenario.script.clone())?)
    };
    let mut engine = EngineBuilder::new(EngineSettings::from_scenario(scenario))
        .with_boxed_policy(policy)
        .build();

    if !render {
        return engine.run(&mut world);
    }

    println!("{world}");
    let summary = engine.run_with_hook(&mut world, |frame| {
        println!(
            "step {}: {:?} -> {:?} (score {})",
            frame.step, frame.action, frame.outcome, frame.reward
        );
        println!("{}", frame.observation);
    })?;
    println!("{world}");
    Ok(summary)
}

fn print_summaries(summaries: &[RunSummary], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summaries)?);
    } else {
        for summary in summaries {
            println!("{summary}\n");
        }
    }
    Ok(())
}
