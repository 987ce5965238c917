//! Task lifecycle orchestration: the state machine, the agent pipeline
//! scheduler, the metrics evaluator, and the iteration runner that ties
//! them together.

pub mod agent;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod pipeline;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod state_machine;

pub use agent::{Agent, TaskSnapshot};
pub use config::{MetricWeights, OrchestratorConfig};
pub use error::{OrchestratorError, Result};
pub use evaluator::{Evaluation, MetricSamples, MetricsEvaluator, WeightedScorer};
pub use pipeline::{standard_configs, scripted_registry, ScriptedAgent, ScriptedEvaluator};
pub use registry::AgentRegistry;
pub use runner::Orchestrator;
pub use state_machine::TaskStateMachine;
