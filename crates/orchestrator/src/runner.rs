use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use db::TaskStore;
use events::{Event, EventBus, EventEnvelope};
use pixelgen_core::{
    AgentResult, GeneratedComponent, QualityMetrics, TaskContext, TaskPatch, TaskStatus,
};

use crate::agent::TaskSnapshot;
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, Result};
use crate::evaluator::{Evaluation, MetricsEvaluator, WeightedScorer};
use crate::registry::AgentRegistry;
use crate::scheduler;
use crate::state_machine::TaskStateMachine;

/// Drives tasks through their lifecycle: stage scheduling, agent invocation
/// with retries and timeouts, evaluation, and the pass/iterate/finalize
/// decision.
///
/// All task mutations go through the store's guarded update, so a committed
/// cancellation always wins races against the running loop.
#[derive(Clone)]
pub struct Orchestrator {
    store: TaskStore,
    registry: AgentRegistry,
    evaluator: Arc<dyn MetricsEvaluator>,
    scorer: WeightedScorer,
    events: EventBus,
    config: OrchestratorConfig,
    stages: Arc<Vec<Vec<String>>>,
}

enum IterationOutcome {
    /// The task left the processing state under us; stop without writing.
    Interrupted,
    /// A critical agent exhausted its retries.
    CriticalFailure(String),
    Evaluated(Evaluation),
}

impl Orchestrator {
    pub fn new(
        store: TaskStore,
        registry: AgentRegistry,
        evaluator: Arc<dyn MetricsEvaluator>,
        events: EventBus,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        let stages = scheduler::stages(&registry.configs())?;
        let scorer = WeightedScorer::new(config.weights, config.pass_threshold);
        Ok(Self {
            store,
            registry,
            evaluator,
            scorer,
            events,
            config,
            stages: Arc::new(stages),
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Detach the lifecycle loop for a task onto the runtime.
    pub fn spawn(&self, task_id: Uuid) -> tokio::task::JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move {
            if let Err(err) = runner.run_task(task_id).await {
                warn!(task_id = %task_id, error = %err, "Task run aborted");
            }
        })
    }

    /// Run a task to a terminal state (or until it is cancelled out from
    /// under the loop).
    pub async fn run_task(&self, task_id: Uuid) -> Result<()> {
        let mut task = self.load(task_id).await?;

        match task.status {
            TaskStatus::Pending => {
                let patch = TaskPatch {
                    iteration: Some(task.iteration.max(1)),
                    progress: Some(0),
                    error: Some(None),
                    ..Default::default()
                };
                task = self.transition(&task, TaskStatus::Processing, patch).await?;
                if task.status != TaskStatus::Processing {
                    return Ok(());
                }
            }
            // Refinement re-entry arrives here already marked processing.
            TaskStatus::Processing => {}
            TaskStatus::Cancelled => return Ok(()),
            other => {
                return Err(OrchestratorError::InvalidTransition {
                    from: other.as_str().to_string(),
                    to: TaskStatus::Processing.as_str().to_string(),
                })
            }
        }

        loop {
            match self.run_iteration(&mut task).await? {
                IterationOutcome::Interrupted => {
                    info!(task_id = %task_id, "Task left processing mid-iteration, stopping");
                    return Ok(());
                }
                IterationOutcome::CriticalFailure(reason) => {
                    self.fail(&task, reason).await?;
                    return Ok(());
                }
                IterationOutcome::Evaluated(evaluation) => {
                    let metrics = self.scorer.score(&evaluation.samples);

                    let patch = TaskPatch {
                        metrics: Some(metrics.clone()),
                        improvements: Some(evaluation.improvements),
                        ..Default::default()
                    };
                    task = self.write_active(task_id, patch).await?;

                    self.publish(Event::IterationCompleted {
                        task_id,
                        iteration: task.iteration,
                        overall_score: metrics.overall_score,
                        passed: metrics.passed,
                    });

                    if task.status != TaskStatus::Processing {
                        return Ok(());
                    }

                    if metrics.passed || task.iteration >= task.max_iterations {
                        self.finalize(&task, metrics).await?;
                        return Ok(());
                    }

                    let patch = TaskPatch {
                        iteration: Some(task.iteration + 1),
                        progress: Some(0),
                        ..Default::default()
                    };
                    task = self.write_active(task_id, patch).await?;
                    if task.status != TaskStatus::Processing {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Apply a cancel request. Idempotent for already-cancelled tasks;
    /// rejected for completed and failed ones.
    pub async fn cancel(&self, task_id: Uuid) -> Result<TaskContext> {
        let task = self.load(task_id).await?;
        if task.status == TaskStatus::Cancelled {
            return Ok(task);
        }
        TaskStateMachine::validate_transition(&task.status, &TaskStatus::Cancelled)?;

        let patch = TaskPatch {
            status: Some(TaskStatus::Cancelled),
            current_agent: Some(None),
            ..Default::default()
        };
        let updated = self.write_active(task_id, patch).await?;

        if updated.status == TaskStatus::Cancelled {
            self.publish(Event::TaskStatusChanged {
                task_id,
                from_status: task.status.as_str().to_string(),
                to_status: TaskStatus::Cancelled.as_str().to_string(),
            });
            self.publish(Event::TaskCancelled { task_id });
            Ok(updated)
        } else {
            // Lost the race to completion or failure.
            Err(OrchestratorError::InvalidTransition {
                from: updated.status.as_str().to_string(),
                to: TaskStatus::Cancelled.as_str().to_string(),
            })
        }
    }

    /// Reopen a completed task for one more refinement round driven by user
    /// feedback. The caller is expected to `spawn` the task afterwards.
    pub async fn begin_refinement(
        &self,
        task_id: Uuid,
        hints: Vec<String>,
    ) -> Result<TaskContext> {
        let task = self.load(task_id).await?;
        if task.status != TaskStatus::Completed {
            return Err(OrchestratorError::InvalidTransition {
                from: task.status.as_str().to_string(),
                to: TaskStatus::Processing.as_str().to_string(),
            });
        }
        TaskStateMachine::validate_transition(&task.status, &TaskStatus::Processing)?;

        let mut improvements = task.improvements.clone();
        for hint in hints {
            if !improvements.contains(&hint) {
                improvements.push(hint);
            }
        }

        let budget = self.config.refinement_iterations.max(1);
        let patch = TaskPatch {
            status: Some(TaskStatus::Processing),
            iteration: Some(task.iteration + 1),
            max_iterations: Some(task.iteration + budget),
            improvements: Some(improvements),
            progress: Some(0),
            error: Some(None),
            ..Default::default()
        };
        let updated = self
            .store
            .tasks
            .update(task_id, &patch)
            .await?
            .ok_or(OrchestratorError::TaskNotFound(task_id))?;

        self.publish(Event::TaskStatusChanged {
            task_id,
            from_status: TaskStatus::Completed.as_str().to_string(),
            to_status: TaskStatus::Processing.as_str().to_string(),
        });

        Ok(updated)
    }

    async fn run_iteration(&self, task: &mut TaskContext) -> Result<IterationOutcome> {
        let total_stages = self.stages.len();

        for (index, stage) in self.stages.iter().enumerate() {
            // Refresh before the stage so a cancel that landed between
            // stages stops the loop before more work is scheduled.
            *task = self.load(task.task_id).await?;
            if task.status != TaskStatus::Processing {
                return Ok(IterationOutcome::Interrupted);
            }

            let patch = TaskPatch {
                current_agent: Some(stage.first().cloned()),
                ..Default::default()
            };
            *task = self.write_active(task.task_id, patch).await?;

            let snapshot = TaskSnapshot::of(task);
            let results = if self.config.parallel_stages && stage.len() > 1 {
                join_all(stage.iter().map(|name| {
                    let snapshot = &snapshot;
                    async move { (name.clone(), self.invoke(name, snapshot).await) }
                }))
                .await
            } else {
                let mut results = Vec::with_capacity(stage.len());
                for name in stage {
                    results.push((name.clone(), self.invoke(name, &snapshot).await));
                }
                results
            };

            // Results arriving after a cancellation are discarded, not
            // recorded.
            let fresh = self.load(task.task_id).await?;
            if fresh.status != TaskStatus::Processing {
                return Ok(IterationOutcome::Interrupted);
            }

            for (name, result) in results {
                self.store
                    .agent_results
                    .upsert(task.task_id, &name, &result)
                    .await?;
                self.publish(Event::AgentFinished {
                    task_id: task.task_id,
                    agent: name.clone(),
                    iteration: task.iteration,
                    success: result.success,
                });

                if !result.success {
                    let critical = self
                        .registry
                        .get(&name)
                        .map(|a| a.config().critical)
                        .unwrap_or(true);
                    let reason = result
                        .error
                        .clone()
                        .unwrap_or_else(|| "unknown agent error".to_string());
                    if critical {
                        return Ok(IterationOutcome::CriticalFailure(format!(
                            "agent '{name}' failed: {reason}"
                        )));
                    }
                    warn!(
                        task_id = %task.task_id,
                        agent = %name,
                        error = %reason,
                        "Non-critical agent failed, continuing iteration"
                    );
                }
                task.agents.insert(name, result);
            }

            // Evaluation counts as the final step of the iteration.
            let progress = (((index + 1) * 100) / (total_stages + 1)) as u8;
            let patch = TaskPatch {
                progress: Some(progress),
                ..Default::default()
            };
            *task = self.write_active(task.task_id, patch).await?;
            if task.status != TaskStatus::Processing {
                return Ok(IterationOutcome::Interrupted);
            }
        }

        let candidate = self
            .rendered_candidate(task)
            .ok_or(OrchestratorError::NoRenderedCandidate);
        let candidate = match candidate {
            Ok(c) => c,
            Err(err) => return Ok(IterationOutcome::CriticalFailure(err.to_string())),
        };

        let evaluation = self.evaluator.evaluate(&task.input, &candidate).await?;
        Ok(IterationOutcome::Evaluated(evaluation))
    }

    /// One agent invocation with the configured timeout and retry budget.
    /// Never errors; an exhausted budget becomes a failed `AgentResult`.
    async fn invoke(&self, name: &str, snapshot: &TaskSnapshot) -> AgentResult {
        let Some(agent) = self.registry.get(name) else {
            return AgentResult::failed(
                format!("agent '{name}' is not registered"),
                snapshot.iteration,
                0,
            );
        };
        let config = agent.config();
        let started = Instant::now();
        let mut last_error = String::new();

        for attempt in 0..=config.retries {
            match timeout(Duration::from_millis(config.timeout_ms), agent.run(snapshot)).await {
                Ok(Ok(data)) => {
                    return AgentResult::ok(
                        data,
                        snapshot.iteration,
                        started.elapsed().as_millis() as u64,
                    );
                }
                Ok(Err(err)) => last_error = err.to_string(),
                Err(_) => last_error = format!("timed out after {}ms", config.timeout_ms),
            }
            warn!(
                agent = %name,
                attempt,
                retries = config.retries,
                error = %last_error,
                "Agent attempt failed"
            );
        }

        AgentResult::failed(
            last_error,
            snapshot.iteration,
            started.elapsed().as_millis() as u64,
        )
    }

    /// The rendered candidate for evaluation: the final stage's first
    /// successful payload.
    fn rendered_candidate(&self, task: &TaskContext) -> Option<serde_json::Value> {
        let final_stage = self.stages.last()?;
        final_stage
            .iter()
            .filter_map(|name| task.agents.get(name))
            .filter(|r| r.success && r.iteration == task.iteration)
            .find_map(|r| r.data.clone())
    }

    async fn finalize(&self, task: &TaskContext, metrics: QualityMetrics) -> Result<()> {
        let Some(component) = self.extract_component(task) else {
            self.fail(task, "pipeline produced no component output".to_string())
                .await?;
            return Ok(());
        };

        self.store
            .components
            .insert(task.task_id, &component)
            .await?;

        let patch = TaskPatch {
            output: Some(component),
            metrics: Some(metrics.clone()),
            progress: Some(100),
            current_agent: Some(None),
            error: Some(None),
            ..Default::default()
        };
        let updated = self
            .transition(task, TaskStatus::Completed, patch)
            .await?;

        if updated.status == TaskStatus::Completed {
            info!(
                task_id = %task.task_id,
                iteration = task.iteration,
                score = metrics.overall_score,
                passed = metrics.passed,
                "Task completed"
            );
        }
        Ok(())
    }

    async fn fail(&self, task: &TaskContext, reason: String) -> Result<()> {
        warn!(task_id = %task.task_id, reason = %reason, "Task failed");

        let patch = TaskPatch {
            error: Some(Some(reason.clone())),
            current_agent: Some(None),
            ..Default::default()
        };
        let updated = self.transition(task, TaskStatus::Failed, patch).await?;

        if updated.status == TaskStatus::Failed {
            self.publish(Event::Error {
                message: reason,
                context: Some(task.task_id.to_string()),
            });
        }
        Ok(())
    }

    /// The latest successful agent payload that parses as a component,
    /// searched from the end of the pipeline backwards.
    fn extract_component(&self, task: &TaskContext) -> Option<GeneratedComponent> {
        self.stages
            .iter()
            .rev()
            .flatten()
            .filter_map(|name| task.agents.get(name))
            .filter(|r| r.success)
            .filter_map(|r| r.data.as_ref())
            .find_map(|data| serde_json::from_value(data.clone()).ok())
    }

    async fn load(&self, task_id: Uuid) -> Result<TaskContext> {
        self.store
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(OrchestratorError::TaskNotFound(task_id))
    }

    /// Guarded write: no-op on tasks that reached a terminal state, so the
    /// returned status tells the caller whether to keep going.
    async fn write_active(&self, task_id: Uuid, patch: TaskPatch) -> Result<TaskContext> {
        self.store
            .tasks
            .update_active(task_id, &patch)
            .await?
            .ok_or(OrchestratorError::TaskNotFound(task_id))
    }

    /// Validated status transition through the guarded write path.
    async fn transition(
        &self,
        task: &TaskContext,
        to: TaskStatus,
        mut patch: TaskPatch,
    ) -> Result<TaskContext> {
        TaskStateMachine::validate_transition(&task.status, &to)?;
        patch.status = Some(to);

        let updated = self.write_active(task.task_id, patch).await?;
        if updated.status == to {
            self.publish(Event::TaskStatusChanged {
                task_id: task.task_id,
                from_status: task.status.as_str().to_string(),
                to_status: to.as_str().to_string(),
            });
        }
        Ok(updated)
    }

    fn publish(&self, event: Event) {
        self.events.publish(EventEnvelope::new(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{
        scripted_registry, standard_configs, ScriptedAgent, ScriptedEvaluator, ASSET, VISION,
    };
    use db::{create_pool, run_migrations};
    use pixelgen_core::{AgentConfig, GenerationOptions, InputMetadata, UserInput};
    use serde_json::json;

    async fn store() -> TaskStore {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        TaskStore::new(pool)
    }

    async fn seeded_task(store: &TaskStore, max_iterations: u32) -> TaskContext {
        let task = TaskContext::new(
            UserInput::image(vec![0], GenerationOptions::default(), InputMetadata::default()),
            max_iterations,
        );
        store.tasks.create(&task).await.unwrap();
        task
    }

    fn orchestrator(
        store: TaskStore,
        registry: AgentRegistry,
        evaluator: ScriptedEvaluator,
        config: OrchestratorConfig,
    ) -> Orchestrator {
        Orchestrator::new(store, registry, Arc::new(evaluator), EventBus::new(), config).unwrap()
    }

    /// The standard registry with one agent's script replaced.
    fn registry_with_failing(name: &str, config: AgentConfig) -> AgentRegistry {
        let mut builder = AgentRegistry::builder();
        for agent_config in standard_configs() {
            if agent_config.name == name {
                builder = builder.register(Arc::new(ScriptedAgent::new(config.clone(), |_| {
                    Err(OrchestratorError::AgentExecution("synthetic failure".into()))
                })));
            } else {
                builder = builder.register(Arc::new(ScriptedAgent::fixed(
                    agent_config,
                    json!({"stub": true}),
                )));
            }
        }
        builder.build().unwrap()
    }

    #[tokio::test]
    async fn test_passing_run_completes_in_one_iteration() {
        let store = store().await;
        let task = seeded_task(&store, 5).await;

        let runner = orchestrator(
            store.clone(),
            scripted_registry().unwrap(),
            ScriptedEvaluator::passing(),
            OrchestratorConfig::default(),
        );
        runner.run_task(task.task_id).await.unwrap();

        let done = store.tasks.find_by_id(task.task_id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.iteration, 1);
        assert_eq!(done.progress, 100);
        assert!(done.output.is_some());
        assert!(done.metrics.as_ref().unwrap().passed);
        assert!(done.error.is_none());
        assert!(done.current_agent.is_none());

        let component = store
            .components
            .find_by_task(task.task_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Some(component.id), done.output.map(|o| o.id));
    }

    #[tokio::test]
    async fn test_exhausted_budget_completes_with_failed_metrics() {
        let store = store().await;
        let task = seeded_task(&store, 2).await;

        let runner = orchestrator(
            store.clone(),
            scripted_registry().unwrap(),
            ScriptedEvaluator::failing(),
            OrchestratorConfig::default(),
        );
        runner.run_task(task.task_id).await.unwrap();

        let done = store.tasks.find_by_id(task.task_id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.iteration, 2);
        assert!(done.output.is_some());
        assert!(!done.metrics.as_ref().unwrap().passed);
        assert!(!done.improvements.is_empty());
    }

    #[tokio::test]
    async fn test_score_improvement_across_iterations() {
        let store = store().await;
        let task = seeded_task(&store, 5).await;

        let evaluator = ScriptedEvaluator::sequence(vec![
            ScriptedEvaluator::failing_samples(),
            ScriptedEvaluator::passing_samples(),
        ]);
        let runner = orchestrator(
            store.clone(),
            scripted_registry().unwrap(),
            evaluator,
            OrchestratorConfig::default(),
        );
        runner.run_task(task.task_id).await.unwrap();

        let done = store.tasks.find_by_id(task.task_id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.iteration, 2);
        assert!(done.metrics.unwrap().passed);
    }

    #[tokio::test]
    async fn test_critical_agent_failure_fails_task() {
        let store = store().await;
        let task = seeded_task(&store, 5).await;

        let registry = registry_with_failing(VISION, AgentConfig::new(VISION).retries(0));
        let runner = orchestrator(
            store.clone(),
            registry,
            ScriptedEvaluator::passing(),
            OrchestratorConfig::default(),
        );
        runner.run_task(task.task_id).await.unwrap();

        let done = store.tasks.find_by_id(task.task_id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Failed);
        assert!(done.error.as_ref().unwrap().contains("vision"));
        assert!(done.output.is_none());
        assert!(!done.agents["vision"].success);
    }

    #[tokio::test]
    async fn test_non_critical_failure_does_not_fail_task() {
        let store = store().await;
        let task = seeded_task(&store, 5).await;

        let registry = registry_with_failing(
            ASSET,
            AgentConfig::new(ASSET)
                .depends_on([VISION])
                .retries(0)
                .optional(),
        );
        let runner = orchestrator(
            store.clone(),
            registry,
            ScriptedEvaluator::passing(),
            OrchestratorConfig::default(),
        );
        runner.run_task(task.task_id).await.unwrap();

        let done = store.tasks.find_by_id(task.task_id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(!done.agents["asset"].success);
    }

    #[tokio::test]
    async fn test_agent_timeout_is_reported() {
        let store = store().await;
        let task = seeded_task(&store, 5).await;

        let mut builder = AgentRegistry::builder();
        for config in standard_configs() {
            if config.name == VISION {
                struct SlowAgent(AgentConfig);

                #[async_trait::async_trait]
                impl crate::agent::Agent for SlowAgent {
                    fn config(&self) -> &AgentConfig {
                        &self.0
                    }
                    async fn run(&self, _: &TaskSnapshot) -> Result<serde_json::Value> {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Ok(json!({}))
                    }
                }

                builder = builder.register(Arc::new(SlowAgent(
                    AgentConfig::new(VISION).timeout_ms(10).retries(0),
                )));
            } else {
                builder =
                    builder.register(Arc::new(ScriptedAgent::fixed(config, json!({"stub": true}))));
            }
        }

        let runner = orchestrator(
            store.clone(),
            builder.build().unwrap(),
            ScriptedEvaluator::passing(),
            OrchestratorConfig::default(),
        );
        runner.run_task(task.task_id).await.unwrap();

        let done = store.tasks.find_by_id(task.task_id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Failed);
        assert!(done.error.as_ref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_cancel_pending_task() {
        let store = store().await;
        let task = seeded_task(&store, 5).await;

        let runner = orchestrator(
            store.clone(),
            scripted_registry().unwrap(),
            ScriptedEvaluator::passing(),
            OrchestratorConfig::default(),
        );

        let cancelled = runner.cancel(task.task_id).await.unwrap();
        assert_eq!(cancelled.status, TaskStatus::Cancelled);

        // Running after cancellation is a no-op.
        runner.run_task(task.task_id).await.unwrap();
        let after = store.tasks.find_by_id(task.task_id).await.unwrap().unwrap();
        assert_eq!(after.status, TaskStatus::Cancelled);
        assert!(after.agents.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_but_rejects_completed() {
        let store = store().await;
        let task = seeded_task(&store, 5).await;

        let runner = orchestrator(
            store.clone(),
            scripted_registry().unwrap(),
            ScriptedEvaluator::passing(),
            OrchestratorConfig::default(),
        );

        runner.cancel(task.task_id).await.unwrap();
        let again = runner.cancel(task.task_id).await.unwrap();
        assert_eq!(again.status, TaskStatus::Cancelled);

        let completed = seeded_task(&store, 5).await;
        runner.run_task(completed.task_id).await.unwrap();
        let err = runner.cancel(completed.task_id).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_refinement_reopens_completed_task() {
        let store = store().await;
        let task = seeded_task(&store, 5).await;

        let runner = orchestrator(
            store.clone(),
            scripted_registry().unwrap(),
            ScriptedEvaluator::passing(),
            OrchestratorConfig::default(),
        );
        runner.run_task(task.task_id).await.unwrap();

        let reopened = runner
            .begin_refinement(task.task_id, vec!["darken the header".to_string()])
            .await
            .unwrap();
        assert_eq!(reopened.status, TaskStatus::Processing);
        assert_eq!(reopened.iteration, 2);
        assert_eq!(reopened.max_iterations, 2);
        assert!(reopened
            .improvements
            .contains(&"darken the header".to_string()));

        runner.run_task(task.task_id).await.unwrap();
        let done = store.tasks.find_by_id(task.task_id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.iteration, 2);
    }

    #[tokio::test]
    async fn test_refinement_rejected_for_non_completed_tasks() {
        let store = store().await;
        let task = seeded_task(&store, 5).await;

        let runner = orchestrator(
            store.clone(),
            scripted_registry().unwrap(),
            ScriptedEvaluator::passing(),
            OrchestratorConfig::default(),
        );

        let err = runner
            .begin_refinement(task.task_id, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_events_emitted_over_successful_run() {
        let store = store().await;
        let task = seeded_task(&store, 5).await;

        let bus = EventBus::new();
        let mut rx = bus.subscribe_task(task.task_id);
        let runner = Orchestrator::new(
            store.clone(),
            scripted_registry().unwrap(),
            Arc::new(ScriptedEvaluator::passing()),
            bus,
            OrchestratorConfig::default(),
        )
        .unwrap();
        runner.run_task(task.task_id).await.unwrap();

        let mut saw_processing = false;
        let mut saw_iteration = false;
        let mut saw_completed = false;
        while let Ok(envelope) = rx.try_recv() {
            match envelope.event {
                Event::TaskStatusChanged { to_status, .. } if to_status == "processing" => {
                    saw_processing = true;
                }
                Event::TaskStatusChanged { to_status, .. } if to_status == "completed" => {
                    saw_completed = true;
                }
                Event::IterationCompleted { passed, .. } => {
                    saw_iteration = passed;
                }
                _ => {}
            }
        }
        assert!(saw_processing);
        assert!(saw_iteration);
        assert!(saw_completed);
    }
}
