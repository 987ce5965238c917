//! The standard generation pipeline topology plus scripted stand-ins used
//! until real model-backed agents are wired in. The scripted agents produce
//! structurally valid payloads so the rest of the lifecycle (scheduling,
//! persistence, evaluation, finalization) runs end to end.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use pixelgen_core::{AgentConfig, ComponentFiles, Framework, GeneratedComponent, UserInput};

use crate::agent::{Agent, TaskSnapshot};
use crate::error::Result;
use crate::evaluator::{Evaluation, MetricSamples, MetricsEvaluator};
use crate::registry::AgentRegistry;

pub const VISION: &str = "vision";
pub const HIERARCHY: &str = "hierarchy";
pub const ASPECT_RATIO: &str = "aspect-ratio";
pub const ASSET: &str = "asset";
pub const TEXT: &str = "text";
pub const COLOR: &str = "color";
pub const ANIMATION: &str = "animation";
pub const STYLE: &str = "style";
pub const CODE_GEN: &str = "code-gen";
pub const SANDBOX_RENDER: &str = "sandbox-render";

/// The standard agent topology: vision fans out to the analysis tier, which
/// feeds style and animation, which feed code generation and the sandbox
/// render used for evaluation.
pub fn standard_configs() -> Vec<AgentConfig> {
    vec![
        AgentConfig::new(VISION).priority(10),
        AgentConfig::new(HIERARCHY).depends_on([VISION]),
        AgentConfig::new(ASPECT_RATIO).depends_on([VISION]),
        AgentConfig::new(ASSET).depends_on([VISION]).optional(),
        AgentConfig::new(TEXT).depends_on([VISION]),
        AgentConfig::new(COLOR).depends_on([VISION]),
        AgentConfig::new(ANIMATION)
            .depends_on([HIERARCHY])
            .optional(),
        AgentConfig::new(STYLE).depends_on([HIERARCHY, ASPECT_RATIO, TEXT, COLOR]),
        AgentConfig::new(CODE_GEN)
            .depends_on([STYLE, ANIMATION, ASSET])
            .timeout_ms(60_000),
        AgentConfig::new(SANDBOX_RENDER).depends_on([CODE_GEN]),
    ]
}

type Script = dyn Fn(&TaskSnapshot) -> Result<Value> + Send + Sync;

/// Agent whose behavior is a closure over the snapshot. The production
/// pipeline and the test suite both build on this.
pub struct ScriptedAgent {
    config: AgentConfig,
    script: Box<Script>,
}

impl ScriptedAgent {
    pub fn new<F>(config: AgentConfig, script: F) -> Self
    where
        F: Fn(&TaskSnapshot) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            config,
            script: Box::new(script),
        }
    }

    pub fn fixed(config: AgentConfig, value: Value) -> Self {
        Self::new(config, move |_| Ok(value.clone()))
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn run(&self, snapshot: &TaskSnapshot) -> Result<Value> {
        (self.script)(snapshot)
    }
}

fn component_source(name: &str, framework: Framework) -> String {
    match framework {
        Framework::React => format!(
            "import React from 'react';\n\nexport const {name} = () => (\n  <div className=\"{name}\" />\n);\n"
        ),
        Framework::Vue => format!(
            "<template>\n  <div class=\"{name}\" />\n</template>\n\n<script setup lang=\"ts\"></script>\n"
        ),
        Framework::Angular => format!(
            "import {{ Component }} from '@angular/core';\n\n@Component({{ selector: '{name}', template: '<div></div>' }})\nexport class {name}Component {{}}\n"
        ),
    }
}

fn scripted_component(input: &UserInput) -> GeneratedComponent {
    let name = "GeneratedComponent";
    let mut component = GeneratedComponent::new(
        name,
        ComponentFiles {
            component: component_source(name, input.options.framework),
            styles: Some(format!(".{name} {{ display: flex; }}\n")),
            ..Default::default()
        },
    );
    component.responsive = input.options.responsive;
    component.dependencies = match input.options.framework {
        Framework::React => vec!["react".to_string()],
        Framework::Vue => vec!["vue".to_string()],
        Framework::Angular => vec!["@angular/core".to_string()],
    };
    component
}

/// Registry of scripted agents over the standard topology.
pub fn scripted_registry() -> Result<AgentRegistry> {
    let mut builder = AgentRegistry::builder();

    for config in standard_configs() {
        let agent: Arc<dyn Agent> = match config.name.as_str() {
            VISION => Arc::new(ScriptedAgent::fixed(
                config,
                json!({"elements": [{"id": "root", "bounds": [0, 0, 1280, 720]}]}),
            )),
            HIERARCHY => Arc::new(ScriptedAgent::fixed(
                config,
                json!({"tree": {"id": "root", "children": []}}),
            )),
            ASPECT_RATIO => Arc::new(ScriptedAgent::fixed(
                config,
                json!({"viewport": {"width": 1280, "height": 720}}),
            )),
            ASSET => Arc::new(ScriptedAgent::fixed(config, json!({"assets": []}))),
            TEXT => Arc::new(ScriptedAgent::fixed(config, json!({"blocks": []}))),
            COLOR => Arc::new(ScriptedAgent::fixed(
                config,
                json!({"palette": ["#ffffff", "#111827"]}),
            )),
            ANIMATION => Arc::new(ScriptedAgent::new(config, |snapshot| {
                if snapshot.input.options.include_animations {
                    Ok(json!({"animations": [{"nodeId": "root", "type": "fade"}]}))
                } else {
                    Ok(json!({"animations": []}))
                }
            })),
            STYLE => Arc::new(ScriptedAgent::fixed(
                config,
                json!({"stylesheet": ":root { --spacing: 8px; }"}),
            )),
            CODE_GEN => Arc::new(ScriptedAgent::new(config, |snapshot| {
                Ok(serde_json::to_value(scripted_component(&snapshot.input))?)
            })),
            SANDBOX_RENDER => Arc::new(ScriptedAgent::new(config, |snapshot| {
                Ok(json!({
                    "screenshot": format!("render-{}-{}", snapshot.task_id, snapshot.iteration),
                    "width": 1280,
                    "height": 720,
                }))
            })),
            other => Arc::new(ScriptedAgent::fixed(
                AgentConfig::new(other),
                json!({}),
            )),
        };
        builder = builder.register(agent);
    }

    builder.build()
}

/// Evaluator double that replays a fixed sequence of samples, repeating the
/// last entry once the sequence is exhausted.
pub struct ScriptedEvaluator {
    sequence: Mutex<VecDeque<MetricSamples>>,
    last: MetricSamples,
    improvements: Vec<String>,
}

impl ScriptedEvaluator {
    pub fn sequence(samples: Vec<MetricSamples>) -> Self {
        let last = samples
            .last()
            .copied()
            .unwrap_or_else(Self::passing_samples);
        Self {
            sequence: Mutex::new(samples.into_iter().collect()),
            last,
            improvements: Vec::new(),
        }
    }

    pub fn passing() -> Self {
        Self::sequence(vec![Self::passing_samples()])
    }

    pub fn failing() -> Self {
        let mut evaluator = Self::sequence(vec![Self::failing_samples()]);
        evaluator.improvements = vec!["tighten spacing to match the capture".to_string()];
        evaluator
    }

    pub fn passing_samples() -> MetricSamples {
        MetricSamples {
            bounding_box_iou: 0.96,
            lpips: 0.04,
            ssim: 0.97,
            pixel_diff: 0.03,
            animation_timing: None,
        }
    }

    pub fn failing_samples() -> MetricSamples {
        MetricSamples {
            bounding_box_iou: 0.6,
            lpips: 0.4,
            ssim: 0.62,
            pixel_diff: 0.35,
            animation_timing: None,
        }
    }
}

#[async_trait]
impl MetricsEvaluator for ScriptedEvaluator {
    async fn evaluate(&self, _reference: &UserInput, _candidate: &Value) -> Result<Evaluation> {
        let samples = self
            .sequence
            .lock()
            .map(|mut q| q.pop_front().unwrap_or(self.last))
            .unwrap_or(self.last);
        Ok(Evaluation {
            samples,
            improvements: self.improvements.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler;
    use pixelgen_core::{GenerationOptions, InputMetadata, TaskContext};

    #[test]
    fn test_standard_topology_is_acyclic() {
        let stages = scheduler::stages(&standard_configs()).unwrap();
        assert_eq!(stages[0], vec![VISION.to_string()]);
        assert_eq!(stages.last().unwrap(), &vec![SANDBOX_RENDER.to_string()]);
        let total: usize = stages.iter().map(Vec::len).sum();
        assert_eq!(total, standard_configs().len());
    }

    #[test]
    fn test_scripted_registry_builds() {
        let registry = scripted_registry().unwrap();
        assert_eq!(registry.len(), standard_configs().len());
        assert!(registry.get(CODE_GEN).is_some());
    }

    #[tokio::test]
    async fn test_code_gen_emits_a_valid_component() {
        let registry = scripted_registry().unwrap();
        let task = TaskContext::new(
            UserInput::image(vec![0], GenerationOptions::default(), InputMetadata::default()),
            5,
        );
        let snapshot = TaskSnapshot::of(&task);

        let value = registry
            .get(CODE_GEN)
            .unwrap()
            .run(&snapshot)
            .await
            .unwrap();
        let component: GeneratedComponent = serde_json::from_value(value).unwrap();
        assert_eq!(component.dependencies, vec!["react".to_string()]);
        assert!(component.responsive);
    }

    #[tokio::test]
    async fn test_scripted_evaluator_replays_sequence() {
        let evaluator = ScriptedEvaluator::sequence(vec![
            ScriptedEvaluator::failing_samples(),
            ScriptedEvaluator::passing_samples(),
        ]);
        let input =
            UserInput::image(vec![0], GenerationOptions::default(), InputMetadata::default());
        let candidate = json!({});

        let first = evaluator.evaluate(&input, &candidate).await.unwrap();
        let second = evaluator.evaluate(&input, &candidate).await.unwrap();
        let third = evaluator.evaluate(&input, &candidate).await.unwrap();

        assert_eq!(first.samples, ScriptedEvaluator::failing_samples());
        assert_eq!(second.samples, ScriptedEvaluator::passing_samples());
        assert_eq!(third.samples, ScriptedEvaluator::passing_samples());
    }
}
