use serde::{Deserialize, Serialize};

/// Relative weight of each sub-metric in the overall score. Weights do not
/// have to sum to one; the scorer normalizes over the metrics that were
/// actually sampled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricWeights {
    pub bounding_box_iou: f64,
    pub ssim: f64,
    pub lpips: f64,
    pub pixel_diff: f64,
    pub animation_timing: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            bounding_box_iou: 0.25,
            ssim: 0.25,
            lpips: 0.2,
            pixel_diff: 0.2,
            animation_timing: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorConfig {
    /// Iteration budget for a fresh task.
    pub max_iterations: u32,
    /// Overall score at or above which an iteration passes.
    pub pass_threshold: f64,
    pub weights: MetricWeights,
    /// Run independent agents of a stage concurrently.
    pub parallel_stages: bool,
    /// Extra iterations granted when feedback re-opens a completed task.
    pub refinement_iterations: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            pass_threshold: 0.85,
            weights: MetricWeights::default(),
            parallel_stages: true,
            refinement_iterations: 1,
        }
    }
}
