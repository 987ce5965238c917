use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pixelgen_core::{QualityMetrics, UserInput};

use crate::config::MetricWeights;
use crate::error::Result;

/// Raw sub-metric samples produced by an evaluator, before scoring.
///
/// `bounding_box_iou` and `ssim` are similarities (higher is better);
/// `lpips` and `pixel_diff` are distances (lower is better). All values are
/// clamped into [0, 1] by the scorer. `animation_timing` is only sampled
/// when the submission carries animation intent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricSamples {
    pub bounding_box_iou: f64,
    pub lpips: f64,
    pub ssim: f64,
    pub pixel_diff: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_timing: Option<f64>,
}

/// Evaluator output for one iteration: the samples plus concrete hints the
/// next iteration should act on.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub samples: MetricSamples,
    pub improvements: Vec<String>,
}

/// Compares a rendered candidate against the submitted visual reference.
///
/// Implementations must be deterministic: identical inputs yield identical
/// samples, so a re-run of an iteration reproduces its score exactly.
#[async_trait]
pub trait MetricsEvaluator: Send + Sync {
    async fn evaluate(&self, reference: &UserInput, candidate: &Value) -> Result<Evaluation>;
}

/// Pure scoring step: weighted mean of the samples against a pass threshold.
#[derive(Debug, Clone, Copy)]
pub struct WeightedScorer {
    weights: MetricWeights,
    threshold: f64,
}

impl WeightedScorer {
    pub fn new(weights: MetricWeights, threshold: f64) -> Self {
        Self { weights, threshold }
    }

    /// Fold samples into a `QualityMetrics` record.
    ///
    /// Distances are inverted so every term contributes "higher is better",
    /// and the weighted sum is normalized over the metrics actually sampled.
    /// A missing `animation_timing` therefore redistributes its weight
    /// instead of dragging the score down.
    pub fn score(&self, samples: &MetricSamples) -> QualityMetrics {
        let iou = clamp_unit(samples.bounding_box_iou);
        let lpips = clamp_unit(samples.lpips);
        let ssim = clamp_unit(samples.ssim);
        let pixel_diff = clamp_unit(samples.pixel_diff);
        let animation_timing = samples.animation_timing.map(clamp_unit);

        let mut weighted = self.weights.bounding_box_iou * iou
            + self.weights.ssim * ssim
            + self.weights.lpips * (1.0 - lpips)
            + self.weights.pixel_diff * (1.0 - pixel_diff);
        let mut total_weight = self.weights.bounding_box_iou
            + self.weights.ssim
            + self.weights.lpips
            + self.weights.pixel_diff;

        if let Some(timing) = animation_timing {
            weighted += self.weights.animation_timing * timing;
            total_weight += self.weights.animation_timing;
        }

        let overall_score = if total_weight > 0.0 {
            weighted / total_weight
        } else {
            0.0
        };

        QualityMetrics {
            bounding_box_iou: iou,
            lpips,
            ssim,
            pixel_diff,
            animation_timing,
            overall_score,
            passed: overall_score >= self.threshold,
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
