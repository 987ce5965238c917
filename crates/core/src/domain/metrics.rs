use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Similarity scores for one rendered candidate against the source capture.
///
/// `bounding_box_iou` and `ssim` are similarities in [0, 1] (higher is
/// better); `lpips` and `pixel_diff` are distances in [0, 1] (lower is
/// better). `overall_score` and `passed` are derived by the evaluator and
/// never set independently of each other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    #[serde(rename = "boundingBoxIoU")]
    pub bounding_box_iou: f64,
    pub lpips: f64,
    pub ssim: f64,
    pub pixel_diff: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_timing: Option<f64>,
    pub overall_score: f64,
    pub passed: bool,
}
