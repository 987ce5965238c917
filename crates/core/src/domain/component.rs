use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Icon,
    Logo,
    Svg,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssetSource {
    Detected,
    Suggested,
    Replaced,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetReplacement {
    pub name: String,
    pub library: String,
    pub url: String,
}

/// An extracted or substituted visual asset referenced by generated code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetObject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub source: AssetSource,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<AssetReplacement>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    Fade,
    Slide,
    Scale,
    Rotate,
    Bounce,
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnimationTrigger {
    Hover,
    Click,
    Scroll,
    Load,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    pub time: f64,
    pub properties: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSpec {
    pub node_id: String,
    #[serde(rename = "type")]
    pub kind: AnimationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    pub duration: f64,
    pub delay: f64,
    pub easing: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keyframes: Vec<Keyframe>,
    #[serde(rename = "loop", default)]
    pub repeat: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<AnimationTrigger>,
}

/// Generated source files for one component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFiles {
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityReport {
    pub score: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// The final artifact of a successful task. Produced exactly once per task
/// and immutable afterwards except for explicit regeneration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedComponent {
    pub id: Uuid,
    pub name: String,
    pub files: ComponentFiles,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub assets: Vec<AssetObject>,
    #[serde(default)]
    pub animations: Vec<AnimationSpec>,
    pub responsive: bool,
    pub accessibility: AccessibilityReport,
}

impl GeneratedComponent {
    pub fn new(name: impl Into<String>, files: ComponentFiles) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            files,
            dependencies: Vec::new(),
            assets: Vec::new(),
            animations: Vec::new(),
            responsive: true,
            accessibility: AccessibilityReport::default(),
        }
    }
}
