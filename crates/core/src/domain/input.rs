use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Image,
    Video,
    Url,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Url => "url",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "url" => Some(Self::Url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
pub enum GenerationMode {
    #[default]
    #[serde(rename = "pixel-perfect")]
    PixelPerfect,
    #[serde(rename = "fast-approximate")]
    FastApproximate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[default]
    React,
    Vue,
    Angular,
}

/// Processing options chosen at submission time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    pub mode: GenerationMode,
    pub include_animations: bool,
    pub responsive: bool,
    pub theme: Theme,
    pub framework: Framework,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            mode: GenerationMode::default(),
            include_animations: false,
            responsive: true,
            theme: Theme::default(),
            framework: Framework::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct InputMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_selector: Option<String>,
}

/// Normalized submission. Created once at submission time, never mutated.
///
/// `data` carries the raw payload: file bytes for image/video submissions,
/// the UTF-8 URL string for url submissions. It is persisted out-of-band as a
/// blob and never echoed in API responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub kind: InputKind,
    #[serde(default, skip_serializing)]
    #[schema(ignore)]
    pub data: Vec<u8>,
    #[serde(default)]
    pub options: GenerationOptions,
    #[serde(default)]
    pub metadata: InputMetadata,
}

impl UserInput {
    pub fn image(data: Vec<u8>, options: GenerationOptions, metadata: InputMetadata) -> Self {
        Self {
            kind: InputKind::Image,
            data,
            options,
            metadata,
        }
    }

    pub fn video(data: Vec<u8>, mut options: GenerationOptions, metadata: InputMetadata) -> Self {
        // Motion capture always carries animation intent.
        options.include_animations = true;
        Self {
            kind: InputKind::Video,
            data,
            options,
            metadata,
        }
    }

    pub fn url(url: String, options: GenerationOptions, metadata: InputMetadata) -> Self {
        Self {
            kind: InputKind::Url,
            data: url.into_bytes(),
            options,
            metadata,
        }
    }

    /// The submitted URL for url-kind inputs.
    pub fn source_url(&self) -> Option<&str> {
        match self.kind {
            InputKind::Url => std::str::from_utf8(&self.data).ok(),
            _ => self.metadata.original_url.as_deref(),
        }
    }
}
