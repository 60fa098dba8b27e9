use crate::vault::{Asset, SaveOutcome, SaveRequest};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

/// Body of `POST /api/v1/save` as sent by the browser extension.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct ClipPayload {
    pub metadata: Metadata,
    pub content: Content,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub assets: Vec<AssetPayload>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: String,
    #[serde(default)]
    pub domain: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub saved_at: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    pub markdown: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPayload {
    pub filename: String,
    pub base64: String,
    #[serde(default)]
    pub mime_type: String,
}

impl From<ClipPayload> for SaveRequest {
    fn from(p: ClipPayload) -> Self {
        SaveRequest {
            title: p.metadata.title,
            saved_at: p.metadata.saved_at,
            tags: p.metadata.tags,
            markdown: p.content.markdown,
            assets: p
                .assets
                .into_iter()
                .map(|a| Asset { filename: a.filename, payload: a.base64, mime_type: a.mime_type })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { code: super::codes::SUCCESS, msg: "success".to_string(), data: Some(data) }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> Self {
        Self { code, msg: msg.into(), data: None }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub saved_path: String,
    pub article_dir: String,
    pub assets_count: usize,
}

impl From<SaveOutcome> for SaveResult {
    fn from(o: SaveOutcome) -> Self {
        SaveResult {
            saved_path: o.saved_path.display().to_string(),
            article_dir: o.article_dir,
            assets_count: o.assets_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
