//! Azure AI Vision image analysis HTTP client.

use std::time::Duration;

use reqwest::Client;

use crate::error::{Result, VisionError};
use crate::models::ImageAnalysis;

pub const API_VERSION: &str = "2024-02-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Visual features the analyzer can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualFeature {
    Objects,
    People,
    Caption,
    Tags,
    DenseCaptions,
}

impl VisualFeature {
    pub const ALL: [VisualFeature; 5] = [
        VisualFeature::Objects,
        VisualFeature::People,
        VisualFeature::Caption,
        VisualFeature::Tags,
        VisualFeature::DenseCaptions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualFeature::Objects => "objects",
            VisualFeature::People => "people",
            VisualFeature::Caption => "caption",
            VisualFeature::Tags => "tags",
            VisualFeature::DenseCaptions => "denseCaptions",
        }
    }
}

/// HTTP client for the image analysis endpoint.
pub struct AzureVisionClient {
    client: Client,
    endpoint: String,
    key: String,
}

impl AzureVisionClient {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
        let key = key.into().trim().to_string();
        if endpoint.is_empty() || key.is_empty() {
            return Err(VisionError::MissingCredentials);
        }

        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            endpoint,
            key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full analyze URL for the requested features.
    pub fn analyze_url(&self, features: &[VisualFeature]) -> String {
        let features = features
            .iter()
            .map(VisualFeature::as_str)
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}/computervision/imageanalysis:analyze?api-version={}&features={}",
            self.endpoint, API_VERSION, features
        )
    }

    /// Upload raw image bytes and return the parsed analysis.
    pub async fn analyze(
        &self,
        image: Vec<u8>,
        features: &[VisualFeature],
    ) -> Result<ImageAnalysis> {
        let url = self.analyze_url(features);
        tracing::debug!("Analyzing {} byte frame", image.len());

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/octet-stream")
            .body(image)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Vision API error {}: {}", status, body);
            return Err(VisionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<ImageAnalysis>().await?)
    }
}
