//! Frame capture plus analysis, producing text for the voice agent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{AzureVisionClient, VisualFeature};
use crate::error::{Result, VisionError};
use crate::focus::{answer_query, is_obstacle, simulation_reply_for, Focus, DEFAULT_PROMPT};
use crate::models::SceneReport;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;
pub const CAPTURE_ATTEMPTS: u32 = 3;
pub const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(500);

pub const CAPTURE_FAILED: &str = "Failed to capture image - camera not available after multiple attempts. Check video stream connection.";

/// Where camera frames come from.
#[derive(Debug, Clone)]
pub enum FrameSource {
    /// No camera; analyses return canned replies.
    Simulated,
    /// A JPEG file refreshed by an external frame grabber.
    File(PathBuf),
}

/// Result of one capture-and-analyze request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisionOutcome {
    pub summary: String,
    pub obstacles: Vec<String>,
}

impl VisionOutcome {
    fn text(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            obstacles: Vec::new(),
        }
    }

    fn simulated(focus: &str) -> Self {
        let obstacles = Focus::parse(focus)
            .map(|f| f.simulation_obstacles())
            .unwrap_or_default()
            .iter()
            .map(|name| name.to_string())
            .collect();
        Self {
            summary: simulation_reply_for(focus).to_string(),
            obstacles,
        }
    }

    /// Describe a report for `request`: a [`Focus`] name, or else a
    /// free-form question such as "how many chairs".
    pub fn from_report(report: &SceneReport, request: &str) -> Self {
        let summary = match Focus::parse(request) {
            Some(focus) => {
                tracing::debug!("{}", focus.prompt());
                focus.summarize(report)
            }
            None => {
                tracing::debug!("{} Question: {}", DEFAULT_PROMPT, request);
                answer_query(report, request)
            }
        };

        let mut obstacles: Vec<String> = report
            .object_names()
            .into_iter()
            .filter(|name| is_obstacle(name))
            .collect();
        if !report.people.is_empty() {
            obstacles.push("person".to_string());
        }

        Self { summary, obstacles }
    }
}

pub struct VisionAnalyzer {
    source: FrameSource,
    client: Option<AzureVisionClient>,
    threshold: f64,
    retry_delay: Duration,
}

impl VisionAnalyzer {
    pub fn simulated() -> Self {
        Self::new(FrameSource::Simulated, None)
    }

    pub fn new(source: FrameSource, client: Option<AzureVisionClient>) -> Self {
        Self {
            source,
            client,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            retry_delay: CAPTURE_RETRY_DELAY,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.source, FrameSource::Simulated)
    }

    /// Capture a frame and describe it for `focus`.
    ///
    /// Never fails: capture and API problems come back as the summary text
    /// so the agent can say them out loud.
    pub async fn capture_and_analyze(&self, focus: &str) -> VisionOutcome {
        tracing::info!("Capturing image for: {}", focus);

        let path = match &self.source {
            FrameSource::Simulated => return VisionOutcome::simulated(focus),
            FrameSource::File(path) => path,
        };

        let frame = match self.capture(path).await {
            Ok(frame) => frame,
            Err(_) => return VisionOutcome::text(CAPTURE_FAILED),
        };

        match self.analyze_frame(frame, focus).await {
            Ok(outcome) => {
                tracing::info!("Image analysis completed: {}", outcome.summary);
                outcome
            }
            Err(e) => {
                tracing::error!("Image analysis error: {}", e);
                VisionOutcome::text(format!("Image capture/analysis error: {}", e))
            }
        }
    }

    async fn capture(&self, path: &Path) -> Result<Vec<u8>> {
        for attempt in 1..=CAPTURE_ATTEMPTS {
            match tokio::fs::read(path).await {
                Ok(bytes) if !bytes.is_empty() => return Ok(bytes),
                Ok(_) => tracing::warn!("Frame capture attempt {} returned no data", attempt),
                Err(e) => tracing::warn!("Frame capture error on attempt {}: {}", attempt, e),
            }
            if attempt < CAPTURE_ATTEMPTS {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        Err(VisionError::NoFrame)
    }

    /// Run the REST analysis on an already captured frame.
    pub async fn analyze_frame(&self, frame: Vec<u8>, focus: &str) -> Result<VisionOutcome> {
        let client = self.client.as_ref().ok_or(VisionError::MissingCredentials)?;
        let analysis = client.analyze(frame, &VisualFeature::ALL).await?;
        let report = analysis.filtered(self.threshold);
        Ok(VisionOutcome::from_report(&report, focus))
    }
}
