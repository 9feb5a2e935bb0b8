//! Vision analysis for drone camera frames.
//!
//! Wraps the Azure AI Vision image analysis REST API and turns its output
//! into short, focus-specific descriptions the voice agent can speak.

pub mod analyzer;
pub mod client;
pub mod error;
pub mod focus;
pub mod models;

pub use analyzer::{FrameSource, VisionAnalyzer, VisionOutcome};
pub use client::{AzureVisionClient, VisualFeature};
pub use error::{Result, VisionError};
pub use focus::{answer_query, Focus, NavigationAssessment};
pub use models::{ImageAnalysis, SceneReport};
