//! Image analysis response types (Image Analysis 4.0 REST format).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "w")]
    pub width: i32,
    #[serde(rename = "h")]
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub text: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedObject {
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPerson {
    pub bounding_box: BoundingBox,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenseCaption {
    pub text: String,
    pub confidence: f64,
    #[serde(default)]
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueList<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
}

/// Raw analysis result. Sections for features that were not requested are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysis {
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default)]
    pub metadata: Option<ImageMetadata>,
    #[serde(default)]
    pub caption_result: Option<Caption>,
    #[serde(default)]
    pub dense_captions_result: Option<ValueList<DenseCaption>>,
    #[serde(default)]
    pub tags_result: Option<ValueList<Tag>>,
    #[serde(default)]
    pub objects_result: Option<ValueList<DetectedObject>>,
    #[serde(default)]
    pub people_result: Option<ValueList<DetectedPerson>>,
}

/// A detection that passed the confidence threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub name: String,
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

/// Filtered, ready-to-describe view of an [`ImageAnalysis`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneReport {
    pub objects: Vec<Detection>,
    pub people: Vec<Detection>,
    pub description: String,
    pub tags: Vec<String>,
    pub dense_captions: Vec<Detection>,
}

pub const NO_DESCRIPTION: &str = "No description available";

impl ImageAnalysis {
    /// Keep only results at or above `threshold` confidence.
    ///
    /// Objects are named after their first (highest confidence) tag;
    /// objects without tags are skipped.
    pub fn filtered(&self, threshold: f64) -> SceneReport {
        let objects: Vec<Detection> = self
            .objects_result
            .iter()
            .flat_map(|list| &list.values)
            .filter_map(|obj| {
                let primary = obj.tags.first()?;
                Some(Detection {
                    name: primary.name.clone(),
                    confidence: primary.confidence,
                    bounding_box: obj.bounding_box,
                })
            })
            .collect();

        for obj in &objects {
            let mark = if obj.confidence >= threshold { "+" } else { "-" };
            tracing::debug!("  {} {}: {:.3}", mark, obj.name, obj.confidence);
        }

        let people = self
            .people_result
            .iter()
            .flat_map(|list| &list.values)
            .filter(|p| p.confidence >= threshold)
            .map(|p| Detection {
                name: "person".to_string(),
                confidence: p.confidence,
                bounding_box: p.bounding_box,
            })
            .collect();

        let description = self
            .caption_result
            .as_ref()
            .map(|c| c.text.trim())
            .filter(|text| !text.is_empty())
            .unwrap_or(NO_DESCRIPTION)
            .to_string();

        let tags = self
            .tags_result
            .iter()
            .flat_map(|list| &list.values)
            .filter(|t| t.confidence >= threshold)
            .map(|t| t.name.clone())
            .collect();

        let dense_captions = self
            .dense_captions_result
            .iter()
            .flat_map(|list| &list.values)
            .filter(|c| c.confidence >= threshold)
            .map(|c| Detection {
                name: c.text.clone(),
                confidence: c.confidence,
                bounding_box: c.bounding_box,
            })
            .collect();

        SceneReport {
            objects: objects
                .into_iter()
                .filter(|o| o.confidence >= threshold)
                .collect(),
            people,
            description,
            tags,
            dense_captions,
        }
    }
}

impl SceneReport {
    /// Names of detected objects, most confident first, without duplicates.
    pub fn object_names(&self) -> Vec<String> {
        let mut sorted: Vec<&Detection> = self.objects.iter().collect();
        sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let mut names: Vec<String> = Vec::new();
        for detection in sorted {
            if !names.contains(&detection.name) {
                names.push(detection.name.clone());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "modelVersion": "2023-10-01",
        "metadata": {"width": 960, "height": 720},
        "captionResult": {"text": "a chair in an office", "confidence": 0.81},
        "denseCaptionsResult": {"values": [
            {"text": "a black office chair", "confidence": 0.77, "boundingBox": {"x": 10, "y": 20, "w": 100, "h": 200}},
            {"text": "a blurry wall", "confidence": 0.31, "boundingBox": {"x": 0, "y": 0, "w": 960, "h": 720}}
        ]},
        "tagsResult": {"values": [
            {"name": "indoor", "confidence": 0.99},
            {"name": "floor", "confidence": 0.42}
        ]},
        "objectsResult": {"values": [
            {"boundingBox": {"x": 10, "y": 20, "w": 100, "h": 200}, "tags": [{"name": "chair", "confidence": 0.72}]},
            {"boundingBox": {"x": 500, "y": 20, "w": 50, "h": 50}, "tags": [{"name": "cup", "confidence": 0.35}]},
            {"boundingBox": {"x": 1, "y": 1, "w": 1, "h": 1}, "tags": []}
        ]},
        "peopleResult": {"values": [
            {"boundingBox": {"x": 300, "y": 100, "w": 80, "h": 300}, "confidence": 0.93},
            {"boundingBox": {"x": 0, "y": 0, "w": 5, "h": 5}, "confidence": 0.02}
        ]}
    }"#;

    #[test]
    fn test_filters_by_threshold() {
        let analysis: ImageAnalysis = serde_json::from_str(SAMPLE).unwrap();
        let report = analysis.filtered(0.5);

        assert_eq!(report.object_names(), vec!["chair".to_string()]);
        assert_eq!(report.objects[0].bounding_box.width, 100);
        assert_eq!(report.people.len(), 1);
        assert_eq!(report.description, "a chair in an office");
        assert_eq!(report.tags, vec!["indoor".to_string()]);
        assert_eq!(report.dense_captions.len(), 1);
        assert_eq!(report.dense_captions[0].name, "a black office chair");
    }

    #[test]
    fn test_missing_sections() {
        let analysis: ImageAnalysis = serde_json::from_str(r#"{"modelVersion": "x"}"#).unwrap();
        let report = analysis.filtered(0.5);
        assert!(report.objects.is_empty());
        assert!(report.people.is_empty());
        assert_eq!(report.description, NO_DESCRIPTION);
    }
}
