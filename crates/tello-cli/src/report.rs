//! Plain-text rendering of a vision report.

use tello_vision::models::Detection;
use tello_vision::{Focus, SceneReport};

fn detection_lines(out: &mut String, heading: &str, detections: &[Detection]) {
    if detections.is_empty() {
        return;
    }
    out.push_str(heading);
    out.push_str(":\n");
    for d in detections {
        let b = &d.bounding_box;
        out.push_str(&format!(
            "  {:<24} {:>5.1}%  at ({}, {}) {}x{}\n",
            d.name,
            d.confidence * 100.0,
            b.x,
            b.y,
            b.width,
            b.height
        ));
    }
}

/// Everything that passed the threshold, followed by the spoken summary.
pub fn render_report(report: &SceneReport, focus: Focus) -> String {
    let mut out = format!("Description: {}\n", report.description);
    detection_lines(&mut out, "Objects", &report.objects);
    detection_lines(&mut out, "People", &report.people);
    detection_lines(&mut out, "Regions", &report.dense_captions);
    if !report.tags.is_empty() {
        out.push_str(&format!("Tags: {}\n", report.tags.join(", ")));
    }
    out.push_str(&format!("Summary ({}): {}\n", focus, focus.summarize(report)));
    out
}
