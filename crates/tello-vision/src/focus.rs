//! What an image analysis should concentrate on, and how to describe it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{BoundingBox, Detection, SceneReport};

pub const DEFAULT_SIMULATION_REPLY: &str = "Image captured and analyzed - environment looks good.";
pub const DEFAULT_PROMPT: &str = "Analyze this drone camera view and describe what you see.";

/// Analysis focus requested by the `capture_and_analyze_image` tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    Obstacles,
    Objects,
    Navigation,
    LandingSpot,
}

impl Focus {
    pub const ALL: [Focus; 4] = [
        Focus::Obstacles,
        Focus::Objects,
        Focus::Navigation,
        Focus::LandingSpot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Focus::Obstacles => "obstacles",
            Focus::Objects => "objects",
            Focus::Navigation => "navigation",
            Focus::LandingSpot => "landing_spot",
        }
    }

    /// Lenient parse; unknown values yield `None` and get the generic treatment.
    pub fn parse(value: &str) -> Option<Self> {
        value.parse().ok()
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Focus::Obstacles => "Analyze this drone camera view for navigation safety. Identify any obstacles, walls, or hazards that could interfere with drone movement.",
            Focus::Objects => "Describe all objects, furniture, and items visible in this drone camera view and their approximate positions relative to the drone.",
            Focus::Navigation => "Evaluate this view for drone navigation. Assess the available space and recommend safe flight paths.",
            Focus::LandingSpot => "Analyze the area below and around the drone for suitable landing spots and potential hazards.",
        }
    }

    /// Canned answer used when no camera is involved.
    pub fn simulation_reply(&self) -> &'static str {
        match self {
            Focus::Obstacles => "a chair 200 cm ahead.",
            Focus::Objects => "I can see a desk with computer monitor and laptop. Some cables and office equipment visible. No people in view.",
            Focus::Navigation => "Room appears spacious with good lighting. Safe to move forward up to 1.5 meters before encountering furniture.",
            Focus::LandingSpot => "Current area has flat surface suitable for landing. No obstacles directly below.",
        }
    }

    /// Obstacles named in [`Focus::simulation_reply`].
    pub fn simulation_obstacles(&self) -> &'static [&'static str] {
        match self {
            Focus::Obstacles => &["chair"],
            Focus::Objects | Focus::Navigation | Focus::LandingSpot => &[],
        }
    }

    /// Render a spoken summary of a report from this focus' point of view.
    pub fn summarize(&self, report: &SceneReport) -> String {
        match self {
            Focus::Obstacles => {
                let hazards = obstacle_names(report);
                if hazards.is_empty() {
                    format!("No obstacles detected. Scene: {}.", report.description)
                } else {
                    format!(
                        "Possible obstacles: {}. Scene: {}.",
                        hazards.join(", "),
                        report.description
                    )
                }
            }
            Focus::Objects => scene_summary(report),
            Focus::Navigation => format!(
                "{} Scene: {}.",
                NavigationAssessment::from_report(report).sentence(),
                report.description
            ),
            Focus::LandingSpot => {
                let flat = report
                    .tags
                    .iter()
                    .any(|t| {
                        matches!(t.as_str(), "floor" | "ground" | "table" | "grass" | "carpet")
                    });
                let surface = if flat {
                    "Flat surface visible, suitable for landing."
                } else {
                    "No clear flat surface identified."
                };
                let mut hazards = report.object_names();
                if !report.people.is_empty() {
                    hazards.push(people_phrase(report.people.len()));
                }
                if hazards.is_empty() {
                    format!("{} No obstacles detected nearby.", surface)
                } else {
                    format!("{} Watch out for: {}.", surface, hazards.join(", "))
                }
            }
        }
    }
}

/// Simulation reply for a raw focus string, falling back to the generic text.
pub fn simulation_reply_for(focus: &str) -> &'static str {
    Focus::parse(focus)
        .map(|f| f.simulation_reply())
        .unwrap_or(DEFAULT_SIMULATION_REPLY)
}

/// Object names that count as flight obstacles.
pub const OBSTACLE_NAMES: [&str; 7] = ["wall", "tree", "building", "car", "table", "chair", "pole"];

// Tried when a count question names nothing that was detected.
const COMMON_OBJECTS: [&str; 9] = [
    "chair", "table", "person", "people", "bottle", "book", "laptop", "car", "phone",
];

pub fn is_obstacle(name: &str) -> bool {
    let name = name.to_lowercase();
    OBSTACLE_NAMES.contains(&name.as_str())
}

/// Detected objects on the obstacle list.
pub fn obstacles(report: &SceneReport) -> Vec<&Detection> {
    report.objects.iter().filter(|o| is_obstacle(&o.name)).collect()
}

/// Obstacle names, most confident first, plus a people count if anyone is in view.
pub fn obstacle_names(report: &SceneReport) -> Vec<String> {
    let mut names: Vec<String> = report
        .object_names()
        .into_iter()
        .filter(|name| is_obstacle(name))
        .collect();
    if !report.people.is_empty() {
        names.push(people_phrase(report.people.len()));
    }
    names
}

/// Rough position of a box, e.g. `in the top-left of the image`.
pub fn describe_location(bbox: &BoundingBox) -> String {
    let horizontal = match bbox.x {
        x if x < 200 => "left",
        x if x < 400 => "center",
        _ => "right",
    };
    let vertical = match bbox.y {
        y if y < 150 => "top",
        y if y < 300 => "middle",
        _ => "bottom",
    };
    format!("in the {}-{} of the image", vertical, horizontal)
}

/// Safety view of a scene for flying through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationAssessment {
    pub safe_to_fly: bool,
    pub safety_concerns: Vec<String>,
    pub people_count: usize,
    pub obstacle_count: usize,
    /// Fewer than five objects in view.
    pub clear_space: bool,
    pub recommendations: Vec<String>,
}

impl NavigationAssessment {
    pub fn from_report(report: &SceneReport) -> Self {
        let people_count = report.people.len();
        let obstacle_count = obstacles(report).len();

        let mut safety_concerns = Vec::new();
        if people_count > 0 {
            safety_concerns.push(format!(
                "{} detected - maintain safe distance",
                people_phrase(people_count)
            ));
        }
        if obstacle_count > 0 {
            safety_concerns.push(format!("{} potential obstacles detected", obstacle_count));
        }

        let mut recommendations = Vec::new();
        if people_count > 0 {
            recommendations.push("Maintain minimum 3-meter distance from people".to_string());
            recommendations.push("Reduce flight speed in populated areas".to_string());
        }
        if obstacle_count > 0 {
            recommendations.push("Navigate carefully around detected obstacles".to_string());
            recommendations.push("Consider altitude adjustment to avoid obstacles".to_string());
        }
        if recommendations.is_empty() {
            recommendations.push("Area appears clear for normal flight operations".to_string());
        }

        Self {
            safe_to_fly: safety_concerns.is_empty(),
            safety_concerns,
            people_count,
            obstacle_count,
            clear_space: report.objects.len() < 5,
            recommendations,
        }
    }

    pub fn sentence(&self) -> String {
        let mut sentence = if self.safe_to_fly {
            "Safe to fly.".to_string()
        } else {
            format!("Caution: {}.", self.safety_concerns.join("; "))
        };
        sentence.push_str(&format!(" {}.", self.recommendations.join(". ")));
        if !self.clear_space {
            sentence.push_str(" Limited free space.");
        }
        sentence
    }
}

/// Description, per-name counts and the leading tags.
pub fn scene_summary(report: &SceneReport) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in report.objects.iter().chain(&report.people) {
        match counts.iter_mut().find(|(name, _)| *name == item.name) {
            Some((_, count)) => *count += 1,
            None => counts.push((item.name.as_str(), 1)),
        }
    }

    let mut parts = vec![report.description.clone()];
    if !counts.is_empty() {
        let detected: Vec<String> = counts
            .iter()
            .map(|(name, count)| format!("{} {}", count, plural(name, *count)))
            .collect();
        parts.push(format!("Detected: {}", detected.join(", ")));
    }
    if !report.tags.is_empty() {
        let tags: Vec<&str> = report.tags.iter().take(5).map(String::as_str).collect();
        parts.push(format!("Scene elements: {}", tags.join(", ")));
    }
    parts.join(". ")
}

/// Answer a free-form question ("how many chairs", "find the laptop",
/// "are there people") from a report.
pub fn answer_query(report: &SceneReport, query: &str) -> String {
    let query = query.to_lowercase();
    let detected: Vec<&Detection> = report.objects.iter().chain(&report.people).collect();

    if query.contains("how many") || query.contains("count") {
        count_objects(&detected, &query)
    } else if query.contains("find") || query.contains("locate") {
        find_objects(&detected, &query)
    } else if query.contains("people") || query.contains("person") {
        match report.people.len() {
            0 => "I don't see any people in the image.".to_string(),
            n => format!("I can see {} in the image.", people_phrase(n)),
        }
    } else {
        let mut names = report.object_names();
        if !report.people.is_empty() {
            names.push("person".to_string());
        }
        if names.is_empty() {
            report.description.clone()
        } else {
            format!("{}. I can see: {}", report.description, names.join(", "))
        }
    }
}

fn mentioned(name: &str, query: &str) -> bool {
    name.to_lowercase()
        .split_whitespace()
        .any(|word| query.contains(word))
}

fn count_objects(detected: &[&Detection], query: &str) -> String {
    let targets: Vec<&&Detection> = detected.iter().filter(|d| mentioned(&d.name, query)).collect();
    if let Some(first) = targets.first() {
        return format!(
            "I found {} {} in the image.",
            targets.len(),
            plural(&first.name, targets.len())
        );
    }

    for common in COMMON_OBJECTS.iter().filter(|c| query.contains(**c)) {
        let people = matches!(*common, "people" | "person");
        let count = detected
            .iter()
            .filter(|d| {
                let name = d.name.to_lowercase();
                name.contains(common) || (people && name == "person")
            })
            .count();
        if count == 0 {
            continue;
        }
        return if people {
            format!("I found {} in the image.", people_phrase(count))
        } else {
            format!("I found {} {} in the image.", count, plural(common, count))
        };
    }

    "I couldn't find the specific objects you're looking for in the image.".to_string()
}

fn find_objects(detected: &[&Detection], query: &str) -> String {
    let found: Vec<String> = detected
        .iter()
        .filter(|d| mentioned(&d.name, query))
        .map(|d| format!("{} {}", d.name, describe_location(&d.bounding_box)))
        .collect();
    if found.is_empty() {
        "I couldn't find the specified objects in the current view.".to_string()
    } else {
        format!("I found: {}", found.join(", "))
    }
}

fn plural(name: &str, count: usize) -> String {
    if count > 1 && !name.ends_with('s') {
        format!("{}s", name)
    } else {
        name.to_string()
    }
}

fn people_phrase(count: usize) -> String {
    if count == 1 {
        "1 person".to_string()
    } else {
        format!("{} people", count)
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Focus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "obstacles" => Ok(Focus::Obstacles),
            "objects" => Ok(Focus::Objects),
            "navigation" => Ok(Focus::Navigation),
            "landing_spot" => Ok(Focus::LandingSpot),
            other => Err(format!("unknown focus: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(name: &str, confidence: f64) -> Detection {
        Detection {
            name: name.to_string(),
            confidence,
            bounding_box: BoundingBox::default(),
        }
    }

    fn at(name: &str, x: i32, y: i32) -> Detection {
        Detection {
            name: name.to_string(),
            confidence: 0.9,
            bounding_box: BoundingBox {
                x,
                y,
                width: 50,
                height: 50,
            },
        }
    }

    #[test]
    fn test_simulation_replies() {
        assert_eq!(simulation_reply_for("obstacles"), "a chair 200 cm ahead.");
        assert_eq!(simulation_reply_for("weather"), DEFAULT_SIMULATION_REPLY);
        assert_eq!(Focus::parse("LANDING_SPOT"), Some(Focus::LandingSpot));
        assert_eq!(Focus::Obstacles.simulation_obstacles(), ["chair"]);
        assert!(Focus::Objects.simulation_obstacles().is_empty());
    }

    #[test]
    fn test_obstacle_summary_uses_obstacle_list() {
        let report = SceneReport {
            objects: vec![
                detection("chair", 0.6),
                detection("laptop", 0.95),
                detection("table", 0.9),
            ],
            people: vec![detection("person", 0.8)],
            description: "an office".to_string(),
            ..Default::default()
        };
        assert_eq!(
            Focus::Obstacles.summarize(&report),
            "Possible obstacles: table, chair, 1 person. Scene: an office."
        );
        assert_eq!(obstacles(&report).len(), 2);
        assert!(is_obstacle("Wall"));
        assert!(!is_obstacle("laptop"));

        let harmless = SceneReport {
            objects: vec![detection("cup", 0.9)],
            description: "a white wall".to_string(),
            ..Default::default()
        };
        assert_eq!(
            Focus::Obstacles.summarize(&harmless),
            "No obstacles detected. Scene: a white wall."
        );
    }

    #[test]
    fn test_describe_location() {
        let b = |x, y| BoundingBox {
            x,
            y,
            width: 10,
            height: 10,
        };
        assert_eq!(describe_location(&b(10, 20)), "in the top-left of the image");
        assert_eq!(describe_location(&b(250, 200)), "in the middle-center of the image");
        assert_eq!(describe_location(&b(600, 500)), "in the bottom-right of the image");
        assert_eq!(describe_location(&b(200, 150)), "in the middle-center of the image");
    }

    #[test]
    fn test_navigation_assessment() {
        let clear = SceneReport {
            objects: vec![detection("cup", 0.9)],
            description: "an empty hallway".to_string(),
            ..Default::default()
        };
        let assessment = NavigationAssessment::from_report(&clear);
        assert!(assessment.safe_to_fly);
        assert!(assessment.clear_space);
        assert_eq!(
            Focus::Navigation.summarize(&clear),
            "Safe to fly. Area appears clear for normal flight operations. Scene: an empty hallway."
        );

        let busy = SceneReport {
            objects: vec![detection("tree", 0.9), detection("car", 0.8)],
            people: vec![detection("person", 0.9), detection("person", 0.7)],
            description: "a street".to_string(),
            ..Default::default()
        };
        let assessment = NavigationAssessment::from_report(&busy);
        assert!(!assessment.safe_to_fly);
        assert_eq!(assessment.people_count, 2);
        assert_eq!(assessment.obstacle_count, 2);
        assert_eq!(
            assessment.safety_concerns,
            vec![
                "2 people detected - maintain safe distance".to_string(),
                "2 potential obstacles detected".to_string(),
            ]
        );
        assert_eq!(
            assessment.recommendations[0],
            "Maintain minimum 3-meter distance from people"
        );
        assert_eq!(assessment.recommendations.len(), 4);
        assert!(assessment.sentence().starts_with("Caution: 2 people detected"));
    }

    #[test]
    fn test_scene_summary_counts_items() {
        let report = SceneReport {
            objects: vec![
                detection("chair", 0.9),
                detection("laptop", 0.8),
                detection("chair", 0.7),
            ],
            people: vec![detection("person", 0.9)],
            description: "an office".to_string(),
            tags: vec!["indoor".to_string(), "furniture".to_string()],
            ..Default::default()
        };
        assert_eq!(
            Focus::Objects.summarize(&report),
            "an office. Detected: 2 chairs, 1 laptop, 1 person. Scene elements: indoor, furniture"
        );
    }

    #[test]
    fn test_answer_count_questions() {
        let report = SceneReport {
            objects: vec![detection("chair", 0.9), detection("chair", 0.8), detection("cup", 0.7)],
            people: vec![detection("person", 0.9), detection("person", 0.6)],
            description: "a kitchen".to_string(),
            ..Default::default()
        };
        assert_eq!(
            answer_query(&report, "How many chairs are there?"),
            "I found 2 chairs in the image."
        );
        assert_eq!(
            answer_query(&report, "count the people"),
            "I found 2 people in the image."
        );
        assert_eq!(
            answer_query(&report, "how many bottles?"),
            "I couldn't find the specific objects you're looking for in the image."
        );
        assert_eq!(
            answer_query(&report, "is there a person here"),
            "I can see 2 people in the image."
        );
        assert_eq!(
            answer_query(&report, "what is this"),
            "a kitchen. I can see: chair, cup, person"
        );
    }

    #[test]
    fn test_answer_find_questions() {
        let report = SceneReport {
            objects: vec![at("laptop", 50, 40), at("chair", 450, 320)],
            description: "a desk".to_string(),
            ..Default::default()
        };
        assert_eq!(
            answer_query(&report, "Find the laptop"),
            "I found: laptop in the top-left of the image"
        );
        assert_eq!(
            answer_query(&report, "locate chair and laptop"),
            "I found: laptop in the top-left of the image, chair in the bottom-right of the image"
        );
        assert_eq!(
            answer_query(&report, "find the dog"),
            "I couldn't find the specified objects in the current view."
        );
    }

    #[test]
    fn test_landing_summary() {
        let report = SceneReport {
            objects: vec![detection("laptop", 0.7)],
            description: "a desk with a laptop".to_string(),
            tags: vec!["indoor".to_string(), "floor".to_string()],
            ..Default::default()
        };
        assert_eq!(
            Focus::LandingSpot.summarize(&report),
            "Flat surface visible, suitable for landing. Watch out for: laptop."
        );
    }
}
