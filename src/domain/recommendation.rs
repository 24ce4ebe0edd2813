//! Tag-driven recommendation engine.
//!
//! A patient is described by a set of tags derived from the fused risk, the
//! environment and clinical fields. Advice entries qualify when they share at
//! least one tag with the patient, and are ranked by priority.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::environment::EnvironmentReading;
use super::patient::{FastingBloodSugar, PatientRecord};

/// Closed set of tags shared by tag generation and the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Emergency,
    HighRisk,
    ModerateRisk,
    LowRisk,
    Healthy,
    Heatwave,
    ColdSnap,
    HighPollution,
    HighChol,
    HighBp,
    HighFbs,
    HighHeartRate,
    ChestPainActive,
}

impl Tag {
    pub const ALL: [Tag; 13] = [
        Tag::Emergency,
        Tag::HighRisk,
        Tag::ModerateRisk,
        Tag::LowRisk,
        Tag::Healthy,
        Tag::Heatwave,
        Tag::ColdSnap,
        Tag::HighPollution,
        Tag::HighChol,
        Tag::HighBp,
        Tag::HighFbs,
        Tag::HighHeartRate,
        Tag::ChestPainActive,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Emergency => "emergency",
            Tag::HighRisk => "high_risk",
            Tag::ModerateRisk => "moderate_risk",
            Tag::LowRisk => "low_risk",
            Tag::Healthy => "healthy",
            Tag::Heatwave => "heatwave",
            Tag::ColdSnap => "cold_snap",
            Tag::HighPollution => "high_pollution",
            Tag::HighChol => "high_chol",
            Tag::HighBp => "high_bp",
            Tag::HighFbs => "high_fbs",
            Tag::HighHeartRate => "high_heart_rate",
            Tag::ChestPainActive => "chest_pain_active",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tags describing one patient for one assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagProfile(BTreeSet<Tag>);

impl TagProfile {
    #[must_use]
    pub fn contains(&self, tag: Tag) -> bool {
        self.0.contains(&tag)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, tag: Tag) {
        self.0.insert(tag);
    }
}

impl FromIterator<Tag> for TagProfile {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Derive the tag profile for a patient.
///
/// The environment values are used as reported, including fallback values.
#[must_use]
pub fn generate_tags(
    total_risk: f64,
    environment: &EnvironmentReading,
    patient: &PatientRecord,
) -> TagProfile {
    let mut tags = TagProfile::default();

    if total_risk > 0.80 {
        tags.insert(Tag::Emergency);
    } else if total_risk > 0.50 {
        tags.insert(Tag::HighRisk);
    } else if total_risk > 0.30 {
        tags.insert(Tag::ModerateRisk);
    } else {
        tags.insert(Tag::LowRisk);
        tags.insert(Tag::Healthy);
    }

    if let Some(temp) = environment.temperature {
        if temp > 30.0 {
            tags.insert(Tag::Heatwave);
        } else if temp < 5.0 {
            tags.insert(Tag::ColdSnap);
        }
    }
    if environment.aqi.is_some_and(|aqi| aqi > 3) {
        tags.insert(Tag::HighPollution);
    }

    if patient.cholesterol > 240.0 {
        tags.insert(Tag::HighChol);
    }
    if patient.resting_bp > 140.0 {
        tags.insert(Tag::HighBp);
    }
    if patient.fasting_blood_sugar == FastingBloodSugar::High {
        tags.insert(Tag::HighFbs);
    }
    if patient.max_heart_rate > 170.0 {
        tags.insert(Tag::HighHeartRate);
    }
    if patient.chest_pain.indicates_pain() {
        tags.insert(Tag::ChestPainActive);
    }

    tags
}

/// One piece of advice in the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceEntry {
    pub text: String,
    pub tags: BTreeSet<Tag>,
    pub priority: i32,
}

/// Advice selected for a patient, highest priority first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub generated_tags: TagProfile,
    pub recommendations: Vec<String>,
}

/// Static, ordered collection of advice entries.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<AdviceEntry>,
}

impl KnowledgeBase {
    #[must_use]
    pub fn new(entries: Vec<AdviceEntry>) -> Self {
        Self { entries }
    }

    /// Parse a JSON array of `{text, tags, priority}` records.
    ///
    /// # Errors
    /// Returns the parse error, including for tags outside the closed set.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Load the knowledge base from a file.
    ///
    /// A missing or malformed file yields an empty knowledge base and a
    /// warning; assessments still run, with no recommendations.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Knowledge base not readable at {:?}: {}", path, e);
                return Self::default();
            }
        };

        match Self::from_json_str(&content) {
            Ok(kb) => {
                tracing::info!("Loaded knowledge base with {} entries", kb.len());
                let uncovered = kb.uncovered_tags();
                if !uncovered.is_empty() {
                    tracing::warn!(
                        "Knowledge base has no advice for tags: {}",
                        uncovered
                            .iter()
                            .map(Tag::as_str)
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                }
                kb
            }
            Err(e) => {
                tracing::warn!("Knowledge base at {:?} failed to parse: {}", path, e);
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[AdviceEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags that no entry mentions, in tag order.
    #[must_use]
    pub fn uncovered_tags(&self) -> Vec<Tag> {
        Tag::ALL
            .into_iter()
            .filter(|tag| !self.entries.iter().any(|e| e.tags.contains(tag)))
            .collect()
    }

    /// Select matching advice, highest priority first.
    ///
    /// Ties keep knowledge-base order. Repeated texts are not deduplicated.
    #[must_use]
    pub fn recommend(&self, profile: TagProfile) -> RecommendationResult {
        let mut matches: Vec<&AdviceEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.tags.iter().any(|tag| profile.contains(*tag)))
            .collect();
        matches.sort_by(|a, b| b.priority.cmp(&a.priority));

        RecommendationResult {
            generated_tags: profile,
            recommendations: matches.into_iter().map(|e| e.text.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::environment::Coordinates;
    use crate::domain::patient::{sample_record, ChestPainType};
    use pretty_assertions::assert_eq;

    fn entry(text: &str, tags: &[Tag], priority: i32) -> AdviceEntry {
        AdviceEntry {
            text: text.to_string(),
            tags: tags.iter().copied().collect(),
            priority,
        }
    }

    fn mild_weather() -> EnvironmentReading {
        EnvironmentReading::live("Lisbon", 22.0, 60.0, 2, Coordinates { lat: 38.7, lon: -9.1 })
    }

    fn healthy_patient() -> PatientRecord {
        PatientRecord {
            cholesterol: 180.0,
            resting_bp: 118.0,
            fasting_blood_sugar: FastingBloodSugar::Normal,
            chest_pain: ChestPainType::Asymptomatic,
            ..sample_record()
        }
    }

    #[test]
    fn test_scenario_tags() {
        let env =
            EnvironmentReading::live("Delhi", 35.0, 30.0, 5, Coordinates { lat: 28.6, lon: 77.2 });
        let tags = generate_tags(0.9225, &env, &sample_record());

        let expected: TagProfile = [
            Tag::Emergency,
            Tag::Heatwave,
            Tag::HighPollution,
            Tag::HighChol,
            Tag::HighBp,
            Tag::HighFbs,
            Tag::ChestPainActive,
        ]
        .into_iter()
        .collect();
        assert_eq!(tags, expected);
    }

    #[test]
    fn test_risk_tiers() {
        let env = mild_weather();
        let patient = healthy_patient();

        assert!(generate_tags(0.81, &env, &patient).contains(Tag::Emergency));
        assert!(generate_tags(0.80, &env, &patient).contains(Tag::HighRisk));
        assert!(generate_tags(0.50, &env, &patient).contains(Tag::ModerateRisk));

        let low = generate_tags(0.30, &env, &patient);
        assert!(low.contains(Tag::LowRisk) && low.contains(Tag::Healthy));
        assert_eq!(low.len(), 2);
    }

    #[test]
    fn test_cold_snap_and_fallback_environment() {
        let patient = healthy_patient();
        let cold =
            EnvironmentReading::live("Oslo", -3.0, 80.0, 1, Coordinates { lat: 59.9, lon: 10.7 });
        assert!(generate_tags(0.1, &cold, &patient).contains(Tag::ColdSnap));

        let fallback = EnvironmentReading::fallback("Oslo", "offline");
        let tags = generate_tags(0.1, &fallback, &patient);
        assert!(!tags.contains(Tag::ColdSnap));
        assert!(!tags.contains(Tag::Heatwave));
        assert!(!tags.contains(Tag::HighPollution));
    }

    #[test]
    fn test_high_heart_rate() {
        let patient = PatientRecord {
            max_heart_rate: 182.0,
            ..healthy_patient()
        };
        assert!(generate_tags(0.1, &mild_weather(), &patient).contains(Tag::HighHeartRate));
    }

    #[test]
    fn test_ranking_by_priority() {
        let kb = KnowledgeBase::new(vec![
            entry("one", &[Tag::HighChol], 1),
            entry("five", &[Tag::HighBp], 5),
            entry("three", &[Tag::HighChol, Tag::Heatwave], 3),
        ]);
        let profile: TagProfile = [Tag::HighChol, Tag::HighBp].into_iter().collect();

        let result = kb.recommend(profile);
        assert_eq!(result.recommendations, vec!["five", "three", "one"]);
    }

    #[test]
    fn test_ties_keep_order_and_duplicates_survive() {
        let kb = KnowledgeBase::new(vec![
            entry("first", &[Tag::Healthy], 2),
            entry("skipped", &[Tag::Emergency], 9),
            entry("second", &[Tag::LowRisk], 2),
            entry("first", &[Tag::LowRisk], 2),
        ]);
        let profile: TagProfile = [Tag::LowRisk, Tag::Healthy].into_iter().collect();

        let result = kb.recommend(profile);
        assert_eq!(result.recommendations, vec!["first", "second", "first"]);
    }

    #[test]
    fn test_empty_knowledge_base() {
        let profile: TagProfile = [Tag::Emergency].into_iter().collect();
        let result = KnowledgeBase::default().recommend(profile.clone());
        assert!(result.recommendations.is_empty());
        assert_eq!(result.generated_tags, profile);
    }

    #[test]
    fn test_parse_knowledge_base() {
        let json = r#"[
            {"text": "Stay hydrated", "tags": ["heatwave"], "priority": 4},
            {"text": "Seek care", "tags": ["emergency", "chest_pain_active"], "priority": 10}
        ]"#;
        let kb = KnowledgeBase::from_json_str(json).expect("Should parse");
        assert_eq!(kb.len(), 2);
        assert!(kb.entries()[1].tags.contains(&Tag::ChestPainActive));
        assert!(kb.uncovered_tags().contains(&Tag::ColdSnap));
        assert!(!kb.uncovered_tags().contains(&Tag::Heatwave));
    }

    #[test]
    fn test_unknown_tag_yields_empty_knowledge_base() {
        let dir = tempfile::tempdir().expect("Temp dir");
        let path = dir.path().join("advice_db.json");
        std::fs::write(
            &path,
            r#"[{"text": "Eat well", "tags": ["diet_plan"], "priority": 1}]"#,
        )
        .expect("Write kb");

        assert!(KnowledgeBase::load(&path).is_empty());
        assert!(KnowledgeBase::load(&dir.path().join("missing.json")).is_empty());
    }

    #[test]
    fn test_bundled_knowledge_base_covers_every_tag() {
        let kb = KnowledgeBase::load(Path::new("data/advice_db.json"));
        assert!(!kb.is_empty());
        assert_eq!(kb.uncovered_tags(), Vec::<Tag>::new());
    }

    #[test]
    fn test_tag_names_match_serde() {
        for tag in Tag::ALL {
            let json = serde_json::to_string(&tag).expect("Should serialize");
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
        }
    }
}
