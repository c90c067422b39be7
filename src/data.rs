use crate::trend::Observation;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid dataset: {0}")]
    Parse(#[from] json5::Error),
    #[error("invalid family pattern for {family}: {source}")]
    Pattern {
        family: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Bot,
    /// Professional forecasters aggregate.
    Pro,
    /// Community prediction aggregate.
    Community,
}

impl EntryKind {
    pub fn is_human(&self) -> bool {
        matches!(self, EntryKind::Pro | EntryKind::Community)
    }
}

/// One row of the benchmark leaderboard as delivered by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    #[serde(default)]
    pub kind: EntryKind,
    /// Milliseconds since the epoch. Takes precedence over `date`.
    #[serde(default)]
    pub timestamp: Option<f64>,
    /// `YYYY-MM-DD`, read as UTC midnight.
    #[serde(default)]
    pub date: Option<String>,
    pub score: f64,
}

impl LeaderboardEntry {
    pub fn resolved_timestamp(&self) -> Option<f64> {
        if let Some(ts) = self.timestamp {
            return Some(ts);
        }
        let date = self.date.as_deref()?;
        let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
        let millis = day.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis();
        Some(millis as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub entries: Vec<LeaderboardEntry>,
    /// Explicit target score for the crossing projection.
    #[serde(default)]
    pub reference: Option<f64>,
}

impl Dataset {
    /// The explicit reference, else the best professional forecaster score.
    pub fn reference_score(&self) -> Option<f64> {
        if let Some(reference) = self.reference.filter(|r| r.is_finite()) {
            return Some(reference);
        }
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Pro && e.score.is_finite())
            .map(|e| e.score)
            .reduce(f64::max)
    }
}

/// Parse a dataset from JSON or JSON5 text. JSON5 also admits `NaN` and
/// `Infinity`, which `map_entries` later drops.
pub fn parse_dataset(input: &str) -> Result<Dataset, DataError> {
    Ok(json5::from_str(input)?)
}

pub fn load_dataset(path: &Path) -> Result<Dataset, DataError> {
    let contents = std::fs::read_to_string(path).map_err(|source| DataError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_dataset(&contents)
}

/// Maps a model name to the family it is grouped under.
pub trait FamilyClassifier {
    fn family(&self, name: &str) -> String;
}

impl<F> FamilyClassifier for F
where
    F: Fn(&str) -> String,
{
    fn family(&self, name: &str) -> String {
        self(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyRule {
    pub family: String,
    /// Case-insensitive regex matched against the model name.
    pub pattern: String,
}

impl FamilyRule {
    pub fn new(family: &str, pattern: &str) -> Self {
        Self {
            family: family.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

pub fn default_family_rules() -> Vec<FamilyRule> {
    vec![
        FamilyRule::new("OpenAI", r"^(gpt|o[134]\b|o[134]-|chatgpt)"),
        FamilyRule::new("Anthropic", r"^claude"),
        FamilyRule::new("Google", r"^(gemini|gemma|palm)"),
        FamilyRule::new("Meta", r"^(llama|meta)"),
        FamilyRule::new("xAI", r"^grok"),
        FamilyRule::new("DeepSeek", r"^deepseek"),
        FamilyRule::new("Alibaba", r"^(qwen|qwq)"),
        FamilyRule::new("Mistral", r"^(mistral|mixtral|magistral)"),
    ]
}

/// First matching rule wins. Unmatched names are their own family.
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    rules: Vec<(String, Regex)>,
}

static DEFAULT_CLASSIFIER: Lazy<RuleClassifier> =
    Lazy::new(|| RuleClassifier::from_rules(&default_family_rules()).unwrap());

impl RuleClassifier {
    pub fn from_rules(rules: &[FamilyRule]) -> Result<Self, DataError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let re = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| DataError::Pattern {
                    family: rule.family.clone(),
                    source,
                })?;
            compiled.push((rule.family.clone(), re));
        }
        Ok(Self { rules: compiled })
    }
}

impl Default for RuleClassifier {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }
}

impl FamilyClassifier for RuleClassifier {
    fn family(&self, name: &str) -> String {
        let trimmed = name.trim();
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(trimmed))
            .map(|(family, _)| family.clone())
            .unwrap_or_else(|| trimmed.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedObservation {
    pub name: String,
    pub family: String,
    pub kind: EntryKind,
    #[serde(flatten)]
    pub point: Observation,
}

/// Turn leaderboard rows into finite observations, tagged with family and
/// kind. Rows without a usable timestamp or score are dropped.
pub fn map_entries(
    entries: &[LeaderboardEntry],
    classifier: &dyn FamilyClassifier,
) -> Vec<NamedObservation> {
    entries
        .iter()
        .filter_map(|entry| {
            let Some(x) = entry.resolved_timestamp().filter(|x| x.is_finite()) else {
                debug!(name = %entry.name, "dropping entry without a usable timestamp");
                return None;
            };
            if !entry.score.is_finite() {
                debug!(name = %entry.name, "dropping entry with non-finite score");
                return None;
            }
            let family = if entry.kind.is_human() {
                human_family(entry.kind).to_string()
            } else {
                classifier.family(&entry.name)
            };
            Some(NamedObservation {
                name: entry.name.clone(),
                family,
                kind: entry.kind,
                point: Observation::new(x, entry.score),
            })
        })
        .collect()
}

fn human_family(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Pro => "Pro Forecasters",
        EntryKind::Community => "Community",
        EntryKind::Bot => "Bots",
    }
}

/// Observations of one family, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series<'a> {
    pub family: String,
    pub members: Vec<&'a NamedObservation>,
}

impl Series<'_> {
    pub fn points(&self) -> Vec<Observation> {
        self.members.iter().map(|m| m.point).collect()
    }
}

/// Families in first-seen order.
pub fn group_by_family(observations: &[NamedObservation]) -> Vec<Series<'_>> {
    let mut series: Vec<Series<'_>> = Vec::new();
    for obs in observations {
        match series.iter_mut().find(|s| s.family == obs.family) {
            Some(existing) => existing.members.push(obs),
            None => series.push(Series {
                family: obs.family.clone(),
                members: vec![obs],
            }),
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: EntryKind, timestamp: f64, score: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            kind,
            timestamp: Some(timestamp),
            date: None,
            score,
        }
    }

    #[test]
    fn default_rules_group_model_names() {
        let classifier = RuleClassifier::default();
        assert_eq!(classifier.family("GPT-4o"), "OpenAI");
        assert_eq!(classifier.family("gpt-5"), "OpenAI");
        assert_eq!(classifier.family("o3-mini"), "OpenAI");
        assert_eq!(classifier.family("o1"), "OpenAI");
        assert_eq!(classifier.family("Claude 3.7 Sonnet"), "Anthropic");
        assert_eq!(classifier.family("Gemini 2.5 Pro"), "Google");
        assert_eq!(classifier.family("DeepSeek-R1"), "DeepSeek");
        assert_eq!(classifier.family("  Grok 3 "), "xAI");
        assert_eq!(classifier.family("Obscure Bot"), "Obscure Bot");
        assert_eq!(classifier.family("omni-forecaster"), "omni-forecaster");
    }

    #[test]
    fn closure_classifier_is_injectable() {
        let upper = |name: &str| name.to_ascii_uppercase();
        let mapped = map_entries(&[entry("abc", EntryKind::Bot, 1.0, 2.0)], &upper);
        assert_eq!(mapped[0].family, "ABC");
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = RuleClassifier::from_rules(&[FamilyRule::new("Broken", "(")]).unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn non_finite_entries_are_dropped() {
        let entries = vec![
            entry("a", EntryKind::Bot, 1.0, 2.0),
            entry("b", EntryKind::Bot, f64::NAN, 2.0),
            entry("c", EntryKind::Bot, 1.0, f64::INFINITY),
            LeaderboardEntry {
                name: "d".to_string(),
                kind: EntryKind::Bot,
                timestamp: None,
                date: Some("not a date".to_string()),
                score: 1.0,
            },
        ];
        let mapped = map_entries(&entries, &RuleClassifier::default());
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].name, "a");
    }

    #[test]
    fn dates_resolve_to_utc_midnight() {
        let e = LeaderboardEntry {
            name: "x".to_string(),
            kind: EntryKind::Bot,
            timestamp: None,
            date: Some("2024-01-01".to_string()),
            score: 0.0,
        };
        assert_eq!(e.resolved_timestamp(), Some(1_704_067_200_000.0));
    }

    #[test]
    fn human_entries_use_aggregate_families() {
        let entries = vec![
            entry("Pros", EntryKind::Pro, 1.0, 30.0),
            entry("CP", EntryKind::Community, 1.0, 20.0),
        ];
        let mapped = map_entries(&entries, &RuleClassifier::default());
        assert_eq!(mapped[0].family, "Pro Forecasters");
        assert_eq!(mapped[1].family, "Community");
    }

    #[test]
    fn parses_json5_with_reference_fallback() {
        let input = r#"{
            // bots and one human baseline
            title: "FutureEval",
            entries: [
                { name: "GPT-4o", date: "2024-05-13", score: 12.5 },
                { name: "Pros", kind: "pro", timestamp: 1700000000000, score: 40 },
                { name: "Pros late", kind: "pro", timestamp: 1710000000000, score: 42 },
                { name: "Broken", timestamp: NaN, score: 1 },
            ],
        }"#;
        let dataset = parse_dataset(input).expect("parse");
        assert_eq!(dataset.entries.len(), 4);
        assert_eq!(dataset.reference_score(), Some(42.0));
        let mapped = map_entries(&dataset.entries, &RuleClassifier::default());
        assert_eq!(mapped.len(), 3);
    }

    #[test]
    fn explicit_reference_wins() {
        let dataset = Dataset {
            title: None,
            entries: vec![entry("Pros", EntryKind::Pro, 1.0, 30.0)],
            reference: Some(25.0),
        };
        assert_eq!(dataset.reference_score(), Some(25.0));
    }

    #[test]
    fn grouping_keeps_first_seen_order() {
        let entries = vec![
            entry("Claude 3", EntryKind::Bot, 1.0, 1.0),
            entry("GPT-4", EntryKind::Bot, 2.0, 2.0),
            entry("Claude 3.5", EntryKind::Bot, 3.0, 3.0),
        ];
        let mapped = map_entries(&entries, &RuleClassifier::default());
        let groups = group_by_family(&mapped);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].family, "Anthropic");
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[1].family, "OpenAI");
        assert_eq!(groups[0].points()[1], Observation::new(3.0, 3.0));
    }
}
