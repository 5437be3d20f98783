// src/profile.rs
//! Helpers over the free-form profile documents the LLM returns.

use serde_json::{Map, Value};
use tracing::warn;

use crate::utils::normalize_name;

pub const UNKNOWN: &str = "unknown";

const COMPANY_NAME_PATHS: &[&[&str]] = &[
    &["_meta", "company_name"],
    &["company_meta", "company_name"],
    &["profile_meta", "company_name"],
];

const APPLICANT_NAME_PATHS: &[&[&str]] = &[
    &["profile_meta", "candidate_name"],
    &["_source", "candidate_name"],
];

fn lookup<'a>(document: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(document, |current, key| current.get(key))
}

fn first_known_name(document: &Value, paths: &[&[&str]]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| lookup(document, path).and_then(Value::as_str))
        .map(normalize_name)
        .find(|name| !name.is_empty() && !name.eq_ignore_ascii_case(UNKNOWN))
}

pub fn company_name(profile: &Value) -> Option<String> {
    first_known_name(profile, COMPANY_NAME_PATHS)
}

pub fn applicant_name(profile: &Value) -> Option<String> {
    first_known_name(profile, APPLICANT_NAME_PATHS)
}

/// Caller-supplied name first, then the document's own, then `unknown`
pub fn resolve_name(given: Option<&str>, from_document: Option<String>) -> String {
    given
        .map(normalize_name)
        .filter(|name| !name.is_empty())
        .or(from_document)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Put `key` first in the object, replacing any previous value
pub fn prepend_field(document: Map<String, Value>, key: &str, value: Value) -> Map<String, Value> {
    let mut result = Map::with_capacity(document.len() + 1);
    result.insert(key.to_string(), value);
    for (k, v) in document {
        if k != key {
            result.insert(k, v);
        }
    }
    result
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisScore {
    pub axis: String,
    pub score: Option<i64>,
    pub confidence: Option<String>,
}

/// `scoring_axes` of a profile in document order. Scores outside 0..=4 are
/// logged and dropped.
pub fn scoring_axes(profile: &Value) -> Vec<AxisScore> {
    let Some(axes) = profile.get("scoring_axes").and_then(Value::as_object) else {
        return Vec::new();
    };

    axes.iter()
        .map(|(axis, entry)| {
            let score = entry.get("score").and_then(Value::as_i64);
            let score = match score {
                Some(s) if (0..=4).contains(&s) => Some(s),
                Some(s) => {
                    warn!("Axis '{}' has out-of-range score {}", axis, s);
                    None
                }
                None => None,
            };
            AxisScore {
                axis: axis.clone(),
                score,
                confidence: entry
                    .get("confidence")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }
        })
        .collect()
}

/// `overall.match_score` and `overall.score_band` of a comparison
pub fn match_score(comparison: &Value) -> Option<(i64, Option<String>)> {
    let overall = comparison.get("overall")?;
    let score = overall.get("match_score")?.as_i64()?;
    let band = overall
        .get("score_band")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some((score, band))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_company_name_paths() {
        let profile = json!({
            "_meta": { "company_name": "unknown" },
            "company_meta": { "company_name": "  토스  " }
        });
        assert_eq!(company_name(&profile).as_deref(), Some("토스"));
        assert_eq!(company_name(&json!({ "company_meta": {} })), None);
    }

    #[test]
    fn test_applicant_name() {
        let profile = json!({ "profile_meta": { "candidate_name": "Kim  Minsu" } });
        assert_eq!(applicant_name(&profile).as_deref(), Some("Kim Minsu"));
        let unnamed = json!({ "profile_meta": { "candidate_name": "UNKNOWN" } });
        assert_eq!(applicant_name(&unnamed), None);
    }

    #[test]
    fn test_resolve_name() {
        assert_eq!(resolve_name(Some("Toss"), Some("x".into())), "Toss");
        assert_eq!(resolve_name(Some(" "), Some("x".into())), "x");
        assert_eq!(resolve_name(None, None), UNKNOWN);
    }

    #[test]
    fn test_prepend_field() {
        let doc = json!({ "a": 1, "_meta": "old", "b": 2 })
            .as_object()
            .cloned()
            .unwrap();
        let result = prepend_field(doc, "_meta", json!("new"));
        let keys: Vec<_> = result.keys().cloned().collect();
        assert_eq!(keys[0], "_meta");
        assert_eq!(result["_meta"], "new");
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_scoring_axes() {
        let profile = json!({
            "scoring_axes": {
                "ownership_user": { "score": 3, "confidence": "high" },
                "growth_orientation_user": { "score": 9 },
                "work_expectation_user": { "score": "unknown" }
            }
        });
        let axes = scoring_axes(&profile);
        assert_eq!(axes.len(), 3);
        let ownership = axes.iter().find(|a| a.axis == "ownership_user").unwrap();
        assert_eq!(ownership.score, Some(3));
        assert_eq!(ownership.confidence.as_deref(), Some("high"));
        assert!(axes.iter().filter(|a| a.axis != "ownership_user").all(|a| a.score.is_none()));
        assert!(scoring_axes(&json!({})).is_empty());
    }

    #[test]
    fn test_match_score() {
        let comparison = json!({ "overall": { "match_score": 72, "score_band": "high" } });
        assert_eq!(match_score(&comparison), Some((72, Some("high".into()))));
        assert_eq!(match_score(&json!({ "overall": {} })), None);
    }
}
