//! Biometric context and the profile derived from it.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{NpError, Result};

pub const FLAG_HIGH_BP: &str = "high-bp";
pub const FLAG_LOW_ACTIVITY: &str = "low-activity";

const HIGH_RISK_SYSTOLIC: f64 = 140.0;
const HIGH_RISK_DIASTOLIC: f64 = 90.0;
const HIGH_RISK_BLOOD_SUGAR: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Low,
    Moderate,
    High,
}

impl ActivityLevel {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "moderate" | "medium" => Some(Self::Moderate),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for ActivityLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown activity level {raw:?}")))
    }
}

/// One wearable reading. Replaced wholesale on every refresh.
///
/// The activity level is read from `activityLevel` or, as wearable streams
/// usually nest it, `analysis.activityLevel`. An unrecognized level reads as
/// unknown rather than rejecting the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireSnapshot")]
pub struct ContextSnapshot {
    #[serde(default)]
    pub heart_rate: Option<f64>,
    #[serde(default)]
    pub steps: Option<u64>,
    #[serde(default)]
    pub calories_burned: Option<f64>,
    #[serde(default)]
    pub bp_systolic: Option<f64>,
    #[serde(default)]
    pub bp_diastolic: Option<f64>,
    #[serde(default)]
    pub blood_sugar: Option<f64>,
    #[serde(default)]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSnapshot {
    #[serde(default)]
    heart_rate: Option<f64>,
    #[serde(default)]
    steps: Option<u64>,
    #[serde(default)]
    calories_burned: Option<f64>,
    #[serde(default)]
    bp_systolic: Option<f64>,
    #[serde(default)]
    bp_diastolic: Option<f64>,
    #[serde(default)]
    blood_sugar: Option<f64>,
    #[serde(default)]
    activity_level: Option<Value>,
    #[serde(default)]
    analysis: Option<WireAnalysis>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnalysis {
    #[serde(default)]
    activity_level: Option<Value>,
}

fn lenient_activity(raw: Option<&Value>) -> Option<ActivityLevel> {
    let raw = raw?;
    let level = raw.as_str().and_then(ActivityLevel::parse);
    if level.is_none() && !raw.is_null() {
        debug!(activity = %raw, "unrecognized activity level, treating as unknown");
    }
    level
}

impl From<WireSnapshot> for ContextSnapshot {
    fn from(wire: WireSnapshot) -> Self {
        let activity_level = lenient_activity(wire.activity_level.as_ref()).or_else(|| {
            lenient_activity(
                wire.analysis
                    .as_ref()
                    .and_then(|analysis| analysis.activity_level.as_ref()),
            )
        });
        Self {
            heart_rate: wire.heart_rate,
            steps: wire.steps,
            calories_burned: wire.calories_burned,
            bp_systolic: wire.bp_systolic,
            bp_diastolic: wire.bp_diastolic,
            blood_sugar: wire.blood_sugar,
            activity_level,
            timestamp: wire.timestamp,
        }
    }
}

impl ContextSnapshot {
    #[must_use]
    pub fn has_blood_pressure(&self) -> bool {
        self.bp_systolic.is_some() || self.bp_diastolic.is_some()
    }

    /// Elevated enough to favour low-sodium dishes (≥130 systolic or ≥80 diastolic).
    #[must_use]
    pub fn bp_elevated(&self) -> bool {
        self.bp_systolic.unwrap_or(0.0) >= 130.0 || self.bp_diastolic.unwrap_or(0.0) >= 80.0
    }

    /// Readings serious enough to suggest seeing a doctor.
    #[must_use]
    pub fn is_high_risk(&self) -> bool {
        self.bp_systolic.unwrap_or(0.0) >= HIGH_RISK_SYSTOLIC
            || self.bp_diastolic.unwrap_or(0.0) >= HIGH_RISK_DIASTOLIC
            || self.blood_sugar.unwrap_or(0.0) >= HIGH_RISK_BLOOD_SUGAR
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|err| NpError::ValidationFailed(format!("context {}: {err}", path.display())))
    }
}

/// Externally derived dietary needs for the current context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileTags {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub medical_flags: BTreeSet<String>,
    #[serde(default)]
    pub reasoning: String,
}

impl ProfileTags {
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.medical_flags.contains(flag)
    }

    #[must_use]
    pub fn wants(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|err| NpError::ValidationFailed(format!("profile {}: {err}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestCase, run_table_tests};

    #[test]
    fn parses_wearable_json() {
        let raw = r#"{
            "heartRate": 72, "steps": 5400, "caloriesBurned": 450,
            "bpSystolic": 132, "bpDiastolic": 84, "activityLevel": "LOW",
            "timestamp": "2026-10-19T08:30:00Z"
        }"#;
        let ctx: ContextSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(ctx.activity_level, Some(ActivityLevel::Low));
        assert_eq!(ctx.steps, Some(5400));
        assert!(ctx.bp_elevated());
        assert!(!ctx.is_high_risk());
    }

    #[test]
    fn high_risk_thresholds() {
        let sugar = ContextSnapshot {
            blood_sugar: Some(180.0),
            ..ContextSnapshot::default()
        };
        let diastolic = ContextSnapshot {
            bp_diastolic: Some(90.0),
            ..ContextSnapshot::default()
        };
        assert!(sugar.is_high_risk());
        assert!(diastolic.is_high_risk());
        assert!(!ContextSnapshot::default().is_high_risk());
    }

    #[test]
    fn activity_level_read_from_nested_analysis() {
        let raw = r#"{"bpSystolic": 120, "analysis": {"activityLevel": "low"}}"#;
        let ctx: ContextSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(ctx.activity_level, Some(ActivityLevel::Low));
        assert_eq!(ctx.bp_systolic, Some(120.0));

        let both = r#"{"activityLevel": "high", "analysis": {"activityLevel": "low"}}"#;
        let ctx: ContextSnapshot = serde_json::from_str(both).unwrap();
        assert_eq!(ctx.activity_level, Some(ActivityLevel::High));
    }

    #[test]
    fn unknown_activity_level_reads_as_unknown() {
        let raw = r#"{"activityLevel": "sedentary", "caloriesBurned": 300}"#;
        let ctx: ContextSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(ctx.activity_level, None);
        assert_eq!(ctx.calories_burned, Some(300.0));

        let fallback = r#"{"activityLevel": 3, "analysis": {"activityLevel": "Moderate"}}"#;
        let ctx: ContextSnapshot = serde_json::from_str(fallback).unwrap();
        assert_eq!(ctx.activity_level, Some(ActivityLevel::Moderate));
    }

    #[test]
    fn activity_level_parsing() {
        let cases = vec![
            TestCase {
                name: "lowercase",
                input: "low",
                expected: Some(ActivityLevel::Low),
            },
            TestCase {
                name: "mixed case with padding",
                input: "  High ",
                expected: Some(ActivityLevel::High),
            },
            TestCase {
                name: "medium alias",
                input: "medium",
                expected: Some(ActivityLevel::Moderate),
            },
            TestCase {
                name: "unknown",
                input: "sedentary",
                expected: None,
            },
            TestCase {
                name: "blank",
                input: "",
                expected: None,
            },
        ];
        run_table_tests(cases, ActivityLevel::parse).unwrap();
    }
}
