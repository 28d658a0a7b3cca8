//! Core data model for the workflow wizard: steps, sections, fields and the
//! form data collected against them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type StepId = String;
pub type FieldId = String;
pub type SectionId = String;

/// Section id used when no step list is available to derive one from
pub const DEFAULT_SECTION_ID: &str = "section-1";

/// One page of the wizard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: StepId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub section_id: SectionId,
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Locally cached validity, set by the host after validation
    #[serde(default)]
    pub is_valid: bool,
}

/// A named group of steps shown in the progress header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub step_ids: Vec<StepId>,
    /// Display hint only; completion is tracked by the navigation state
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    /// Exactly one value
    SingleSelect,
    /// Zero or more values
    MultiSelect,
}

/// One input unit within a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: FieldId,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub label: String,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub allow_select_all: bool,
    /// Minimum number of selections (multi-select only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_selections: Option<usize>,
}

impl Field {
    /// Empty value appropriate for this field's kind
    pub fn empty_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::SingleSelect => FieldValue::Single(String::new()),
            FieldKind::MultiSelect => FieldValue::Multi(Vec::new()),
        }
    }

    /// Label of the option with the given value, if any
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    pub id: String,
    pub label: String,
    pub value: String,
    /// Display cache, recomputed from form data selections
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Value of a single field: one string for single-select, a list for multi-select
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// Selected values as a slice-like list (single values yield one element unless empty)
    pub fn selections(&self) -> Vec<&str> {
        match self {
            FieldValue::Single(v) if v.is_empty() => Vec::new(),
            FieldValue::Single(v) => vec![v.as_str()],
            FieldValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            FieldValue::Single(v) => Some(v),
            FieldValue::Multi(_) => None,
        }
    }

    pub fn as_multi(&self) -> Option<&[String]> {
        match self {
            FieldValue::Multi(vs) => Some(vs),
            FieldValue::Single(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Multi(values)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

/// Field id -> value for one step
pub type StepFormData = BTreeMap<FieldId, FieldValue>;

/// Step id -> collected values, accumulated across the session
pub type WizardFormData = BTreeMap<StepId, StepFormData>;

/// Navigation position captured alongside saved form data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSnapshot {
    pub current_step_index: usize,
    pub current_section_id: SectionId,
    #[serde(with = "last_completed")]
    pub last_completed_step_index: Option<usize>,
}

impl Default for NavigationSnapshot {
    fn default() -> Self {
        Self {
            current_step_index: 0,
            current_section_id: DEFAULT_SECTION_ID.to_string(),
            last_completed_step_index: None,
        }
    }
}

/// The single retained resume-later snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProgress {
    pub form_data: WizardFormData,
    pub navigation_state: NavigationSnapshot,
    pub timestamp: DateTime<Utc>,
}

/// Serializes "no completed step" as `-1` to keep snapshot files compatible
/// with hosts that store the bookmark as a plain integer.
mod last_completed {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(i) => s.serialize_i64(i64::try_from(*i).unwrap_or(i64::MAX)),
            None => s.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(d)?;
        Ok(usize::try_from(raw).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_untagged_serde() {
        let single: FieldValue = serde_json::from_str("\"record\"").unwrap();
        assert_eq!(single, FieldValue::Single("record".to_string()));

        let multi: FieldValue = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert_eq!(multi, FieldValue::from(vec!["a", "b"]));
    }

    #[test]
    fn test_empty_single_has_no_selections() {
        assert!(FieldValue::from("").selections().is_empty());
        assert_eq!(FieldValue::from("x").selections(), vec!["x"]);
    }

    #[test]
    fn test_snapshot_serializes_missing_bookmark_as_minus_one() {
        let snapshot = NavigationSnapshot::default();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["lastCompletedStepIndex"], -1);
        assert_eq!(json["currentSectionId"], "section-1");

        let back: NavigationSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back.last_completed_step_index, None);
    }

    #[test]
    fn test_field_kind_uses_kebab_case() {
        let json = serde_json::to_string(&FieldKind::MultiSelect).unwrap();
        assert_eq!(json, "\"multi-select\"");
    }
}
