//! Per-step validation using a small rule table derived from each field.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::types::{Field, FieldId, FieldKind, FieldValue, Step, StepFormData};

/// Rule applied to one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// No constraint
    Optional,
    /// A non-empty single value
    Presence,
    /// At least `n` selections
    MinCount(usize),
}

impl FieldRule {
    pub fn for_field(field: &Field) -> Self {
        match (field.is_required, field.kind) {
            (false, _) => FieldRule::Optional,
            (true, FieldKind::SingleSelect) => FieldRule::Presence,
            (true, FieldKind::MultiSelect) => {
                FieldRule::MinCount(field.min_selections.unwrap_or(1).max(1))
            }
        }
    }

    /// Error message for a failing value, or `None` if it passes
    pub fn check(&self, value: Option<&FieldValue>) -> Option<String> {
        match self {
            FieldRule::Optional => None,
            FieldRule::Presence => match value.and_then(FieldValue::as_single) {
                Some(v) if !v.is_empty() => None,
                _ => Some("Please select an option".to_string()),
            },
            FieldRule::MinCount(n) => {
                let count = value.and_then(FieldValue::as_multi).map_or(0, <[String]>::len);
                if count >= *n {
                    None
                } else {
                    let plural = if *n > 1 { "s" } else { "" };
                    Some(format!("Please select at least {n} option{plural}"))
                }
            }
        }
    }
}

/// Outcome of validating one step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: BTreeMap<FieldId, String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: BTreeMap::new(),
        }
    }
}

/// Validate candidate data against every field of a step
pub fn validate_step(step: &Step, data: &StepFormData) -> ValidationResult {
    let errors: BTreeMap<FieldId, String> = step
        .fields
        .iter()
        .filter_map(|field| {
            FieldRule::for_field(field)
                .check(data.get(&field.id))
                .map(|msg| (field.id.clone(), msg))
        })
        .collect();

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Validates a step's candidate data, possibly asynchronously
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, step: &Step, data: &StepFormData) -> ValidationResult;
}

/// Validator backed by the field rule table
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator;

#[async_trait]
impl Validator for RuleValidator {
    async fn validate(&self, step: &Step, data: &StepFormData) -> ValidationResult {
        validate_step(step, data)
    }
}
