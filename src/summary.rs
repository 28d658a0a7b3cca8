//! Natural-language review summary of the collected workflow choices

use handlebars::Handlebars;
use regex::RegexBuilder;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::StepCatalog;
use crate::config::SummaryConfig;
use crate::types::WizardFormData;

/// Shown in place of the summary until some data has been collected
pub const EMPTY_SUMMARY: &str = "Complete the previous steps to see your workflow summary here.";

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Template render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn as_str(self) -> &'static str {
        match self {
            Connector::And => "and",
            Connector::Or => "or",
        }
    }
}

/// Join items for prose: "a", "a or b", "a, b or c"
pub fn format_array_for_display<S: AsRef<str>>(
    items: &[S],
    connector: Connector,
) -> Option<String> {
    let c = connector.as_str();
    match items {
        [] => None,
        [only] => Some(only.as_ref().to_string()),
        [first, second] => Some(format!("{} {c} {}", first.as_ref(), second.as_ref())),
        [rest @ .., last] => {
            let head: Vec<&str> = rest.iter().map(|s| s.as_ref()).collect();
            Some(format!("{} {c} {}", head.join(", "), last.as_ref()))
        }
    }
}

/// Drop a leading criteria word from each item, e.g. "Record Created" -> "Created"
pub fn strip_criteria_prefix(items: Vec<String>, criteria: Option<&str>) -> Vec<String> {
    let Some(criteria) = criteria.filter(|c| !c.is_empty()) else {
        return items;
    };
    let Ok(prefix) = RegexBuilder::new(&format!(r"^{}\s*", regex::escape(criteria)))
        .case_insensitive(true)
        .build()
    else {
        return items;
    };

    items
        .into_iter()
        .map(|item| prefix.replace(&item, "").into_owned())
        .collect()
}

/// Slots of the summary, pulled out of the form data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    pub criteria_type: Option<String>,
    pub record_types: Option<Vec<String>>,
    pub triggers: Option<Vec<String>>,
    pub actions: Option<Vec<String>>,
    pub has_data: bool,
}

/// Display-ready text for each slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryText {
    pub criteria: Option<String>,
    pub triggers: Option<String>,
    pub actions: Option<String>,
}

fn lookup(
    form_data: &WizardFormData,
    catalog: Option<&StepCatalog>,
    step_id: &str,
    field_id: &str,
) -> Option<Vec<String>> {
    let value = form_data.get(step_id)?.get(field_id)?;
    let field = catalog
        .and_then(|c| c.step_by_id(step_id))
        .and_then(|s| s.fields.iter().find(|f| f.id == field_id));

    let labels: Vec<String> = value
        .selections()
        .into_iter()
        .map(|v| {
            field
                .and_then(|f| f.option_label(v))
                .unwrap_or(v)
                .to_string()
        })
        .collect();
    (!labels.is_empty()).then_some(labels)
}

/// Pull the summary slots out of the form data. Values are shown by their
/// option label when a catalog is given.
pub fn extract_review_summary(
    form_data: &WizardFormData,
    catalog: Option<&StepCatalog>,
    config: &SummaryConfig,
) -> ReviewSummary {
    let criteria_type = lookup(form_data, catalog, &config.criteria_step, &config.criteria_field)
        .and_then(|v| v.into_iter().next());
    let record_types = lookup(
        form_data,
        catalog,
        &config.record_types_step,
        &config.record_types_field,
    );
    let triggers = lookup(form_data, catalog, &config.triggers_step, &config.triggers_field)
        .map(|t| strip_criteria_prefix(t, criteria_type.as_deref()));
    let actions = lookup(form_data, catalog, &config.actions_step, &config.actions_field);

    let has_data = criteria_type.is_some()
        || record_types.is_some()
        || triggers.is_some()
        || actions.is_some();

    ReviewSummary {
        criteria_type,
        record_types,
        triggers,
        actions,
        has_data,
    }
}

pub fn generate_summary_text(summary: &ReviewSummary) -> SummaryText {
    SummaryText {
        criteria: summary.criteria_type.clone(),
        triggers: summary
            .triggers
            .as_deref()
            .and_then(|t| format_array_for_display(t, Connector::Or)),
        actions: summary
            .actions
            .as_deref()
            .and_then(|a| format_array_for_display(a, Connector::And)),
    }
}

/// Render the summary sentence through the configured template
pub fn render_summary(
    summary: &ReviewSummary,
    config: &SummaryConfig,
) -> Result<String, SummaryError> {
    if !summary.has_data {
        return Ok(EMPTY_SUMMARY.to_string());
    }

    let text = generate_summary_text(summary);
    let slot = |value: Option<String>, missing: &str| {
        value.map_or_else(|| missing.to_string(), |v| v.to_lowercase())
    };

    let data = serde_json::json!({
        "criteria": slot(text.criteria, "[criteria not selected]"),
        "triggers": slot(text.triggers, "[trigger not selected]"),
        "actions": slot(text.actions, "[action not selected]"),
        "record_types": summary.record_types.clone().unwrap_or_default(),
    });

    let mut hbs = Handlebars::new();
    hbs.set_strict_mode(false);
    hbs.register_escape_fn(handlebars::no_escape);
    Ok(hbs.render_template(&config.template, &data)?)
}

/// Summary sentence followed by the selected record types, one per line
pub fn render_review(
    summary: &ReviewSummary,
    config: &SummaryConfig,
) -> Result<String, SummaryError> {
    let mut out = render_summary(summary, config)?;
    for record_type in summary.record_types.iter().flatten() {
        out.push_str("\n  • ");
        out.push_str(record_type);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldValue, StepFormData};

    fn form(entries: &[(&str, &str, FieldValue)]) -> WizardFormData {
        let mut data = WizardFormData::new();
        for (step, field, value) in entries {
            data.entry((*step).to_string())
                .or_insert_with(StepFormData::new)
                .insert((*field).to_string(), value.clone());
        }
        data
    }

    #[test]
    fn test_format_two_items_with_or() {
        assert_eq!(
            format_array_for_display(&["Record Created", "Record Updated"], Connector::Or)
                .as_deref(),
            Some("Record Created or Record Updated")
        );
    }

    #[test]
    fn test_format_single_and_empty() {
        assert_eq!(
            format_array_for_display(&["Only"], Connector::And).as_deref(),
            Some("Only")
        );
        let empty: [&str; 0] = [];
        assert_eq!(format_array_for_display(&empty, Connector::And), None);
    }

    #[test]
    fn test_format_three_or_more() {
        assert_eq!(
            format_array_for_display(&["a", "b", "c"], Connector::And).as_deref(),
            Some("a, b and c")
        );
        assert_eq!(
            format_array_for_display(&["a", "b", "c", "d"], Connector::Or).as_deref(),
            Some("a, b, c or d")
        );
    }

    #[test]
    fn test_strip_criteria_prefix_case_insensitive() {
        let items = vec!["Record Created".to_string(), "recordUpdated".to_string()];
        assert_eq!(
            strip_criteria_prefix(items, Some("record")),
            vec!["Created".to_string(), "Updated".to_string()]
        );
    }

    #[test]
    fn test_strip_criteria_prefix_escapes_pattern() {
        let items = vec!["a.b thing".to_string(), "axb thing".to_string()];
        assert_eq!(
            strip_criteria_prefix(items, Some("a.b")),
            vec!["thing".to_string(), "axb thing".to_string()]
        );
    }

    #[test]
    fn test_extract_without_data() {
        let summary =
            extract_review_summary(&WizardFormData::new(), None, &SummaryConfig::default());
        assert!(!summary.has_data);
        assert_eq!(
            render_summary(&summary, &SummaryConfig::default()).unwrap(),
            EMPTY_SUMMARY
        );
    }

    #[test]
    fn test_render_full_summary_with_labels() {
        let catalog = StepCatalog::default_workflow();
        let data = form(&[
            ("step-1", "criteria-type", "record".into()),
            ("step-2", "recordTypes", vec!["password", "rack"].into()),
            ("step-3", "triggers", vec!["recordCreated", "recordUpdated"].into()),
            ("step-4", "actions", vec!["flag", "email"].into()),
        ]);
        let config = SummaryConfig::default();

        let summary = extract_review_summary(&data, Some(&catalog), &config);
        assert_eq!(summary.criteria_type.as_deref(), Some("Record"));
        assert_eq!(
            summary.record_types,
            Some(vec!["Password".to_string(), "Rack".to_string()])
        );

        let text = render_summary(&summary, &config).unwrap();
        assert_eq!(
            text,
            "When any of the following record types is created or updated, add flag and send email."
        );
    }

    #[test]
    fn test_render_review_lists_record_types() {
        let catalog = StepCatalog::default_workflow();
        let data = form(&[
            ("step-1", "criteria-type", "record".into()),
            ("step-2", "recordTypes", vec!["password", "rack"].into()),
        ]);
        let config = SummaryConfig::default();

        let summary = extract_review_summary(&data, Some(&catalog), &config);
        let text = render_review(&summary, &config).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("When any of the following record types is"));
        assert_eq!(lines[1], "  • Password");
        assert_eq!(lines[2], "  • Rack");
    }

    #[test]
    fn test_render_review_without_data_is_placeholder() {
        let summary = ReviewSummary::default();
        assert_eq!(
            render_review(&summary, &SummaryConfig::default()).unwrap(),
            EMPTY_SUMMARY
        );
    }

    #[test]
    fn test_render_with_missing_slots() {
        let data = form(&[("step-1", "criteria-type", "company".into())]);
        let config = SummaryConfig::default();

        let summary = extract_review_summary(&data, None, &config);
        let text = render_summary(&summary, &config).unwrap();
        assert_eq!(
            text,
            "When any of the following company types is [trigger not selected], [action not selected]."
        );
    }

    #[test]
    fn test_custom_template_and_mapping() {
        let data = form(&[("flow", "when", vec!["x", "y"].into())]);
        let config = SummaryConfig {
            template: "On {{triggers}}: {{actions}}".to_string(),
            triggers_step: "flow".to_string(),
            triggers_field: "when".to_string(),
            ..SummaryConfig::default()
        };

        let summary = extract_review_summary(&data, None, &config);
        assert_eq!(
            render_summary(&summary, &config).unwrap(),
            "On x or y: [action not selected]"
        );
    }
}
