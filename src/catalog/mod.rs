//! Step and section catalog for the wizard

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::FormStore;
use crate::types::{Section, Step};

mod defaults;

/// Errors that can occur while loading or checking a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Section '{section}' references unknown step '{step}'")]
    UnknownStep { section: String, step: String },
    #[error("Step '{step}' belongs to unknown section '{section}'")]
    UnknownSection { step: String, section: String },
}

/// Partial update for a section's display state
#[derive(Debug, Clone, Default)]
pub struct SectionUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub step_ids: Option<Vec<String>>,
    pub is_completed: Option<bool>,
    pub is_active: Option<bool>,
}

/// Serialized catalog document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub steps: Vec<Step>,
    pub sections: Vec<Section>,
}

/// Owns the steps and sections shown by the wizard
#[derive(Debug, Clone)]
pub struct StepCatalog {
    steps: Vec<Step>,
    sections: Vec<Section>,
    is_loading: bool,
    /// What `reset_steps` returns to
    initial: CatalogDocument,
}

impl StepCatalog {
    pub fn new(steps: Vec<Step>, sections: Vec<Section>) -> Self {
        let initial = CatalogDocument {
            steps: steps.clone(),
            sections: sections.clone(),
        };
        Self {
            steps,
            sections,
            is_loading: false,
            initial,
        }
    }

    /// The built-in five step workflow builder catalog
    pub fn default_workflow() -> Self {
        Self::new(defaults::workflow_steps(), defaults::workflow_sections())
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        let catalog = Self::new(doc.steps, doc.sections);
        catalog.verify()?;
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            steps: self.steps.clone(),
            sections: self.sections.clone(),
        }
    }

    /// Check that sections and steps reference each other consistently
    pub fn verify(&self) -> Result<(), CatalogError> {
        for section in &self.sections {
            if let Some(missing) = section
                .step_ids
                .iter()
                .find(|id| self.step_by_id(id).is_none())
            {
                return Err(CatalogError::UnknownStep {
                    section: section.id.clone(),
                    step: missing.clone(),
                });
            }
        }
        if let Some(orphan) = self
            .steps
            .iter()
            .find(|s| self.section_by_id(&s.section_id).is_none())
        {
            return Err(CatalogError::UnknownSection {
                step: orphan.id.clone(),
                section: orphan.section_id.clone(),
            });
        }
        Ok(())
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn set_loading(&mut self, is_loading: bool) {
        self.is_loading = is_loading;
    }

    pub fn set_steps(&mut self, steps: Vec<Step>) {
        self.steps = steps;
    }

    pub fn set_sections(&mut self, sections: Vec<Section>) {
        self.sections = sections;
    }

    pub fn mark_step_valid(&mut self, step_id: &str, is_valid: bool) {
        if let Some(step) = self.steps.iter_mut().find(|s| s.id == step_id) {
            step.is_valid = is_valid;
        }
    }

    /// Restore the steps and sections the catalog was created with
    pub fn reset_steps(&mut self) {
        self.steps = self.initial.steps.clone();
        self.sections = self.initial.sections.clone();
    }

    /// Recompute option display flags for one field from a selection list
    pub fn update_field_selection<S: AsRef<str>>(
        &mut self,
        step_id: &str,
        field_id: &str,
        selections: &[S],
    ) {
        let Some(field) = self
            .steps
            .iter_mut()
            .find(|s| s.id == step_id)
            .and_then(|s| s.fields.iter_mut().find(|f| f.id == field_id))
        else {
            return;
        };

        for option in &mut field.options {
            option.is_selected = selections.iter().any(|s| s.as_ref() == option.value);
        }
    }

    /// Select every option, or clear them all when every option is already
    /// selected. Only applies to fields that allow select-all; returns the
    /// new selection when applied.
    pub fn toggle_select_all(&mut self, step_id: &str, field_id: &str) -> Option<Vec<String>> {
        let field = self
            .step_by_id(step_id)?
            .fields
            .iter()
            .find(|f| f.id == field_id)?;
        if !field.allow_select_all {
            return None;
        }

        let all_selected = field.options.iter().all(|o| o.is_selected);
        let selections: Vec<String> = if all_selected {
            Vec::new()
        } else {
            field.options.iter().map(|o| o.value.clone()).collect()
        };

        self.update_field_selection(step_id, field_id, &selections);
        Some(selections)
    }

    /// Bring every option's display flag in line with the form data
    pub fn sync_selections(&mut self, form: &FormStore) {
        for step in &mut self.steps {
            let step_data = form.form_data(&step.id);
            for field in &mut step.fields {
                let selected = step_data
                    .and_then(|d| d.get(&field.id))
                    .map(|v| v.selections())
                    .unwrap_or_default();
                for option in &mut field.options {
                    option.is_selected = selected.contains(&option.value.as_str());
                }
            }
        }
    }

    pub fn update_section_state(&mut self, section_id: &str, update: SectionUpdate) {
        let Some(section) = self.sections.iter_mut().find(|s| s.id == section_id) else {
            return;
        };
        if let Some(title) = update.title {
            section.title = title;
        }
        if let Some(description) = update.description {
            section.description = description;
        }
        if let Some(step_ids) = update.step_ids {
            section.step_ids = step_ids;
        }
        if let Some(is_completed) = update.is_completed {
            section.is_completed = is_completed;
        }
        if let Some(is_active) = update.is_active {
            section.is_active = is_active;
        }
    }

    pub fn step_by_id(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    pub fn section_by_id(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    /// Steps owned by a section, in catalog order
    pub fn steps_for_section(&self, section_id: &str) -> Vec<&Step> {
        let Some(section) = self.section_by_id(section_id) else {
            return Vec::new();
        };
        self.steps
            .iter()
            .filter(|s| section.step_ids.contains(&s.id))
            .collect()
    }
}

impl Default for StepCatalog {
    fn default() -> Self {
        Self::default_workflow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, FieldKind, SelectOption};

    fn option(value: &str) -> SelectOption {
        SelectOption {
            id: value.to_string(),
            label: value.to_uppercase(),
            value: value.to_string(),
            is_selected: false,
            icon: None,
        }
    }

    fn three_option_catalog(allow_select_all: bool) -> StepCatalog {
        let step = Step {
            id: "s".to_string(),
            title: "Pick".to_string(),
            description: None,
            section_id: "sec".to_string(),
            fields: vec![Field {
                id: "f".to_string(),
                kind: FieldKind::MultiSelect,
                label: "Pick some".to_string(),
                options: vec![option("a"), option("b"), option("c")],
                is_required: true,
                allow_select_all,
                min_selections: Some(1),
            }],
            is_valid: false,
        };
        let section = Section {
            id: "sec".to_string(),
            title: "Section".to_string(),
            description: None,
            step_ids: vec!["s".to_string()],
            is_completed: false,
            is_active: true,
        };
        StepCatalog::new(vec![step], vec![section])
    }

    fn selected(catalog: &StepCatalog) -> Vec<bool> {
        catalog.steps()[0].fields[0]
            .options
            .iter()
            .map(|o| o.is_selected)
            .collect()
    }

    #[test]
    fn test_default_workflow_is_consistent() {
        let catalog = StepCatalog::default_workflow();
        assert_eq!(catalog.steps().len(), 5);
        assert_eq!(catalog.sections().len(), 4);
        assert!(catalog.verify().is_ok());
        assert_eq!(catalog.steps_for_section("section-1").len(), 2);
    }

    #[test]
    fn test_toggle_select_all_selects_then_clears() {
        let mut catalog = three_option_catalog(true);

        let first = catalog.toggle_select_all("s", "f");
        assert_eq!(first.unwrap().len(), 3);
        assert_eq!(selected(&catalog), vec![true, true, true]);

        let second = catalog.toggle_select_all("s", "f");
        assert_eq!(second, Some(Vec::new()));
        assert_eq!(selected(&catalog), vec![false, false, false]);
    }

    #[test]
    fn test_toggle_select_all_from_partial_selects_all() {
        let mut catalog = three_option_catalog(true);
        catalog.update_field_selection("s", "f", &["b"]);

        catalog.toggle_select_all("s", "f");
        assert_eq!(selected(&catalog), vec![true, true, true]);
    }

    #[test]
    fn test_toggle_select_all_ignored_when_not_allowed() {
        let mut catalog = three_option_catalog(false);
        assert!(catalog.toggle_select_all("s", "f").is_none());
        assert_eq!(selected(&catalog), vec![false, false, false]);
    }

    #[test]
    fn test_update_field_selection_matches_values() {
        let mut catalog = three_option_catalog(true);
        catalog.update_field_selection("s", "f", &["a", "c", "zzz"]);
        assert_eq!(selected(&catalog), vec![true, false, true]);
    }

    #[test]
    fn test_sync_selections_from_form_data() {
        let mut catalog = StepCatalog::default_workflow();
        let mut form = FormStore::new();
        form.set_field_value("step-1", "criteria-type", "record".into());

        catalog.sync_selections(&form);

        let options = &catalog.step_by_id("step-1").unwrap().fields[0].options;
        let picked: Vec<&str> = options
            .iter()
            .filter(|o| o.is_selected)
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(picked, vec!["record"]);
    }

    #[test]
    fn test_mark_valid_and_reset() {
        let mut catalog = StepCatalog::default_workflow();
        catalog.mark_step_valid("step-1", true);
        catalog.update_section_state(
            "section-2",
            SectionUpdate {
                is_completed: Some(true),
                ..SectionUpdate::default()
            },
        );
        assert!(catalog.step_by_id("step-1").unwrap().is_valid);
        assert!(catalog.section_by_id("section-2").unwrap().is_completed);

        catalog.reset_steps();
        assert!(!catalog.step_by_id("step-1").unwrap().is_valid);
        assert!(!catalog.section_by_id("section-2").unwrap().is_completed);
    }

    #[test]
    fn test_lookups_for_missing_ids() {
        let catalog = StepCatalog::default_workflow();
        assert!(catalog.step_by_id("nope").is_none());
        assert!(catalog.section_by_id("nope").is_none());
        assert!(catalog.steps_for_section("nope").is_empty());
    }

    #[test]
    fn test_from_json_rejects_unknown_step_reference() {
        let json = r#"{
            "steps": [{"id": "a", "title": "A", "sectionId": "s1"}],
            "sections": [{"id": "s1", "title": "S1", "stepIds": ["a", "b"]}]
        }"#;
        let err = StepCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownStep { .. }));
    }

    #[test]
    fn test_from_json_round_trip_of_default() {
        let doc = StepCatalog::default_workflow().to_document();
        let json = serde_json::to_string(&doc).unwrap();
        let catalog = StepCatalog::from_json(&json).unwrap();
        assert_eq!(catalog.steps(), StepCatalog::default_workflow().steps());
    }
}
