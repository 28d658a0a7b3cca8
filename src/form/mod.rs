//! Form data aggregation across wizard steps, plus the single saved-progress
//! snapshot used for resume-later.

use chrono::Utc;

use crate::types::{
    FieldValue, NavigationSnapshot, SavedProgress, StepFormData, WizardFormData,
};

/// Owned form state for one wizard session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormStore {
    form_data: WizardFormData,
    is_dirty: bool,
    has_unsaved_changes: bool,
    saved_progress: Option<SavedProgress>,
}

impl FormStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow-merge `partial` into the step's record; absent fields are kept
    pub fn update_form_data(&mut self, step_id: &str, partial: StepFormData) {
        self.form_data
            .entry(step_id.to_string())
            .or_default()
            .extend(partial);
        self.has_unsaved_changes = true;
    }

    pub fn form_data(&self, step_id: &str) -> Option<&StepFormData> {
        self.form_data.get(step_id)
    }

    pub fn all_form_data(&self) -> &WizardFormData {
        &self.form_data
    }

    pub fn field_value(&self, step_id: &str, field_id: &str) -> Option<&FieldValue> {
        self.form_data.get(step_id)?.get(field_id)
    }

    pub fn set_field_value(&mut self, step_id: &str, field_id: &str, value: FieldValue) {
        let mut partial = StepFormData::new();
        partial.insert(field_id.to_string(), value);
        self.update_form_data(step_id, partial);
    }

    /// Sets the global dirty flag. `_step_id` is accepted for call-site
    /// symmetry but dirtiness is not tracked per step.
    pub fn mark_step_dirty(&mut self, _step_id: &str, is_dirty: bool) {
        self.is_dirty = is_dirty;
        self.has_unsaved_changes = is_dirty;
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    /// Empty one step's record, leaving the others alone
    pub fn reset_step_form(&mut self, step_id: &str) {
        self.form_data.insert(step_id.to_string(), StepFormData::new());
    }

    /// Drop all collected data and both flags; the snapshot survives
    pub fn reset_all_forms(&mut self) {
        self.form_data.clear();
        self.is_dirty = false;
        self.has_unsaved_changes = false;
    }

    /// Snapshot current form data with a navigation position, replacing any
    /// earlier snapshot
    pub fn save_progress(&mut self, navigation: Option<NavigationSnapshot>) -> &SavedProgress {
        let progress = SavedProgress {
            form_data: self.form_data.clone(),
            navigation_state: navigation.unwrap_or_default(),
            timestamp: Utc::now(),
        };
        tracing::info!(
            step = progress.navigation_state.current_step_index,
            section = %progress.navigation_state.current_section_id,
            steps_with_data = progress.form_data.len(),
            "progress saved"
        );

        self.has_unsaved_changes = false;
        self.saved_progress.insert(progress)
    }

    /// Merge externally supplied data over the current data, step by step
    pub fn restore_progress(&mut self, data: WizardFormData) {
        self.form_data.extend(data);
        self.has_unsaved_changes = false;
    }

    pub fn saved_progress(&self) -> Option<&SavedProgress> {
        self.saved_progress.as_ref()
    }

    /// Install a snapshot read back from a persistence backend
    pub fn load_saved_progress(&mut self, progress: SavedProgress) {
        self.saved_progress = Some(progress);
    }

    /// Replace form data with the snapshot's and hand back its navigation
    /// position. Does nothing and returns `None` without a snapshot.
    pub fn restore_from_saved(&mut self) -> Option<NavigationSnapshot> {
        let saved = self.saved_progress.as_ref()?;
        self.form_data = saved.form_data.clone();
        self.has_unsaved_changes = false;
        Some(saved.navigation_state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, FieldValue)]) -> StepFormData {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_update_form_data_merges() {
        let mut store = FormStore::new();
        store.update_form_data("step-1", data(&[("a", "1".into())]));
        store.update_form_data("step-1", data(&[("b", "2".into())]));

        let step = store.form_data("step-1").unwrap();
        assert_eq!(step.len(), 2);
        assert_eq!(step["a"], FieldValue::from("1"));
        assert_eq!(step["b"], FieldValue::from("2"));
        assert!(store.has_unsaved_changes());
    }

    #[test]
    fn test_update_form_data_overwrites_same_field() {
        let mut store = FormStore::new();
        store.set_field_value("step-2", "types", vec!["a"].into());
        store.set_field_value("step-2", "types", vec!["b", "c"].into());

        assert_eq!(
            store.field_value("step-2", "types"),
            Some(&FieldValue::from(vec!["b", "c"]))
        );
    }

    #[test]
    fn test_reads_return_none_when_absent() {
        let store = FormStore::new();
        assert!(store.form_data("missing").is_none());
        assert!(store.field_value("missing", "x").is_none());
    }

    #[test]
    fn test_mark_step_dirty_is_global() {
        let mut store = FormStore::new();
        store.mark_step_dirty("step-1", true);
        assert!(store.is_dirty());
        assert!(store.has_unsaved_changes());

        store.mark_step_dirty("step-9", false);
        assert!(!store.is_dirty());
        assert!(!store.has_unsaved_changes());
    }

    #[test]
    fn test_reset_step_form_only_touches_one_step() {
        let mut store = FormStore::new();
        store.set_field_value("step-1", "a", "x".into());
        store.set_field_value("step-2", "b", "y".into());

        store.reset_step_form("step-1");

        assert!(store.form_data("step-1").unwrap().is_empty());
        assert_eq!(store.field_value("step-2", "b"), Some(&FieldValue::from("y")));
    }

    #[test]
    fn test_reset_all_forms_keeps_snapshot() {
        let mut store = FormStore::new();
        store.set_field_value("step-1", "a", "x".into());
        store.mark_step_dirty("step-1", true);
        store.save_progress(None);

        store.reset_all_forms();

        assert!(store.all_form_data().is_empty());
        assert!(!store.is_dirty());
        assert!(!store.has_unsaved_changes());
        assert!(store.saved_progress().is_some());
    }

    #[test]
    fn test_save_progress_uses_default_navigation() {
        let mut store = FormStore::new();
        store.set_field_value("step-1", "a", "x".into());

        let saved = store.save_progress(None).clone();

        assert_eq!(saved.navigation_state, NavigationSnapshot::default());
        assert_eq!(saved.form_data, *store.all_form_data());
        assert!(!store.has_unsaved_changes());
    }

    #[test]
    fn test_save_progress_overwrites_previous_snapshot() {
        let mut store = FormStore::new();
        store.set_field_value("step-1", "a", "x".into());
        store.save_progress(None);
        store.set_field_value("step-1", "a", "y".into());
        let nav = NavigationSnapshot {
            current_step_index: 1,
            current_section_id: "section-1".to_string(),
            last_completed_step_index: Some(0),
        };

        store.save_progress(Some(nav.clone()));

        let saved = store.saved_progress().unwrap();
        assert_eq!(saved.navigation_state, nav);
        assert_eq!(saved.form_data["step-1"]["a"], FieldValue::from("y"));
    }

    #[test]
    fn test_save_reset_restore_round_trip() {
        let mut store = FormStore::new();
        store.set_field_value("step-1", "criteria-type", "record".into());
        store.set_field_value("step-2", "recordTypes", vec!["password", "rack"].into());
        let before = store.all_form_data().clone();
        let nav = NavigationSnapshot {
            current_step_index: 2,
            current_section_id: "section-2".to_string(),
            last_completed_step_index: Some(1),
        };
        store.save_progress(Some(nav.clone()));

        store.reset_all_forms();
        let restored = store.restore_from_saved();

        assert_eq!(restored, Some(nav));
        assert_eq!(*store.all_form_data(), before);
        assert!(!store.has_unsaved_changes());
    }

    #[test]
    fn test_restore_from_saved_is_repeatable() {
        let mut store = FormStore::new();
        store.set_field_value("step-1", "a", "x".into());
        store.save_progress(None);

        assert!(store.restore_from_saved().is_some());
        store.set_field_value("step-1", "a", "changed".into());
        assert!(store.restore_from_saved().is_some());
        assert_eq!(store.field_value("step-1", "a"), Some(&FieldValue::from("x")));
    }

    #[test]
    fn test_restore_from_saved_without_snapshot() {
        let mut store = FormStore::new();
        store.set_field_value("step-1", "a", "x".into());
        let before = store.clone();

        assert!(store.restore_from_saved().is_none());
        assert_eq!(store, before);
    }

    #[test]
    fn test_restore_progress_merges_per_step() {
        let mut store = FormStore::new();
        store.set_field_value("step-1", "a", "x".into());
        store.set_field_value("step-1", "b", "y".into());
        store.set_field_value("step-2", "c", "z".into());

        let mut incoming = WizardFormData::new();
        incoming.insert("step-1".to_string(), data(&[("a", "new".into())]));
        store.restore_progress(incoming);

        // whole step record replaced, other steps kept
        let step1 = store.form_data("step-1").unwrap();
        assert_eq!(step1.len(), 1);
        assert_eq!(step1["a"], FieldValue::from("new"));
        assert!(store.form_data("step-2").is_some());
        assert!(!store.has_unsaved_changes());
    }
}
