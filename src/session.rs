//! Wizard session: ties the catalog, navigation and form stores together and
//! implements the host side of the validate-then-transition protocol.
//!
//! Actions that need validation run in three phases so a slow validator can
//! never race a second action:
//!
//! 1. [`WizardSession::begin`] captures the current step and its candidate
//!    data and marks an action in flight (a second `begin` returns `None`).
//! 2. The caller validates the candidate, possibly asynchronously.
//! 3. [`WizardSession::commit`] re-checks that the wizard is still on the
//!    same step and either commits the transition or discards it.
//!
//! [`WizardSession::next`] and [`WizardSession::save_draft`] run all three.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::catalog::StepCatalog;
use crate::config::Config;
use crate::form::FormStore;
use crate::navigation::NavigationState;
use crate::persistence::{self, PersistenceError, ProgressStore};
use crate::summary::{self, SummaryError};
use crate::types::{FieldId, FieldValue, Step, StepFormData};
use crate::validation::{self, ValidationResult, Validator};
use crate::views::{self, NavigationView, SectionProgress, StepProgress};

/// Action that must pass validation before it commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Advance to the next step
    Next,
    /// Snapshot progress (the "Save Draft" button on the last step)
    SaveDraft,
}

/// An action waiting for its validation result
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub kind: ActionKind,
    pub step_id: String,
    pub step_index: usize,
    pub candidate: StepFormData,
}

/// What happened to an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Moved to the next step
    Advanced,
    /// Progress snapshot taken
    Saved,
    /// Validation failed; nothing changed
    Invalid(BTreeMap<FieldId, String>),
    /// The wizard moved on while validation was pending; result discarded
    Stale,
    /// Not allowed right now (already in flight, last step, no current step)
    Blocked,
}

pub struct WizardSession {
    catalog: StepCatalog,
    navigation: NavigationState,
    form: FormStore,
    store: Box<dyn ProgressStore>,
    /// Working values of the current step, as reported by the field renderer
    candidate: StepFormData,
    in_flight: bool,
    mounted: bool,
}

impl WizardSession {
    pub fn new(catalog: StepCatalog, store: Box<dyn ProgressStore>) -> Self {
        let navigation = NavigationState::new(catalog.steps());
        let mut session = Self {
            catalog,
            navigation,
            form: FormStore::new(),
            store,
            candidate: StepFormData::new(),
            in_flight: false,
            mounted: false,
        };
        session.load_candidate();
        session
    }

    /// Build a session from configuration: catalog file (or the built-in
    /// workflow) and the configured persistence backend
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = match &config.paths.catalog {
            Some(path) => StepCatalog::from_path(path.as_ref())
                .with_context(|| format!("Failed to load catalog from {path}"))?,
            None => StepCatalog::default_workflow(),
        };
        Ok(Self::new(catalog, persistence::store_from_config(config)))
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn form(&self) -> &FormStore {
        &self.form
    }

    pub fn candidate(&self) -> &StepFormData {
        &self.candidate
    }

    pub fn is_validating(&self) -> bool {
        self.in_flight
    }

    /// Current step, or `None` if the index points outside the catalog
    pub fn current_step(&self) -> Option<&Step> {
        self.catalog.steps().get(self.navigation.current_step_index())
    }

    /// Restore saved progress. Runs once per session; later calls return
    /// `Ok(false)` without touching anything.
    pub fn mount(&mut self) -> Result<bool, PersistenceError> {
        if self.mounted {
            return Ok(false);
        }
        self.mounted = true;

        if let Some(progress) = self.store.load()? {
            self.form.load_saved_progress(progress);
        }
        let Some(snapshot) = self.form.restore_from_saved() else {
            return Ok(false);
        };

        info!(step = snapshot.current_step_index, "restoring to step");
        self.navigation.restore_navigation_state(&snapshot);
        self.catalog.sync_selections(&self.form);
        self.load_candidate();
        if self.current_step().is_none() {
            warn!(
                step = snapshot.current_step_index,
                steps = self.catalog.steps().len(),
                "restored step is outside the catalog"
            );
        }
        Ok(true)
    }

    /// Record a field change from the renderer
    pub fn set_field(&mut self, field_id: &str, value: FieldValue) {
        let Some(step_id) = self.current_step().map(|s| s.id.clone()) else {
            return;
        };
        self.catalog.update_field_selection(&step_id, field_id, value.selections().as_slice());
        self.candidate.insert(field_id.to_string(), value);
        self.form.mark_step_dirty(&step_id, true);
        self.navigation.set_has_unsaved_changes(true);
    }

    /// Toggle every option of a select-all field; `false` if the field does
    /// not allow it
    pub fn toggle_select_all(&mut self, field_id: &str) -> bool {
        let Some(step_id) = self.current_step().map(|s| s.id.clone()) else {
            return false;
        };
        match self.catalog.toggle_select_all(&step_id, field_id) {
            Some(selection) => {
                self.candidate.insert(field_id.to_string(), FieldValue::Multi(selection));
                self.form.mark_step_dirty(&step_id, true);
                self.navigation.set_has_unsaved_changes(true);
                true
            }
            None => false,
        }
    }

    /// Synchronous validity of the current candidate under the rule table
    pub fn is_current_step_valid(&self) -> bool {
        self.current_step()
            .map(|step| validation::validate_step(step, &self.candidate).is_valid)
            .unwrap_or(false)
    }

    pub fn navigation_view(&self) -> NavigationView {
        views::compute_navigation_state(
            self.navigation.current_step_index(),
            self.catalog.steps(),
            self.navigation.visited_valid_steps(),
            self.is_current_step_valid(),
        )
    }

    pub fn progress(&self) -> Vec<StepProgress> {
        views::compute_progress_state(
            self.navigation.current_step_index(),
            self.catalog.steps(),
            self.navigation.visited_valid_steps(),
        )
    }

    pub fn section_progress(&self) -> Vec<SectionProgress> {
        views::compute_section_progress(
            self.navigation.current_section_id(),
            self.catalog.sections(),
            self.catalog.steps(),
            self.navigation.visited_valid_steps(),
        )
    }

    /// Start a validated action. `None` when another action is in flight,
    /// there is no current step, or `Next` is requested on the last step.
    pub fn begin(&mut self, kind: ActionKind) -> Option<PendingAction> {
        if self.in_flight {
            debug!(?kind, "action ignored while validation is pending");
            return None;
        }
        let step_index = self.navigation.current_step_index();
        let step = self.current_step()?;
        if kind == ActionKind::Next && step_index + 1 >= self.catalog.steps().len() {
            return None;
        }

        let pending = PendingAction {
            kind,
            step_id: step.id.clone(),
            step_index,
            candidate: self.candidate.clone(),
        };
        self.in_flight = true;
        Some(pending)
    }

    /// Finish an action with its validation result
    pub fn commit(
        &mut self,
        pending: PendingAction,
        result: &ValidationResult,
    ) -> Result<ActionOutcome, PersistenceError> {
        self.in_flight = false;

        let still_current = self.navigation.current_step_index() == pending.step_index
            && self.current_step().map(|s| s.id.as_str()) == Some(pending.step_id.as_str());
        if !still_current {
            warn!(
                step = %pending.step_id,
                "discarding validation result for a step no longer shown"
            );
            return Ok(ActionOutcome::Stale);
        }

        if !result.is_valid {
            self.catalog.mark_step_valid(&pending.step_id, false);
            return Ok(ActionOutcome::Invalid(result.errors.clone()));
        }

        self.catalog.mark_step_valid(&pending.step_id, true);
        self.form.update_form_data(&pending.step_id, pending.candidate);

        match pending.kind {
            ActionKind::Next => {
                self.navigation.go_next(self.catalog.steps());
                self.load_candidate();
                Ok(ActionOutcome::Advanced)
            }
            ActionKind::SaveDraft => {
                self.persist()?;
                Ok(ActionOutcome::Saved)
            }
        }
    }

    pub async fn next(
        &mut self,
        validator: &dyn Validator,
    ) -> Result<ActionOutcome, PersistenceError> {
        self.run(ActionKind::Next, validator).await
    }

    pub async fn save_draft(
        &mut self,
        validator: &dyn Validator,
    ) -> Result<ActionOutcome, PersistenceError> {
        self.run(ActionKind::SaveDraft, validator).await
    }

    async fn run(
        &mut self,
        kind: ActionKind,
        validator: &dyn Validator,
    ) -> Result<ActionOutcome, PersistenceError> {
        let Some(pending) = self.begin(kind) else {
            return Ok(ActionOutcome::Blocked);
        };
        let result = match self.current_step() {
            Some(step) => validator.validate(step, &pending.candidate).await,
            None => ValidationResult::default(),
        };
        self.commit(pending, &result)
    }

    /// Persist whatever has been entered on the current step, unvalidated,
    /// and snapshot progress
    pub fn save_and_finish_later(&mut self) -> Result<(), PersistenceError> {
        if let Some(step_id) = self.current_step().map(|s| s.id.clone()) {
            self.form.update_form_data(&step_id, self.candidate.clone());
        }
        self.persist()
    }

    /// Step back one; `false` when blocked or already at the first step
    pub fn back(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        let before = self.navigation.current_step_index();
        self.navigation.go_back(self.catalog.steps());
        self.moved_from(before)
    }

    pub fn go_to_step(&mut self, index: usize) -> bool {
        if self.in_flight {
            return false;
        }
        if self.navigation.go_to_step(index, self.catalog.steps()) {
            self.load_candidate();
            true
        } else {
            false
        }
    }

    /// Progress header click: jump to a section's first step if reachable,
    /// otherwise ignore
    pub fn click_section(&mut self, section_id: &str) -> bool {
        if self.in_flight {
            return false;
        }
        let Some(first_step_id) = self
            .catalog
            .section_by_id(section_id)
            .and_then(|s| s.step_ids.first())
        else {
            return false;
        };
        let Some(index) = self.catalog.step_index(first_step_id) else {
            return false;
        };
        if !self.navigation.can_navigate_to_step(index) {
            debug!(section = section_id, "section not reachable yet");
            return false;
        }

        let moved = self.navigation.go_to_section(
            section_id,
            self.catalog.steps(),
            self.catalog.sections(),
        );
        if moved {
            self.load_candidate();
        }
        moved
    }

    /// Start over: clear form data, position and completion. The saved
    /// snapshot is kept.
    pub fn reset(&mut self) {
        self.in_flight = false;
        self.form.reset_all_forms();
        self.catalog.reset_steps();
        self.navigation = NavigationState::new(self.catalog.steps());
        self.load_candidate();
    }

    /// Remove the persisted snapshot from the backend
    pub fn discard_saved_progress(&mut self) -> Result<(), PersistenceError> {
        self.store.clear()
    }

    /// Review sentence plus the selected record types
    pub fn render_summary(&self, config: &Config) -> Result<String, SummaryError> {
        let summary = summary::extract_review_summary(
            self.form.all_form_data(),
            Some(&self.catalog),
            &config.summary,
        );
        summary::render_review(&summary, &config.summary)
    }

    fn persist(&mut self) -> Result<(), PersistenceError> {
        let snapshot = self.navigation.snapshot();
        let progress = self.form.save_progress(Some(snapshot)).clone();
        self.navigation.set_has_unsaved_changes(false);
        self.store.save(&progress)
    }

    fn moved_from(&mut self, before: usize) -> bool {
        if self.navigation.current_step_index() == before {
            return false;
        }
        self.load_candidate();
        true
    }

    /// Seed the candidate from saved form data, or empty values per field,
    /// and bring the step's option flags in line with it
    fn load_candidate(&mut self) {
        let Some(step) = self.catalog.steps().get(self.navigation.current_step_index()) else {
            self.candidate = StepFormData::new();
            return;
        };
        self.candidate = match self.form.form_data(&step.id) {
            Some(saved) if !saved.is_empty() => saved.clone(),
            _ => step
                .fields
                .iter()
                .map(|f| (f.id.clone(), f.empty_value()))
                .collect(),
        };

        let step_id = step.id.clone();
        let field_ids: Vec<String> = step.fields.iter().map(|f| f.id.clone()).collect();
        for field_id in field_ids {
            let selected = self
                .candidate
                .get(&field_id)
                .map(FieldValue::selections)
                .unwrap_or_default();
            self.catalog.update_field_selection(&step_id, &field_id, selected.as_slice());
        }
    }
}
