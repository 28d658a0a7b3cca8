//! Navigation state machine: current position, completion record and
//! reachability rules for the wizard.
//!
//! Transitions never fail loudly. A rejected jump returns `false` and a
//! transition past either end of the step list is a no-op; callers decide
//! whether to refresh the UI.

use std::collections::BTreeSet;

use crate::types::{NavigationSnapshot, Section, SectionId, Step, DEFAULT_SECTION_ID};

/// Unsaved-changes flag and the restored completion bookmark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationSummary {
    pub has_unsaved_changes: bool,
    pub last_completed_step_index: Option<usize>,
}

/// Owned navigation state for one wizard session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    current_step_index: usize,
    current_section_id: SectionId,
    /// Steps that passed validation at least once
    visited_valid_steps: BTreeSet<usize>,
    has_unsaved_changes: bool,
    /// Scalar bookmark set by restores; not derived from the visited set
    last_completed_step_index: Option<usize>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            current_step_index: 0,
            current_section_id: DEFAULT_SECTION_ID.to_string(),
            visited_valid_steps: BTreeSet::new(),
            has_unsaved_changes: false,
            last_completed_step_index: None,
        }
    }
}

impl NavigationState {
    /// Start at the first step of `steps`
    pub fn new(steps: &[Step]) -> Self {
        let mut state = Self::default();
        if let Some(first) = steps.first() {
            state.current_section_id = first.section_id.clone();
        }
        state
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn current_section_id(&self) -> &str {
        &self.current_section_id
    }

    pub fn visited_valid_steps(&self) -> &BTreeSet<usize> {
        &self.visited_valid_steps
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    /// Advance one step, recording the step being left as completed.
    ///
    /// Validity is the caller's concern: this never checks form data.
    pub fn go_next(&mut self, steps: &[Step]) {
        let new_index = self.current_step_index + 1;
        let Some(new_step) = steps.get(new_index) else {
            return;
        };

        self.visited_valid_steps.insert(self.current_step_index);
        self.current_step_index = new_index;
        self.current_section_id = new_step.section_id.clone();
        tracing::debug!(
            step = new_index,
            section = %self.current_section_id,
            "advanced to next step"
        );
    }

    /// Step back one; the visited set is left as is
    pub fn go_back(&mut self, steps: &[Step]) {
        if self.current_step_index == 0 {
            return;
        }
        let new_index = self.current_step_index - 1;
        let Some(new_step) = steps.get(new_index) else {
            return;
        };

        self.current_step_index = new_index;
        self.current_section_id = new_step.section_id.clone();
    }

    /// Jump to `target` if it is in range and reachable
    pub fn go_to_step(&mut self, target: usize, steps: &[Step]) -> bool {
        let Some(step) = steps.get(target) else {
            return false;
        };
        if !self.can_navigate_to_step(target) {
            tracing::debug!(target, current = self.current_step_index, "jump rejected");
            return false;
        }

        self.current_step_index = target;
        self.current_section_id = step.section_id.clone();
        true
    }

    /// Jump to the first step of a section
    pub fn go_to_section(
        &mut self,
        section_id: &str,
        steps: &[Step],
        sections: &[Section],
    ) -> bool {
        let Some(first_step_id) = sections
            .iter()
            .find(|s| s.id == section_id)
            .and_then(|s| s.step_ids.first())
        else {
            return false;
        };

        match steps.iter().position(|s| &s.id == first_step_id) {
            Some(index) => self.go_to_step(index, steps),
            None => false,
        }
    }

    /// Past and current steps are always reachable; future steps only once completed
    pub fn can_navigate_to_step(&self, target: usize) -> bool {
        target <= self.current_step_index || self.visited_valid_steps.contains(&target)
    }

    pub fn set_has_unsaved_changes(&mut self, has_unsaved_changes: bool) {
        self.has_unsaved_changes = has_unsaved_changes;
    }

    pub fn set_last_completed_step_index(&mut self, index: Option<usize>) {
        self.last_completed_step_index = index;
    }

    /// Highest completed step, derived from the visited set
    pub fn last_completed_step_index(&self) -> Option<usize> {
        self.visited_valid_steps.last().copied()
    }

    pub fn mark_step_completed(&mut self, index: usize) {
        self.visited_valid_steps.insert(index);
    }

    pub fn is_step_completed(&self, index: usize) -> bool {
        self.visited_valid_steps.contains(&index)
    }

    pub fn clear_visited_steps(&mut self) {
        self.visited_valid_steps.clear();
    }

    /// Overwrite the position from a saved snapshot.
    ///
    /// Only the scalar bookmark is restored; the visited set keeps whatever
    /// it already holds, so steps completed in an earlier session are not
    /// reachable again until they are re-completed.
    pub fn restore_navigation_state(&mut self, snapshot: &NavigationSnapshot) {
        self.current_step_index = snapshot.current_step_index;
        self.current_section_id = snapshot.current_section_id.clone();
        self.last_completed_step_index = snapshot.last_completed_step_index;
    }

    /// Position triple to hand to `FormStore::save_progress`
    pub fn snapshot(&self) -> NavigationSnapshot {
        NavigationSnapshot {
            current_step_index: self.current_step_index,
            current_section_id: self.current_section_id.clone(),
            last_completed_step_index: self.last_completed_step_index(),
        }
    }

    pub fn summary(&self) -> NavigationSummary {
        NavigationSummary {
            has_unsaved_changes: self.has_unsaved_changes,
            last_completed_step_index: self.last_completed_step_index,
        }
    }
}
