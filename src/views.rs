//! Derived navigation and progress projections.
//!
//! These are recomputed on every read and hold no state of their own.

use std::collections::BTreeSet;

use crate::types::{Section, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationView {
    pub is_first_step: bool,
    pub is_last_step: bool,
    pub can_go_back: bool,
    pub can_go_next: bool,
    pub last_completed_step_index: Option<usize>,
}

/// Status of one step for a progress indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepProgress {
    pub is_completed: bool,
    pub is_active: bool,
    /// Purely positional: the cursor is at or beyond this step
    pub is_visited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionProgress {
    pub section_id: String,
    pub title: String,
    pub is_completed: bool,
    pub is_active: bool,
}

pub fn compute_navigation_state(
    current_index: usize,
    steps: &[Step],
    visited: &BTreeSet<usize>,
    is_form_valid: bool,
) -> NavigationView {
    let is_first_step = current_index == 0;
    let is_last_step = steps.len().checked_sub(1) == Some(current_index);

    NavigationView {
        is_first_step,
        is_last_step,
        can_go_back: !is_first_step,
        can_go_next: is_form_valid && !is_last_step,
        last_completed_step_index: visited.last().copied(),
    }
}

pub fn compute_progress_state(
    current_index: usize,
    steps: &[Step],
    visited: &BTreeSet<usize>,
) -> Vec<StepProgress> {
    (0..steps.len())
        .map(|i| StepProgress {
            is_completed: visited.contains(&i),
            is_active: i == current_index,
            is_visited: i <= current_index,
        })
        .collect()
}

/// A section is completed once every step it maps to is in the visited set
pub fn compute_section_progress(
    current_section_id: &str,
    sections: &[Section],
    steps: &[Step],
    visited: &BTreeSet<usize>,
) -> Vec<SectionProgress> {
    sections
        .iter()
        .map(|section| {
            let indices: Vec<usize> = section
                .step_ids
                .iter()
                .filter_map(|id| steps.iter().position(|s| &s.id == id))
                .collect();

            SectionProgress {
                section_id: section.id.clone(),
                title: section.title.clone(),
                is_completed: !indices.is_empty() && indices.iter().all(|i| visited.contains(i)),
                is_active: section.id == current_section_id,
            }
        })
        .collect()
}
