//! Shared types for the wizard core.
//!
//! Everything that is persisted or exchanged with a host lives here so the
//! stores and the persistence layer agree on one serialized shape.

pub mod wizard;

pub use wizard::{
    Field, FieldId, FieldKind, FieldValue, NavigationSnapshot, SavedProgress, Section, SectionId,
    SelectOption, Step, StepFormData, StepId, WizardFormData, DEFAULT_SECTION_ID,
};
