//! Workflow wizard core
//!
//! A multi-step form wizard: a navigation state machine over grouped steps,
//! per-step form aggregation with a resumable progress snapshot, derived
//! progress views, rule-based step validation and a review summary.

pub mod catalog;
pub mod config;
pub mod form;
pub mod interactive;
pub mod logging;
pub mod navigation;
pub mod persistence;
pub mod session;
pub mod summary;
pub mod types;
pub mod validation;
pub mod views;

pub use catalog::StepCatalog;
pub use form::FormStore;
pub use navigation::NavigationState;
pub use session::WizardSession;
