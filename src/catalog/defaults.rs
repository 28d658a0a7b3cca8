//! Built-in "new workflow" catalog

use crate::types::{Field, FieldKind, Section, SelectOption, Step};

fn option(value: &str, label: &str, icon: &str) -> SelectOption {
    SelectOption {
        id: value.to_string(),
        label: label.to_string(),
        value: value.to_string(),
        is_selected: false,
        icon: Some(icon.to_string()),
    }
}

fn step(id: &str, title: &str, section_id: &str, fields: Vec<Field>) -> Step {
    Step {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        section_id: section_id.to_string(),
        fields,
        is_valid: false,
    }
}

fn section(id: &str, title: &str, step_ids: &[&str], is_active: bool) -> Section {
    Section {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        step_ids: step_ids.iter().map(|s| (*s).to_string()).collect(),
        is_completed: false,
        is_active,
    }
}

pub(crate) fn workflow_steps() -> Vec<Step> {
    let criteria = Field {
        id: "criteria-type".to_string(),
        kind: FieldKind::SingleSelect,
        label: "Select your criteria type".to_string(),
        options: vec![
            option("company", "Company", "building"),
            option("record", "Record", "file"),
            option("website", "Website", "globe"),
            option("expiration", "Expiration", "calendar-times"),
            option("user", "User", "user"),
            option("group", "Group", "users"),
            option("integration", "Integration", "plug"),
        ],
        is_required: true,
        allow_select_all: false,
        min_selections: None,
    };

    let record_types = Field {
        id: "recordTypes".to_string(),
        kind: FieldKind::MultiSelect,
        label: "Select your record types".to_string(),
        options: vec![
            option("password", "Password", "key"),
            option("companyKbArticle", "Company KB article", "book"),
            option("centralKbArticle", "Central KB article", "file"),
            option("process", "Process", "cog"),
            option("website", "Website", "globe"),
            option("rack", "Rack", "server"),
            option("network", "Network", "desktop"),
            option("asset", "Asset", "archive"),
        ],
        is_required: true,
        allow_select_all: true,
        min_selections: Some(1),
    };

    let triggers = Field {
        id: "triggers".to_string(),
        kind: FieldKind::MultiSelect,
        label: "Configure workflow triggers".to_string(),
        options: vec![
            option("recordCreated", "Record Created", "plus"),
            option("recordUpdated", "Record Updated", "edit"),
        ],
        is_required: true,
        allow_select_all: false,
        min_selections: Some(1),
    };

    let actions = Field {
        id: "actions".to_string(),
        kind: FieldKind::MultiSelect,
        label: "Select actions".to_string(),
        options: vec![
            option("flag", "Add Flag", "flag"),
            option("email", "Send email", "envelope"),
            option("webhook", "Send webhook", "external-link-alt"),
        ],
        is_required: true,
        allow_select_all: false,
        min_selections: Some(1),
    };

    let mut action_step = step(
        "step-4",
        "What should happen once the workflow begins?",
        "section-3",
        vec![actions],
    );
    action_step.description = Some(
        "Select at least 1 action to continue. You can add additional actions later.".to_string(),
    );

    let mut review = step(
        "step-5",
        "Review your workflow below. Click a step to make edits if needed.",
        "section-4",
        Vec::new(),
    );
    review.is_valid = true;

    vec![
        step(
            "step-1",
            "What will this workflow be based on?",
            "section-1",
            vec![criteria],
        ),
        step(
            "step-2",
            "Which record type(s) should be included?",
            "section-1",
            vec![record_types],
        ),
        step(
            "step-3",
            "What should trigger this workflow?",
            "section-2",
            vec![triggers],
        ),
        action_step,
        review,
    ]
}

pub(crate) fn workflow_sections() -> Vec<Section> {
    vec![
        section("section-1", "Criteria", &["step-1", "step-2"], true),
        section("section-2", "Trigger", &["step-3"], false),
        section("section-3", "Action", &["step-4"], false),
        section("section-4", "Review", &["step-5"], false),
    ]
}
