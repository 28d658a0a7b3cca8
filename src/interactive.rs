//! Line-oriented wizard host for the terminal.
//!
//! Options are picked by number (`2`, `1,3`); when a step has several fields
//! an option is addressed as `field.option` (`2.1`). Single-select fields take
//! the picked value, multi-select fields toggle it.

use std::io::{BufRead, Write};

use anyhow::Result;

use crate::config::Config;
use crate::session::{ActionOutcome, WizardSession};
use crate::types::{FieldKind, FieldValue};
use crate::validation::Validator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// (field index, option index), both 0-based
    Select(Vec<(usize, usize)>),
    SelectAll(usize),
    Next,
    Back,
    GoToSection(String),
    SaveDraft,
    SaveLater,
    Status,
    Summary,
    Help,
    Quit,
}

fn parse_pick(token: &str) -> Result<(usize, usize), String> {
    let number = |s: &str| -> Result<usize, String> {
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n - 1),
            _ => Err(format!("'{token}' is not a valid option number")),
        }
    };
    match token.split_once('.') {
        Some((field, option)) => Ok((number(field)?, number(option)?)),
        None => Ok((0, number(token)?)),
    }
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    match word.to_lowercase().as_str() {
        "" | "help" | "h" | "?" => Ok(Command::Help),
        "next" | "n" => Ok(Command::Next),
        "back" | "b" => Ok(Command::Back),
        "save" => Ok(Command::SaveDraft),
        "later" => Ok(Command::SaveLater),
        "status" => Ok(Command::Status),
        "summary" => Ok(Command::Summary),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        "all" => {
            let field = if rest.is_empty() {
                0
            } else {
                parse_pick(rest)?.1
            };
            Ok(Command::SelectAll(field))
        }
        "go" if !rest.is_empty() => Ok(Command::GoToSection(rest.to_string())),
        "go" => Err("usage: go <section-id>".to_string()),
        _ => line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(parse_pick)
            .collect::<Result<Vec<_>, _>>()
            .map(Command::Select),
    }
}

const HELP: &str = "\
Commands:
  <n>[,<n>...]   pick options (use <field>.<n> on steps with several fields)
  all [field]    select or clear every option of a field
  next | back    move between steps
  go <section>   jump to a section you have already reached
  save           validate and save a draft
  later          save and finish later (no validation)
  status         show progress
  summary        show the workflow summary
  quit           leave without saving";

fn render_step<W: Write>(session: &WizardSession, out: &mut W) -> Result<()> {
    let Some(step) = session.current_step() else {
        writeln!(out, "Step not found. The requested step could not be loaded.")?;
        return Ok(());
    };

    let total = session.catalog().steps().len();
    writeln!(out)?;
    writeln!(
        out,
        "[{}/{}] {}",
        session.navigation().current_step_index() + 1,
        total,
        step.title
    )?;
    if let Some(description) = &step.description {
        writeln!(out, "{description}")?;
    }

    for (fi, field) in step.fields.iter().enumerate() {
        let picked = session
            .candidate()
            .get(&field.id)
            .map(FieldValue::selections)
            .unwrap_or_default();
        let prefix = if step.fields.len() > 1 {
            format!("{}.", fi + 1)
        } else {
            String::new()
        };
        writeln!(out, "{}", field.label)?;
        for (oi, option) in field.options.iter().enumerate() {
            let mark = if picked.contains(&option.value.as_str()) {
                "x"
            } else {
                " "
            };
            writeln!(out, "  {prefix}{}) [{mark}] {}", oi + 1, option.label)?;
        }
    }
    Ok(())
}

fn render_status<W: Write>(session: &WizardSession, out: &mut W) -> Result<()> {
    for section in session.section_progress() {
        let mark = if section.is_completed {
            "done"
        } else if section.is_active {
            "here"
        } else {
            ""
        };
        writeln!(out, "  {:<12} {:<10} {mark}", section.section_id, section.title)?;
    }
    Ok(())
}

fn apply_selection(session: &mut WizardSession, picks: &[(usize, usize)]) -> Result<(), String> {
    let Some(step) = session.current_step().cloned() else {
        return Err("no current step".to_string());
    };

    for &(fi, oi) in picks {
        let field = step
            .fields
            .get(fi)
            .ok_or_else(|| format!("no field {}", fi + 1))?;
        let option = field
            .options
            .get(oi)
            .ok_or_else(|| format!("no option {}", oi + 1))?;

        let value = match field.kind {
            FieldKind::SingleSelect => FieldValue::Single(option.value.clone()),
            FieldKind::MultiSelect => {
                let mut current: Vec<String> = session
                    .candidate()
                    .get(&field.id)
                    .and_then(FieldValue::as_multi)
                    .map(<[String]>::to_vec)
                    .unwrap_or_default();
                if let Some(pos) = current.iter().position(|v| v == &option.value) {
                    current.remove(pos);
                } else {
                    current.push(option.value.clone());
                }
                FieldValue::Multi(current)
            }
        };
        session.set_field(&field.id, value);
    }
    Ok(())
}

/// Drive a session from `input` until quit or end of input
pub async fn run<R: BufRead, W: Write>(
    session: &mut WizardSession,
    config: &Config,
    validator: &dyn Validator,
    input: R,
    out: &mut W,
) -> Result<()> {
    if session.mount()? {
        writeln!(out, "Resuming saved progress.")?;
    }
    render_step(session, out)?;

    for line in input.lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(msg) => {
                writeln!(out, "{msg}")?;
                continue;
            }
        };

        match command {
            Command::Select(picks) => {
                if let Err(msg) = apply_selection(session, &picks) {
                    writeln!(out, "{msg}")?;
                }
                render_step(session, out)?;
            }
            Command::SelectAll(field_index) => {
                let field_id = session
                    .current_step()
                    .and_then(|s| s.fields.get(field_index))
                    .map(|f| f.id.clone());
                match field_id {
                    Some(id) if session.toggle_select_all(&id) => render_step(session, out)?,
                    _ => writeln!(out, "This field does not support selecting all options.")?,
                }
            }
            Command::Next => match session.next(validator).await? {
                ActionOutcome::Advanced => render_step(session, out)?,
                ActionOutcome::Invalid(errors) => {
                    for message in errors.values() {
                        writeln!(out, "  ! {message}")?;
                    }
                }
                ActionOutcome::Blocked => {
                    writeln!(out, "This is the last step. Use 'save' to save a draft.")?;
                }
                ActionOutcome::Saved | ActionOutcome::Stale => {}
            },
            Command::Back => {
                if session.back() {
                    render_step(session, out)?;
                }
            }
            Command::GoToSection(section_id) => {
                if session.click_section(&section_id) {
                    render_step(session, out)?;
                }
            }
            Command::SaveDraft => match session.save_draft(validator).await? {
                ActionOutcome::Saved => writeln!(out, "Draft saved.")?,
                ActionOutcome::Invalid(errors) => {
                    for message in errors.values() {
                        writeln!(out, "  ! {message}")?;
                    }
                }
                _ => {}
            },
            Command::SaveLater => {
                session.save_and_finish_later()?;
                writeln!(out, "Progress saved. Run the wizard again to continue.")?;
                return Ok(());
            }
            Command::Status => render_status(session, out)?,
            Command::Summary => writeln!(out, "{}", session.render_summary(config)?)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StepCatalog;
    use crate::persistence::{MemoryProgressStore, ProgressStore};
    use crate::types::{NavigationSnapshot, SavedProgress, WizardFormData};
    use crate::validation::RuleValidator;
    use chrono::Utc;
    use std::io::Cursor;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("next"), Ok(Command::Next));
        assert_eq!(parse_command(" B "), Ok(Command::Back));
        assert_eq!(
            parse_command("go section-2"),
            Ok(Command::GoToSection("section-2".to_string()))
        );
        assert_eq!(parse_command("all"), Ok(Command::SelectAll(0)));
        assert_eq!(parse_command("all 2"), Ok(Command::SelectAll(1)));
        assert_eq!(parse_command(""), Ok(Command::Help));
    }

    #[test]
    fn test_parse_picks() {
        assert_eq!(parse_command("2"), Ok(Command::Select(vec![(0, 1)])));
        assert_eq!(
            parse_command("1,3 2.4"),
            Ok(Command::Select(vec![(0, 0), (0, 2), (1, 3)]))
        );
        assert!(parse_command("0").is_err());
        assert!(parse_command("frobnicate").is_err());
        assert!(parse_command("go").is_err());
    }

    #[test]
    fn test_render_step_outside_catalog() {
        let mut store = MemoryProgressStore::new();
        store
            .save(&SavedProgress {
                form_data: WizardFormData::new(),
                navigation_state: NavigationSnapshot {
                    current_step_index: 7,
                    current_section_id: "section-4".to_string(),
                    last_completed_step_index: None,
                },
                timestamp: Utc::now(),
            })
            .unwrap();
        let mut session = WizardSession::new(StepCatalog::default_workflow(), Box::new(store));
        assert!(session.mount().unwrap());

        let mut out = Vec::new();
        render_step(&session, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Step not found. The requested step could not be loaded.\n"
        );
    }

    #[tokio::test]
    async fn test_summary_command_lists_record_types() {
        let mut session = WizardSession::new(
            StepCatalog::default_workflow(),
            Box::new(MemoryProgressStore::new()),
        );
        let script = "1\nnext\n3,4\nnext\nsummary\nquit\n";
        let mut out = Vec::new();

        run(
            &mut session,
            &Config::default(),
            &RuleValidator,
            Cursor::new(script),
            &mut out,
        )
        .await
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  • "));
        let bullets = text.lines().filter(|l| l.starts_with("  • ")).count();
        assert_eq!(bullets, 2);
    }

    #[tokio::test]
    async fn test_run_through_whole_wizard() {
        let mut session = WizardSession::new(
            StepCatalog::default_workflow(),
            Box::new(MemoryProgressStore::new()),
        );
        let script = "next\n2\nnext\nall\nnext\n1,2\nnext\n1,2\nnext\nsummary\nquit\n";
        let mut out = Vec::new();

        run(
            &mut session,
            &Config::default(),
            &RuleValidator,
            Cursor::new(script),
            &mut out,
        )
        .await
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("! Please select an option"));
        assert!(text.contains(
            "When any of the following record types is created or updated, add flag and send email."
        ));
        assert_eq!(session.navigation().current_step_index(), 4);
        assert_eq!(
            session.form().field_value("step-2", "recordTypes").map(|v| v.selections().len()),
            Some(8)
        );
    }
}
