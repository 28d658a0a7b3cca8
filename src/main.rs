use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use workflow_wizard::config::Config;
use workflow_wizard::interactive;
use workflow_wizard::logging;
use workflow_wizard::session::WizardSession;
use workflow_wizard::summary;
use workflow_wizard::validation::RuleValidator;

#[derive(Parser)]
#[command(name = "wizard")]
#[command(about = "Build a workflow step by step, save it and pick it up later")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the wizard interactively (default)
    Run,

    /// Print the active step catalog as JSON
    Catalog,

    /// Show saved position and section progress
    Status,

    /// Print the summary of the saved workflow
    Summary,

    /// Delete saved progress
    Reset,

    /// Write the active configuration to the user config file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let interactive = matches!(cli.command, None | Some(Commands::Run));

    // Initialize logging (file-based for interactive runs, stderr otherwise)
    let logging_handle = logging::init_logging(&config, interactive, cli.debug)?;

    match cli.command {
        None | Some(Commands::Run) => {
            run_wizard(&config, logging_handle.log_file_path).await?;
        }
        Some(Commands::Catalog) => cmd_catalog(&config)?,
        Some(Commands::Status) => cmd_status(&config)?,
        Some(Commands::Summary) => cmd_summary(&config)?,
        Some(Commands::Reset) => cmd_reset(&config)?,
        Some(Commands::InitConfig) => cmd_init_config(&config)?,
    }

    Ok(())
}

async fn run_wizard(config: &Config, log_file_path: Option<PathBuf>) -> Result<()> {
    let mut session = WizardSession::from_config(config)?;

    println!("New Workflow (type 'help' for commands)");
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let result = interactive::run(
        &mut session,
        config,
        &RuleValidator,
        stdin.lock(),
        &mut stdout,
    )
    .await;

    // Print log file path on exit if logs were written
    if let Some(log_path) = log_file_path {
        if let Ok(metadata) = log_path.metadata() {
            if metadata.len() > 0 {
                eprintln!("Session log: {}", log_path.display());
            }
        }
    }

    result
}

fn cmd_catalog(config: &Config) -> Result<()> {
    let session = WizardSession::from_config(config)?;
    let json = serde_json::to_string_pretty(&session.catalog().to_document())
        .context("Failed to serialize catalog")?;
    println!("{json}");
    Ok(())
}

fn cmd_status(config: &Config) -> Result<()> {
    let mut session = WizardSession::from_config(config)?;
    if !session.mount()? {
        println!("No saved progress");
        return Ok(());
    }

    let nav = session.navigation();
    let steps = session.catalog().steps();
    let title = session
        .current_step()
        .map(|s| s.title.as_str())
        .unwrap_or("(step not found)");
    println!(
        "Step {}/{}: {}",
        nav.current_step_index() + 1,
        steps.len(),
        title
    );
    if let Some(saved) = session.form().saved_progress() {
        println!("Saved at {}", saved.timestamp.to_rfc3339());
    }
    println!("{}", "─".repeat(40));

    for section in session.section_progress() {
        let glyph = if section.is_completed {
            "✓"
        } else if section.is_active {
            "▶"
        } else {
            " "
        };
        println!("{glyph} {}", section.title);
    }

    if session.navigation_view().is_last_step {
        println!("Ready to save the draft");
    }
    if let Some(last) = nav.summary().last_completed_step_index {
        println!("Last completed step: {}", last + 1);
    }
    Ok(())
}

fn cmd_summary(config: &Config) -> Result<()> {
    let mut session = WizardSession::from_config(config)?;
    if !session.mount()? {
        println!("{}", summary::EMPTY_SUMMARY);
        return Ok(());
    }
    println!("{}", session.render_summary(config)?);
    Ok(())
}

fn cmd_reset(config: &Config) -> Result<()> {
    let mut session = WizardSession::from_config(config)?;
    session.discard_saved_progress()?;
    println!("Saved progress removed");
    Ok(())
}

fn cmd_init_config(config: &Config) -> Result<()> {
    config.save()?;
    if let Some(path) = Config::user_config_path() {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
