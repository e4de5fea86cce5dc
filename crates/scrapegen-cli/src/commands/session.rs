use super::CliContext;
use anyhow::{Context, Result, bail};
use clap::{Subcommand, ValueEnum};
use scrapegen_application::{AssemblyRun, PhaseApproval};
use scrapegen_core::session::{ApprovalOutcome, PhasePayload, Session, canonical_phase};
use scrapegen_infrastructure::dto::SessionRecord;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a session in the analysis phase
    Create {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        target: String,
        #[arg(long)]
        url: String,
    },
    /// Print a stored session
    Show { id: String },
    /// List sessions, newest first
    List {
        #[arg(long, conflicts_with = "target", required_unless_present = "target")]
        owner: Option<String>,
        #[arg(long)]
        target: Option<String>,
    },
    /// Store phase data from a JSON file
    Update {
        id: String,
        #[arg(long, value_enum)]
        phase: PhaseArg,
        /// JSON document with the phase bag
        #[arg(long)]
        file: PathBuf,
        /// Approve right after storing
        #[arg(long)]
        approve: bool,
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Approve the current phase and advance
    Approve {
        id: String,
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Replace a reached phase's data with regenerated output
    Regenerate {
        id: String,
        #[arg(long, value_enum)]
        phase: PhaseArg,
        #[arg(long)]
        file: PathBuf,
        /// The feedback the new data answers
        #[arg(long)]
        feedback: String,
    },
    /// Assemble, validate and (on success) publish the session's script
    Assemble { id: String },
    /// Print the assembled script without storing it
    Preview { id: String },
    /// Print the prompt for regenerating a phase from user feedback
    Feedback {
        id: String,
        /// Phase name; defaults to the current phase
        #[arg(long)]
        phase: Option<String>,
        #[arg(long)]
        message: String,
    },
    /// Delete a session
    Delete { id: String },
}

/// Phase bag addressed by `update` and `regenerate`.
#[derive(Clone, Copy, ValueEnum)]
pub enum PhaseArg {
    Analysis,
    UrlCollection,
    DataValidation,
    Assembly,
}

fn read_payload(phase: PhaseArg, file: &Path) -> Result<PhasePayload> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let parse_error = || format!("Failed to parse {} as phase data", file.display());
    let payload = match phase {
        PhaseArg::Analysis => {
            PhasePayload::Analysis(serde_json::from_str(&content).with_context(parse_error)?)
        }
        PhaseArg::UrlCollection => {
            PhasePayload::UrlCollection(serde_json::from_str(&content).with_context(parse_error)?)
        }
        PhaseArg::DataValidation => {
            PhasePayload::DataValidation(serde_json::from_str(&content).with_context(parse_error)?)
        }
        PhaseArg::Assembly => {
            PhasePayload::Assembly(serde_json::from_str(&content).with_context(parse_error)?)
        }
    };
    Ok(payload)
}

fn print_session(session: &Session) -> Result<()> {
    let json = serde_json::to_string_pretty(&SessionRecord::from(session))?;
    println!("{}", json);
    Ok(())
}

fn print_approval(approval: &PhaseApproval) {
    match &approval.outcome {
        ApprovalOutcome::Advanced { from, to } => {
            println!("✅ {} approved, session {} is now in {}", from, approval.session.id, to)
        }
        ApprovalOutcome::Retained { phase, reason } => {
            println!("⚠️  Session {} stays in {}: {}", approval.session.id, phase, reason)
        }
    }
}

fn print_assembly(run: &AssemblyRun) {
    for anchor in run.report.missing_anchors() {
        println!("⚠️  Anchor not found in template: {}", anchor);
    }
    match (&run.outcome, &run.session.assembly_data.scraper_id) {
        (ApprovalOutcome::Advanced { .. }, Some(scraper_id)) => {
            println!("✅ Script validated and published as {}", scraper_id)
        }
        (ApprovalOutcome::Advanced { .. }, None) => println!("✅ Script validated"),
        (ApprovalOutcome::Retained { reason, .. }, _) => {
            println!("❌ Validation failed: {}", reason);
            println!(
                "💡 Regenerate the offending fragment and run `scrapegen session assemble` again."
            );
        }
    }
}

pub async fn run(context: &CliContext, action: SessionAction) -> Result<()> {
    let usecase = context.usecase().await?;

    match action {
        SessionAction::Create { owner, target, url } => {
            let session = usecase.create_session(&owner, &target, &url).await?;
            print_session(&session)?;
        }
        SessionAction::Show { id } => {
            let session = usecase.get_session(&id).await?;
            print_session(&session)?;
            let canonical = canonical_phase(&session);
            if canonical != session.current_phase {
                eprintln!(
                    "note: stored phase is {}, but the session's data only supports {}",
                    session.current_phase, canonical
                );
            }
        }
        SessionAction::List { owner, target } => {
            let sessions = match (owner, target) {
                (Some(owner), _) => usecase.list_by_owner(&owner).await?,
                (None, Some(target)) => usecase.list_by_target(&target).await?,
                (None, None) => bail!("Pass --owner or --target"),
            };
            for session in sessions {
                println!(
                    "{}  {:<16} {}  {}",
                    session.id, session.current_phase, session.updated_at, session.url
                );
            }
        }
        SessionAction::Update {
            id,
            phase,
            file,
            approve,
            feedback,
        } => {
            let payload = read_payload(phase, &file)?;
            if approve {
                let approval = usecase.update_and_approve(&id, payload, feedback).await?;
                print_approval(&approval);
            } else {
                let session = usecase.update_phase_data(&id, payload).await?;
                println!("✓ Stored phase data for {} ({})", session.id, session.current_phase);
            }
        }
        SessionAction::Approve { id, feedback } => {
            let approval = usecase.approve_phase(&id, feedback).await?;
            print_approval(&approval);
        }
        SessionAction::Regenerate {
            id,
            phase,
            file,
            feedback,
        } => {
            let payload = read_payload(phase, &file)?;
            let regenerated = payload.phase();
            let session = usecase.regenerate_phase(&id, payload, &feedback).await?;
            println!(
                "✓ Regenerated {} data for {} (now in {})",
                regenerated, session.id, session.current_phase
            );
        }
        SessionAction::Assemble { id } => {
            let run = usecase.assemble_and_validate(&id).await?;
            print_assembly(&run);
        }
        SessionAction::Preview { id } => {
            let report = usecase.preview_assembly(&id).await?;
            print!("{}", report.script);
        }
        SessionAction::Feedback { id, phase, message } => {
            let prompt = usecase
                .compose_feedback(&id, phase.as_deref(), &message)
                .await?;
            println!("# System\n{}\n\n# User\n{}", prompt.system, prompt.user);
        }
        SessionAction::Delete { id } => {
            usecase.delete_session(&id).await?;
            println!("✓ Deleted session {}", id);
        }
    }

    Ok(())
}
