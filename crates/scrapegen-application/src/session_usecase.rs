//! Scraper session use case implementation.
//!
//! `ScraperSessionUseCase` is the operation surface callers drive a generation
//! session through: create, fetch, list, store phase data, approve, regenerate,
//! assemble and validate, compose feedback prompts, delete.

use crate::session::{SessionLocks, SessionUpdater};
use scrapegen_core::assembly::{
    AssemblyInputs, AssemblyReport, LiteralAnchorAssembler, TemplateAssembler,
};
use scrapegen_core::feedback::{ComposedPrompt, FeedbackComposer, PhaseArtifact};
use scrapegen_core::publish::ScriptPublisher;
use scrapegen_core::session::{
    ApprovalOutcome, AssemblyData, Phase, PhasePayload, Session, SessionRepository,
    ValidationResult, approve_phase, canonical_phase, update_phase_data,
};
use scrapegen_core::validation::ScriptValidator;
use scrapegen_core::{Result, ScrapegenError};
use std::sync::Arc;

/// A session after an approval attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseApproval {
    pub session: Session,
    pub outcome: ApprovalOutcome,
}

/// Everything produced by one assemble-and-validate run.
#[derive(Debug, Clone)]
pub struct AssemblyRun {
    pub session: Session,
    pub report: AssemblyReport,
    pub validation: ValidationResult,
    pub outcome: ApprovalOutcome,
}

/// Use case for driving scraper generation sessions.
///
/// # Thread Safety
///
/// Every mutation of one session runs under that session's async mutex, so two
/// concurrent approvals of the same session are applied one after the other and
/// the second sees the first one's result. This holds within one process only.
pub struct ScraperSessionUseCase {
    /// Repository for session data persistence
    repository: Arc<dyn SessionRepository>,
    updater: SessionUpdater,
    locks: SessionLocks,
    assembler: Arc<dyn TemplateAssembler>,
    validator: Arc<ScriptValidator>,
    composer: FeedbackComposer,
    /// Receives scripts that pass validation. Optional.
    publisher: Option<Arc<dyn ScriptPublisher>>,
    base_template: String,
}

impl ScraperSessionUseCase {
    /// Creates a use case with the literal-anchor assembler and no publisher.
    ///
    /// # Errors
    ///
    /// Returns a template error if the built-in feedback templates fail to
    /// compile.
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        validator: Arc<ScriptValidator>,
        base_template: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            updater: SessionUpdater::new(repository.clone()),
            repository,
            locks: SessionLocks::new(),
            assembler: Arc::new(LiteralAnchorAssembler::default()),
            validator,
            composer: FeedbackComposer::new()?,
            publisher: None,
            base_template: base_template.into(),
        })
    }

    pub fn with_assembler(mut self, assembler: Arc<dyn TemplateAssembler>) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn ScriptPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    // ============================================================================
    // Queries
    // ============================================================================

    /// Fetches a session.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown ID.
    pub async fn get_session(&self, session_id: &str) -> Result<Session> {
        self.repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| ScrapegenError::not_found("Session", session_id))
    }

    /// The phase the session's data actually supports. See [`canonical_phase`].
    pub async fn canonical_phase(&self, session_id: &str) -> Result<Phase> {
        Ok(canonical_phase(&self.get_session(session_id).await?))
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>> {
        self.repository.list_by_owner(owner_id).await
    }

    pub async fn list_by_target(&self, target_id: &str) -> Result<Vec<Session>> {
        self.repository.list_by_target(target_id).await
    }

    // ============================================================================
    // Lifecycle
    // ============================================================================

    /// Creates a session in the analysis phase with empty, unapproved bags.
    pub async fn create_session(
        &self,
        owner_id: &str,
        target_id: &str,
        url: &str,
    ) -> Result<Session> {
        let session = Session::new(owner_id, target_id, url);
        self.repository.create(&session).await?;
        tracing::info!(session_id = %session.id, owner_id, target_id, url, "Session created");
        Ok(session)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let _guard = self.locks.acquire(session_id).await;
        self.repository.delete(session_id).await?;
        tracing::info!(session_id, "Session deleted");
        Ok(())
    }

    // ============================================================================
    // Phase transitions
    // ============================================================================

    /// Stores `payload` in its bag and clears that bag's approval. The current
    /// phase does not change.
    pub async fn update_phase_data(
        &self,
        session_id: &str,
        payload: PhasePayload,
    ) -> Result<Session> {
        let _guard = self.locks.acquire(session_id).await;
        let (session, ()) = self
            .updater
            .update(session_id, |session| {
                update_phase_data(session, payload);
                Ok(())
            })
            .await?;
        Ok(session)
    }

    /// Approves the current phase and advances when allowed.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the current phase has nothing to approve; see
    /// [`approve_phase`]. The stored session is unchanged in that case.
    pub async fn approve_phase(
        &self,
        session_id: &str,
        feedback: Option<String>,
    ) -> Result<PhaseApproval> {
        let _guard = self.locks.acquire(session_id).await;
        let (session, outcome) = self
            .updater
            .update(session_id, |session| approve_phase(session, feedback))
            .await?;
        Ok(PhaseApproval { session, outcome })
    }

    /// Stores `payload` and approves it in one locked step.
    pub async fn update_and_approve(
        &self,
        session_id: &str,
        payload: PhasePayload,
        feedback: Option<String>,
    ) -> Result<PhaseApproval> {
        let _guard = self.locks.acquire(session_id).await;
        let (session, outcome) = self
            .updater
            .update(session_id, |session| {
                update_phase_data(session, payload);
                approve_phase(session, feedback)
            })
            .await?;
        Ok(PhaseApproval { session, outcome })
    }

    /// Replaces a phase's data with a regenerated payload.
    ///
    /// The feedback that prompted the regeneration is recorded on the new bag
    /// and the bag's approval is cleared. The current phase does not move, so a
    /// session parked at assembly after a failed validation can take new
    /// fragments and be assembled again.
    ///
    /// # Errors
    ///
    /// `InvalidState` for a phase the session has not reached yet, and for any
    /// phase once the session is complete.
    pub async fn regenerate_phase(
        &self,
        session_id: &str,
        payload: PhasePayload,
        feedback: &str,
    ) -> Result<Session> {
        let _guard = self.locks.acquire(session_id).await;
        let payload = payload.with_feedback(feedback);
        let (session, regenerated) = self
            .updater
            .update(session_id, |session| {
                let phase = payload.phase();
                if session.current_phase == Phase::Complete || phase > session.current_phase {
                    return Err(ScrapegenError::invalid_state(format!(
                        "Cannot regenerate phase '{}' of session {} while it is in '{}'",
                        phase, session.id, session.current_phase
                    )));
                }
                update_phase_data(session, payload);
                Ok(phase)
            })
            .await?;
        tracing::info!(
            session_id,
            phase = %regenerated,
            current_phase = %session.current_phase,
            "Phase regenerated"
        );
        Ok(session)
    }

    // ============================================================================
    // Assembly
    // ============================================================================

    /// Assembles the session's fragments without storing anything.
    pub async fn preview_assembly(&self, session_id: &str) -> Result<AssemblyReport> {
        let session = self.get_session(session_id).await?;
        Ok(self.assemble(&session))
    }

    /// Assembles, validates, stores the result and approves the assembly phase.
    ///
    /// A passing script moves the session to `complete` and, when a publisher
    /// is configured, is published with the returned ID stored as `scraper_id`.
    /// A failing script keeps the session in `assembly` with the validator's
    /// error recorded on the assembly bag.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the session is in the assembly phase. Validator
    /// infrastructure failures and publishing failures propagate and leave the
    /// stored session unchanged.
    pub async fn assemble_and_validate(&self, session_id: &str) -> Result<AssemblyRun> {
        let _guard = self.locks.acquire(session_id).await;

        let session = self.get_session(session_id).await?;
        if session.current_phase != Phase::Assembly {
            return Err(ScrapegenError::invalid_state(format!(
                "Session {} is in phase '{}', assembly requires '{}'",
                session.id,
                session.current_phase,
                Phase::Assembly
            )));
        }

        let report = self.assemble(&session);
        let validation = self.validator.validate(&report.script).await?;
        tracing::info!(
            session_id,
            valid = validation.valid,
            error = validation.error.as_deref().unwrap_or_default(),
            "Assembled script validated"
        );

        let scraper_id = match (&self.publisher, validation.valid) {
            (Some(publisher), true) => Some(publisher.publish(&session, &report.script).await?),
            _ => None,
        };

        let assembly = AssemblyData {
            assembly_id: Some(uuid::Uuid::new_v4().to_string()),
            assembled_script: Some(report.script.clone()),
            validation_result: Some(validation.clone()),
            scraper_id,
            user_feedback: session.assembly_data.user_feedback.clone(),
            approved: false,
        };

        let (session, outcome) = self
            .updater
            .update(session_id, |session| {
                update_phase_data(session, PhasePayload::Assembly(assembly));
                approve_phase(session, None)
            })
            .await?;

        Ok(AssemblyRun {
            session,
            report,
            validation,
            outcome,
        })
    }

    fn assemble(&self, session: &Session) -> AssemblyReport {
        let inputs = AssemblyInputs::from_session(session);
        let report = self.assembler.assemble_with_report(
            &self.base_template,
            &inputs.fragments,
            &inputs.metadata,
        );
        tracing::debug!(
            session_id = %session.id,
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "Template assembled"
        );
        report
    }

    // ============================================================================
    // Feedback
    // ============================================================================

    /// Builds the request for regenerating `phase` (the current phase when
    /// `None`) from the stored artifact and the user's feedback.
    pub async fn compose_feedback(
        &self,
        session_id: &str,
        phase: Option<&str>,
        feedback: &str,
    ) -> Result<ComposedPrompt> {
        let session = self.get_session(session_id).await?;
        let phase = phase.unwrap_or(session.current_phase.as_str());
        self.composer
            .compose(PhaseArtifact::from_session(&session, phase), feedback)
    }
}
