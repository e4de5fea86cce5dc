//! Phase transitions for [`Session`].
//!
//! These are pure functions over an in-memory session. Loading and saving is
//! the caller's job; see `SessionUpdater` in the application crate.

use super::model::Session;
use super::phase::Phase;
use super::phase_data::{AnalysisData, AssemblyData, ExtractionData, UrlCollectionData};
use crate::error::{Result, ScrapegenError};

/// New data for one phase bag.
#[derive(Debug, Clone, PartialEq)]
pub enum PhasePayload {
    Analysis(AnalysisData),
    /// Vestigial bag; counts as data-validation data.
    UrlCollection(UrlCollectionData),
    DataValidation(ExtractionData),
    Assembly(AssemblyData),
}

impl PhasePayload {
    /// The canonical phase whose bag this payload replaces.
    pub fn phase(&self) -> Phase {
        match self {
            PhasePayload::Analysis(_) => Phase::Analysis,
            PhasePayload::UrlCollection(_) | PhasePayload::DataValidation(_) => {
                Phase::DataValidation
            }
            PhasePayload::Assembly(_) => Phase::Assembly,
        }
    }

    pub fn bag_name(&self) -> &'static str {
        match self {
            PhasePayload::Analysis(_) => "analysis_data",
            PhasePayload::UrlCollection(_) => "url_collection_data",
            PhasePayload::DataValidation(_) => "data_extraction_data",
            PhasePayload::Assembly(_) => "assembly_data",
        }
    }

    /// Records the feedback that led to this payload on the bag itself.
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        let slot = match &mut self {
            PhasePayload::Analysis(data) => &mut data.user_feedback,
            PhasePayload::UrlCollection(data) => &mut data.user_feedback,
            PhasePayload::DataValidation(data) => &mut data.user_feedback,
            PhasePayload::Assembly(data) => &mut data.user_feedback,
        };
        *slot = Some(feedback.into());
        self
    }
}

/// What [`approve_phase`] did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The current bag was approved and the session moved on.
    Advanced { from: Phase, to: Phase },
    /// The session stayed where it was. Only happens at [`Phase::Assembly`]
    /// when the stored script failed validation.
    Retained { phase: Phase, reason: String },
}

impl ApprovalOutcome {
    /// The session's phase after the approval.
    pub fn phase(&self) -> Phase {
        match self {
            ApprovalOutcome::Advanced { to, .. } => *to,
            ApprovalOutcome::Retained { phase, .. } => *phase,
        }
    }

    pub fn is_advanced(&self) -> bool {
        matches!(self, ApprovalOutcome::Advanced { .. })
    }
}

/// Replaces the bag addressed by `payload` and clears its approval.
///
/// `current_phase` is left untouched.
pub fn update_phase_data(session: &mut Session, payload: PhasePayload) {
    tracing::debug!(
        session_id = %session.id,
        bag = payload.bag_name(),
        "Storing phase data"
    );
    match payload {
        PhasePayload::Analysis(mut data) => {
            data.approved = false;
            session.analysis_data = data;
        }
        PhasePayload::UrlCollection(mut data) => {
            data.approved = false;
            session.url_collection_data = data;
        }
        PhasePayload::DataValidation(mut data) => {
            data.approved = false;
            session.extraction_data = data;
        }
        PhasePayload::Assembly(mut data) => {
            data.approved = false;
            session.assembly_data = data;
        }
    }
    session.touch();
}

/// Approves the current phase's bag and advances to the next phase.
///
/// `feedback` replaces the bag's stored feedback when given. At
/// [`Phase::Assembly`] a stored validation result with `valid: false` keeps the
/// session in place and returns [`ApprovalOutcome::Retained`].
///
/// # Errors
///
/// [`ScrapegenError::InvalidState`] when the session is already complete, when
/// the current bag holds no data, or when an assembled script has not been
/// validated yet. The session is not modified in that case.
pub fn approve_phase(session: &mut Session, feedback: Option<String>) -> Result<ApprovalOutcome> {
    let from = session.current_phase;

    let outcome = match from {
        Phase::Complete => {
            return Err(ScrapegenError::invalid_state(format!(
                "Session {} is already complete",
                session.id
            )));
        }
        Phase::Analysis => {
            require_data(session, from, session.analysis_data.has_data())?;
            let bag = &mut session.analysis_data;
            merge_feedback(&mut bag.user_feedback, feedback);
            bag.approved = true;
            advance(session, from)
        }
        Phase::DataValidation => {
            require_data(session, from, session.has_validation_data())?;
            // Only bags holding data are marked approved. Feedback lands on the
            // extraction bag unless the retired URL-collection bag is the only one.
            if session.url_collection_data.has_data() {
                session.url_collection_data.approved = true;
            }
            if session.extraction_data.has_data() {
                let bag = &mut session.extraction_data;
                merge_feedback(&mut bag.user_feedback, feedback);
                bag.approved = true;
            } else {
                merge_feedback(&mut session.url_collection_data.user_feedback, feedback);
            }
            advance(session, from)
        }
        Phase::Assembly => {
            require_data(session, from, session.assembly_data.has_data())?;
            let Some(result) = session.assembly_data.validation_result.clone() else {
                return Err(ScrapegenError::invalid_state(format!(
                    "Session {} has an assembled script that was never validated",
                    session.id
                )));
            };
            let bag = &mut session.assembly_data;
            merge_feedback(&mut bag.user_feedback, feedback);
            if result.valid {
                bag.approved = true;
                advance(session, from)
            } else {
                bag.approved = false;
                let reason = result
                    .error
                    .unwrap_or_else(|| "Script validation failed".to_string());
                tracing::info!(
                    session_id = %session.id,
                    reason = %reason,
                    "Assembly failed validation, staying in assembly"
                );
                ApprovalOutcome::Retained {
                    phase: Phase::Assembly,
                    reason,
                }
            }
        }
    };

    session.touch();
    Ok(outcome)
}

/// The phase a session is really in, given the data it holds.
///
/// The stored phase is capped by data completeness: without analysis data the
/// session is in analysis, without extraction data it is at most in data
/// validation, and without a validated script it is at most in assembly.
/// Never mutates and never moves a session forward.
pub fn canonical_phase(session: &Session) -> Phase {
    let ceiling = if !session.analysis_data.has_data() {
        Phase::Analysis
    } else if !session.has_validation_data() {
        Phase::DataValidation
    } else if !session.assembly_data.passed_validation() {
        Phase::Assembly
    } else {
        Phase::Complete
    };
    session.current_phase.min(ceiling)
}

fn require_data(session: &Session, phase: Phase, has_data: bool) -> Result<()> {
    if has_data {
        Ok(())
    } else {
        Err(ScrapegenError::invalid_state(format!(
            "Cannot approve phase '{}' of session {}: no phase data stored",
            phase, session.id
        )))
    }
}

fn merge_feedback(slot: &mut Option<String>, feedback: Option<String>) {
    if let Some(feedback) = feedback {
        *slot = Some(feedback);
    }
}

fn advance(session: &mut Session, from: Phase) -> ApprovalOutcome {
    // Complete is rejected before this point, so `next()` is always present.
    let to = from.next().unwrap_or(from);
    session.current_phase = to;
    tracing::info!(session_id = %session.id, from = %from, to = %to, "Phase approved");
    ApprovalOutcome::Advanced { from, to }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::phase_data::ValidationResult;

    fn session() -> Session {
        Session::new("user-1", "competitor-1", "https://shop.test/")
    }

    fn analysis() -> AnalysisData {
        AnalysisData {
            product_pages: vec!["https://shop.test/p/1".to_string()],
            ..Default::default()
        }
    }

    fn extraction() -> ExtractionData {
        ExtractionData {
            generated_code: Some("async function extractProductData(page, url) {}".to_string()),
            ..Default::default()
        }
    }

    fn assembly(result: Option<ValidationResult>) -> AssemblyData {
        AssemblyData {
            assembled_script: Some("// script".to_string()),
            validation_result: result,
            ..Default::default()
        }
    }

    #[test]
    fn test_phases_advance_in_order() {
        let mut session = session();
        let mut visited = vec![session.current_phase];

        update_phase_data(&mut session, PhasePayload::Analysis(analysis()));
        approve_phase(&mut session, None).unwrap();
        visited.push(session.current_phase);

        update_phase_data(&mut session, PhasePayload::DataValidation(extraction()));
        approve_phase(&mut session, None).unwrap();
        visited.push(session.current_phase);

        update_phase_data(
            &mut session,
            PhasePayload::Assembly(assembly(Some(ValidationResult::valid()))),
        );
        let outcome = approve_phase(&mut session, None).unwrap();
        visited.push(session.current_phase);

        assert_eq!(
            visited,
            vec![
                Phase::Analysis,
                Phase::DataValidation,
                Phase::Assembly,
                Phase::Complete
            ]
        );
        assert_eq!(
            outcome,
            ApprovalOutcome::Advanced {
                from: Phase::Assembly,
                to: Phase::Complete
            }
        );
        assert!(session.assembly_data.approved);
        assert_eq!(session.canonical_phase(), Phase::Complete);
    }

    #[test]
    fn test_failed_validation_loops_on_assembly() {
        let mut session = session();
        session.current_phase = Phase::Assembly;
        session.analysis_data = analysis();
        session.extraction_data = extraction();

        update_phase_data(
            &mut session,
            PhasePayload::Assembly(assembly(Some(ValidationResult::invalid(
                "Missing extractProductData function",
            )))),
        );
        let outcome = approve_phase(&mut session, Some("fix it".to_string())).unwrap();

        assert_eq!(session.current_phase, Phase::Assembly);
        assert!(!outcome.is_advanced());
        assert_eq!(
            outcome,
            ApprovalOutcome::Retained {
                phase: Phase::Assembly,
                reason: "Missing extractProductData function".to_string()
            }
        );
        assert!(!session.assembly_data.approved);
        assert_eq!(session.assembly_data.user_feedback.as_deref(), Some("fix it"));

        // Retry with a passing script.
        update_phase_data(
            &mut session,
            PhasePayload::Assembly(assembly(Some(ValidationResult::valid()))),
        );
        let outcome = approve_phase(&mut session, None).unwrap();
        assert_eq!(outcome.phase(), Phase::Complete);
    }

    #[test]
    fn test_approve_without_data_is_invalid_state() {
        let mut session = session();
        session.analysis_data.user_feedback = Some("only feedback".to_string());
        let before = session.clone();

        let err = approve_phase(&mut session, None).unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(session, before);
    }

    #[test]
    fn test_unvalidated_assembly_is_invalid_state() {
        let mut session = session();
        session.current_phase = Phase::Assembly;
        session.assembly_data = assembly(None);

        let err = approve_phase(&mut session, None).unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(session.current_phase, Phase::Assembly);
    }

    #[test]
    fn test_complete_session_cannot_be_approved() {
        let mut session = session();
        session.current_phase = Phase::Complete;
        assert!(approve_phase(&mut session, None).unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_update_resets_approval_and_keeps_phase() {
        let mut session = session();
        session.current_phase = Phase::DataValidation;
        let mut data = analysis();
        data.approved = true;

        update_phase_data(&mut session, PhasePayload::Analysis(data));

        assert!(!session.analysis_data.approved);
        assert_eq!(session.current_phase, Phase::DataValidation);
    }

    #[test]
    fn test_url_collection_data_counts_for_data_validation() {
        let mut session = session();
        session.current_phase = Phase::DataValidation;
        session.analysis_data = analysis();
        update_phase_data(
            &mut session,
            PhasePayload::UrlCollection(UrlCollectionData {
                collected_urls: vec!["https://shop.test/p/1".to_string()],
                ..Default::default()
            }),
        );

        let outcome = approve_phase(&mut session, Some("ok".to_string())).unwrap();

        assert_eq!(outcome.phase(), Phase::Assembly);
        assert!(session.url_collection_data.approved);
        assert_eq!(session.url_collection_data.user_feedback.as_deref(), Some("ok"));
        assert!(!session.extraction_data.has_data());
        assert!(!session.extraction_data.approved);
        assert_eq!(session.extraction_data.user_feedback, None);
    }

    #[test]
    fn test_feedback_kept_when_none_given() {
        let mut session = session();
        let mut data = analysis();
        data.user_feedback = Some("earlier".to_string());
        update_phase_data(&mut session, PhasePayload::Analysis(data));

        approve_phase(&mut session, None).unwrap();
        assert_eq!(session.analysis_data.user_feedback.as_deref(), Some("earlier"));
    }

    #[test]
    fn test_canonical_phase_is_capped_by_data() {
        let mut session = session();
        session.current_phase = Phase::Complete;
        assert_eq!(canonical_phase(&session), Phase::Analysis);

        session.analysis_data = analysis();
        assert_eq!(canonical_phase(&session), Phase::DataValidation);

        session.extraction_data = extraction();
        assert_eq!(canonical_phase(&session), Phase::Assembly);

        session.assembly_data = assembly(Some(ValidationResult::invalid("boom")));
        assert_eq!(canonical_phase(&session), Phase::Assembly);

        session.assembly_data = assembly(Some(ValidationResult::valid()));
        assert_eq!(canonical_phase(&session), Phase::Complete);

        // Never ahead of the stored phase.
        session.current_phase = Phase::DataValidation;
        assert_eq!(canonical_phase(&session), Phase::DataValidation);
    }

    #[test]
    fn test_with_feedback_survives_update() {
        let mut session = session();
        let payload = PhasePayload::DataValidation(extraction()).with_feedback("prices are off");
        update_phase_data(&mut session, payload);
        assert_eq!(
            session.extraction_data.user_feedback.as_deref(),
            Some("prices are off")
        );
        assert!(!session.extraction_data.approved);
    }
}
