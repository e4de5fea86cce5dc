use async_trait::async_trait;
use scrapegen_application::ScraperSessionUseCase;
use scrapegen_core::assembly::BUILTIN_TEMPLATE;
use scrapegen_core::config::ValidatorSettings;
use scrapegen_core::publish::ScriptPublisher;
use scrapegen_core::session::{
    AnalysisData, ApprovalOutcome, AssemblyData, CollectionStrategy, ExtractionData, Phase,
    PhasePayload, Session, SessionRepository,
};
use scrapegen_core::validation::{ProcessOutput, ProcessRunner, RunnerError, ScriptValidator};
use scrapegen_core::Result;
use scrapegen_infrastructure::InMemorySessionRepository;
use scrapegen_infrastructure::dto::SessionRecord;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const METADATA: &str = r#"{"name":"x","version":"1.0.0","target_url":"https://shop.test"}"#;

const DISCOVERY: &str = "async function collectProductUrls(page, baseUrl) {
  await page.goto(baseUrl);
  const links = await page.$$eval('a.product-card', (as) => as.map((a) => a.href));
  if (links.length > 0) return links;";

const EXTRACTION: &str = "async function extractProductData(page, url) {
  await page.goto(url);
  const name = await page.textContent('h1.product-title');
  if (name) return { url, name: name.trim(), is_available: true };";

/// Replays scripted process results in order; unscripted calls succeed.
struct ScriptedRunner {
    responses: Mutex<VecDeque<ProcessOutput>>,
    calls: Mutex<usize>,
}

impl ScriptedRunner {
    fn new(responses: Vec<ProcessOutput>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        _program: &str,
        _args: &[String],
        _cwd: &Path,
        _timeout: Duration,
    ) -> std::result::Result<ProcessOutput, RunnerError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| output("", 0)))
    }
}

#[derive(Default)]
struct RecordingPublisher {
    published: Mutex<Vec<String>>,
}

#[async_trait]
impl ScriptPublisher for RecordingPublisher {
    async fn publish(&self, session: &Session, script: &str) -> Result<String> {
        assert!(script.contains("const COLLECTION_STRATEGY = 'scraping';"));
        self.published.lock().unwrap().push(session.id.clone());
        Ok(format!("scraper-{}", self.published.lock().unwrap().len()))
    }
}

fn output(stdout: &str, exit_code: i32) -> ProcessOutput {
    ProcessOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(exit_code),
    }
}

struct Harness {
    usecase: Arc<ScraperSessionUseCase>,
    repo: Arc<InMemorySessionRepository>,
    runner: Arc<ScriptedRunner>,
    publisher: Arc<RecordingPublisher>,
}

fn harness(responses: Vec<ProcessOutput>) -> Harness {
    let repo = Arc::new(InMemorySessionRepository::new());
    let runner = ScriptedRunner::new(responses);
    let publisher = Arc::new(RecordingPublisher::default());
    let validator =
        Arc::new(ScriptValidator::new(runner.clone(), ValidatorSettings::default()).unwrap());
    let usecase = ScraperSessionUseCase::new(repo.clone(), validator, BUILTIN_TEMPLATE)
        .unwrap()
        .with_publisher(publisher.clone());
    Harness {
        usecase: Arc::new(usecase),
        repo,
        runner,
        publisher,
    }
}

fn analysis() -> PhasePayload {
    PhasePayload::Analysis(AnalysisData {
        product_pages: vec!["https://shop.test/p/1".to_string()],
        proposed_strategy: Some(CollectionStrategy::Scraping),
        ..Default::default()
    })
}

fn extraction() -> PhasePayload {
    PhasePayload::DataValidation(ExtractionData {
        discovery_code: Some(DISCOVERY.to_string()),
        generated_code: Some(EXTRACTION.to_string()),
        ..Default::default()
    })
}

async fn session_in_assembly(h: &Harness) -> Session {
    let session = h
        .usecase
        .create_session("u-1", "c-1", "https://shop.test")
        .await
        .unwrap();
    h.usecase
        .update_and_approve(&session.id, analysis(), None)
        .await
        .unwrap();
    let approval = h
        .usecase
        .update_and_approve(&session.id, extraction(), Some("looks right".to_string()))
        .await
        .unwrap();
    assert_eq!(approval.session.current_phase, Phase::Assembly);
    approval.session
}

#[tokio::test]
async fn test_phases_are_visited_in_order_with_assembly_self_loop() {
    let h = harness(vec![
        output("error TS2304: Cannot find name 'chromium'.", 2),
        output("", 0),
        output(METADATA, 0),
    ]);

    let session = h
        .usecase
        .create_session("u-1", "c-1", "https://shop.test")
        .await
        .unwrap();
    let mut visited = vec![session.current_phase];

    for payload in [analysis(), extraction()] {
        let approval = h
            .usecase
            .update_and_approve(&session.id, payload, None)
            .await
            .unwrap();
        visited.push(approval.session.current_phase);
    }

    let failed = h.usecase.assemble_and_validate(&session.id).await.unwrap();
    assert!(!failed.validation.valid);
    assert_eq!(h.runner.calls(), 1, "static failure short-circuits the metadata gate");
    assert!(matches!(failed.outcome, ApprovalOutcome::Retained { .. }));
    assert_eq!(failed.session.current_phase, Phase::Assembly);
    assert!(
        failed
            .session
            .assembly_data
            .validation_result
            .as_ref()
            .and_then(|r| r.error.as_deref())
            .is_some_and(|e| e.contains("TS2304"))
    );
    assert!(failed.session.assembly_data.scraper_id.is_none());
    visited.push(failed.session.current_phase);

    let passed = h.usecase.assemble_and_validate(&session.id).await.unwrap();
    assert!(passed.validation.valid);
    assert_eq!(passed.session.current_phase, Phase::Complete);
    assert_eq!(passed.session.assembly_data.scraper_id.as_deref(), Some("scraper-1"));
    assert!(passed.session.assembly_data.approved);
    visited.push(passed.session.current_phase);

    assert_eq!(
        visited,
        vec![
            Phase::Analysis,
            Phase::DataValidation,
            Phase::Assembly,
            Phase::Assembly,
            Phase::Complete
        ]
    );
    assert_eq!(h.publisher.published.lock().unwrap().len(), 1);

    let stored = h.usecase.get_session(&session.id).await.unwrap();
    assert_eq!(stored, passed.session);
    assert_eq!(h.usecase.canonical_phase(&session.id).await.unwrap(), Phase::Complete);
    assert!(
        h.usecase
            .approve_phase(&session.id, None)
            .await
            .unwrap_err()
            .is_invalid_state()
    );
}

#[tokio::test]
async fn test_assembled_script_contains_the_fragments() {
    let h = harness(vec![]);
    let session = session_in_assembly(&h).await;

    let report = h.usecase.preview_assembly(&session.id).await.unwrap();
    assert!(report.missing_anchors().next().is_none());
    assert!(report.script.contains("a.product-card"));
    assert!(report.script.contains("h1.product-title"));
    assert!(report.script.contains("name: \"AI Generated Scraper for shop.test\","));

    // Preview stores nothing.
    let stored = h.usecase.get_session(&session.id).await.unwrap();
    assert!(stored.assembly_data.assembled_script.is_none());
}

#[tokio::test]
async fn test_assembly_requires_assembly_phase() {
    let h = harness(vec![]);
    let session = h
        .usecase
        .create_session("u-1", "c-1", "https://shop.test")
        .await
        .unwrap();

    let err = h.usecase.assemble_and_validate(&session.id).await.unwrap_err();
    assert!(err.is_invalid_state());
    assert_eq!(h.runner.calls(), 0);
}

#[tokio::test]
async fn test_approve_without_data_leaves_session_untouched() {
    let h = harness(vec![]);
    let session = h
        .usecase
        .create_session("u-1", "c-1", "https://shop.test")
        .await
        .unwrap();

    let err = h.usecase.approve_phase(&session.id, None).await.unwrap_err();
    assert!(err.is_invalid_state());
    assert_eq!(h.repo.find_by_id(&session.id).await.unwrap(), Some(session));
}

#[tokio::test]
async fn test_concurrent_approvals_are_serialized() {
    let h = harness(vec![]);
    let session = h
        .usecase
        .create_session("u-1", "c-1", "https://shop.test")
        .await
        .unwrap();
    h.usecase
        .update_and_approve(&session.id, analysis(), None)
        .await
        .unwrap();
    h.usecase
        .update_phase_data(&session.id, extraction())
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        h.usecase.approve_phase(&session.id, None),
        h.usecase.approve_phase(&session.id, None)
    );

    // Exactly one approval advances; the other sees assembly with no data.
    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.is_invalid_state())
    );
    assert_eq!(
        h.usecase.get_session(&session.id).await.unwrap().current_phase,
        Phase::Assembly
    );
}

#[tokio::test]
async fn test_regenerate_records_feedback_and_rejects_phases_ahead() {
    let h = harness(vec![]);
    let session = h
        .usecase
        .create_session("u-1", "c-1", "https://shop.test")
        .await
        .unwrap();
    h.usecase
        .update_and_approve(&session.id, analysis(), None)
        .await
        .unwrap();

    let regenerated = h
        .usecase
        .regenerate_phase(&session.id, extraction(), "prices missing")
        .await
        .unwrap();
    assert_eq!(
        regenerated.extraction_data.user_feedback.as_deref(),
        Some("prices missing")
    );
    assert!(!regenerated.extraction_data.approved);

    let err = h
        .usecase
        .regenerate_phase(
            &session.id,
            PhasePayload::Assembly(AssemblyData::default()),
            "skip ahead",
        )
        .await
        .unwrap_err();
    assert!(err.is_invalid_state());
    let stored = h.usecase.get_session(&session.id).await.unwrap();
    assert_eq!(stored, regenerated);

    let prompt = h
        .usecase
        .compose_feedback(&session.id, None, "prices missing")
        .await
        .unwrap();
    assert!(prompt.user.contains("prices missing"));
    assert!(prompt.user.contains("h1.product-title"));
}

const FIXED_EXTRACTION: &str = "async function extractProductData(page, url) {
  await page.goto(url);
  const name = await page.textContent('h1.product-name');
  if (name) return { url, name: name.trim(), is_available: true };";

#[tokio::test]
async fn test_failed_validation_retries_with_regenerated_fragment() {
    let h = harness(vec![
        output("error TS2304: Cannot find name 'nme'.", 2),
        output("", 0),
        output(METADATA, 0),
    ]);
    let session = session_in_assembly(&h).await;

    let failed = h.usecase.assemble_and_validate(&session.id).await.unwrap();
    assert!(!failed.validation.valid);
    assert_eq!(failed.session.current_phase, Phase::Assembly);

    let prompt = h
        .usecase
        .compose_feedback(&session.id, Some("data-validation"), "fix the TS error")
        .await
        .unwrap();
    assert!(prompt.user.contains("fix the TS error"));

    let regenerated = h
        .usecase
        .regenerate_phase(
            &session.id,
            PhasePayload::DataValidation(ExtractionData {
                discovery_code: Some(DISCOVERY.to_string()),
                generated_code: Some(FIXED_EXTRACTION.to_string()),
                ..Default::default()
            }),
            "fix the TS error",
        )
        .await
        .unwrap();
    assert_eq!(regenerated.current_phase, Phase::Assembly);
    assert!(!regenerated.extraction_data.approved);
    assert_eq!(
        regenerated.extraction_data.user_feedback.as_deref(),
        Some("fix the TS error")
    );

    let passed = h.usecase.assemble_and_validate(&session.id).await.unwrap();
    assert!(passed.validation.valid);
    assert!(passed.report.script.contains("h1.product-name"));
    assert!(!passed.report.script.contains("h1.product-title"));
    assert_eq!(passed.session.current_phase, Phase::Complete);
    assert_eq!(passed.session.assembly_data.scraper_id.as_deref(), Some("scraper-1"));
    assert_eq!(h.runner.calls(), 3);

    let err = h
        .usecase
        .regenerate_phase(&session.id, extraction(), "too late")
        .await
        .unwrap_err();
    assert!(err.is_invalid_state());
}

#[tokio::test]
async fn test_legacy_session_and_delete() {
    let h = harness(vec![]);
    let session = Session::new("u-7", "c-7", "https://old.test");
    let mut record = SessionRecord::from(&session);
    record.current_phase = "data-extraction".to_string();
    h.repo.insert_record(record).await;

    let loaded = h.usecase.get_session(&session.id).await.unwrap();
    assert_eq!(loaded.current_phase, Phase::DataValidation);
    // No analysis data, so the session really is still analysing.
    assert_eq!(h.usecase.canonical_phase(&session.id).await.unwrap(), Phase::Analysis);
    assert_eq!(h.usecase.list_by_owner("u-7").await.unwrap().len(), 1);
    assert_eq!(h.usecase.list_by_target("c-7").await.unwrap().len(), 1);

    h.usecase.delete_session(&session.id).await.unwrap();
    assert!(h.usecase.get_session(&session.id).await.unwrap_err().is_not_found());
    assert!(h.usecase.delete_session(&session.id).await.unwrap_err().is_not_found());
}
