use async_trait::async_trait;
use insight_interview::{
    ExportError, ExportedArtifact, FileExporter, GenerationError, InterviewError,
    InterviewSession, Interviewer, Phase, PromptTemplates, QuestionGenerator, Reply,
    ReportExporter, ScriptedGenerator, SessionRegistry,
};
use insight_types::{InterviewReport, Speaker};
use std::path::PathBuf;
use std::sync::Arc;

const SUMMARY: &str = "1. Profile: commuter\n2. Usage: daily\n3. Decision: price\n\
                       4. Competitors: two\n5. Needs: offline mode\n6. Advice: bundle";

fn interviewer(llm: Arc<ScriptedGenerator>, exporter: Arc<dyn ReportExporter>) -> Interviewer {
    let generator = QuestionGenerator::new(llm, PromptTemplates::default()).unwrap();
    Interviewer::new(generator, exporter)
}

/// Plays 21 answers with a canned question after each of the first 20.
fn answer_until_summary(session: &mut InterviewSession) {
    for turn in 1..=20 {
        session.record_user_turn(&format!("a{turn}")).unwrap();
        session.record_agent_turn(&format!("q{turn}")).unwrap();
    }
    session.record_user_turn("a21").unwrap();
}

struct FailingExporter;

#[async_trait]
impl ReportExporter for FailingExporter {
    async fn export(&self, _report: &InterviewReport) -> Result<ExportedArtifact, ExportError> {
        Err(ExportError::Io {
            path: PathBuf::from("/nowhere/report.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

#[tokio::test]
async fn full_interview_runs_four_phases_then_summarizes() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedGenerator::new("What else can you tell me?"));
    llm.push_reply("What should I call you?");
    let interviewer = interviewer(llm.clone(), Arc::new(FileExporter::new(dir.path())));

    let mut session = InterviewSession::new("music streaming", None);
    let opening = interviewer.start(&mut session).await.unwrap();
    assert_eq!(opening.as_deref(), Some("What should I call you?"));
    // A second start is a no-op.
    assert!(interviewer.start(&mut session).await.unwrap().is_none());

    for turn in 1..=20u32 {
        session.record_user_turn(&format!("answer {turn}")).unwrap();
        match interviewer.respond(&mut session).await.unwrap() {
            Reply::Question { text, phase } => {
                assert_eq!(text, "What else can you tell me?");
                assert_eq!(phase, Phase::for_turn_count(turn));
            }
            Reply::Completed(_) => panic!("interview completed early at turn {turn}"),
        }
    }
    assert_eq!(session.phase(), Phase::CompetitorAnalysis);

    llm.push_reply(SUMMARY);
    let outcome = session.record_user_turn("answer 21").unwrap();
    assert!(outcome.phase_changed());
    assert_eq!(outcome.phase, Phase::Summary);

    let completion = match interviewer.respond(&mut session).await.unwrap() {
        Reply::Completed(completion) => completion,
        Reply::Question { .. } => panic!("expected the summary after turn 21"),
    };

    assert!(session.is_terminated());
    assert_eq!(completion.report.summary_text, SUMMARY);
    assert_eq!(completion.report.summary_items().count(), 6);
    // Opening question, 21 answers and 20 follow-up questions.
    assert_eq!(completion.report.source_transcript.len(), 42);
    assert_eq!(completion.closing, PromptTemplates::default().closing);
    assert!(completion.export_error.is_none());

    let artifact = completion.artifact.expect("export should succeed");
    let document = std::fs::read_to_string(&artifact.path).unwrap();
    assert!(document.contains("5. Needs: offline mode"));
    assert!(document.contains("- **User:** answer 21"));

    // The summary request carries the whole conversation in one instruction.
    let calls = llm.calls();
    let summary_call = calls.last().unwrap();
    assert_eq!(summary_call.len(), 1);
    assert!(summary_call[0].content.contains("User: answer 21"));
    assert_eq!(llm.call_count(), 22);

    assert!(matches!(
        session.record_user_turn("one more"),
        Err(InterviewError::SessionClosed)
    ));
    assert!(matches!(
        interviewer.respond(&mut session).await,
        Err(InterviewError::SessionClosed)
    ));
}

#[tokio::test]
async fn failed_generation_leaves_session_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedGenerator::new("How old are you?"));
    let interviewer = interviewer(llm.clone(), Arc::new(FileExporter::new(dir.path())));

    let mut session = InterviewSession::new("coffee", None);
    interviewer.start(&mut session).await.unwrap();
    session.record_user_turn("Call me Ken.").unwrap();
    let before = session.transcript().clone();

    llm.push_failure(GenerationError::Status {
        status: 503,
        body: "overloaded".to_string(),
    });
    let err = interviewer.respond(&mut session).await.unwrap_err();
    assert!(err.is_retryable());

    assert_eq!(session.transcript(), &before);
    assert_eq!(session.turn_count(), 1);
    assert_eq!(session.phase(), Phase::PersonalAttributes);
    assert!(session.awaits_reply());

    // Retrying answers the same pending turn.
    let reply = interviewer.respond(&mut session).await.unwrap();
    assert!(matches!(reply, Reply::Question { .. }));
    assert_eq!(session.transcript().len(), before.len() + 1);
    assert_eq!(
        session.transcript().last().map(|t| t.speaker),
        Some(Speaker::Agent)
    );

    assert!(matches!(
        interviewer.respond(&mut session).await,
        Err(InterviewError::NothingToReply)
    ));
}

#[tokio::test]
async fn phase_never_advances_past_an_unanswered_turn() {
    let llm = Arc::new(ScriptedGenerator::new("How old are you?"));
    let interviewer = interviewer(llm.clone(), Arc::new(FailingExporter));
    let mut session = InterviewSession::new("coffee", None);

    session.record_user_turn("Call me Ken.").unwrap();
    for _ in 0..6 {
        llm.push_failure(GenerationError::Timeout(30));
        assert!(interviewer.respond(&mut session).await.is_err());
        assert!(matches!(
            session.record_user_turn("Still there?"),
            Err(InterviewError::ReplyPending)
        ));
    }

    assert_eq!(session.turn_count(), 1);
    assert_eq!(session.phase(), Phase::PersonalAttributes);
    assert_eq!(session.transcript().len(), 1);

    let reply = interviewer.respond(&mut session).await.unwrap();
    assert!(matches!(reply, Reply::Question { .. }));
    assert!(session.record_user_turn("41.").is_ok());
}

#[tokio::test]
async fn failed_summary_can_be_retried() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedGenerator::new(SUMMARY));
    let interviewer = interviewer(llm.clone(), Arc::new(FileExporter::new(dir.path())));

    let mut session = InterviewSession::new("coffee", None);
    answer_until_summary(&mut session);

    llm.push_failure(GenerationError::Timeout(60));
    assert!(interviewer.respond(&mut session).await.is_err());
    assert!(!session.is_terminated());

    let reply = interviewer.respond(&mut session).await.unwrap();
    assert!(matches!(reply, Reply::Completed(_)));
    assert!(session.is_terminated());
}

#[tokio::test]
async fn export_failure_keeps_the_report() {
    let llm = Arc::new(ScriptedGenerator::new(SUMMARY));
    let interviewer = interviewer(llm, Arc::new(FailingExporter));

    let mut session = InterviewSession::new("coffee", None);
    answer_until_summary(&mut session);

    let completion = match interviewer.respond(&mut session).await.unwrap() {
        Reply::Completed(completion) => completion,
        Reply::Question { .. } => panic!("expected completion"),
    };

    assert!(session.is_terminated());
    assert!(completion.artifact.is_none());
    assert!(completion
        .export_error
        .as_deref()
        .is_some_and(|e| e.contains("read-only")));
    assert_eq!(completion.report.summary_text, SUMMARY);
    assert_eq!(completion.report.source_transcript.len(), 41);
}

#[tokio::test]
async fn disabled_export_completes_without_an_artifact() {
    let llm = Arc::new(ScriptedGenerator::new(SUMMARY));
    let generator = QuestionGenerator::new(llm, PromptTemplates::default()).unwrap();
    let interviewer = Interviewer::without_export(generator);

    let mut session = InterviewSession::new("coffee", None);
    answer_until_summary(&mut session);

    match interviewer.respond(&mut session).await.unwrap() {
        Reply::Completed(completion) => {
            assert!(completion.artifact.is_none());
            assert!(completion.export_error.is_none());
        }
        Reply::Question { .. } => panic!("expected completion"),
    }
}

#[tokio::test]
async fn concurrent_sessions_do_not_interfere() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedGenerator::new("Next?"));
    let interviewer = interviewer(llm, Arc::new(FileExporter::new(dir.path())));
    let registry = SessionRegistry::new();

    let a = registry.insert(InterviewSession::new("tea", None));
    let b = registry.insert(InterviewSession::new("bicycles", None));

    let drive = |handle: insight_interview::SharedSession, turns: u32| {
        let interviewer = interviewer.clone();
        tokio::spawn(async move {
            for turn in 0..turns {
                let mut session = handle.lock().await;
                session.record_user_turn(&format!("answer {turn}")).unwrap();
                interviewer.respond(&mut session).await.unwrap();
                drop(session);
                tokio::task::yield_now().await;
            }
        })
    };

    let (ra, rb) = tokio::join!(drive(a.clone(), 7), drive(b.clone(), 12));
    ra.unwrap();
    rb.unwrap();

    let a = a.lock().await;
    let b = b.lock().await;
    assert_eq!(a.turn_count(), 7);
    assert_eq!(a.phase(), Phase::UsageSituation);
    assert_eq!(a.transcript().len(), 14);
    assert_eq!(b.turn_count(), 12);
    assert_eq!(b.phase(), Phase::PurchaseIntention);
    assert!(a.transcript().iter().all(|t| t.text != "answer 11"));
    assert_eq!(registry.len(), 2);
}
