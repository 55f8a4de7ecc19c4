mod common;

use common::{FakeBackend, FakeClassifier, FakeDevice, ScriptedConsole};
use mkai::agent::console::Prompted;
use mkai::agent::dialect::TypedDialectPolicy;
use mkai::agent::feedback::MemoryFeedback;
use mkai::agent::responses::{ResponseSelector, ResponseStrategy};
use mkai::agent::sentiment::{Emotion, SentimentClassifier};
use mkai::agent::session::{Session, SessionParts, SessionState, TurnOutcome, RATING_PROMPT};
use mkai::agent::voice::{CaptureSettings, InputChain, SpeechBackend, SynthesisChain};
use mkai::MkaiError;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

struct Rig {
    session: Session,
    console: Arc<ScriptedConsole>,
    device: Arc<FakeDevice>,
}

fn rig(
    answers: Vec<Prompted>,
    classifier: Arc<dyn SentimentClassifier>,
    primary: Option<Box<dyn SpeechBackend>>,
    fallback: Box<dyn SpeechBackend>,
    output_dir: &Path,
) -> Rig {
    rig_with_device(answers, classifier, primary, fallback, output_dir, FakeDevice::broken())
}

fn rig_with_device(
    answers: Vec<Prompted>,
    classifier: Arc<dyn SentimentClassifier>,
    primary: Option<Box<dyn SpeechBackend>>,
    fallback: Box<dyn SpeechBackend>,
    output_dir: &Path,
    device: Arc<FakeDevice>,
) -> Rig {
    let console = ScriptedConsole::new(answers);

    let input = InputChain::new(
        device.clone(),
        None,
        console.clone(),
        CaptureSettings {
            buffer_path: output_dir.join("input.wav"),
            duration_secs: 5,
            sample_rate: 16000,
            text_only: true,
        },
        TypedDialectPolicy::AssumeMsa,
    );

    let session = Session::new(SessionParts {
        input,
        classifier,
        responses: ResponseSelector::new(ResponseStrategy::First),
        synthesis: SynthesisChain::new(primary, fallback, output_dir.join("response.mp3"), "ar"),
        device: device.clone(),
        console: console.clone(),
        feedback: Box::new(MemoryFeedback::new()),
    });

    Rig {
        session,
        console,
        device,
    }
}

fn lines(lines: &[&str]) -> Vec<Prompted> {
    lines.iter().map(|l| Prompted::Line(l.to_string())).collect()
}

#[tokio::test]
async fn test_feedback_grows_only_on_negative_ratings() {
    let dir = tempfile::tempdir().unwrap();
    let mut rig = rig(
        lines(&[
            "مش عارف اعمل ايه",
            "y",
            "ما هذا",
            "n",
            "رد أفضل",
            "صباح الخير",
            "correct",
            "",
            "exit",
        ]),
        FakeClassifier::labelling("positive"),
        None,
        Box::new(FakeBackend::new("translate", 0)),
        dir.path(),
    );

    let shutdown = rig.session.run(std::future::pending()).await;

    assert!(matches!(shutdown.reason, MkaiError::UserExit));
    assert_eq!(shutdown.feedback_count, 2);
    assert_eq!(rig.session.feedback().len(), 2);
    assert_eq!(rig.session.state(), SessionState::Stopped);
    assert_eq!(rig.device.play_count(), 3);
    assert_eq!(rig.console.said_containing("Bot: أمر رائع! هل تريد المزيد من المساعدة؟"), 3);
    assert_eq!(rig.console.said_containing("Saved 2 feedback entries for training"), 1);
}

#[tokio::test]
async fn test_single_turn_records_turn_details() {
    let dir = tempfile::tempdir().unwrap();
    let mut rig = rig(
        lines(&["أنا حزين", "y"]),
        FakeClassifier::labelling("negative"),
        Some(Box::new(FakeBackend::new("cloud", 0))),
        Box::new(FakeBackend::new("translate", 0)),
        dir.path(),
    );

    match rig.session.run_turn().await {
        Ok(TurnOutcome::Completed(turn)) => {
            assert_eq!(turn.raw_text, "أنا حزين");
            assert_eq!(turn.emotion, Emotion::Negative);
            assert_eq!(turn.reply, "أنا آسف لسماع ذلك. هل تريد التحدث أكثر؟");
            assert_eq!(turn.audio, Some(dir.path().join("response.mp3")));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(rig.session.backend().primary_usable());
    assert_eq!(rig.session.feedback().len(), 0);
    assert_eq!(rig.session.state(), SessionState::AwaitingFeedback);
}

#[tokio::test]
async fn test_classifier_failure_abandons_turn() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = FakeClassifier::failing();
    let mut rig = rig(
        lines(&["مرحبا", "exit"]),
        classifier.clone(),
        None,
        Box::new(FakeBackend::new("translate", 0)),
        dir.path(),
    );

    assert!(matches!(rig.session.run_turn().await, Ok(TurnOutcome::Abandoned)));
    assert_eq!(rig.device.play_count(), 0);
    // no rating prompt for an abandoned turn
    assert_eq!(rig.console.prompt_count(), 1);

    assert!(matches!(rig.session.run_turn().await, Err(MkaiError::UserExit)));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_emotion_is_reported_not_defaulted() {
    let dir = tempfile::tempdir().unwrap();
    let mut rig = rig(
        lines(&["مرحبا", "exit"]),
        FakeClassifier::labelling("excited"),
        None,
        Box::new(FakeBackend::new("translate", 0)),
        dir.path(),
    );

    let shutdown = rig.session.run(std::future::pending()).await;
    assert!(matches!(shutdown.reason, MkaiError::UserExit));
    assert_eq!(rig.console.said_containing("unknown emotion category 'excited'"), 1);
    assert_eq!(rig.console.said_containing("Bot:"), 0);
    assert_eq!(rig.device.play_count(), 0);
}

#[tokio::test]
async fn test_synthesis_unavailable_skips_playback_but_asks_rating() {
    let dir = tempfile::tempdir().unwrap();
    let mut rig = rig(
        lines(&["مرحبا", "n", "لا بأس", "exit"]),
        FakeClassifier::labelling("neutral"),
        Some(Box::new(FakeBackend::always_failing("cloud"))),
        Box::new(FakeBackend::always_failing("translate")),
        dir.path(),
    );

    let shutdown = rig.session.run(std::future::pending()).await;
    assert_eq!(shutdown.feedback_count, 1);
    assert_eq!(rig.device.play_count(), 0);
    assert!(!rig.session.backend().primary_usable());
}

#[tokio::test]
async fn test_playback_failure_still_asks_rating() {
    let dir = tempfile::tempdir().unwrap();
    let mut rig = rig_with_device(
        lines(&["مرحبا", "n", "أهلا وسهلا", "صباح الخير", "y", "exit"]),
        FakeClassifier::labelling("positive"),
        None,
        Box::new(FakeBackend::new("translate", 0)),
        dir.path(),
        FakeDevice::silent(),
    );

    let shutdown = rig.session.run(std::future::pending()).await;
    assert!(matches!(shutdown.reason, MkaiError::UserExit));
    assert_eq!(shutdown.feedback_count, 1);
    assert_eq!(rig.device.play_count(), 0);
    assert_eq!(rig.console.said_containing("Could not play response"), 2);
    let ratings = rig
        .console
        .prompts
        .lock()
        .unwrap()
        .iter()
        .filter(|p| p.as_str() == RATING_PROMPT)
        .count();
    assert_eq!(ratings, 2);
}

#[tokio::test]
async fn test_interrupt_stops_with_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut rig = rig(
        lines(&["مرحبا", "y"]),
        FakeClassifier::labelling("positive"),
        None,
        Box::new(FakeBackend::new("translate", 0)),
        dir.path(),
    );

    let shutdown = rig.session.run(std::future::ready(())).await;
    assert!(matches!(shutdown.reason, MkaiError::Interrupted));
    assert_eq!(shutdown.feedback_count, 0);
    assert_eq!(rig.console.prompt_count(), 0);
    assert_eq!(rig.console.said_containing("Saved 0 feedback entries for training"), 1);
}

#[tokio::test]
async fn test_interrupt_at_rating_prompt_stops_without_recording() {
    let dir = tempfile::tempdir().unwrap();
    let mut answers = lines(&["مرحبا"]);
    answers.push(Prompted::Interrupted);
    let mut rig = rig(
        answers,
        FakeClassifier::labelling("positive"),
        None,
        Box::new(FakeBackend::new("translate", 0)),
        dir.path(),
    );

    let shutdown = rig.session.run(std::future::pending()).await;
    assert!(matches!(shutdown.reason, MkaiError::Interrupted));
    assert_eq!(shutdown.feedback_count, 0);
}
