//! Session flow tests: ask, history, voice input, download

use std::sync::Arc;

use findora::{DOWNLOAD_FILE_NAME, Error, HistoryEntry, HistoryStore, Recommendations, Session};

mod common;

use common::FakeCompletion;

const RL_ANSWER: &str = "Reinforcement learning trains an agent through rewards. \
It learns a policy by trial and error.";

fn store_in(dir: &tempfile::TempDir) -> HistoryStore {
    HistoryStore::new(dir.path().join("history.json"))
}

#[tokio::test]
async fn test_ask_records_history_and_downloads() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(FakeCompletion::replying(RL_ANSWER));
    let mut session = Session::open(fake.clone(), store_in(&dir));

    let answer = session.ask("What is reinforcement learning?").await.unwrap();
    assert_eq!(answer.query, "What is reinforcement learning?");
    assert_eq!(answer.response, RL_ANSWER);
    assert!(answer.history_error.is_none());
    assert_eq!(fake.questions(), vec!["What is reinforcement learning?"]);

    let expected = vec![HistoryEntry::new("What is reinforcement learning?", RL_ANSWER)];
    assert_eq!(session.history(), expected.as_slice());
    assert_eq!(session.last_response(), Some(RL_ANSWER));

    // Persisted log matches memory
    assert_eq!(store_in(&dir).load(), expected);

    let out = dir.path().join("downloads");
    let path = session.download_response(&out).unwrap();
    assert_eq!(path, out.join(DOWNLOAD_FILE_NAME));
    assert_eq!(std::fs::read(&path).unwrap(), RL_ANSWER.as_bytes());
}

#[tokio::test]
async fn test_history_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let mut first = Session::open(Arc::new(FakeCompletion::replying("yes")), store_in(&dir));
    first.ask("Is Rust fast?").await.unwrap();
    first.ask("Is Python popular?").await.unwrap();

    let second = Session::open(Arc::new(FakeCompletion::replying("yes")), store_in(&dir));
    let queries: Vec<&str> = second.history().iter().map(|e| e.query.as_str()).collect();
    assert_eq!(queries, vec!["Is Rust fast?", "Is Python popular?"]);
    assert!(second.last_response().is_none());
}

#[tokio::test]
async fn test_remote_failure_leaves_history_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(Arc::new(FakeCompletion::failing()), store_in(&dir));

    let err = session.ask("What is Groq?").await.unwrap_err();
    assert!(matches!(err, Error::RemoteCall(_)));
    assert!(session.history().is_empty());
    assert!(session.last_response().is_none());
    assert!(!dir.path().join("history.json").exists());
}

#[tokio::test]
async fn test_empty_query_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(FakeCompletion::replying("unused"));
    let mut session = Session::open(fake.clone(), store_in(&dir));

    assert!(matches!(session.ask("   ").await, Err(Error::EmptyQuery)));
    assert!(fake.questions().is_empty());
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn test_voice_transcript_overrides_typed_text_once() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(FakeCompletion::replying("ok"));
    let mut session = Session::open(fake.clone(), store_in(&dir));

    session.set_voice_query("tell me about rust");
    assert_eq!(session.pending_voice(), Some("tell me about rust"));

    let answer = session.ask("typed text").await.unwrap();
    assert_eq!(answer.query, "tell me about rust");
    assert!(session.pending_voice().is_none());

    // Consumed: typed text wins next time
    let answer = session.ask("typed text").await.unwrap();
    assert_eq!(answer.query, "typed text");
    assert_eq!(fake.questions(), vec!["tell me about rust", "typed text"]);
}

#[tokio::test]
async fn test_blank_transcript_does_not_override() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(Arc::new(FakeCompletion::replying("ok")), store_in(&dir));

    session.set_voice_query("  ");
    assert!(session.pending_voice().is_none());
    assert_eq!(session.ask("typed").await.unwrap().query, "typed");
}

#[tokio::test]
async fn test_save_failure_is_reported_and_memory_kept() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the history file should be makes every write fail
    let blocked = dir.path().join("history.json");
    std::fs::create_dir(&blocked).unwrap();

    let mut session = Session::open(
        Arc::new(FakeCompletion::replying("answer")),
        HistoryStore::new(&blocked),
    );

    let answer = session.ask("question").await.unwrap();
    assert_eq!(answer.response, "answer");
    assert!(answer.history_error.is_some());
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.last_response(), Some("answer"));
}

#[tokio::test]
async fn test_clear_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(Arc::new(FakeCompletion::replying("ok")), store_in(&dir));

    session.ask("What is AI?").await.unwrap();
    session.clear_history().unwrap();

    assert!(session.history().is_empty());
    assert!(store_in(&dir).load().is_empty());
    assert_eq!(session.recommendations(), Recommendations::NoHistory);
}

#[tokio::test]
async fn test_recommendations_follow_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(Arc::new(FakeCompletion::replying("ok")), store_in(&dir));

    assert_eq!(session.recommendations(), Recommendations::NoHistory);

    session.ask("How do I deploy Rust to the cloud?").await.unwrap();
    session.ask("Is python good for AI?").await.unwrap();

    assert_eq!(
        session.recommendations(),
        Recommendations::Topics(vec!["Python", "AI", "Rust", "Cloud"])
    );
}

#[tokio::test]
async fn test_download_without_response_fails() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::open(Arc::new(FakeCompletion::replying("ok")), store_in(&dir));

    let err = session.download_response(dir.path()).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(!dir.path().join(DOWNLOAD_FILE_NAME).exists());
}
