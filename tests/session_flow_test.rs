//! Integration tests for a full commit quest against temporary repositories.

mod common;

use std::collections::BTreeSet;

use common::{StubGenerator, TestRepo};
use commit_quest::commit::{CommitType, MessageSource};
use commit_quest::error::{GenerationError, GitError, SessionError};
use commit_quest::session::{ProposalRequest, Session, SessionOptions, SessionState};

#[tokio::test]
async fn test_generated_message_prompt_and_score() {
    let test_repo = TestRepo::configured("JavaScript", "React", "Front-end");
    test_repo.write_file("app.js", "const a = 0;\n");
    test_repo.commit_all("chore: initial");
    test_repo.write_file("app.js", "const a = 0;\nconst x = 1;\n");

    let generator = StubGenerator::replying("feat: add x constant");
    let mut session =
        Session::new(test_repo.path(), generator.clone(), SessionOptions::default()).unwrap();

    let proposal = session.propose(&ProposalRequest::default()).await.unwrap();

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    let (prompt, max_tokens) = &calls[0];
    assert_eq!(*max_tokens, 50);

    let prefix = "Generate a brief feat commit message for a JavaScript React project: frontend changes";
    assert!(prompt.starts_with(prefix), "unexpected prompt: {prompt}");
    let tail = prompt.rsplit(' ').next().unwrap();
    let keywords: BTreeSet<&str> = tail.split('|').collect();
    assert_eq!(keywords, BTreeSet::from(["const", "x", "=", "1;"]));

    assert_eq!(proposal.messages.len(), 1);
    assert_eq!(proposal.messages[0].text(), "feat: add x constant");
    assert_eq!(proposal.score.experience, 1);
    assert_eq!(proposal.score.enemies_slain, 1);
    assert_eq!(proposal.score.boost, 0);
    assert_eq!(session.state(), SessionState::AwaitingReview);
}

#[tokio::test]
async fn test_custom_message_never_calls_generator() {
    let test_repo = TestRepo::configured("Rust", "None", "Backend");
    test_repo.write_file("src/lib.rs", "pub fn answer() -> u32 { 42 }\n");

    let generator = StubGenerator::replying("unused");
    let mut session =
        Session::new(test_repo.path(), generator.clone(), SessionOptions::default()).unwrap();

    let request = ProposalRequest {
        commit_type: CommitType::Fix,
        custom_message: "return the right answer".to_string(),
        ..ProposalRequest::default()
    };
    let proposal = session.propose(&request).await.unwrap();

    assert_eq!(generator.call_count(), 0);
    assert_eq!(proposal.messages[0].source, MessageSource::Custom);
    assert_eq!(proposal.messages[0].text(), "fix: return the right answer");
    assert_eq!(proposal.score.boost, 25);
    assert_eq!(proposal.score.total_experience(), 26);
}

#[tokio::test]
async fn test_cache_is_shared_between_sessions() {
    let test_repo = TestRepo::configured("Python", "Flask", "Backend");
    test_repo.write_file("app.py", "print('hi')\n");

    let generator = StubGenerator::replying("feat: greet");
    let mut first =
        Session::new(test_repo.path(), generator.clone(), SessionOptions::default()).unwrap();
    first.propose(&ProposalRequest::default()).await.unwrap();

    let mut second =
        Session::new(test_repo.path(), generator.clone(), SessionOptions::default()).unwrap();
    let proposal = second.propose(&ProposalRequest::default()).await.unwrap();

    assert_eq!(generator.call_count(), 1);
    assert_eq!(proposal.messages[0].source, MessageSource::Cached);
    assert_eq!(proposal.messages[0].text(), "feat: greet");
}

#[tokio::test]
async fn test_auto_commit_creates_commit_with_message() {
    let test_repo = TestRepo::configured("Go", "None", "Backend");
    test_repo.write_file("main.go", "package main\n");

    let generator = StubGenerator::replying("fix: add entry point");
    let mut session =
        Session::new(test_repo.path(), generator, SessionOptions::default()).unwrap();

    let request = ProposalRequest {
        commit_type: CommitType::Fix,
        ..ProposalRequest::default()
    };
    let proposal = session.propose(&request).await.unwrap();
    assert_eq!(proposal.score.boost, 25);

    let oid = session.accept(&proposal.messages[0], true).unwrap();

    assert!(oid.is_some());
    assert_eq!(session.state(), SessionState::Committed);
    assert_eq!(test_repo.commit_count(), 1);
    assert_eq!(test_repo.head_message(), "fix: add entry point");
}

#[tokio::test]
async fn test_declined_review_leaves_repository_untouched() {
    let test_repo = TestRepo::configured("Go", "None", "Backend");
    test_repo.write_file("main.go", "package main\n");

    let mut session = Session::new(
        test_repo.path(),
        StubGenerator::replying("chore: stuff"),
        SessionOptions::default(),
    )
    .unwrap();
    session.propose(&ProposalRequest::default()).await.unwrap();
    session.decline();

    assert_eq!(session.state(), SessionState::Declined);
    assert_eq!(test_repo.commit_count(), 0);
}

#[tokio::test]
async fn test_generation_failure_is_distinguishable() {
    let test_repo = TestRepo::configured("Python", "None", "None");
    test_repo.write_file("a.py", "x = 1\n");

    let mut session = Session::new(
        test_repo.path(),
        StubGenerator::failing("model is loading"),
        SessionOptions::default(),
    )
    .unwrap();

    let result = session.propose(&ProposalRequest::default()).await;
    match result {
        Err(SessionError::Generation(GenerationError::MalformedResponse(reason))) => {
            assert_eq!(reason, "model is loading");
        }
        other => panic!("expected a generation failure, got {other:?}"),
    }
    assert!(session.cache().is_empty().unwrap());
}

#[tokio::test]
async fn test_missing_config_fails_before_touching_git() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(
        dir.path(),
        StubGenerator::replying("unused"),
        SessionOptions::default(),
    )
    .unwrap();

    let result = session.propose(&ProposalRequest::default()).await;
    assert!(matches!(result, Err(SessionError::ConfigMissing(_))));
    assert!(!dir.path().join(".git").exists());
}

#[tokio::test]
async fn test_missing_repository_without_init() {
    let dir = tempfile::tempdir().unwrap();
    commit_quest::config::ConfigStore::new(dir.path())
        .save(&commit_quest::config::ProjectConfig::default())
        .unwrap();

    let mut session = Session::new(
        dir.path(),
        StubGenerator::replying("unused"),
        SessionOptions::default(),
    )
    .unwrap();

    let result = session.propose(&ProposalRequest::default()).await;
    assert!(matches!(result, Err(SessionError::RepoMissing(_))));
}

#[tokio::test]
async fn test_full_stack_without_language_gets_boost() {
    let test_repo = TestRepo::configured("", "React", "Full-stack");
    test_repo.write_file("app.js", "const x = 1;\n");

    let mut session = Session::new(
        test_repo.path(),
        StubGenerator::replying("feat: add x"),
        SessionOptions::default(),
    )
    .unwrap();
    let proposal = session.propose(&ProposalRequest::default()).await.unwrap();

    assert_eq!(proposal.score.boost, 10);
    assert_eq!(
        proposal.score.boost_message,
        "Your Full-stack skills shine as you craft a new feature!"
    );
}

#[tokio::test]
async fn test_auto_commit_without_identity_is_auto_commit_failure() {
    let test_repo = TestRepo::configured("Go", "None", "Backend");
    test_repo.clear_identity();
    test_repo.write_file("main.go", "package main\n");

    let mut session = Session::new(
        test_repo.path(),
        StubGenerator::replying("feat: add entry point"),
        SessionOptions::default(),
    )
    .unwrap();
    let proposal = session.propose(&ProposalRequest::default()).await.unwrap();

    let result = session.accept(&proposal.messages[0], true);

    match result {
        Err(err @ SessionError::AutoCommit(GitError::ConfigError(_))) => {
            assert!(err.is_user_facing());
            assert!(err.to_string().contains("committing it failed"));
        }
        other => panic!("expected an auto-commit failure, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::AwaitingReview);
    assert_eq!(test_repo.commit_count(), 0);
}
