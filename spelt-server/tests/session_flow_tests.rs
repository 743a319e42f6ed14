
use spelt_types::{
    ClientMessage, FeedbackKind, RequestError, ServerMessage, SessionPhase, SubmissionState,
};
use std::time::{Duration, Instant};
use test_helpers::*;

use spelt_server::websocket::handlers::MessageHandler;
use tokio::sync::mpsc;

async fn sign_in(handler: &mut MessageHandler, name: &str) {
    handler
        .handle_message(ClientMessage::Authenticate {
            token: format!("{}-id:{}@example.com:{}", name, name, name),
        })
        .await
        .unwrap();
}

async fn answer(handler: &mut MessageHandler, text: &str) {
    handler
        .handle_message(ClientMessage::SubmitAnswer {
            answer: text.to_string(),
        })
        .await
        .unwrap();
}

/// Run every pending step regardless of its delay
async fn settle(handler: &mut MessageHandler) {
    handler
        .poll_session(Instant::now() + Duration::from_secs(60))
        .await
        .unwrap();
}

/// Signs in, plays both words correctly and returns the drained messages
async fn complete_game(
    handler: &mut MessageHandler,
    receiver: &mut mpsc::UnboundedReceiver<ServerMessage>,
) -> Vec<ServerMessage> {
    sign_in(handler, "Alice").await;
    handler.handle_message(ClientMessage::StartGame).await.unwrap();

    answer(handler, "cat").await;
    settle(handler).await;
    answer(handler, "dog").await;
    settle(handler).await;

    drain(receiver)
}

#[tokio::test]
async fn test_start_requires_sign_in() {
    let setup = TestServerSetup::new().await;
    let (mut handler, mut receiver) = setup.create_handler().await;

    handler.handle_message(ClientMessage::StartGame).await.unwrap();

    assert_eq!(
        drain(&mut receiver),
        vec![ServerMessage::error(RequestError::AuthenticationRequired)]
    );
    assert!(handler.next_deadline().is_none());
}

#[tokio::test]
async fn test_start_plays_first_word() {
    let setup = TestServerSetup::new().await;
    let (mut handler, mut receiver) = setup.create_handler().await;

    sign_in(&mut handler, "Alice").await;
    handler.handle_message(ClientMessage::StartGame).await.unwrap();

    let messages = drain(&mut receiver);
    assert!(matches!(
        messages[0],
        ServerMessage::AuthenticationSuccess { .. }
    ));
    assert!(messages.contains(&ServerMessage::ClearInput));
    assert!(messages.contains(&ServerMessage::PlayWord {
        audio_ref: "cat.mp3".to_string()
    }));

    let state = last_session_update(&messages).unwrap();
    assert_eq!(state.phase, SessionPhase::AwaitingAnswer);
    assert_eq!(state.current_word_index, Some(0));
    assert_eq!(state.word_count, 2);
    assert!(state.is_playing);
}

#[tokio::test]
async fn test_replay_only_after_playback_ends() {
    let setup = TestServerSetup::new().await;
    let (mut handler, mut receiver) = setup.create_handler().await;

    sign_in(&mut handler, "Alice").await;
    handler.handle_message(ClientMessage::StartGame).await.unwrap();
    drain(&mut receiver);

    // Still playing, so the replay is ignored
    handler.handle_message(ClientMessage::ReplayWord).await.unwrap();
    assert!(drain(&mut receiver).is_empty());

    handler
        .handle_message(ClientMessage::PlaybackEnded)
        .await
        .unwrap();
    drain(&mut receiver);

    handler.handle_message(ClientMessage::ReplayWord).await.unwrap();
    let messages = drain(&mut receiver);
    assert!(messages.contains(&ServerMessage::PlayWord {
        audio_ref: "cat.mp3".to_string()
    }));
    assert!(last_session_update(&messages).unwrap().is_playing);
}

#[tokio::test]
async fn test_feedback_clears_after_deadline() {
    let setup = TestServerSetup::new().await;
    let (mut handler, mut receiver) = setup.create_handler().await;

    sign_in(&mut handler, "Alice").await;
    handler.handle_message(ClientMessage::StartGame).await.unwrap();
    drain(&mut receiver);

    answer(&mut handler, "kat").await;
    let state = last_session_update(&drain(&mut receiver)).unwrap();
    // Retry stays open for input while the message shows
    assert_eq!(state.phase, SessionPhase::AwaitingAnswer);
    assert_eq!(state.feedback.unwrap().kind, FeedbackKind::TryAgain);
    assert_eq!(state.attempts_remaining, 2);
    assert!(handler.next_deadline().is_some());

    // Not due yet
    handler.poll_session(Instant::now()).await.unwrap();
    assert!(drain(&mut receiver).is_empty());

    settle(&mut handler).await;
    let state = last_session_update(&drain(&mut receiver)).unwrap();
    assert_eq!(state.phase, SessionPhase::AwaitingAnswer);
    assert!(state.feedback.is_none());
    assert_eq!(state.current_word_index, Some(0));
}

#[tokio::test]
async fn test_completion_reports_final_score() {
    let setup = TestServerSetup::new().await;
    let (mut handler, mut receiver) = setup.create_handler().await;

    let messages = complete_game(&mut handler, &mut receiver).await;

    assert!(messages.contains(&ServerMessage::GameCompleted { final_score: 20 }));
    let state = last_session_update(&messages).unwrap();
    assert!(state.is_completed());
    assert!(state.can_submit_score());
    assert_eq!(state.current_word_index, None);
    assert!(handler.next_deadline().is_none());
}

#[tokio::test]
async fn test_submit_score_records_display_name() {
    let setup = TestServerSetup::new().await;
    let (mut handler, mut receiver) = setup.create_handler().await;
    complete_game(&mut handler, &mut receiver).await;

    handler.handle_message(ClientMessage::SubmitScore).await.unwrap();

    let messages = drain(&mut receiver);
    let entry = messages
        .iter()
        .find_map(|m| match m {
            ServerMessage::ScoreSubmitted { entry } => Some(entry.clone()),
            _ => None,
        })
        .expect("Expected ScoreSubmitted");
    assert_eq!(entry.username, "Alice");
    assert_eq!(entry.score, 20);
    assert_eq!(entry.submitted_at, test_now());

    let state = last_session_update(&messages).unwrap();
    assert_eq!(state.submission, SubmissionState::Submitted);
    assert_eq!(
        setup.leaderboard.service.view().leader(),
        Some(&entry)
    );
}

#[tokio::test]
async fn test_second_submission_is_ignored() {
    let setup = TestServerSetup::new().await;
    let (mut handler, mut receiver) = setup.create_handler().await;
    complete_game(&mut handler, &mut receiver).await;

    handler.handle_message(ClientMessage::SubmitScore).await.unwrap();
    drain(&mut receiver);

    handler.handle_message(ClientMessage::SubmitScore).await.unwrap();
    assert!(drain(&mut receiver).is_empty());
    assert_eq!(setup.leaderboard.service.refresh().await.len(), 1);
}

#[tokio::test]
async fn test_failed_submission_can_be_retried() {
    let setup = TestServerSetup::new().await;
    let (mut handler, mut receiver) = setup.create_handler().await;
    complete_game(&mut handler, &mut receiver).await;

    setup.leaderboard.store.fail_writes(true);
    handler.handle_message(ClientMessage::SubmitScore).await.unwrap();

    let messages = drain(&mut receiver);
    assert!(
        messages
            .iter()
            .any(|m| matches!(m, ServerMessage::ScoreSubmissionFailed { .. }))
    );
    let state = last_session_update(&messages).unwrap();
    assert_eq!(state.submission, SubmissionState::NotSubmitted);
    assert_eq!(state.final_score, Some(20));

    setup.leaderboard.store.fail_writes(false);
    handler.handle_message(ClientMessage::SubmitScore).await.unwrap();

    let state = last_session_update(&drain(&mut receiver)).unwrap();
    assert_eq!(state.submission, SubmissionState::Submitted);
    assert_eq!(setup.leaderboard.service.view().len(), 1);
}

#[tokio::test]
async fn test_submit_requires_completion() {
    let setup = TestServerSetup::new().await;
    let (mut handler, mut receiver) = setup.create_handler().await;

    sign_in(&mut handler, "Alice").await;
    handler.handle_message(ClientMessage::SubmitScore).await.unwrap();
    handler.handle_message(ClientMessage::StartGame).await.unwrap();
    drain(&mut receiver);

    handler.handle_message(ClientMessage::SubmitScore).await.unwrap();
    assert_eq!(
        drain(&mut receiver),
        vec![ServerMessage::error(RequestError::GameNotCompleted)]
    );
}

#[tokio::test]
async fn test_sign_out_abandons_session() {
    let setup = TestServerSetup::new().await;
    let (mut handler, mut receiver) = setup.create_handler().await;

    sign_in(&mut handler, "Alice").await;
    handler.handle_message(ClientMessage::StartGame).await.unwrap();
    drain(&mut receiver);

    handler.handle_message(ClientMessage::SignOut).await.unwrap();
    let messages = drain(&mut receiver);
    assert!(messages.contains(&ServerMessage::StopAudio));
    assert_eq!(messages.last(), Some(&ServerMessage::SignedOut));
    assert!(handler.next_deadline().is_none());

    answer(&mut handler, "cat").await;
    assert_eq!(
        drain(&mut receiver),
        vec![ServerMessage::error(RequestError::AuthenticationRequired)]
    );
}

#[tokio::test]
async fn test_switching_user_ends_session() {
    let setup = TestServerSetup::new().await;
    let (mut handler, mut receiver) = setup.create_handler().await;

    sign_in(&mut handler, "Alice").await;
    handler.handle_message(ClientMessage::StartGame).await.unwrap();
    drain(&mut receiver);

    sign_in(&mut handler, "Bob").await;
    drain(&mut receiver);

    answer(&mut handler, "cat").await;
    assert_eq!(
        drain(&mut receiver),
        vec![ServerMessage::error(RequestError::NoActiveSession)]
    );
}

#[tokio::test]
async fn test_restart_begins_fresh_game() {
    let setup = TestServerSetup::new().await;
    let (mut handler, mut receiver) = setup.create_handler().await;
    complete_game(&mut handler, &mut receiver).await;

    handler.handle_message(ClientMessage::StartGame).await.unwrap();
    let state = last_session_update(&drain(&mut receiver)).unwrap();
    assert_eq!(state.phase, SessionPhase::AwaitingAnswer);
    assert_eq!(state.score, 0);
    assert_eq!(state.final_score, None);
    assert_eq!(state.submission, SubmissionState::NotSubmitted);
}
