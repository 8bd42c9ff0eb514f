//! End-to-end turns through a live HTTP stub.
//!
//! These tests run the full stack — controller, reqwest client, frame
//! decoder, interpreter — against wiremock-served stream bodies.

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tokio_util::sync::CancellationToken;
use triva_client::ChatClientConfig;
use triva_core::constants::{EMPTY_TURN_PLACEHOLDER, TRANSPORT_FAILURE_TEXT};
use triva_session::{SessionConfig, SessionController, SessionError, SessionPhase, TurnOutcome};
use triva_stream::FrameDecoderOptions;

fn config_for(server: &MockServer) -> SessionConfig {
    SessionConfig {
        chat: ChatClientConfig {
            base_url: server.uri(),
            request_timeout: None,
        },
        ..SessionConfig::default()
    }
}

fn delta_frame(text: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"delta": {"content": text}}]})
    )
}

async fn mount_stream_body(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_turn_streams_deltas_and_metadata() {
    let server = MockServer::start().await;
    let body = format!(
        "{}{}data: {{\"type\":\"final_metadata\",\"accumulated_symptoms\":[\"cough\",\"fever\"]}}\n\ndata: [DONE]\n\n",
        delta_frame("Hel"),
        delta_frame("lo")
    );
    mount_stream_body(&server, body).await;

    let mut session = SessionController::new(config_for(&server)).unwrap();
    let report = session.send("I have a cough and a fever", None).await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::Completed);
    assert!(report.saw_terminator);
    assert!(!report.frozen);
    assert!(report.ttfb_ms.is_some());

    let messages = session.snapshot();
    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[1].content.as_text(),
        Some("Hello"),
        "deltas concatenate across frames"
    );
    assert_eq!(messages[1].response_time_ms, Some(report.response_time_ms));
    assert_eq!(messages[1].ttfb_ms, report.ttfb_ms);
    assert_eq!(
        session.symptoms(),
        ["cough".to_owned(), "fever".to_owned()],
        "metadata replaced the accumulator wholesale"
    );
    assert_eq!(session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn structured_result_completes_the_conversation() {
    let server = MockServer::start().await;
    let report_json = "{\"symptoms\":[\"chest pain\"],\"icd10\":[]}";
    let body = format!("{}data: [DONE]\n\n", delta_frame(report_json));
    mount_stream_body(&server, body).await;

    let mut session = SessionController::new(config_for(&server)).unwrap();
    let report = session.send("chest pain since yesterday", None).await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::Completed);
    assert!(report.frozen);

    let messages = session.snapshot();
    let frozen = messages[1].content.as_report().expect("frozen content");
    assert_eq!(frozen.symptoms, vec!["chest pain".to_owned()]);
    assert!(session.gate().completed());

    // Completion conflict: rejected pre-flight, before any network call.
    let err = session.send("one more thing", None).await.unwrap_err();
    assert!(matches!(err, SessionError::ConversationComplete));
    assert_eq!(session.snapshot().len(), 2, "rejected send appended nothing");
}

#[tokio::test]
async fn transport_failure_fills_the_error_slot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&server)
        .await;

    let mut session = SessionController::new(config_for(&server)).unwrap();
    let report = session.send("hello?", None).await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::Errored);
    let messages = session.snapshot();
    assert_eq!(messages[1].content.as_text(), Some(TRANSPORT_FAILURE_TEXT));
    assert_eq!(
        messages[1].response_time_ms,
        Some(report.response_time_ms),
        "duration-to-failure is still recorded"
    );

    // A transport failure is not sticky; the next turn may proceed.
    assert!(session.gate().allows_send());
    assert_eq!(session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn empty_stream_yields_explicit_placeholder() {
    let server = MockServer::start().await;
    mount_stream_body(&server, String::new()).await;

    let mut session = SessionController::new(config_for(&server)).unwrap();
    let report = session.send("anyone there?", None).await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::Completed);
    let messages = session.snapshot();
    assert_eq!(messages[1].content.as_text(), Some(EMPTY_TURN_PLACEHOLDER));
}

#[tokio::test]
async fn window_truncates_and_gate_latches_sticky() {
    let server = MockServer::start().await;
    mount_stream_body(
        &server,
        format!("{}data: [DONE]\n\n", delta_frame("noted")),
    )
    .await;

    let mut session = SessionController::new(config_for(&server)).unwrap();

    let mut accepted = 0;
    let mut rejected = 0;
    for i in 0..21 {
        match session.send(&format!("turn {i}"), None).await {
            Ok(_) => accepted += 1,
            Err(SessionError::LimitReached) => rejected += 1,
            Err(other) => panic!("unexpected rejection: {other}"),
        }
    }

    // Ten turns fill the 20-slot window; the eleventh evicts and latches the
    // gate; everything after is rejected pre-flight.
    assert_eq!(accepted, 11);
    assert_eq!(rejected, 10);
    assert_eq!(session.snapshot().len(), 20);
    assert!(session.gate().limit_reached());
    assert!(!session.gate().completed());

    let err = session.send("turn 22", None).await.unwrap_err();
    assert!(matches!(err, SessionError::LimitReached));
}

#[tokio::test]
async fn pre_cancelled_turn_aborts_cleanly() {
    let server = MockServer::start().await;
    mount_stream_body(
        &server,
        format!("{}data: [DONE]\n\n", delta_frame("never seen")),
    )
    .await;

    let mut session = SessionController::new(config_for(&server)).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = session
        .send_with_cancel("cancel me", None, &cancel)
        .await
        .unwrap();

    assert_eq!(report.outcome, TurnOutcome::Aborted);
    // Nothing streamed before the abort, so the slot gets the placeholder
    // rather than persisting empty.
    let messages = session.snapshot();
    assert_eq!(messages[1].content.as_text(), Some(EMPTY_TURN_PLACEHOLDER));
    assert_eq!(session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn trailing_frame_discarded_unless_flush_configured() {
    // The final frame never gets its blank-line terminator.
    let trailer = "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}";

    let server = MockServer::start().await;
    mount_stream_body(&server, trailer.to_owned()).await;

    let mut lossy = SessionController::new(config_for(&server)).unwrap();
    let _ = lossy.send("hi", None).await.unwrap();
    assert_eq!(
        lossy.snapshot()[1].content.as_text(),
        Some(EMPTY_TURN_PLACEHOLDER),
        "default discards the unterminated trailing frame"
    );

    let mut flushing = SessionController::new(SessionConfig {
        decoder: FrameDecoderOptions {
            flush_on_close: true,
        },
        ..config_for(&server)
    })
    .unwrap();
    let _ = flushing.send("hi", None).await.unwrap();
    assert_eq!(flushing.snapshot()[1].content.as_text(), Some("Hello"));
}

#[tokio::test]
async fn accumulator_travels_with_the_next_request() {
    let server = MockServer::start().await;

    // Specific mock first: wiremock picks the first match in mount order.
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_partial_json(serde_json::json!({
            "accumulated_symptoms": ["cough"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("data: [DONE]\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    mount_stream_body(
        &server,
        "data: {\"type\":\"final_metadata\",\"accumulated_symptoms\":[\"cough\"]}\n\ndata: [DONE]\n\n"
            .to_owned(),
    )
    .await;

    let mut session = SessionController::new(config_for(&server)).unwrap();

    // Turn one: no symptoms yet, generic mock answers with metadata.
    let _ = session.send("I keep coughing", None).await.unwrap();
    assert_eq!(session.symptoms(), ["cough".to_owned()]);

    // Turn two: the accumulator goes back up verbatim.
    let _ = session.send("it got worse", None).await.unwrap();
}

#[tokio::test]
async fn transcription_time_rides_on_the_user_message() {
    let server = MockServer::start().await;
    mount_stream_body(&server, "data: [DONE]\n\n".to_owned()).await;

    let mut session = SessionController::new(config_for(&server)).unwrap();
    let report = session.send("spoken input", Some(734)).await.unwrap();

    let messages = session.snapshot();
    let user = messages
        .iter()
        .find(|m| m.id == report.user_id)
        .expect("user message present");
    assert_eq!(user.transcription_time_ms, Some(734));
}
