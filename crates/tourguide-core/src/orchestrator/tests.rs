//! Orchestrator tests

use super::*;
use crate::config::OrchestratorConfig;
use crate::error::{FORBIDDEN_MESSAGE, RATE_LIMITED_MESSAGE};
use crate::history::{is_tool_summary, ContextMode};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tourguide_llm::{
    Error as LlmError, InputItem, MockProvider, ModelResponse, OutputItem, StreamEvent, ToolCall,
};
use tourguide_tools::MockTourSearchBackend;

fn config() -> OrchestratorConfig {
    OrchestratorConfig::default().with_waits(Duration::ZERO, Duration::ZERO)
}

fn orchestrator(provider: &MockProvider, backend: MockTourSearchBackend) -> Orchestrator {
    Orchestrator::new(Arc::new(provider.clone()), Arc::new(backend), config())
        .with_today(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap())
        .with_instructions("Ты турагент.")
}

fn tool_call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall::new(id, name, args.to_string())
}

fn last_input(provider: &MockProvider, index: usize) -> InputItem {
    provider.requests()[index].input.last().cloned().unwrap()
}

// ── Plain text ────────────────────────────────────────────────────

#[tokio::test]
async fn test_plain_answer_is_committed() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text("resp_1", "Здравствуйте! Куда хотите поехать?"));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Привет").await;
    assert!(reply.is_completed());
    assert_eq!(reply.text, "Здравствуйте! Куда хотите поехать?");
    assert_eq!(reply.iterations, 1);

    let request = &provider.requests()[0];
    assert_eq!(request.previous_response_id, None);
    assert_eq!(request.input, vec![InputItem::user("Привет")]);
    assert_eq!(request.instructions.as_deref(), Some("Ты турагент."));
    assert_eq!(orchestrator.history().log().len(), 2);
    assert_eq!(orchestrator.metrics().total_messages, 1);
}

#[tokio::test]
async fn test_next_turn_continues_from_pointer() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text("resp_1", "Здравствуйте!"));
    provider.push_response(ModelResponse::text("resp_2", "Из какого города вылет?"));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    orchestrator.send_message("Привет").await;
    orchestrator.send_message("Хотим в Турцию").await;

    let request = &provider.requests()[1];
    assert_eq!(request.previous_response_id.as_deref(), Some("resp_1"));
    assert_eq!(request.input, vec![InputItem::user("Хотим в Турцию")]);
}

#[tokio::test]
async fn test_duplicated_answer_is_cleaned() {
    let first = "Вот лучшие варианты отдыха в Турции для вас:";
    let body = "1. Отель у моря с хорошим пляжем и анимацией для детей.";
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text(
        "resp_1",
        format!("{first}\n{body}\u{fffd}\n{first}\n{body}"),
    ));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Покажи варианты").await;
    assert_eq!(reply.text, format!("{first}\n{body}"));
    assert_eq!(orchestrator.history().log()[1].content, reply.text);
}

// ── Empty output ──────────────────────────────────────────────────

#[tokio::test]
async fn test_three_empty_responses_give_up() {
    let provider = MockProvider::new();
    for i in 0..3 {
        provider.push_response(ModelResponse::empty(format!("resp_{i}")));
    }
    provider.push_response(ModelResponse::text("resp_x", "не должно быть вызвано"));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Привет").await;
    assert_eq!(reply.status, TurnStatus::GaveUp(GiveUpReason::EmptyOutput));
    assert_eq!(reply.text, EMPTY_GIVE_UP_MESSAGE);
    assert_eq!(provider.call_count(), 3);
    assert_eq!(provider.remaining(), 1);

    // Retries replay the log with the continue nudge; give-ups are not committed
    let retry = &provider.requests()[1];
    assert_eq!(retry.previous_response_id, None);
    assert_eq!(last_input(&provider, 1), InputItem::user(CONTINUE_NUDGE));
    assert_eq!(orchestrator.history().log().len(), 1);
}

#[tokio::test]
async fn test_empty_response_does_not_replace_pointer() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text("resp_1", "Здравствуйте!"));
    provider.push_response(ModelResponse::empty("resp_empty"));
    provider.push_response(ModelResponse::text("resp_2", "Из какого города вылет?"));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    orchestrator.send_message("Привет").await;
    let reply = orchestrator.send_message("Хотим в Турцию").await;
    assert!(reply.is_completed());
    assert_eq!(orchestrator.history().previous_response_id(), Some("resp_2"));
    assert!(provider
        .requests()
        .iter()
        .all(|r| r.previous_response_id.as_deref() != Some("resp_empty")));
}

// ── Self-censorship ───────────────────────────────────────────────

#[tokio::test]
async fn test_self_censorship_retries_then_recovers() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text("resp_1", "Я не могу обсуждать эту тему."));
    provider.push_response(ModelResponse::text("resp_2", "Конечно! Из какого города вылет?"));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Хотим в Египет").await;
    assert!(reply.is_completed());
    assert_eq!(reply.iterations, 2);
    assert_eq!(provider.requests()[1].previous_response_id, None);
    assert_eq!(last_input(&provider, 1), InputItem::user(CENSORSHIP_NUDGE));
}

#[tokio::test]
async fn test_self_censorship_gives_up_at_limit() {
    let provider = MockProvider::new();
    for i in 0..3 {
        provider.push_response(ModelResponse::text(format!("resp_{i}"), "Не могу помочь с этим."));
    }
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Хотим в Египет").await;
    assert_eq!(reply.status, TurnStatus::GaveUp(GiveUpReason::SelfCensorship));
    assert_eq!(reply.text, CENSORSHIP_GIVE_UP_MESSAGE);
    assert_eq!(provider.call_count(), 3);
}

// ── Promised action ───────────────────────────────────────────────

#[tokio::test]
async fn test_promised_action_nudged_once_then_returned() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text("resp_1", "Отлично, сейчас поищу варианты!"));
    provider.push_response(ModelResponse::text("resp_2", "Один момент, подбираю туры."));
    provider.push_response(ModelResponse::text("resp_3", "не должно быть вызвано"));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Ищи").await;
    assert!(reply.is_completed());
    assert_eq!(reply.text, "Один момент, подбираю туры.");
    assert_eq!(provider.call_count(), 2);
    assert_eq!(orchestrator.metrics().promised_search_detections, 2);

    let nudge = &provider.requests()[1];
    assert_eq!(nudge.previous_response_id.as_deref(), Some("resp_1"));
    assert_eq!(
        nudge.input,
        vec![InputItem::function_output(PROMISE_NUDGE_CALL_ID, PROMISE_NUDGE_OUTPUT)]
    );
}

#[tokio::test]
async fn test_promised_action_beside_tool_call_runs_the_tool() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::from_items(
        "resp_1",
        vec![
            OutputItem::Message {
                text: "Сейчас поищу!".to_string(),
            },
            OutputItem::FunctionCall(tool_call("call_1", "get_current_date", json!({}))),
        ],
    ));
    provider.push_response(ModelResponse::text("resp_2", "Сегодня 10 января."));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Какое сегодня число?").await;
    assert_eq!(reply.text, "Сегодня 10 января.");
    assert_eq!(orchestrator.metrics().promised_search_detections, 0);
    match last_input(&provider, 1) {
        InputItem::FunctionCallOutput { call_id, output } => {
            assert_eq!(call_id, "call_1");
            assert!(output.contains("10.01.2026"));
        }
        other => panic!("unexpected input {other:?}"),
    }
}

// ── Tool phase ────────────────────────────────────────────────────

#[tokio::test]
async fn test_tool_results_continue_compactly_and_are_summarized() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::tool_calls(
        "resp_1",
        vec![tool_call("call_1", "get_current_date", json!({}))],
    ));
    provider.push_response(ModelResponse::text("resp_2", "Сегодня суббота."));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Какой сегодня день?").await;
    assert_eq!(reply.text, "Сегодня суббота.");
    assert_eq!(reply.iterations, 2);

    let follow_up = &provider.requests()[1];
    assert_eq!(follow_up.previous_response_id.as_deref(), Some("resp_1"));
    assert_eq!(follow_up.input.len(), 1);

    let log = orchestrator.history().log();
    assert_eq!(log.len(), 3);
    assert!(is_tool_summary(&log[1]));
    assert!(log[1].content.contains("[get_current_date]: "));
}

#[tokio::test]
async fn test_search_blocked_until_slots_are_given() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::tool_calls(
        "resp_1",
        vec![tool_call("call_1", "search_tours", json!({"country": 4}))],
    ));
    provider.push_response(ModelResponse::text("resp_2", "Из какого города планируете вылет?"));
    // Backend has no expectations: any call would panic
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Хотим в Турцию").await;
    assert!(reply.is_completed());
    let metrics = orchestrator.metrics();
    assert_eq!(metrics.cascade_incomplete_detections, 1);
    assert_eq!(metrics.total_searches, 0);
    match last_input(&provider, 1) {
        InputItem::FunctionCallOutput { output, .. } => assert!(output.contains("город вылета")),
        other => panic!("unexpected input {other:?}"),
    }
}

#[tokio::test]
async fn test_pending_cards_reset_each_turn() {
    let mut backend = MockTourSearchBackend::new();
    backend.expect_search_results().returning(|_| {
        Ok(json!({"result": {"hotel": [{"hotelcode": "1", "hotelname": "Sea", "price": 50000}]}}))
    });
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::tool_calls(
        "resp_1",
        vec![tool_call("call_1", "get_search_results", json!({"requestid": "42"}))],
    ));
    provider.push_response(ModelResponse::text("resp_2", "Нашёл отличный вариант."));
    provider.push_response(ModelResponse::text("resp_3", "Пожалуйста!"));
    let mut orchestrator = orchestrator(&provider, backend);

    orchestrator.send_message("Покажи результаты").await;
    orchestrator.send_message("Спасибо").await;
    assert!(orchestrator.take_pending_cards().is_empty());
}

#[tokio::test]
async fn test_cards_are_taken_once() {
    let mut backend = MockTourSearchBackend::new();
    backend.expect_search_results().returning(|_| {
        Ok(json!({"result": {"hotel": [{"hotelcode": "1", "hotelname": "Sea", "price": 50000}]}}))
    });
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::tool_calls(
        "resp_1",
        vec![tool_call("call_1", "get_search_results", json!({"requestid": "42"}))],
    ));
    provider.push_response(ModelResponse::text("resp_2", "Нашёл отличный вариант."));
    let mut orchestrator = orchestrator(&provider, backend);

    orchestrator.send_message("Покажи результаты").await;
    let cards = orchestrator.take_pending_cards();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].hotel_name, "Sea");
    assert!(orchestrator.take_pending_cards().is_empty());
}

#[tokio::test]
async fn test_iteration_cap() {
    let provider = MockProvider::new();
    for i in 0..5 {
        provider.push_response(ModelResponse::tool_calls(
            format!("resp_{i}"),
            vec![tool_call(&format!("call_{i}"), "get_current_date", json!({}))],
        ));
    }
    let mut orchestrator = Orchestrator::new(
        Arc::new(provider.clone()),
        Arc::new(MockTourSearchBackend::new()),
        config().with_max_iterations(3),
    );

    let reply = orchestrator.send_message("Какое число?").await;
    assert_eq!(reply.status, TurnStatus::GaveUp(GiveUpReason::IterationLimit));
    assert_eq!(reply.text, ITERATION_LIMIT_MESSAGE);
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_web_search_only_response_is_continued() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::from_items(
        "resp_1",
        vec![OutputItem::WebSearchCall {
            id: "ws_1".to_string(),
        }],
    ));
    provider.push_response(ModelResponse::text("resp_2", "В марте в Египте +25."));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Какая погода в Египте в марте?").await;
    assert_eq!(reply.text, "В марте в Египте +25.");
    let follow_up = &provider.requests()[1];
    assert_eq!(follow_up.previous_response_id.as_deref(), Some("resp_1"));
    assert_eq!(follow_up.input, vec![InputItem::user(CONTINUE_NUDGE)]);
}

// ── Provider errors ───────────────────────────────────────────────

#[tokio::test]
async fn test_rate_limit_is_terminal() {
    let provider = MockProvider::new();
    provider.push_error(LlmError::RateLimit);
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Привет").await;
    assert_eq!(reply.status, TurnStatus::GaveUp(GiveUpReason::RateLimited));
    assert_eq!(reply.text, RATE_LIMITED_MESSAGE);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_forbidden_replays_with_nudge() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text("resp_1", "Здравствуйте!"));
    provider.push_error(LlmError::Forbidden("moderation".to_string()));
    provider.push_response(ModelResponse::text("resp_2", "Из какого города вылет?"));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    orchestrator.send_message("Привет").await;
    let reply = orchestrator.send_message("Хотим в Турцию").await;
    assert!(reply.is_completed());

    let replay = &provider.requests()[2];
    assert_eq!(replay.previous_response_id, None);
    assert_eq!(replay.input.len(), 4);
    assert_eq!(last_input(&provider, 2), InputItem::user(FORBIDDEN_NUDGE));
}

#[tokio::test]
async fn test_forbidden_gives_up_after_two_retries() {
    let provider = MockProvider::new();
    for _ in 0..3 {
        provider.push_error(LlmError::Forbidden("moderation".to_string()));
    }
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Привет").await;
    assert_eq!(reply.status, TurnStatus::GaveUp(GiveUpReason::Forbidden));
    assert_eq!(reply.text, FORBIDDEN_MESSAGE);
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_failed_pointer_switches_to_replay() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text("resp_1", "Здравствуйте!"));
    provider.push_error(LlmError::PreviousResponseFailed("status failed".to_string()));
    provider.push_response(ModelResponse::text("resp_2", "Понял."));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    orchestrator.send_message("Привет").await;
    orchestrator.send_message("Хотим в Турцию").await;
    let requests = provider.requests();
    assert_eq!(requests[1].previous_response_id.as_deref(), Some("resp_1"));
    assert_eq!(requests[2].previous_response_id, None);
    assert_eq!(requests[2].input.len(), 3);
}

#[tokio::test]
async fn test_in_progress_waits_and_retries() {
    let provider = MockProvider::new();
    provider.push_error(LlmError::InProgress("in_progress".to_string()));
    provider.push_response(ModelResponse::text("resp_1", "Готово."));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Привет").await;
    assert!(reply.is_completed());
    assert_eq!(reply.iterations, 2);
    assert_eq!(provider.requests()[0], provider.requests()[1]);
}

#[tokio::test]
async fn test_unknown_provider_error_is_terminal() {
    let provider = MockProvider::new();
    provider.push_error(LlmError::Network("connection reset".to_string()));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = orchestrator.send_message("Привет").await;
    assert_eq!(reply.status, TurnStatus::GaveUp(GiveUpReason::ProviderError));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_provider_error_drops_pointer_for_next_turn() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text("resp_1", "Здравствуйте! Куда летим?"));
    provider.push_error(LlmError::Api {
        status: 400,
        message: "previous_response_id resp_1 not found".to_string(),
    });
    provider.push_response(ModelResponse::text("resp_2", "Из какого города вылет?"));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    orchestrator.send_message("Привет").await;
    let reply = orchestrator.send_message("В Египет").await;
    assert_eq!(reply.status, TurnStatus::GaveUp(GiveUpReason::ProviderError));
    assert!(matches!(
        orchestrator.history().mode(),
        ContextMode::Replay { nudge: None }
    ));

    let reply = orchestrator.send_message("Из Казани").await;
    assert!(reply.is_completed());
    let request = provider.requests().pop().unwrap();
    assert_eq!(request.previous_response_id, None);
    assert_eq!(request.input.len(), 4);
    assert_eq!(request.input.last(), Some(&InputItem::user("Из Казани")));
}

// ── Streaming ─────────────────────────────────────────────────────

fn drain(rx: &mut mpsc::UnboundedReceiver<TurnEvent>) -> Vec<TurnEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_streaming_emits_deltas_and_finish() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text("resp_1", "Здравствуйте! Куда летим?"));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let reply = orchestrator.send_message_streaming("Привет", &tx).await;
    let events = drain(&mut rx);
    let streamed: String = events
        .iter()
        .filter_map(|e| match e {
            TurnEvent::Delta(d) => Some(d.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(streamed, "Здравствуйте! Куда летим?");
    assert!(!events.contains(&TurnEvent::Discard));
    assert_eq!(events.last(), Some(&TurnEvent::Finished(reply.clone())));
    assert_eq!(orchestrator.history().previous_response_id(), Some("resp_1"));
}

#[tokio::test]
async fn test_streaming_discards_promised_action() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text("resp_1", "Сейчас поищу варианты"));
    provider.push_response(ModelResponse::text("resp_2", "Вот что нашлось."));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let reply = orchestrator.send_message_streaming("Ищи", &tx).await;
    assert_eq!(reply.text, "Вот что нашлось.");
    let events = drain(&mut rx);
    let discard = events.iter().position(|e| e == &TurnEvent::Discard).unwrap();
    let after: String = events[discard..]
        .iter()
        .filter_map(|e| match e {
            TurnEvent::Delta(d) => Some(d.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(after, "Вот что нашлось.");
    assert_eq!(orchestrator.metrics().promised_search_detections, 1);
}

#[tokio::test]
async fn test_streaming_failure_event_is_classified() {
    let provider = MockProvider::new();
    provider.push_events(vec![
        StreamEvent::Created {
            response_id: "resp_1".to_string(),
        },
        StreamEvent::Failed {
            message: "429 Too Many Requests".to_string(),
        },
    ]);
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let reply = orchestrator.send_message_streaming("Привет", &tx).await;
    assert_eq!(reply.status, TurnStatus::GaveUp(GiveUpReason::RateLimited));
    let events = drain(&mut rx);
    assert_eq!(events[0], TurnEvent::Delta(RATE_LIMITED_MESSAGE.to_string()));
}

#[tokio::test]
async fn test_streaming_empty_responses_give_up() {
    let provider = MockProvider::new();
    for i in 0..3 {
        provider.push_events(vec![
            StreamEvent::Created {
                response_id: format!("resp_{i}"),
            },
            StreamEvent::Completed {
                response_id: format!("resp_{i}"),
            },
        ]);
    }
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());
    let (tx, _rx) = mpsc::unbounded_channel();

    let reply = orchestrator.send_message_streaming("Привет", &tx).await;
    assert_eq!(reply.status, TurnStatus::GaveUp(GiveUpReason::EmptyOutput));
    assert_eq!(provider.call_count(), 3);
    assert!(matches!(
        orchestrator.history().mode(),
        ContextMode::Replay { .. }
    ));
}

#[tokio::test]
async fn test_reset_clears_conversation() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text("resp_1", "Здравствуйте!"));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());
    orchestrator.send_message("Привет").await;

    orchestrator.reset();
    assert!(orchestrator.history().log().is_empty());
    assert_eq!(orchestrator.history().previous_response_id(), None);
    assert_eq!(orchestrator.metrics().total_messages, 1);
}
