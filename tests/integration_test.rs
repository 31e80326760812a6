//! Integration tests for Tourguide
//!
//! These tests drive whole conversations through the public API:
//! - tourguide-llm: scripted provider, request context across turns
//! - tourguide-tools: mocked search backend, cards
//! - tourguide-core: orchestrator, gate, history, metrics

use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use tourguide_core::{
    GiveUpReason, Orchestrator, OrchestratorConfig, TurnEvent, TurnStatus,
};
use tourguide_llm::{InputItem, MockProvider, ModelResponse, ToolCall};
use tourguide_tools::{MockTourSearchBackend, SearchStatus};

const FULL_REQUEST: &str =
    "Хотим в Турцию из Москвы 10 марта на 7 ночей, двое взрослых, 5 звёзд всё включено";

fn orchestrator(provider: &MockProvider, backend: MockTourSearchBackend) -> Orchestrator {
    let config = OrchestratorConfig::default().with_waits(Duration::ZERO, Duration::ZERO);
    Orchestrator::new(Arc::new(provider.clone()), Arc::new(backend), config)
        .with_today(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap())
}

fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall::new(id, name, args.to_string())
}

fn search_backend() -> MockTourSearchBackend {
    let mut backend = MockTourSearchBackend::new();
    backend
        .expect_search_tours()
        .times(1)
        .returning(|_| Ok(Some("4242".to_string())));
    backend.expect_search_status().returning(|_| {
        Ok(SearchStatus {
            state: "finished".to_string(),
            hotels_found: 2,
            tours_found: 14,
            progress: 100,
            ..SearchStatus::default()
        })
    });
    backend.expect_search_results().returning(|_| {
        Ok(json!({
            "status": {"hotelsfound": "2", "toursfound": "14"},
            "result": {"hotel": [
                {"hotelcode": "101", "hotelname": "Sea Breeze", "hotelstars": 5, "price": 90000,
                 "tours": {"tour": [{"price": 85000, "nights": 7, "flydate": "10.03.2026", "meal": "AI"}]}},
                {"hotelcode": "102", "hotelname": "Palm Garden", "hotelstars": 5, "price": 70000}
            ]}
        }))
    });
    backend
}

fn script_search(provider: &MockProvider) {
    provider.push_response(ModelResponse::tool_calls(
        "resp_1",
        vec![
            call("call_date", "get_current_date", json!({})),
            call(
                "call_search",
                "search_tours",
                json!({
                    "departure": 1, "country": 4,
                    "datefrom": "10.03.2026", "dateto": "12.03.2026",
                    "nightsfrom": 7, "nightsto": 7,
                    "adults": 2, "stars": 5, "meal": 7
                }),
            ),
        ],
    ));
    provider.push_response(ModelResponse::tool_calls(
        "resp_2",
        vec![call("call_status", "get_search_status", json!({"requestid": "4242"}))],
    ));
    provider.push_response(ModelResponse::tool_calls(
        "resp_3",
        vec![call("call_results", "get_search_results", json!({"requestid": "4242"}))],
    ));
    provider.push_response(ModelResponse::text(
        "resp_4",
        "Нашёл два отеля 5* на первой линии. Какой вам ближе?",
    ));
}

// ============================================================================
// Full search conversation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_search_conversation_produces_cards() {
    let provider = MockProvider::new();
    script_search(&provider);
    let mut orchestrator = orchestrator(&provider, search_backend());

    let reply = orchestrator.send_message(FULL_REQUEST).await;
    assert_eq!(reply.status, TurnStatus::Completed);
    assert_eq!(reply.iterations, 4);

    let cards = orchestrator.take_pending_cards();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].hotel_name, "Sea Breeze");
    assert_eq!(cards[0].departure_city, "Москва");

    let metrics = orchestrator.metrics();
    assert_eq!(metrics.total_searches, 1);
    assert_eq!(metrics.cascade_incomplete_detections, 0);
    assert_eq!(metrics.total_messages, 1);

    // Every tool round continues from the previous response
    let requests = provider.requests();
    assert_eq!(requests[0].previous_response_id, None);
    for (i, request) in requests.iter().enumerate().skip(1) {
        assert_eq!(
            request.previous_response_id.as_deref(),
            Some(format!("resp_{i}").as_str())
        );
    }
    match &requests[1].input[1] {
        InputItem::FunctionCallOutput { call_id, output } => {
            assert_eq!(call_id, "call_search");
            assert!(output.contains("4242"));
        }
        other => panic!("unexpected input {other:?}"),
    }

    // user, three tool summaries, answer
    assert_eq!(orchestrator.history().log().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_follow_up_turn_after_search() {
    let provider = MockProvider::new();
    script_search(&provider);
    provider.push_response(ModelResponse::text("resp_5", "Отлично, Sea Breeze за 85000 ₽."));
    let mut orchestrator = orchestrator(&provider, search_backend());

    orchestrator.send_message(FULL_REQUEST).await;
    let reply = orchestrator.send_message("Первый").await;
    assert!(reply.is_completed());
    assert!(orchestrator.take_pending_cards().is_empty());

    let request = provider.requests().pop().unwrap();
    assert_eq!(request.previous_response_id.as_deref(), Some("resp_4"));
    assert_eq!(request.input, vec![InputItem::user("Первый")]);
    assert_eq!(orchestrator.metrics().total_messages, 2);
}

// ============================================================================
// Gate across turns
// ============================================================================

#[tokio::test]
async fn test_gate_asks_then_allows_search() {
    let provider = MockProvider::new();
    // Turn 1: search attempted with only a destination
    provider.push_response(ModelResponse::tool_calls(
        "resp_1",
        vec![call("call_1", "search_tours", json!({"country": 4}))],
    ));
    provider.push_response(ModelResponse::text("resp_2", "Из какого города планируете вылет?"));
    let mut backend = MockTourSearchBackend::new();
    backend
        .expect_search_tours()
        .times(1)
        .returning(|_| Ok(Some("77".to_string())));
    // Turn 2: the customer gives the rest
    provider.push_response(ModelResponse::tool_calls(
        "resp_3",
        vec![call(
            "call_2",
            "search_tours",
            json!({"departure": 1, "country": 4, "datefrom": "10.03.2026", "dateto": "12.03.2026", "adults": 2}),
        )],
    ));
    provider.push_response(ModelResponse::text("resp_4", "Ищу."));
    let mut orchestrator = orchestrator(&provider, backend);

    orchestrator.send_message("Хотим в Турцию").await;
    assert_eq!(orchestrator.metrics().cascade_incomplete_detections, 1);
    assert_eq!(orchestrator.metrics().total_searches, 0);

    orchestrator
        .send_message("Из Москвы, 10 марта на неделю, двое взрослых, отель любой")
        .await;
    assert_eq!(orchestrator.metrics().cascade_incomplete_detections, 1);
    assert_eq!(orchestrator.metrics().total_searches, 1);
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_forbidden_conversation_recovers_with_replay() {
    let provider = MockProvider::new();
    provider.push_response(ModelResponse::text("resp_1", "Здравствуйте! Куда хотите поехать?"));
    provider.push_error(tourguide_llm::Error::Forbidden("moderation".to_string()));
    provider.push_response(ModelResponse::text("resp_2", "Из какого города вылет?"));
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    orchestrator.send_message("Привет").await;
    let reply = orchestrator.send_message("В Египет").await;
    assert!(reply.is_completed());

    // The next turn is compact again
    provider.push_response(ModelResponse::text("resp_3", "Понял."));
    orchestrator.send_message("Из Казани").await;
    let last = provider.requests().pop().unwrap();
    assert_eq!(last.previous_response_id.as_deref(), Some("resp_2"));
}

#[test]
fn test_rate_limit_reply_is_not_remembered() {
    let provider = MockProvider::new();
    provider.push_error(tourguide_llm::Error::RateLimit);
    let mut orchestrator = orchestrator(&provider, MockTourSearchBackend::new());

    let reply = tokio_test::block_on(orchestrator.send_message("Привет"));
    assert_eq!(reply.status, TurnStatus::GaveUp(GiveUpReason::RateLimited));
    assert_eq!(orchestrator.history().log().len(), 1);
}

// ============================================================================
// Streaming
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_streaming_search_conversation() {
    let provider = MockProvider::new();
    script_search(&provider);
    let mut orchestrator = orchestrator(&provider, search_backend());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let reply = orchestrator.send_message_streaming(FULL_REQUEST, &tx).await;
    assert!(reply.is_completed());
    assert_eq!(orchestrator.take_pending_cards().len(), 2);

    let mut text = String::new();
    let mut finished = None;
    while let Ok(event) = rx.try_recv() {
        match event {
            TurnEvent::Delta(delta) => text.push_str(&delta),
            TurnEvent::Discard => text.clear(),
            TurnEvent::Finished(reply) => finished = Some(reply),
        }
    }
    assert_eq!(text, reply.text);
    assert_eq!(finished, Some(reply));
}
