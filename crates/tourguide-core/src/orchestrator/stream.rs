//! Streaming turn loop
//!
//! Events are accumulated into a `ModelResponse` and then go through the same
//! branches as the blocking loop. Text already shown to the customer is
//! retracted with a `Discard` event when the branch rejects it.

use super::core::Orchestrator;
use super::turn::{RetryBudget, Step, ITERATION_LIMIT_MESSAGE};
use super::types::{GiveUpReason, TurnEvent, TurnReply};
use futures::StreamExt;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tourguide_llm::{Error as LlmError, ModelResponse, OutputItem, ResponseStream, StreamEvent};
use tracing::{debug, info, instrument};

/// Events of one streamed response, collected
#[derive(Debug, Default)]
struct StreamedResponse {
    response_id: String,
    deltas: String,
    items: Vec<OutputItem>,
}

impl StreamedResponse {
    /// Streamed deltas win over message items; deltas without a finished
    /// message item still count as output.
    fn into_response(mut self) -> ModelResponse {
        let has_message = self
            .items
            .iter()
            .any(|item| matches!(item, OutputItem::Message { .. }));
        if !self.deltas.is_empty() && !has_message {
            self.items.push(OutputItem::Message {
                text: self.deltas.clone(),
            });
        }
        let mut response = ModelResponse::from_items(self.response_id, self.items);
        if !self.deltas.is_empty() {
            response.output_text = self.deltas;
        }
        response
    }
}

fn emit(events: &UnboundedSender<TurnEvent>, event: TurnEvent) {
    if events.send(event).is_err() {
        debug!("Turn event receiver dropped");
    }
}

async fn collect_stream(
    mut stream: ResponseStream,
    events: &UnboundedSender<TurnEvent>,
    shown: &mut String,
) -> Result<ModelResponse, LlmError> {
    let mut collected = StreamedResponse::default();
    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::Created { response_id } => collected.response_id = response_id,
            StreamEvent::TextDelta(delta) => {
                shown.push_str(&delta);
                collected.deltas.push_str(&delta);
                emit(events, TurnEvent::Delta(delta));
            }
            StreamEvent::ItemDone(item) => collected.items.push(item),
            StreamEvent::Completed { response_id } => {
                if !response_id.is_empty() {
                    collected.response_id = response_id;
                }
            }
            StreamEvent::Failed { message } => {
                return Err(LlmError::from_stream_failure(&message));
            }
        }
    }
    Ok(collected.into_response())
}

/// Bring the shown text in line with the reply, then close the turn
fn finish(events: &UnboundedSender<TurnEvent>, shown: &str, reply: TurnReply) -> TurnReply {
    if shown != reply.text {
        if !shown.is_empty() {
            emit(events, TurnEvent::Discard);
        }
        emit(events, TurnEvent::Delta(reply.text.clone()));
    }
    emit(events, TurnEvent::Finished(reply.clone()));
    reply
}

impl Orchestrator {
    /// Run one user turn, streaming text as it is generated.
    ///
    /// The final `TurnEvent::Finished` carries the same reply that is returned.
    #[instrument(skip(self, text, events), fields(chars = text.chars().count()))]
    pub async fn send_message_streaming(
        &mut self,
        text: &str,
        events: &UnboundedSender<TurnEvent>,
    ) -> TurnReply {
        let start = Instant::now();
        self.begin_turn(text);
        let mut budget = RetryBudget::default();
        let mut shown = String::new();

        for iteration in 1..=self.config.max_iterations {
            let request = self.build_request();
            info!(
                iteration,
                input_items = request.input.len(),
                compact = request.previous_response_id.is_some(),
                "Streaming model call"
            );

            let opened = self.provider.respond_stream(request).await;
            let collected = match opened {
                Ok(stream) => collect_stream(stream, events, &mut shown).await,
                Err(e) => Err(e),
            };
            let step = match collected {
                Ok(response) => self.handle_response(response, &mut budget, iteration).await,
                Err(e) => self.handle_model_error(e, &mut budget, iteration).await,
            };

            match step {
                Step::Continue => {
                    if !shown.is_empty() {
                        emit(events, TurnEvent::Discard);
                        shown.clear();
                    }
                }
                Step::Finish(reply) => {
                    info!(
                        iteration,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        status = ?reply.status,
                        "Streamed turn finished"
                    );
                    return finish(events, &shown, reply);
                }
            }
        }

        let reply = self.give_up(
            GiveUpReason::IterationLimit,
            ITERATION_LIMIT_MESSAGE.to_string(),
            self.config.max_iterations,
        );
        finish(events, &shown, reply)
    }
}
