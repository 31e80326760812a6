//! Blocking turn loop

use super::core::Orchestrator;
use super::turn::{RetryBudget, Step, ITERATION_LIMIT_MESSAGE};
use super::types::{GiveUpReason, TurnReply};
use std::time::Instant;
use tracing::{info, instrument};

impl Orchestrator {
    /// Run one user turn to completion.
    ///
    /// Never fails: provider errors and exhausted retries end in a fixed
    /// customer-facing message with a `GaveUp` status.
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn send_message(&mut self, text: &str) -> TurnReply {
        let start = Instant::now();
        self.begin_turn(text);
        let mut budget = RetryBudget::default();

        for iteration in 1..=self.config.max_iterations {
            let request = self.build_request();
            info!(
                iteration,
                input_items = request.input.len(),
                compact = request.previous_response_id.is_some(),
                "Calling model"
            );

            let result = self.provider.respond(request).await;
            let step = match result {
                Ok(response) => self.handle_response(response, &mut budget, iteration).await,
                Err(e) => self.handle_model_error(e, &mut budget, iteration).await,
            };
            if let Step::Finish(reply) = step {
                info!(
                    iteration,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    status = ?reply.status,
                    "Turn finished"
                );
                return reply;
            }
        }

        self.give_up(
            GiveUpReason::IterationLimit,
            ITERATION_LIMIT_MESSAGE.to_string(),
            self.config.max_iterations,
        )
    }
}
