//! Decision logic shared by the blocking and streaming turn loops
//!
//! Both variants feed a finished `ModelResponse` (or a provider error) into
//! the same branches, so retry budgets and give-up behavior cannot diverge.

use super::core::Orchestrator;
use super::types::{GiveUpReason, TurnReply, TurnStatus};
use crate::classifiers::dedup_response;
use crate::error::{Error, UserFriendlyError};
use tokio::time::sleep;
use tourguide_llm::{Error as LlmError, InputItem, ModelResponse};
use tracing::{debug, error, info, warn};

/// Generic nudge after an empty or text-less response
pub const CONTINUE_NUDGE: &str = "Продолжи обработку моего запроса на основе полученных данных.";

/// Nudge restating the task after a self-censored response
pub const CENSORSHIP_NUDGE: &str =
    "Пожалуйста, помоги с подбором тура. Продолжи с того места, где мы остановились.";

/// Nudge appended when replaying after an access denial
pub const FORBIDDEN_NUDGE: &str = "Пожалуйста, продолжи помогать с подбором тура.";

/// Call id of the synthetic correction sent after a promised action
pub const PROMISE_NUDGE_CALL_ID: &str = "_nudge_search";

/// Body of the synthetic correction sent after a promised action
pub const PROMISE_NUDGE_OUTPUT: &str = r#"{"error":"СИСТЕМНАЯ ОШИБКА: Ты ОПИСАЛ намерение поиска текстом, но НЕ вызвал функцию. НЕМЕДЛЕННО вызови get_current_date(), затем search_tours() с собранными параметрами. НИКОГДА не пиши 'сейчас поищу' — ВЫЗЫВАЙ функцию!"}"#;

/// Shown when empty responses exhausted their retries
pub const EMPTY_GIVE_UP_MESSAGE: &str =
    "Извините, не удалось обработать запрос. Попробуйте переформулировать.";

/// Shown when self-censored responses exhausted their retries
pub const CENSORSHIP_GIVE_UP_MESSAGE: &str =
    "Извините, произошла ошибка. Попробуйте переформулировать запрос или начните новый чат.";

/// Shown when the model-call cap is reached
pub const ITERATION_LIMIT_MESSAGE: &str = "Ошибка: превышено количество итераций Function Calling";

/// Anomaly counters of one turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RetryBudget {
    pub empty: u32,
    pub censorship: u32,
    pub promise: u32,
    pub forbidden: u32,
}

/// What the loop does after a branch
#[derive(Debug)]
pub(crate) enum Step {
    /// Call the model again with the (possibly mutated) context
    Continue,
    /// The turn is over
    Finish(TurnReply),
}

impl Orchestrator {
    /// Classify a provider failure into retry or terminal reply
    pub(crate) async fn handle_model_error(
        &mut self,
        error: LlmError,
        budget: &mut RetryBudget,
        iteration: u32,
    ) -> Step {
        match &error {
            LlmError::Forbidden(message) => {
                budget.forbidden += 1;
                if budget.forbidden > self.config.max_forbidden_retries {
                    error!(iteration, message = %message, "Access denied after replay retries");
                    return Step::Finish(self.give_up(
                        GiveUpReason::Forbidden,
                        Error::from(error).user_message(),
                        iteration,
                    ));
                }
                warn!(
                    iteration,
                    attempt = budget.forbidden,
                    "Access denied, replaying full history"
                );
                self.history
                    .switch_to_replay(Some(FORBIDDEN_NUDGE.to_string()));
                Step::Continue
            }
            LlmError::PreviousResponseFailed(message) => {
                warn!(iteration, message = %message, "Continuation pointer failed upstream, replaying full history");
                self.history.switch_to_replay(None);
                Step::Continue
            }
            LlmError::InProgress(_) => {
                let wait = self.config.in_progress_wait();
                warn!(
                    iteration,
                    wait_ms = wait.as_millis() as u64,
                    "Previous response still generating, waiting"
                );
                sleep(wait).await;
                Step::Continue
            }
            LlmError::RateLimit => {
                error!(iteration, "Provider rate limit reached");
                Step::Finish(self.give_up(
                    GiveUpReason::RateLimited,
                    Error::from(error).user_message(),
                    iteration,
                ))
            }
            _ => {
                error!(iteration, error = %error, "Model call failed");
                // The pointer may be the cause; the next turn starts from the full log
                self.history.switch_to_replay(None);
                Step::Finish(self.give_up(
                    GiveUpReason::ProviderError,
                    Error::from(error).user_message(),
                    iteration,
                ))
            }
        }
    }

    /// Route a finished response to the tool or text branch
    pub(crate) async fn handle_response(
        &mut self,
        response: ModelResponse,
        budget: &mut RetryBudget,
        iteration: u32,
    ) -> Step {
        let has_output = !response.output.is_empty();
        self.history.record_response(&response.id, has_output);

        let calls = response.function_calls();
        let text = response.final_text();
        debug!(
            iteration,
            items = ?response.item_types(),
            calls = calls.len(),
            text_chars = text.chars().count(),
            "Model responded"
        );

        if !calls.is_empty() {
            if self.classifier.is_promised_action(&text) || self.classifier.is_self_censorship(&text)
            {
                warn!(iteration, "Anomalous text next to tool calls, executing the calls");
            }
            self.run_tools(&calls).await;
            return Step::Continue;
        }

        if text.is_empty() && has_output {
            info!(
                iteration,
                items = ?response.item_types(),
                "Output items without text, asking the model to continue"
            );
            if response.has_web_search() {
                sleep(self.config.web_search_wait()).await;
            }
            self.history
                .continue_with(vec![InputItem::user(CONTINUE_NUDGE)]);
            return Step::Continue;
        }

        self.handle_text(text, budget, iteration)
    }

    /// Free-text branch: empty, self-censored, promised action, or final answer
    pub(crate) fn handle_text(
        &mut self,
        text: String,
        budget: &mut RetryBudget,
        iteration: u32,
    ) -> Step {
        if text.is_empty() {
            budget.empty += 1;
            warn!(iteration, attempt = budget.empty, "Empty model response");
            if budget.empty >= self.config.max_empty_retries {
                return Step::Finish(self.give_up(
                    GiveUpReason::EmptyOutput,
                    EMPTY_GIVE_UP_MESSAGE.to_string(),
                    iteration,
                ));
            }
            self.history
                .switch_to_replay(Some(CONTINUE_NUDGE.to_string()));
            return Step::Continue;
        }

        if self.classifier.is_self_censorship(&text) {
            budget.censorship += 1;
            warn!(
                iteration,
                attempt = budget.censorship,
                "Self-censored model response"
            );
            if budget.censorship >= self.config.max_censorship_retries {
                return Step::Finish(self.give_up(
                    GiveUpReason::SelfCensorship,
                    CENSORSHIP_GIVE_UP_MESSAGE.to_string(),
                    iteration,
                ));
            }
            self.history
                .switch_to_replay(Some(CENSORSHIP_NUDGE.to_string()));
            return Step::Continue;
        }

        if self.classifier.is_promised_action(&text) {
            budget.promise += 1;
            self.metrics.promised_search_detections.inc();
            if budget.promise >= self.config.max_promise_retries {
                warn!(
                    iteration,
                    attempt = budget.promise,
                    "Promised action repeated, returning the text as is"
                );
                return Step::Finish(self.complete(text, iteration));
            }
            warn!(
                iteration,
                attempt = budget.promise,
                "Model promised an action without calling a tool, injecting correction"
            );
            self.history.continue_with(vec![InputItem::function_output(
                PROMISE_NUDGE_CALL_ID,
                PROMISE_NUDGE_OUTPUT,
            )]);
            return Step::Continue;
        }

        Step::Finish(self.complete(text, iteration))
    }

    /// Commit the cleaned answer and end the turn
    pub(crate) fn complete(&mut self, text: String, iteration: u32) -> TurnReply {
        let text = dedup_response(&text);
        self.history.commit_assistant(&text);
        info!(iteration, chars = text.chars().count(), "Turn completed");
        TurnReply {
            text,
            status: TurnStatus::Completed,
            iterations: iteration,
        }
    }

    /// End the turn with a fixed message; nothing is committed to history
    pub(crate) fn give_up(
        &self,
        reason: GiveUpReason,
        message: String,
        iteration: u32,
    ) -> TurnReply {
        warn!(?reason, iteration, "Turn gave up");
        TurnReply {
            text: message,
            status: TurnStatus::GaveUp(reason),
            iterations: iteration,
        }
    }
}
