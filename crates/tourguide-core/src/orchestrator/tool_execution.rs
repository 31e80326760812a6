//! Tool phase of a turn

use super::core::Orchestrator;
use crate::dispatcher::ToolOutput;
use crate::history::TOOL_SUMMARY_PREFIX;
use std::str::FromStr;
use tourguide_llm::util::truncate_chars;
use tourguide_llm::ToolCall;
use tourguide_tools::ToolName;
use tracing::info;

/// Summary budget for tools whose results are shown as cards
const RESULT_SUMMARY_CHARS: usize = 2000;

/// Summary budget for every other tool
const DEFAULT_SUMMARY_CHARS: usize = 1000;

impl Orchestrator {
    /// Execute every call in order, log a condensed summary for replay and
    /// queue the outputs as the next compact input.
    pub(crate) async fn run_tools(&mut self, calls: &[ToolCall]) {
        let names: Vec<&str> = calls.iter().map(|call| call.name.as_str()).collect();
        info!(tools = ?names, "Executing tool calls");

        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            let output = self.dispatcher.execute(call, self.history.log()).await;
            outputs.push(output);
        }

        if let Some(summary) = tool_summary(&outputs) {
            self.history.record_tool_summary(summary);
        }
        self.history
            .continue_with(outputs.iter().map(ToolOutput::to_input_item).collect());
    }
}

/// Assistant-role log entry describing tool results
pub(crate) fn tool_summary(outputs: &[ToolOutput]) -> Option<String> {
    if outputs.is_empty() {
        return None;
    }
    let lines: Vec<String> = outputs
        .iter()
        .map(|output| {
            let limit = match ToolName::from_str(&output.name) {
                Ok(tool) if tool.is_result_bearing() => RESULT_SUMMARY_CHARS,
                _ => DEFAULT_SUMMARY_CHARS,
            };
            format!("[{}]: {}", output.name, truncate_chars(&output.output, limit))
        })
        .collect();
    Some(format!("{TOOL_SUMMARY_PREFIX}{}", lines.join("\n")))
}
