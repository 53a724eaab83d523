//! Replay of prior steps as conversation context.

use super::types::AgentStep;
use crate::types::ChatMessage;

/// Rebuild the message sequence for `steps`, in order.
///
/// Actions that came from a structured call replay their originating
/// messages followed by a function message holding the observation. Plain
/// actions replay as a single AI message containing their log. The output
/// depends only on `steps`.
pub fn build_scratchpad(steps: &[AgentStep]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(steps.len() * 2);
    for step in steps {
        let action = &step.action;
        if action.message_log.is_empty() {
            messages.push(ChatMessage::ai(action.log.clone()));
        } else {
            messages.extend(action.message_log.iter().cloned());
            messages.push(ChatMessage::function(
                action.tool.clone(),
                step.observation.clone(),
            ));
        }
    }
    messages
}
