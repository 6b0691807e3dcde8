//! Conversation state machine.
//!
//! The state is a pure function of the message intent and how many turns
//! preceded it:
//! - troubleshooting / search help: exploring, then clarifying
//! - recommendation / comparison: always clarifying
//! - content creation: exploring, then resolving
//! - everything else: exploring, then complete
//!
//! A "complete" conversation is not locked; the next turn is evaluated
//! from scratch.

use recall_core::config::StateThresholds;

use crate::types::{ConversationState, Intent};

/// Compute the state for a turn given the number of prior history turns.
pub fn next_state(
    intent: Intent,
    history_len: usize,
    thresholds: &StateThresholds,
) -> ConversationState {
    match intent {
        Intent::Troubleshooting | Intent::SearchHelp => {
            if history_len < thresholds.clarify_after {
                ConversationState::Exploring
            } else {
                ConversationState::Clarifying
            }
        }
        Intent::Recommendation | Intent::Comparison => ConversationState::Clarifying,
        Intent::ContentCreation => {
            if history_len > thresholds.resolve_after {
                ConversationState::Resolving
            } else {
                ConversationState::Exploring
            }
        }
        _ => {
            if history_len > thresholds.complete_after {
                ConversationState::Complete
            } else {
                ConversationState::Exploring
            }
        }
    }
}
