//! Follow-up questions and actionable insights.
//!
//! Both are derived from static tables. Follow-ups are keyed by
//! `(intent, state)` with a generic fallback; insights come from an ordered
//! rule list gated on the message's intent, topics, and entities.

use crate::types::{Analysis, ConversationState, Intent};

// =============================================================================
// Follow-up questions
// =============================================================================

/// Used when no table entry exists for an `(intent, state)` pair.
const GENERIC_FOLLOW_UPS: [&str; 3] = [
    "Is there anything specific you'd like to dive deeper into?",
    "Would an example help make this clearer?",
    "What are you working on right now?",
];

fn follow_up_table(intent: Intent, state: ConversationState) -> Option<&'static [&'static str]> {
    use ConversationState::*;

    let questions: &'static [&'static str] = match (intent, state) {
        (Intent::Learning, Exploring) => &[
            "Would you like a step-by-step walkthrough?",
            "Should I point you to the relevant documentation?",
            "What's your current experience level with this?",
        ],
        (Intent::Learning, Complete) => &[
            "Would you like to try a hands-on exercise next?",
            "Is there a related concept you want to explore?",
        ],
        (Intent::Troubleshooting, Exploring) => &[
            "What error message are you seeing exactly?",
            "When did this start happening?",
            "Have you changed anything recently?",
        ],
        (Intent::Troubleshooting, Clarifying) => &[
            "Can you share the relevant configuration or code snippet?",
            "Does the problem happen in every environment?",
        ],
        (Intent::SearchHelp, Exploring) => &[
            "Which content type are you looking for?",
            "Do you remember roughly when it was created?",
        ],
        (Intent::SearchHelp, Clarifying) => &[
            "Should I narrow the search to a specific space or folder?",
            "Are there any tags or authors I should filter by?",
        ],
        (Intent::ContentCreation, Exploring) => &[
            "Who is the target audience?",
            "What tone should the content have?",
            "How long should the piece be?",
        ],
        (Intent::ContentCreation, Resolving) => &[
            "Would you like me to refine the draft further?",
            "Should I suggest SEO metadata for it?",
        ],
        (Intent::Recommendation, Clarifying) => &[
            "What matters most to you: cost, performance, or ease of use?",
            "What does your current stack look like?",
        ],
        (Intent::Comparison, Clarifying) => &[
            "Which criteria are most important for your decision?",
            "Would a side-by-side table help?",
        ],
        (Intent::Analysis, Exploring) => &[
            "Which time period should the analysis cover?",
            "Which metrics matter most to you?",
        ],
        (Intent::WorkflowAutomation, Exploring) => &[
            "Which step of the workflow takes the most time today?",
            "Which systems need to be connected?",
        ],
        _ => return None,
    };
    Some(questions)
}

/// The first `count` follow-up questions for a turn.
pub fn follow_up_questions(
    intent: Intent,
    state: ConversationState,
    count: usize,
) -> Vec<String> {
    follow_up_table(intent, state)
        .unwrap_or(&GENERIC_FOLLOW_UPS)
        .iter()
        .take(count)
        .map(|q| q.to_string())
        .collect()
}

// =============================================================================
// Actionable insights
// =============================================================================

/// A tip emitted when every present gate matches.
struct InsightRule {
    intent: Option<Intent>,
    topic: Option<&'static str>,
    entity: Option<&'static str>,
    insights: &'static [&'static str],
}

impl InsightRule {
    fn matches(&self, analysis: &Analysis) -> bool {
        self.intent.map_or(true, |i| i == analysis.intent)
            && self
                .topic
                .map_or(true, |t| analysis.topics.iter().any(|x| x == t))
            && self
                .entity
                .map_or(true, |e| analysis.entities.iter().any(|x| x == e))
    }
}

const INSIGHT_RULES: &[InsightRule] = &[
    InsightRule {
        intent: Some(Intent::Learning),
        topic: Some("storyblok"),
        entity: None,
        insights: &["Explore the Storyblok documentation and tutorials to build a solid foundation."],
    },
    InsightRule {
        intent: Some(Intent::Troubleshooting),
        topic: None,
        entity: None,
        insights: &[
            "Check the browser console and server logs for detailed error messages.",
            "Verify your API tokens and environment variables are set correctly.",
        ],
    },
    InsightRule {
        intent: None,
        topic: Some("performance"),
        entity: None,
        insights: &["Enable caching and image optimization to improve load times."],
    },
    InsightRule {
        intent: None,
        topic: Some("seo"),
        entity: None,
        insights: &["Add meta titles and descriptions to every content type."],
    },
    InsightRule {
        intent: Some(Intent::ContentCreation),
        topic: None,
        entity: None,
        insights: &["Reuse components across stories to keep content consistent."],
    },
    InsightRule {
        intent: Some(Intent::WorkflowAutomation),
        topic: None,
        entity: None,
        insights: &["Use webhooks to trigger workflows when content is published."],
    },
    InsightRule {
        intent: None,
        topic: None,
        entity: Some("Next.js"),
        insights: &["Use the Storyblok Next.js SDK for live preview with the Visual Editor."],
    },
    InsightRule {
        intent: Some(Intent::Comparison),
        topic: None,
        entity: None,
        insights: &["List your must-have requirements before comparing options."],
    },
    InsightRule {
        intent: Some(Intent::Analysis),
        topic: None,
        entity: None,
        insights: &["Set up a recurring report to track this metric over time."],
    },
];

/// The first `count` insights whose rule gates match, in rule order.
pub fn actionable_insights(analysis: &Analysis, count: usize) -> Vec<String> {
    INSIGHT_RULES
        .iter()
        .filter(|rule| rule.matches(analysis))
        .flat_map(|rule| rule.insights.iter())
        .take(count)
        .map(|s| s.to_string())
        .collect()
}
