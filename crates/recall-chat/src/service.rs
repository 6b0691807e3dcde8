//! The external response service the orchestrator delegates answers to.
//!
//! [`ResponseService`] is the narrow seam between the engine and whatever
//! actually writes replies (typically an LLM backend). [`TemplateResponder`]
//! is a deterministic implementation that needs no network access.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::types::{Intent, IntentFocus, RelatedContent, TurnContext};

/// What the engine sends alongside the user's message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseOptions {
    /// Every remembered query, oldest first.
    pub search_history: Vec<String>,
    pub user_preferences: BTreeMap<String, serde_json::Value>,
    pub context: TurnContext,
}

/// A successful answer from the response service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceReply {
    pub response: String,
    pub confidence: Option<f32>,
    pub suggestions: Vec<String>,
    pub related_content: Vec<RelatedContent>,
}

impl ServiceReply {
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Self::default()
        }
    }
}

/// Produces replies for analysed user messages.
#[async_trait]
pub trait ResponseService: Send + Sync {
    async fn generate_contextual_response(
        &self,
        message: &str,
        options: &ResponseOptions,
    ) -> Result<ServiceReply, ServiceError>;
}

// =============================================================================
// TemplateResponder
// =============================================================================

/// Catalogue entry: topic, id, title.
static CATALOGUE: &[(&str, &str, &str)] = &[
    ("storyblok", "docs-getting-started", "Getting Started with Storyblok"),
    ("storyblok", "docs-content-modeling", "Content Modeling Guide"),
    ("api", "docs-content-delivery-api", "Content Delivery API Reference"),
    ("api", "docs-webhooks", "Working with Webhooks"),
    ("frontend", "tutorial-nextjs", "Add a Headless CMS to Next.js"),
    ("frontend", "tutorial-nuxt", "Building a Site with Nuxt and Storyblok"),
    ("seo", "guide-seo", "SEO Best Practices for Headless Sites"),
    ("performance", "guide-image-service", "Optimizing Images with the Image Service"),
    ("content", "guide-editorial-workflow", "Designing an Editorial Workflow"),
    ("ai", "guide-ai-content", "Generating Content with AI"),
    ("deployment", "guide-deploy-vercel", "Deploying to Vercel and Netlify"),
    ("localization", "guide-i18n", "Internationalization Strategies"),
    ("analytics", "guide-analytics", "Connecting Analytics to Your Content"),
];

/// Maximum related items returned per reply.
const MAX_RELATED: usize = 3;

/// Deterministic, LLM-free responder.
///
/// Builds an answer from per-intent templates mentioning the detected
/// subjects, and notes when the user has asked about a topic before.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateResponder;

impl TemplateResponder {
    pub fn new() -> Self {
        Self
    }

    fn subject(context: &TurnContext) -> String {
        let subjects = match &context.focus {
            IntentFocus::Troubleshooting { affected } => affected.clone(),
            IntentFocus::Comparison { candidates } => candidates.clone(),
            IntentFocus::WorkflowAutomation { systems } => systems.clone(),
            IntentFocus::Recommendation { interests } => interests.clone(),
            _ if !context.entities.is_empty() => context.entities.clone(),
            _ => context.topics.clone(),
        };
        if subjects.is_empty() {
            "this".to_string()
        } else {
            subjects.join(", ")
        }
    }

    fn answer(context: &TurnContext) -> String {
        let subject = Self::subject(context);
        match context.intent {
            Intent::Learning => format!(
                "Here's an overview of {}: start with the core concepts, then work through a small example to see how the pieces fit together.",
                subject
            ),
            Intent::Troubleshooting => format!(
                "Let's track down the problem with {}. Start by reproducing it reliably and checking the logs for the first error.",
                subject
            ),
            Intent::SearchHelp => format!(
                "I can help you find what you need about {}. Try filtering by content type and recent changes first.",
                subject
            ),
            Intent::ContentCreation => format!(
                "Let's draft something about {}. A clear outline with a strong opening and a call to action is a good starting point.",
                subject
            ),
            Intent::Recommendation => format!(
                "Based on what you've told me about {}, I'd pick the option that fits your existing stack and team experience.",
                subject
            ),
            Intent::Comparison => format!(
                "Comparing {}: each has trade-offs in flexibility, ecosystem, and learning curve.",
                subject
            ),
            Intent::Analysis => format!(
                "To analyze {}, define the metric you care about, collect a baseline, and track changes over time.",
                subject
            ),
            Intent::WorkflowAutomation => format!(
                "To automate work around {}, map the manual steps first, then connect them with triggers and webhooks.",
                subject
            ),
            Intent::General => "I'm here to help. Tell me a bit more about what you're working on.".to_string(),
        }
    }

    fn suggestions(intent: Intent) -> Vec<String> {
        let items: &[&str] = match intent {
            Intent::Learning => &["Show me an example", "What should I learn next?"],
            Intent::Troubleshooting => &["Show common fixes", "How do I enable debug logging?"],
            Intent::SearchHelp => &["Search by tag", "Show recently edited content"],
            Intent::ContentCreation => &["Suggest a headline", "Create an outline"],
            Intent::Recommendation => &["Compare the top options", "What do most teams use?"],
            Intent::Comparison => &["Show a comparison table", "Which is easier to learn?"],
            Intent::Analysis => &["Build a report", "Which metrics should I track?"],
            Intent::WorkflowAutomation => &["Set up a webhook", "Schedule a publish"],
            Intent::General => &["What can you help with?", "Show me getting started guides"],
        };
        items.iter().map(|s| s.to_string()).collect()
    }

    fn related(context: &TurnContext) -> Vec<RelatedContent> {
        CATALOGUE
            .iter()
            .filter(|(topic, _, _)| context.topics.iter().any(|t| t == topic))
            .take(MAX_RELATED)
            .enumerate()
            .map(|(rank, (_, id, title))| RelatedContent {
                id: id.to_string(),
                title: title.to_string(),
                relevance: 0.9 - rank as f32 * 0.1,
            })
            .collect()
    }
}

#[async_trait]
impl ResponseService for TemplateResponder {
    async fn generate_contextual_response(
        &self,
        _message: &str,
        options: &ResponseOptions,
    ) -> Result<ServiceReply, ServiceError> {
        let context = &options.context;
        let mut response = Self::answer(context);

        let revisited: Vec<&str> = context
            .topics
            .iter()
            .filter(|t| context.topic_frequency.contains_key(*t))
            .map(String::as_str)
            .collect();
        if !revisited.is_empty() {
            response.push_str(&format!(
                " Since we've talked about {} before, I'll build on that.",
                revisited.join(", ")
            ));
        }

        Ok(ServiceReply {
            response,
            confidence: if context.topics.is_empty() {
                None
            } else {
                Some(0.9)
            },
            suggestions: Self::suggestions(context.intent),
            related_content: Self::related(context),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::classifier::MessageAnalyzer;
    use crate::types::{ChatMemory, ConversationState};

    fn options_for(message: &str, memory: &ChatMemory) -> ResponseOptions {
        let analysis = MessageAnalyzer::new().analyze(message);
        ResponseOptions {
            search_history: vec![],
            user_preferences: BTreeMap::new(),
            context: TurnContext::assemble(
                &analysis,
                ConversationState::Exploring,
                memory,
                5,
                Utc::now(),
            ),
        }
    }

    #[tokio::test]
    async fn test_template_learning_reply() {
        let options = options_for("What is Storyblok?", &ChatMemory::default());
        let reply = TemplateResponder
            .generate_contextual_response("What is Storyblok?", &options)
            .await
            .unwrap();
        assert!(reply.response.contains("overview of Storyblok"));
        assert!(!reply.response.contains("before"));
        assert_eq!(reply.confidence, Some(0.9));
        assert_eq!(reply.related_content.len(), 2);
        assert_eq!(reply.related_content[0].id, "docs-getting-started");
        assert!(reply.related_content[0].relevance > reply.related_content[1].relevance);
        assert_eq!(reply.suggestions.len(), 2);
    }

    #[tokio::test]
    async fn test_template_mentions_revisited_topics() {
        let mut memory = ChatMemory::default();
        memory.topic_frequency.insert("storyblok".to_string(), 2);
        let options = options_for("What is Storyblok?", &memory);
        let reply = TemplateResponder
            .generate_contextual_response("What is Storyblok?", &options)
            .await
            .unwrap();
        assert!(reply.response.contains("talked about storyblok before"));
    }

    #[tokio::test]
    async fn test_template_general_reply_has_no_confidence() {
        let options = options_for("hello there", &ChatMemory::default());
        let reply = TemplateResponder
            .generate_contextual_response("hello there", &options)
            .await
            .unwrap();
        assert_eq!(reply.confidence, None);
        assert!(reply.related_content.is_empty());
        assert!(reply.response.starts_with("I'm here to help"));
    }

    #[tokio::test]
    async fn test_template_comparison_uses_candidates() {
        let options = options_for("Compare React vs Vue", &ChatMemory::default());
        assert_eq!(options.context.intent, Intent::Comparison);
        let reply = TemplateResponder
            .generate_contextual_response("Compare React vs Vue", &options)
            .await
            .unwrap();
        assert!(reply.response.starts_with("Comparing React, Vue"));
    }

    #[test]
    fn test_service_reply_tolerates_missing_fields() {
        let reply: ServiceReply = serde_json::from_str(r#"{"response":"hi"}"#).unwrap();
        assert_eq!(reply, ServiceReply::text("hi"));
    }
}
