//! Chat orchestrator: central coordinator wiring classifier, memory, and
//! the response service.
//!
//! One call to [`ChatOrchestrator::generate`] is one conversation turn.
//! Memory is only touched after the response service has answered, so a
//! failed call leaves it exactly as it was.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use recall_core::config::ChatConfig;
use recall_storage::KeyValueStore;
use tracing::{debug, warn};

use crate::classifier::MessageAnalyzer;
use crate::error::ChatError;
use crate::insight::{actionable_insights, follow_up_questions};
use crate::memory::MemoryStore;
use crate::service::{ResponseOptions, ResponseService};
use crate::state_machine::next_state;
use crate::types::{AiResponse, ChatMemory, ContextPatch, ConversationTurn, TurnContext};

/// Central orchestrator that composes a reply for each user message.
pub struct ChatOrchestrator {
    analyzer: MessageAnalyzer,
    service: Arc<dyn ResponseService>,
    memory: Mutex<MemoryStore>,
    config: ChatConfig,
}

impl ChatOrchestrator {
    /// Create an orchestrator, loading memory from `store` under `memory_key`.
    pub fn new(
        service: Arc<dyn ResponseService>,
        store: Arc<dyn KeyValueStore>,
        memory_key: &str,
        config: ChatConfig,
    ) -> Self {
        let memory = MemoryStore::load(store, memory_key, &config);
        Self {
            analyzer: MessageAnalyzer::new(),
            service,
            memory: Mutex::new(memory),
            config,
        }
    }

    /// Replace the default keyword analyzer.
    pub fn with_analyzer(mut self, analyzer: MessageAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Produce the reply for one user message.
    pub async fn generate(&self, message: &str) -> Result<AiResponse, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        let analysis = self.analyzer.analyze(message);

        // Snapshot everything the service needs, then release the lock
        // before awaiting.
        let (state, options) = {
            let memory = self.lock_memory()?;
            let snapshot = memory.memory();
            let state = next_state(
                analysis.intent,
                snapshot.conversation_history.len(),
                &self.config.thresholds,
            );
            let context = TurnContext::assemble(
                &analysis,
                state,
                snapshot,
                self.config.context_turns,
                Utc::now(),
            );
            let options = ResponseOptions {
                search_history: memory.past_queries(),
                user_preferences: snapshot.user_preferences.clone(),
                context,
            };
            (state, options)
        };

        debug!(
            intent = %analysis.intent,
            sentiment = %analysis.sentiment,
            state = %state,
            topics = ?analysis.topics,
            "Message classified"
        );

        let reply = match self
            .service
            .generate_contextual_response(message, &options)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, failure = ?e.failure(), "Response service failed");
                return Err(e.into());
            }
        };

        {
            let mut memory = self.lock_memory()?;
            memory.bump_topics(&analysis.topics);
            memory.push_sentiment(analysis.sentiment);
            memory.maybe_learn_expertise(analysis.intent, &analysis.topics);
            memory.maybe_learn_interests(analysis.intent, &analysis.topics);
            memory.append_turn(ConversationTurn {
                query: message.to_string(),
                response: reply.response.clone(),
                timestamp: options.context.timestamp,
                context: options.context,
                intent: analysis.intent,
                sentiment: analysis.sentiment,
                topics: analysis.topics.clone(),
                entities: analysis.entities.clone(),
            });
            let turn_count = memory.memory().current_context.turn_count + 1;
            memory.update_context(ContextPatch {
                last_intent: Some(analysis.intent),
                last_state: Some(state),
                active_topics: Some(analysis.topics.clone()),
                active_entities: Some(analysis.entities.clone()),
                turn_count: Some(turn_count),
            });
            memory.refresh_summary();
        }

        Ok(AiResponse {
            response: reply.response,
            confidence: reply.confidence.unwrap_or(self.config.default_confidence),
            intent: analysis.intent,
            sentiment: analysis.sentiment,
            suggestions: reply.suggestions,
            related_content: reply.related_content,
            follow_up_questions: follow_up_questions(
                analysis.intent,
                state,
                self.config.follow_up_count,
            ),
            actionable_insights: actionable_insights(&analysis, self.config.insight_count),
            conversation_state: state,
        })
    }

    /// A copy of the current memory.
    pub fn memory_snapshot(&self) -> Result<ChatMemory, ChatError> {
        Ok(self.lock_memory()?.memory().clone())
    }

    /// Store an opaque user preference forwarded with every request.
    pub fn set_preference(&self, key: &str, value: serde_json::Value) -> Result<(), ChatError> {
        self.lock_memory()?.set_preference(key, value);
        Ok(())
    }

    /// Wipe memory and its persisted copy.
    pub fn reset_memory(&self) -> Result<(), ChatError> {
        self.lock_memory()?.reset();
        Ok(())
    }

    fn lock_memory(&self) -> Result<MutexGuard<'_, MemoryStore>, ChatError> {
        self.memory
            .lock()
            .map_err(|e| ChatError::Storage(format!("memory lock poisoned: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use recall_storage::InMemoryStore;

    use crate::error::ServiceError;
    use crate::memory::MEMORY_KEY;
    use crate::service::{ServiceReply, TemplateResponder};
    use crate::types::{ConversationState, Intent, Sentiment};

    /// Records the options it receives and answers with a fixed reply.
    struct RecordingService {
        reply: Result<ServiceReply, ServiceError>,
        seen: Mutex<Vec<ResponseOptions>>,
    }

    impl RecordingService {
        fn ok(reply: ServiceReply) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(ServiceError::new(message)),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last_options(&self) -> ResponseOptions {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ResponseService for RecordingService {
        async fn generate_contextual_response(
            &self,
            _message: &str,
            options: &ResponseOptions,
        ) -> Result<ServiceReply, ServiceError> {
            self.seen.lock().unwrap().push(options.clone());
            self.reply.clone()
        }
    }

    fn make_orchestrator(service: Arc<dyn ResponseService>) -> (Arc<InMemoryStore>, ChatOrchestrator) {
        let kv = Arc::new(InMemoryStore::new());
        let orchestrator =
            ChatOrchestrator::new(service, kv.clone(), MEMORY_KEY, ChatConfig::default());
        (kv, orchestrator)
    }

    // =====================================================================
    // Successful turns
    // =====================================================================

    #[tokio::test]
    async fn test_generate_first_turn() {
        let (_, orchestrator) = make_orchestrator(Arc::new(TemplateResponder));
        let reply = orchestrator.generate("What is Storyblok?").await.unwrap();

        assert_eq!(reply.intent, Intent::Learning);
        assert_eq!(reply.sentiment, Sentiment::Neutral);
        assert_eq!(reply.conversation_state, ConversationState::Exploring);
        assert_eq!(reply.follow_up_questions.len(), 2);
        assert_eq!(reply.actionable_insights.len(), 1);

        let memory = orchestrator.memory_snapshot().unwrap();
        assert_eq!(memory.topic_frequency.get("storyblok"), Some(&1));
        assert_eq!(memory.conversation_history.len(), 1);
        assert_eq!(memory.user_profile.expertise, vec!["storyblok"]);
        assert_eq!(memory.current_context.turn_count, 1);
        assert_eq!(memory.current_context.last_intent, Some(Intent::Learning));
        assert!(memory.conversation_summary.starts_with("1 turn in memory"));
    }

    #[tokio::test]
    async fn test_missing_confidence_uses_default() {
        let (_, orchestrator) = make_orchestrator(RecordingService::ok(ServiceReply::text("ok")));
        let reply = orchestrator.generate("hello").await.unwrap();
        assert!((reply.confidence - 0.85).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_service_confidence_is_kept() {
        let service = RecordingService::ok(ServiceReply {
            confidence: Some(0.42),
            ..ServiceReply::text("ok")
        });
        let (_, orchestrator) = make_orchestrator(service);
        let reply = orchestrator.generate("hello").await.unwrap();
        assert!((reply.confidence - 0.42).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_options_carry_history_and_context() {
        let service = RecordingService::ok(ServiceReply::text("ok"));
        let (_, orchestrator) = make_orchestrator(service.clone());
        orchestrator
            .set_preference("tone", serde_json::json!("friendly"))
            .unwrap();

        orchestrator.generate("first question").await.unwrap();
        orchestrator.generate("Fix my broken API").await.unwrap();

        let options = service.last_options();
        assert_eq!(options.search_history, vec!["first question"]);
        assert_eq!(
            options.user_preferences.get("tone"),
            Some(&serde_json::json!("friendly"))
        );
        assert_eq!(options.context.intent, Intent::Troubleshooting);
        assert_eq!(options.context.recent_turns.len(), 1);
        assert_eq!(options.context.recent_sentiments.len(), 1);
    }

    #[tokio::test]
    async fn test_state_uses_history_before_turn() {
        let (_, orchestrator) = make_orchestrator(RecordingService::ok(ServiceReply::text("ok")));
        let mut states = Vec::new();
        for _ in 0..3 {
            let reply = orchestrator.generate("I have a bug").await.unwrap();
            states.push(reply.conversation_state);
        }
        assert_eq!(
            states,
            vec![
                ConversationState::Exploring,
                ConversationState::Exploring,
                ConversationState::Clarifying,
            ]
        );
    }

    #[tokio::test]
    async fn test_message_is_trimmed_before_storage() {
        let (_, orchestrator) = make_orchestrator(RecordingService::ok(ServiceReply::text("ok")));
        orchestrator.generate("  hello  ").await.unwrap();
        assert_eq!(
            orchestrator.memory_snapshot().unwrap().conversation_history[0].query,
            "hello"
        );
    }

    // =====================================================================
    // Failures leave memory untouched
    // =====================================================================

    #[tokio::test]
    async fn test_service_failure_does_not_mutate_memory() {
        let (kv, orchestrator) = make_orchestrator(RecordingService::failing("rate limit exceeded"));
        let err = orchestrator.generate("What is Storyblok?").await.unwrap_err();

        assert!(matches!(err, ChatError::Service(_)));
        assert_eq!(err.raw_message(), "rate limit exceeded");
        assert_eq!(orchestrator.memory_snapshot().unwrap(), ChatMemory::default());
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let service = RecordingService::ok(ServiceReply::text("ok"));
        let (_, orchestrator) = make_orchestrator(service.clone());

        assert!(matches!(
            orchestrator.generate("   ").await,
            Err(ChatError::EmptyMessage)
        ));
        let long = "a".repeat(4001);
        assert!(matches!(
            orchestrator.generate(&long).await,
            Err(ChatError::MessageTooLong(4000))
        ));
        assert!(service.seen.lock().unwrap().is_empty());
    }

    // =====================================================================
    // Memory lifecycle
    // =====================================================================

    #[tokio::test]
    async fn test_memory_survives_new_orchestrator() {
        let kv = Arc::new(InMemoryStore::new());
        {
            let orchestrator = ChatOrchestrator::new(
                Arc::new(TemplateResponder),
                kv.clone(),
                MEMORY_KEY,
                ChatConfig::default(),
            );
            orchestrator.generate("What is Storyblok?").await.unwrap();
        }
        let orchestrator = ChatOrchestrator::new(
            Arc::new(TemplateResponder),
            kv,
            MEMORY_KEY,
            ChatConfig::default(),
        );
        let memory = orchestrator.memory_snapshot().unwrap();
        assert_eq!(memory.conversation_history.len(), 1);
    }

    #[tokio::test]
    async fn test_restored_history_is_trimmed_before_state() {
        let kv = Arc::new(InMemoryStore::new());
        let roomy = ChatConfig {
            history_limit: 20,
            ..ChatConfig::default()
        };
        {
            let orchestrator =
                ChatOrchestrator::new(Arc::new(TemplateResponder), kv.clone(), MEMORY_KEY, roomy);
            for i in 0..15 {
                orchestrator.generate(&format!("note {}", i)).await.unwrap();
            }
        }

        let tight = ChatConfig {
            history_limit: 4,
            ..ChatConfig::default()
        };
        let orchestrator =
            ChatOrchestrator::new(Arc::new(TemplateResponder), kv, MEMORY_KEY, tight);
        assert_eq!(
            orchestrator.memory_snapshot().unwrap().conversation_history.len(),
            4
        );

        let reply = orchestrator.generate("What is Storyblok?").await.unwrap();
        assert_eq!(reply.conversation_state, ConversationState::Exploring);
        assert_eq!(
            orchestrator.memory_snapshot().unwrap().conversation_history.len(),
            4
        );
    }

    #[tokio::test]
    async fn test_reset_memory() {
        let (kv, orchestrator) = make_orchestrator(Arc::new(TemplateResponder));
        orchestrator.generate("What is Storyblok?").await.unwrap();
        orchestrator.reset_memory().unwrap();

        assert_eq!(orchestrator.memory_snapshot().unwrap(), ChatMemory::default());
        assert_eq!(kv.get(MEMORY_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_custom_analyzer() {
        struct AlwaysAnalysis;
        impl crate::classifier::Classifier for AlwaysAnalysis {
            type Label = Intent;
            fn classify(&self, _message: &str) -> Intent {
                Intent::Analysis
            }
        }

        let (_, orchestrator) = make_orchestrator(RecordingService::ok(ServiceReply::text("ok")));
        let orchestrator =
            orchestrator.with_analyzer(MessageAnalyzer::new().with_intent_classifier(AlwaysAnalysis));
        let reply = orchestrator.generate("hello").await.unwrap();
        assert_eq!(reply.intent, Intent::Analysis);
    }
}
