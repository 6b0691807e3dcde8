//! Conversational context and memory engine for Recall.
//!
//! Classifies each message (intent, sentiment, topics, entities), derives a
//! conversation state, keeps a persisted per-user memory, and wraps an
//! external response service with follow-up questions and insights.

pub mod classifier;
pub mod error;
pub mod insight;
pub mod memory;
pub mod orchestrator;
pub mod service;
pub mod session;
pub mod state_machine;
pub mod types;

pub use classifier::{
    classify_intent, classify_sentiment, extract_entities, extract_topics, Classifier,
    EntityExtractor, KeywordIntentClassifier, KeywordTopicExtractor, LexiconSentimentClassifier,
    MessageAnalyzer,
};
pub use error::{ChatError, ServiceError, ServiceFailure};
pub use memory::{MemoryStore, MEMORY_KEY};
pub use orchestrator::ChatOrchestrator;
pub use service::{ResponseOptions, ResponseService, ServiceReply, TemplateResponder};
pub use session::{ChatSession, IgnoreReason, SendOutcome};
pub use state_machine::next_state;
pub use types::{
    AiResponse, Analysis, ChatMemory, ContextPatch, ConversationState, ConversationTurn,
    CurrentContext, Intent, IntentFocus, Message, RelatedContent, Role, Sentiment, TurnContext,
    TurnDigest, UserProfile,
};
