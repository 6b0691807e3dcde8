//! Core types for the conversation engine.
//!
//! Defines classifier labels, the persisted chat memory, the typed context
//! forwarded to the response service, and the UI-facing message envelope.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Labels
// =============================================================================

/// The user's goal for a message.
///
/// Declaration order is significant: keyword-score ties between two
/// categories resolve to the one declared first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Learning,
    Troubleshooting,
    SearchHelp,
    ContentCreation,
    Recommendation,
    Comparison,
    Analysis,
    WorkflowAutomation,
    General,
}

impl Intent {
    /// Every label, in declaration order.
    pub const ALL: [Intent; 9] = [
        Intent::Learning,
        Intent::Troubleshooting,
        Intent::SearchHelp,
        Intent::ContentCreation,
        Intent::Recommendation,
        Intent::Comparison,
        Intent::Analysis,
        Intent::WorkflowAutomation,
        Intent::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Learning => "learning",
            Intent::Troubleshooting => "troubleshooting",
            Intent::SearchHelp => "search_help",
            Intent::ContentCreation => "content_creation",
            Intent::Recommendation => "recommendation",
            Intent::Comparison => "comparison",
            Intent::Analysis => "analysis",
            Intent::WorkflowAutomation => "workflow_automation",
            Intent::General => "general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| format!("Unknown intent: {}", s))
    }
}

/// Coarse polarity of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Negative => write!(f, "negative"),
        }
    }
}

/// Advisory label shaping the tone of a reply and its follow-ups.
///
/// Recomputed on every turn; never stored as a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    Exploring,
    Clarifying,
    Resolving,
    Complete,
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationState::Exploring => write!(f, "exploring"),
            ConversationState::Clarifying => write!(f, "clarifying"),
            ConversationState::Resolving => write!(f, "resolving"),
            ConversationState::Complete => write!(f, "complete"),
        }
    }
}

/// Classifier output for a single message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub intent: Intent,
    pub sentiment: Sentiment,
    pub topics: Vec<String>,
    pub entities: Vec<String>,
}

// =============================================================================
// Memory
// =============================================================================

/// Durable per-user conversation memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatMemory {
    /// Opaque preferences forwarded to the response service.
    pub user_preferences: BTreeMap<String, serde_json::Value>,
    /// Most recent turns, oldest first.
    pub conversation_history: Vec<ConversationTurn>,
    pub current_context: CurrentContext,
    pub user_profile: UserProfile,
    pub conversation_summary: String,
    pub topic_frequency: BTreeMap<String, u32>,
    /// Most recent message sentiments, oldest first.
    pub sentiment_history: Vec<Sentiment>,
}

/// What the engine has learned about the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    /// Topics the user has asked to learn about. Grow-only, no duplicates.
    pub expertise: Vec<String>,
    /// Topics the user has sought recommendations or comparisons for.
    pub interests: Vec<String>,
    pub role: Option<String>,
    pub learning_style: Option<String>,
    pub preferred_language: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            expertise: Vec::new(),
            interests: Vec::new(),
            role: None,
            learning_style: None,
            preferred_language: "en".to_string(),
        }
    }
}

/// Rolling summary of where the conversation currently stands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurrentContext {
    pub last_intent: Option<Intent>,
    pub last_state: Option<ConversationState>,
    pub active_topics: Vec<String>,
    pub active_entities: Vec<String>,
    pub turn_count: usize,
}

/// Shallow update for [`CurrentContext`]. Only `Some` fields overwrite.
#[derive(Debug, Clone, Default)]
pub struct ContextPatch {
    pub last_intent: Option<Intent>,
    pub last_state: Option<ConversationState>,
    pub active_topics: Option<Vec<String>>,
    pub active_entities: Option<Vec<String>>,
    pub turn_count: Option<usize>,
}

impl CurrentContext {
    /// Merge a patch into this context.
    pub fn apply(&mut self, patch: ContextPatch) {
        if let Some(intent) = patch.last_intent {
            self.last_intent = Some(intent);
        }
        if let Some(state) = patch.last_state {
            self.last_state = Some(state);
        }
        if let Some(topics) = patch.active_topics {
            self.active_topics = topics;
        }
        if let Some(entities) = patch.active_entities {
            self.active_entities = entities;
        }
        if let Some(count) = patch.turn_count {
            self.turn_count = count;
        }
    }
}

/// One persisted query/response exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub query: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub context: TurnContext,
    pub intent: Intent,
    pub sentiment: Sentiment,
    pub topics: Vec<String>,
    pub entities: Vec<String>,
}

// =============================================================================
// Context forwarded to the response service
// =============================================================================

/// Condensed view of an earlier turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnDigest {
    pub query: String,
    pub response: String,
    pub intent: Intent,
    pub timestamp: DateTime<Utc>,
}

impl From<&ConversationTurn> for TurnDigest {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            query: turn.query.clone(),
            response: turn.response.clone(),
            intent: turn.intent,
            timestamp: turn.timestamp,
        }
    }
}

/// Intent-specific slots extracted from the analysis and profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntentFocus {
    Learning {
        subjects: Vec<String>,
        /// Subjects the user has already studied.
        known: Vec<String>,
    },
    Troubleshooting {
        affected: Vec<String>,
    },
    SearchHelp {
        terms: Vec<String>,
    },
    ContentCreation {
        subjects: Vec<String>,
    },
    Recommendation {
        interests: Vec<String>,
    },
    Comparison {
        candidates: Vec<String>,
    },
    Analysis {
        subjects: Vec<String>,
    },
    WorkflowAutomation {
        systems: Vec<String>,
    },
    General,
}

impl IntentFocus {
    /// Build the focus record for an analysed message.
    pub fn build(analysis: &Analysis, profile: &UserProfile) -> Self {
        let topics = analysis.topics.clone();
        let entities = analysis.entities.clone();
        // Entities are more specific than topics when both are present.
        let specific = if entities.is_empty() {
            topics.clone()
        } else {
            entities.clone()
        };

        match analysis.intent {
            Intent::Learning => {
                let known = topics
                    .iter()
                    .filter(|t| profile.expertise.contains(t))
                    .cloned()
                    .collect();
                IntentFocus::Learning {
                    subjects: topics,
                    known,
                }
            }
            Intent::Troubleshooting => IntentFocus::Troubleshooting { affected: specific },
            Intent::SearchHelp => {
                let mut terms = topics;
                terms.extend(entities);
                IntentFocus::SearchHelp { terms }
            }
            Intent::ContentCreation => IntentFocus::ContentCreation { subjects: topics },
            Intent::Recommendation => {
                let mut interests = profile.interests.clone();
                for topic in topics {
                    if !interests.contains(&topic) {
                        interests.push(topic);
                    }
                }
                IntentFocus::Recommendation { interests }
            }
            Intent::Comparison => IntentFocus::Comparison {
                candidates: specific,
            },
            Intent::Analysis => IntentFocus::Analysis { subjects: topics },
            Intent::WorkflowAutomation => IntentFocus::WorkflowAutomation { systems: specific },
            Intent::General => IntentFocus::General,
        }
    }
}

/// Trailing sentiments carried into each turn's context.
pub const RECENT_SENTIMENT_LIMIT: usize = 10;

/// Everything the response service is told about the current turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnContext {
    pub intent: Intent,
    pub sentiment: Sentiment,
    pub topics: Vec<String>,
    pub entities: Vec<String>,
    pub conversation_state: ConversationState,
    pub focus: IntentFocus,
    pub recent_turns: Vec<TurnDigest>,
    pub recent_sentiments: Vec<Sentiment>,
    pub user_profile: UserProfile,
    pub topic_frequency: BTreeMap<String, u32>,
    pub conversation_summary: String,
    pub timestamp: DateTime<Utc>,
}

impl TurnContext {
    /// Combine memory, classifier output, and the turn's timestamp.
    ///
    /// `recent_turn_limit` bounds how many trailing history turns are
    /// included. At most [`RECENT_SENTIMENT_LIMIT`] trailing sentiments are
    /// included.
    pub fn assemble(
        analysis: &Analysis,
        state: ConversationState,
        memory: &ChatMemory,
        recent_turn_limit: usize,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let history = &memory.conversation_history;
        let skip = history.len().saturating_sub(recent_turn_limit);
        let sentiments = &memory.sentiment_history;
        let sentiment_skip = sentiments.len().saturating_sub(RECENT_SENTIMENT_LIMIT);

        Self {
            intent: analysis.intent,
            sentiment: analysis.sentiment,
            topics: analysis.topics.clone(),
            entities: analysis.entities.clone(),
            conversation_state: state,
            focus: IntentFocus::build(analysis, &memory.user_profile),
            recent_turns: history.iter().skip(skip).map(TurnDigest::from).collect(),
            recent_sentiments: sentiments[sentiment_skip..].to_vec(),
            user_profile: memory.user_profile.clone(),
            topic_frequency: memory.topic_frequency.clone(),
            conversation_summary: memory.conversation_summary.clone(),
            timestamp,
        }
    }
}

// =============================================================================
// Replies and UI messages
// =============================================================================

/// A piece of content the response service considers related.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedContent {
    pub id: String,
    pub title: String,
    pub relevance: f32,
}

/// The composed reply for one user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    pub response: String,
    pub confidence: f32,
    pub intent: Intent,
    pub sentiment: Sentiment,
    pub suggestions: Vec<String>,
    pub related_content: Vec<RelatedContent>,
    pub follow_up_questions: Vec<String>,
    pub actionable_insights: Vec<String>,
    pub conversation_state: ConversationState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// An entry in the visible, session-scoped message list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_content: Option<Vec<RelatedContent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_questions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actionable_insights: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_state: Option<ConversationState>,
}

impl Message {
    fn plain(role: Role, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            suggestions: None,
            related_content: None,
            confidence: None,
            intent: None,
            sentiment: None,
            follow_up_questions: None,
            actionable_insights: None,
            conversation_state: None,
        }
    }

    /// A message typed by the user.
    pub fn user(content: &str) -> Self {
        Self::plain(Role::User, content)
    }

    /// An assistant message without reply metadata (used for fallbacks).
    pub fn assistant(content: &str) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// An assistant message carrying every field of a composed reply.
    pub fn from_reply(reply: &AiResponse) -> Self {
        Self {
            suggestions: Some(reply.suggestions.clone()),
            related_content: Some(reply.related_content.clone()),
            confidence: Some(reply.confidence),
            intent: Some(reply.intent),
            sentiment: Some(reply.sentiment),
            follow_up_questions: Some(reply.follow_up_questions.clone()),
            actionable_insights: Some(reply.actionable_insights.clone()),
            conversation_state: Some(reply.conversation_state),
            ..Self::plain(Role::Assistant, &reply.response)
        }
    }
}
