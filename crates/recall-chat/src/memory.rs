//! Persisted conversation memory.
//!
//! [`MemoryStore`] owns the session's [`ChatMemory`], applies every
//! mutation through its API, and rewrites the whole document to the
//! key-value store after each one. Persistence is best-effort: a failed
//! write is logged and the in-memory state stays authoritative.

use std::sync::Arc;

use recall_core::config::ChatConfig;
use recall_storage::KeyValueStore;
use tracing::{debug, info, warn};

use crate::types::{ChatMemory, ContextPatch, ConversationTurn, CurrentContext, Intent, Sentiment};

/// Default key for the serialized memory document.
pub const MEMORY_KEY: &str = "recall_chat_memory";

pub struct MemoryStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    history_limit: usize,
    sentiment_limit: usize,
    memory: ChatMemory,
}

impl MemoryStore {
    /// Load memory from `store`, falling back to an empty memory when the
    /// key is absent, unreadable, or holds an invalid document.
    pub fn load(store: Arc<dyn KeyValueStore>, key: &str, config: &ChatConfig) -> Self {
        let memory = match store.get(key) {
            Ok(Some(raw)) => match serde_json::from_str::<ChatMemory>(&raw) {
                Ok(memory) => {
                    debug!(
                        turns = memory.conversation_history.len(),
                        "Chat memory restored"
                    );
                    memory
                }
                Err(e) => {
                    warn!(error = %e, "Stored chat memory is invalid; starting fresh");
                    ChatMemory::default()
                }
            },
            Ok(None) => ChatMemory::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read chat memory; starting fresh");
                ChatMemory::default()
            }
        };

        let mut loaded = Self {
            store,
            key: key.to_string(),
            history_limit: config.history_limit,
            sentiment_limit: config.sentiment_limit,
            memory,
        };
        if loaded.enforce_limits() {
            loaded.persist();
        }
        loaded
    }

    pub fn memory(&self) -> &ChatMemory {
        &self.memory
    }

    // -----------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------

    /// Append a turn, evicting the oldest beyond the history limit.
    pub fn append_turn(&mut self, turn: ConversationTurn) {
        self.memory.conversation_history.push(turn);
        self.enforce_limits();
        self.persist();
    }

    pub fn bump_topics(&mut self, topics: &[String]) {
        for topic in topics {
            *self.memory.topic_frequency.entry(topic.clone()).or_insert(0) += 1;
        }
        self.persist();
    }

    /// Record a sentiment, evicting the oldest beyond the sentiment limit.
    pub fn push_sentiment(&mut self, sentiment: Sentiment) {
        self.memory.sentiment_history.push(sentiment);
        self.enforce_limits();
        self.persist();
    }

    /// Learning turns add their topics to the user's expertise.
    pub fn maybe_learn_expertise(&mut self, intent: Intent, topics: &[String]) {
        if intent != Intent::Learning {
            return;
        }
        let expertise = &mut self.memory.user_profile.expertise;
        for topic in topics {
            if !expertise.contains(topic) {
                expertise.push(topic.clone());
            }
        }
        self.persist();
    }

    /// Recommendation and comparison turns add their topics to the user's interests.
    pub fn maybe_learn_interests(&mut self, intent: Intent, topics: &[String]) {
        if !matches!(intent, Intent::Recommendation | Intent::Comparison) {
            return;
        }
        let interests = &mut self.memory.user_profile.interests;
        for topic in topics {
            if !interests.contains(topic) {
                interests.push(topic.clone());
            }
        }
        self.persist();
    }

    pub fn update_context(&mut self, patch: ContextPatch) {
        self.memory.current_context.apply(patch);
        self.persist();
    }

    pub fn clear_context(&mut self) {
        self.memory.current_context = CurrentContext::default();
        self.persist();
    }

    pub fn set_preference(&mut self, key: &str, value: serde_json::Value) {
        self.memory.user_preferences.insert(key.to_string(), value);
        self.persist();
    }

    /// Rebuild the one-line conversation summary from the counters.
    pub fn refresh_summary(&mut self) {
        let turns = self.memory.conversation_history.len();
        let topics = self
            .top_topics(3)
            .into_iter()
            .map(|(topic, count)| format!("{} ({})", topic, count))
            .collect::<Vec<_>>();

        let mut summary = format!(
            "{} turn{} in memory",
            turns,
            if turns == 1 { "" } else { "s" }
        );
        if !topics.is_empty() {
            summary.push_str(&format!("; frequent topics: {}", topics.join(", ")));
        }
        summary.push_str(&format!("; recent mood: {}", self.dominant_sentiment()));

        self.memory.conversation_summary = summary;
        self.persist();
    }

    /// Replace everything with an empty memory and delete the stored document.
    pub fn reset(&mut self) {
        self.memory = ChatMemory::default();
        if let Err(e) = self.store.remove(&self.key) {
            warn!(error = %e, key = %self.key, "Failed to delete persisted chat memory");
        }
        info!("Chat memory reset");
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// The `n` most frequent topics, ties broken alphabetically.
    pub fn top_topics(&self, n: usize) -> Vec<(String, u32)> {
        let mut topics: Vec<(String, u32)> = self
            .memory
            .topic_frequency
            .iter()
            .map(|(topic, count)| (topic.clone(), *count))
            .collect();
        topics.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        topics.truncate(n);
        topics
    }

    /// The most common recent sentiment; neutral when empty or tied.
    pub fn dominant_sentiment(&self) -> Sentiment {
        let count = |s: Sentiment| {
            self.memory
                .sentiment_history
                .iter()
                .filter(|h| **h == s)
                .count()
        };
        let positive = count(Sentiment::Positive);
        let negative = count(Sentiment::Negative);
        let neutral = count(Sentiment::Neutral);

        if positive > negative && positive > neutral {
            Sentiment::Positive
        } else if negative > positive && negative > neutral {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// Every remembered query, oldest first.
    pub fn past_queries(&self) -> Vec<String> {
        self.memory
            .conversation_history
            .iter()
            .map(|turn| turn.query.clone())
            .collect()
    }

    /// Drop the oldest turns and sentiments beyond the configured limits.
    /// Returns whether anything was evicted.
    fn enforce_limits(&mut self) -> bool {
        let history = &mut self.memory.conversation_history;
        let turn_excess = history.len().saturating_sub(self.history_limit);
        history.drain(..turn_excess);

        let sentiments = &mut self.memory.sentiment_history;
        let sentiment_excess = sentiments.len().saturating_sub(self.sentiment_limit);
        sentiments.drain(..sentiment_excess);

        if turn_excess + sentiment_excess > 0 {
            debug!(
                turns = turn_excess,
                sentiments = sentiment_excess,
                "Evicted entries beyond memory limits"
            );
        }
        turn_excess + sentiment_excess > 0
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.memory) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize chat memory");
                return;
            }
        };
        if let Err(e) = self.store.set(&self.key, &raw) {
            warn!(error = %e, key = %self.key, "Failed to persist chat memory");
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("key", &self.key)
            .field("turns", &self.memory.conversation_history.len())
            .finish()
    }
}
