//! Message classification.
//!
//! Deterministic keyword classifiers for intent, sentiment, topics, and
//! named entities. Each is exposed behind the [`Classifier`] strategy trait
//! so a different implementation can be plugged into [`MessageAnalyzer`]
//! without touching the rest of the engine.

use std::sync::LazyLock;

use regex::RegexSet;

use crate::types::{Analysis, Intent, Sentiment};

/// A pure function from message text to a label.
pub trait Classifier: Send + Sync {
    type Label;

    fn classify(&self, message: &str) -> Self::Label;
}

// =============================================================================
// Keyword tables
// =============================================================================

struct IntentRule {
    intent: Intent,
    weight: f32,
    keywords: &'static [&'static str],
}

/// Scored intent categories, in tie-break order. `General` has no rule.
static INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::Learning,
        weight: 1.3,
        keywords: &[
            "learn", "explain", "what is", "what are", "how does", "understand",
            "teach me", "introduction", "basics", "concept", "meaning of",
        ],
    },
    IntentRule {
        intent: Intent::Troubleshooting,
        weight: 1.5,
        keywords: &[
            "error", "bug", "issue", "problem", "not working", "broken", "fix",
            "fail", "crash", "debug", "doesn't work",
        ],
    },
    IntentRule {
        intent: Intent::SearchHelp,
        weight: 1.1,
        keywords: &[
            "find", "search", "where", "look for", "looking for", "locate", "show me",
        ],
    },
    IntentRule {
        intent: Intent::ContentCreation,
        weight: 1.2,
        keywords: &[
            "write", "create", "draft", "generate", "compose", "blog post",
            "copywriting", "outline",
        ],
    },
    IntentRule {
        intent: Intent::Recommendation,
        weight: 1.2,
        keywords: &[
            "recommend", "suggest", "best", "should i", "which one", "advice", "ideal",
        ],
    },
    IntentRule {
        intent: Intent::Comparison,
        weight: 1.25,
        keywords: &[
            "compare", "comparison", " vs", "versus", "difference", "better than",
            "alternative", "pros and cons",
        ],
    },
    IntentRule {
        intent: Intent::Analysis,
        weight: 1.15,
        keywords: &[
            "analyze", "analyse", "analysis", "metric", "performance", "report",
            "trend", "statistic", "measure",
        ],
    },
    IntentRule {
        intent: Intent::WorkflowAutomation,
        weight: 1.1,
        keywords: &[
            "workflow", "automate", "automation", "agent", "schedule", "pipeline",
            "integrate", "trigger",
        ],
    },
];

static POSITIVE_WORDS: &[&str] = &[
    "great", "love", "thank", "awesome", "excellent", "good", "helpful", "perfect",
    "amazing", "nice", "happy", "appreciate", "wonderful", "fantastic",
];

static NEGATIVE_WORDS: &[&str] = &[
    "bad", "hate", "terrible", "awful", "frustrat", "annoy", "confus", "wrong",
    "broken", "useless", "disappoint", "stuck", "horrible", "worst", "slow",
];

/// Topic name and the keywords that signal it.
static TOPICS: &[(&str, &[&str])] = &[
    (
        "storyblok",
        &["storyblok", "headless", "cms", "content model", "bloks", "visual editor"],
    ),
    (
        "api",
        &["api", "endpoint", "graphql", "webhook", "sdk", "rest"],
    ),
    (
        "frontend",
        &["react", "vue", "next.js", "nuxt", "svelte", "angular", "frontend", "javascript"],
    ),
    (
        "seo",
        &["seo", "search engine", "meta tag", "sitemap", "ranking"],
    ),
    (
        "performance",
        &["performance", "speed", "cache", "caching", "latency", "optimiz", "load time", "slow"],
    ),
    (
        "content",
        &["content", "article", "blog", "editorial", "publish"],
    ),
    (
        "ai",
        &["artificial intelligence", "machine learning", "llm", "gpt", "chatbot", "ai-powered"],
    ),
    (
        "deployment",
        &["deploy", "hosting", "vercel", "netlify", "production", "ci/cd"],
    ),
    (
        "localization",
        &["translat", "multilingual", "locale", "i18n", "localiz"],
    ),
    (
        "analytics",
        &["analytics", "dashboard", "tracking", "conversion", "metric"],
    ),
];

/// Canonical entity names, matched case-insensitively.
static KNOWN_ENTITIES: &[&str] = &[
    "Storyblok",
    "React",
    "Vue",
    "Next.js",
    "Nuxt",
    "Gatsby",
    "Svelte",
    "Angular",
    "Algolia",
    "GraphQL",
    "REST API",
    "Vercel",
    "Netlify",
    "JavaScript",
    "TypeScript",
    "Node.js",
    "SEO",
    "OpenAI",
    "Webhook",
];

static ENTITY_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(
        KNOWN_ENTITIES
            .iter()
            .map(|e| format!("(?i){}", regex::escape(e))),
    )
    .expect("Invalid entity pattern")
});

/// Number of distinct keywords appearing in an already lower-cased message.
fn keyword_hits(lower: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| lower.contains(*k)).count()
}

// =============================================================================
// Strategies
// =============================================================================

/// Weighted keyword intent classifier.
///
/// Each category scores `hits * weight`; the strictly highest score wins,
/// earlier categories win ties, and an all-zero board yields `General`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentClassifier;

impl KeywordIntentClassifier {
    /// Score every scored category, in declaration order.
    pub fn scores(&self, message: &str) -> Vec<(Intent, f32)> {
        let lower = message.to_lowercase();
        INTENT_RULES
            .iter()
            .map(|rule| {
                (
                    rule.intent,
                    keyword_hits(&lower, rule.keywords) as f32 * rule.weight,
                )
            })
            .collect()
    }
}

impl Classifier for KeywordIntentClassifier {
    type Label = Intent;

    fn classify(&self, message: &str) -> Intent {
        let mut best = Intent::General;
        let mut best_score = 0.0_f32;
        for (intent, score) in self.scores(message) {
            if score > best_score {
                best = intent;
                best_score = score;
            }
        }
        best
    }
}

/// Positive-versus-negative lexicon counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconSentimentClassifier;

impl Classifier for LexiconSentimentClassifier {
    type Label = Sentiment;

    fn classify(&self, message: &str) -> Sentiment {
        let lower = message.to_lowercase();
        let positive = keyword_hits(&lower, POSITIVE_WORDS);
        let negative = keyword_hits(&lower, NEGATIVE_WORDS);
        match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }
}

/// Multi-label topic detector: every topic with at least one keyword hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordTopicExtractor;

impl Classifier for KeywordTopicExtractor {
    type Label = Vec<String>;

    fn classify(&self, message: &str) -> Vec<String> {
        let lower = message.to_lowercase();
        TOPICS
            .iter()
            .filter(|(_, keywords)| keyword_hits(&lower, keywords) > 0)
            .map(|(topic, _)| topic.to_string())
            .collect()
    }
}

/// Known-entity matcher; output keeps canonical casing and list order.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityExtractor;

impl Classifier for EntityExtractor {
    type Label = Vec<String>;

    fn classify(&self, message: &str) -> Vec<String> {
        ENTITY_SET
            .matches(message)
            .into_iter()
            .map(|i| KNOWN_ENTITIES[i].to_string())
            .collect()
    }
}

// =============================================================================
// Free functions over the default strategies
// =============================================================================

pub fn classify_intent(message: &str) -> Intent {
    KeywordIntentClassifier.classify(message)
}

pub fn classify_sentiment(message: &str) -> Sentiment {
    LexiconSentimentClassifier.classify(message)
}

pub fn extract_topics(message: &str) -> Vec<String> {
    KeywordTopicExtractor.classify(message)
}

pub fn extract_entities(message: &str) -> Vec<String> {
    EntityExtractor.classify(message)
}

// =============================================================================
// MessageAnalyzer
// =============================================================================

/// Runs one strategy per label over a message.
pub struct MessageAnalyzer {
    intent: Box<dyn Classifier<Label = Intent>>,
    sentiment: Box<dyn Classifier<Label = Sentiment>>,
    topics: Box<dyn Classifier<Label = Vec<String>>>,
    entities: Box<dyn Classifier<Label = Vec<String>>>,
}

impl Default for MessageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageAnalyzer {
    /// Analyzer wired to the keyword strategies.
    pub fn new() -> Self {
        Self {
            intent: Box::new(KeywordIntentClassifier),
            sentiment: Box::new(LexiconSentimentClassifier),
            topics: Box::new(KeywordTopicExtractor),
            entities: Box::new(EntityExtractor),
        }
    }

    pub fn with_intent_classifier(
        mut self,
        classifier: impl Classifier<Label = Intent> + 'static,
    ) -> Self {
        self.intent = Box::new(classifier);
        self
    }

    pub fn with_sentiment_classifier(
        mut self,
        classifier: impl Classifier<Label = Sentiment> + 'static,
    ) -> Self {
        self.sentiment = Box::new(classifier);
        self
    }

    pub fn with_topic_extractor(
        mut self,
        classifier: impl Classifier<Label = Vec<String>> + 'static,
    ) -> Self {
        self.topics = Box::new(classifier);
        self
    }

    pub fn with_entity_extractor(
        mut self,
        classifier: impl Classifier<Label = Vec<String>> + 'static,
    ) -> Self {
        self.entities = Box::new(classifier);
        self
    }

    pub fn analyze(&self, message: &str) -> Analysis {
        Analysis {
            intent: self.intent.classify(message),
            sentiment: self.sentiment.classify(message),
            topics: self.topics.classify(message),
            entities: self.entities.classify(message),
        }
    }
}
