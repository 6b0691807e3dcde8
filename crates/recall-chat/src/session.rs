//! Chat session façade.
//!
//! [`ChatSession`] is the entry point for UI layers. It owns the visible
//! message list, the loading flag, and the last raw error, and recovers
//! every orchestrator failure into a friendly assistant message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use recall_core::config::RecallConfig;
use recall_storage::KeyValueStore;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ChatError, ServiceFailure};
use crate::orchestrator::ChatOrchestrator;
use crate::service::ResponseService;
use crate::types::{AiResponse, ChatMemory, Message};

/// Why a send was dropped without doing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Blank,
    AlreadyLoading,
}

/// Result of [`ChatSession::send_message`].
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The assistant answered; the reply was appended to the message list.
    Replied(Box<AiResponse>),
    /// The turn failed; a fallback message was appended instead.
    Failed(ServiceFailure),
    /// Nothing happened.
    Ignored(IgnoreReason),
}

#[derive(Debug, Default)]
struct SessionState {
    messages: Vec<Message>,
    error: Option<String>,
    conversation_id: Option<Uuid>,
}

/// Clears the loading flag when a send finishes, however it finishes.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ChatSession {
    orchestrator: ChatOrchestrator,
    state: Mutex<SessionState>,
    loading: AtomicBool,
}

impl ChatSession {
    pub fn new(orchestrator: ChatOrchestrator) -> Self {
        Self {
            orchestrator,
            state: Mutex::new(SessionState::default()),
            loading: AtomicBool::new(false),
        }
    }

    /// Build a session from configuration, a response service, and a store.
    pub fn from_config(
        config: &RecallConfig,
        service: Arc<dyn ResponseService>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self::new(ChatOrchestrator::new(
            service,
            store,
            &config.storage.memory_key,
            config.chat.clone(),
        ))
    }

    /// Send a user message and record the outcome in the message list.
    ///
    /// Blank input and calls made while another send is in flight are
    /// dropped silently.
    pub async fn send_message(&self, content: &str) -> Result<SendOutcome, ChatError> {
        if content.trim().is_empty() {
            return Ok(SendOutcome::Ignored(IgnoreReason::Blank));
        }
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Send ignored; another message is in flight");
            return Ok(SendOutcome::Ignored(IgnoreReason::AlreadyLoading));
        }
        let _loading = LoadingGuard(&self.loading);

        {
            let mut state = self.lock_state()?;
            state.messages.push(Message::user(content));
            state.error = None;
        }

        let result = self.orchestrator.generate(content).await;

        let mut state = self.lock_state()?;
        match result {
            Ok(reply) => {
                state.messages.push(Message::from_reply(&reply));
                state.conversation_id.get_or_insert_with(Uuid::new_v4);
                Ok(SendOutcome::Replied(Box::new(reply)))
            }
            Err(e) => {
                let failure = e.failure();
                state
                    .messages
                    .push(Message::assistant(failure.fallback_message()));
                state.error = Some(e.raw_message());
                Ok(SendOutcome::Failed(failure))
            }
        }
    }

    /// Empty the visible message list. Memory is untouched.
    pub fn clear_messages(&self) -> Result<(), ChatError> {
        let mut state = self.lock_state()?;
        state.messages.clear();
        state.error = None;
        state.conversation_id = None;
        info!("Chat messages cleared");
        Ok(())
    }

    /// Forget everything the engine has learned.
    pub fn clear_memory(&self) -> Result<(), ChatError> {
        self.orchestrator.reset_memory()
    }

    pub fn messages(&self) -> Result<Vec<Message>, ChatError> {
        Ok(self.lock_state()?.messages.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// The raw message of the last failed send, if the latest send failed.
    pub fn error(&self) -> Result<Option<String>, ChatError> {
        Ok(self.lock_state()?.error.clone())
    }

    pub fn conversation_id(&self) -> Result<Option<Uuid>, ChatError> {
        Ok(self.lock_state()?.conversation_id)
    }

    pub fn memory(&self) -> Result<ChatMemory, ChatError> {
        self.orchestrator.memory_snapshot()
    }

    pub fn orchestrator(&self) -> &ChatOrchestrator {
        &self.orchestrator
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, SessionState>, ChatError> {
        self.state
            .lock()
            .map_err(|e| ChatError::Storage(format!("session lock poisoned: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use recall_core::config::ChatConfig;
    use recall_storage::InMemoryStore;

    use crate::error::ServiceError;
    use crate::memory::MEMORY_KEY;
    use crate::service::{ResponseOptions, ServiceReply, TemplateResponder};
    use crate::types::{Intent, Role};

    struct FailingService(&'static str);

    #[async_trait]
    impl ResponseService for FailingService {
        async fn generate_contextual_response(
            &self,
            _message: &str,
            _options: &ResponseOptions,
        ) -> Result<ServiceReply, ServiceError> {
            Err(ServiceError::new(self.0))
        }
    }

    fn make_session(service: Arc<dyn ResponseService>) -> ChatSession {
        ChatSession::new(ChatOrchestrator::new(
            service,
            Arc::new(InMemoryStore::new()),
            MEMORY_KEY,
            ChatConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_send_appends_user_and_assistant() {
        let session = make_session(Arc::new(TemplateResponder));
        let outcome = session.send_message("What is Storyblok?").await.unwrap();

        let reply = match outcome {
            SendOutcome::Replied(reply) => reply,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(reply.intent, Intent::Learning);

        let messages = session.messages().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "What is Storyblok?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, reply.response);
        assert_eq!(messages[1].intent, Some(Intent::Learning));
        assert!(!session.is_loading());
        assert_eq!(session.error().unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_messages_are_ignored() {
        let session = make_session(Arc::new(TemplateResponder));
        for blank in ["", "   ", "\n\t"] {
            assert_eq!(
                session.send_message(blank).await.unwrap(),
                SendOutcome::Ignored(IgnoreReason::Blank)
            );
        }
        assert!(session.messages().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_appends_fallback_and_records_error() {
        let session = make_session(Arc::new(FailingService("Service is busy")));
        let outcome = session.send_message("hello").await.unwrap();
        assert_eq!(outcome, SendOutcome::Failed(ServiceFailure::RateLimited));

        let messages = session.messages().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[1].content,
            ServiceFailure::RateLimited.fallback_message()
        );
        assert_eq!(messages[1].intent, None);
        assert_eq!(session.error().unwrap().as_deref(), Some("Service is busy"));
        assert!(!session.is_loading());
        assert_eq!(session.conversation_id().unwrap(), None);
    }

    #[tokio::test]
    async fn test_too_long_message_uses_generic_apology() {
        let session = make_session(Arc::new(TemplateResponder));
        let long = "word ".repeat(1000);
        let outcome = session.send_message(&long).await.unwrap();
        assert_eq!(outcome, SendOutcome::Failed(ServiceFailure::Unknown));

        let messages = session.messages().unwrap();
        assert_eq!(
            messages[1].content,
            ServiceFailure::Unknown.fallback_message()
        );
        assert!(session.memory().unwrap().conversation_history.is_empty());
    }

    #[tokio::test]
    async fn test_successful_send_clears_previous_error() {
        let session = make_session(Arc::new(TemplateResponder));
        session.send_message(&"x".repeat(5000)).await.unwrap();
        assert!(session.error().unwrap().is_some());

        session.send_message("hello").await.unwrap();
        assert_eq!(session.error().unwrap(), None);
    }

    #[tokio::test]
    async fn test_conversation_id_lifecycle() {
        let session = make_session(Arc::new(TemplateResponder));
        assert_eq!(session.conversation_id().unwrap(), None);

        session.send_message("hello").await.unwrap();
        let first = session.conversation_id().unwrap();
        assert!(first.is_some());

        session.send_message("and again").await.unwrap();
        assert_eq!(session.conversation_id().unwrap(), first);

        session.clear_messages().unwrap();
        assert_eq!(session.conversation_id().unwrap(), None);
        assert!(session.messages().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_messages_keeps_memory() {
        let session = make_session(Arc::new(TemplateResponder));
        session.send_message("What is Storyblok?").await.unwrap();
        session.clear_messages().unwrap();
        assert_eq!(session.memory().unwrap().conversation_history.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_memory_keeps_messages() {
        let session = make_session(Arc::new(TemplateResponder));
        session.send_message("What is Storyblok?").await.unwrap();
        session.clear_memory().unwrap();
        assert_eq!(session.memory().unwrap(), ChatMemory::default());
        assert_eq!(session.messages().unwrap().len(), 2);
    }
}
