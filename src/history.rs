//! External conversation stores consulted by the decision engine.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::ChatMessage;

/// Persistent conversation history for an agent.
#[async_trait]
pub trait ChatMessageHistory: Send + Sync {
    /// All stored messages, oldest first.
    async fn messages(&self) -> Result<Vec<ChatMessage>>;

    async fn add_message(&self, message: ChatMessage) -> Result<()>;

    async fn add_user_message(&self, text: &str) -> Result<()> {
        self.add_message(ChatMessage::human(text)).await
    }

    async fn add_ai_message(&self, text: &str) -> Result<()> {
        self.add_message(ChatMessage::ai(text)).await
    }

    async fn clear(&self) -> Result<()>;
}

/// History kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryChatHistory {
    messages: RwLock<Vec<ChatMessage>>,
}

impl InMemoryChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing messages.
    pub fn with_messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages: RwLock::new(messages),
        }
    }
}

#[async_trait]
impl ChatMessageHistory for InMemoryChatHistory {
    async fn messages(&self) -> Result<Vec<ChatMessage>> {
        Ok(self.messages.read().await.clone())
    }

    async fn add_message(&self, message: ChatMessage) -> Result<()> {
        self.messages.write().await.push(message);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.messages.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_messages_in_order_and_clears() {
        let history = InMemoryChatHistory::new();
        history.add_user_message("What's the weather?").await.unwrap();
        history.add_ai_message("Sunny.").await.unwrap();

        assert_eq!(
            history.messages().await.unwrap(),
            vec![ChatMessage::human("What's the weather?"), ChatMessage::ai("Sunny.")]
        );

        history.clear().await.unwrap();
        assert!(history.messages().await.unwrap().is_empty());
    }
}
