use serde::{Deserialize, Serialize};
use tower_sessions::Session;

const FLASH_KEY: &str = "_flash_messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Error => "error",
        }
    }
}

/// One-shot message shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

/// Flash queue stored in the visitor's session.
///
/// Session failures are logged and otherwise ignored: losing a message must
/// never fail the request that produced it.
#[derive(Clone)]
pub struct Flash {
    session: Session,
}

impl Flash {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub async fn success(&self, text: impl Into<String>) {
        self.push(FlashLevel::Success, text.into()).await;
    }

    pub async fn info(&self, text: impl Into<String>) {
        self.push(FlashLevel::Info, text.into()).await;
    }

    pub async fn error(&self, text: impl Into<String>) {
        self.push(FlashLevel::Error, text.into()).await;
    }

    async fn push(&self, level: FlashLevel, text: String) {
        let mut queue = self.pending().await;
        queue.push(FlashMessage { level, text });
        if let Err(e) = self.session.insert(FLASH_KEY, queue).await {
            tracing::warn!("Failed to store flash message: {}", e);
        }
    }

    async fn pending(&self) -> Vec<FlashMessage> {
        match self.session.get::<Vec<FlashMessage>>(FLASH_KEY).await {
            Ok(queue) => queue.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to read flash messages: {}", e);
                Vec::new()
            }
        }
    }

    /// Remove and return every queued message
    pub async fn take(&self) -> Vec<FlashMessage> {
        match self.session.remove::<Vec<FlashMessage>>(FLASH_KEY).await {
            Ok(queue) => queue.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to read flash messages: {}", e);
                Vec::new()
            }
        }
    }
}
