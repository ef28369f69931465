//! Agent Behavior Abstraction
//!
//! The conversational agent loop is an external collaborator; this trait is
//! the narrow seam the CLI talks through.

use async_trait::async_trait;

use crate::Result;

/// Maps one user utterance to one natural-language reply, calling tools as
/// it sees fit. Conversation state, if any, lives behind this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatAgent: Send + Sync {
    async fn respond(&self, message: &str) -> Result<String>;

    /// Short identifier for logs.
    fn behavior_type(&self) -> &'static str;
}
