//! Chatbot Agent Implementation
//!
//! Interactive agent backed by a Rig agent with the cluster tools attached.

use async_trait::async_trait;
use rig::agent::{Agent, AgentBuilder};
use rig::completion::{CompletionModel, Message, Prompt};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::behavior::ChatAgent;
use super::tools::{AgentTool, ToolRegistry};
use crate::config::LlmConfig;
use crate::{Error, Result};

pub const SYSTEM_PROMPT: &str = "You are KubeBoy, a helpful Kubernetes assistant that helps users \
understand and explore their Kubernetes cluster.

You have read-only tools for pods (get_pods), deployments (get_deployments), services \
(get_services), nodes (get_nodes), namespaces (get_namespaces), events (get_events) and a \
cluster summary (get_cluster_summary).

Guidelines:
1. You can only observe the cluster. You cannot change anything in it.
2. Always use the appropriate tool to get current information instead of guessing.
3. Pass the namespace parameter when the user names one.
4. Point out problems you see, such as failed pods or nodes that are not ready.
5. Answer in a readable form (short lists or tables), never raw JSON.
6. If a tool reports an error, explain it plainly and suggest what to check next.
7. For troubleshooting, look at events and pod status.";

/// Chatbot agent for interactive conversations
pub struct RigChatbot<M: CompletionModel> {
    agent: Agent<M>,
    history: Mutex<Vec<Message>>,
    max_turns: usize,
    timeout: Duration,
}

impl<M: CompletionModel> RigChatbot<M> {
    pub fn new(agent: Agent<M>, config: &LlmConfig) -> Self {
        Self {
            agent,
            history: Mutex::new(Vec::new()),
            max_turns: config.max_turns,
            timeout: config.timeout,
        }
    }

    /// Attach the preamble, sampling settings and every registered tool.
    pub fn configure(
        builder: AgentBuilder<M>,
        config: &LlmConfig,
        registry: &Arc<ToolRegistry>,
    ) -> AgentBuilder<M> {
        let mut builder = builder
            .preamble(SYSTEM_PROMPT)
            .temperature(config.temperature)
            .max_tokens(config.max_tokens);

        for tool in AgentTool::all(registry) {
            debug!("Adding tool to chatbot: {}", rig::tool::Tool::name(&tool));
            builder = builder.tool(tool);
        }
        builder
    }
}

#[async_trait]
impl<M: CompletionModel> ChatAgent for RigChatbot<M> {
    async fn respond(&self, message: &str) -> Result<String> {
        info!("Processing chat message: {}", message);

        let mut history = self.history.lock().await;
        // Rig appends to the history as the turn progresses. A turn that fails
        // part way can leave a tool call without its result, so it is rolled back.
        let mark = history.len();
        let request = self
            .agent
            .prompt(message)
            .with_history(&mut *history)
            .multi_turn(self.max_turns);
        let outcome = tokio::time::timeout(self.timeout, request.into_future()).await;

        match outcome {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => {
                warn!("Model request failed: {:?}", e);
                history.truncate(mark);
                Err(Error::UpstreamModel(e.to_string()))
            }
            Err(_) => {
                warn!("Model gave no reply within {}s", self.timeout.as_secs());
                history.truncate(mark);
                Err(Error::UpstreamModel(format!(
                    "no reply within {}s",
                    self.timeout.as_secs()
                )))
            }
        }
    }

    fn behavior_type(&self) -> &'static str {
        "chatbot"
    }
}
