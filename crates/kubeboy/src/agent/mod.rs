//! LLM Agent Module
//!
//! Connects the cluster query tools to a conversational agent.

pub mod behavior;
pub mod chatbot;
pub mod mock;
pub mod provider;
pub mod tools;

pub use behavior::ChatAgent;
pub use chatbot::RigChatbot;
pub use mock::MockChatbot;
pub use provider::create_chat_agent;
pub use tools::{AgentTool, ClusterTool, ToolArgs, ToolError, ToolRegistry, ToolResult};
