// src/agent/mod.rs

pub mod history;
pub mod kagent;
pub mod llm;
pub mod output;
pub mod prompts;
pub mod trader;

pub use history::History;
pub use llm::{AgentDecision, ChatMessage, LlmClient};
