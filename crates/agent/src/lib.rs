//! Agent loop, chat service and report generator.
//!
//! # Architecture
//!
//! ```text
//! ChatService::send_message(user, conversation?, text)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          AGENT                              │
//! │                                                             │
//! │  1. System prompt with the user's document inventory        │
//! │         ↓                                                   │
//! │  2. Model round 1, tool palette offered (auto)              │
//! │         ↓                                                   │
//! │  3. Execute requested tools in order:                       │
//! │     • search_documents / analyze_schedule /                 │
//! │       extract_specifications → chunk search + citations     │
//! │     • calculate_quantity → calculator                       │
//! │     • detect_conflicts → per-topic search, owner notified   │
//! │     • generate_report → source material, report saved       │
//! │         ↓                                                   │
//! │  4. Model round 2, no tools                                 │
//! │         ↓                                                   │
//! │  5. Deduplicate citations                                   │
//! └─────────────────────────────────────────────────────────────┘
//!          ↓
//! Assistant message stored with citations, tool calls and metadata
//! ```
//!
//! Any failure inside a turn produces the configured fallback answer rather
//! than an error.

mod agent;
mod chat;
mod config;
mod error;
mod prompt;
mod report;
pub mod tools;

pub use agent::{dedup_citations, Agent, AgentReply};
pub use chat::{conversation_title, ChatService, ChatTurn};
pub use config::{AgentConfig, DEFAULT_FALLBACK_MESSAGE};
pub use error::{AgentError, Result};
pub use prompt::system_prompt;
pub use report::{ReportGenerator, DEFAULT_MAX_SOURCE_CHARS};
pub use tools::{palette, AgentTool, TOOL_NAMES};
