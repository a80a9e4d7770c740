//! Conversation-backed chat turns.

use std::time::Instant;

use assistant_core::ChatMessage;
use database::{
    conversation, message, report, user, Conversation, Database, Message, MessageMetadata,
    MessageRole, NewMessage, NewReport, Report, ReportMetadata,
};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::agent::{Agent, AgentReply};
use crate::error::{AgentError, Result};
use crate::tools::ReportArgs;

/// Conversation titles are cut to this many chars.
const TITLE_CHARS: usize = 50;

/// Everything one chat turn wrote.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub conversation: Conversation,
    pub user_message: Message,
    pub assistant_message: Message,
    /// Report saved because the agent used `generate_report`.
    pub report: Option<Report>,
}

/// Runs agent turns inside stored conversations.
#[derive(Clone)]
pub struct ChatService {
    database: Database,
    agent: Agent,
}

impl ChatService {
    pub fn new(database: Database, agent: Agent) -> Self {
        Self { database, agent }
    }

    /// Send `text` as `user_id`, starting a new conversation when
    /// `conversation_id` is `None`.
    pub async fn send_message(
        &self,
        user_id: &str,
        conversation_id: Option<&str>,
        text: &str,
    ) -> Result<ChatTurn> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AgentError::InvalidInput("message is empty".to_string()));
        }

        let pool = self.database.pool();
        user::ensure_user(pool, user_id).await?;

        let conversation = match conversation_id {
            Some(id) => conversation::get_conversation(pool, id, user_id).await?,
            None => {
                conversation::create_conversation(pool, user_id, &conversation_title(text), &[])
                    .await?
            }
        };

        // History is read before the new message is stored.
        let window = self.agent.config().history_window as i64;
        let history: Vec<ChatMessage> =
            message::list_recent_messages(pool, &conversation.id, user_id, window)
                .await?
                .iter()
                .map(to_chat_message)
                .collect();

        let user_message = message::create_message(
            pool,
            &NewMessage::plain(&conversation.id, user_id, MessageRole::User, text),
        )
        .await?;

        let started = Instant::now();
        let reply = self.agent.run(user_id, text, history).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let assistant_message = message::create_message(
            pool,
            &NewMessage {
                conversation_id: conversation.id.clone(),
                user_id: user_id.to_string(),
                role: MessageRole::Assistant,
                content: reply.content.clone(),
                citations: reply.citations.clone(),
                tool_calls: reply.tool_calls.clone(),
                metadata: MessageMetadata {
                    model: reply.model.clone(),
                    token_count: reply.token_count,
                    latency_ms: Some(latency_ms),
                },
            },
        )
        .await?;

        conversation::touch_conversation(pool, &conversation.id, user_id).await?;

        let report = match &reply.report_request {
            Some(request) if !reply.fallback => Some(
                self.save_report(user_id, &conversation.id, request, &reply)
                    .await?,
            ),
            _ => None,
        };

        info!(
            user_id = %user_id,
            conversation_id = %conversation.id,
            latency_ms = latency_ms,
            citations = reply.citations.len(),
            report = report.is_some(),
            "Chat turn stored"
        );

        Ok(ChatTurn {
            conversation: conversation::get_conversation(pool, &conversation.id, user_id).await?,
            user_message,
            assistant_message,
            report,
        })
    }

    async fn save_report(
        &self,
        user_id: &str,
        conversation_id: &str,
        request: &ReportArgs,
        reply: &AgentReply,
    ) -> Result<Report> {
        let mut sources: IndexMap<String, String> = IndexMap::new();
        for citation in &reply.citations {
            sources
                .entry(citation.document_id.clone())
                .or_insert_with(|| citation.document_name.clone());
        }

        let saved = report::create_report(
            self.database.pool(),
            &NewReport {
                user_id: user_id.to_string(),
                conversation_id: Some(conversation_id.to_string()),
                title: request.title.clone(),
                report_type: request.report_type,
                content: reply.content.clone(),
                source_document_ids: sources.keys().cloned().collect(),
                metadata: ReportMetadata {
                    document_names: sources.into_values().collect(),
                    model: reply.model.clone(),
                },
            },
        )
        .await?;

        Ok(saved)
    }
}

/// Title for a new conversation: the first 50 chars, with `...` when cut.
pub fn conversation_title(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(TITLE_CHARS) {
        Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
        None => text.to_string(),
    }
}

fn to_chat_message(message: &Message) -> ChatMessage {
    match message.role {
        MessageRole::User => ChatMessage::user(&message.content),
        MessageRole::Assistant => ChatMessage::assistant(&message.content),
        MessageRole::System => ChatMessage::system(&message.content),
    }
}
