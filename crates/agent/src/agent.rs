//! The tool-using agent loop.
//!
//! A turn makes at most two model calls. The first offers the tool palette;
//! if the model asks for tools they run in the order requested and their
//! outputs go back as tool-result messages. The second call offers no tools,
//! so the model must answer in prose. A turn never fails: any error yields
//! the configured fallback answer.

use std::sync::Arc;
use std::time::Instant;

use assistant_core::{
    notify_detached, ChatMessage, LanguageModel, LlmRequest, LlmResponse, Notification,
    OwnerNotifier, ToolCall, ToolChoice,
};
use calculator::calculate;
use database::{document, Citation, ContentType, Database, DocumentType, ToolCallResult};
use documents::{search_chunks, SearchHit};
use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::prompt::system_prompt;
use crate::tools::{
    palette, parse_arguments, AgentTool, ConflictArgs, ReportArgs, ScheduleArgs, SearchArgs,
    SpecificationArgs,
};

/// Vocabulary appended to schedule queries.
const SCHEDULE_TERMS: &str = "schedule milestone duration";

/// Outcome of one agent turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub content: String,
    /// Deduplicated by `(document_id, excerpt)`, first-seen order.
    pub citations: Vec<Citation>,
    /// Every tool call of the turn, in request order.
    pub tool_calls: Vec<ToolCallResult>,
    /// Set when the model used `generate_report` during the turn.
    pub report_request: Option<ReportArgs>,
    pub model: Option<String>,
    pub token_count: Option<u32>,
    /// True when `content` is the fallback answer.
    pub fallback: bool,
}

impl AgentReply {
    fn fallback(content: &str) -> Self {
        Self {
            content: content.to_string(),
            citations: Vec::new(),
            tool_calls: Vec::new(),
            report_request: None,
            model: None,
            token_count: None,
            fallback: true,
        }
    }
}

/// Result of one tool execution.
#[derive(Debug, Default)]
struct ToolOutcome {
    output: Value,
    citations: Vec<Citation>,
    report: Option<ReportArgs>,
}

impl ToolOutcome {
    fn output(output: Value) -> Self {
        Self {
            output,
            ..Default::default()
        }
    }

    fn with_citations(output: Value, citations: Vec<Citation>) -> Self {
        Self {
            output,
            citations,
            report: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self::output(json!({ "error": message.into() }))
    }
}

/// Token usage summed over both model rounds.
#[derive(Debug, Default)]
struct TokenTally {
    total: Option<u32>,
}

impl TokenTally {
    fn add(&mut self, response: &LlmResponse) {
        if let Some(usage) = response.usage {
            self.total = Some(self.total.unwrap_or(0).saturating_add(usage.total_tokens));
        }
    }
}

/// Runs agent turns for users.
#[derive(Clone)]
pub struct Agent {
    database: Database,
    model: Arc<dyn LanguageModel>,
    notifier: Arc<dyn OwnerNotifier>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(
        database: Database,
        model: Arc<dyn LanguageModel>,
        notifier: Arc<dyn OwnerNotifier>,
    ) -> Self {
        Self {
            database,
            model,
            notifier,
            config: AgentConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Answer `message` for `user_id` given prior conversation `history`.
    ///
    /// `history` should already be truncated to the recent window.
    pub async fn run(&self, user_id: &str, message: &str, history: Vec<ChatMessage>) -> AgentReply {
        let started = Instant::now();
        match self.turn(user_id, message, history).await {
            Ok(reply) => {
                info!(
                    user_id = %user_id,
                    tools = reply.tool_calls.len(),
                    citations = reply.citations.len(),
                    tokens = ?reply.token_count,
                    latency_ms = started.elapsed().as_millis() as u64,
                    "Agent turn completed"
                );
                reply
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Agent turn failed, using fallback answer");
                AgentReply::fallback(&self.config.fallback_message)
            }
        }
    }

    async fn turn(
        &self,
        user_id: &str,
        message: &str,
        history: Vec<ChatMessage>,
    ) -> Result<AgentReply> {
        let documents = document::list_documents(self.database.pool(), user_id, None).await?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system_prompt(&documents)));
        messages.extend(history);
        messages.push(ChatMessage::user(message));

        let mut tokens = TokenTally::default();

        // Round 1: the model may pick tools
        let first = self
            .model
            .invoke(LlmRequest::new(messages.clone()).with_tools(palette(), ToolChoice::Auto))
            .await?;
        tokens.add(&first);
        let model = first
            .model
            .clone()
            .unwrap_or_else(|| self.model.name().to_string());
        let assistant = first.into_first_message().ok_or(AgentError::EmptyResponse)?;

        if !assistant.has_tool_calls() {
            return Ok(AgentReply {
                content: answer_text(&assistant)?,
                citations: Vec::new(),
                tool_calls: Vec::new(),
                report_request: None,
                model: Some(model),
                token_count: tokens.total,
                fallback: false,
            });
        }

        let calls = assistant.requested_tool_calls().to_vec();
        debug!(user_id = %user_id, count = calls.len(), "Model requested tools");
        messages.push(ChatMessage::assistant_tool_calls(
            assistant.text(),
            calls.clone(),
        ));

        let mut citations = Vec::new();
        let mut tool_calls = Vec::with_capacity(calls.len());
        let mut report_request = None;

        for call in &calls {
            let outcome = self.execute(user_id, call).await;
            messages.push(ChatMessage::tool_result(
                call.id.clone(),
                outcome.output.to_string(),
            ));
            tool_calls.push(ToolCallResult {
                tool_name: call.function.name.clone(),
                input: parse_arguments(&call.function.arguments)
                    .unwrap_or_else(|_| Value::String(call.function.arguments.clone())),
                output: outcome.output,
            });
            citations.extend(outcome.citations);
            if outcome.report.is_some() {
                report_request = outcome.report;
            }
        }

        // Round 2: no tools, forces a prose answer
        let second = self.model.invoke(LlmRequest::new(messages)).await?;
        tokens.add(&second);
        let answer = second
            .into_first_message()
            .ok_or(AgentError::EmptyResponse)?;

        Ok(AgentReply {
            content: answer_text(&answer)?,
            citations: dedup_citations(citations),
            tool_calls,
            report_request,
            model: Some(model),
            token_count: tokens.total,
            fallback: false,
        })
    }

    async fn execute(&self, user_id: &str, call: &ToolCall) -> ToolOutcome {
        let tool = match AgentTool::from_call(call) {
            Ok(tool) => tool,
            Err(e) => {
                warn!(tool = %call.function.name, error = %e, "Rejected tool call");
                return ToolOutcome::error(e.to_string());
            }
        };

        debug!(tool = tool.name(), "Executing tool");
        match self.dispatch(user_id, &tool).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(tool = tool.name(), error = %e, "Tool execution failed");
                ToolOutcome::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, user_id: &str, tool: &AgentTool) -> Result<ToolOutcome> {
        match tool {
            AgentTool::SearchDocuments(args) => self.search_documents(user_id, args).await,
            AgentTool::CalculateQuantity(request) => Ok(match calculate(request) {
                Ok(calculation) => ToolOutcome::output(json!(calculation)),
                Err(e) => ToolOutcome::output(json!({
                    "error": e.to_string(),
                    "calculation_type": request.calculation_type,
                })),
            }),
            AgentTool::AnalyzeSchedule(args) => self.analyze_schedule(user_id, args).await,
            AgentTool::GenerateReport(args) => self.generate_report(user_id, args).await,
            AgentTool::DetectConflicts(args) => self.detect_conflicts(user_id, args).await,
            AgentTool::ExtractSpecifications(args) => {
                self.extract_specifications(user_id, args).await
            }
        }
    }

    async fn search_documents(&self, user_id: &str, args: &SearchArgs) -> Result<ToolOutcome> {
        let hits = search_chunks(
            &self.database,
            user_id,
            &args.query,
            args.document_types.as_deref(),
        )
        .await?;
        Ok(search_outcome(&args.query, hits, false))
    }

    async fn analyze_schedule(&self, user_id: &str, args: &ScheduleArgs) -> Result<ToolOutcome> {
        let query = format!(
            "{} {}",
            args.query.as_deref().unwrap_or_default(),
            SCHEDULE_TERMS
        );
        let query = query.trim();
        let hits = search_chunks(
            &self.database,
            user_id,
            query,
            Some(&[DocumentType::CpmSchedule][..]),
        )
        .await?;
        Ok(search_outcome(query, hits, true))
    }

    async fn extract_specifications(
        &self,
        user_id: &str,
        args: &SpecificationArgs,
    ) -> Result<ToolOutcome> {
        let hits = search_chunks(
            &self.database,
            user_id,
            &args.query,
            Some(&[DocumentType::Specifications, DocumentType::SpecialProvisions][..]),
        )
        .await?;

        let is_requirement = |hit: &SearchHit| {
            matches!(
                hit.chunk.metadata.content_type,
                ContentType::Specification | ContentType::Measurement
            )
        };
        let hits = if hits.iter().any(is_requirement) {
            hits.into_iter().filter(is_requirement).collect()
        } else {
            hits
        };

        Ok(search_outcome(&args.query, hits, true))
    }

    async fn generate_report(&self, user_id: &str, args: &ReportArgs) -> Result<ToolOutcome> {
        let query = args
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(&args.title);
        let hits = search_chunks(&self.database, user_id, query, None).await?;

        let sources: Vec<Value> = hits.iter().map(|hit| hit_json(hit, false)).collect();
        let output = json!({
            "report_type": args.report_type,
            "title": args.title,
            "source_count": sources.len(),
            "sources": sources,
            "instructions": "Write the complete report as your answer. Cite the source documents by name and page.",
        });

        Ok(ToolOutcome {
            output,
            citations: hits.into_iter().map(|hit| hit.citation).collect(),
            report: Some(args.clone()),
        })
    }

    async fn detect_conflicts(&self, user_id: &str, args: &ConflictArgs) -> Result<ToolOutcome> {
        let topics: Vec<&str> = args
            .topics
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.is_empty() {
            return Err(AgentError::InvalidArguments {
                tool: "detect_conflicts".to_string(),
                reason: "at least one topic is required".to_string(),
            });
        }

        let mut citations = Vec::new();
        let mut results = Vec::with_capacity(topics.len());
        let mut flagged: Vec<(String, Vec<String>)> = Vec::new();

        for topic in topics {
            let hits = search_chunks(&self.database, user_id, topic, None).await?;

            // document id -> (name, passages)
            let mut by_document: IndexMap<String, (String, Vec<Value>)> = IndexMap::new();
            for hit in &hits {
                by_document
                    .entry(hit.citation.document_id.clone())
                    .or_insert_with(|| (hit.citation.document_name.clone(), Vec::new()))
                    .1
                    .push(json!({
                        "page_number": hit.chunk.page_number,
                        "section_title": hit.chunk.section_title,
                        "content": hit.chunk.content,
                    }));
            }

            let potential_conflict = by_document.len() > 1;
            if potential_conflict {
                flagged.push((
                    topic.to_string(),
                    by_document.values().map(|(name, _)| name.clone()).collect(),
                ));
            }

            let sources: Vec<Value> = by_document
                .into_iter()
                .map(|(document_id, (document_name, passages))| {
                    json!({
                        "document_id": document_id,
                        "document_name": document_name,
                        "passages": passages,
                    })
                })
                .collect();

            results.push(json!({
                "topic": topic,
                "source_count": sources.len(),
                "potential_conflict": potential_conflict,
                "sources": sources,
            }));
            citations.extend(hits.into_iter().map(|hit| hit.citation));
        }

        if !flagged.is_empty() {
            let lines: Vec<String> = flagged
                .iter()
                .map(|(topic, names)| format!("- {}: {}", topic, names.join(", ")))
                .collect();
            info!(user_id = %user_id, topics = flagged.len(), "Potential document conflicts found");
            notify_detached(
                self.notifier.clone(),
                Notification::new(
                    format!("Potential conflicts in {} topic(s)", flagged.len()),
                    format!(
                        "User {} asked about topics covered by more than one document:\n{}",
                        user_id,
                        lines.join("\n")
                    ),
                ),
            );
        }

        Ok(ToolOutcome::with_citations(
            json!({ "topics": results }),
            citations,
        ))
    }
}

fn search_outcome(query: &str, hits: Vec<SearchHit>, with_content_type: bool) -> ToolOutcome {
    let results: Vec<Value> = hits
        .iter()
        .map(|hit| hit_json(hit, with_content_type))
        .collect();
    let output = if results.is_empty() {
        json!({
            "query": query,
            "count": 0,
            "results": [],
            "message": "No matching passages were found in the uploaded documents.",
        })
    } else {
        json!({ "query": query, "count": results.len(), "results": results })
    };
    ToolOutcome::with_citations(output, hits.into_iter().map(|hit| hit.citation).collect())
}

fn hit_json(hit: &SearchHit, with_content_type: bool) -> Value {
    let mut value = json!({
        "document_id": hit.citation.document_id,
        "document_name": hit.citation.document_name,
        "page_number": hit.chunk.page_number,
        "section_title": hit.chunk.section_title,
        "content": hit.chunk.content,
    });
    if with_content_type {
        value["content_type"] = json!(hit.chunk.metadata.content_type.as_str());
    }
    value
}

/// Non-blank text of a final answer.
fn answer_text(message: &ChatMessage) -> Result<String> {
    message
        .text()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(AgentError::EmptyResponse)
}

/// Drop citations repeating an earlier `(document_id, excerpt)` pair.
pub fn dedup_citations(citations: Vec<Citation>) -> Vec<Citation> {
    let mut unique: IndexMap<(String, String), Citation> = IndexMap::new();
    for citation in citations {
        unique
            .entry((citation.document_id.clone(), citation.excerpt.clone()))
            .or_insert(citation);
    }
    unique.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use assistant_core::{CollectingNotifier, LlmError, Role, Usage};
    use database::{chunk, user, DocumentMetadata, NewChunk, NewDocument};
    use documents::metadata::chunk_metadata;
    use mock_llm::ScriptedModel;

    struct Setup {
        database: Database,
        notifier: Arc<CollectingNotifier>,
    }

    impl Setup {
        async fn new() -> Self {
            let database = Database::in_memory().await.unwrap();
            user::ensure_user(database.pool(), "u1").await.unwrap();
            Self {
                database,
                notifier: Arc::new(CollectingNotifier::new()),
            }
        }

        fn agent(&self, model: Arc<ScriptedModel>) -> Agent {
            Agent::new(self.database.clone(), model, self.notifier.clone())
        }

        async fn add_document(
            &self,
            file_name: &str,
            document_type: DocumentType,
            contents: &[&str],
        ) -> String {
            let doc = document::create_document(
                self.database.pool(),
                &NewDocument {
                    user_id: "u1".to_string(),
                    file_name: file_name.to_string(),
                    file_type: "text/plain".to_string(),
                    document_type,
                    file_size: 1,
                    storage_key: format!("u1/{}", file_name),
                    storage_url: format!("memory://u1/{}", file_name),
                    metadata: DocumentMetadata::default(),
                },
            )
            .await
            .unwrap();
            let chunks: Vec<NewChunk> = contents
                .iter()
                .enumerate()
                .map(|(i, content)| NewChunk {
                    document_id: doc.id.clone(),
                    user_id: "u1".to_string(),
                    chunk_index: i as i64,
                    content: content.to_string(),
                    page_number: Some(i as i64 + 1),
                    section_title: None,
                    start_offset: None,
                    end_offset: None,
                    metadata: chunk_metadata(content),
                })
                .collect();
            chunk::insert_chunks(self.database.pool(), &chunks)
                .await
                .unwrap();
            doc.id
        }
    }

    fn tool_call(id: &str, name: &str, arguments: Value) -> ToolCall {
        ToolCall::new(id, name, arguments.to_string())
    }

    #[tokio::test]
    async fn test_plain_answer_without_tools() {
        let setup = Setup::new().await;
        let model = Arc::new(ScriptedModel::new().with_text("Hello! Upload a plan to begin."));
        let reply = setup.agent(model.clone()).run("u1", "hi", Vec::new()).await;

        assert_eq!(reply.content, "Hello! Upload a plan to begin.");
        assert!(reply.citations.is_empty());
        assert!(reply.tool_calls.is_empty());
        assert!(!reply.fallback);
        assert_eq!(reply.model.as_deref(), Some("ScriptedModel"));

        let requests = model.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tool_choice, Some(ToolChoice::Auto));
        assert_eq!(requests[0].tools.as_ref().map(Vec::len), Some(6));
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert!(requests[0].messages[0]
            .text()
            .unwrap()
            .contains("no documents uploaded"));
        assert_eq!(requests[0].messages.last().unwrap().text().as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_history_sits_between_system_and_user() {
        let setup = Setup::new().await;
        let model = Arc::new(ScriptedModel::new().with_text("Yes."));
        let history = vec![
            ChatMessage::user("What is the slab thickness?"),
            ChatMessage::assistant("8 inches."),
        ];
        setup.agent(model.clone()).run("u1", "Is that final?", history).await;

        let messages = &model.requests().await[0].messages;
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
    }

    #[tokio::test]
    async fn test_fallback_when_no_message() {
        let setup = Setup::new().await;

        let empty_first = Arc::new(ScriptedModel::new().with_empty());
        let reply = setup.agent(empty_first).run("u1", "hi", Vec::new()).await;
        assert!(reply.fallback);
        assert_eq!(reply.content, AgentConfig::default().fallback_message);
        assert!(reply.citations.is_empty());
        assert!(reply.tool_calls.is_empty());

        setup
            .add_document("spec.txt", DocumentType::Specifications, &["Concrete shall cure 7 days."])
            .await;
        let empty_second = Arc::new(
            ScriptedModel::new()
                .with_tool_calls(vec![tool_call("c1", "search_documents", json!({"query": "concrete"}))])
                .with_empty(),
        );
        let reply = setup.agent(empty_second).run("u1", "cure?", Vec::new()).await;
        assert!(reply.fallback);
        assert!(reply.citations.is_empty());
        assert!(reply.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_on_model_error() {
        let setup = Setup::new().await;
        let model = Arc::new(
            ScriptedModel::new().with_error(LlmError::Timeout(Duration::from_secs(180))),
        );
        let agent = setup
            .agent(model)
            .with_config(AgentConfig::default().with_fallback_message("Try again shortly."));
        let reply = agent.run("u1", "hi", Vec::new()).await;
        assert!(reply.fallback);
        assert_eq!(reply.content, "Try again shortly.");
    }

    #[tokio::test]
    async fn test_search_tool_round_trip() {
        let setup = Setup::new().await;
        let doc_id = setup
            .add_document(
                "spec.txt",
                DocumentType::Specifications,
                &["Concrete shall have minimum compressive strength of 4000 psi."],
            )
            .await;

        let first = LlmResponse {
            usage: Some(Usage {
                prompt_tokens: 90,
                completion_tokens: 10,
                total_tokens: 100,
            }),
            ..LlmResponse::from_message(ChatMessage::assistant_tool_calls(
                None,
                vec![tool_call("c1", "search_documents", json!({"query": "concrete strength"}))],
            ))
        };
        let second = LlmResponse {
            usage: Some(Usage {
                prompt_tokens: 140,
                completion_tokens: 20,
                total_tokens: 160,
            }),
            ..LlmResponse::from_message(ChatMessage::assistant("4000 psi minimum."))
        };
        let model = Arc::new(ScriptedModel::new().with_response(first).with_response(second));

        let reply = setup.agent(model.clone()).run("u1", "strength?", Vec::new()).await;

        assert_eq!(reply.content, "4000 psi minimum.");
        assert_eq!(reply.token_count, Some(260));
        assert_eq!(reply.citations.len(), 1);
        assert_eq!(reply.citations[0].document_id, doc_id);
        assert_eq!(reply.citations[0].document_name, "spec.txt");
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].tool_name, "search_documents");
        assert_eq!(reply.tool_calls[0].input["query"], "concrete strength");
        assert_eq!(reply.tool_calls[0].output["count"], 1);

        let requests = model.requests().await;
        assert_eq!(requests.len(), 2);
        assert!(requests[1].tools.is_none());
        assert!(requests[1].tool_choice.is_none());
        let tail: Vec<Role> = requests[1].messages.iter().rev().take(2).map(|m| m.role).collect();
        assert_eq!(tail, vec![Role::Tool, Role::Assistant]);
        let tool_message = requests[1].messages.last().unwrap();
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("c1"));
        assert!(tool_message.text().unwrap().contains("4000 psi"));
    }

    #[tokio::test]
    async fn test_duplicate_citations_collapse() {
        let setup = Setup::new().await;
        setup
            .add_document("spec.txt", DocumentType::Specifications, &["Rebar shall be grade 60."])
            .await;

        let model = Arc::new(
            ScriptedModel::new()
                .with_tool_calls(vec![
                    tool_call("c1", "search_documents", json!({"query": "rebar"})),
                    tool_call("c2", "search_documents", json!({"query": "grade 60"})),
                ])
                .with_text("Grade 60."),
        );
        let reply = setup.agent(model).run("u1", "rebar grade?", Vec::new()).await;

        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.citations.len(), 1);
    }

    #[test]
    fn test_token_tally_saturates() {
        let with_usage = |total_tokens| LlmResponse {
            usage: Some(Usage {
                total_tokens,
                ..Default::default()
            }),
            ..Default::default()
        };

        let mut tally = TokenTally::default();
        tally.add(&LlmResponse::default());
        assert_eq!(tally.total, None);

        tally.add(&with_usage(120));
        tally.add(&with_usage(30));
        assert_eq!(tally.total, Some(150));

        tally.add(&with_usage(u32::MAX));
        assert_eq!(tally.total, Some(u32::MAX));
    }

    #[test]
    fn test_dedup_keeps_distinct_excerpts() {
        let citation = |doc: &str, excerpt: &str| Citation {
            document_id: doc.to_string(),
            document_name: format!("{}.pdf", doc),
            page_number: Some(1),
            section_title: None,
            excerpt: excerpt.to_string(),
        };
        let deduped = dedup_citations(vec![
            citation("a", "one"),
            citation("b", "one"),
            citation("a", "one"),
            citation("a", "two"),
        ]);
        let keys: Vec<_> = deduped
            .iter()
            .map(|c| (c.document_id.as_str(), c.excerpt.as_str()))
            .collect();
        assert_eq!(keys, vec![("a", "one"), ("b", "one"), ("a", "two")]);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_tools_do_not_fail_turn() {
        let setup = Setup::new().await;
        let model = Arc::new(
            ScriptedModel::new()
                .with_tool_calls(vec![
                    ToolCall::new("c1", "launch_drone", "{}"),
                    ToolCall::new("c2", "search_documents", "{broken"),
                ])
                .with_text("I could not look that up."),
        );
        let reply = setup.agent(model.clone()).run("u1", "survey", Vec::new()).await;

        assert!(!reply.fallback);
        assert_eq!(reply.tool_calls.len(), 2);
        assert!(reply.tool_calls[0].output["error"]
            .as_str()
            .unwrap()
            .contains("unknown tool"));
        assert_eq!(reply.tool_calls[1].input, Value::String("{broken".to_string()));
        assert!(reply.tool_calls[1].output["error"].is_string());

        let requests = model.requests().await;
        let tool_results = requests[1]
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .count();
        assert_eq!(tool_results, 2);
    }

    #[tokio::test]
    async fn test_calculation_tool() {
        let setup = Setup::new().await;
        let model = Arc::new(
            ScriptedModel::new()
                .with_tool_calls(vec![
                    tool_call(
                        "c1",
                        "calculate_quantity",
                        json!({"calculation_type": "area", "values": {"length": 4, "width": 5}}),
                    ),
                    tool_call(
                        "c2",
                        "calculate_quantity",
                        json!({"calculation_type": "area", "values": {}}),
                    ),
                ])
                .with_text("The area is 20."),
        );
        let reply = setup.agent(model).run("u1", "area of 4 by 5", Vec::new()).await;

        assert_eq!(reply.tool_calls[0].output["result"], 20.0);
        assert!(reply.tool_calls[0].output["explanation"]
            .as_str()
            .unwrap()
            .contains("20"));
        assert!(reply.tool_calls[1].output["error"]
            .as_str()
            .unwrap()
            .contains("missing required values"));
        assert!(reply.citations.is_empty());
    }

    #[tokio::test]
    async fn test_schedule_tool_only_reads_cpm_documents() {
        let setup = Setup::new().await;
        setup
            .add_document(
                "cpm.pdf",
                DocumentType::CpmSchedule,
                &["Milestone 2: deck pour, duration 10 working days."],
            )
            .await;
        setup
            .add_document(
                "spec.txt",
                DocumentType::Specifications,
                &["The schedule of values shall be submitted monthly."],
            )
            .await;

        let model = Arc::new(
            ScriptedModel::new()
                .with_tool_calls(vec![tool_call("c1", "analyze_schedule", json!({"query": "deck"}))])
                .with_text("Deck pour takes 10 days."),
        );
        let reply = setup.agent(model).run("u1", "deck pour?", Vec::new()).await;

        let output = &reply.tool_calls[0].output;
        assert_eq!(output["query"], "deck schedule milestone duration");
        assert_eq!(output["count"], 1);
        assert_eq!(output["results"][0]["document_name"], "cpm.pdf");
        assert_eq!(output["results"][0]["content_type"], "schedule");
        assert_eq!(reply.citations.len(), 1);
    }

    #[tokio::test]
    async fn test_specification_tool_prefers_requirements() {
        let setup = Setup::new().await;
        setup
            .add_document(
                "spec.txt",
                DocumentType::Specifications,
                &[
                    "Asphalt general notes for the contractor office.",
                    "Asphalt base course shall be compacted to 95 percent.",
                ],
            )
            .await;
        setup
            .add_document(
                "plans.pdf",
                DocumentType::ProjectPlans,
                &["Asphalt shall be 4 inches thick."],
            )
            .await;

        let model = Arc::new(
            ScriptedModel::new()
                .with_tool_calls(vec![tool_call(
                    "c1",
                    "extract_specifications",
                    json!({"query": "asphalt"}),
                )])
                .with_text("Compact to 95 percent."),
        );
        let reply = setup.agent(model).run("u1", "asphalt?", Vec::new()).await;

        let output = &reply.tool_calls[0].output;
        assert_eq!(output["count"], 1);
        assert_eq!(output["results"][0]["content_type"], "specification");
        assert_eq!(reply.citations.len(), 1);
        assert_eq!(reply.citations[0].document_name, "spec.txt");
    }

    #[tokio::test]
    async fn test_conflicts_across_documents_notify_owner() {
        let setup = Setup::new().await;
        setup
            .add_document("spec.txt", DocumentType::Specifications, &["Curing period is 7 days."])
            .await;
        setup
            .add_document(
                "provisions.pdf",
                DocumentType::SpecialProvisions,
                &["Curing period is 14 days for bridge decks."],
            )
            .await;

        let model = Arc::new(
            ScriptedModel::new()
                .with_tool_calls(vec![tool_call(
                    "c1",
                    "detect_conflicts",
                    json!({"topics": ["curing", "pile driving"]}),
                )])
                .with_text("The curing periods differ."),
        );
        let reply = setup.agent(model).run("u1", "conflicts?", Vec::new()).await;

        let topics = &reply.tool_calls[0].output["topics"];
        assert_eq!(topics[0]["potential_conflict"], true);
        assert_eq!(topics[0]["source_count"], 2);
        assert_eq!(topics[1]["potential_conflict"], false);
        assert_eq!(reply.citations.len(), 2);

        let mut sent = Vec::new();
        for _ in 0..100 {
            sent = setup.notifier.sent().await;
            if !sent.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sent.len(), 1);
        assert!(sent[0].content.contains("spec.txt, provisions.pdf"));
    }

    #[tokio::test]
    async fn test_single_source_does_not_notify() {
        let setup = Setup::new().await;
        setup
            .add_document("spec.txt", DocumentType::Specifications, &["Curing period is 7 days."])
            .await;
        let model = Arc::new(
            ScriptedModel::new()
                .with_tool_calls(vec![tool_call("c1", "detect_conflicts", json!({"topics": ["curing"]}))])
                .with_text("No conflict."),
        );
        setup.agent(model).run("u1", "conflicts?", Vec::new()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(setup.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_report_tool_sets_request() {
        let setup = Setup::new().await;
        setup
            .add_document("spec.txt", DocumentType::Specifications, &["Drainage pipe shall be RCP."])
            .await;
        let model = Arc::new(
            ScriptedModel::new()
                .with_tool_calls(vec![tool_call(
                    "c1",
                    "generate_report",
                    json!({"report_type": "specification_review", "title": "Drainage"}),
                )])
                .with_text("# Drainage review\nPipe shall be RCP."),
        );
        let reply = setup.agent(model).run("u1", "report on drainage", Vec::new()).await;

        let request = reply.report_request.unwrap();
        assert_eq!(request.title, "Drainage");
        assert_eq!(reply.tool_calls[0].output["source_count"], 1);
        assert_eq!(reply.citations.len(), 1);
    }
}
