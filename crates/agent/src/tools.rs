//! The fixed tool palette offered to the model.
//!
//! Tool calls arrive as a name plus JSON-encoded arguments. [`AgentTool::from_call`]
//! turns them into a typed variant so dispatch is an exhaustive `match`.

use assistant_core::{ToolCall, ToolDefinition};
use calculator::CalculationRequest;
use database::{DocumentType, ReportType};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AgentError, Result};

/// Names of every tool in the palette, in the order they are offered.
pub const TOOL_NAMES: [&str; 6] = [
    "search_documents",
    "calculate_quantity",
    "analyze_schedule",
    "generate_report",
    "detect_conflicts",
    "extract_specifications",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_types: Option<Vec<DocumentType>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportArgs {
    pub report_type: ReportType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictArgs {
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationArgs {
    pub query: String,
}

/// A parsed tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum AgentTool {
    /// Keyword search over the user's document chunks.
    SearchDocuments(SearchArgs),
    /// Quantity or unit calculation.
    CalculateQuantity(CalculationRequest),
    /// Search restricted to CPM schedule documents.
    AnalyzeSchedule(ScheduleArgs),
    /// Gather source material for a report.
    GenerateReport(ReportArgs),
    /// Compare what different documents say about each topic.
    DetectConflicts(ConflictArgs),
    /// Search restricted to specification documents.
    ExtractSpecifications(SpecificationArgs),
}

impl AgentTool {
    /// Parse a model tool call.
    ///
    /// Empty arguments are read as `{}`.
    pub fn from_call(call: &ToolCall) -> Result<Self> {
        let name = call.function.name.as_str();
        if !TOOL_NAMES.contains(&name) {
            return Err(AgentError::UnknownTool(name.to_string()));
        }

        let arguments = parse_arguments(&call.function.arguments).map_err(|reason| {
            AgentError::InvalidArguments {
                tool: name.to_string(),
                reason,
            }
        })?;

        serde_json::from_value(json!({ "name": name, "arguments": arguments })).map_err(|e| {
            AgentError::InvalidArguments {
                tool: name.to_string(),
                reason: e.to_string(),
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            AgentTool::SearchDocuments(_) => "search_documents",
            AgentTool::CalculateQuantity(_) => "calculate_quantity",
            AgentTool::AnalyzeSchedule(_) => "analyze_schedule",
            AgentTool::GenerateReport(_) => "generate_report",
            AgentTool::DetectConflicts(_) => "detect_conflicts",
            AgentTool::ExtractSpecifications(_) => "extract_specifications",
        }
    }
}

/// JSON arguments of a call, `{}` when blank.
pub(crate) fn parse_arguments(raw: &str) -> std::result::Result<Value, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(raw).map_err(|e| format!("arguments are not valid JSON: {}", e))
}

/// Tool schemas for the first model round.
pub fn palette() -> Vec<ToolDefinition> {
    let document_types: Vec<&str> = DocumentType::ALL.iter().map(|t| t.as_str()).collect();
    let report_types: Vec<&str> = ReportType::ALL.iter().map(|t| t.as_str()).collect();

    vec![
        ToolDefinition::function(
            "search_documents",
            "Search the user's uploaded construction documents for passages matching a query. \
             Use this for any question about project requirements, plans or provisions.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Keywords to look for, e.g. 'concrete compressive strength'"
                    },
                    "document_types": {
                        "type": "array",
                        "items": { "type": "string", "enum": document_types },
                        "description": "Restrict the search to these document types"
                    }
                },
                "required": ["query"]
            }),
        ),
        ToolDefinition::function(
            "calculate_quantity",
            "Compute construction quantities: area, volume, linear totals, weight, unit \
             conversions or a custom arithmetic formula over named values.",
            json!({
                "type": "object",
                "properties": {
                    "calculation_type": {
                        "type": "string",
                        "enum": ["area", "volume", "linear", "weight", "conversion", "custom"]
                    },
                    "values": {
                        "type": "object",
                        "additionalProperties": { "type": "number" },
                        "description": "Named inputs, e.g. {\"length\": 40, \"width\": 12}"
                    },
                    "formula": {
                        "type": "string",
                        "description": "Arithmetic over value names, for custom calculations"
                    },
                    "unit_from": { "type": "string" },
                    "unit_to": { "type": "string" }
                },
                "required": ["calculation_type", "values"]
            }),
        ),
        ToolDefinition::function(
            "analyze_schedule",
            "Look up milestones, durations and sequencing in the CPM schedule documents.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Activity or milestone of interest"
                    }
                }
            }),
        ),
        ToolDefinition::function(
            "generate_report",
            "Collect source material for a written report. The final answer becomes the report.",
            json!({
                "type": "object",
                "properties": {
                    "report_type": { "type": "string", "enum": report_types },
                    "title": { "type": "string" },
                    "query": {
                        "type": "string",
                        "description": "What to search for; defaults to the title"
                    }
                },
                "required": ["report_type", "title"]
            }),
        ),
        ToolDefinition::function(
            "detect_conflicts",
            "Find what different documents say about each topic so contradictions can be spotted.",
            json!({
                "type": "object",
                "properties": {
                    "topics": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Topics to compare, e.g. ['curing period', 'pavement thickness']"
                    }
                },
                "required": ["topics"]
            }),
        ),
        ToolDefinition::function(
            "extract_specifications",
            "Pull requirement and measurement statements from specifications and special provisions.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Material or work item, e.g. 'asphalt base course'"
                    }
                },
                "required": ["query"]
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use calculator::CalculationType;

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall::new("call_1", name, arguments)
    }

    #[test]
    fn test_palette_matches_tool_names() {
        let names: Vec<String> = palette().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, TOOL_NAMES);
    }

    #[test]
    fn test_parse_search_with_types() {
        let tool = AgentTool::from_call(&call(
            "search_documents",
            r#"{"query": "curing", "document_types": ["specifications", "special_provisions"]}"#,
        ))
        .unwrap();
        assert_eq!(
            tool,
            AgentTool::SearchDocuments(SearchArgs {
                query: "curing".to_string(),
                document_types: Some(vec![
                    DocumentType::Specifications,
                    DocumentType::SpecialProvisions
                ]),
            })
        );
        assert_eq!(tool.name(), "search_documents");
    }

    #[test]
    fn test_parse_calculation() {
        let tool = AgentTool::from_call(&call(
            "calculate_quantity",
            r#"{"calculation_type": "area", "values": {"length": 4, "width": "5"}}"#,
        ))
        .unwrap();
        match tool {
            AgentTool::CalculateQuantity(req) => {
                assert_eq!(req.calculation_type, CalculationType::Area);
                assert_eq!(req.values.get("width"), Some(&5.0));
            }
            other => panic!("unexpected tool {:?}", other),
        }
    }

    #[test]
    fn test_blank_arguments_read_as_empty_object() {
        let tool = AgentTool::from_call(&call("analyze_schedule", "")).unwrap();
        assert_eq!(tool, AgentTool::AnalyzeSchedule(ScheduleArgs::default()));
    }

    #[test]
    fn test_unknown_and_malformed_calls() {
        assert!(matches!(
            AgentTool::from_call(&call("delete_everything", "{}")),
            Err(AgentError::UnknownTool(name)) if name == "delete_everything"
        ));
        assert!(matches!(
            AgentTool::from_call(&call("search_documents", "{not json")),
            Err(AgentError::InvalidArguments { .. })
        ));
        assert!(matches!(
            AgentTool::from_call(&call("detect_conflicts", r#"{"topics": "curing"}"#)),
            Err(AgentError::InvalidArguments { .. })
        ));
        assert!(matches!(
            AgentTool::from_call(&call("generate_report", r#"{"report_type": "poem", "title": "x"}"#)),
            Err(AgentError::InvalidArguments { .. })
        ));
    }
}
