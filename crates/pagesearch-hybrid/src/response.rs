use serde::{Deserialize, Serialize};
use serde_json::Value;

use pagesearch_core::config::SearchConfig;
use pagesearch_core::QueryError;

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
    pub include_highlights: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self { query: query.into(), max_results, include_highlights: true }
    }

    /// Reads `{query, max_results?, include_highlights?}`. Chat clients send
    /// the text as `message` instead of `query`; both are accepted.
    pub fn from_json(body: &Value, defaults: &SearchConfig) -> Result<Self, QueryError> {
        let object = body.as_object().ok_or_else(|| QueryError::InvalidField {
            field: "body",
            reason: "expected a JSON object".to_string(),
        })?;

        let query = match object.get("query").or_else(|| object.get("message")) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(QueryError::InvalidField { field: "query", reason: format!("expected a string, got {other}") })
            }
        };

        let max_results = match object.get("max_results") {
            None | Some(Value::Null) => defaults.default_results,
            Some(v) => match v.as_u64() {
                Some(n) if n >= 1 => usize::try_from(n).unwrap_or(usize::MAX),
                _ => {
                    return Err(QueryError::InvalidField {
                        field: "max_results",
                        reason: format!("expected a positive integer, got {v}"),
                    })
                }
            },
        };

        let include_highlights = match object.get("include_highlights") {
            None | Some(Value::Null) => true,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(QueryError::InvalidField {
                    field: "include_highlights",
                    reason: format!("expected a boolean, got {other}"),
                })
            }
        };

        Ok(Self { query, max_results, include_highlights })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub file_name: String,
    pub page_number: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted_text: Option<String>,
    pub url: String,
    pub relevance_score: f32,
}

/// `success = true` with no results means nothing matched; `success = false`
/// means the search itself failed and `error` says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub total_results: usize,
    pub results: Vec<ResultRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn found(query: &str, results: Vec<ResultRecord>) -> Self {
        Self { success: true, query: query.to_string(), total_results: results.len(), results, error: None }
    }

    pub fn failed(query: &str, error: impl Into<String>) -> Self {
        Self { success: false, query: query.to_string(), total_results: 0, results: Vec::new(), error: Some(error.into()) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ready,
    Empty,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub passage_count: usize,
    pub document_count: usize,
}

/// Renders a response as a conversational answer with numbered
/// file/page headings and page links.
pub fn format_chat_reply(response: &SearchResponse) -> String {
    if !response.success {
        let reason = response.error.as_deref().unwrap_or("unknown error");
        return format!("Sorry, I encountered an error while searching: {reason}");
    }
    if response.results.is_empty() {
        return format!(
            "I couldn't find any relevant information about '{}' in the available PDF documents. \
             Please try rephrasing your question or using different keywords.",
            response.query
        );
    }
    let mut parts = vec![format!(
        "I found {} relevant results for your query about '{}':\n",
        response.total_results, response.query
    )];
    for (i, result) in response.results.iter().enumerate() {
        parts.push(format!("**{}. {} (Page {})**", i + 1, result.file_name, result.page_number));
        parts.push(result.highlighted_text.clone().unwrap_or_else(|| result.text.clone()));
        parts.push(format!("[Open PDF at Page {}]({})\n", result.page_number, result.url));
    }
    parts.join("\n")
}
