use std::str::FromStr;
use std::sync::Arc;

use muza_core::{ContentType, Emotion, ProgressionContext};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::engine::Engine;

const DEFAULT_TOP_K: usize = 5;
const DEFAULT_WALK_LENGTH: usize = 10;
const DEFAULT_ACTIVE_COUNT: usize = 10;

#[derive(Clone)]
pub struct MuzaServer {
    engine: Arc<Engine>,
    tool_router: ToolRouter<Self>,
}

impl MuzaServer {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }
}

fn json_result(value: &serde_json::Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )])
}

fn parse_tag<T: FromStr<Err = String> + Default>(raw: Option<&str>) -> Result<T, McpError> {
    match raw {
        None => Ok(T::default()),
        Some(s) => s.parse().map_err(|e: String| McpError::invalid_params(e, None)),
    }
}

// --- Tool parameter types ---

#[derive(Debug, Deserialize, JsonSchema)]
struct LearnRequest {
    /// Text to learn. Words of three or more characters become nodes.
    text: String,
    /// Content type tag, e.g. "CODE", "QUESTION", "EMOTIONAL". Defaults to GENERAL.
    content_type: Option<String>,
    /// Emotion tag, e.g. "CURIOUS", "HAPPY". Defaults to NEUTRAL.
    emotion: Option<String>,
    /// Force adaptive memory (boost resonant nodes even if the word is absent).
    adaptive: Option<bool>,
    /// Progression unlocks; "adaptive_memory" enables adaptive memory.
    unlocked_nodes: Option<Vec<String>>,
    /// Logic skill level; 3 or more enables adaptive memory.
    logic_skill: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchRequest {
    /// Query text
    query: String,
    /// Maximum number of results (default 5)
    top_k: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RecallRequest {
    /// Query text to look up among high-energy memories
    query: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GenerateRequest {
    /// Starting word
    seed: String,
    /// Maximum number of steps (default 10)
    length: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ActiveRequest {
    /// Number of nodes to return (default 10)
    count: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ImportRequest {
    /// Snapshot JSON: an array of [token, record] pairs
    state: serde_json::Value,
}

#[tool_router]
impl MuzaServer {
    #[tool(
        description = "Learn text into associative memory. Each word becomes (or reinforces) a node; adjacent words are linked. Optional content_type and emotion tag the nodes."
    )]
    async fn muza_learn(
        &self,
        Parameters(req): Parameters<LearnRequest>,
    ) -> Result<CallToolResult, McpError> {
        let content_type: ContentType = parse_tag(req.content_type.as_deref())?;
        let emotion: Emotion = parse_tag(req.emotion.as_deref())?;
        let progression = ProgressionContext {
            unlocked_nodes: req.unlocked_nodes.unwrap_or_default(),
            logic_skill: req.logic_skill.unwrap_or(0),
        };
        let adaptive = req.adaptive.unwrap_or(false) || progression.adaptive_memory_active();

        let report = self
            .engine
            .learn(&req.text, adaptive, content_type, emotion)
            .await;
        Ok(json_result(&serde_json::json!({
            "report": report,
            "adaptive": adaptive,
        })))
    }

    #[tool(description = "Rank learned words by embedding similarity to the query.")]
    async fn muza_search(
        &self,
        Parameters(req): Parameters<SearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let results = self
            .engine
            .search(&req.query, req.top_k.unwrap_or(DEFAULT_TOP_K))
            .await;
        Ok(json_result(&serde_json::json!({ "results": results })))
    }

    #[tool(
        description = "Look up a high-energy memory matching the query. A hit is brought into focus (full energy, centered)."
    )]
    async fn muza_recall(
        &self,
        Parameters(req): Parameters<RecallRequest>,
    ) -> Result<CallToolResult, McpError> {
        let hit = self.engine.recall(&req.query).await;
        Ok(json_result(&serde_json::json!({ "hit": hit })))
    }

    #[tool(
        description = "Generate a word sequence by walking the association graph from a seed word."
    )]
    async fn muza_generate(
        &self,
        Parameters(req): Parameters<GenerateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let text = self
            .engine
            .generate(&req.seed, req.length.unwrap_or(DEFAULT_WALK_LENGTH))
            .await;
        let found = text.is_some();
        Ok(json_result(&serde_json::json!({
            "found": found,
            "text": text,
        })))
    }

    #[tool(description = "List the most energetic nodes, highest first.")]
    async fn muza_active(
        &self,
        Parameters(req): Parameters<ActiveRequest>,
    ) -> Result<CallToolResult, McpError> {
        let nodes = self
            .engine
            .most_active(req.count.unwrap_or(DEFAULT_ACTIVE_COUNT))
            .await;
        Ok(json_result(&serde_json::json!({ "nodes": nodes })))
    }

    #[tool(description = "Node count, association count and energy totals.")]
    async fn muza_stats(&self) -> Result<CallToolResult, McpError> {
        let stats = self.engine.stats().await;
        Ok(json_result(&serde_json::json!(stats)))
    }

    #[tool(description = "Export the full graph as snapshot JSON.")]
    async fn muza_export(&self) -> Result<CallToolResult, McpError> {
        let json = self
            .engine
            .export_json()
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Replace the graph with snapshot JSON.")]
    async fn muza_import(
        &self,
        Parameters(req): Parameters<ImportRequest>,
    ) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string(&req.state)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let nodes = self
            .engine
            .import_json(&json)
            .await
            .map_err(|e| McpError::invalid_params(format!("{e:#}"), None))?;
        Ok(json_result(&serde_json::json!({ "imported": nodes })))
    }
}

#[tool_handler]
impl ServerHandler for MuzaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Associative word memory. Call muza_learn with text worth remembering, \
                 muza_search or muza_recall to look things up, and muza_generate to \
                 free-associate from a seed word. Memories fade unless reinforced."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
