use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use crate::config::ExtractionConfig;
use crate::extraction::{
    Extraction, ExtractionClient, ExtractionError, ExtractionReply, ExtractionRequest,
};

const SYSTEM_PROMPT: &str = "You are the assistant of Roam, a local events board. \
Classify each user message and extract structured data.\n\
- If the user is describing an event they want to post (or answering a question about one), \
use intent \"create_event\" and put every event detail they mentioned in \"event\". \
Use null for details you looked for but could not find; omit details never discussed.\n\
- If the user wants to find events, use intent \"search\" with short keywords in \"query\".\n\
- Otherwise use intent \"chit_chat\" and reply briefly in \"message\".\n\
Never invent details. Give times as ISO 8601; include a UTC offset only if the user stated one.\n\
Respond with a single JSON object matching this JSON schema:\n";

/// Extraction client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct LlmExtractor {
    model: String,
    base_url: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    history_turns: usize,
    system_prompt: String,
    client: Client,
}

impl LlmExtractor {
    pub fn new(config: &ExtractionConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        if config.api_key.is_none() {
            tracing::warn!(endpoint = %config.endpoint, "no API key configured for extraction endpoint");
        }

        Ok(Self {
            model: config.model.clone(),
            base_url: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            history_turns: config.history_turns,
            system_prompt: system_prompt(),
            client,
        })
    }

    fn build_payload(&self, request: &ExtractionRequest) -> Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "response_format": { "type": "json_object" },
            "messages": build_messages(&self.system_prompt, request, self.history_turns),
        })
    }
}

impl ExtractionClient for LlmExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<Extraction, ExtractionError> {
        let base = self.base_url.trim_end_matches('/');
        let url = format!("{}/chat/completions", base);

        let mut http = self.client.post(url).json(&self.build_payload(request));
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        tracing::debug!(model = %self.model, text_len = request.text.len(), "calling extraction endpoint");

        let response = http
            .send()
            .await
            .map_err(|err| ExtractionError::Unavailable(err.to_string()))?;

        let status = response.status();
        let text_body = response
            .text()
            .await
            .map_err(|err| ExtractionError::Unavailable(err.to_string()))?;

        if !status.is_success() {
            return Err(ExtractionError::Http {
                status: status.as_u16(),
                body: text_body,
            });
        }

        let value: Value = serde_json::from_str(&text_body)
            .map_err(|err| ExtractionError::Malformed(err.to_string()))?;

        let content = value
            .get("choices")
            .and_then(|choices| choices.as_array())
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| ExtractionError::Malformed("response missing message content".to_string()))?;

        tracing::debug!(raw = %content, "raw extraction reply");
        parse_reply(content)
    }
}

fn system_prompt() -> String {
    let schema = schemars::schema_for!(ExtractionReply);
    let schema_json = serde_json::to_string(&schema).unwrap_or_default();
    format!("{SYSTEM_PROMPT}{schema_json}")
}

/// System prompt, current draft, the last `history_turns` lines, then the new text.
fn build_messages(system: &str, request: &ExtractionRequest, history_turns: usize) -> Vec<Value> {
    let mut messages = vec![json!({ "role": "system", "content": system })];

    if let Some(draft) = request.prior_draft.as_ref().filter(|d| !d.is_empty()) {
        let draft_json = serde_json::to_string(draft).unwrap_or_default();
        messages.push(json!({
            "role": "system",
            "content": format!("Event draft so far (update it with anything new):\n{draft_json}"),
        }));
    }

    let skip = request.history.len().saturating_sub(history_turns);
    for turn in request.history.iter().skip(skip) {
        messages.push(json!({ "role": turn.role.as_str(), "content": turn.text }));
    }

    messages.push(json!({ "role": "user", "content": request.text }));
    messages
}

/// Parse the model's text reply, tolerating markdown code fences around the JSON.
pub fn parse_reply(content: &str) -> Result<Extraction, ExtractionError> {
    let body = strip_code_fence(content.trim());
    if body.is_empty() {
        return Err(ExtractionError::Malformed("empty reply".to_string()));
    }
    let reply: ExtractionReply =
        serde_json::from_str(body).map_err(|err| ExtractionError::Malformed(err.to_string()))?;
    Ok(reply.into())
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
