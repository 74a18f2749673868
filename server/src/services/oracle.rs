// server/src/services/oracle.rs

use async_trait::async_trait;
use paygate::error::{PaygateError, Result, UpstreamService};
use paygate::oracle::{Oracle, OracleMessage, OracleReply, OracleRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub timeout: Duration,
}

/// Chat-completions oracle for OpenAI and compatible endpoints. Asks for a
/// JSON `{"ids": [...]}` answer and falls back to the raw text when the
/// content does not parse.
pub struct OpenAiOracle {
  client: reqwest::Client,
  config: OpenAiConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: &'a [OracleMessage],
  response_format: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
  #[serde(default)]
  content: Option<String>,
}

#[derive(Deserialize)]
struct IdSelection {
  ids: Vec<i64>,
}

fn id_selection_format() -> serde_json::Value {
  serde_json::json!({
    "type": "json_schema",
    "json_schema": {
      "name": "id_selection",
      "strict": true,
      "schema": {
        "type": "object",
        "properties": {
          "ids": {"type": "array", "items": {"type": "integer"}}
        },
        "required": ["ids"],
        "additionalProperties": false
      }
    }
  })
}

impl OpenAiOracle {
  pub fn new(config: OpenAiConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| PaygateError::Internal(format!("building oracle client: {}", e)))?;
    Ok(Self { client, config })
  }
}

#[async_trait]
impl Oracle for OpenAiOracle {
  #[instrument(
    name = "oracle::complete",
    skip_all,
    fields(model = %self.config.model, messages = request.messages.len()),
    err(Display)
  )]
  async fn complete(&self, request: &OracleRequest) -> Result<OracleReply> {
    let body = ChatRequest {
      model: &self.config.model,
      messages: &request.messages,
      response_format: id_selection_format(),
    };
    let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

    let response = self
      .client
      .post(&url)
      .bearer_auth(&self.config.api_key)
      .json(&body)
      .send()
      .await
      .map_err(|e| PaygateError::upstream(UpstreamService::Oracle, e.to_string()))?;

    if !response.status().is_success() {
      let status = response.status();
      let text = response.text().await.unwrap_or_default();
      return Err(PaygateError::upstream(
        UpstreamService::Oracle,
        format!("HTTP {}: {}", status, text),
      ));
    }

    let chat: ChatResponse = response
      .json()
      .await
      .map_err(|e| PaygateError::upstream(UpstreamService::Oracle, format!("decoding completion: {}", e)))?;
    let content = chat
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .unwrap_or_default();

    match serde_json::from_str::<IdSelection>(&content) {
      Ok(selection) => {
        debug!(ids = ?selection.ids, "Oracle answered with structured ids.");
        Ok(OracleReply {
          text: content,
          ids: Some(selection.ids),
        })
      }
      Err(_) => {
        warn!("Oracle answer was not structured; falling back to text extraction.");
        Ok(OracleReply::text(content))
      }
    }
  }
}
