// core/src/oracle.rs

//! The language-model oracle used by discovery.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  System,
  User,
  Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleMessage {
  pub role: Role,
  pub content: String,
}

impl OracleMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self {
      role: Role::System,
      content: content.into(),
    }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self {
      role: Role::User,
      content: content.into(),
    }
  }
}

/// The conversation so far. Oracles that support structured output should
/// answer with an object `{"ids": [<integer>, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleRequest {
  pub messages: Vec<OracleMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleReply {
  /// Raw completion text.
  pub text: String,
  /// Ids from a schema-validated structured answer, when the oracle gave one.
  pub ids: Option<Vec<i64>>,
}

impl OracleReply {
  pub fn text(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      ids: None,
    }
  }

  pub fn structured(ids: Vec<i64>) -> Self {
    Self {
      text: String::new(),
      ids: Some(ids),
    }
  }
}

#[async_trait]
pub trait Oracle: Send + Sync {
  async fn complete(&self, request: &OracleRequest) -> Result<OracleReply>;
}
