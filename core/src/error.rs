// core/src/error.rs

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the flow engine itself, independent of any handler.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Handler missing for required step '{step_name}' in flow '{flow}'")]
  HandlerMissing { flow: String, step_name: String },
}

/// The external collaborator an [`PaygateError::Upstream`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamService {
  Catalog,
  Oracle,
  Facilitator,
  Ledger,
  Mail,
}

impl std::fmt::Display for UpstreamService {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      UpstreamService::Catalog => "catalog",
      UpstreamService::Oracle => "oracle",
      UpstreamService::Facilitator => "facilitator",
      UpstreamService::Ledger => "ledger",
      UpstreamService::Mail => "mail",
    };
    f.write_str(name)
  }
}

/// Stable, user-facing classification of a failed or gated call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Validation,
  NotFound,
  PaymentRequired,
  Upstream,
  Internal,
}

#[derive(Debug, Error)]
pub enum PaygateError {
  #[error("Validation error: {0}")]
  Validation(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("{service} failure: {message}")]
  Upstream { service: UpstreamService, message: String },

  #[error("Notification failed: {0}")]
  Notification(String),

  #[error("Flow error: {source}")]
  Flow {
    #[from]
    source: FlowError,
  },

  #[error("Internal error: {0}")]
  Internal(String),
}

impl PaygateError {
  pub fn upstream(service: UpstreamService, message: impl Into<String>) -> Self {
    PaygateError::Upstream {
      service,
      message: message.into(),
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      PaygateError::Validation(_) => ErrorKind::Validation,
      PaygateError::NotFound(_) => ErrorKind::NotFound,
      PaygateError::Upstream { .. } | PaygateError::Notification(_) => ErrorKind::Upstream,
      PaygateError::Flow { .. } | PaygateError::Internal(_) => ErrorKind::Internal,
    }
  }

  /// Summary safe to hand back to the calling agent. Upstream and internal
  /// diagnostics stay in the logs.
  pub fn public_message(&self) -> String {
    match self {
      PaygateError::Validation(m) => format!("Invalid input: {}", m),
      PaygateError::NotFound(m) => format!("Not found: {}", m),
      PaygateError::Upstream { service, .. } => {
        format!("The {} service is unavailable right now. Please try again later.", service)
      }
      PaygateError::Notification(_) => "Sending the notification failed.".to_string(),
      PaygateError::Flow { .. } | PaygateError::Internal(_) => "Something went wrong on our side.".to_string(),
    }
  }
}

impl From<anyhow::Error> for PaygateError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<PaygateError>() {
      Ok(inner) => inner,
      Err(other) => PaygateError::Internal(other.to_string()),
    }
  }
}

pub type Result<T, E = PaygateError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn upstream_detail_is_not_exposed() {
    let err = PaygateError::upstream(UpstreamService::Facilitator, "connect to 10.0.0.4:3000 refused");
    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert!(!err.public_message().contains("10.0.0.4"));
    assert!(err.public_message().contains("facilitator"));
  }

  #[test]
  fn flow_errors_are_internal() {
    let err = PaygateError::from(FlowError::HandlerMissing {
      flow: "purchase".into(),
      step_name: "apply_purchase".into(),
    });
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.public_message(), "Something went wrong on our side.");
  }

  #[test]
  fn anyhow_wrapping_keeps_domain_errors() {
    let wrapped = anyhow::Error::new(PaygateError::NotFound("wallet".into()));
    assert_eq!(PaygateError::from(wrapped).kind(), ErrorKind::NotFound);

    let foreign = anyhow::anyhow!("boom");
    assert!(matches!(PaygateError::from(foreign), PaygateError::Internal(m) if m == "boom"));
  }
}
