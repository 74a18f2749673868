// core/src/discovery/prompts.rs

use crate::models::{CategoryCandidate, Product};
use crate::oracle::OracleMessage;

pub(crate) fn opening(input_text: &str) -> Vec<OracleMessage> {
  vec![
    OracleMessage::system("You are helping categorize and select products based on the user's message."),
    OracleMessage::user(format!("User is looking for: {}", input_text)),
  ]
}

pub(crate) fn category_question(categories: &[CategoryCandidate]) -> OracleMessage {
  let listing = categories
    .iter()
    .map(|c| format!("{} {}", c.id, c.name))
    .collect::<Vec<_>>()
    .join("\n");
  OracleMessage::system(format!(
    "Which categories might match?\n{}\nReturn only the matching IDs like [1, 2] or [N].",
    listing
  ))
}

pub(crate) fn product_question(candidates: &[Product], max_selections: usize) -> serde_json::Result<OracleMessage> {
  let listing = serde_json::to_string(candidates)?;
  Ok(OracleMessage::system(format!(
    "{}\nSelect the best matches (up to {}), return their id like [123, 456]",
    listing, max_selections
  )))
}
