// server/src/services/mod.rs

//! Adapters for the collaborators the `paygate` core talks to through traits.

pub mod images;
pub mod ledger;
pub mod mailer;
pub mod oracle;

pub use images::ImageFetcher;
pub use ledger::{seeded_memory_ledger, PgLedger};
pub use mailer::{LogMailer, ResendMailer, RESEND_API_URL};
pub use oracle::{OpenAiConfig, OpenAiOracle};
