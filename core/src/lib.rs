// core/src/lib.rs

//! Paygate: payment-gated purchasing and product discovery for agent tool calls.
//!
//! - [`discovery::DiscoveryFunnel`] maps free text to catalog products with two
//!   oracle passes.
//! - [`purchase::PurchaseOrchestrator`] quotes a purchase, has the caller's
//!   signed payment verified by a facilitator, records the orders, debits the
//!   wallet and sends the confirmation mails.
//!
//! Both run on the small step engine in [`flow`]. Every external collaborator
//! (catalog, oracle, ledger, facilitator, mail) sits behind a trait so the
//! binary can wire real clients and the tests can wire fakes.

pub mod catalog;
pub mod discovery;
pub mod error;
pub mod facilitator;
pub mod flow;
pub mod ledger;
pub mod models;
pub mod notify;
pub mod oracle;
pub mod purchase;
pub mod settings;

pub use crate::catalog::{CatalogGateway, HttpCatalogGateway};
pub use crate::discovery::{DiscoveryFunnel, DiscoveryStatus, FindProductsResponse};
pub use crate::error::{ErrorKind, FlowError, PaygateError, Result, UpstreamService};
pub use crate::facilitator::{HttpFacilitatorClient, PaymentFacilitator};
pub use crate::flow::{ContextData, Flow, FlowControl, FlowOutcome};
pub use crate::ledger::{ApplyOutcome, InMemoryLedger, LedgerStore, PurchaseApplication};
pub use crate::notify::{EmailMessage, NotificationDispatcher, NotificationReport, NotificationSink};
pub use crate::oracle::{Oracle, OracleMessage, OracleReply, OracleRequest, Role};
pub use crate::purchase::{BuyProductsResponse, PurchaseOrchestrator, PurchaseState, PurchaseStatus};
pub use crate::settings::{DiscoverySettings, NotificationSettings, PurchaseSettings};
