// core/src/models/mod.rs

//! Records exchanged between the catalog, the ledger and the workflows.

pub mod category;
pub mod order;
pub mod product;
pub mod quote;
pub mod wallet;

pub use category::CategoryCandidate;
pub use order::Order;
pub use product::{Product, ProductId};
pub use quote::{PaymentProof, PaymentQuote, PaymentVerdict};
pub use wallet::Wallet;
