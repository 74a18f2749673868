// server/src/models/mod.rs

//! Database rows, converted into the domain records of the `paygate` crate.

pub mod order;
pub mod product;
pub mod wallet;

pub use order::OrderRow;
pub use product::ProductRow;
pub use wallet::WalletRow;
