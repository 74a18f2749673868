// server/src/state.rs
use crate::services::ImageFetcher;
use paygate::{DiscoveryFunnel, NotificationDispatcher, PurchaseOrchestrator};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub discovery: Arc<DiscoveryFunnel>,
  pub purchases: Arc<PurchaseOrchestrator>,
  /// Shared with the purchase flow; the transport uses it to render amounts.
  pub dispatcher: Arc<NotificationDispatcher>,
  pub seller_address: Arc<str>,
  pub images: Arc<ImageFetcher>,
}
