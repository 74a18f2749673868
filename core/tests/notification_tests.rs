// tests/notification_tests.rs
mod common;

use common::*;
use paygate::error::PaygateError;
use paygate::models::Wallet;
use paygate::notify::{NotificationDispatcher, NotificationReport};
use paygate::settings::NotificationSettings;
use serial_test::serial;

fn settings() -> NotificationSettings {
  NotificationSettings {
    admin_recipients: vec!["ops@example.com".into(), "owner@example.com".into()],
    excluded_buyers: vec!["QA@example.com".into()],
    ..Default::default()
  }
}

#[tokio::test]
#[serial]
async fn buyer_and_admins_receive_the_order_summary() {
  setup_tracing();
  let sink = RecordingSink::new();
  let dispatcher = NotificationDispatcher::new(sink.clone(), settings());
  let products = vec![product(1, "Espresso", 250), product(2, "Croissant", 220)];

  let report = dispatcher
    .order_confirmed(&buyer_wallet(0), &products, 470)
    .await
    .unwrap();

  assert_eq!(
    report,
    NotificationReport {
      buyer_notified: true,
      admins_notified: 2
    }
  );
  let sent = sink.sent.lock();
  assert_eq!(sent.len(), 3);
  assert_eq!(sent[0].to, "ada@example.com");
  assert_eq!(sent[0].subject, "Your Latinum Order Confirmation");
  assert_eq!(
    sent[0].body,
    "Hi Ada,\n\nThanks for your purchase!\n\nOrder Summary:\n• Espresso – €2.50\n• Croissant – €2.20\n\nTotal: €4.70\n\nWe hope to see you again soon!"
  );
  assert_eq!(sent[1].to, "ops@example.com");
  assert_eq!(sent[1].subject, "Latinum Order by ada@example.com");
  assert!(sent[1].body.starts_with("ada@example.com placed an order."));
  assert_eq!(sent[2].to, "owner@example.com");
}

#[tokio::test]
#[serial]
async fn excluded_buyer_is_not_broadcast() {
  setup_tracing();
  let sink = RecordingSink::new();
  let dispatcher = NotificationDispatcher::new(sink.clone(), settings());
  let wallet = Wallet {
    email: Some("qa@example.com".into()),
    name: None,
    ..buyer_wallet(0)
  };

  let report = dispatcher
    .order_confirmed(&wallet, &[product(1, "Espresso", 250)], 250)
    .await
    .unwrap();

  assert_eq!(report.admins_notified, 0);
  assert_eq!(sink.recipients(), vec!["qa@example.com"]);
  assert!(sink.sent.lock()[0].body.starts_with("Hi there,"));
}

#[tokio::test]
#[serial]
async fn wallet_without_email_sends_nothing() {
  setup_tracing();
  let sink = RecordingSink::new();
  let dispatcher = NotificationDispatcher::new(sink.clone(), settings());
  let wallet = Wallet {
    email: None,
    ..buyer_wallet(0)
  };

  let report = dispatcher.order_confirmed(&wallet, &[], 0).await.unwrap();

  assert_eq!(report, NotificationReport::default());
  assert!(sink.sent.lock().is_empty());
}

#[tokio::test]
#[serial]
async fn delivery_failure_is_a_notification_error() {
  setup_tracing();
  let dispatcher = NotificationDispatcher::new(RecordingSink::failing(), settings());

  let err = dispatcher
    .order_confirmed(&buyer_wallet(0), &[product(1, "Espresso", 250)], 250)
    .await
    .unwrap_err();

  assert!(matches!(err, PaygateError::Notification(ref m) if m.starts_with("0 of 3 messages sent")));
}
