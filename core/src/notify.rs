// core/src/notify.rs

//! Order confirmation mail to the buyer and the order broadcast to admins.

use crate::error::{PaygateError, Result};
use crate::models::{Product, Wallet};
use crate::settings::NotificationSettings;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
  pub to: String,
  pub subject: String,
  pub body: String,
}

/// Fire-and-forget mail delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync {
  async fn send(&self, message: &EmailMessage) -> Result<()>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NotificationReport {
  pub buyer_notified: bool,
  pub admins_notified: usize,
}

pub struct NotificationDispatcher {
  sink: Arc<dyn NotificationSink>,
  settings: NotificationSettings,
}

impl NotificationDispatcher {
  pub fn new(sink: Arc<dyn NotificationSink>, settings: NotificationSettings) -> Self {
    Self { sink, settings }
  }

  /// Renders a minor-unit amount, e.g. `1234` → `€12.34`.
  pub fn format_amount(&self, amount: i64) -> String {
    format_minor_units(amount, self.settings.minor_units_per_major, &self.settings.currency_symbol)
  }

  /// Sends the buyer confirmation and, unless the buyer is excluded, the admin
  /// broadcast. Every message is attempted; the first failure is reported
  /// after all attempts.
  #[instrument(name = "notify::order_confirmed", skip_all, fields(wallet = %wallet.id, items = products.len(), total = total))]
  pub async fn order_confirmed(&self, wallet: &Wallet, products: &[Product], total: i64) -> Result<NotificationReport> {
    let mut report = NotificationReport::default();
    let Some(buyer_email) = wallet.email.as_deref().filter(|e| !e.trim().is_empty()) else {
      info!("Wallet has no e-mail address; no confirmation sent.");
      return Ok(report);
    };

    let lines = products
      .iter()
      .map(|p| format!("• {} – {}", p.name, self.format_amount(p.price)))
      .collect::<Vec<_>>()
      .join("\n");
    let total_display = self.format_amount(total);
    let brand = &self.settings.brand;

    let mut outbox = vec![EmailMessage {
      to: buyer_email.to_string(),
      subject: format!("Your {} Order Confirmation", brand),
      body: format!(
        "Hi {},\n\nThanks for your purchase!\n\nOrder Summary:\n{}\n\nTotal: {}\n\nWe hope to see you again soon!",
        wallet.name.as_deref().unwrap_or("there"),
        lines,
        total_display
      ),
    }];

    if self.settings.is_excluded(buyer_email) {
      info!("Buyer is on the broadcast exclusion list; admins not notified.");
    } else {
      let admin_body = format!("{} placed an order.\n\n{}\n\nTotal: {}", buyer_email, lines, total_display);
      for admin in &self.settings.admin_recipients {
        outbox.push(EmailMessage {
          to: admin.clone(),
          subject: format!("{} Order by {}", brand, buyer_email),
          body: admin_body.clone(),
        });
      }
    }

    let mut first_failure = None;
    for (idx, message) in outbox.iter().enumerate() {
      match self.sink.send(message).await {
        Ok(()) if idx == 0 => report.buyer_notified = true,
        Ok(()) => report.admins_notified += 1,
        Err(e) => {
          warn!(recipient_index = idx, error = %e, "Sending order mail failed.");
          first_failure.get_or_insert(e);
        }
      }
    }

    match first_failure {
      None => Ok(report),
      Some(e) => Err(PaygateError::Notification(format!(
        "{} of {} messages sent; first failure: {}",
        report.admins_notified + usize::from(report.buyer_notified),
        outbox.len(),
        e
      ))),
    }
  }
}

fn format_minor_units(amount: i64, per_major: i64, symbol: &str) -> String {
  let sign = if amount < 0 { "-" } else { "" };
  let abs = amount.unsigned_abs();
  if per_major <= 1 {
    return format!("{}{}{}", sign, symbol, abs);
  }
  let per_major = per_major.unsigned_abs();
  let digits = per_major.to_string().len() - 1;
  format!(
    "{}{}{}.{:0width$}",
    sign,
    symbol,
    abs / per_major,
    abs % per_major,
    width = digits
  )
}

#[cfg(test)]
mod tests {
  use super::format_minor_units;

  #[test]
  fn formats_cents() {
    assert_eq!(format_minor_units(1234, 100, "€"), "€12.34");
    assert_eq!(format_minor_units(5, 100, "€"), "€0.05");
    assert_eq!(format_minor_units(-250, 100, "€"), "-€2.50");
    assert_eq!(format_minor_units(42, 1, "◎"), "◎42");
  }
}
