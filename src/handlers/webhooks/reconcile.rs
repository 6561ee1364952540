//! Settlement of Z-Pay payment notifications.
//!
//! Each step short-circuits:
//!
//! 1. the merchant key must be configured
//! 2. the signature must match the received parameters
//! 3. anything other than a complete `TRADE_SUCCESS` report is acknowledged
//!    and ignored
//! 4. the order must exist
//! 5. an already settled order is acknowledged without changes
//! 6. the reported amount must equal the stored one
//! 7. `PENDING -> SUCCESS` via compare-and-swap
//!
//! Notifications are retried by the gateway, so every path that returns
//! `Ok` must be safe to replay.

use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::id::is_valid_order_id;
use crate::models::{amounts_match, format_amount};
use crate::payments::ZpayNotification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// This notification moved the order to `SUCCESS`.
    Settled,
    /// The order was already `SUCCESS`; nothing changed.
    AlreadySettled,
    /// Valid, but not a completed payment report; nothing changed.
    Ignored,
}

pub fn process_notification(
    state: &AppState,
    notification: &ZpayNotification,
) -> Result<NotificationOutcome> {
    let key = state.gateway.signing_key()?;

    if !notification.verify(key) {
        return Err(AppError::SignatureMismatch);
    }

    let (Some(out_trade_no), Some(money)) = (notification.out_trade_no(), notification.money())
    else {
        tracing::debug!("Ignoring notification without out_trade_no or money");
        return Ok(NotificationOutcome::Ignored);
    };

    if !notification.is_trade_success() {
        tracing::debug!(
            "Ignoring notification for {} with trade_status {:?}",
            out_trade_no,
            notification.trade_status()
        );
        return Ok(NotificationOutcome::Ignored);
    }

    if !is_valid_order_id(out_trade_no) {
        tracing::warn!("Notification for malformed order id");
        return Err(AppError::NotFound(msg::ORDER_NOT_FOUND.into()));
    }

    let conn = state.db.get()?;
    let Some(order) = queries::get_order(&conn, out_trade_no)? else {
        tracing::warn!("Notification for unknown order {}", out_trade_no);
        return Err(AppError::NotFound(msg::ORDER_NOT_FOUND.into()));
    };

    if order.is_settled() {
        tracing::info!("Order {} already settled, acknowledging replay", out_trade_no);
        return Ok(NotificationOutcome::AlreadySettled);
    }

    if !amounts_match(order.money, money) {
        return Err(AppError::AmountMismatch {
            expected: format_amount(order.money),
            received: money.to_string(),
        });
    }

    if queries::try_mark_order_paid(&conn, out_trade_no, notification.trade_no())? {
        tracing::info!(
            "Order {} settled (trade_no {:?}, amount {})",
            out_trade_no,
            notification.trade_no(),
            order.money
        );
        Ok(NotificationOutcome::Settled)
    } else {
        // A concurrent notification won the compare-and-swap
        tracing::info!("Order {} settled concurrently, acknowledging", out_trade_no);
        Ok(NotificationOutcome::AlreadySettled)
    }
}
