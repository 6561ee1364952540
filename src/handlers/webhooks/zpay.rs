use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
};

use crate::db::AppState;
use crate::payments::ZpayNotification;

use super::reconcile::process_notification;

/// Plain-text acknowledgement. The gateway keeps retrying until it reads
/// `success`.
pub type WebhookResult = (StatusCode, &'static str);

const ACK: &str = "success";
const NACK: &str = "error";

/// GET /api/checkout/providers/zpay/webhook
pub async fn handle_zpay_webhook(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> WebhookResult {
    let notification = ZpayNotification::from_query(query.as_deref().unwrap_or_default());

    match process_notification(&state, &notification) {
        Ok(_) => (StatusCode::OK, ACK),
        Err(e) => {
            e.log();
            (e.status_code(), NACK)
        }
    }
}
