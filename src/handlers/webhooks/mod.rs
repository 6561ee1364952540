pub mod reconcile;
pub mod zpay;

pub use zpay::handle_zpay_webhook;

use axum::{Router, routing::get};

use crate::db::AppState;
use crate::payments::NOTIFY_PATH;

pub fn router() -> Router<AppState> {
    Router::new().route(NOTIFY_PATH, get(handle_zpay_webhook))
}
