use axum::{Extension, Router, extract::State, middleware, routing::get};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::id::is_valid_order_id;
use crate::jwt::SessionUser;
use crate::middleware::require_session;
use crate::models::Order;
use crate::pagination::{Paginated, PaginationQuery};

/// GET /api/orders
/// The caller's orders, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<Order>>> {
    let conn = state.db.get()?;
    let limit = query.limit();
    let offset = query.offset();

    let (items, total) =
        queries::list_orders_for_user_paginated(&conn, &user.user_id, limit, offset)?;

    Ok(Json(Paginated::new(items, total, limit, offset)))
}

/// GET /api/orders/{out_trade_no}
/// Someone else's order is indistinguishable from a missing one.
pub async fn get_order(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(out_trade_no): Path<String>,
) -> Result<Json<Order>> {
    if !is_valid_order_id(&out_trade_no) {
        return Err(AppError::NotFound(msg::ORDER_NOT_FOUND.into()));
    }

    let conn = state.db.get()?;
    let order = queries::get_order_for_user(&conn, &out_trade_no, &user.user_id)?
        .or_not_found(msg::ORDER_NOT_FOUND)?;

    Ok(Json(order))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders))
        .route("/api/orders/{out_trade_no}", get(get_order))
        .layer(middleware::from_fn_with_state(state, require_session))
}
