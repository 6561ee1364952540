use chrono::Utc;
use rusqlite::{Connection, params};

use crate::error::Result;
use crate::id::new_order_id;
use crate::models::*;

use super::from_row::{ORDER_COLS, query_all, query_one};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Orders ============

/// Persist a new `PENDING` order under a freshly generated id.
pub fn create_order(conn: &Connection, user_id: &str, input: &CreateOrder) -> Result<Order> {
    create_order_with_id(conn, &new_order_id(), user_id, input)
}

/// Persist a new `PENDING` order under a caller-chosen id.
///
/// A duplicate id fails on the primary key.
pub fn create_order_with_id(
    conn: &Connection,
    out_trade_no: &str,
    user_id: &str,
    input: &CreateOrder,
) -> Result<Order> {
    let now = now();
    let money = normalize_amount(input.money);

    conn.execute(
        "INSERT INTO orders (out_trade_no, user_id, name, money, payment_type, param, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            out_trade_no,
            user_id,
            &input.name,
            money.to_string(),
            input.payment_type.as_str(),
            serde_json::to_string(&input.param)?,
            OrderStatus::Pending.as_str(),
            now,
        ],
    )?;

    Ok(Order {
        out_trade_no: out_trade_no.to_string(),
        user_id: user_id.to_string(),
        name: input.name.clone(),
        money,
        payment_type: input.payment_type,
        param: input.param.clone(),
        status: OrderStatus::Pending,
        trade_no: None,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_order(conn: &Connection, out_trade_no: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE out_trade_no = ?1", ORDER_COLS),
        &[&out_trade_no],
    )
}

/// Look up an order only if it belongs to `user_id`.
pub fn get_order_for_user(
    conn: &Connection,
    out_trade_no: &str,
    user_id: &str,
) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM orders WHERE out_trade_no = ?1 AND user_id = ?2",
            ORDER_COLS
        ),
        &[&out_trade_no, &user_id],
    )
}

/// A user's orders, newest first, with the total count for pagination.
pub fn list_orders_for_user_paginated(
    conn: &Connection,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Order>, i64)> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM orders WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;

    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM orders WHERE user_id = ?1
             ORDER BY created_at DESC, out_trade_no DESC LIMIT ?2 OFFSET ?3",
            ORDER_COLS
        ),
        params![user_id, limit, offset],
    )?;

    Ok((items, total))
}

/// Atomically move an order from `PENDING` to `SUCCESS`, recording the
/// gateway's transaction id.
///
/// Compare-and-swap on the status column, so concurrent notifications for
/// the same order cannot both settle it.
///
/// Returns:
/// - `Ok(true)` if this call performed the transition
/// - `Ok(false)` if the order is unknown or was already settled
pub fn try_mark_order_paid(
    conn: &Connection,
    out_trade_no: &str,
    trade_no: Option<&str>,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders SET status = ?1, trade_no = ?2, updated_at = ?3
         WHERE out_trade_no = ?4 AND status = ?5",
        params![
            OrderStatus::Success.as_str(),
            trade_no,
            now(),
            out_trade_no,
            OrderStatus::Pending.as_str(),
        ],
    )?;
    Ok(affected > 0)
}
