//! Order persistence and settlement tests
//!
//! The settlement transition is a compare-and-swap on `status`, so exactly
//! one of several concurrent notifications for the same order may win.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use rusqlite::Connection;
use rust_decimal_macros::dec;
use zpay_checkout::error::AppError;
use zpay_checkout::id::is_valid_order_id;

fn pro_plan() -> CreateOrder {
    CreateOrder {
        name: "Pro".to_string(),
        money: dec!(29),
        payment_type: PaymentType::Wxpay,
        param: serde_json::json!({"plan": "pro", "seats": 3}),
    }
}

// ============ Create / Get ============

#[test]
fn test_create_and_get_order() {
    let conn = setup_test_db();

    let order = queries::create_order(&conn, "user-1", &pro_plan())
        .expect("create_order should succeed");

    assert!(is_valid_order_id(&order.out_trade_no));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.created_at, order.updated_at);

    let retrieved = queries::get_order(&conn, &order.out_trade_no)
        .expect("query failed")
        .expect("order should exist");

    assert_eq!(retrieved.out_trade_no, order.out_trade_no);
    assert_eq!(retrieved.user_id, "user-1");
    assert_eq!(retrieved.name, "Pro");
    assert_eq!(retrieved.money.to_string(), "29.00");
    assert_eq!(retrieved.payment_type, PaymentType::Wxpay);
    assert_eq!(retrieved.param, serde_json::json!({"plan": "pro", "seats": 3}));
    assert_eq!(retrieved.status, OrderStatus::Pending);
    assert!(retrieved.trade_no.is_none());
}

#[test]
fn test_money_stored_as_two_decimal_string() {
    let conn = setup_test_db();
    let mut input = pro_plan();
    input.money = dec!(0.1);
    let order = queries::create_order(&conn, "user-1", &input).unwrap();

    let stored: String = conn
        .query_row(
            "SELECT money FROM orders WHERE out_trade_no = ?1",
            [&order.out_trade_no],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, "0.10");
}

#[test]
fn test_get_order_nonexistent() {
    let conn = setup_test_db();
    let result = queries::get_order(&conn, "zpay_1_abc").expect("query should not error");
    assert!(result.is_none());
}

#[test]
fn test_duplicate_order_id_rejected() {
    let conn = setup_test_db();
    create_test_order(&conn, "user-1", "zpay_1700000000000_42", dec!(1));

    let result = queries::create_order_with_id(&conn, "zpay_1700000000000_42", "user-2", &pro_plan());
    assert!(matches!(result, Err(AppError::Database(_))));

    let order = queries::get_order(&conn, "zpay_1700000000000_42").unwrap().unwrap();
    assert_eq!(order.user_id, "user-1", "original order must be untouched");
}

#[test]
fn test_get_order_for_user_scopes_by_owner() {
    let conn = setup_test_db();
    create_test_order(&conn, "alice", "zpay_1700000000000_aa", dec!(1));

    assert!(
        queries::get_order_for_user(&conn, "zpay_1700000000000_aa", "alice")
            .unwrap()
            .is_some()
    );
    assert!(
        queries::get_order_for_user(&conn, "zpay_1700000000000_aa", "mallory")
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_list_orders_for_user_paginated() {
    let conn = setup_test_db();
    for i in 0..5 {
        create_test_order(&conn, "alice", &format!("zpay_170000000000{}_a", i), dec!(1));
    }
    create_test_order(&conn, "bob", "zpay_1700000000009_b", dec!(1));

    let (items, total) = queries::list_orders_for_user_paginated(&conn, "alice", 2, 0).unwrap();
    assert_eq!(total, 5);
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|o| o.user_id == "alice"));

    let (items, total) = queries::list_orders_for_user_paginated(&conn, "alice", 10, 4).unwrap();
    assert_eq!(total, 5);
    assert_eq!(items.len(), 1);

    let (items, total) = queries::list_orders_for_user_paginated(&conn, "nobody", 10, 0).unwrap();
    assert_eq!(total, 0);
    assert!(items.is_empty());
}

#[test]
fn test_list_orders_newest_first() {
    let conn = setup_test_db();
    create_test_order(&conn, "alice", "zpay_1700000000001_a", dec!(1));
    create_test_order(&conn, "alice", "zpay_1700000000002_a", dec!(1));
    conn.execute(
        "UPDATE orders SET created_at = created_at - 3600 WHERE out_trade_no = 'zpay_1700000000002_a'",
        [],
    )
    .unwrap();

    let (items, _) = queries::list_orders_for_user_paginated(&conn, "alice", 10, 0).unwrap();
    assert_eq!(items[0].out_trade_no, "zpay_1700000000001_a");
    assert_eq!(items[1].out_trade_no, "zpay_1700000000002_a");
}

// ============ Schema constraints ============

#[test]
fn test_status_check_constraint() {
    let conn = setup_test_db();
    create_test_order(&conn, "alice", "zpay_1700000000000_aa", dec!(1));

    let result = conn.execute(
        "UPDATE orders SET status = 'REFUNDED' WHERE out_trade_no = 'zpay_1700000000000_aa'",
        [],
    );
    assert!(result.is_err(), "status outside PENDING/SUCCESS must be rejected");
}

#[test]
fn test_corrupt_money_is_an_error_not_a_panic() {
    let conn = setup_test_db();
    create_test_order(&conn, "alice", "zpay_1700000000000_aa", dec!(1));
    conn.execute(
        "UPDATE orders SET money = 'lots' WHERE out_trade_no = 'zpay_1700000000000_aa'",
        [],
    )
    .unwrap();

    let result = queries::get_order(&conn, "zpay_1700000000000_aa");
    assert!(matches!(result, Err(AppError::Database(_))));
}

#[test]
fn test_corrupt_param_is_an_error_not_null() {
    let conn = setup_test_db();
    create_test_order(&conn, "alice", "zpay_1700000000000_aa", dec!(1));
    conn.execute(
        "UPDATE orders SET param = '{\"plan\":' WHERE out_trade_no = 'zpay_1700000000000_aa'",
        [],
    )
    .unwrap();

    let result = queries::get_order(&conn, "zpay_1700000000000_aa");
    assert!(matches!(result, Err(AppError::Database(_))));
}

// ============ Settlement CAS ============

#[test]
fn test_try_mark_order_paid_succeeds_once() {
    let conn = setup_test_db();
    create_test_order(&conn, "user-1", "zpay_1700000000000_42", dec!(0.01));

    let first = queries::try_mark_order_paid(&conn, "zpay_1700000000000_42", Some("T1"))
        .expect("should not error");
    assert!(first, "first transition should win");

    let order = queries::get_order(&conn, "zpay_1700000000000_42").unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Success);
    assert_eq!(order.trade_no.as_deref(), Some("T1"));

    let second = queries::try_mark_order_paid(&conn, "zpay_1700000000000_42", Some("T2"))
        .expect("should not error");
    assert!(!second, "second transition should be a no-op");

    let order = queries::get_order(&conn, "zpay_1700000000000_42").unwrap().unwrap();
    assert_eq!(order.trade_no.as_deref(), Some("T1"), "trade_no must not be overwritten");
}

#[test]
fn test_try_mark_order_paid_nonexistent() {
    let conn = setup_test_db();
    let result = queries::try_mark_order_paid(&conn, "zpay_1_abc", Some("T1"))
        .expect("should not error");
    assert!(!result);
}

#[test]
fn test_try_mark_order_paid_concurrent() {
    use std::sync::{Arc, Barrier};

    let num_threads = 8;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("concurrent.db");

    let conn = Connection::open(&db_path).expect("Failed to create test db");
    init_db(&conn).expect("Failed to init schema");
    create_test_order(&conn, "user-1", "zpay_1700000000000_42", dec!(0.01));
    drop(conn);

    let barrier = Arc::new(Barrier::new(num_threads));
    let db_path = Arc::new(db_path);

    let handles: Vec<_> = (0..num_threads)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let db_path = Arc::clone(&db_path);

            std::thread::spawn(move || {
                let thread_conn =
                    Connection::open(db_path.as_path()).expect("thread failed to open db");
                thread_conn
                    .busy_timeout(std::time::Duration::from_secs(5))
                    .expect("failed to set busy timeout");

                barrier.wait();

                let trade_no = format!("T{}", i);
                queries::try_mark_order_paid(&thread_conn, "zpay_1700000000000_42", Some(&trade_no))
                    .expect("try_mark_order_paid should not error")
            })
        })
        .collect();

    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let wins = results.iter().filter(|&&r| r).count();

    assert_eq!(
        wins, 1,
        "exactly 1 of {} concurrent transitions should succeed, got {}",
        num_threads, wins
    );

    let verify_conn = Connection::open(db_path.as_path()).unwrap();
    let order = queries::get_order(&verify_conn, "zpay_1700000000000_42")
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Success);
    let winner = results.iter().position(|&r| r).unwrap();
    assert_eq!(order.trade_no, Some(format!("T{}", winner)));
}
