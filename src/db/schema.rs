use rusqlite::Connection;

/// Create the schema. Safe to run on every startup.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Orders (one row per checkout attempt, never deleted)
        -- status moves PENDING -> SUCCESS exactly once, via the webhook
        CREATE TABLE IF NOT EXISTS orders (
            out_trade_no TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            money TEXT NOT NULL,                  -- two-decimal string, e.g. '29.00'
            payment_type TEXT NOT NULL CHECK (payment_type IN ('alipay', 'wxpay')),
            param TEXT NOT NULL DEFAULT '{}',     -- opaque JSON metadata
            status TEXT NOT NULL DEFAULT 'PENDING' CHECK (status IN ('PENDING', 'SUCCESS')),
            trade_no TEXT,                        -- gateway transaction id, set on success
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id, created_at DESC);
        "#,
    )?;
    Ok(())
}
