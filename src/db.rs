// ==========================================
// 版税对账结算系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供 schema 引导（CREATE TABLE IF NOT EXISTS，幂等）
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等，可重复执行）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS platform (
            platform_id     TEXT PRIMARY KEY,
            name            TEXT NOT NULL UNIQUE,
            default_split   REAL NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS platform_mapping_template (
            platform_id       TEXT PRIMARY KEY REFERENCES platform(platform_id) ON DELETE CASCADE,
            header_row_index  INTEGER NOT NULL,
            mapping_rules     TEXT NOT NULL,
            updated_at        TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS vendor (
            vendor_id       TEXT PRIMARY KEY,
            company_name    TEXT NOT NULL,
            vendor_number   TEXT UNIQUE,
            sub_labels      TEXT NOT NULL DEFAULT '[]',
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS platform_split (
            vendor_id       TEXT NOT NULL REFERENCES vendor(vendor_id) ON DELETE CASCADE,
            platform_id     TEXT NOT NULL REFERENCES platform(platform_id) ON DELETE CASCADE,
            commission_rate REAL NOT NULL,
            PRIMARY KEY (vendor_id, platform_id)
        );

        CREATE TABLE IF NOT EXISTS revenue_report (
            report_id       TEXT PRIMARY KEY,
            platform_id     TEXT NOT NULL REFERENCES platform(platform_id),
            filename        TEXT NOT NULL,
            status          TEXT NOT NULL,
            total_amount    REAL,
            month           TEXT NOT NULL,
            invoice_ref     TEXT,
            payment_status  TEXT NOT NULL DEFAULT 'PENDING',
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS payout (
            payout_id       TEXT PRIMARY KEY,
            vendor_id       TEXT NOT NULL REFERENCES vendor(vendor_id),
            payout_number   INTEGER NOT NULL UNIQUE,
            total_amount    REAL NOT NULL,
            status          TEXT NOT NULL,
            payment_date    TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS revenue_record (
            record_id         TEXT PRIMARY KEY,
            report_id         TEXT REFERENCES revenue_report(report_id),
            platform_id       TEXT NOT NULL REFERENCES platform(platform_id),
            vendor_id         TEXT REFERENCES vendor(vendor_id),
            payout_id         TEXT REFERENCES payout(payout_id),
            raw_vendor_name   TEXT NOT NULL DEFAULT '',
            gross_revenue     REAL NOT NULL DEFAULT 0,
            line_item_name    TEXT NOT NULL DEFAULT '',
            metadata          TEXT NOT NULL DEFAULT '{}',
            period_start      TEXT NOT NULL,
            period_end        TEXT NOT NULL,
            status            TEXT NOT NULL,
            commission_amount REAL,
            net_amount        REAL,
            created_at        TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_revenue_record_vendor_unpaid
            ON revenue_record(vendor_id, payout_id);
        CREATE INDEX IF NOT EXISTS idx_revenue_record_payout
            ON revenue_record(payout_id);
        CREATE INDEX IF NOT EXISTS idx_payout_vendor
            ON payout(vendor_id);
        "#,
    )?;
    Ok(())
}
